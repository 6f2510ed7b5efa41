//! Error type shared by the configuration builders.
//!
//! Every variant maps to one precondition a configuration script can
//! violate. None of them are recoverable: the caller reports and stops.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors raised while building a process configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Process object is already created! You can only create one Process object per registry.")]
    ProcessAlreadyCreated,

    #[error("No Process object defined yet! You need to create a Process before {action}.")]
    NoProcess { action: &'static str },

    #[error("{path} is not accessible.")]
    SourceNotAccessible { path: PathBuf },

    #[error("Compiling {source_file} into {library} failed ({status})")]
    CompilationFailed {
        source_file: PathBuf,
        library: PathBuf,
        status: ExitStatus,
    },

    #[error("{kind} file '{path}' does not exist.")]
    MissingDataFile { kind: &'static str, path: PathBuf },

    #[error("Malformed calibration table {path} at line {line}: {reason}")]
    CalibrationFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
