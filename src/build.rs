//! On-demand compilation of single-file processors.
//!
//! The framework loads processor libraries only after the configuration is
//! complete, so a processor written in one C++ source file can be compiled
//! into its own shared library while the configuration is being built. The
//! library lives next to its source as `lib<stem>.so` and is rebuilt only
//! when it is missing or older than the source. Libraries are never removed.

use crate::error::{ConfigError, Result};
use log::{debug, info};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Library every compiled processor links against
pub const FRAMEWORK_LIBRARY: &str = "Framework";

/// Default location of ROOT's non-system headers
pub const DEFAULT_ROOT_INCLUDE: &str = "/usr/local/include/root";

/// External compiler invocation settings
#[derive(Debug, Clone)]
pub struct Compiler {
    /// Compiler executable
    pub program: String,
    /// Installation prefix holding framework headers and libraries
    pub install_prefix: PathBuf,
    /// ROOT header directory
    pub root_include: PathBuf,
}

impl Compiler {
    pub fn new(install_prefix: impl Into<PathBuf>) -> Self {
        Self {
            program: "g++".to_string(),
            install_prefix: install_prefix.into(),
            root_include: PathBuf::from(DEFAULT_ROOT_INCLUDE),
        }
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to the compiler to build `library` from `source`
    pub fn arguments(&self, source: &Path, library: &Path, needs: &[String]) -> Vec<String> {
        let mut args = vec![
            "-fPIC".to_string(),
            "-shared".to_string(),
            "-o".to_string(),
            library.display().to_string(),
            source.display().to_string(),
        ];
        args.extend(link_libraries(needs).into_iter().map(|lib| format!("-l{}", lib)));
        args.push(format!("-I{}", self.root_include.display()));
        args.push(format!("-I{}", self.install_prefix.join("include").display()));
        args.push(format!("-L{}", self.install_prefix.join("lib").display()));
        args
    }

    /// Run the compiler to completion.
    ///
    /// A non-zero exit status is returned as [`ConfigError::CompilationFailed`].
    pub fn compile(&self, source: &Path, library: &Path, needs: &[String]) -> Result<()> {
        let args = self.arguments(source, library, needs);
        debug!("Running {} {}", self.program, args.join(" "));
        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|e| ConfigError::io(&self.program, e))?;
        if !status.success() {
            return Err(ConfigError::CompilationFailed {
                source_file: source.to_path_buf(),
                library: library.to_path_buf(),
                status,
            });
        }
        Ok(())
    }
}

/// Libraries to link: `Framework` plus `needs`, sorted and de-duplicated
pub fn link_libraries(needs: &[String]) -> BTreeSet<String> {
    std::iter::once(FRAMEWORK_LIBRARY.to_string())
        .chain(needs.iter().cloned())
        .collect()
}

/// Shared library path that `source` compiles into
pub fn library_for_source(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("lib{}.so", stem))
}

/// Whether `library` is absent or strictly older than `source`
pub fn needs_rebuild(source: &Path, library: &Path) -> Result<bool> {
    if !library.is_file() {
        return Ok(true);
    }
    let source_mtime = fs::metadata(source)
        .and_then(|m| m.modified())
        .map_err(|e| ConfigError::io(source, e))?;
    let library_mtime = fs::metadata(library)
        .and_then(|m| m.modified())
        .map_err(|e| ConfigError::io(library, e))?;
    Ok(source_mtime > library_mtime)
}

/// Build `source` into its sibling library unless an up-to-date one exists.
///
/// Returns the library path either way.
pub fn ensure_compiled(
    compiler: &Compiler,
    source: &Path,
    needs: &[String],
    notice: bool,
) -> Result<PathBuf> {
    let library = library_for_source(source);
    if needs_rebuild(source, &library)? {
        if notice {
            info!(
                "Processor source file {} is newer than its compiled library {} (or library does not exist), recompiling...",
                source.display(),
                library.display()
            );
        }
        compiler.compile(source, &library, needs)?;
        if notice {
            info!("done compiling {}", source.display());
        }
    } else {
        debug!("Reusing up-to-date library {}", library.display());
    }
    Ok(library)
}
