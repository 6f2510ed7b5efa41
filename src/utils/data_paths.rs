//! Paths to data files shipped with the framework installation.
//!
//! Installed data lives under `<prefix>/data/<Subsystem>/`. Every helper
//! checks that the file exists so a configuration never points the runner at
//! a missing model or table.

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Name of the installed magnetic field map
pub const FIELD_MAP_NAME: &str = "BmapCorrected3D_unfolded_scaled_1.15384615385.dat";

fn installed(install_prefix: &Path, subsystem: &str, file: &str, kind: &'static str) -> Result<PathBuf> {
    let path = install_prefix.join("data").join(subsystem).join(file);
    if !path.is_file() {
        return Err(ConfigError::MissingDataFile { kind, path });
    }
    Ok(path)
}

/// Installed ONNX model for a veto BDT (`name` without extension)
///
/// # Examples
/// ```no_run
/// use ldmxcfg::utils::bdt_path;
/// use std::path::Path;
///
/// let model = bdt_path(Path::new("/opt/ldmx"), "gabrielle")?;
/// # Ok::<(), ldmxcfg::ConfigError>(())
/// ```
pub fn bdt_path(install_prefix: &Path, name: &str) -> Result<PathBuf> {
    installed(install_prefix, "Ecal", &format!("{}.onnx", name), "ONNX model")
}

/// Installed cell position table of the ECal
pub fn cell_xy_path(install_prefix: &Path) -> Result<PathBuf> {
    installed(install_prefix, "Ecal", "cellxy.txt", "Cell xy text")
}

/// Installed radius-of-containment table (`name` without extension)
pub fn roc_path(install_prefix: &Path, name: &str) -> Result<PathBuf> {
    installed(install_prefix, "Ecal", &format!("{}.csv", name), "RoC csv")
}

/// Installed magnetic field map
pub fn field_map_path(install_prefix: &Path) -> Result<PathBuf> {
    installed(install_prefix, "fieldmap", FIELD_MAP_NAME, "Field map")
}
