//! Per-channel calibration tables.
//!
//! Gain and pedestal tables are plain text, one channel per line:
//!
//! ```text
//! 0, 2.1e6
//! 3, 1.9e6
//! ```
//!
//! Each line overrides the default value of that channel; channels not
//! listed keep their default.

use crate::error::{ConfigError, Result};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// Apply the table at `path` on top of `defaults`
pub fn read_channel_table(path: &Path, defaults: &[f64]) -> Result<Vec<f64>> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let mut values = defaults.to_vec();

    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let format_error = |reason: String| ConfigError::CalibrationFormat {
            path: path.to_path_buf(),
            line: number + 1,
            reason,
        };

        let mut fields = line.split(',');
        let (Some(index), Some(value)) = (fields.next(), fields.next()) else {
            return Err(format_error("expected 'channel, value'".to_string()));
        };
        let index: usize = index
            .trim()
            .parse()
            .map_err(|e| format_error(format!("bad channel '{}': {}", index.trim(), e)))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|e| format_error(format!("bad value '{}': {}", value.trim(), e)))?;

        match values.get_mut(index) {
            Some(slot) => *slot = value,
            None => {
                return Err(format_error(format!(
                    "channel {} outside of {} channels",
                    index,
                    defaults.len()
                )))
            }
        }
    }
    Ok(values)
}

/// Like [`read_channel_table`], but a missing file leaves the defaults unchanged
pub fn load_channel_table_or_default(path: &Path, defaults: &[f64]) -> Result<Vec<f64>> {
    if !path.exists() {
        warn!("Calibration table {} not found, using defaults", path.display());
        return Ok(defaults.to_vec());
    }
    info!("Reading calibration table {}", path.display());
    read_channel_table(path, defaults)
}
