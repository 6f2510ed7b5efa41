//! Shared utilities: installed data paths, calibration tables, rule validation.

pub mod calibration;
pub mod data_paths;
pub mod validation;

pub use calibration::{load_channel_table_or_default, read_channel_table};
pub use data_paths::{bdt_path, cell_xy_path, field_map_path, roc_path};
pub use validation::{validate_keep_rules, validate_skim_rules};
