//! Process setting types.
//!
//! Small typed values stored on a [`Process`](super::Process): log
//! severities, output compression and skim rules.

use crate::parameter::{Parameter, Parameters};
use serde::{Deserialize, Serialize};

/// Minimum severity of log messages, as understood by the native logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl LogLevel {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(level: i64) -> Option<Self> {
        match level {
            0 => Some(LogLevel::Debug),
            1 => Some(LogLevel::Info),
            2 => Some(LogLevel::Warn),
            3 => Some(LogLevel::Error),
            4 => Some(LogLevel::Fatal),
            _ => None,
        }
    }
}

/// Compression algorithm codes for output event files
///
/// | Algorithm           | code |
/// | ------------------- | ---- |
/// | ROOT global default |  0   |
/// | ZLIB                |  1   |
/// | LZMA                |  2   |
/// | Old (ROOT 5)        |  3   |
/// | LZ4                 |  4   |
/// | ZSTD                |  5   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    GlobalDefault = 0,
    Zlib = 1,
    Lzma = 2,
    Old = 3,
    Lz4 = 4,
    Zstd = 5,
}

impl Compression {
    pub fn code(self) -> u32 {
        self as u32
    }
}

/// Default compression level, the strongest the algorithm offers
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

/// Combine algorithm and level into the single integer the output file expects
///
/// # Examples
/// ```
/// use ldmxcfg::process::compression_setting;
///
/// assert_eq!(compression_setting(2, 9), 209);
/// assert_eq!(compression_setting(0, 0), 0);
/// ```
pub fn compression_setting(algorithm: u32, level: u32) -> i64 {
    i64::from(algorithm) * 100 + i64::from(level)
}

/// Which processors' storage hints the process listens to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkimRule {
    /// Pattern matched against processor instance names
    pub name_pattern: String,
    /// Pattern matched against the hint's label; empty matches any label
    #[serde(default)]
    pub label_pattern: String,
}

impl SkimRule {
    pub fn new(name_pattern: &str, label_pattern: &str) -> Self {
        Self {
            name_pattern: name_pattern.to_string(),
            label_pattern: label_pattern.to_string(),
        }
    }

    pub fn matches_any_label(&self) -> bool {
        self.label_pattern.is_empty()
    }
}

impl From<&SkimRule> for Parameter {
    fn from(rule: &SkimRule) -> Self {
        let mut attrs = Parameters::new();
        attrs.insert("namePattern".to_string(), rule.name_pattern.clone().into());
        attrs.insert("labelPattern".to_string(), rule.label_pattern.clone().into());
        Parameter::Table(attrs)
    }
}
