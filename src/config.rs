use crate::conditions::SeedMode;
use crate::histogram::Binning;
use crate::parameter::Parameters;
use crate::process::{Compression, LogLevel, DEFAULT_COMPRESSION_LEVEL};
use crate::processor::ProcessorKind;
use serde::{Deserialize, Serialize};

/// YAML description of one run, the file-based equivalent of a configuration script
#[derive(Debug, Serialize, Deserialize)]
pub struct RunConfig {
    pub pass_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_events: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tries_per_event: Option<i64>,
    #[serde(default)]
    pub input_files: Vec<String>,
    /// Directories whose event files are appended to the input files
    #[serde(default)]
    pub input_dirs: Vec<String>,
    #[serde(default)]
    pub output_files: Vec<String>,
    #[serde(default)]
    pub keep: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skim: Option<SkimConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<CompressionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tree_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<RandomSeedConfig>,
    /// Full paths of extra libraries to load
    #[serde(default)]
    pub libraries: Vec<String>,
    /// Names of extra installed modules to load
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionsConfig>,
    #[serde(default)]
    pub sequence: Vec<ProcessorConfig>,
    /// Extra process-level keys handed to the runner unchanged
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    pub parameters: Parameters,
}

impl RunConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.pass_name.trim().is_empty() {
            return Err(ValidationError::InvalidProcess(
                "pass_name cannot be empty".to_string(),
            ));
        }

        if let Some(compression) = &self.compression {
            if compression.level > 9 {
                return Err(ValidationError::InvalidProcess(format!(
                    "compression level {} is outside 0-9",
                    compression.level
                )));
            }
        }

        if let Some(seed) = &self.random_seed {
            match (seed.mode, seed.seed) {
                (SeedMode::External, None) => {
                    return Err(ValidationError::InvalidProcess(
                        "random_seed mode 'external' requires a seed".to_string(),
                    ));
                }
                (SeedMode::Run | SeedMode::Time, Some(_)) => {
                    log::warn!("random_seed.seed is ignored unless mode is 'external'");
                }
                _ => {}
            }
        }

        for provider in &self.conditions {
            if provider.object.is_empty() || provider.class.is_empty() || provider.module.is_empty() {
                return Err(ValidationError::InvalidConditions(format!(
                    "provider '{}' needs object, class and module",
                    provider.object
                )));
            }
        }

        for (index, processor) in self.sequence.iter().enumerate() {
            processor.validate(index)?;
        }

        Ok(())
    }
}

/// Skim settings
#[derive(Debug, Serialize, Deserialize)]
pub struct SkimConfig {
    #[serde(default = "default_skim_decision")]
    pub default: SkimDecision,
    #[serde(default)]
    pub rules: Vec<SkimRuleConfig>,
}

fn default_skim_decision() -> SkimDecision {
    SkimDecision::Keep
}

/// What happens to an event no processor has an opinion on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkimDecision {
    Keep,
    Drop,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SkimRuleConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Output compression
#[derive(Debug, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub algorithm: Compression,
    #[serde(default = "default_compression_level")]
    pub level: u32,
}

fn default_compression_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

/// Native logging settings
#[derive(Debug, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RandomSeedConfig {
    pub mode: SeedMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
}

/// A conditions object provider to declare
#[derive(Debug, Serialize, Deserialize)]
pub struct ConditionsConfig {
    pub object: String,
    pub class: String,
    pub module: String,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    pub parameters: Parameters,
}

/// One entry of the processor sequence.
///
/// Either `module` (an installed module name or a full `.so` path) or
/// `source` (a C++ file compiled on demand) must be given.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub kind: ProcessorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Extra libraries to link a `source` processor against
    #[serde(default)]
    pub needs: Vec<String>,
    #[serde(default, skip_serializing_if = "Parameters::is_empty")]
    pub parameters: Parameters,
    #[serde(default)]
    pub histograms: Vec<HistogramConfig>,
    /// Per-channel tables loaded into list parameters
    #[serde(default)]
    pub channel_tables: Vec<ChannelTableConfig>,
    /// Installed data files whose paths are set as parameters
    #[serde(default)]
    pub data_files: Vec<DataFileConfig>,
    /// Attach the standard sensitive detectors as `sensitive_detectors`
    #[serde(default)]
    pub standard_sensitive_detectors: bool,
}

impl ProcessorConfig {
    fn validate(&self, index: usize) -> Result<(), ValidationError> {
        let describe = || {
            self.instance
                .clone()
                .unwrap_or_else(|| format!("sequence[{}]", index))
        };
        match (&self.module, &self.source) {
            (Some(_), Some(_)) => {
                return Err(ValidationError::InvalidSequence(format!(
                    "{}: give either module or source, not both",
                    describe()
                )))
            }
            (None, None) => {
                return Err(ValidationError::InvalidSequence(format!(
                    "{}: one of module or source is required",
                    describe()
                )))
            }
            (Some(_), None) => {
                if self.instance.is_none() || self.class.is_none() {
                    return Err(ValidationError::InvalidSequence(format!(
                        "{}: module-based processors need instance and class",
                        describe()
                    )));
                }
                if !self.needs.is_empty() {
                    log::warn!("{}: needs is only used for source-based processors", describe());
                }
            }
            (None, Some(_)) => {}
        }

        for histogram in &self.histograms {
            if histogram.ybins.is_some() != histogram.ylabel.is_some() {
                return Err(ValidationError::InvalidSequence(format!(
                    "{}: histogram '{}' needs both ylabel and ybins for a second axis",
                    describe(),
                    histogram.name
                )));
            }
        }
        Ok(())
    }
}

/// A histogram request; a second axis is added when `ylabel`/`ybins` are set
#[derive(Debug, Serialize, Deserialize)]
pub struct HistogramConfig {
    pub name: String,
    pub xlabel: String,
    pub xbins: Binning,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ylabel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ybins: Option<Binning>,
}

/// A `channel, value` table applied over default values
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelTableConfig {
    /// Parameter receiving the resulting list
    pub parameter: String,
    pub file: String,
    pub defaults: Vec<f64>,
    /// Fail instead of using the defaults when the file is missing
    #[serde(default)]
    pub required: bool,
}

/// Installed data file assigned to a parameter
#[derive(Debug, Serialize, Deserialize)]
pub struct DataFileConfig {
    pub parameter: String,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub file: DataFile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFile {
    /// ONNX model of a veto BDT
    Bdt(String),
    /// Radius-of-containment table
    Roc(String),
    CellXy,
    FieldMap,
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid process configuration: {0}")]
    InvalidProcess(String),
    #[error("Invalid processor sequence: {0}")]
    InvalidSequence(String),
    #[error("Invalid conditions configuration: {0}")]
    InvalidConditions(String),
}
