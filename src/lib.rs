//! # ldmxcfg - Run configuration builder for the LDMX event-processing framework
//!
//! This library builds the configuration handed to the native framework
//! runner: which event processors to run and in what order, which libraries
//! to load, which conditions providers supply calibrations, where events are
//! read from and written to, and which events and products are kept.
//!
//! ## Overview
//!
//! All configuration objects are plain data. The only logic lives in how
//! they register with the single [`Process`] of a configuration:
//!
//! - a [`Registry`] owns at most one process; building a processor, provider
//!   or sensitive detector without one is an error
//! - processors and providers add the library they live in to the process
//! - providers are de-duplicated by object and class name, the later
//!   declaration replacing the earlier one in place
//! - the global conditions tag is stamped onto every provider
//!
//! ## Architecture
//!
//! - `registry`: the build context holding the process
//! - `process`: run settings, skim rules, parameter dump and report
//! - `processor`: producers and analyzers, including compile-on-demand ones
//! - `build`: external compiler invocation for single-file processors
//! - `conditions`: conditions object providers and the random seed service
//! - `histogram`: histogram requests attached to processors
//! - `sensitive_detectors`: simulation sensitive detector descriptors
//! - `parameter`: open configuration values
//! - `config`, `config_loader`, `orchestrator`: YAML run descriptions
//! - `utils`: installed data paths, calibration tables, rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use ldmxcfg::{EventProcessor, Registry};
//!
//! let mut registry = Registry::with_install_prefix("/opt/ldmx");
//! registry.create_process("reco")?;
//!
//! let mut veto = EventProcessor::producer(&mut registry, "ecalVeto", "ecal::EcalVetoProcessor", "Ecal")?;
//! veto.set("num_ecal_layers", 34);
//!
//! let process = registry.process_mut()?;
//! process.sequence.push(veto);
//! process.skim_default_is_drop();
//! process.skim_consider("ecalVeto");
//! process.set_compression(2, 9);
//!
//! let dump = process.parameter_dump();
//! assert_eq!(dump.as_table().unwrap()["compressionSetting"].as_i64(), Some(209));
//! # Ok::<(), ldmxcfg::ConfigError>(())
//! ```
//!
//! ## Error Handling
//!
//! Library operations return [`ConfigError`]. The YAML loader, the
//! orchestrator and the `ldmxcfg` binary use `color_eyre` for reporting with
//! context.

pub mod build;
pub mod conditions;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod histogram;
pub mod orchestrator;
pub mod parameter;
pub mod process;
pub mod processor;
pub mod registry;
pub mod sensitive_detectors;
pub mod utils;

pub use conditions::{ConditionsObjectProvider, ProviderKey, RandomNumberSeedService, SeedMode};
pub use error::ConfigError;
pub use histogram::{Binning, Histogram};
pub use parameter::{Parameter, Parameters};
pub use process::Process;
pub use processor::{EventProcessor, FromFile, ProcessorKind};
pub use registry::Registry;
pub use sensitive_detectors::SensitiveDetector;
