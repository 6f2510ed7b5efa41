//! Process configuration.
//!
//! A [`Process`] is the single source of truth for one run of the native
//! framework: event limits, files, the processor sequence, libraries to load,
//! conditions providers and skim/keep rules. It is created through a
//! [`Registry`](crate::registry::Registry), which enforces one process per
//! build graph.

pub mod report;
pub mod types;

pub use types::{compression_setting, Compression, LogLevel, SkimRule, DEFAULT_COMPRESSION_LEVEL};

use crate::conditions::{
    seed_service_provider, ConditionsObjectProvider, ProviderKey, RandomNumberSeedService,
    SEED_SERVICE_CLASS, SEED_SERVICE_OBJECT,
};
use crate::error::{ConfigError, Result};
use crate::parameter::{Parameter, Parameters};
use crate::processor::EventProcessor;
use indexmap::map::Entry;
use indexmap::IndexMap;
use log::debug;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// Extension of event files picked up by [`Process::input_dir`]
pub const EVENT_FILE_EXTENSION: &str = ".root";

/// Attribute keys left out of [`Process::parameter_dump`] at every level
pub const KEYS_TO_SKIP: &[&str] = &["histograms", "libraries"];

/// Installed shared library for a module.
///
/// Module names may use CMake (`Ecal/Event`), C++ (`Ecal::Event`) or library
/// (`Ecal_Event`) syntax; all three give the same path.
///
/// # Examples
/// ```
/// use ldmxcfg::process::module_library_path;
/// use std::path::Path;
///
/// let prefix = Path::new("/opt/ldmx");
/// assert_eq!(module_library_path(prefix, "Ecal::Event"), "/opt/ldmx/lib/libEcal_Event.so");
/// assert_eq!(module_library_path(prefix, "Ecal/Event"), "/opt/ldmx/lib/libEcal_Event.so");
/// ```
pub fn module_library_path(install_prefix: &Path, module: &str) -> String {
    let actual_module_name = module.replace('/', "_").replace("::", "_");
    install_prefix
        .join("lib")
        .join(format!("lib{}.so", actual_module_name))
        .display()
        .to_string()
}

/// Configuration for one run of the native framework
#[derive(Debug, Clone)]
pub struct Process {
    /// Short reference name for this run
    pub pass_name: String,
    /// Maximum number of events to process, negative for no limit
    pub max_events: i64,
    /// Attempts in a row before giving up on an event (production mode only)
    pub max_tries_per_event: i64,
    /// Run number, negative when unset
    pub run: i64,
    pub input_files: Vec<String>,
    pub output_files: Vec<String>,
    /// Processors the event bus is handed to, in order
    pub sequence: Vec<EventProcessor>,
    /// Rules to keep or drop objects from the event bus
    pub keep: Vec<String>,
    /// Libraries to load before any processor is built; may repeat
    pub libraries: Vec<String>,
    pub skim_default_is_keep: bool,
    pub skim_rules: Vec<SkimRule>,
    /// Print the event number every this many events, negative to disable
    pub log_frequency: i64,
    pub term_log_level: LogLevel,
    pub file_log_level: LogLevel,
    /// File logging is only set up when this is non-empty
    pub log_file_name: String,
    pub compression_setting: i64,
    pub histogram_file: String,
    pub tree_name: String,
    /// Extra keys handed to the runner unchanged
    pub parameters: Parameters,
    conditions_global_tag: String,
    conditions_object_providers: IndexMap<ProviderKey, ConditionsObjectProvider>,
    install_prefix: PathBuf,
}

impl Process {
    pub(crate) fn new(pass_name: &str, install_prefix: &Path) -> Self {
        Self {
            pass_name: pass_name.to_string(),
            max_events: -1,
            max_tries_per_event: 1,
            run: -1,
            input_files: Vec::new(),
            output_files: Vec::new(),
            sequence: Vec::new(),
            keep: Vec::new(),
            libraries: Vec::new(),
            skim_default_is_keep: true,
            skim_rules: Vec::new(),
            log_frequency: -1,
            term_log_level: LogLevel::Warn,
            file_log_level: LogLevel::Debug,
            log_file_name: String::new(),
            compression_setting: i64::from(DEFAULT_COMPRESSION_LEVEL),
            histogram_file: String::new(),
            tree_name: "LDMX_Events".to_string(),
            parameters: Parameters::new(),
            conditions_global_tag: "Default".to_string(),
            conditions_object_providers: IndexMap::new(),
            install_prefix: install_prefix.to_path_buf(),
        }
    }

    pub fn install_prefix(&self) -> &Path {
        &self.install_prefix
    }

    /// Add a library to the list of dynamically loaded libraries
    pub fn add_library(&mut self, library: &str) {
        debug!("Adding library {}", library);
        self.libraries.push(library.to_string());
    }

    /// Add the installed library of `module` to the loaded libraries
    pub fn add_module(&mut self, module: &str) {
        let library = module_library_path(&self.install_prefix, module);
        self.add_library(&library);
    }

    /// Register a provider, replacing an earlier one with the same key in place.
    ///
    /// The provider's tag is set to the current global tag.
    pub fn declare_conditions_object_provider(
        &mut self,
        mut provider: ConditionsObjectProvider,
    ) -> &mut ConditionsObjectProvider {
        provider.set_tag(&self.conditions_global_tag);
        match self.conditions_object_providers.entry(provider.key()) {
            Entry::Occupied(mut entry) => {
                debug!("Overriding conditions object provider {}", provider.object_name);
                entry.insert(provider);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(provider),
        }
    }

    pub fn conditions_global_tag(&self) -> &str {
        &self.conditions_global_tag
    }

    /// Set the global tag and pass it to every registered provider
    pub fn set_conditions_global_tag(&mut self, tag: &str) {
        self.conditions_global_tag = tag.to_string();
        for provider in self.conditions_object_providers.values_mut() {
            provider.set_tag(tag);
        }
    }

    /// Registered providers in declaration order
    pub fn conditions_object_providers(&self) -> impl Iterator<Item = &ConditionsObjectProvider> {
        self.conditions_object_providers.values()
    }

    pub fn conditions_object_provider(&self, key: &ProviderKey) -> Option<&ConditionsObjectProvider> {
        self.conditions_object_providers.get(key)
    }

    pub fn conditions_object_provider_mut(
        &mut self,
        key: &ProviderKey,
    ) -> Option<&mut ConditionsObjectProvider> {
        self.conditions_object_providers.get_mut(key)
    }

    fn seed_service_key() -> ProviderKey {
        ProviderKey {
            object_name: SEED_SERVICE_OBJECT.to_string(),
            class_name: SEED_SERVICE_CLASS.to_string(),
        }
    }

    /// The random number seed service declared with this process
    pub fn random_number_seed_service(&mut self) -> RandomNumberSeedService<'_> {
        let tag = self.conditions_global_tag.clone();
        let provider = self
            .conditions_object_providers
            .entry(Self::seed_service_key())
            .or_insert_with(|| {
                let mut provider = seed_service_provider();
                provider.set_tag(&tag);
                provider
            });
        RandomNumberSeedService::new(provider)
    }

    /// Keep every event unless a processor says otherwise
    pub fn skim_default_is_save(&mut self) {
        self.skim_default_is_keep = true;
    }

    /// Drop every event unless a processor says otherwise
    pub fn skim_default_is_drop(&mut self) {
        self.skim_default_is_keep = false;
    }

    /// Listen to storage hints from processors whose names match `name_pattern`
    pub fn skim_consider(&mut self, name_pattern: &str) {
        self.skim_rules.push(SkimRule::new(name_pattern, ""));
    }

    /// Listen to storage hints whose label matches `label_pattern` from
    /// processors whose names match `name_pattern`
    pub fn skim_consider_labelled(&mut self, name_pattern: &str, label_pattern: &str) {
        self.skim_rules.push(SkimRule::new(name_pattern, label_pattern));
    }

    /// Set the compression of output files to `algorithm * 100 + level`
    pub fn set_compression(&mut self, algorithm: u32, level: u32) {
        self.compression_setting = compression_setting(algorithm, level);
    }

    /// Compress output files with `algorithm` at the default level
    pub fn set_compression_algorithm(&mut self, algorithm: u32) {
        self.set_compression(algorithm, DEFAULT_COMPRESSION_LEVEL);
    }

    /// Append every event file directly inside `dir` to the input files.
    ///
    /// Not recursive. Files are added by absolute path in name order.
    /// Returns the number of files added.
    pub fn input_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        let full_path_dir = dir.canonicalize().map_err(|e| ConfigError::io(dir, e))?;
        let mut found = Vec::new();
        for entry in fs::read_dir(&full_path_dir).map_err(|e| ConfigError::io(&full_path_dir, e))? {
            let entry = entry.map_err(|e| ConfigError::io(&full_path_dir, e))?;
            let path = entry.path();
            let is_event_file = path
                .file_name()
                .map(|name| name.to_string_lossy().ends_with(EVENT_FILE_EXTENSION))
                .unwrap_or(false);
            if path.is_file() && is_event_file {
                found.push(path.display().to_string());
            }
        }
        found.sort();
        debug!("Found {} event files in {}", found.len(), full_path_dir.display());
        let count = found.len();
        self.input_files.extend(found);
        Ok(count)
    }

    /// Attribute dictionary of the whole process, nothing left out
    pub fn attributes(&self) -> Parameters {
        let mut attrs = Parameters::new();
        attrs.insert("passName".to_string(), self.pass_name.clone().into());
        attrs.insert("maxEvents".to_string(), self.max_events.into());
        attrs.insert("maxTriesPerEvent".to_string(), self.max_tries_per_event.into());
        attrs.insert("run".to_string(), self.run.into());
        attrs.insert("inputFiles".to_string(), self.input_files.clone().into());
        attrs.insert("outputFiles".to_string(), self.output_files.clone().into());
        attrs.insert(
            "sequence".to_string(),
            Parameter::List(self.sequence.iter().map(Parameter::from).collect()),
        );
        attrs.insert("keep".to_string(), self.keep.clone().into());
        attrs.insert("libraries".to_string(), self.libraries.clone().into());
        attrs.insert("skimDefaultIsKeep".to_string(), self.skim_default_is_keep.into());
        attrs.insert(
            "skimRules".to_string(),
            Parameter::List(self.skim_rules.iter().map(Parameter::from).collect()),
        );
        attrs.insert("logFrequency".to_string(), self.log_frequency.into());
        attrs.insert("termLogLevel".to_string(), self.term_log_level.as_i64().into());
        attrs.insert("fileLogLevel".to_string(), self.file_log_level.as_i64().into());
        attrs.insert("logFileName".to_string(), self.log_file_name.clone().into());
        attrs.insert("compressionSetting".to_string(), self.compression_setting.into());
        attrs.insert("histogramFile".to_string(), self.histogram_file.clone().into());
        attrs.insert(
            "conditionsGlobalTag".to_string(),
            self.conditions_global_tag.clone().into(),
        );
        attrs.insert(
            "conditionsObjectProviders".to_string(),
            Parameter::List(self.conditions_object_providers().map(Parameter::from).collect()),
        );
        attrs.insert("tree_name".to_string(), self.tree_name.clone().into());
        if let Some(service) = self.conditions_object_providers.get(&Self::seed_service_key()) {
            attrs.insert("randomNumberSeedService".to_string(), Parameter::from(service));
        }
        for (k, v) in &self.parameters {
            attrs.insert(k.clone(), v.clone());
        }
        attrs
    }

    /// Snapshot of every configuration parameter attached to the process,
    /// without histogram requests and the library list.
    pub fn parameter_dump(&self) -> Parameter {
        Parameter::Table(self.attributes()).extract(KEYS_TO_SKIP)
    }

    /// Print the process report and wait for Enter on stdin
    pub fn pause(&self) -> Result<()> {
        println!("{}", self);
        print!("Press Enter to continue...");
        io::stdout().flush().map_err(|e| ConfigError::io("stdout", e))?;
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| ConfigError::io("stdin", e))?;
        Ok(())
    }
}
