//! # Configuration registry
//!
//! The [`Registry`] is the context every configuration object is built
//! against. It owns at most one [`Process`] at a time, so creating a second
//! process fails, and registering anything before a process exists fails.
//!
//! ```
//! use ldmxcfg::{ConditionsObjectProvider, EventProcessor, Registry};
//!
//! let mut registry = Registry::with_install_prefix("/opt/ldmx");
//! registry.create_process("reco")?;
//!
//! let digis = EventProcessor::producer(&mut registry, "ecalDigis", "ecal::EcalDigiProducer", "Ecal")?;
//! ConditionsObjectProvider::declare(&mut registry, "EcalGains", "ecal::EcalGainProvider", "Ecal")?;
//!
//! let process = registry.process_mut()?;
//! process.sequence.push(digis);
//! process.set_conditions_global_tag("v14");
//! # Ok::<(), ldmxcfg::ConfigError>(())
//! ```
//!
//! ## Install prefix
//!
//! Module libraries resolve to `<prefix>/lib/lib<module>.so`. The prefix is
//! taken from [`Registry::with_install_prefix`], else from the
//! `LDMX_INSTALL_PREFIX` environment variable, else `/usr/local`.

use crate::build::Compiler;
use crate::conditions::{seed_service_provider, ConditionsObjectProvider, SEED_SERVICE_MODULE};
use crate::error::{ConfigError, Result};
use crate::process::Process;
use log::info;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable naming the framework installation
pub const INSTALL_PREFIX_ENV: &str = "LDMX_INSTALL_PREFIX";

/// Installation used when nothing else is configured
pub const DEFAULT_INSTALL_PREFIX: &str = "/usr/local";

/// Install prefix from the environment, or the default
pub fn default_install_prefix() -> PathBuf {
    env::var_os(INSTALL_PREFIX_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_PREFIX))
}

/// Build context holding the single process of a configuration
#[derive(Debug)]
pub struct Registry {
    install_prefix: PathBuf,
    compiler_program: String,
    process: Option<Process>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_install_prefix(default_install_prefix())
    }

    pub fn with_install_prefix(install_prefix: impl Into<PathBuf>) -> Self {
        Self {
            install_prefix: install_prefix.into(),
            compiler_program: "g++".to_string(),
            process: None,
        }
    }

    /// Use another compiler for processors built from source
    pub fn with_compiler_program(mut self, program: &str) -> Self {
        self.compiler_program = program.to_string();
        self
    }

    pub fn install_prefix(&self) -> &Path {
        &self.install_prefix
    }

    pub fn compiler(&self) -> Compiler {
        Compiler::new(&self.install_prefix).with_program(self.compiler_program.clone())
    }

    /// Create the process of this configuration.
    ///
    /// The random number seed service is declared with it, in `run` mode.
    pub fn create_process(&mut self, pass_name: &str) -> Result<&mut Process> {
        if self.process.is_some() {
            return Err(ConfigError::ProcessAlreadyCreated);
        }
        info!("Creating process with pass name '{}'", pass_name);
        let mut process = Process::new(pass_name, &self.install_prefix);
        process.add_module(SEED_SERVICE_MODULE);
        process.declare_conditions_object_provider(seed_service_provider());
        Ok(self.process.insert(process))
    }

    pub fn has_process(&self) -> bool {
        self.process.is_some()
    }

    pub fn process(&self) -> Result<&Process> {
        self.process.as_ref().ok_or(ConfigError::NoProcess {
            action: "using it",
        })
    }

    pub fn process_mut(&mut self) -> Result<&mut Process> {
        self.process_for("using it")
    }

    /// The process, or a [`ConfigError::NoProcess`] naming what needed it
    pub(crate) fn process_for(&mut self, action: &'static str) -> Result<&mut Process> {
        self.process.as_mut().ok_or(ConfigError::NoProcess { action })
    }

    /// Release the process; another one may be created afterwards
    pub fn take_process(&mut self) -> Option<Process> {
        self.process.take()
    }

    /// Add a library to the process's dynamically loaded libraries
    pub fn add_library(&mut self, library: &str) -> Result<()> {
        self.process_for("creating any EventProcessors")?
            .add_library(library);
        Ok(())
    }

    /// Add the installed library of a module to the process's libraries
    pub fn add_module(&mut self, module: &str) -> Result<()> {
        self.process_for("creating any EventProcessors")?
            .add_module(module);
        Ok(())
    }

    /// Register a conditions object provider with the process
    pub fn declare_conditions_object_provider(
        &mut self,
        provider: ConditionsObjectProvider,
    ) -> Result<&mut ConditionsObjectProvider> {
        Ok(self
            .process_for("declaring any ConditionsObjectProviders")?
            .declare_conditions_object_provider(provider))
    }
}
