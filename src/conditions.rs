//! Conditions object providers.
//!
//! A provider names a source of calibration or conditions data. The process
//! keeps at most one provider per [`ProviderKey`]; declaring a provider with
//! a key that is already registered replaces the earlier one in place.

use crate::error::Result;
use crate::parameter::{Parameter, Parameters};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a provider: the object it provides and the class providing it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderKey {
    pub object_name: String,
    pub class_name: String,
}

/// Configuration of one native conditions object provider
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionsObjectProvider {
    pub object_name: String,
    pub class_name: String,
    /// Module the provider class is compiled into
    pub module_name: String,
    /// Conditions generation, stamped from the process global tag
    pub tag_name: String,
    pub parameters: Parameters,
}

impl ConditionsObjectProvider {
    pub fn new(object_name: &str, class_name: &str, module_name: &str) -> Self {
        Self {
            object_name: object_name.to_string(),
            class_name: class_name.to_string(),
            module_name: module_name.to_string(),
            tag_name: String::new(),
            parameters: Parameters::new(),
        }
    }

    /// Load the provider's module and register the provider with the process.
    ///
    /// Returns the registered provider so it can be configured further.
    pub fn declare<'r>(
        registry: &'r mut Registry,
        object_name: &str,
        class_name: &str,
        module_name: &str,
    ) -> Result<&'r mut ConditionsObjectProvider> {
        registry.add_module(module_name)?;
        registry.declare_conditions_object_provider(Self::new(object_name, class_name, module_name))
    }

    pub fn key(&self) -> ProviderKey {
        ProviderKey {
            object_name: self.object_name.clone(),
            class_name: self.class_name.clone(),
        }
    }

    pub fn set_tag(&mut self, tag: &str) {
        self.tag_name = tag.to_string();
    }

    pub fn set(&mut self, key: &str, value: impl Into<Parameter>) -> &mut Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Parameter> {
        self.parameters.get(key)
    }

    pub fn attributes(&self) -> Parameters {
        let mut attrs = Parameters::new();
        attrs.insert("objectName".to_string(), self.object_name.clone().into());
        attrs.insert("className".to_string(), self.class_name.clone().into());
        attrs.insert("tagName".to_string(), self.tag_name.clone().into());
        for (k, v) in &self.parameters {
            attrs.insert(k.clone(), v.clone());
        }
        attrs
    }
}

impl From<&ConditionsObjectProvider> for Parameter {
    fn from(provider: &ConditionsObjectProvider) -> Self {
        Parameter::Table(provider.attributes())
    }
}

impl fmt::Display for ConditionsObjectProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  ConditionsObjectProvider({} of class {}, tag='{}')",
            self.object_name, self.class_name, self.tag_name
        )?;
        write!(f, "\n   Parameters:")?;
        for (k, v) in self.attributes() {
            write!(f, "\n    {} : {}", k, v)?;
        }
        Ok(())
    }
}

pub const SEED_SERVICE_OBJECT: &str = "RandomNumberSeedService";
pub const SEED_SERVICE_CLASS: &str = "framework::RandomNumberSeedService";
pub const SEED_SERVICE_MODULE: &str = "Framework";

/// How the master random number seed is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedMode {
    /// Derived from the run number
    Run,
    /// Given explicitly
    External,
    /// Derived from the wall clock
    Time,
}

impl SeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeedMode::Run => "run",
            SeedMode::External => "external",
            SeedMode::Time => "time",
        }
    }

    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "run" => Some(SeedMode::Run),
            "external" => Some(SeedMode::External),
            "time" => Some(SeedMode::Time),
            _ => None,
        }
    }
}

/// Provider for the random number seed service, in `run` mode
pub fn seed_service_provider() -> ConditionsObjectProvider {
    let mut provider =
        ConditionsObjectProvider::new(SEED_SERVICE_OBJECT, SEED_SERVICE_CLASS, SEED_SERVICE_MODULE);
    provider.set("seedMode", SeedMode::Run.as_str());
    // only read in external mode
    provider.set("seed", -1);
    provider
}

/// Mutable view on the registered random number seed service.
///
/// The modes are mutually exclusive; the last one set wins.
pub struct RandomNumberSeedService<'a> {
    provider: &'a mut ConditionsObjectProvider,
}

impl<'a> RandomNumberSeedService<'a> {
    pub fn new(provider: &'a mut ConditionsObjectProvider) -> Self {
        Self { provider }
    }

    /// Base random number seeds off of the run number
    pub fn run(&mut self) {
        self.provider.set("seedMode", SeedMode::Run.as_str());
    }

    /// Use `seed` as the master random number seed
    pub fn external(&mut self, seed: i64) {
        self.provider.set("seedMode", SeedMode::External.as_str());
        self.provider.set("seed", seed);
    }

    /// Base the master random number seed on the time
    pub fn time(&mut self) {
        self.provider.set("seedMode", SeedMode::Time.as_str());
    }

    pub fn seed_mode(&self) -> Option<SeedMode> {
        self.provider
            .get("seedMode")
            .and_then(Parameter::as_str)
            .and_then(SeedMode::parse)
    }

    pub fn seed(&self) -> Option<i64> {
        self.provider.get("seed").and_then(Parameter::as_i64)
    }

    pub fn provider(&self) -> &ConditionsObjectProvider {
        &*self.provider
    }
}
