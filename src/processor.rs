//! Event processor descriptors.
//!
//! An [`EventProcessor`] names one unit of native work (a producer or an
//! analyzer), the library it lives in, its user parameters and the
//! histograms it should book. Descriptors are built against a
//! [`Registry`] so the owning library gets loaded by the process, but they
//! are only run if the caller puts them into [`Process::sequence`].
//!
//! [`Process::sequence`]: crate::process::Process::sequence

use crate::build;
use crate::error::{ConfigError, Result};
use crate::histogram::{Binning, Histogram};
use crate::parameter::{Parameter, Parameters};
use crate::registry::Registry;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which native base class a processor derives from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
    /// Adds objects to the event bus
    Producer,
    /// Reads the event bus only
    Analyzer,
}

impl ProcessorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorKind::Producer => "Producer",
            ProcessorKind::Analyzer => "Analyzer",
        }
    }
}

/// Options for [`EventProcessor::from_file`]
#[derive(Debug, Clone)]
pub struct FromFile {
    /// C++ source file holding the processor (relative paths resolve against the working directory)
    pub source: PathBuf,
    /// Processor class; defaults to the file stem
    pub class_name: Option<String>,
    /// Instance name; defaults to the class name
    pub instance_name: Option<String>,
    /// Libraries to link in addition to `Framework`
    pub needs: Vec<String>,
    /// Log a notice when compilation is triggered
    pub compile_notice: bool,
    /// Parameters applied to the constructed processor
    pub parameters: Parameters,
}

impl FromFile {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            class_name: None,
            instance_name: None,
            needs: Vec::new(),
            compile_notice: true,
            parameters: Parameters::new(),
        }
    }

    pub fn class_name(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_string());
        self
    }

    pub fn instance_name(mut self, instance_name: &str) -> Self {
        self.instance_name = Some(instance_name.to_string());
        self
    }

    pub fn needs(mut self, library: &str) -> Self {
        self.needs.push(library.to_string());
        self
    }

    pub fn quiet(mut self) -> Self {
        self.compile_notice = false;
        self
    }

    pub fn parameter(mut self, key: &str, value: impl Into<Parameter>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }
}

/// Configuration of one native event processor
#[derive(Debug, Clone, PartialEq)]
pub struct EventProcessor {
    pub kind: ProcessorKind,
    pub instance_name: String,
    pub class_name: String,
    pub histograms: Vec<Histogram>,
    pub parameters: Parameters,
}

impl EventProcessor {
    /// Describe a processor and make sure the process loads its library.
    ///
    /// `module` ending in `.so` is taken as a full library path, anything
    /// else as the name of the module the class is compiled into.
    pub fn new(
        registry: &mut Registry,
        kind: ProcessorKind,
        instance_name: &str,
        class_name: &str,
        module: &str,
    ) -> Result<Self> {
        if module.ends_with(".so") {
            registry.add_library(module)?;
        } else {
            registry.add_module(module)?;
        }
        debug!("Declared {} {} of class {}", kind.as_str(), instance_name, class_name);
        Ok(Self {
            kind,
            instance_name: instance_name.to_string(),
            class_name: class_name.to_string(),
            histograms: Vec::new(),
            parameters: Parameters::new(),
        })
    }

    pub fn producer(
        registry: &mut Registry,
        instance_name: &str,
        class_name: &str,
        module: &str,
    ) -> Result<Self> {
        Self::new(registry, ProcessorKind::Producer, instance_name, class_name, module)
    }

    pub fn analyzer(
        registry: &mut Registry,
        instance_name: &str,
        class_name: &str,
        module: &str,
    ) -> Result<Self> {
        Self::new(registry, ProcessorKind::Analyzer, instance_name, class_name, module)
    }

    /// Build a processor from a single C++ source file.
    ///
    /// The source is compiled into `lib<stem>.so` next to it when that
    /// library is missing or older than the source. An existing library is
    /// never removed, so changing `needs` requires deleting it by hand.
    pub fn from_file(registry: &mut Registry, kind: ProcessorKind, options: FromFile) -> Result<Self> {
        // fail before touching the compiler
        registry.process_for("creating any EventProcessors")?;

        if !options.source.is_file() {
            return Err(ConfigError::SourceNotAccessible {
                path: options.source,
            });
        }
        let source = options
            .source
            .canonicalize()
            .map_err(|e| ConfigError::io(&options.source, e))?;

        let class_name = match options.class_name {
            Some(name) => name,
            None => source
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
        };
        let instance_name = options.instance_name.unwrap_or_else(|| class_name.clone());

        let library = build::ensure_compiled(
            &registry.compiler(),
            &source,
            &options.needs,
            options.compile_notice,
        )?;

        let mut processor = Self::new(
            registry,
            kind,
            &instance_name,
            &class_name,
            &library.display().to_string(),
        )?;
        processor.parameters.extend(options.parameters);
        Ok(processor)
    }

    /// Set a user parameter, overwriting an earlier value
    pub fn set(&mut self, key: &str, value: impl Into<Parameter>) -> &mut Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Parameter> {
        self.parameters.get(key)
    }

    /// Request a 1D histogram
    ///
    /// # Examples
    /// ```
    /// use ldmxcfg::{EventProcessor, Registry};
    ///
    /// let mut registry = Registry::with_install_prefix("/opt/ldmx");
    /// registry.create_process("test")?;
    /// let mut dqm = EventProcessor::analyzer(&mut registry, "dqm", "dqm::EcalDQM", "DQM")?;
    /// dqm.build_1d_histogram("energy", "Energy [MeV]", (10, 0.0, 1.0));
    /// dqm.build_1d_histogram("layer", "Layer", vec![0.0, 0.5, 1.0]);
    /// assert_eq!(dqm.histograms[0].xbins.len(), 11);
    /// assert_eq!(dqm.histograms[1].xbins, vec![0.0, 0.5, 1.0]);
    /// # Ok::<(), ldmxcfg::ConfigError>(())
    /// ```
    pub fn build_1d_histogram(&mut self, name: &str, xlabel: &str, bins: impl Into<Binning>) {
        let edges = bins.into().edges();
        self.histograms
            .push(Histogram::one_dimensional(name, xlabel, edges));
    }

    /// Request a 2D histogram
    pub fn build_2d_histogram(
        &mut self,
        name: &str,
        xlabel: &str,
        xbins: impl Into<Binning>,
        ylabel: &str,
        ybins: impl Into<Binning>,
    ) {
        self.histograms.push(Histogram::two_dimensional(
            name,
            xlabel,
            xbins.into().edges(),
            ylabel,
            ybins.into().edges(),
        ));
    }

    /// Attribute dictionary handed to the native runner
    pub fn attributes(&self) -> Parameters {
        let mut attrs = Parameters::new();
        attrs.insert("instanceName".to_string(), self.instance_name.clone().into());
        attrs.insert("className".to_string(), self.class_name.clone().into());
        attrs.insert(
            "histograms".to_string(),
            Parameter::List(self.histograms.iter().map(Parameter::from).collect()),
        );
        for (k, v) in &self.parameters {
            attrs.insert(k.clone(), v.clone());
        }
        attrs
    }
}

impl From<&EventProcessor> for Parameter {
    fn from(processor: &EventProcessor) -> Self {
        Parameter::Table(processor.attributes())
    }
}

impl fmt::Display for EventProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  {}({} of class {})",
            self.kind.as_str(),
            self.instance_name,
            self.class_name
        )?;
        write!(f, "\n   Parameters:")?;
        for (k, v) in self.attributes() {
            write!(f, "\n    {} : {}", k, v)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    fn registry() -> Registry {
        let mut registry = Registry::with_install_prefix("/opt/ldmx");
        registry.create_process("test").unwrap();
        registry
    }

    #[test]
    fn test_module_and_library_registration() {
        let mut registry = registry();
        EventProcessor::producer(&mut registry, "ecalDigis", "ecal::EcalDigiProducer", "Ecal")
            .unwrap();
        EventProcessor::analyzer(&mut registry, "mine", "MyAna", "/home/me/libMyAna.so").unwrap();

        let libs = &registry.process().unwrap().libraries;
        assert!(libs.contains(&"/opt/ldmx/lib/libEcal.so".to_string()));
        assert!(libs.contains(&"/home/me/libMyAna.so".to_string()));
    }

    #[test]
    fn test_requires_process() {
        let mut registry = Registry::with_install_prefix("/opt/ldmx");
        let err = EventProcessor::producer(&mut registry, "a", "A", "Ecal").unwrap_err();
        assert!(matches!(err, ConfigError::NoProcess { .. }));
    }

    #[test]
    fn test_attributes_order_and_parameters() {
        let mut registry = registry();
        let mut p = EventProcessor::producer(&mut registry, "hits", "HitProducer", "Recon").unwrap();
        p.set("threshold", 0.5).set("nChannels", 12);
        p.set("threshold", 0.75);

        let keys: Vec<String> = p.attributes().keys().cloned().collect();
        assert_eq!(keys, vec!["instanceName", "className", "histograms", "threshold", "nChannels"]);
        assert_eq!(p.get("threshold"), Some(&Parameter::Float(0.75)));
    }

    #[test]
    fn test_2d_histogram_mixed_binning() {
        let mut registry = registry();
        let mut p = EventProcessor::analyzer(&mut registry, "dqm", "DQM", "DQM").unwrap();
        p.build_2d_histogram("dummy", "X", vec![0.0, 1.0, 2.0], "Y", (60, 0.0, 10.0));
        let h = &p.histograms[0];
        assert_eq!(h.xbins, vec![0.0, 1.0, 2.0]);
        assert_eq!(h.ybins.len(), 61);
        assert_eq!(h.ylabel, "Y");
    }

    #[test]
    fn test_display() {
        let mut registry = registry();
        let mut p = EventProcessor::producer(&mut registry, "hits", "HitProducer", "Recon").unwrap();
        p.set("gain", 2.0);
        let text = p.to_string();
        assert!(text.starts_with("  Producer(hits of class HitProducer)"));
        assert!(text.contains("\n    gain : 2.0"));
    }

    #[test]
    fn test_from_file_missing_source() {
        let mut registry = registry();
        let err = EventProcessor::from_file(
            &mut registry,
            ProcessorKind::Analyzer,
            FromFile::new("/definitely/not/here/Nope.cxx"),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::SourceNotAccessible { .. }));
    }

    #[test]
    fn test_from_file_reuses_newer_library() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("MyAnalyzer.cxx");
        File::create(&source).unwrap();
        let library = dir.path().join("libMyAnalyzer.so");
        let lib = File::create(&library).unwrap();
        lib.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();

        let mut registry = registry().with_compiler_program("false");
        let p = EventProcessor::from_file(
            &mut registry,
            ProcessorKind::Analyzer,
            FromFile::new(&source).parameter("cut", 3).quiet(),
        )
        .unwrap();

        assert_eq!(p.class_name, "MyAnalyzer");
        assert_eq!(p.instance_name, "MyAnalyzer");
        assert_eq!(p.get("cut"), Some(&Parameter::Int(3)));
        let expected = library.canonicalize().unwrap().display().to_string();
        assert!(registry.process().unwrap().libraries.contains(&expected));
    }

    #[cfg(unix)]
    #[test]
    fn test_from_file_recompiles_stale_library() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("Stale.cxx");
        let library = dir.path().join("libStale.so");
        File::create(&library).unwrap();
        let src = File::create(&source).unwrap();
        src.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();

        let mut registry = registry().with_compiler_program("false");
        let err = EventProcessor::from_file(
            &mut registry,
            ProcessorKind::Producer,
            FromFile::new(&source).quiet(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::CompilationFailed { .. }));
        // the stale library is left alone
        assert!(library.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_from_file_compiles_missing_library() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("Fresh.cxx");
        File::create(&source).unwrap();

        let mut registry = registry().with_compiler_program("true");
        let p = EventProcessor::from_file(
            &mut registry,
            ProcessorKind::Producer,
            FromFile::new(&source)
                .class_name("ana::Fresh")
                .instance_name("fresh")
                .needs("DetDescr")
                .quiet(),
        )
        .unwrap();
        assert_eq!(p.class_name, "ana::Fresh");
        assert_eq!(p.instance_name, "fresh");
    }
}
