#[cfg(test)]
mod process_config_tests {
    use std::fs::{self, File};
    use std::io::Write;
    use std::time::{Duration, SystemTime};
    use tempfile::{tempdir, NamedTempFile};

    use ldmxcfg::orchestrator::{build_process, render_parameter_dump, DumpFormat};
    use ldmxcfg::process::SkimRule;
    use ldmxcfg::sensitive_detectors::{standard_set, EcalSd};
    use ldmxcfg::{
        config_loader, ConditionsObjectProvider, ConfigError, EventProcessor, FromFile, Parameter,
        ProcessorKind, Registry, SeedMode,
    };

    fn registry_with_process() -> Registry {
        let mut registry = Registry::with_install_prefix("/opt/ldmx");
        registry.create_process("test").unwrap();
        registry
    }

    /// A second process can never be created while one exists
    #[test]
    fn test_single_process_per_registry() {
        let mut registry = registry_with_process();
        for _ in 0..3 {
            assert!(matches!(
                registry.create_process("again"),
                Err(ConfigError::ProcessAlreadyCreated)
            ));
        }
    }

    /// Every registration path needs a process first
    #[test]
    fn test_registration_requires_process() {
        let mut registry = Registry::with_install_prefix("/opt/ldmx");
        assert!(registry.add_library("/tmp/libX.so").is_err());
        assert!(registry.add_module("Ecal").is_err());
        assert!(registry
            .declare_conditions_object_provider(ConditionsObjectProvider::new("A", "a::A", "M"))
            .is_err());
        assert!(EventProcessor::analyzer(&mut registry, "a", "A", "DQM").is_err());
        assert!(EcalSd::new(&mut registry).is_err());
        assert!(standard_set(&mut registry).is_err());
    }

    /// CMake, C++ and library spellings of a module load the same library
    #[test]
    fn test_module_spellings_are_equivalent() {
        let mut registry = registry_with_process();
        registry.add_module("Ecal/Event").unwrap();
        registry.add_module("Ecal::Event").unwrap();
        registry.add_module("Ecal_Event").unwrap();

        let libs = &registry.process().unwrap().libraries;
        let tail: Vec<&String> = libs.iter().rev().take(3).collect();
        assert!(tail.iter().all(|l| *l == "/opt/ldmx/lib/libEcal_Event.so"));
    }

    /// Re-declaring a provider replaces it without moving it
    #[test]
    fn test_provider_replacement_keeps_position() {
        let mut registry = registry_with_process();
        ConditionsObjectProvider::declare(&mut registry, "EcalGains", "ecal::Gains", "Ecal").unwrap();
        ConditionsObjectProvider::declare(&mut registry, "HcalGains", "hcal::Gains", "Hcal").unwrap();
        let before: Vec<String> = registry
            .process()
            .unwrap()
            .conditions_object_providers()
            .map(|c| c.object_name.clone())
            .collect();

        ConditionsObjectProvider::declare(&mut registry, "EcalGains", "ecal::Gains", "Ecal")
            .unwrap()
            .set("version", 2);

        let process = registry.process().unwrap();
        let after: Vec<_> = process.conditions_object_providers().collect();
        assert_eq!(after.len(), before.len());
        let names: Vec<String> = after.iter().map(|c| c.object_name.clone()).collect();
        assert_eq!(names, before);
        let ecal = after.iter().find(|c| c.object_name == "EcalGains").unwrap();
        assert_eq!(ecal.get("version"), Some(&Parameter::Int(2)));
    }

    /// Setting the global tag reaches registered providers, and later ones inherit it
    #[test]
    fn test_global_tag_reaches_providers() {
        let mut registry = registry_with_process();
        ConditionsObjectProvider::declare(&mut registry, "EcalGains", "ecal::Gains", "Ecal").unwrap();
        registry.process_mut().unwrap().set_conditions_global_tag("v12");

        let late = ConditionsObjectProvider::declare(&mut registry, "HcalGains", "hcal::Gains", "Hcal")
            .unwrap();
        assert_eq!(late.tag_name, "v12");
        assert!(registry
            .process()
            .unwrap()
            .conditions_object_providers()
            .all(|c| c.tag_name == "v12"));
    }

    #[test]
    fn test_skim_rules_and_compression() {
        let mut registry = registry_with_process();
        let process = registry.process_mut().unwrap();
        process.skim_consider("foo");
        process.skim_consider_labelled("bar", "baz");
        assert_eq!(
            process.skim_rules,
            vec![SkimRule::new("foo", ""), SkimRule::new("bar", "baz")]
        );

        process.set_compression(2, 9);
        assert_eq!(process.compression_setting, 209);
        process.set_compression(0, 0);
        assert_eq!(process.compression_setting, 0);
    }

    #[test]
    fn test_seed_service_modes() {
        let mut registry = registry_with_process();
        let process = registry.process_mut().unwrap();
        assert_eq!(process.random_number_seed_service().seed_mode(), Some(SeedMode::Run));
        process.random_number_seed_service().external(1234);
        process.random_number_seed_service().time();

        let service = process.random_number_seed_service();
        assert_eq!(service.seed_mode(), Some(SeedMode::Time));
        assert_eq!(service.seed(), Some(1234));
    }

    #[test]
    fn test_histogram_binning() {
        let mut registry = registry_with_process();
        let mut p = EventProcessor::analyzer(&mut registry, "dqm", "dqm::Dqm", "DQM").unwrap();
        p.build_1d_histogram("h", "x", (10, 0.0, 1.0));
        p.build_1d_histogram("h", "x", vec![0.0, 0.5, 1.0]);

        let uniform = &p.histograms[0].xbins;
        assert_eq!(uniform.len(), 11);
        assert_eq!(uniform[0], 0.0);
        assert_eq!(uniform[10], 1.0);
        assert_eq!(p.histograms[1].xbins, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_from_file_reuses_newer_library() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("Counter.cxx");
        File::create(&source).unwrap();
        let library = File::create(dir.path().join("libCounter.so")).unwrap();
        library
            .set_modified(SystemTime::now() + Duration::from_secs(3600))
            .unwrap();

        // a compiler that always fails proves it was never invoked
        let mut registry = registry_with_process().with_compiler_program("false");
        let p = EventProcessor::from_file(
            &mut registry,
            ProcessorKind::Analyzer,
            FromFile::new(&source).needs("DetDescr").quiet(),
        )
        .unwrap();
        assert_eq!(p.class_name, "Counter");
    }

    #[cfg(unix)]
    #[test]
    fn test_from_file_compiler_failure_propagates() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("Counter.cxx");
        File::create(&source).unwrap();

        let mut registry = registry_with_process().with_compiler_program("false");
        let err = EventProcessor::from_file(&mut registry, ProcessorKind::Analyzer, FromFile::new(&source))
            .unwrap_err();
        assert!(matches!(err, ConfigError::CompilationFailed { .. }));
    }

    #[test]
    fn test_yaml_run_description_end_to_end() {
        let work = tempdir().unwrap();
        let events = work.path().join("events");
        fs::create_dir(&events).unwrap();
        File::create(events.join("run1.root")).unwrap();
        File::create(events.join("run1.log")).unwrap();

        let yaml = r#"
pass_name: reco
run: 1
input_dirs: [events]
output_files: [reco.root]
keep: ["drop .*SimHits.*"]
global_tag: v14
random_seed:
  mode: external
  seed: 42
skim:
  default: drop
  rules:
    - name: ecalVeto
conditions:
  - object: EcalGains
    class: ecal::EcalGainProvider
    module: Ecal
sequence:
  - kind: producer
    instance: ecalVeto
    class: ecal::EcalVetoProcessor
    module: Ecal
    parameters:
      num_ecal_layers: 34
    histograms:
      - {name: energy, xlabel: E, xbins: {bins: 5, min: 0.0, max: 5.0}}
"#;
        let mut config_file = NamedTempFile::new_in(work.path()).unwrap();
        write!(config_file, "{}", yaml).unwrap();

        let config = config_loader::load_config(config_file.path()).unwrap();
        let mut registry = Registry::with_install_prefix("/opt/ldmx");
        build_process(&config, work.path(), &mut registry).unwrap();
        let process = registry.process().unwrap();

        assert_eq!(process.input_files.len(), 1);
        assert!(process.input_files[0].ends_with("run1.root"));

        let report = process.to_string();
        assert!(report.contains("Process with pass name 'reco'"));
        assert!(report.contains("\n Files:"));
        assert!(report.contains("run1.root' -> 'reco.root'"));
        assert!(report.contains("\n  Default: drop the event"));

        let json = render_parameter_dump(process, DumpFormat::Json).unwrap();
        let dump: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(dump["conditionsGlobalTag"], "v14");
        assert_eq!(dump["sequence"][0]["num_ecal_layers"], 34);
        assert!(dump["sequence"][0].get("histograms").is_none());
        assert!(dump.get("libraries").is_none());
        assert_eq!(dump["skimRules"][0]["namePattern"], "ecalVeto");
        assert_eq!(dump["skimRules"][0]["labelPattern"], "");
        let providers = dump["conditionsObjectProviders"].as_array().unwrap();
        assert_eq!(providers.len(), 2);
        assert!(providers.iter().all(|p| p["tagName"] == "v14"));
        assert_eq!(dump["randomNumberSeedService"]["seedMode"], "external");
        assert_eq!(dump["randomNumberSeedService"]["seed"], 42);
    }
}
