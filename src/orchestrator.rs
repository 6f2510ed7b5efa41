//! Configuration orchestrator.
//!
//! Turns a validated [`RunConfig`] into a [`Process`] held by a
//! [`Registry`], in the same order a configuration script would: the process
//! first, then global settings and providers, then the processor sequence.
//! Relative paths in the run description resolve against `base_dir`,
//! normally the directory of the YAML file.

use crate::conditions::{ConditionsObjectProvider, SeedMode};
use crate::config::{DataFile, ProcessorConfig, RunConfig, SkimDecision};
use crate::parameter::Parameter;
use crate::process::Process;
use crate::processor::{EventProcessor, FromFile};
use crate::registry::Registry;
use crate::sensitive_detectors::standard_set;
use crate::utils::{
    bdt_path, cell_xy_path, field_map_path, load_channel_table_or_default, read_channel_table,
    roc_path,
};
use clap::ValueEnum;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Serialization of the parameter dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DumpFormat {
    Json,
    Yaml,
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Create the registry's process from `config`
pub fn build_process(config: &RunConfig, base_dir: &Path, registry: &mut Registry) -> Result<()> {
    let process = registry.create_process(&config.pass_name)?;

    if let Some(tag) = &config.global_tag {
        process.set_conditions_global_tag(tag);
    }
    if let Some(run) = config.run {
        process.run = run;
    }
    if let Some(max_events) = config.max_events {
        process.max_events = max_events;
    }
    if let Some(max_tries) = config.max_tries_per_event {
        process.max_tries_per_event = max_tries;
    }
    if let Some(histogram_file) = &config.histogram_file {
        process.histogram_file = histogram_file.clone();
    }
    if let Some(tree_name) = &config.tree_name {
        process.tree_name = tree_name.clone();
    }

    process.input_files.extend(config.input_files.iter().cloned());
    for dir in &config.input_dirs {
        let dir = resolve(base_dir, dir);
        let added = process
            .input_dir(&dir)
            .wrap_err_with(|| format!("Failed to scan input directory '{}'", dir.display()))?;
        info!("Added {} input files from {}", added, dir.display());
    }
    process.output_files.extend(config.output_files.iter().cloned());
    process.keep.extend(config.keep.iter().cloned());

    if let Some(skim) = &config.skim {
        match skim.default {
            SkimDecision::Keep => process.skim_default_is_save(),
            SkimDecision::Drop => process.skim_default_is_drop(),
        }
        for rule in &skim.rules {
            match &rule.label {
                Some(label) => process.skim_consider_labelled(&rule.name, label),
                None => process.skim_consider(&rule.name),
            }
        }
    }

    if let Some(compression) = &config.compression {
        process.set_compression(compression.algorithm.code(), compression.level);
    }

    if let Some(logging) = &config.logging {
        if let Some(frequency) = logging.frequency {
            process.log_frequency = frequency;
        }
        if let Some(level) = logging.term_level {
            process.term_log_level = level;
        }
        if let Some(level) = logging.file_level {
            process.file_log_level = level;
        }
        if let Some(file) = &logging.file {
            process.log_file_name = file.clone();
        }
    }

    if let Some(seed) = &config.random_seed {
        let mut service = process.random_number_seed_service();
        match (seed.mode, seed.seed) {
            (SeedMode::External, Some(value)) => service.external(value),
            (SeedMode::External, None) => {
                return Err(eyre!("random_seed mode 'external' requires a seed"));
            }
            (SeedMode::Run, _) => service.run(),
            (SeedMode::Time, _) => service.time(),
        }
    }

    process
        .parameters
        .extend(config.parameters.iter().map(|(k, v)| (k.clone(), v.clone())));

    for library in &config.libraries {
        registry.add_library(library)?;
    }
    for module in &config.modules {
        registry.add_module(module)?;
    }

    for provider in &config.conditions {
        let declared = ConditionsObjectProvider::declare(
            registry,
            &provider.object,
            &provider.class,
            &provider.module,
        )?;
        declared
            .parameters
            .extend(provider.parameters.iter().map(|(k, v)| (k.clone(), v.clone())));
        debug!("Declared conditions provider {}", provider.object);
    }

    for (index, entry) in config.sequence.iter().enumerate() {
        let processor = build_processor(entry, base_dir, registry)
            .wrap_err_with(|| format!("Failed to configure sequence[{}]", index))?;
        registry.process_mut()?.sequence.push(processor);
    }

    info!(
        "Configured process '{}' with {} processors",
        config.pass_name,
        config.sequence.len()
    );
    Ok(())
}

/// Build one processor of the sequence, compiling it from source if needed
pub fn build_processor(
    entry: &ProcessorConfig,
    base_dir: &Path,
    registry: &mut Registry,
) -> Result<EventProcessor> {
    let mut processor = match (&entry.module, &entry.source) {
        (_, Some(source)) => {
            let mut options = FromFile::new(resolve(base_dir, source));
            options.class_name = entry.class.clone();
            options.instance_name = entry.instance.clone();
            options.needs = entry.needs.clone();
            EventProcessor::from_file(registry, entry.kind, options)?
        }
        (Some(module), None) => {
            let instance = entry
                .instance
                .as_deref()
                .ok_or_else(|| eyre!("processor from module '{}' has no instance name", module))?;
            let class = entry
                .class
                .as_deref()
                .ok_or_else(|| eyre!("processor '{}' has no class name", instance))?;
            EventProcessor::new(registry, entry.kind, instance, class, module)?
        }
        (None, None) => return Err(eyre!("processor needs a module or a source file")),
    };

    processor
        .parameters
        .extend(entry.parameters.iter().map(|(k, v)| (k.clone(), v.clone())));

    for histogram in &entry.histograms {
        match (&histogram.ylabel, &histogram.ybins) {
            (Some(ylabel), Some(ybins)) => processor.build_2d_histogram(
                &histogram.name,
                &histogram.xlabel,
                histogram.xbins.clone(),
                ylabel,
                ybins.clone(),
            ),
            _ => processor.build_1d_histogram(&histogram.name, &histogram.xlabel, histogram.xbins.clone()),
        }
    }

    for table in &entry.channel_tables {
        let path = resolve(base_dir, &table.file);
        let values = if table.required {
            read_channel_table(&path, &table.defaults)?
        } else {
            load_channel_table_or_default(&path, &table.defaults)?
        };
        info!("Using {} = {:?}", table.parameter, values);
        processor.set(&table.parameter, values);
    }

    let prefix = registry.install_prefix().to_path_buf();
    for data in &entry.data_files {
        let path = match &data.file {
            DataFile::Bdt(name) => bdt_path(&prefix, name)?,
            DataFile::Roc(name) => roc_path(&prefix, name)?,
            DataFile::CellXy => cell_xy_path(&prefix)?,
            DataFile::FieldMap => field_map_path(&prefix)?,
        };
        processor.set(&data.parameter, path.display().to_string());
    }

    if entry.standard_sensitive_detectors {
        let detectors = standard_set(registry)?;
        processor.set("sensitive_detectors", Parameter::from(detectors));
    }

    Ok(processor)
}

/// Serialize the parameter dump of `process`
pub fn render_parameter_dump(process: &Process, format: DumpFormat) -> Result<String> {
    let dump = process.parameter_dump();
    let rendered = match format {
        DumpFormat::Json => serde_json::to_string_pretty(&dump)?,
        DumpFormat::Yaml => serde_yaml::to_string(&dump)?,
    };
    Ok(rendered)
}

/// Write the parameter dump to `output`, or stdout when not given
pub fn write_parameter_dump(process: &Process, format: DumpFormat, output: Option<&Path>) -> Result<()> {
    let rendered = render_parameter_dump(process, format)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("Failed to create directory '{}'", parent.display()))?;
            }
            fs::write(path, rendered)
                .wrap_err_with(|| format!("Failed to write parameter dump '{}'", path.display()))?;
            info!("Wrote parameter dump to {:?}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
