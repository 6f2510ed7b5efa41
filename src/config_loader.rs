use crate::config::RunConfig;
use crate::utils::validation::{validate_keep_rules, validate_skim_rules};
use crate::process::SkimRule;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Load and parse a run description from a YAML file
pub fn load_config(config_path: &Path) -> Result<RunConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: RunConfig = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;
    validate_rules(&config)?;

    if config.sequence.is_empty() {
        warn!("Processor sequence is empty, the run will only copy events");
    }

    Ok(config)
}

/// Check the skim and keep patterns the native runner will compile
fn validate_rules(config: &RunConfig) -> Result<()> {
    let mut unverified = validate_keep_rules(&config.keep)?;
    if let Some(skim) = &config.skim {
        let rules: Vec<SkimRule> = skim
            .rules
            .iter()
            .map(|r| SkimRule::new(&r.name, r.label.as_deref().unwrap_or("")))
            .collect();
        unverified += validate_skim_rules(&rules);
    }
    if unverified > 0 {
        warn!("{} patterns are left for the framework to check", unverified);
    }
    Ok(())
}
