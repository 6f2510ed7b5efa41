use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use ldmxcfg::orchestrator::{build_process, write_parameter_dump, DumpFormat};
use ldmxcfg::{config_loader, Registry};
use log::info;
use std::path::{Path, PathBuf};

/// Build the run configuration for the LDMX framework from a YAML description
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the run description YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Where to write the parameter dump (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Serialization of the parameter dump
    #[arg(long, value_enum, default_value_t = DumpFormat::Json)]
    format: DumpFormat,

    /// Framework installation prefix (defaults to $LDMX_INSTALL_PREFIX, then /usr/local)
    #[arg(long)]
    install_prefix: Option<PathBuf>,

    /// Compiler used for processors built from source
    #[arg(long, default_value = "g++")]
    compiler: String,

    /// Print the human-readable process report
    #[arg(long)]
    print: bool,

    /// Print the report and wait for Enter before writing the dump
    #[arg(long)]
    pause: bool,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Configuration file: {:?}", args.config);

    let config = config_loader::load_config(&args.config)?;
    let base_dir = args
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let registry = match &args.install_prefix {
        Some(prefix) => Registry::with_install_prefix(prefix),
        None => Registry::new(),
    };
    let mut registry = registry.with_compiler_program(&args.compiler);
    info!("Install prefix: {:?}", registry.install_prefix());

    build_process(&config, base_dir, &mut registry)
        .wrap_err_with(|| format!("Failed to build process from '{}'", args.config.display()))?;
    let process = registry.process()?;

    if args.pause {
        process.pause()?;
    } else if args.print {
        println!("{}", process);
    }

    write_parameter_dump(process, args.format, args.output.as_deref())?;

    info!("Configuration completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["ldmxcfg", "--config", "reco.yaml"]);

        assert_eq!(args.config, PathBuf::from("reco.yaml"));
        assert_eq!(args.output, None);
        assert_eq!(args.format, DumpFormat::Json);
        assert_eq!(args.compiler, "g++");
        assert!(!args.print);
    }

    #[test]
    fn test_output_args() {
        let args = Args::parse_from([
            "ldmxcfg",
            "--config", "reco.yaml",
            "--output", "dump.yaml",
            "--format", "yaml",
            "--install-prefix", "/opt/ldmx",
            "--print",
        ]);

        assert_eq!(args.output, Some(PathBuf::from("dump.yaml")));
        assert_eq!(args.format, DumpFormat::Yaml);
        assert_eq!(args.install_prefix, Some(PathBuf::from("/opt/ldmx")));
        assert!(args.print);
    }
}
