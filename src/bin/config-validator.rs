//! # Native Query Configuration Validator
//!
//! Command-line tool for validating native query configuration files and the
//! template tree they point at, before a host starts serving queries.

use clap::{Parser, Subcommand};
use native_query::config::{ConfigLoader, NativeQueryConfig};
use native_query::constants::{LEGACY_TEMPLATE_SUFFIX, SQL_TEMPLATE_SUFFIX};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate native query configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (YAML, TOML or JSON); defaults only when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resource base directory the template root is resolved against
    #[arg(short, long, default_value = ".")]
    base_dir: PathBuf,

    /// Skip NATIVE_QUERY_* environment overrides
    #[arg(long)]
    no_env: bool,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (table, json)
    #[arg(long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the configuration and the template root
    All,

    /// List template files found under the template root
    Templates,

    /// Show the effective configuration
    Structure,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::All) | None => validate_all_config(&cli),
        Some(Commands::Templates) => list_templates(&cli),
        Some(Commands::Structure) => show_structure(&cli),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<NativeQueryConfig, Box<dyn std::error::Error>> {
    let mut loader = ConfigLoader::new(cli.config.clone());
    if cli.no_env {
        loader = loader.without_env_overrides();
    }
    Ok(loader.load()?)
}

fn validate_all_config(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating Native Query Configuration");
    if let Some(path) = &cli.config {
        println!("Config File: {}", path.display());
    }
    println!();

    let config = match load_config(cli) {
        Ok(config) => {
            println!("✅ Configuration loaded");
            config
        }
        Err(e) => {
            println!("❌ Failed to load configuration: {e}");
            return Err(e);
        }
    };

    config.validate()?;
    println!("✅ Template root: {}", config.template_root_directory);
    println!("✅ Template suffix: {}", config.template_file_suffix);
    println!(
        "✅ Structured type mapping: {}",
        config.enable_structured_type_mapping
    );

    let root = cli.base_dir.join(&config.template_root_directory);
    if !root.is_dir() {
        return Err(format!("Template root not found: {}", root.display()).into());
    }

    let templates = collect_templates(&root, &config)?;
    println!("✅ {} template file(s) under {}", templates.len(), root.display());

    println!("\nAll configuration validation checks passed!");
    Ok(())
}

fn list_templates(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli)?;
    let root = cli.base_dir.join(&config.template_root_directory);
    if !root.is_dir() {
        return Err(format!("Template root not found: {}", root.display()).into());
    }

    let templates = collect_templates(&root, &config)?;
    if cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(&templates)?);
        return Ok(());
    }

    println!("Templates under {}:", root.display());
    for template in templates {
        println!("  {template}");
    }
    Ok(())
}

fn show_structure(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli)?;
    match cli.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&config)?),
        _ => {
            println!("template-root-directory: {}", config.template_root_directory);
            println!("template-file-suffix: {}", config.template_file_suffix);
            println!(
                "enable-structured-type-mapping: {}",
                config.enable_structured_type_mapping
            );
        }
    }
    Ok(())
}

/// Relative paths of files carrying one of the suffixes the locator tries
fn collect_templates(
    root: &Path,
    config: &NativeQueryConfig,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let suffixes = [
        config.template_file_suffix.as_str(),
        SQL_TEMPLATE_SUFFIX,
        LEGACY_TEMPLATE_SUFFIX,
    ];

    let mut templates = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| suffixes.contains(&ext));
            if matches {
                let relative = path.strip_prefix(root).unwrap_or(&path);
                templates.push(relative.display().to_string());
            }
        }
    }

    templates.sort();
    Ok(templates)
}
