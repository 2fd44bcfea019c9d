use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

use seafgen::env::Toggles;
use seafgen::schema::ConfigSchema;
use seafgen::{EnvSnapshot, GenerationPipeline, GeneratorConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a YAML file with output and side-input paths
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for service configs, gunicorn config and settings module
    #[arg(long, global = true)]
    conf_dir: Option<PathBuf>,

    /// Path of the generated nginx config
    #[arg(long, global = true)]
    nginx_conf: Option<PathBuf>,

    /// JSON file with role definitions to embed into the settings module
    #[arg(long, global = true)]
    roles: Option<PathBuf>,

    /// Python file appended verbatim to the settings module
    #[arg(long, global = true)]
    overrides: Option<PathBuf>,

    /// Dry run mode - don't write files
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate all configuration files (default command)
    Generate,
    /// Print the built-in default variables for the current environment
    ShowDefaults,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let env = EnvSnapshot::from_process();

    match cli.command {
        Some(Commands::ShowDefaults) => show_defaults(&env)?,
        Some(Commands::Generate) | None => generate(&env, &config, cli.dry_run)?,
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<GeneratorConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            GeneratorConfig::load(path).context("Failed to load config")?
        }
        None => GeneratorConfig::default(),
    };

    if let Some(dir) = &cli.conf_dir {
        config.conf_dir = dir.clone();
    }
    if let Some(path) = &cli.nginx_conf {
        config.nginx_conf = path.clone();
    }
    if let Some(path) = &cli.roles {
        config.roles_file = path.clone();
    }
    if let Some(path) = &cli.overrides {
        config.settings_overrides = path.clone();
    }
    Ok(config)
}

fn generate(env: &EnvSnapshot, config: &GeneratorConfig, dry_run: bool) -> Result<()> {
    if dry_run {
        info!("=== DRY RUN MODE ===");
    }

    GenerationPipeline::new(env, config, dry_run)
        .run()
        .context("Configuration generation failed")?;

    if dry_run {
        info!("=== DRY RUN COMPLETE ===");
    }
    Ok(())
}

fn show_defaults(env: &EnvSnapshot) -> Result<()> {
    let toggles = Toggles::from_env(env)?;
    let schema = ConfigSchema::seafile(env, &toggles);
    for (key, value) in &schema.defaults {
        println!("{key}={value}");
    }
    Ok(())
}
