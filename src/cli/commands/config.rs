//! Config command - manage configuration

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use nanobanana_cli::config::{mask_secret, Config};
use nanobanana_cli::reflection::{credential_available, resolve_config};

#[derive(clap::Args)]
#[command(after_help = "KEYS:\n    \
    api_key, text_model, image_model, api_base_url,\n    \
    aspect_ratio, fallback_delay_ms, request_timeout_secs\n\n\
EXAMPLES:\n    \
    nanobanana config set api_key <KEY>         Store an API key\n    \
    nanobanana config set fallback_delay_ms 0   Skip the offline pause\n    \
    nanobanana config set text_model \"\"         Unset a key")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value (an empty value unsets it)
    Set { key: String, value: String },
    /// Print the configuration file path
    Path,
}

pub fn run(args: Args) -> Result<()> {
    match args.command {
        Some(ConfigCommand::Show) | None => show_config(),
        Some(ConfigCommand::Get { key }) => get_config(&key),
        Some(ConfigCommand::Set { key, value }) => set_config(&key, &value),
        Some(ConfigCommand::Path) => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
    }
}

fn show_config() -> Result<()> {
    let config = Config::load()?;
    let resolved = resolve_config(&config);

    println!("{}", "Nanobanana Configuration".bold());
    println!();
    println!(
        "  {}  {}",
        "Config file:".dimmed(),
        Config::config_path()?.display()
    );

    let key = match resolved.api_key.as_deref() {
        Some(key) if credential_available(Some(key)) => mask_secret(key).normal(),
        Some(_) => "(unusable)".yellow(),
        None => "(not set)".yellow(),
    };
    println!("  {}      {}", "API key:".dimmed(), key);
    println!("  {}     {}", "Base URL:".dimmed(), resolved.base_url);
    println!("  {}   {}", "Text model:".dimmed(), resolved.text_model);
    println!("  {}  {}", "Image model:".dimmed(), resolved.image_model);
    println!("  {} {}", "Aspect ratio:".dimmed(), resolved.aspect_ratio);
    println!(
        "  {}      {}ms",
        "Offline:".dimmed(),
        resolved.fallback_delay.as_millis()
    );
    println!(
        "  {}      {}s",
        "Timeout:".dimmed(),
        resolved.request_timeout.as_secs()
    );

    println!();
    if credential_available(resolved.api_key.as_deref()) {
        println!("  {} generative service enabled", "✓".green());
    } else {
        println!(
            "  {} no API key; reflections are generated offline",
            "○".dimmed()
        );
    }

    Ok(())
}

fn get_config(key: &str) -> Result<()> {
    let config = Config::load()?;
    match config.get(key)? {
        Some(value) if key == "api_key" => println!("{}", mask_secret(&value)),
        Some(value) => println!("{value}"),
        None => println!("{}", format!("Config key '{key}' is not set").yellow()),
    }
    Ok(())
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    if value.is_empty() {
        println!("{} {key}", "Unset".green());
    } else if key == "api_key" {
        println!("{} {key} = {}", "Set".green(), mask_secret(value));
    } else {
        println!("{} {key} = {value}", "Set".green());
    }
    Ok(())
}

