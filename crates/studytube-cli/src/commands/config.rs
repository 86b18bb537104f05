//! Config command handlers

use anyhow::{Context, Result};

use studytube_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "log_file": config.log_file,
                    "autosave_interval_secs": config.autosave_interval_secs,
                    "progress_interval_ms": config.progress_interval_ms,
                    "lookup_timeout_secs": config.lookup_timeout_secs,
                    "oembed_url": config.oembed_url
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:               {}", config.data_dir.display());
            println!(
                "  log_file:               {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  autosave_interval_secs: {}", config.autosave_interval_secs);
            println!("  progress_interval_ms:   {}", config.progress_interval_ms);
            println!("  lookup_timeout_secs:    {}", config.lookup_timeout_secs);
            println!("  oembed_url:             {}", config.oembed_url);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
            println!("State file:  {}", config.state_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;
    config.set(&key, &value)?;
    config.save().context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
