//! Config command - manage configuration.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use docroi_core::{load_components, DocroiConfig};

use super::default_config_path;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Initialize a new configuration file
    Init(InitArgs),

    /// Get a specific configuration value
    Get {
        /// Configuration key (e.g., "ocr.language")
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,

    /// Load templates and validation rules to check the configuration
    Check,
}

#[derive(Args)]
struct InitArgs {
    /// Output path for configuration file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => show_config(&path),
        ConfigCommand::Init(init_args) => init_config(init_args, &path),
        ConfigCommand::Get { key } => get_config(&path, &key),
        ConfigCommand::Set { key, value } => set_config(&path, &key, &value),
        ConfigCommand::Path => show_path(&path),
        ConfigCommand::Check => check_config(&path),
    }
}

fn read_or_default(path: &Path) -> anyhow::Result<DocroiConfig> {
    if path.exists() {
        Ok(DocroiConfig::from_file(path)?)
    } else {
        Ok(DocroiConfig::default())
    }
}

fn show_config(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        println!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }
    let config = read_or_default(path)?;

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, default_path: &Path) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| default_path.to_path_buf());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    DocroiConfig::default().save(&output_path)?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn get_config(path: &Path, key: &str) -> anyhow::Result<()> {
    let config = read_or_default(path)?;
    let json = serde_json::to_value(&config)?;

    let value = lookup_json_path(&json, key)
        .ok_or_else(|| anyhow::anyhow!("Configuration key not found: {}", key))?;

    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}

fn set_config(path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let config = read_or_default(path)?;
    let json = serde_json::to_value(&config)?;

    // Non-JSON input is taken as a plain string
    let parsed_value: serde_json::Value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));

    let json = set_json_path(json, key, parsed_value.clone())?;

    // Round-trip through the typed config so bad values are rejected before saving
    let config: DocroiConfig = serde_json::from_value(json)
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))?;

    // Unknown keys are dropped by the round-trip; refuse them instead
    if lookup_json_path(&serde_json::to_value(&config)?, key).is_none() {
        anyhow::bail!("Configuration key not found: {}", key);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;

    println!(
        "{} Set {} = {}",
        style("✓").green(),
        key,
        serde_json::to_string(&parsed_value)?
    );

    Ok(())
}

fn lookup_json_path<'a>(json: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    key.split('.').try_fold(json, |current, part| current.get(part))
}

fn set_json_path(
    mut json: serde_json::Value,
    key: &str,
    value: serde_json::Value,
) -> anyhow::Result<serde_json::Value> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        anyhow::bail!("Empty configuration key");
    };

    let mut current = &mut json;
    for part in parents {
        current = current
            .get_mut(*part)
            .ok_or_else(|| anyhow::anyhow!("Configuration path not found: {}", key))?;
    }

    match current.as_object_mut() {
        Some(obj) => {
            obj.insert((*last).to_string(), value);
        }
        None => anyhow::bail!("Cannot set value at non-object path"),
    }

    Ok(json)
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'docroi config init' to create a configuration file.");
    }

    Ok(())
}

fn check_config(path: &Path) -> anyhow::Result<()> {
    let config = read_or_default(path)?;
    let (registry, _validator) = load_components(&config)?;

    println!(
        "{} Configuration OK: {} templates, {} validation rule overrides",
        style("✓").green(),
        registry.len(),
        config.validation.rules.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_json_path_nested() {
        let value = json!({"ocr": {"language": "eng", "page_segmentation_mode": 6}});
        let updated = set_json_path(value, "ocr.page_segmentation_mode", json!(4)).unwrap();
        assert_eq!(updated["ocr"]["page_segmentation_mode"], 4);
        assert_eq!(updated["ocr"]["language"], "eng");
    }

    #[test]
    fn test_set_json_path_missing_parent() {
        let value = json!({"ocr": {}});
        assert!(set_json_path(value, "nope.field", json!(1)).is_err());
    }

    #[test]
    fn test_set_config_rejects_unknown_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let err = set_config(&path, "ocr.bogus", "1").unwrap_err();
        assert!(err.to_string().contains("Configuration key not found: ocr.bogus"));
        assert!(!path.exists());
    }

    #[test]
    fn test_set_config_adds_rule() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        set_config(&path, "validation.rules.case_number", r#"{"pattern": "C-\\d+"}"#).unwrap();
        let config = DocroiConfig::from_file(&path).unwrap();
        assert_eq!(config.validation.rules["case_number"].pattern, r"C-\d+");
    }

    #[test]
    fn test_set_config_rejects_bad_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        assert!(set_config(&path, "ocr.page_segmentation_mode", "\"lots\"").is_err());
        assert!(!path.exists());

        set_config(&path, "ocr.page_segmentation_mode", "11").unwrap();
        let config = DocroiConfig::from_file(&path).unwrap();
        assert_eq!(config.ocr.page_segmentation_mode, 11);
    }
}
