//! CLI argument definitions and the `config` subcommand.
//!
//! Uses `clap` with derive macros. Priority resolution for the config file:
//! --config flag > MURMUR_CONFIG env var > ~/.murmur/config.toml.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use murmur_core::config::{default_config_path, MurmurConfig};
use murmur_core::error::{MurmurError, Result};

/// Murmur — push-to-hold voice dictation. Hold the Option key, speak,
/// release; the transcript is typed at your cursor.
#[derive(Parser, Debug)]
#[command(name = "murmur", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// View or set configuration values.
    ///
    /// With no arguments, prints the whole config. With a dotted key
    /// (e.g. `hotkey.binding`), prints that value. With a key and a value,
    /// sets it and saves the file.
    Config {
        key: Option<String>,
        value: Option<String>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("MURMUR_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level. Priority: --log-level flag > config value.
    pub fn resolve_log_level(&self, config: &MurmurConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }
}

/// Run the `config` subcommand against the file at `path`.
pub fn run_config_command(path: &Path, key: Option<String>, value: Option<String>) -> Result<()> {
    let config = MurmurConfig::load_or_default(path);
    let mut root =
        toml::Value::try_from(&config).map_err(|e| MurmurError::Config(e.to_string()))?;

    match (key, value) {
        (None, _) => {
            let rendered =
                toml::to_string_pretty(&root).map_err(|e| MurmurError::Config(e.to_string()))?;
            print!("{}", rendered);
        }
        (Some(key), None) => match lookup(&root, &key) {
            Some(found) => println!("{} = {}", key, found),
            None => return Err(MurmurError::Config(format!("Unknown config key: {}", key))),
        },
        (Some(key), Some(raw)) => {
            assign(&mut root, &key, parse_scalar(&raw))?;
            // Re-deserialize to validate types before saving.
            let updated: MurmurConfig = root
                .try_into()
                .map_err(|e: toml::de::Error| MurmurError::Config(e.to_string()))?;
            // Deserialization tolerates unknown keys, but save() would drop
            // them; reject rather than report a set that never lands.
            let saved =
                toml::Value::try_from(&updated).map_err(|e| MurmurError::Config(e.to_string()))?;
            if lookup(&saved, &key).is_none() {
                return Err(MurmurError::Config(format!("Unknown config key: {}", key)));
            }
            updated.save(path)?;
            println!("Set {} = {}", key, raw);
        }
    }
    Ok(())
}

/// Walk a dotted key path through nested tables.
fn lookup<'a>(root: &'a toml::Value, path: &str) -> Option<&'a toml::Value> {
    path.split('.').try_fold(root, |value, segment| value.get(segment))
}

/// Set a dotted key path, creating intermediate tables as needed.
fn assign(root: &mut toml::Value, path: &str, new_value: toml::Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| MurmurError::Config("Empty config key".to_string()))?;

    let mut current = root;
    for segment in parents {
        let table = current
            .as_table_mut()
            .ok_or_else(|| MurmurError::Config(format!("{} is not a table", segment)))?;
        current = table
            .entry(segment.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| MurmurError::Config(format!("{} is not a table", path)))?
        .insert(last.to_string(), new_value);
    Ok(())
}

/// Interpret a raw CLI value as the narrowest matching TOML scalar.
fn parse_scalar(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(raw.to_string())
}
