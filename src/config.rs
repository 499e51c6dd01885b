//! User configuration: `config.toml` and `default.types` in the config dir.

use directories::ProjectDirs;
use gridtypes_engine::types::TypeRelation;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    log_level: Option<String>,
    default_types: Option<PathBuf>,
    relation: Option<String>,
}

/// Settings after defaults are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: String,
    /// Declarations loaded before the file named on the command line.
    pub default_types: Option<PathBuf>,
    pub relation: TypeRelation,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "warn".to_string(),
            default_types: default_types_path().filter(|p| p.exists()),
            relation: TypeRelation::Symmetric,
        }
    }
}

fn config_dir() -> Option<PathBuf> {
    let proj = ProjectDirs::from("me", "shoryuken", "gridtypes")?;
    Some(proj.config_dir().to_path_buf())
}

pub fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

pub fn default_types_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("default.types"))
}

/// Load `config_file`, or the user config when none is given. Problems are
/// returned as warnings and the affected settings keep their defaults.
pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = Config::default();
    let path = config_file.map(Path::to_path_buf).or_else(user_config_path);

    let Some(path) = path else {
        return (config, warnings);
    };
    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (config, warnings);
    }

    let Some(file) = read_config_file(&path, &mut warnings) else {
        return (config, warnings);
    };

    if let Some(level) = file.log_level {
        let level = level.trim().to_ascii_lowercase();
        match level.as_str() {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => config.log_level = level,
            other => warnings.push(format!("Unknown log_level '{}' in {}", other, path.display())),
        }
    }

    if let Some(types) = file.default_types {
        // Relative paths are relative to the config file.
        let types = match path.parent() {
            Some(dir) if types.is_relative() => dir.join(types),
            _ => types,
        };
        if types.exists() {
            config.default_types = Some(types);
        } else {
            warnings.push(format!("Default types file not found: {}", types.display()));
        }
    }

    if let Some(relation) = file.relation {
        match parse_relation(&relation) {
            Some(relation) => config.relation = relation,
            None => warnings.push(format!(
                "Unknown relation '{}' in {} (expected \"symmetric\" or \"expected\")",
                relation,
                path.display()
            )),
        }
    }

    (config, warnings)
}

fn read_config_file(path: &Path, warnings: &mut Vec<String>) -> Option<ConfigFile> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<ConfigFile>(&content) {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!("Failed to read metadata for {}: {}", path.display(), err));
            None
        }
    }
}

pub fn parse_relation(name: &str) -> Option<TypeRelation> {
    match name.trim().to_ascii_lowercase().as_str() {
        "symmetric" => Some(TypeRelation::Symmetric),
        "expected" => Some(TypeRelation::ExpectedA),
        _ => None,
    }
}
