use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct AppConfig {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub check_only: bool,
    pub decay_interval_override: Option<u64>,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() < 2 {
            return Err("usage: tibia-items <data-root> [check]".to_string());
        }

        let root = Path::new(&args[1]).to_path_buf();
        let check_only = match args.get(2).map(String::as_str) {
            None => false,
            Some("check") => true,
            Some(other) => return Err(format!("unknown mode '{}', expected 'check'", other)),
        };
        let config_path = env_value("TIBIA_ITEMS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("config.yml"));
        let decay_interval_override = match env_value("TIBIA_ITEMS_DECAY_MS") {
            Some(value) => Some(
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .ok_or_else(|| format!("TIBIA_ITEMS_DECAY_MS must be a positive integer, got '{}'", value))?,
            ),
            None => None,
        };

        Ok(Self {
            root,
            config_path,
            check_only,
            decay_interval_override,
        })
    }

    pub fn items_path(&self) -> PathBuf {
        self.root.join("items.yml")
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Game rules read from `config.yml`. Every field is optional in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameConfig {
    pub max_depot_items: u32,
    pub max_depot_items_premium: u32,
    pub depot_box_count: u16,
    /// How many nested destinations a single move may resolve through.
    pub max_destination_layers: u32,
    pub decay_interval_ms: u64,
    pub decay_buckets: usize,
    pub classic_equipment_slots: bool,
    pub browse_field_capacity: u32,
    pub inbox_capacity: u32,
    pub store_inbox_capacity: u32,
    pub max_stack: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            max_depot_items: 2000,
            max_depot_items_premium: 10000,
            depot_box_count: 17,
            max_destination_layers: 16,
            decay_interval_ms: 250,
            decay_buckets: 4,
            classic_equipment_slots: true,
            browse_field_capacity: 30,
            inbox_capacity: 30,
            store_inbox_capacity: 20,
            max_stack: 100,
        }
    }
}

impl GameConfig {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: GameConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`, falling back to the defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_yaml(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_stack", self.max_stack as u64),
            ("decay_interval_ms", self.decay_interval_ms),
            ("decay_buckets", self.decay_buckets as u64),
            ("max_destination_layers", self.max_destination_layers as u64),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.max_stack > u32::from(u16::MAX) {
            return Err(ConfigError::InvalidValue {
                field: "max_stack".to_string(),
                reason: format!("must not exceed {}", u16::MAX),
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("item type {0} is defined twice")]
    DuplicateItemType(u16),
    #[error("item type {from} refers to unknown item type {to}")]
    UnknownReference { from: u16, to: u16 },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn data_root_is_required() {
        let err = AppConfig::from_args(&args(&["tibia-items"])).unwrap_err();
        assert!(err.starts_with("usage:"));
    }

    #[test]
    fn check_mode_is_optional() {
        let config = AppConfig::from_args(&args(&["tibia-items", "/srv/data"])).unwrap();
        assert!(!config.check_only);
        assert_eq!(config.items_path(), PathBuf::from("/srv/data/items.yml"));

        let config = AppConfig::from_args(&args(&["tibia-items", "/srv/data", "check"])).unwrap();
        assert!(config.check_only);
        assert!(AppConfig::from_args(&args(&["tibia-items", "/srv/data", "serve"])).is_err());
    }

    #[test]
    fn partial_yaml_keeps_the_other_defaults() {
        let config = GameConfig::from_yaml("max_depot_items: 3\ndecay_buckets: 8\n").unwrap();
        assert_eq!(config.max_depot_items, 3);
        assert_eq!(config.decay_buckets, 8);
        assert_eq!(config.max_stack, 100);
        assert!(config.classic_equipment_slots);
    }

    #[test]
    fn zero_stack_size_is_rejected() {
        let err = GameConfig::from_yaml("max_stack: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "max_stack"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            GameConfig::from_yaml("max_depot_itemz: 3\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GameConfig::load(&dir.path().join("config.yml")).unwrap();
        assert_eq!(config.depot_box_count, 17);

        let path = dir.path().join("config.yml");
        std::fs::write(&path, "inbox_capacity: 5\n").unwrap();
        assert_eq!(GameConfig::load(&path).unwrap().inbox_capacity, 5);
    }
}
