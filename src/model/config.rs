use serde::{Deserialize, Serialize};

use crate::drag::{DragTuning, Modality};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    /// Set once the first-run help has been shown.
    #[serde(default)]
    pub help_shown: bool,
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,
    #[serde(default = "default_column_width")]
    pub column_width: u16,
    #[serde(default)]
    pub pointer: Modality,
    #[serde(default)]
    pub drag: DragTuning,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

fn default_save_debounce_ms() -> u64 {
    80
}

fn default_column_width() -> u16 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            help_shown: false,
            save_debounce_ms: default_save_debounce_ms(),
            column_width: default_column_width(),
            pointer: Modality::default(),
            drag: DragTuning::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(!config.help_shown);
        assert_eq!(config.save_debounce_ms, 80);
        assert_eq!(config.pointer, Modality::Precise);
    }

    #[test]
    fn partial_config_keeps_what_it_has() {
        let config: Config = serde_json::from_str(r#"{"help_shown": true, "column_width": 40}"#).unwrap();
        assert!(config.help_shown);
        assert_eq!(config.column_width, 40);
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(config.drag, DragTuning::default());
    }

    #[test]
    fn config_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let json = r#"{"version": "0.1.0", "pointer": "coarse"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.column_width, 30);
        assert_eq!(config.pointer, Modality::Coarse);
        assert_eq!(config.drag, DragTuning::default());
    }
}
