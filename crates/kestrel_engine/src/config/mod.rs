//! Configuration system

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a TOML file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to a TOML file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        if !path.ends_with(".toml") {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Top-level game configuration
///
/// Window and timestep values are consumed by the external frame driver; the
/// core only carries them so every embedding reads the same file format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Window title
    pub title: String,

    /// Window width in pixels
    pub width: u32,

    /// Window height in pixels
    pub height: u32,

    /// Target frame rate for the frame driver
    pub target_fps: f32,

    /// Enable debug logging
    pub debug_logging: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: "Kestrel Game".to_string(),
            width: 960,
            height: 540,
            target_fps: 60.0,
            debug_logging: false,
        }
    }
}

impl Config for GameConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.width, 960);
        assert_eq!(config.height, 540);
        assert!(!config.debug_logging);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = GameConfig::default();
        config.title = "Round Trip".to_string();
        config.target_fps = 144.0;

        let text = toml::to_string_pretty(&config).expect("serialize");
        let parsed: GameConfig = toml::from_str(&text).expect("parse");

        assert_eq!(parsed.title, "Round Trip");
        assert_eq!(parsed.target_fps, 144.0);
        assert_eq!(parsed.width, config.width);
    }

    #[test]
    fn test_unsupported_format() {
        let config = GameConfig::default();
        let result = config.save_to_file("config.ini");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
