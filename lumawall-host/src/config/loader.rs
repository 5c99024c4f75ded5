//! Configuration file loading

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use super::ScreenConfig;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// File is not valid TOML for a screen config
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// Parsed values are unusable
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Parse a screen configuration from TOML text
pub fn parse_config(text: &str) -> Result<ScreenConfig, toml::de::Error> {
    toml::from_str(text)
}

/// Load and validate a screen configuration file
///
/// A missing file is an error; callers that want defaults simply do not
/// call this.
pub fn load_config(path: &Path) -> Result<ScreenConfig, ConfigError> {
    info!("Loading configuration from {}", path.display());

    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
screen_id = 3

[panel]
rows = 32
cols = 64
chain_length = 2
parallel = 1
pixel_mapper = "V-mapper"

[serial]
port = "/dev/ttyAMA0"
baudrate = 115200

[display]
show_diagnostics = false
image_root = "/srv/gifs"

[timing]
tick_hz = 60

[link]
garbage_restart_threshold = 300
"#;

    #[test]
    fn test_parse_full() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.screen_id, 3);
        // V-mapper swaps the axes
        assert_eq!(config.panel.dimensions(), (32, 128));
        assert_eq!(config.serial.port, "/dev/ttyAMA0");
        assert_eq!(config.serial.baudrate, 115200);
        assert!(!config.display.show_diagnostics);
        assert_eq!(config.display.image_root, PathBuf::from("/srv/gifs"));
        assert_eq!(config.display.font_dir, PathBuf::from("fonts"));
        assert_eq!(config.timing.tick_hz, 60);
        assert_eq!(config.timing.scroll_interval_ms, 1000);
        assert_eq!(config.link.garbage_restart_threshold, 300);
        assert_eq!(config.link.quiet_period_ms, 5000);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), ScreenConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.screen_id, 3);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"screen_id = \"one\"").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[timing]\ntick_hz = 0\n").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Invalid(_))));
    }
}
