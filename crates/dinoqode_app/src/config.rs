use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dinoqode_engine::{FetchSettings, GeneratorSettings};
use dinoqode_logging::parse_level;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_FILENAME: &str = "dinoqode.ron";

/// Settings read from `dinoqode.ron`. Every field has a default, so a partial
/// file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind: String,
    /// Directory holding `tmp/`, `out/`, `site/` and the generator script.
    pub root_dir: PathBuf,
    pub log_level: String,
    pub log_destination: LogDestination,
    pub log_file: PathBuf,
    pub generator: GeneratorConfig,
    pub fetch: FetchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5006".to_string(),
            root_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            log_destination: LogDestination::Terminal,
            log_file: PathBuf::from("./dinoqode.log"),
            generator: GeneratorConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub program: String,
    pub args: Vec<String>,
    pub input_flag: String,
    pub duplex_flag: String,
    pub generate_images: bool,
    pub images_flag: String,
    pub timeout_secs: u64,
    pub expected_output: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let settings = GeneratorSettings::default();
        Self {
            program: settings.program,
            args: settings.args,
            input_flag: settings.input_flag,
            duplex_flag: settings.duplex_flag,
            generate_images: false,
            images_flag: "--generate-images".to_string(),
            timeout_secs: settings.timeout.as_secs(),
            expected_output: settings.expected_output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config from {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl AppConfig {
    /// Reads the configuration file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Like [`AppConfig::load`], but falls back to the defaults on any error
    /// and hands the error back so it can be logged once a logger exists.
    pub fn load_or_default(path: &Path) -> (Self, Option<ConfigError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    pub fn level(&self) -> LevelFilter {
        parse_level(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    pub fn input_path(&self) -> PathBuf {
        self.root_dir.join("tmp").join("cards.txt")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root_dir.join("tmp").join("_archive")
    }

    pub fn generator_settings(&self) -> GeneratorSettings {
        let g = &self.generator;
        GeneratorSettings {
            program: g.program.clone(),
            args: g.args.clone(),
            input_flag: g.input_flag.clone(),
            duplex_flag: g.duplex_flag.clone(),
            images_flag: g.generate_images.then(|| g.images_flag.clone()),
            working_dir: self.root_dir.clone(),
            timeout: Duration::from_secs(g.timeout_secs),
            expected_output: g.expected_output.clone(),
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.fetch.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.fetch.request_timeout_secs),
            redirect_limit: self.fetch.redirect_limit,
            max_bytes: self.fetch.max_bytes,
            ..FetchSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(&temp.path().join("absent.ron")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind, "0.0.0.0:5006");
    }

    #[test]
    fn partial_file_overrides_named_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(
            &path,
            r#"(
                bind: "127.0.0.1:8080",
                log_level: "debug",
                log_destination: Both,
                generator: (generate_images: true, timeout_secs: 30),
            )"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert_eq!(config.level(), LevelFilter::Debug);
        assert_eq!(config.log_destination, LogDestination::Both);

        let settings = config.generator_settings();
        assert_eq!(settings.program, "python3");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.images_flag.as_deref(), Some("--generate-images"));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_CONFIG_FILENAME);
        fs::write(&path, "(bind: 5006").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
        let (config, err) = AppConfig::load_or_default(&path);
        assert_eq!(config, AppConfig::default());
        assert!(err.is_some());
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        let config = AppConfig {
            log_level: "chatty".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.level(), LevelFilter::Info);
    }

    #[test]
    fn paths_are_relative_to_root_dir() {
        let config = AppConfig {
            root_dir: PathBuf::from("/srv/dinoqode"),
            ..AppConfig::default()
        };
        assert_eq!(config.input_path(), PathBuf::from("/srv/dinoqode/tmp/cards.txt"));
        assert_eq!(config.archive_dir(), PathBuf::from("/srv/dinoqode/tmp/_archive"));
        assert_eq!(
            config.generator_settings().working_dir,
            PathBuf::from("/srv/dinoqode")
        );
    }
}
