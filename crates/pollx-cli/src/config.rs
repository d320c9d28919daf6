//! Configuration: command line over TOML file over defaults

use std::error::Error;
use std::path::{Path, PathBuf};

use pollx_core::logging_facility::Profile;
use serde::Deserialize;

pub const DEFAULT_DB_PATH: &str = ".pollx/polls.db";

/// Keys accepted in the `--config` file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    db_path: Option<PathBuf>,
    log_profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    /// `None` leaves logging uninitialized
    pub log_profile: Option<Profile>,
}

impl Config {
    pub fn resolve(
        db: Option<PathBuf>,
        config_path: Option<PathBuf>,
        log: Option<String>,
    ) -> Result<Self, Box<dyn Error>> {
        let file = match config_path {
            Some(path) => load_file(&path)?,
            None => FileConfig::default(),
        };

        let db_path = db
            .or(file.db_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        let log_profile = log
            .or(file.log_profile)
            .map(|p| p.parse::<Profile>())
            .transpose()?;

        Ok(Self {
            db_path,
            log_profile,
        })
    }
}

fn load_file(path: &Path) -> Result<FileConfig, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read config {}: {}", path.display(), e))?;
    let config = toml::from_str(&text)
        .map_err(|e| format!("invalid config {}: {}", path.display(), e))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve(None, None, None).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.log_profile, None);
    }

    #[test]
    fn test_file_values_apply() {
        let file = write_config("db_path = \"/tmp/x.db\"\nlog_profile = \"production\"\n");
        let config = Config::resolve(None, Some(file.path().to_path_buf()), None).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.log_profile, Some(Profile::Production));
    }

    #[test]
    fn test_flags_win_over_file() {
        let file = write_config("db_path = \"/tmp/x.db\"\nlog_profile = \"production\"\n");
        let config = Config::resolve(
            Some(PathBuf::from("/tmp/y.db")),
            Some(file.path().to_path_buf()),
            Some("dev".to_string()),
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/y.db"));
        assert_eq!(config.log_profile, Some(Profile::Development));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let file = write_config("database = \"/tmp/x.db\"\n");
        assert!(Config::resolve(None, Some(file.path().to_path_buf()), None).is_err());
    }

    #[test]
    fn test_bad_profile_rejected() {
        assert!(Config::resolve(None, None, Some("loud".to_string())).is_err());
    }
}
