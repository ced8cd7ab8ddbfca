use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_NAME: &str = "Фролов Иван";
pub const DEFAULT_SUBJECT_TITLE: &str = "Математика";
pub const DEFAULT_DATABASE: &str = "schoolbase.sqlite3";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Substring of the student's full name.
    pub name: String,
    pub subject_title: String,
    pub database: PathBuf,
    /// Run grade, remark and commendation changes in one transaction.
    pub atomic: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: DEFAULT_NAME.to_string(),
            subject_title: DEFAULT_SUBJECT_TITLE.to_string(),
            database: PathBuf::from(DEFAULT_DATABASE),
            atomic: false,
        }
    }
}

/// On-disk shape. Every key is optional; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    name: Option<String>,
    #[serde(alias = "title")]
    subject_title: Option<String>,
    database: Option<PathBuf>,
    atomic: Option<bool>,
}

/// Command-line values, highest priority.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub name: Option<String>,
    pub subject_title: Option<String>,
    pub database: Option<PathBuf>,
    pub atomic: bool,
}

impl Config {
    /// Defaults, then the file at `path` if it exists, then `overrides`.
    pub fn load(path: &Path, overrides: &Overrides) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if path.is_file() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            let file = parse_file(&content, &path.display().to_string())?;
            config.merge(file);
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
        }

        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string on top of the defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.merge(parse_file(toml_str, "<string>")?);
        config.validate()?;
        Ok(config)
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(name) = file.name {
            self.name = name;
        }
        if let Some(title) = file.subject_title {
            self.subject_title = title;
        }
        if let Some(database) = file.database {
            self.database = database;
        }
        if let Some(atomic) = file.atomic {
            self.atomic = atomic;
        }
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(ref name) = overrides.name {
            self.name = name.clone();
        }
        if let Some(ref title) = overrides.subject_title {
            self.subject_title = title.clone();
        }
        if let Some(ref database) = overrides.database {
            self.database = database.clone();
        }
        if overrides.atomic {
            self.atomic = true;
        }
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        self.name = self.name.trim().to_string();
        self.subject_title = self.subject_title.trim().to_string();
        if self.name.is_empty() {
            return Err(ConfigError::Invalid {
                field: "name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.subject_title.is_empty() {
            return Err(ConfigError::Invalid {
                field: "subject_title".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.database.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_file(content: &str, origin: &str) -> Result<ConfigFile, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: origin.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = Config::from_toml("").expect("parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.name, "Фролов Иван");
        assert_eq!(config.subject_title, "Математика");
    }

    #[test]
    fn title_is_accepted_as_subject_title() {
        let config = Config::from_toml("name = \"Иванов Иван\"\ntitle = \"Химия\"\n").expect("parse");
        assert_eq!(config.name, "Иванов Иван");
        assert_eq!(config.subject_title, "Химия");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let config = Config::from_toml("subject_title = \"Музыка\"\ncolor = \"blue\"\n").expect("parse");
        assert_eq!(config.subject_title, "Музыка");
    }

    #[test]
    fn blank_name_is_rejected() {
        match Config::from_toml("name = \"   \"") {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "name"),
            other => panic!("expected invalid name, got {:?}", other),
        }
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        assert!(matches!(
            Config::from_toml("name = "),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults_then_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let overrides = Overrides {
            subject_title: Some("Физика".to_string()),
            atomic: true,
            ..Overrides::default()
        };
        let config = Config::load(&dir.path().join("nope.toml"), &overrides).expect("load");
        assert_eq!(config.name, DEFAULT_NAME);
        assert_eq!(config.subject_title, "Физика");
        assert!(config.atomic);
    }

    #[test]
    fn overrides_win_over_file_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "name = \"Петров\"\ndatabase = \"a.sqlite3\"\natomic = true\n",
        )
        .expect("write");
        let overrides = Overrides {
            database: Some(PathBuf::from("b.sqlite3")),
            ..Overrides::default()
        };
        let config = Config::load(&path, &overrides).expect("load");
        assert_eq!(config.name, "Петров");
        assert_eq!(config.database, PathBuf::from("b.sqlite3"));
        assert!(config.atomic);
    }
}
