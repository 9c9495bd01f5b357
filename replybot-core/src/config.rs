//! Startup configuration.
//!
//! The bot reads a single `config.toml` that lives next to the executable.
//! A missing or broken file is never fatal by itself: the broken file is moved
//! aside to `config.toml.bak`, a default with placeholder values is written in
//! its place, and the caller is told to stop so the operator can fill it in.

use crate::{ConfigError, CoreError, Credentials, Settings};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const BACKUP_FILE_NAME: &str = "config.toml.bak";

#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(rename = "MAIN")]
    main: MainSection,
}

#[derive(Debug, Serialize, Deserialize)]
struct MainSection {
    subreddit: String,
    client_id: String,
    client_secret: String,
    user_agent: String,
    username: String,
    password: String,
    keywords: Vec<String>,
    phrases: Vec<String>,
}

impl MainSection {
    fn placeholder() -> Self {
        Self {
            subreddit: "all".to_string(),
            client_id: "asdasd".to_string(),
            client_secret: "sadas".to_string(),
            user_agent: "some bot by u/someone".to_string(),
            username: "someusername".to_string(),
            password: "password".to_string(),
            keywords: vec![
                "some".to_string(),
                "keywords".to_string(),
                "here".to_string(),
            ],
            phrases: vec!["Im a bot".to_string(), "I am working".to_string()],
        }
    }

    fn into_settings(self) -> Result<Settings, ConfigError> {
        let scalars = [
            ("subreddit", &self.subreddit),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("user_agent", &self.user_agent),
            ("username", &self.username),
            ("password", &self.password),
        ];
        if let Some((field, _)) = scalars.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::BlankValue {
                field: field.to_string(),
            });
        }
        validate_list("keywords", &self.keywords)?;
        validate_list("phrases", &self.phrases)?;

        Ok(Settings {
            subreddit: self.subreddit,
            credentials: Credentials {
                client_id: self.client_id,
                client_secret: self.client_secret,
                username: self.username,
                password: self.password,
            },
            user_agent: self.user_agent,
            keywords: self.keywords,
            phrases: self.phrases,
        })
    }
}

fn validate_list(field: &str, values: &[String]) -> Result<(), ConfigError> {
    if values.is_empty() {
        return Err(ConfigError::EmptyList {
            field: field.to_string(),
        });
    }
    if let Some(index) = values.iter().position(|value| value.trim().is_empty()) {
        return Err(ConfigError::BlankValue {
            field: format!("{}[{}]", field, index),
        });
    }
    Ok(())
}

/// Parses and validates the contents of a config file.
pub fn parse_settings(contents: &str) -> Result<Settings, ConfigError> {
    let file: ConfigFile = toml::from_str(contents)?;
    file.main.into_settings()
}

/// Renders the default config file with placeholder values.
pub fn default_config_toml() -> Result<String, ConfigError> {
    let file = ConfigFile {
        main: MainSection::placeholder(),
    };
    Ok(toml::to_string_pretty(&file)?)
}

/// Directory holding the running executable.
pub fn executable_dir() -> Result<PathBuf, CoreError> {
    let exe = std::env::current_exe()?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| CoreError::Internal {
            message: format!("executable path has no parent: {}", exe.display()),
        })
}

#[derive(Debug)]
pub enum ConfigOutcome {
    Ready(Settings),
    /// A default file was written; the operator has to edit it before the
    /// next start.
    RestartRequired { reason: ConfigError },
}

impl ConfigOutcome {
    pub fn needs_restart(&self) -> bool {
        matches!(self, ConfigOutcome::RestartRequired { .. })
    }

    pub fn settings(&self) -> Option<&Settings> {
        match self {
            ConfigOutcome::Ready(settings) => Some(settings),
            ConfigOutcome::RestartRequired { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigBootstrap {
    path: PathBuf,
    backup_path: PathBuf,
}

impl ConfigBootstrap {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            path: dir.join(CONFIG_FILE_NAME),
            backup_path: dir.join(BACKUP_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Loads the settings, self-healing the file when it is missing or broken.
    ///
    /// `Err` is reserved for I/O failures that leave nothing to heal: an
    /// unreadable file, a failed rename, or a failed write of the default.
    pub fn load(&self) -> Result<ConfigOutcome, CoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                error!(
                    "No config found at {}, creating a default one...",
                    self.path.display()
                );
                self.write_default()?;
                return Ok(ConfigOutcome::RestartRequired {
                    reason: ConfigError::FileNotFound {
                        path: self.path.display().to_string(),
                    },
                });
            }
            Err(e) => return Err(e.into()),
        };

        let parsed = String::from_utf8(bytes)
            .map_err(|_| ConfigError::InvalidEncoding {
                path: self.path.display().to_string(),
            })
            .and_then(|contents| parse_settings(&contents));

        match parsed {
            Ok(settings) => {
                info!(
                    "Loaded config for r/{} with {} keywords and {} phrases",
                    settings.subreddit,
                    settings.keywords.len(),
                    settings.phrases.len()
                );
                Ok(ConfigOutcome::Ready(settings))
            }
            Err(reason) => {
                error!(
                    "Config error:\n{}\nMaking backup and creating default...",
                    reason
                );
                fs::rename(&self.path, &self.backup_path)?;
                self.write_default()?;
                Ok(ConfigOutcome::RestartRequired { reason })
            }
        }
    }

    fn write_default(&self) -> Result<(), CoreError> {
        fs::write(&self.path, default_config_toml()?)?;
        info!("Wrote default config to {}", self.path.display());
        Ok(())
    }
}
