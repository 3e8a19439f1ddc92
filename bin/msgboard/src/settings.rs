//! Runtime settings.
//!
//! Sources, lowest to highest precedence: built-in defaults,
//! `config/default.toml`, `config/local.toml`, then `MSGBOARD__*` environment
//! variables (e.g. `MSGBOARD__SERVER__PORT=8080`,
//! `MSGBOARD__BOARDS__ALLOWED=g,b`).

use std::time::Duration;

use config::{Config, ConfigError, Environment, File, Map};
use mb_core::{AppError, BoardName, WriteConcern};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub write_concern: WriteConcernSettings,
    pub boards: BoardSettings,
    pub log: LogSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub backend: Backend,
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct WriteConcernSettings {
    pub journal: bool,
    pub timeout_ms: u64,
}

impl From<&WriteConcernSettings> for WriteConcern {
    fn from(s: &WriteConcernSettings) -> Self {
        WriteConcern {
            journal: s.journal,
            timeout: Duration::from_millis(s.timeout_ms),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BoardSettings {
    pub allowed: Vec<String>,
}

impl BoardSettings {
    /// Validates the configured allow-list up front.
    pub fn allowed_boards(&self) -> Result<Vec<BoardName>, AppError> {
        self.allowed.iter().map(|b| BoardName::parse(b)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(None)
    }

    /// Builds settings, reading the environment from `env` when given
    /// instead of the process environment.
    fn from_env(env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.backend", "sqlite")?
            .set_default("database.url", "sqlite://msgboard.db?mode=rwc")?
            .set_default("database.max_connections", 5)?
            .set_default("write_concern.journal", true)?
            .set_default("write_concern.timeout_ms", 1000)?
            .set_default("boards.allowed", Vec::<String>::new())?
            .set_default("log.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("MSGBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("boards.allowed")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }

    #[test]
    fn defaults_fill_every_key() {
        let settings = Settings::from_env(env(&[])).unwrap();
        assert_eq!(settings.database.backend, Backend::Sqlite);
        assert!(settings.database.url.expose_secret().starts_with("sqlite:"));
        assert!(settings.write_concern.journal);

        let wc = WriteConcern::from(&settings.write_concern);
        assert_eq!(wc.timeout, Duration::from_millis(1000));
        assert!(settings.boards.allowed_boards().unwrap().is_empty());
    }

    #[test]
    fn environment_overrides() {
        let settings = Settings::from_env(env(&[
            ("MSGBOARD__SERVER__PORT", "8080"),
            ("MSGBOARD__DATABASE__BACKEND", "memory"),
            ("MSGBOARD__WRITE_CONCERN__TIMEOUT_MS", "250"),
            ("MSGBOARD__BOARDS__ALLOWED", "g,b"),
            ("MSGBOARD__LOG__FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.database.backend, Backend::Memory);
        assert_eq!(settings.write_concern.timeout_ms, 250);
        assert_eq!(settings.log.format, LogFormat::Json);
        let boards = settings.boards.allowed_boards().unwrap();
        assert_eq!(boards.iter().map(BoardName::as_str).collect::<Vec<_>>(), ["g", "b"]);
    }

    #[test]
    fn bad_allow_list_entry_is_rejected() {
        let boards = BoardSettings { allowed: vec!["ok".into(), "not/ok".into()] };
        assert!(boards.allowed_boards().is_err());
    }
}
