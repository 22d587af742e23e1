//! Application settings.
//!
//! Read from an optional `settings.toml` in the working directory, then from
//! `CLAIMSHEETS__*` environment variables (`CLAIMSHEETS__SERVER__PORT=8080`).
//!
//! ```toml
//! [app]
//! level = "debug"
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 3000
//! database = { sqlite = "claimsheets.db" }
//! cors_origin = "http://localhost:5173"
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

/// Where the claim sheets are stored. `memory` keeps them on a single
/// connection held for the life of the process and loses them on exit.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Option<Database>,
    pub cors_origin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(
                    Environment::with_prefix("CLAIMSHEETS")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("app.level", "info")?
            .set_default("server.port", 3000_i64)?
            .build()?
            .try_deserialize()
    }
}

impl Server {
    /// Connection URL understood by sea-orm. Defaults to `claimsheets.db` in
    /// the working directory.
    pub fn database_url(&self) -> String {
        match &self.database {
            Some(Database::Memory) => "sqlite::memory:".to_string(),
            Some(Database::Sqlite(path)) => format!("sqlite:{path}?mode=rwc"),
            None => "sqlite:claimsheets.db?mode=rwc".to_string(),
        }
    }
}
