//! Runtime settings: built-in defaults, overridden by `JEWEL_*` environment
//! variables (`JEWEL_SERVER__PORT=9000`, `JEWEL_AUTH__TOKEN_SECRET=...`).

use config::{Config, Environment};
use secrecy::SecretString;
use serde::Deserialize;

pub const DEV_TOKEN_SECRET: &str = "jewel-orders-dev-secret";

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct RawAuthSettings {
    token_secret: String,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    server: ServerSettings,
    database: DatabaseSettings,
    auth: RawAuthSettings,
}

#[derive(Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub token_secret: SecretString,
    /// True when no secret was configured and the development one is in use
    pub dev_secret: bool,
}

impl Settings {
    pub fn load() -> Result<Self, config::ConfigError> {
        let raw: RawSettings = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080_i64)?
            .set_default("database.url", "sqlite:jewel_orders.db")?
            .set_default("auth.token_secret", DEV_TOKEN_SECRET)?
            .add_source(
                Environment::with_prefix("JEWEL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        let dev_secret = raw.auth.token_secret == DEV_TOKEN_SECRET;
        Ok(Self {
            server: raw.server,
            database: raw.database,
            token_secret: SecretString::from(raw.auth.token_secret),
            dev_secret,
        })
    }
}
