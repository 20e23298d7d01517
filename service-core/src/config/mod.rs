use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Environment variable holding the listen port of a microservice.
pub const PORT_ENV: &str = "MS_PORT";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .set_override_option("port", std::env::var(PORT_ENV).ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
