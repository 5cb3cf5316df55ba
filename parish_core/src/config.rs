use std::{path::Path, time::Duration};

use anyhow::Result;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

use crate::pagination::PageSize;

pub const ENV_PREFIX: &str = "PARISH_CONF_";

pub const DEFAULT_CONFIG: &str = r#"backend_url = "http://localhost:8000/api""#;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_host")]
    pub web_host: String,
    #[serde(default = "default_port")]
    pub web_port: u16,

    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default)]
    pub backend_token: Option<String>,
    /// Seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    #[serde(default)]
    pub default_page_size: PageSize,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Figment::new()
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            web_host: default_host(),
            web_port: default_port(),
            backend_url: default_backend_url(),
            backend_token: None,
            request_timeout: default_request_timeout(),
            default_page_size: PageSize::default(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    3000
}

fn default_backend_url() -> String {
    "http://localhost:8000/api".to_owned()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_currency_symbol() -> String {
    "₱".to_owned()
}
