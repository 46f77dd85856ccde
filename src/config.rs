//! Runtime configuration.
//!
//! Base URLs for the geocoding and MOSMIX APIs are supplied from an optional
//! configuration file and `MOSMIX_MAP_*` environment variables. Nothing has a
//! built-in default: a missing base URL surfaces as [`MapError::Config`] when
//! the corresponding client is built.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{MapError, Result};
use crate::utils::constants::{DEFAULT_TIMEOUT_SECS, ENV_PREFIX};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Nominatim-compatible geocoder, e.g. `https://nominatim.example.org`
    #[serde(default)]
    pub geocoding_base_url: Option<String>,

    /// Weather API serving `climate/v1/mosmix/...`
    #[serde(default)]
    pub api_base_url: Option<String>,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Ask the geocoder for polygon outlines (`polygon_geojson=1`)
    #[serde(default)]
    pub request_polygon: bool,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            geocoding_base_url: None,
            api_base_url: None,
            user_agent: None,
            request_polygon: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load from an optional file and the process environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(file, None)
    }

    /// Like [`Settings::load`] but reading variables from `env` instead of the process
    pub fn load_with_env(file: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    pub fn with_geocoding_base_url(mut self, url: impl Into<String>) -> Self {
        self.geocoding_base_url = Some(url.into());
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn geocoding_base_url(&self) -> Result<&str> {
        required_url(self.geocoding_base_url.as_deref(), "geocoding_base_url")
    }

    pub fn api_base_url(&self) -> Result<&str> {
        required_url(self.api_base_url.as_deref(), "api_base_url")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn required_url<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    let url = value.map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(MapError::Config(format!(
            "{} is not set (use {}_{})",
            key,
            ENV_PREFIX,
            key.to_uppercase()
        )));
    }

    Ok(url.trim_end_matches('/'))
}
