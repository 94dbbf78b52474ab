use crate::{Error, Result};
use std::{env, path::PathBuf, str::FromStr};
use tracing::debug;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// ONNX classifier to load at startup. `None` runs the mock scorer.
    pub model_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            model_path: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    /// for anything missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            model_path: lookup("MODEL_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES")?
                .unwrap_or(defaults.max_upload_bytes),
        };

        if config.max_upload_bytes == 0 {
            return Err(Error::config("MAX_UPLOAD_BYTES must be greater than zero"));
        }

        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::config(format!("Invalid {}='{}': {}", key, raw, e)))
        })
        .transpose()
}
