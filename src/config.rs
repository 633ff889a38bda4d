use crate::gemini::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::gemini::retry::DEFAULT_MAX_RETRIES;
use crate::Error;
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_DIR: &str = "output";

// Configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the `GEMINI_*` variables.
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            api_key: lookup("GEMINI_API_KEY").filter(|key| !key.trim().is_empty()),
            base_url: lookup("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs: parse_var(&lookup, "GEMINI_TIMEOUT_SECS")?
                .unwrap_or(defaults.timeout_secs),
            max_retries: parse_var(&lookup, "GEMINI_MAX_RETRIES")?
                .unwrap_or(defaults.max_retries),
            output_dir: lookup("GEMINI_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        })
    }

    /// Key from the environment, or an error naming the variable.
    pub fn require_api_key(&self) -> crate::Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> crate::Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, raw)))
        })
        .transpose()
}
