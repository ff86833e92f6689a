use common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::ops::RangeInclusive;

/// Tunables of the generation pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Extra attempts after a response that cleans to nothing
    pub max_empty_retries: u32,
    /// Leading lines of a file shown to the model for module docstrings
    pub module_preview_lines: usize,
    /// Seeds drawn on regeneration and retries
    pub variation_seed_range: RangeInclusive<u32>,
    /// Try the short model prompt before falling back to templates
    pub fallback_model_call: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_empty_retries: 2,
            module_preview_lines: 50,
            variation_seed_range: 1..=100,
            fallback_model_call: true,
        }
    }
}

impl GeneratorConfig {
    /// Defaults overridden by `DOCSMITH_MAX_RETRIES` and `DOCSMITH_PREVIEW_LINES`.
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(retries) = parse_env::<u32>("DOCSMITH_MAX_RETRIES")? {
            config.max_empty_retries = retries;
        }

        if let Some(lines) = parse_env::<usize>("DOCSMITH_PREVIEW_LINES")? {
            if lines == 0 {
                return Err(ConfigError::InvalidValue {
                    config_key: "DOCSMITH_PREVIEW_LINES".to_string(),
                    value: "0".to_string(),
                    reason: "preview must contain at least one line".to_string(),
                });
            }
            config.module_preview_lines = lines;
        }

        Ok(config)
    }

    pub fn with_max_empty_retries(mut self, retries: u32) -> Self {
        self.max_empty_retries = retries;
        self
    }

    pub fn with_variation_seed_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.variation_seed_range = range;
        self
    }

    pub fn with_fallback_model_call(mut self, enabled: bool) -> Self {
        self.fallback_model_call = enabled;
        self
    }

    pub fn with_module_preview_lines(mut self, lines: usize) -> Self {
        self.module_preview_lines = lines.max(1);
        self
    }
}

fn parse_env<T>(key: &str) -> ConfigResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                config_key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvVarError {
            var_name: key.to_string(),
            reason: e.to_string(),
        }),
    }
}
