//! User facing settings, layered from defaults, `dex.toml` and `DEX_*`
//! environment variables.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config as HierarchicalConfig, Environment};
use dex_catalog::{
    DEFAULT_CATALOG_LIMIT,
    DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_RESOURCE,
    DexClientConfig,
    RetryPolicy,
};
use dex_catalog::retry::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY};
use dex_catalog::types::EntityDetail;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::display::{DEFAULT_FALLBACK_IMAGE, EntityDisplay};
use crate::orchestrator::DEFAULT_DEBOUNCE;
use crate::service::DEFAULT_MAX_RESULTS;

/// Name of the dex managed config directory
const DEX_DIR_NAME: &str = "dex";
pub const DEX_CONFIG_DIR_VAR: &str = "DEX_CONFIG_DIR";
pub const DEX_CONFIG_FILE: &str = "dex.toml";
const DEX_ENV_PREFIX: &str = "DEX";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine a config directory, set ${DEX_CONFIG_DIR_VAR}")]
    NoConfigDir,
    #[error("could not read settings")]
    Read(#[from] config::ConfigError),
    #[error("invalid setting '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Upper bound of results per search
    pub max_results: usize,
    /// Quiet period after the last edit before a search starts
    pub debounce_ms: u64,
    /// Image shown for results without a sprite
    pub fallback_image: String,
    pub base_url: Url,
    /// Kind of entity listed, the catalog lives at `{base_url}/{resource}-form`
    pub resource: String,
    pub catalog_limit: u32,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub user_agent: Option<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
            fallback_image: DEFAULT_FALLBACK_IMAGE.to_string(),
            base_url: Url::parse(dex_catalog::DEFAULT_BASE_URL)
                .expect("default base url is valid"),
            resource: DEFAULT_RESOURCE.to_string(),
            catalog_limit: DEFAULT_CATALOG_LIMIT,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY.as_millis() as u64,
            user_agent: None,
        }
    }
}

impl SearchSettings {
    /// Load settings from `$DEX_CONFIG_DIR` (or the user config directory)
    /// and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        let config_dir = match env::var_os(DEX_CONFIG_DIR_VAR) {
            Some(dir) => {
                debug!(?dir, "`${DEX_CONFIG_DIR_VAR}` set");
                PathBuf::from(dir)
            },
            None => {
                let dir = dirs::config_dir()
                    .ok_or(SettingsError::NoConfigDir)?
                    .join(DEX_DIR_NAME);
                debug!(?dir, "`${DEX_CONFIG_DIR_VAR}` not set");
                dir
            },
        };
        Self::load_from(&config_dir, env::vars().collect())
    }

    /// Load settings from `config_dir/dex.toml`, overridden by the `DEX_*`
    /// entries of `vars`.
    ///
    /// A missing file is not an error.
    pub fn load_from(
        config_dir: &Path,
        vars: HashMap<String, String>,
    ) -> Result<Self, SettingsError> {
        let file = config_dir.join(DEX_CONFIG_FILE);
        debug!(file = %file.display(), "reading settings");

        let settings: SearchSettings = HierarchicalConfig::builder()
            .add_source(
                config::File::from(file)
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(DEX_ENV_PREFIX)
                    .source(Some(vars))
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.max_results == 0 {
            return Err(SettingsError::Invalid {
                field: "max_results",
                message: "must be at least 1".to_string(),
            });
        }
        if self.resource.trim().is_empty() {
            return Err(SettingsError::Invalid {
                field: "resource",
                message: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "request_timeout_ms",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// How `detail` is presented, using the configured fallback image.
    pub fn display(&self, detail: &EntityDetail) -> EntityDisplay {
        EntityDisplay::from_detail(detail, &self.fallback_image)
    }

    pub fn client_config(&self) -> DexClientConfig {
        DexClientConfig {
            base_url: self.base_url.as_str().trim_end_matches('/').to_string(),
            resource: self.resource.clone(),
            catalog_limit: self.catalog_limit,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
            },
            user_agent: self.user_agent.clone(),
            ..DexClientConfig::default()
        }
    }
}
