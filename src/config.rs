use crate::constants;
use crate::error::{ImportError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Settings for one import run. Every field has a hardcoded default; an
/// optional `ppp_import.toml` may override any of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub input_path: PathBuf,
    pub state: String,
    pub naics_code: String,
    pub supabase: SupabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub table: String,
    pub conflict_column: String,
    pub batch_size: usize,
    pub timeout_seconds: u64,
    pub env_file: PathBuf,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(constants::INPUT_FILE),
            state: constants::TARGET_STATE.to_string(),
            naics_code: constants::TARGET_NAICS_CODE.to_string(),
            supabase: SupabaseConfig::default(),
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_SUPABASE_URL.to_string(),
            table: constants::LOANS_TABLE.to_string(),
            conflict_column: constants::CONFLICT_COLUMN.to_string(),
            batch_size: constants::DEFAULT_BATCH_SIZE,
            timeout_seconds: constants::DEFAULT_REQUEST_TIMEOUT_SECS,
            env_file: PathBuf::from(constants::LOCAL_ENV_FILE),
        }
    }
}

impl ImportConfig {
    /// Load configuration. An explicitly requested file must exist; the default
    /// `ppp_import.toml` is optional and its absence means "use defaults".
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(constants::CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    debug!("No {} found, using built-in defaults", constants::CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ImportConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Label used in console output, e.g. "MN 624410".
    pub fn filter_label(&self) -> String {
        format!("{} {}", self.state, self.naics_code)
    }
}
