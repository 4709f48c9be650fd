use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the Gemini API key (also read from `.env`).
pub const API_KEY_VAR: &str = "API_KEY";
pub const MODEL_VAR: &str = "SHELLHIT_MODEL";
pub const TIMEOUT_VAR: &str = "SHELLHIT_TIMEOUT_SECS";
pub const MOCK_VAR: &str = "SHELLHIT_USE_MOCK";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub use_mock: bool,
    #[serde(default)]
    pub confirm_ai_commands: bool,
    #[serde(default = "default_require_elevation")]
    pub require_elevation: bool,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_require_elevation() -> bool {
    cfg!(windows)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            request_timeout_secs: default_timeout_secs(),
            use_mock: false,
            confirm_ai_commands: false,
            require_elevation: default_require_elevation(),
        }
    }
}

impl Config {
    /// Load configuration from file, `.env`, and environment variables.
    ///
    /// Later sources win: defaults, then `~/.shellhit/config.toml`, then the
    /// `.env` file in the working directory, then the process environment.
    /// A missing or broken config file is not an error.
    pub fn load() -> Result<Self> {
        let mut config = match Self::get_config_path() {
            Ok(path) => Self::load_from_path(&path).unwrap_or_else(|e| {
                info!("Using default config: {}", e);
                Self::default()
            }),
            Err(e) => {
                warn!("Could not resolve config path: {}", e);
                Self::default()
            }
        };

        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded environment from: {}", path.display()),
            Err(e) => info!("No .env file loaded: {}", e),
        }

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Config file not found: {}", path.display()));
        }
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            warn!("Ignoring malformed config file {}: {}", path.display(), e);
            anyhow!("Malformed config file: {}", e)
        })?;
        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Applies overrides from a variable lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(API_KEY_VAR).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(api_key.trim().to_string());
        }

        if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.trim().is_empty()) {
            self.model = model.trim().to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => warn!("Ignoring invalid {}={:?}", TIMEOUT_VAR, raw),
            }
        }

        if lookup(MOCK_VAR).is_some() {
            self.use_mock = true;
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::get_config_path()?)
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        info!("Saved config to: {}", config_path.display());
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    pub fn get_config_dir() -> Result<PathBuf> {
        let home = home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".shellhit"))
    }

    /// Set API key and save config
    pub fn set_api_key(&mut self, api_key: String) -> Result<()> {
        self.api_key = Some(api_key);
        self.save()?;
        info!("API key saved to config file");
        Ok(())
    }

    pub fn get_api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn is_mock_mode(&self) -> bool {
        self.use_mock
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn show_config_info(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        println!("Configuration file: {}", config_path.display());
        println!(
            "Status: {}",
            if config_path.exists() { "Found" } else { "Not found (using defaults)" }
        );
        println!("API Key: {}", if self.api_key.is_some() { "Set" } else { "Not set" });
        println!("Model: {}", self.model);
        println!("Request timeout: {}s", self.request_timeout_secs);
        println!("Mock mode: {}", self.use_mock);
        println!("Confirm AI commands: {}", self.confirm_ai_commands);
        println!("Require elevation: {}", self.require_elevation);

        println!("\nTo set API key:");
        println!("  shellhit --set-api-key <your-key>");
        println!("\nOr add it to a .env file in the working directory:");
        println!("  {}=<your-key>", API_KEY_VAR);

        Ok(())
    }
}
