use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, OptionExt, Result};
use serde::{Deserialize, Serialize};

use crate::library::Side;

const APP_DIRECTORY: &str = "spotify-account-sync";

const DEFAULT_CONFIG: &str = r#"# Path of the snapshot database (defaults to the user data directory)
# database = "~/.local/share/spotify-account-sync/library.db"

[api]
client_id = ""
client_secret = ""
redirect_uri = "http://localhost/callback"

# Refresh tokens are obtained with the `refresh-token` command
[accounts.left]
refresh_token = ""

[accounts.right]
refresh_token = ""
"#;

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    database: Option<String>,
    api: ApiConfig,
    accounts: AccountsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    pub left: AccountConfig,
    pub right: AccountConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub refresh_token: String,
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join(APP_DIRECTORY).join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path().ok_or_eyre("Config file not found")?;

        Self::from_file(&config_path)
    }

    /// Writes a template config to the default location unless one exists.
    /// Returns the path of the config file.
    pub fn create_default() -> Result<PathBuf> {
        let config_path =
            Self::config_path().ok_or_eyre("Could not determine config directory")?;

        if config_path.exists() {
            log::info!("Config already exists at: {}", config_path.display());
            return Ok(config_path);
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create config directory: {}",
                parent.display()
            ))?;
        }
        std::fs::write(&config_path, DEFAULT_CONFIG).context(format!(
            "Failed to write config file: {}",
            config_path.display()
        ))?;

        Ok(config_path)
    }

    /// Expand ~ to home directory
    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get expanded database path
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database {
            Some(path) => Ok(Self::expand_path(path)),
            None => dirs::data_dir()
                .map(|path| path.join(APP_DIRECTORY).join("library.db"))
                .ok_or_eyre("Could not determine data directory, set `database` in the config"),
        }
    }

    /// API credentials, `SPOTIFY_CLIENT_ID` and `SPOTIFY_CLIENT_SECRET` take
    /// precedence over the file
    pub fn api(&self) -> ApiConfig {
        self.api_with_overrides(|key| std::env::var(key).ok())
    }

    fn api_with_overrides(&self, lookup: impl Fn(&str) -> Option<String>) -> ApiConfig {
        let mut api = self.api.clone();
        if let Some(client_id) = lookup("SPOTIFY_CLIENT_ID").filter(|v| !v.is_empty()) {
            api.client_id = client_id;
        }
        if let Some(client_secret) = lookup("SPOTIFY_CLIENT_SECRET").filter(|v| !v.is_empty()) {
            api.client_secret = client_secret;
        }
        api
    }

    pub fn account(&self, side: Side) -> &AccountConfig {
        match side {
            Side::Left => &self.accounts.left,
            Side::Right => &self.accounts.right,
        }
    }
}
