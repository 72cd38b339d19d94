use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ShellConfig {
    pub theme: UiTheme,
    pub api: ApiConfig,
    pub links: NavigationLinks,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            theme: UiTheme::Classic,
            api: ApiConfig::default(),
            links: NavigationLinks::default(),
        }
    }
}

impl ShellConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`ShellConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_path: String,
    pub command_path: String,
    pub session_cookie: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:2900".to_string(),
            user_path: "/rest/user".to_string(),
            command_path: "/rest/cli/command".to_string(),
            session_cookie: "codalab_session".to_string(),
        }
    }
}

/// Fixed link destinations. Opaque to the shell; it only hands them to the
/// navigation port.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NavigationLinks {
    pub dashboard: String,
    pub gallery: String,
    pub how_to: String,
    pub contact: String,
    pub sign_up: String,
    pub login: String,
    pub account_profile: String,
}

impl Default for NavigationLinks {
    fn default() -> Self {
        Self {
            dashboard: "/rest/worksheets/?name=dashboard".to_string(),
            gallery: "/worksheets?name=home".to_string(),
            how_to: "https://codalab-worksheets.readthedocs.io/en/latest/".to_string(),
            contact: "mailto:codalab.worksheets@gmail.com".to_string(),
            sign_up: "/account/signup".to_string(),
            login: "/account/login".to_string(),
            account_profile: "/account/profile".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UiTheme {
    Classic,
    Cyberpunk,
    NeonNoir,
    SolarFlare,
    ForestZen,
}

impl UiTheme {
    pub fn label(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Cyberpunk => "cyberpunk",
            Self::NeonNoir => "neon-noir",
            Self::SolarFlare => "solar-flare",
            Self::ForestZen => "forest-zen",
        }
    }
}
