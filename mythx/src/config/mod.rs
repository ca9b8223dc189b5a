//! Central module for client configuration.
//!
//! This module loads the deployment selection, credentials and middleware
//! settings from environment variables, and persists the CLI's credential
//! file between invocations.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::{APIHandler, Client, Credentials};
use crate::errors::MythXResult;
use crate::middleware::tool_name::DEFAULT_TOOL_NAME;
use crate::middleware::{
    AnalysisCacheMiddleware, ClientToolNameMiddleware, GroupDataMiddleware, Middleware,
};

pub use crate::api::Environment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub environment: Environment,
    /// Overrides the environment's base URL when set.
    pub api_url: Option<Url>,
    pub credentials: Credentials,
    pub tool_name: String,
    pub group_id: Option<String>,
    pub group_name: Option<String>,
    pub no_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            api_url: None,
            credentials: Credentials::default(),
            tool_name: DEFAULT_TOOL_NAME.to_string(),
            group_id: None,
            group_name: None,
            no_cache: false,
        }
    }
}

/// Reads a variable, treating unset and empty values alike.
fn env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_bool(name: &str) -> Result<bool> {
    match env_opt(name) {
        None => Ok(false),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => anyhow::bail!("{} must be a boolean, got '{}'", name, raw),
        },
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_staging(env_bool("MYTHX_STAGING")?);

        let api_url = env_opt("MYTHX_API_URL")
            .map(|raw| Url::parse(&raw))
            .transpose()
            .context("MYTHX_API_URL must be a valid URL")?;

        let credentials = Credentials {
            eth_address: env_opt("MYTHX_ETH_ADDRESS"),
            password: env_opt("MYTHX_PASSWORD"),
            access_token: env_opt("MYTHX_ACCESS_TOKEN"),
            refresh_token: env_opt("MYTHX_REFRESH_TOKEN"),
        };

        let tool_name =
            env_opt("MYTHX_TOOL_NAME").unwrap_or_else(|| DEFAULT_TOOL_NAME.to_string());

        let no_cache = env_bool("MYTHX_NO_CACHE")?;

        Ok(Config {
            environment,
            api_url,
            credentials,
            tool_name,
            group_id: env_opt("MYTHX_GROUP_ID"),
            group_name: env_opt("MYTHX_GROUP_NAME"),
            no_cache,
        })
    }

    /// The middleware chain this configuration implies: tool name, group
    /// data when a group is set, then the analysis cache flag.
    pub fn middlewares(&self) -> Vec<Box<dyn Middleware>> {
        let mut middlewares: Vec<Box<dyn Middleware>> =
            vec![Box::new(ClientToolNameMiddleware::new(self.tool_name.clone()))];
        if self.group_id.is_some() || self.group_name.is_some() {
            middlewares.push(Box::new(GroupDataMiddleware::new(
                self.group_id.clone(),
                self.group_name.clone(),
            )));
        }
        middlewares.push(Box::new(AnalysisCacheMiddleware::new(self.no_cache)));
        middlewares
    }

    pub fn handler(&self) -> MythXResult<APIHandler> {
        let handler = match &self.api_url {
            Some(url) => APIHandler::with_base_url(url.clone()),
            None => APIHandler::new(self.environment)?,
        };
        Ok(handler.with_middlewares(self.middlewares()))
    }

    pub fn client(&self) -> MythXResult<Client> {
        Ok(Client::new(self.handler()?, self.credentials.clone()))
    }
}

/// Credentials and tokens the CLI keeps between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStore {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl CredentialStore {
    pub fn default_path() -> PathBuf {
        env::temp_dir().join(".mythx.json")
    }

    /// Reads the store at `path`. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read credential file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Malformed credential file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self).context("Failed to encode credentials")?;
        write_private(path, raw.as_bytes())
            .with_context(|| format!("Failed to write credential file {}", path.display()))
    }

    /// Fills the gaps in `credentials` from the store. Values already set
    /// win over stored ones.
    pub fn merge_into(&self, credentials: Credentials) -> Credentials {
        Credentials {
            eth_address: credentials.eth_address.or_else(|| self.username.clone()),
            password: credentials.password.or_else(|| self.password.clone()),
            access_token: credentials.access_token.or_else(|| self.access.clone()),
            refresh_token: credentials.refresh_token.or_else(|| self.refresh.clone()),
        }
    }
}

impl From<&Credentials> for CredentialStore {
    fn from(credentials: &Credentials) -> Self {
        Self {
            username: credentials.eth_address.clone(),
            password: credentials.password.clone(),
            access: credentials.access_token.clone(),
            refresh: credentials.refresh_token.clone(),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 10] = [
        "MYTHX_ETH_ADDRESS",
        "MYTHX_PASSWORD",
        "MYTHX_ACCESS_TOKEN",
        "MYTHX_REFRESH_TOKEN",
        "MYTHX_STAGING",
        "MYTHX_API_URL",
        "MYTHX_TOOL_NAME",
        "MYTHX_GROUP_ID",
        "MYTHX_GROUP_NAME",
        "MYTHX_NO_CACHE",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.handler().unwrap().base_url().as_str(), crate::api::PRODUCTION_URL);
        assert_eq!(config.middlewares().len(), 2);
    }

    #[test]
    #[serial]
    fn test_from_env_with_all_vars() {
        clear_env();
        unsafe {
            env::set_var("MYTHX_ETH_ADDRESS", "0x0");
            env::set_var("MYTHX_PASSWORD", "pw");
            env::set_var("MYTHX_STAGING", "true");
            env::set_var("MYTHX_TOOL_NAME", "scanner");
            env::set_var("MYTHX_GROUP_ID", "group-1");
            env::set_var("MYTHX_NO_CACHE", "1");
        }

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.credentials, Credentials::password("0x0", "pw"));
        assert_eq!(config.tool_name, "scanner");
        assert_eq!(config.group_id.as_deref(), Some("group-1"));
        assert!(config.no_cache);

        let handler = config.handler().unwrap();
        assert_eq!(handler.base_url().as_str(), crate::api::STAGING_URL);
        assert_eq!(handler.middlewares().len(), 3);
        assert!(format!("{:?}", handler.middlewares()[1]).contains("GroupDataMiddleware"));

        let client = config.client().unwrap();
        assert_eq!(client.eth_address(), Some("0x0"));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_values() {
        clear_env();
        unsafe {
            env::set_var("MYTHX_NO_CACHE", "maybe");
        }
        assert!(Config::from_env().is_err());

        clear_env();
        unsafe {
            env::set_var("MYTHX_API_URL", "not a url");
        }
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_api_url_overrides_environment() {
        clear_env();
        unsafe {
            env::set_var("MYTHX_API_URL", "http://127.0.0.1:3100/v1");
        }
        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(
            config.handler().unwrap().base_url().as_str(),
            "http://127.0.0.1:3100/v1/"
        );
    }

    #[test]
    fn test_credential_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");

        assert_eq!(CredentialStore::load(&path).unwrap(), CredentialStore::default());

        let store = CredentialStore::from(&Credentials::tokens("acc", "ref"));
        store.save(&path).unwrap();
        assert_eq!(CredentialStore::load(&path).unwrap(), store);

        fs::write(&path, "{ not json").unwrap();
        assert!(CredentialStore::load(&path).is_err());
    }

    #[test]
    fn test_credential_store_fills_gaps_only() {
        let store = CredentialStore {
            username: Some("0xstored".to_string()),
            password: Some("stored".to_string()),
            access: Some("acc".to_string()),
            refresh: None,
        };
        let merged = store.merge_into(Credentials::password("0xenv", "env"));
        assert_eq!(merged.eth_address.as_deref(), Some("0xenv"));
        assert_eq!(merged.password.as_deref(), Some("env"));
        assert_eq!(merged.access_token.as_deref(), Some("acc"));
        assert!(merged.refresh_token.is_none());
    }
}
