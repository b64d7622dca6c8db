//! Server configuration.
//!
//! Loaded from a YAML file, then selected values are overridden from
//! the environment so secrets need not live on disk.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use bazaar_auth::AuthConfig;
use bazaar_db::DbConfig;
use serde::Deserialize;

/// Default path of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "./config.yml";

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "BAZAAR_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid listen address: {0}")]
    Address(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub bind_ip: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind_ip: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db = DbConfig::default();
        Self {
            url: db.url,
            namespace: db.namespace,
            database: db.database,
            username: db.username,
            password: db.password,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// HS256 signing key.
    pub key: String,
    pub pepper: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Lifetime as `"<days>d"`.
    pub expires: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            expires: AuthConfig::default().token_expires,
        }
    }
}

/// Top-level server configuration.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: ListenConfig,
    pub storage: StorageConfig,
    pub authorization: AuthorizationConfig,
    pub token: TokenConfig,
}

impl ServerConfig {
    /// Read and parse the YAML file at `path`, then apply environment
    /// overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_yaml(&raw)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Override secrets and the port from `lookup` (normally the
    /// process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("BAZAAR_JWT_SECRET") {
            self.authorization.key = key;
        }
        if let Some(pepper) = lookup("BAZAAR_PASSWORD_PEPPER") {
            self.authorization.pepper = Some(pepper);
        }
        if let Some(password) = lookup("BAZAAR_DB_PASSWORD") {
            self.storage.password = password;
        }
        if let Some(port) = lookup("BAZAAR_PORT").and_then(|p| p.parse().ok()) {
            self.listen.port = port;
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .listen
            .bind_ip
            .parse()
            .map_err(|_| ConfigError::Address(self.listen.bind_ip.clone()))?;
        Ok(SocketAddr::new(ip, self.listen.port))
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.authorization.key.clone(),
            token_expires: self.token.expires.clone(),
            pepper: self.authorization.pepper.clone(),
            ..Default::default()
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.storage.url.clone(),
            namespace: self.storage.namespace.clone(),
            database: self.storage.database.clone(),
            username: self.storage.username.clone(),
            password: self.storage.password.clone(),
        }
    }
}
