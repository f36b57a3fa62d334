//! Client configuration

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ClientError;

/// Backend base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1/";

/// Environment variable holding the backend base URL
pub const ENV_API_URL: &str = "CONSOLE_API_URL";
/// Environment variable holding the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "CONSOLE_TIMEOUT_SECS";
/// Environment variable holding the shared HS256 token secret
pub const ENV_TOKEN_SECRET: &str = "CONSOLE_TOKEN_SECRET";
/// Environment variable selecting the durable storage backend
pub const ENV_STORAGE: &str = "CONSOLE_STORAGE";

/// Where the session is mirrored between process runs
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StorageBackend {
    /// No durable storage; persisting is logged and skipped
    None,
    /// Process-local map, lost on exit
    #[default]
    Memory,
    /// JSON file on disk
    File(PathBuf),
    /// Redis server URL
    Redis(String),
}

impl FromStr for StorageBackend {
    type Err = ClientError;

    /// Accepts `none`, `memory`, `file:<path>`, `redis://...` and `rediss://...`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "none" | "" => Ok(StorageBackend::None),
            "memory" => Ok(StorageBackend::Memory),
            _ if s.starts_with("file:") => {
                let path = &s["file:".len()..];
                if path.is_empty() {
                    return Err(ClientError::InvalidConfig(
                        "file storage requires a path".to_string(),
                    ));
                }
                Ok(StorageBackend::File(PathBuf::from(path)))
            }
            _ if s.starts_with("redis://") || s.starts_with("rediss://") => {
                Ok(StorageBackend::Redis(s.to_string()))
            }
            other => Err(ClientError::InvalidConfig(format!(
                "unknown storage backend: {}",
                other
            ))),
        }
    }
}

/// Configuration for the console client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend base URL, always ending in `/`
    base_url: Url,

    /// Per-request timeout (default: None - wait indefinitely)
    pub timeout: Option<Duration>,

    /// Shared secret for HS256 token verification at login (default: None - tokens are opaque)
    pub token_secret: Option<String>,

    /// Durable storage backend for the session (default: Memory)
    pub storage: StorageBackend,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            timeout: None,
            token_secret: None,
            storage: StorageBackend::default(),
            user_agent: concat!("console-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for the given backend base URL
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            ..Default::default()
        })
    }

    /// Build a configuration from `CONSOLE_*` environment variables
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup(ENV_API_URL) {
            Some(url) => Self::new(&url)?,
            None => Self::default(),
        };

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientError::InvalidConfig(format!("{} must be an integer: {}", ENV_TIMEOUT_SECS, secs))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        if let Some(secret) = lookup(ENV_TOKEN_SECRET) {
            if !secret.is_empty() {
                config.token_secret = Some(secret);
            }
        }

        if let Some(storage) = lookup(ENV_STORAGE) {
            config.storage = storage.parse()?;
        }

        Ok(config)
    }

    /// Set the backend base URL
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ClientError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Verify login tokens with this HS256 secret
    pub fn with_token_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.token_secret = Some(secret.into());
        self
    }

    /// Set the durable storage backend
    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    /// Set the User-Agent header
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// The backend base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a path relative to the base URL
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ClientError::InvalidConfig(format!(
            "unsupported URL scheme: {}",
            scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_base_url() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url().as_str(), DEFAULT_BASE_URL);
        assert!(config.timeout.is_none());
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::new("http://api.example.com/api/v1").unwrap();
        assert_eq!(
            config.endpoint("users/login").unwrap().as_str(),
            "http://api.example.com/api/v1/users/login"
        );
        assert_eq!(
            config.endpoint("/orders/").unwrap().as_str(),
            "http://api.example.com/api/v1/orders/"
        );
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(ClientConfig::new("not a url").is_err());
        assert!(matches!(
            ClientConfig::new("ftp://example.com/"),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_API_URL, "https://console.example.com/api/v1/"),
            (ENV_TIMEOUT_SECS, "15"),
            (ENV_TOKEN_SECRET, "welcome"),
            (ENV_STORAGE, "file:/tmp/console-session.json"),
        ]
        .into_iter()
        .collect();

        let config =
            ClientConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url().as_str(), "https://console.example.com/api/v1/");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.token_secret.as_deref(), Some("welcome"));
        assert_eq!(
            config.storage,
            StorageBackend::File(PathBuf::from("/tmp/console-session.json"))
        );
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let result = ClientConfig::from_lookup(|k| {
            (k == ENV_TIMEOUT_SECS).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ClientError::InvalidConfig(_))));
    }

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!("none".parse::<StorageBackend>().unwrap(), StorageBackend::None);
        assert_eq!("memory".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert_eq!(
            "redis://127.0.0.1/".parse::<StorageBackend>().unwrap(),
            StorageBackend::Redis("redis://127.0.0.1/".to_string())
        );
        assert!("file:".parse::<StorageBackend>().is_err());
        assert!("s3://bucket".parse::<StorageBackend>().is_err());
    }
}
