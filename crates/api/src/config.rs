use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Errors raised while loading [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration loaded from environment variables.
///
/// Read once at startup and shared read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `22375`).
    pub port: u16,
    /// Parent directory for per-pull scratch space.
    pub temp_dir: PathBuf,
    /// Remote store every pull is served from.
    pub store_url: String,
    /// Name used in the root responder and in engine error prefixes.
    pub product_name: String,
    /// Executable invoked to perform a pull.
    pub engine_command: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var          | Default              |
    /// |------------------|----------------------|
    /// | `HOST`           | `0.0.0.0`            |
    /// | `PORT`           | `22375`              |
    /// | `TEMP_DIR`       | `$TMPDIR/blobgate`   |
    /// | `STORE_URL`      | required             |
    /// | `PRODUCT_NAME`   | `Blobgate`           |
    /// | `ENGINE_COMMAND` | `blobgate-engine`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        if host.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Invalid {
                key: "HOST",
                value: host,
            });
        }

        let port = match var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?,
            None => 22375,
        };

        let temp_dir = var("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("blobgate"));

        let store_url = var("STORE_URL").ok_or(ConfigError::Missing("STORE_URL"))?;

        let product_name = var("PRODUCT_NAME").unwrap_or_else(|| "Blobgate".into());
        let engine_command = var("ENGINE_COMMAND").unwrap_or_else(|| "blobgate-engine".into());

        Ok(Self {
            host,
            port,
            temp_dir,
            store_url,
            product_name,
            engine_command,
        })
    }

    /// Socket address the server binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        // `host` is validated as an IP address when the config is loaded.
        let ip = self.host.parse().unwrap_or(IpAddr::from([0, 0, 0, 0]));
        SocketAddr::new(ip, self.port)
    }
}
