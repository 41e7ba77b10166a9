//! Server settings loaded via OrthoConfig, and the resolved server config.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroizing;

use groups_backend::outbound::persistence::{DbPool, PoolConfig};

use super::state_builders::Persistence;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_DEMO_PASSWORD: &str = "password";
/// `Key::derive_from` needs at least this much key material.
const SESSION_KEY_MIN_LEN: usize = 32;

/// Startup settings. Every field can come from CLI flags, `GROUPS_*`
/// environment variables or a configuration file.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GROUPS")]
pub struct ServerSettings {
    /// Socket address to bind, `0.0.0.0:8080` when unset.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without one the server keeps state in memory.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub pool_timeout_secs: Option<u64>,
    /// File holding the session cookie master key.
    pub session_key_file: Option<PathBuf>,
    /// Mark session cookies `Secure`. On unless set to `false`.
    pub cookie_secure: Option<bool>,
    /// Fall back to a random session key when the key file is unreadable.
    pub allow_ephemeral_session_key: Option<bool>,
    /// Seed the demo unit and accounts on startup.
    pub seed_demo_roster: Option<bool>,
    /// Password given to every demo account.
    pub demo_password: Option<String>,
}

/// Errors raised while turning settings into a runnable configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {message}")]
    Load { message: String },
    #[error("invalid bind address '{value}'")]
    BindAddr { value: String },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
}

impl ServerSettings {
    /// Load settings from the process arguments and environment.
    pub fn load_from_env() -> Result<Self, SettingsError> {
        Self::load_from_iter(std::env::args_os()).map_err(|err| SettingsError::Load {
            message: err.to_string(),
        })
    }

    /// Load settings ignoring the process arguments.
    pub fn load_without_args() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from("groups-backend")]).map_err(|err| {
            SettingsError::Load {
                message: err.to_string(),
            }
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::BindAddr {
            value: raw.to_owned(),
        })
    }

    pub fn session_key_file(&self) -> &Path {
        self.session_key_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SESSION_KEY_FILE))
    }

    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }

    pub fn allow_ephemeral_session_key(&self) -> bool {
        self.allow_ephemeral_session_key.unwrap_or(false)
    }

    pub fn seed_demo_roster(&self) -> bool {
        self.seed_demo_roster.unwrap_or(false)
    }

    pub fn demo_password(&self) -> &str {
        self.demo_password.as_deref().unwrap_or(DEFAULT_DEMO_PASSWORD)
    }

    /// Pool configuration when a database URL is set.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url.as_ref().map(|url| {
            let config = PoolConfig::new(url.clone())
                .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_SIZE));
            match self.pool_timeout_secs {
                Some(secs) => config.with_checkout_timeout(Duration::from_secs(secs)),
                None => config,
            }
        })
    }

    /// Read the session key, or generate one when allowed.
    ///
    /// Debug builds always tolerate a missing key file.
    pub fn session_key(&self) -> Result<Key, SettingsError> {
        let path = self.session_key_file();
        match std::fs::read(path) {
            Ok(bytes) => {
                let bytes = Zeroizing::new(bytes);
                if bytes.len() < SESSION_KEY_MIN_LEN {
                    return Err(SettingsError::KeyTooShort {
                        path: path.to_path_buf(),
                        length: bytes.len(),
                        min_len: SESSION_KEY_MIN_LEN,
                    });
                }
                Ok(Key::derive_from(&bytes))
            }
            Err(source) if self.allow_ephemeral_session_key() || cfg!(debug_assertions) => {
                warn!(
                    path = %path.display(),
                    error = %source,
                    "using temporary session key; sessions end on restart"
                );
                Ok(Key::generate())
            }
            Err(source) => Err(SettingsError::KeyRead {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Resolved configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) persistence: Persistence,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            persistence: Persistence::from_pool(None),
        }
    }

    /// Use Diesel repositories over `pool` instead of the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.persistence = Persistence::from_pool(Some(pool));
        self
    }

    pub(crate) fn persistence(&self) -> &Persistence {
        &self.persistence
    }
}
