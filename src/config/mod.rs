//! Client configuration.
//!
//! [`ClientConfig`] is the validated, immutable description of how to reach
//! the server. It can be built in code or loaded from YAML files and
//! environment variables through [`ClientSettings`].

mod settings;

pub use settings::{ChannelSettings, ClientSettings, TlsSettings};

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tonic::metadata::{Ascii, MetadataValue};

/// Default server address (ExESDB gRPC port).
pub const DEFAULT_SERVER_ADDRESS: &str = "localhost:2113";
/// Default time allowed to establish the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default upper bound for a single call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "exesdb.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "EXESDB_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "EXESDB";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "EXESDB_LOG";

/// Errors detected while building or loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("server address cannot be empty")]
    EmptyServerAddress,

    #[error("{field} must be positive")]
    NonPositiveTimeout { field: &'static str },

    #[error("invalid server address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid channel option {option}: {reason}")]
    InvalidChannelOption { option: &'static str, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// TLS settings for `https://` connections.
#[derive(Debug, Clone)]
pub struct TlsCredentials {
    /// PEM file with the CA certificate used to verify the server.
    pub ca_certificate: PathBuf,
    /// Override for the domain name checked against the certificate.
    pub domain: Option<String>,
}

/// Credentials attached to the connection and to every call.
#[derive(Clone, Default)]
pub struct Credentials {
    pub tls: Option<TlsCredentials>,
    /// Sent as `authorization: Bearer <token>` metadata.
    pub bearer_token: Option<String>,
}

impl Credentials {
    /// TLS verified against the CA certificate at `ca_certificate`.
    pub fn tls(ca_certificate: impl Into<PathBuf>) -> Self {
        Self {
            tls: Some(TlsCredentials {
                ca_certificate: ca_certificate.into(),
                domain: None,
            }),
            bearer_token: None,
        }
    }

    /// Bearer token authentication over a plaintext connection.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            tls: None,
            bearer_token: Some(token.into()),
        }
    }

    /// Set the TLS domain name override.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        if let Some(tls) = self.tls.as_mut() {
            tls.domain = Some(domain.into());
        }
        self
    }

    /// Add a bearer token.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tls", &self.tls)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Transport channel tuning.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    pub tcp_nodelay: bool,
    pub tcp_keepalive: Option<Duration>,
    pub keep_alive_interval: Option<Duration>,
    pub keep_alive_timeout: Option<Duration>,
    pub keep_alive_while_idle: bool,
    pub concurrency_limit: Option<usize>,
    pub max_decoding_message_size: Option<usize>,
    pub max_encoding_message_size: Option<usize>,
    pub user_agent: Option<String>,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            tcp_keepalive: None,
            keep_alive_interval: None,
            keep_alive_timeout: None,
            keep_alive_while_idle: false,
            concurrency_limit: None,
            max_decoding_message_size: None,
            max_encoding_message_size: None,
            user_agent: None,
        }
    }
}

/// Where the transport connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// Normalised `http://` or `https://` URI.
    Tcp(String),
    /// Unix domain socket path.
    Unix(PathBuf),
}

/// Configuration for connecting to an ExESDB server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address: `host:port`, `http(s)://host:port` or a Unix socket path.
    pub server_address: String,
    pub connect_timeout: Duration,
    /// Upper bound for every call that has no shorter explicit timeout.
    pub request_timeout: Duration,
    pub credentials: Option<Credentials>,
    pub channel: ChannelOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_ADDRESS)
    }
}

impl ClientConfig {
    /// Configuration with default timeouts for `server_address`.
    pub fn new(server_address: impl Into<String>) -> Self {
        Self {
            server_address: server_address.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            credentials: None,
            channel: ChannelOptions::default(),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_channel_options(mut self, channel: ChannelOptions) -> Self {
        self.channel = channel;
        self
    }

    /// Check every setting without touching the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_address.trim().is_empty() {
            return Err(ConfigError::EmptyServerAddress);
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::NonPositiveTimeout {
                field: "connect_timeout",
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::NonPositiveTimeout {
                field: "request_timeout",
            });
        }

        self.target()?;

        if let Some(token) = self.bearer_token() {
            if token.trim().is_empty() {
                return Err(ConfigError::InvalidCredentials(
                    "bearer token cannot be empty".into(),
                ));
            }
            authorization_value(token).ok_or_else(|| {
                ConfigError::InvalidCredentials(
                    "bearer token must contain only visible ASCII characters".into(),
                )
            })?;
        }

        if self.channel.concurrency_limit == Some(0) {
            return Err(ConfigError::InvalidChannelOption {
                option: "concurrency_limit",
                reason: "must be greater than zero".into(),
            });
        }
        if let Some(agent) = &self.channel.user_agent {
            http::HeaderValue::from_str(agent).map_err(|e| ConfigError::InvalidChannelOption {
                option: "user_agent",
                reason: e.to_string(),
            })?;
        }

        Ok(())
    }

    /// TLS settings, if any.
    pub fn tls(&self) -> Option<&TlsCredentials> {
        self.credentials.as_ref().and_then(|c| c.tls.as_ref())
    }

    /// Bearer token, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.credentials
            .as_ref()
            .and_then(|c| c.bearer_token.as_deref())
    }

    /// Resolve the server address into a connection target.
    ///
    /// Plain `host:port` addresses get `https://` when TLS is configured and
    /// `http://` otherwise.
    pub(crate) fn target(&self) -> Result<Target, ConfigError> {
        let address = self.server_address.trim();

        if let Some(path) = unix_socket_path(address) {
            if self.tls().is_some() {
                return Err(ConfigError::InvalidCredentials(
                    "TLS credentials cannot be used with a Unix domain socket".into(),
                ));
            }
            return Ok(Target::Unix(path));
        }

        let uri = if address.starts_with("https://") {
            if self.tls().is_none() {
                return Err(ConfigError::InvalidCredentials(
                    "an https:// address requires TLS credentials".into(),
                ));
            }
            address.to_string()
        } else if address.starts_with("http://") {
            if self.tls().is_some() {
                return Err(ConfigError::InvalidCredentials(
                    "TLS credentials require an https:// address".into(),
                ));
            }
            address.to_string()
        } else if self.tls().is_some() {
            format!("https://{address}")
        } else {
            format!("http://{address}")
        };

        let parsed = uri
            .parse::<http::Uri>()
            .map_err(|e| ConfigError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })?;
        if parsed.host().map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidAddress {
                address: address.to_string(),
                reason: "missing host".into(),
            });
        }

        Ok(Target::Tcp(uri))
    }
}

/// `authorization` metadata value for a bearer token.
pub(crate) fn authorization_value(token: &str) -> Option<MetadataValue<Ascii>> {
    format!("Bearer {token}").parse().ok()
}

fn unix_socket_path(address: &str) -> Option<PathBuf> {
    if address.starts_with('/') || address.starts_with("./") {
        Some(PathBuf::from(address))
    } else {
        address.strip_prefix("unix://").map(PathBuf::from)
    }
}
