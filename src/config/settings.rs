//! File and environment backed client settings.
//!
//! Sources, in order of priority (later overrides earlier):
//! 1. `exesdb.yaml` in the current directory (if it exists)
//! 2. File given to [`ClientSettings::load`] (if provided)
//! 3. File named by `EXESDB_CONFIG` (if set)
//! 4. `EXESDB__*` environment variables, e.g. `EXESDB__SERVER_ADDRESS`

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use super::{
    ChannelOptions, ClientConfig, ConfigError, Credentials, TlsCredentials, CONFIG_ENV_PREFIX,
    CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SERVER_ADDRESS,
};

/// Serializable form of [`ClientConfig`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub server_address: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub tls: Option<TlsSettings>,
    pub bearer_token: Option<String>,
    pub channel: ChannelSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            tls: None,
            bearer_token: None,
            channel: ChannelSettings::default(),
        }
    }
}

/// TLS section of the settings file.
#[derive(Debug, Clone, Deserialize)]
pub struct TlsSettings {
    pub ca_certificate: PathBuf,
    #[serde(default)]
    pub domain: Option<String>,
}

/// Channel section of the settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    pub tcp_nodelay: bool,
    pub tcp_keepalive_secs: Option<u64>,
    pub keep_alive_interval_secs: Option<u64>,
    pub keep_alive_timeout_secs: Option<u64>,
    pub keep_alive_while_idle: bool,
    pub concurrency_limit: Option<usize>,
    pub max_decoding_message_size: Option<usize>,
    pub max_encoding_message_size: Option<usize>,
    pub user_agent: Option<String>,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            tcp_nodelay: true,
            tcp_keepalive_secs: None,
            keep_alive_interval_secs: None,
            keep_alive_timeout_secs: None,
            keep_alive_while_idle: false,
            concurrency_limit: None,
            max_decoding_message_size: None,
            max_encoding_message_size: None,
            user_agent: None,
        }
    }
}

impl ClientSettings {
    /// Load settings from files and environment.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config, Environment, File, FileFormat};

        let mut builder = Config::builder().add_source(
            File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false),
        );

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Convert into a [`ClientConfig`]. Validation happens when the client is built.
    pub fn into_config(self) -> ClientConfig {
        let credentials = if self.tls.is_some() || self.bearer_token.is_some() {
            Some(Credentials {
                tls: self.tls.map(|tls| TlsCredentials {
                    ca_certificate: tls.ca_certificate,
                    domain: tls.domain,
                }),
                bearer_token: self.bearer_token,
            })
        } else {
            None
        };

        let channel = self.channel;
        ClientConfig {
            server_address: self.server_address,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            credentials,
            channel: ChannelOptions {
                tcp_nodelay: channel.tcp_nodelay,
                tcp_keepalive: channel.tcp_keepalive_secs.map(Duration::from_secs),
                keep_alive_interval: channel.keep_alive_interval_secs.map(Duration::from_secs),
                keep_alive_timeout: channel.keep_alive_timeout_secs.map(Duration::from_secs),
                keep_alive_while_idle: channel.keep_alive_while_idle,
                concurrency_limit: channel.concurrency_limit,
                max_decoding_message_size: channel.max_decoding_message_size,
                max_encoding_message_size: channel.max_encoding_message_size,
                user_agent: channel.user_agent,
            },
        }
    }
}
