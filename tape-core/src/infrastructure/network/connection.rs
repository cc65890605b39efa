use crate::foundation::{
    NodeName, NodeRole, Result, TapeError, DEFAULT_CLIENT_KEEPALIVE_INTERVAL_SECS, DEFAULT_CLIENT_KEEPALIVE_TIMEOUT_SECS,
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MAX_MESSAGE_SIZE_BYTES, DEFAULT_SERVER_KEEPALIVE_INTERVAL_SECS,
    DEFAULT_SERVER_KEEPALIVE_TIMEOUT_SECS, DEFAULT_SERVER_MIN_CLIENT_INTERVAL_SECS,
};
use crate::infrastructure::config::{ConnectionSettings, NodeConfig, TlsConfig};
use std::path::Path;
use std::time::Duration;

/// TLS material for one connection, already read from disk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecureOptions {
    pub use_tls: bool,
    /// PEM-encoded roots used to verify the server.
    pub server_root_cas: Vec<Vec<u8>>,
    /// PEM-encoded client certificate and key for mutual TLS.
    pub certificate: Option<Vec<u8>>,
    pub key: Option<Vec<u8>>,
    pub require_client_cert: bool,
    pub server_name_override: Option<String>,
    pub cipher_suites: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeepaliveOptions {
    pub client_interval: Duration,
    pub client_timeout: Duration,
    pub server_interval: Duration,
    pub server_timeout: Duration,
    /// Minimum ping interval a server tolerates from clients.
    pub server_min_interval: Duration,
}

impl Default for KeepaliveOptions {
    fn default() -> Self {
        Self {
            client_interval: Duration::from_secs(DEFAULT_CLIENT_KEEPALIVE_INTERVAL_SECS),
            client_timeout: Duration::from_secs(DEFAULT_CLIENT_KEEPALIVE_TIMEOUT_SECS),
            server_interval: Duration::from_secs(DEFAULT_SERVER_KEEPALIVE_INTERVAL_SECS),
            server_timeout: Duration::from_secs(DEFAULT_SERVER_KEEPALIVE_TIMEOUT_SECS),
            server_min_interval: Duration::from_secs(DEFAULT_SERVER_MIN_CLIENT_INTERVAL_SECS),
        }
    }
}

/// Ready-made per-connection configuration handed to a `Connector`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub secure: SecureOptions,
    pub keepalive: KeepaliveOptions,
    pub connect_timeout: Duration,
    pub max_send_message_bytes: usize,
    pub max_recv_message_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            secure: SecureOptions::default(),
            keepalive: KeepaliveOptions::default(),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            max_send_message_bytes: DEFAULT_MAX_MESSAGE_SIZE_BYTES,
            max_recv_message_bytes: DEFAULT_MAX_MESSAGE_SIZE_BYTES,
        }
    }
}

impl ConnectionConfig {
    /// Builds the connection config for one node, reading any PEM files it references.
    pub fn from_settings(settings: &ConnectionSettings, tls: Option<&TlsConfig>) -> Result<Self> {
        let secure = match tls.filter(|tls| tls.enabled) {
            Some(tls) => SecureOptions {
                use_tls: true,
                server_root_cas: tls.ca_certs.iter().map(|path| read_pem(path)).collect::<Result<Vec<_>>>()?,
                certificate: tls.client_cert.as_deref().map(read_pem).transpose()?,
                key: tls.client_key.as_deref().map(read_pem).transpose()?,
                require_client_cert: tls.require_client_cert,
                server_name_override: tls.server_name_override.clone(),
                cipher_suites: tls.cipher_suites.clone(),
            },
            None => SecureOptions::default(),
        };
        let config = Self {
            secure,
            keepalive: KeepaliveOptions {
                client_interval: Duration::from_secs(settings.client_keepalive_interval_secs),
                client_timeout: Duration::from_secs(settings.client_keepalive_timeout_secs),
                server_interval: Duration::from_secs(settings.server_keepalive_interval_secs),
                server_timeout: Duration::from_secs(settings.server_keepalive_timeout_secs),
                server_min_interval: Duration::from_secs(settings.server_min_client_interval_secs),
            },
            connect_timeout: Duration::from_millis(settings.connect_timeout_ms),
            max_send_message_bytes: settings.max_send_message_bytes,
            max_recv_message_bytes: settings.max_recv_message_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.secure.use_tls && self.secure.server_root_cas.is_empty() {
            return Err(TapeError::ConfigError("tls enabled without trusted root certificates".to_string()));
        }
        if self.secure.require_client_cert && (self.secure.certificate.is_none() || self.secure.key.is_none()) {
            return Err(TapeError::ConfigError("client certificate required but certificate/key pair missing".to_string()));
        }
        let keepalive = &self.keepalive;
        if keepalive.client_interval.is_zero() || keepalive.server_interval.is_zero() {
            return Err(TapeError::ConfigError("keepalive intervals must be > 0".to_string()));
        }
        if keepalive.client_interval < keepalive.server_min_interval {
            return Err(TapeError::ConfigError(format!(
                "client keepalive interval {:?} is below the server minimum {:?}",
                keepalive.client_interval, keepalive.server_min_interval
            )));
        }
        if self.connect_timeout.is_zero() {
            return Err(TapeError::ConfigError("connect timeout must be > 0".to_string()));
        }
        Ok(())
    }
}

fn read_pem(path: &str) -> Result<Vec<u8>> {
    let bytes = std::fs::read(Path::new(path)).map_err(|err| crate::io_err!(format!("read pem {path}"), err))?;
    if !bytes.starts_with(b"-----BEGIN") {
        return Err(TapeError::ConfigError(format!("{path} is not PEM encoded")));
    }
    Ok(bytes)
}

/// A remote node the pipeline talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub name: NodeName,
    pub addr: String,
    pub role: NodeRole,
    pub connection: ConnectionConfig,
}

impl Node {
    pub fn new(name: impl Into<NodeName>, addr: impl Into<String>, role: NodeRole) -> Self {
        Self { name: name.into(), addr: addr.into(), role, connection: ConnectionConfig::default() }
    }

    pub fn from_config(config: &NodeConfig, role: NodeRole, settings: &ConnectionSettings) -> Result<Self> {
        let connection = ConnectionConfig::from_settings(settings, config.tls.as_ref())
            .map_err(|err| TapeError::ConfigError(format!("{role} {}: {err}", config.name)))?;
        Ok(Self { name: NodeName::new(config.name.trim()), addr: config.addr.trim().to_string(), role, connection })
    }
}
