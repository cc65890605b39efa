use crate::domain::ObserverErrorPolicy;
use crate::foundation::{
    DEFAULT_ASSEMBLER_WORKERS, DEFAULT_CLIENT_KEEPALIVE_INTERVAL_SECS, DEFAULT_CLIENT_KEEPALIVE_TIMEOUT_SECS,
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_INTEGRATOR_WORKERS, DEFAULT_LOOPBACK_BATCH_TIMEOUT_MS, DEFAULT_LOOPBACK_BLOCK_SIZE,
    DEFAULT_MAX_MESSAGE_SIZE_BYTES, DEFAULT_SERVER_KEEPALIVE_INTERVAL_SECS, DEFAULT_SERVER_KEEPALIVE_TIMEOUT_SECS,
    DEFAULT_SERVER_MIN_CLIENT_INTERVAL_SECS, DEFAULT_STATUS_INTERVAL_SECS,
};
use serde::{Deserialize, Serialize};

const DEFAULT_NUMBER: usize = 1000;
const DEFAULT_BURST: usize = 1000;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub loopback: LoopbackConfig,
}

/// Load parameters for one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of transactions to drive through the pipeline.
    pub number: usize,
    /// Bucket size of the rate limiter and capacity of every pipeline channel.
    pub burst: usize,
    /// Transactions per second; 0 means unlimited.
    pub rate: f64,
    /// Distinct committers that must report a transaction before it counts.
    pub commit_threshold: usize,
    pub assembler_workers: usize,
    pub integrator_workers: usize,
    pub observer_error_policy: ObserverErrorPolicy,
    pub status_interval_seconds: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            number: DEFAULT_NUMBER,
            burst: DEFAULT_BURST,
            rate: 0.0,
            commit_threshold: 1,
            assembler_workers: DEFAULT_ASSEMBLER_WORKERS,
            integrator_workers: DEFAULT_INTEGRATOR_WORKERS,
            observer_error_policy: ObserverErrorPolicy::Abort,
            status_interval_seconds: DEFAULT_STATUS_INTERVAL_SECS,
        }
    }
}

/// Target network topology and the chaincode invocation to drive.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub chaincode: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub endorsers: Vec<NodeConfig>,
    #[serde(default)]
    pub committers: Vec<NodeConfig>,
    #[serde(default)]
    pub orderers: Vec<NodeConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub addr: String,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

/// Per-node TLS material. Paths point at PEM files.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub ca_certs: Vec<String>,
    #[serde(default)]
    pub client_cert: Option<String>,
    #[serde(default)]
    pub client_key: Option<String>,
    #[serde(default)]
    pub require_client_cert: bool,
    #[serde(default)]
    pub server_name_override: Option<String>,
    #[serde(default)]
    pub cipher_suites: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub connect_timeout_ms: u64,
    pub max_send_message_bytes: usize,
    pub max_recv_message_bytes: usize,
    pub client_keepalive_interval_secs: u64,
    pub client_keepalive_timeout_secs: u64,
    pub server_keepalive_interval_secs: u64,
    pub server_keepalive_timeout_secs: u64,
    pub server_min_client_interval_secs: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            max_send_message_bytes: DEFAULT_MAX_MESSAGE_SIZE_BYTES,
            max_recv_message_bytes: DEFAULT_MAX_MESSAGE_SIZE_BYTES,
            client_keepalive_interval_secs: DEFAULT_CLIENT_KEEPALIVE_INTERVAL_SECS,
            client_keepalive_timeout_secs: DEFAULT_CLIENT_KEEPALIVE_TIMEOUT_SECS,
            server_keepalive_interval_secs: DEFAULT_SERVER_KEEPALIVE_INTERVAL_SECS,
            server_keepalive_timeout_secs: DEFAULT_SERVER_KEEPALIVE_TIMEOUT_SECS,
            server_min_client_interval_secs: DEFAULT_SERVER_MIN_CLIENT_INTERVAL_SECS,
        }
    }
}

/// Client identity used to sign proposals, envelopes and seek requests.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub msp_id: String,
    /// Hex-encoded 32-byte ed25519 seed.
    #[serde(default)]
    pub signer_seed_hex: String,
}

/// Parameters of the in-process network.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopbackConfig {
    pub block_size: usize,
    pub batch_timeout_ms: u64,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self { block_size: DEFAULT_LOOPBACK_BLOCK_SIZE, batch_timeout_ms: DEFAULT_LOOPBACK_BATCH_TIMEOUT_MS }
    }
}
