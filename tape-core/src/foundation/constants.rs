//! System-wide constants for tape.

/// Maximum gRPC message size for both send and receive (100 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE_BYTES: usize = 100 * 1024 * 1024;

/// Default connection timeout in milliseconds (3 seconds).
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;

/// Client keepalive ping interval (1 minute).
pub const DEFAULT_CLIENT_KEEPALIVE_INTERVAL_SECS: u64 = 60;

/// Client keepalive ack timeout (20 seconds).
pub const DEFAULT_CLIENT_KEEPALIVE_TIMEOUT_SECS: u64 = 20;

/// Server keepalive ping interval (2 hours).
pub const DEFAULT_SERVER_KEEPALIVE_INTERVAL_SECS: u64 = 2 * 60 * 60;

/// Server keepalive ack timeout (20 seconds).
pub const DEFAULT_SERVER_KEEPALIVE_TIMEOUT_SECS: u64 = 20;

/// Minimum client ping interval a server accepts (1 minute).
pub const DEFAULT_SERVER_MIN_CLIENT_INTERVAL_SECS: u64 = 60;

pub const DEFAULT_ASSEMBLER_WORKERS: usize = 5;
pub const DEFAULT_INTEGRATOR_WORKERS: usize = 5;

/// Finished transactions an integrator shard remembers so late duplicate results are ignored.
pub const FINISHED_TX_WINDOW: usize = 4096;

/// Endorsement response status codes, following HTTP conventions.
pub const STATUS_SUCCESS: u32 = 200;
pub const STATUS_BAD_REQUEST: u32 = 400;
pub const STATUS_SERVICE_UNAVAILABLE: u32 = 503;

/// Default interval between progress lines from the status reporter.
pub const DEFAULT_STATUS_INTERVAL_SECS: u64 = 5;

/// Loopback orderer defaults.
pub const DEFAULT_LOOPBACK_BLOCK_SIZE: usize = 10;
pub const DEFAULT_LOOPBACK_BATCH_TIMEOUT_MS: u64 = 50;
pub const LOOPBACK_BLOCK_FANOUT_CAPACITY: usize = 1024;

/// Blake3 hash size in bytes (32 bytes).
pub const HASH_SIZE: usize = 32;
