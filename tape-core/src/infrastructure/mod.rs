//! Infrastructure layer: I/O and external integrations.

pub mod config;
pub mod crypto;
pub mod logging;
pub mod network;
