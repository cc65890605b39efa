#![allow(dead_code)]

use std::path::PathBuf;
use tape_core::infrastructure::config::{load_and_validate, AppConfig};
use tempfile::TempDir;

pub const TEST_SEED_HEX: &str = "1111111111111111111111111111111111111111111111111111111111111111";

/// A loopback network config with `endorsers` peers endorsing and committing, one orderer.
pub fn loopback_config_toml(number: usize, burst: usize, rate: f64, endorsers: usize) -> String {
    let peers: Vec<String> =
        (0..endorsers).map(|i| format!("{{ name = \"peer{i}.org1\", addr = \"peer{i}.org1.example.com:7051\" }}")).collect();
    let peers = peers.join(", ");
    format!(
        r#"
[run]
number = {number}
burst = {burst}
rate = {rate:?}
commit_threshold = 1
status_interval_seconds = 1

[network]
channel = "mychannel"
chaincode = "basic"
args = ["CreateAsset"]
endorsers = [{peers}]
committers = [{peers}]
orderers = [{{ name = "orderer0", addr = "orderer.example.com:7050" }}]

[identity]
msp_id = "Org1MSP"
signer_seed_hex = "{TEST_SEED_HEX}"

[loopback]
block_size = 4
batch_timeout_ms = 10
"#
    )
}

pub struct ConfigFile {
    _dir: TempDir,
    pub path: PathBuf,
}

pub fn write_config(body: &str) -> ConfigFile {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).expect("write config");
    ConfigFile { _dir: dir, path }
}

pub fn load_loopback_config(number: usize, burst: usize, rate: f64, endorsers: usize) -> AppConfig {
    let file = write_config(&loopback_config_toml(number, burst, rate, endorsers));
    load_and_validate(&file.path).expect("valid config")
}
