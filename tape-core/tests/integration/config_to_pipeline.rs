use crate::fixtures::{test_builder, RUN_TIMEOUT, TEST_SIGNER_SEED_HEX};
use std::sync::Arc;
use std::time::Duration;
use tape_core::application::{Pipeline, PipelineConfig, Topology};
use tape_core::domain::ObserverErrorPolicy;
use tape_core::foundation::{ChannelId, NodeRole};
use tape_core::infrastructure::config::{load_and_validate, AppConfig};
use tape_core::infrastructure::network::MemoryNetwork;
use tape_core::TapeError;
use tempfile::tempdir;

fn write_config(body: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    std::fs::write(&path, body).expect("write config");
    (dir, path)
}

fn sample_config() -> String {
    format!(
        r#"
[run]
number = 12
burst = 4
rate = 0.0
commit_threshold = 2
observer_error_policy = "isolate"

[network]
channel = "mychannel"
chaincode = "basic"
args = ["CreateAsset", "asset1"]
endorsers = [
  {{ name = "peer0.org1", addr = "peer0.org1.example.com:7051" }},
  {{ name = "peer0.org2", addr = "peer0.org2.example.com:9051" }},
]
committers = [
  {{ name = "peer0.org1", addr = "peer0.org1.example.com:7051" }},
  {{ name = "peer0.org2", addr = "peer0.org2.example.com:9051" }},
]
orderers = [{{ name = "orderer0", addr = "orderer.example.com:7050" }}]

[identity]
msp_id = "Org1MSP"
signer_seed_hex = "{TEST_SIGNER_SEED_HEX}"

[loopback]
block_size = 3
batch_timeout_ms = 10
"#
    )
}

#[test]
fn file_config_maps_onto_pipeline_inputs() {
    let (_dir, path) = write_config(&sample_config());
    let config: AppConfig = load_and_validate(&path).expect("config");

    let pipeline_config = PipelineConfig::from_run_config(&config.run);
    assert_eq!(pipeline_config.number, 12);
    assert_eq!(pipeline_config.burst, 4);
    assert_eq!(pipeline_config.commit_threshold, 2);
    assert_eq!(pipeline_config.observer_error_policy, ObserverErrorPolicy::Isolate);
    assert_eq!(pipeline_config.target(), 12);

    let topology = Topology::from_config(&config.network, &config.connection).expect("topology");
    assert_eq!(topology.endorsers.len(), 2);
    assert_eq!(topology.committers[1].role, NodeRole::Committer);
    assert_eq!(topology.orderers[0].addr, "orderer.example.com:7050");
    assert_eq!(topology.orderers[0].connection.max_send_message_bytes, 100 * 1024 * 1024);
}

#[test]
fn invalid_file_reports_every_problem() {
    let (_dir, path) = write_config(
        r#"
[run]
number = 0
commit_threshold = 3

[network]
channel = "mychannel"
chaincode = "basic"
"#,
    );
    match load_and_validate(&path) {
        Err(TapeError::ConfigError(message)) => {
            assert!(message.contains("run.number"), "{message}");
            assert!(message.contains("run.commit_threshold"), "{message}");
            assert!(message.contains("network.endorsers"), "{message}");
            assert!(message.contains("identity.signer_seed_hex"), "{message}");
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[tokio::test]
async fn loaded_config_drives_a_loopback_run() {
    let (_dir, path) = write_config(&sample_config());
    let config = load_and_validate(&path).expect("config");
    let network = MemoryNetwork::new(
        ChannelId::from(config.network.channel.as_str()),
        config.loopback.block_size,
        Duration::from_millis(config.loopback.batch_timeout_ms),
    );
    let topology = Topology::from_config(&config.network, &config.connection).expect("topology");
    let pipeline = Pipeline::new(PipelineConfig::from_run_config(&config.run), topology, Arc::new(network.clone()), test_builder());

    let report = tokio::time::timeout(RUN_TIMEOUT, pipeline.run()).await.expect("in time").expect("run");
    assert_eq!(report.transactions, 12);
    assert_eq!(network.envelopes_accepted(), 12);
}
