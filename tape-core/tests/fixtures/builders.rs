#![allow(dead_code)]

use crate::fixtures::{TEST_BATCH_TIMEOUT, TEST_BLOCK_SIZE, TEST_CHAINCODE, TEST_CHANNEL, TEST_MSP_ID, TEST_SIGNER_SEED};
use std::sync::Arc;
use tape_core::application::{Pipeline, PipelineConfig, Topology};
use tape_core::foundation::{ChaincodeId, ChannelId, NodeRole};
use tape_core::infrastructure::crypto::{DefaultTransactionBuilder, Ed25519Signer};
use tape_core::infrastructure::network::{MemoryNetwork, Node};

pub fn test_signer() -> Arc<Ed25519Signer> {
    Arc::new(Ed25519Signer::from_seed(TEST_MSP_ID, TEST_SIGNER_SEED).expect("test signer"))
}

pub fn test_builder() -> Arc<DefaultTransactionBuilder> {
    let args = vec!["CreateAsset".to_string(), "asset1".to_string()];
    Arc::new(
        DefaultTransactionBuilder::new(test_signer(), ChannelId::from(TEST_CHANNEL), ChaincodeId::from(TEST_CHAINCODE), &args)
            .expect("test builder"),
    )
}

/// Must be called inside a tokio runtime so the batch timer runs.
pub fn loopback_network() -> MemoryNetwork {
    MemoryNetwork::new(ChannelId::from(TEST_CHANNEL), TEST_BLOCK_SIZE, TEST_BATCH_TIMEOUT)
}

pub struct TopologyBuilder {
    endorsers: usize,
    committers: usize,
    orderers: usize,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self { endorsers: 1, committers: 1, orderers: 1 }
    }
}

impl TopologyBuilder {
    pub fn endorsers(mut self, count: usize) -> Self {
        self.endorsers = count;
        self
    }

    pub fn committers(mut self, count: usize) -> Self {
        self.committers = count;
        self
    }

    pub fn orderers(mut self, count: usize) -> Self {
        self.orderers = count;
        self
    }

    /// Endorsers and committers are named `peer{i}`, orderers `orderer{i}`.
    pub fn build(self) -> Topology {
        let nodes = |count: usize, prefix: &str, port: usize, role: NodeRole| -> Vec<Node> {
            (0..count).map(|i| Node::new(format!("{prefix}{i}"), format!("loopback:{}", port + i), role)).collect()
        };
        Topology {
            endorsers: nodes(self.endorsers, "peer", 7051, NodeRole::Endorser),
            committers: nodes(self.committers, "peer", 7051, NodeRole::Committer),
            orderers: nodes(self.orderers, "orderer", 7050, NodeRole::Orderer),
        }
    }
}

pub fn run_config(number: usize, burst: usize) -> PipelineConfig {
    PipelineConfig { number, burst, ..Default::default() }
}

pub fn loopback_pipeline(network: &MemoryNetwork, topology: Topology, config: PipelineConfig) -> Pipeline {
    Pipeline::new(config, topology, Arc::new(network.clone()), test_builder())
}
