use crate::domain::{DeliverResponse, Envelope, ProposalResponse, SeekRequest, SignedProposal};
use crate::foundation::Result;
use crate::infrastructure::network::connection::Node;
use async_trait::async_trait;

/// Unary proposal endpoint of one endorser.
///
/// `Err` means the transport failed; an endorser refusing the proposal is an `Ok` response with a
/// non-success status.
#[async_trait]
pub trait EndorserClient: Send {
    async fn process_proposal(&mut self, proposal: &SignedProposal) -> Result<ProposalResponse>;
}

/// Streaming broadcast endpoint of one orderer. `Ok` means the orderer accepted the envelope.
#[async_trait]
pub trait BroadcastClient: Send {
    async fn send(&mut self, envelope: Envelope) -> Result<()>;
}

/// Filtered block delivery stream of one committer.
#[async_trait]
pub trait DeliverClient: Send {
    async fn send_seek(&mut self, request: SeekRequest) -> Result<()>;

    /// Next message on the stream. `Ok(None)` is a message that arrived without a payload.
    async fn recv(&mut self) -> Result<Option<DeliverResponse>>;
}

/// Opens clients for nodes. Wire adapters for a concrete ledger plug in here.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn endorser(&self, node: &Node) -> Result<Box<dyn EndorserClient>>;
    async fn broadcaster(&self, node: &Node) -> Result<Box<dyn BroadcastClient>>;
    async fn deliverer(&self, node: &Node) -> Result<Box<dyn DeliverClient>>;
}
