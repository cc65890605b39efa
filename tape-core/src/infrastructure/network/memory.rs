//! In-process loopback network.
//!
//! Endorsers sign a digest of the proposal, the orderer cuts blocks by size or batch timeout and
//! fans them out over a broadcast channel, and committers serve filtered-block subscriptions
//! starting at the newest block. Every node can be configured with faults for testing failure
//! paths of the pipeline.

use crate::domain::{
    DeliverResponse, Endorsement, Envelope, FilteredBlock, FilteredTransaction, ProposalResponse, SeekRequest, SignedProposal,
    ValidationCode,
};
use crate::foundation::{
    ChannelId, NodeName, Result, TapeError, LOOPBACK_BLOCK_FANOUT_CAPACITY, STATUS_BAD_REQUEST, STATUS_SERVICE_UNAVAILABLE,
    STATUS_SUCCESS,
};
use crate::infrastructure::crypto::{decode_proposal, decode_seek, decode_transaction, verify_signature, Ed25519Signer, Signer};
use crate::infrastructure::network::connection::Node;
use crate::infrastructure::network::traits::{BroadcastClient, Connector, DeliverClient, EndorserClient};
use async_trait::async_trait;
use log::{debug, info, trace, warn};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::broadcast;

const LOOPBACK_MSP_ID: &str = "LoopbackMSP";

#[derive(Clone, Debug, Default)]
pub struct EndorserFaults {
    /// Sequence numbers answered with a rejection.
    pub reject_seqs: HashSet<u64>,
    pub unreachable: bool,
    /// The connection breaks once this many proposals were answered.
    pub fail_after: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct OrdererFaults {
    pub unreachable: bool,
    /// Envelopes after the first `k` are refused.
    pub reject_after: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct CommitterFaults {
    pub unreachable: bool,
    /// The first `k` transactions this committer would report are left out of its blocks.
    pub hide_first: usize,
    /// Every block is delivered twice.
    pub duplicate_blocks: bool,
    /// The stream ends after `k` blocks.
    pub drop_after: Option<usize>,
    /// After `k` blocks a message without payload is delivered.
    pub empty_after: Option<usize>,
}

struct BlockCutter {
    pending: Vec<FilteredTransaction>,
    next_number: u64,
    newest: FilteredBlock,
}

struct Inner {
    channel: ChannelId,
    block_size: usize,
    blocks: broadcast::Sender<FilteredBlock>,
    cutter: Mutex<BlockCutter>,
    endorsers: Mutex<HashMap<NodeName, EndorserFaults>>,
    orderers: Mutex<HashMap<NodeName, OrdererFaults>>,
    committers: Mutex<HashMap<NodeName, CommitterFaults>>,
    accepted: Mutex<HashMap<NodeName, usize>>,
    envelopes: AtomicUsize,
}

impl Inner {
    fn lock<'a, T>(mutex: &'a Mutex<T>) -> std::sync::MutexGuard<'a, T> {
        mutex.lock().unwrap_or_else(|err| err.into_inner())
    }

    fn submit(&self, tx: FilteredTransaction) {
        let mut cutter = Self::lock(&self.cutter);
        cutter.pending.push(tx);
        if cutter.pending.len() >= self.block_size {
            self.cut(&mut cutter);
        }
    }

    fn cut_pending(&self) {
        let mut cutter = Self::lock(&self.cutter);
        if !cutter.pending.is_empty() {
            self.cut(&mut cutter);
        }
    }

    fn cut(&self, cutter: &mut BlockCutter) {
        let block = FilteredBlock {
            channel: self.channel.clone(),
            number: cutter.next_number,
            transactions: std::mem::take(&mut cutter.pending),
        };
        cutter.next_number += 1;
        cutter.newest = block.clone();
        trace!("loopback cut block number={} txs={}", block.number, block.transactions.len());
        // No subscribers is fine; the block is still the newest one.
        let _ = self.blocks.send(block);
    }

    /// Subscribes under the cutter lock so no block is missed between the newest one and the stream.
    fn subscribe(&self) -> (FilteredBlock, broadcast::Receiver<FilteredBlock>) {
        let cutter = Self::lock(&self.cutter);
        (cutter.newest.clone(), self.blocks.subscribe())
    }
}

/// Shared handle to one loopback network. Cheap to clone.
#[derive(Clone)]
pub struct MemoryNetwork {
    inner: Arc<Inner>,
}

impl MemoryNetwork {
    /// Creates the network and, when called inside a tokio runtime, its batch-timeout ticker.
    pub fn new(channel: ChannelId, block_size: usize, batch_timeout: Duration) -> Self {
        let (blocks, _) = broadcast::channel(LOOPBACK_BLOCK_FANOUT_CAPACITY);
        let genesis = FilteredBlock { channel: channel.clone(), number: 0, transactions: Vec::new() };
        let inner = Arc::new(Inner {
            channel,
            block_size: block_size.max(1),
            blocks,
            cutter: Mutex::new(BlockCutter { pending: Vec::new(), next_number: 1, newest: genesis }),
            endorsers: Mutex::new(HashMap::new()),
            orderers: Mutex::new(HashMap::new()),
            committers: Mutex::new(HashMap::new()),
            accepted: Mutex::new(HashMap::new()),
            envelopes: AtomicUsize::new(0),
        });
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(batch_timer(Arc::downgrade(&inner), batch_timeout));
        }
        info!("loopback network started channel={} block_size={} batch_timeout={:?}", inner.channel, inner.block_size, batch_timeout);
        Self { inner }
    }

    pub fn with_endorser_faults(self, name: impl Into<NodeName>, faults: EndorserFaults) -> Self {
        Inner::lock(&self.inner.endorsers).insert(name.into(), faults);
        self
    }

    pub fn with_orderer_faults(self, name: impl Into<NodeName>, faults: OrdererFaults) -> Self {
        Inner::lock(&self.inner.orderers).insert(name.into(), faults);
        self
    }

    pub fn with_committer_faults(self, name: impl Into<NodeName>, faults: CommitterFaults) -> Self {
        Inner::lock(&self.inner.committers).insert(name.into(), faults);
        self
    }

    /// Envelopes accepted by all orderers so far.
    pub fn envelopes_accepted(&self) -> usize {
        self.inner.envelopes.load(Ordering::Relaxed)
    }

    /// Cuts whatever is pending into a block right away.
    pub fn flush(&self) {
        self.inner.cut_pending();
    }

    fn endorser_faults(&self, name: &NodeName) -> EndorserFaults {
        Inner::lock(&self.inner.endorsers).get(name).cloned().unwrap_or_default()
    }

    fn orderer_faults(&self, name: &NodeName) -> OrdererFaults {
        Inner::lock(&self.inner.orderers).get(name).cloned().unwrap_or_default()
    }

    fn committer_faults(&self, name: &NodeName) -> CommitterFaults {
        Inner::lock(&self.inner.committers).get(name).cloned().unwrap_or_default()
    }
}

async fn batch_timer(inner: Weak<Inner>, batch_timeout: Duration) {
    let mut ticker = tokio::time::interval(batch_timeout.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            debug!("loopback network dropped; batch timer exiting");
            return;
        };
        inner.cut_pending();
    }
}

#[async_trait]
impl Connector for MemoryNetwork {
    async fn endorser(&self, node: &Node) -> Result<Box<dyn EndorserClient>> {
        let faults = self.endorser_faults(&node.name);
        if faults.unreachable {
            return Err(TapeError::connection_failed(node.name.as_str(), "connect", format!("{} unreachable", node.addr)));
        }
        let seed = *blake3::hash(format!("tape/loopback/endorser/{}", node.name).as_bytes()).as_bytes();
        let signer = Ed25519Signer::from_seed(LOOPBACK_MSP_ID, seed)?;
        Ok(Box::new(MemoryEndorser { name: node.name.clone(), signer, faults, answered: 0 }))
    }

    async fn broadcaster(&self, node: &Node) -> Result<Box<dyn BroadcastClient>> {
        let faults = self.orderer_faults(&node.name);
        if faults.unreachable {
            return Err(TapeError::connection_failed(node.name.as_str(), "connect", format!("{} unreachable", node.addr)));
        }
        Ok(Box::new(MemoryBroadcaster { name: node.name.clone(), network: self.clone(), faults }))
    }

    async fn deliverer(&self, node: &Node) -> Result<Box<dyn DeliverClient>> {
        let faults = self.committer_faults(&node.name);
        if faults.unreachable {
            return Err(TapeError::connection_failed(node.name.as_str(), "connect", format!("{} unreachable", node.addr)));
        }
        Ok(Box::new(MemoryDeliverer {
            name: node.name.clone(),
            network: self.clone(),
            hidden_remaining: faults.hide_first,
            faults,
            queue: VecDeque::new(),
            receiver: None,
            delivered: 0,
        }))
    }
}

struct MemoryEndorser {
    name: NodeName,
    signer: Ed25519Signer,
    faults: EndorserFaults,
    answered: usize,
}

#[async_trait]
impl EndorserClient for MemoryEndorser {
    async fn process_proposal(&mut self, proposal: &SignedProposal) -> Result<ProposalResponse> {
        if self.faults.fail_after.is_some_and(|limit| self.answered >= limit) {
            return Err(TapeError::connection_failed(self.name.as_str(), "process_proposal", "connection reset by peer"));
        }
        self.answered += 1;

        if self.faults.reject_seqs.contains(&proposal.seq) {
            return Ok(ProposalResponse::rejected(STATUS_BAD_REQUEST, format!("simulated chaincode failure for seq {}", proposal.seq)));
        }
        let payload = match decode_proposal(&proposal.proposal_bytes) {
            Ok(payload) => payload,
            Err(err) => return Ok(ProposalResponse::rejected(STATUS_BAD_REQUEST, format!("malformed proposal: {err}"))),
        };
        if payload.tx_id != proposal.tx_id {
            return Ok(ProposalResponse::rejected(STATUS_BAD_REQUEST, "tx id does not match proposal"));
        }
        if let Err(err) = verify_signature(&payload.creator, &proposal.proposal_bytes, &proposal.signature) {
            return Ok(ProposalResponse::rejected(STATUS_BAD_REQUEST, format!("bad proposal signature: {err}")));
        }

        let response_payload = blake3::hash(&proposal.proposal_bytes).as_bytes().to_vec();
        let signature = self.signer.sign(&response_payload)?;
        Ok(ProposalResponse::success(Endorsement {
            endorser_identity: self.signer.identity().to_vec(),
            payload: response_payload,
            signature,
        }))
    }
}

struct MemoryBroadcaster {
    name: NodeName,
    network: MemoryNetwork,
    faults: OrdererFaults,
}

#[async_trait]
impl BroadcastClient for MemoryBroadcaster {
    async fn send(&mut self, envelope: Envelope) -> Result<()> {
        let inner = &self.network.inner;
        let accepted = {
            let mut accepted = Inner::lock(&inner.accepted);
            let count = accepted.entry(self.name.clone()).or_insert(0);
            if self.faults.reject_after.is_some_and(|limit| *count >= limit) {
                return Err(TapeError::BroadcastFailed {
                    orderer: self.name.to_string(),
                    details: format!("status {STATUS_SERVICE_UNAVAILABLE}: orderer refusing envelopes"),
                });
            }
            *count += 1;
            *count
        };

        let transaction = decode_transaction(&envelope.payload).map_err(|err| TapeError::BroadcastFailed {
            orderer: self.name.to_string(),
            details: format!("status {STATUS_BAD_REQUEST}: {err}"),
        })?;
        if verify_signature(&transaction.creator, &envelope.payload, &envelope.signature).is_err() {
            warn!("loopback orderer {} got envelope with bad signature tx_id={}", self.name, envelope.tx_id);
            return Err(TapeError::BroadcastFailed {
                orderer: self.name.to_string(),
                details: format!("status {STATUS_BAD_REQUEST}: bad envelope signature"),
            });
        }

        inner.envelopes.fetch_add(1, Ordering::Relaxed);
        trace!("loopback orderer {} accepted tx_id={} total={} status={}", self.name, envelope.tx_id, accepted, STATUS_SUCCESS);
        inner.submit(FilteredTransaction { tx_id: transaction.tx_id, validation: ValidationCode::Valid });
        Ok(())
    }
}

struct MemoryDeliverer {
    name: NodeName,
    network: MemoryNetwork,
    faults: CommitterFaults,
    hidden_remaining: usize,
    queue: VecDeque<Option<DeliverResponse>>,
    receiver: Option<broadcast::Receiver<FilteredBlock>>,
    delivered: usize,
}

impl MemoryDeliverer {
    fn hide(&mut self, mut block: FilteredBlock) -> FilteredBlock {
        if self.hidden_remaining > 0 {
            let hidden = self.hidden_remaining.min(block.transactions.len());
            block.transactions.drain(..hidden);
            self.hidden_remaining -= hidden;
        }
        block
    }
}

#[async_trait]
impl DeliverClient for MemoryDeliverer {
    async fn send_seek(&mut self, request: SeekRequest) -> Result<()> {
        let seek = decode_seek(&request.payload).map_err(|err| TapeError::protocol_violation(self.name.as_str(), err.to_string()))?;
        if verify_signature(&seek.creator, &request.payload, &request.signature).is_err() {
            self.queue.push_back(Some(DeliverResponse::Status(STATUS_BAD_REQUEST)));
            return Ok(());
        }
        let (newest, receiver) = self.network.inner.subscribe();
        debug!("loopback committer {} subscribed from block {}", self.name, newest.number);
        self.queue.push_back(Some(DeliverResponse::FilteredBlock(newest)));
        self.receiver = Some(receiver);
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<DeliverResponse>> {
        if let Some(queued) = self.queue.pop_front() {
            return Ok(queued);
        }
        let Some(receiver) = self.receiver.as_mut() else {
            return Err(TapeError::StreamClosed { node: self.name.to_string() });
        };
        let block = match receiver.recv().await {
            Ok(block) => block,
            Err(broadcast::error::RecvError::Closed) => return Err(TapeError::StreamClosed { node: self.name.to_string() }),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                return Err(TapeError::connection_failed(self.name.as_str(), "deliver", format!("subscriber lagged by {skipped} blocks")));
            }
        };

        self.delivered += 1;
        if self.faults.drop_after.is_some_and(|limit| self.delivered > limit) {
            self.receiver = None;
            return Err(TapeError::StreamClosed { node: self.name.to_string() });
        }
        if self.faults.empty_after.is_some_and(|limit| self.delivered > limit) {
            return Ok(None);
        }
        let block = self.hide(block);
        if self.faults.duplicate_blocks {
            self.queue.push_back(Some(DeliverResponse::FilteredBlock(block.clone())));
        }
        Ok(Some(DeliverResponse::FilteredBlock(block)))
    }
}
