use crate::domain::{EndorsementResult, FilteredBlock};
use crate::foundation::{NodeName, TapeError, TxId};
use log::{debug, trace, warn};
use std::sync::Arc;

/// Hooks fired by the pipeline stages. Implementations must be cheap; they run inline on the
/// worker that produced the event.
pub trait PipelineObserver: Send + Sync {
    fn on_request_emitted(&self, _seq: u64, _tx_id: &TxId) {}
    fn on_proposal_signed(&self, _tx_id: &TxId, _endorser: &NodeName) {}
    fn on_endorsement_received(&self, _result: &EndorsementResult) {}
    fn on_envelope_built(&self, _tx_id: &TxId) {}
    fn on_envelope_broadcast(&self, _tx_id: &TxId, _orderer: &NodeName) {}
    fn on_block_observed(&self, _committer: &NodeName, _block: &FilteredBlock) {}
    fn on_transaction_committed(&self, _tx_id: &TxId, _committed: usize) {}
    fn on_transaction_dropped(&self, _reason: &TapeError) {}
    fn on_observer_isolated(&self, _committer: &NodeName, _reason: &TapeError) {}
}

pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn PipelineObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Default for CompositeObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_request_emitted(&self, seq: u64, tx_id: &TxId) {
        for observer in &self.observers {
            observer.on_request_emitted(seq, tx_id);
        }
    }

    fn on_proposal_signed(&self, tx_id: &TxId, endorser: &NodeName) {
        for observer in &self.observers {
            observer.on_proposal_signed(tx_id, endorser);
        }
    }

    fn on_endorsement_received(&self, result: &EndorsementResult) {
        for observer in &self.observers {
            observer.on_endorsement_received(result);
        }
    }

    fn on_envelope_built(&self, tx_id: &TxId) {
        for observer in &self.observers {
            observer.on_envelope_built(tx_id);
        }
    }

    fn on_envelope_broadcast(&self, tx_id: &TxId, orderer: &NodeName) {
        for observer in &self.observers {
            observer.on_envelope_broadcast(tx_id, orderer);
        }
    }

    fn on_block_observed(&self, committer: &NodeName, block: &FilteredBlock) {
        trace!(
            "on_block_observed dispatch observer_count={} committer={} block={}",
            self.observers.len(),
            committer,
            block.number
        );
        for observer in &self.observers {
            observer.on_block_observed(committer, block);
        }
    }

    fn on_transaction_committed(&self, tx_id: &TxId, committed: usize) {
        for observer in &self.observers {
            observer.on_transaction_committed(tx_id, committed);
        }
    }

    fn on_transaction_dropped(&self, reason: &TapeError) {
        debug!("transaction dropped reason={}", reason);
        for observer in &self.observers {
            observer.on_transaction_dropped(reason);
        }
    }

    fn on_observer_isolated(&self, committer: &NodeName, reason: &TapeError) {
        warn!("observer isolated committer={} reason={}", committer, reason);
        for observer in &self.observers {
            observer.on_observer_isolated(committer, reason);
        }
    }
}
