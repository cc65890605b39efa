#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tape_core::application::PipelineObserver;
use tape_core::domain::{EndorsementResult, FilteredBlock};
use tape_core::foundation::{NodeName, TxId};
use tape_core::TapeError;

/// Counts every lifecycle event it sees.
#[derive(Default)]
pub struct RecordingObserver {
    pub emitted: AtomicUsize,
    pub proposals: AtomicUsize,
    pub endorsements: AtomicUsize,
    pub envelopes: AtomicUsize,
    pub broadcasts: AtomicUsize,
    pub blocks: AtomicUsize,
    pub committed: AtomicUsize,
    pub dropped: AtomicUsize,
    pub isolated: Mutex<Vec<NodeName>>,
}

impl RecordingObserver {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn isolated(&self) -> Vec<NodeName> {
        self.isolated.lock().expect("isolated lock").clone()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_request_emitted(&self, _seq: u64, _tx_id: &TxId) {
        self.emitted.fetch_add(1, Ordering::SeqCst);
    }

    fn on_proposal_signed(&self, _tx_id: &TxId, _endorser: &NodeName) {
        self.proposals.fetch_add(1, Ordering::SeqCst);
    }

    fn on_endorsement_received(&self, _result: &EndorsementResult) {
        self.endorsements.fetch_add(1, Ordering::SeqCst);
    }

    fn on_envelope_built(&self, _tx_id: &TxId) {
        self.envelopes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_envelope_broadcast(&self, _tx_id: &TxId, _orderer: &NodeName) {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_block_observed(&self, _committer: &NodeName, _block: &FilteredBlock) {
        self.blocks.fetch_add(1, Ordering::SeqCst);
    }

    fn on_transaction_committed(&self, _tx_id: &TxId, _reporters: usize) {
        self.committed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_transaction_dropped(&self, _err: &TapeError) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }

    fn on_observer_isolated(&self, committer: &NodeName, _err: &TapeError) {
        self.isolated.lock().expect("isolated lock").push(committer.clone());
    }
}
