use crate::domain::transaction::{Endorsement, EndorsementOutcome, EndorsementResult};
use crate::foundation::{NodeName, TxId, FINISHED_TX_WINDOW};
use std::collections::{HashMap, HashSet, VecDeque};

/// What the integrator should do after absorbing one endorsement result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntegrationOutcome {
    /// More responses are needed.
    Waiting,
    /// Every required endorser answered positively. Endorsements are ordered like the required set.
    Complete { seq: u64, tx_id: TxId, endorsements: Vec<(NodeName, Endorsement)> },
    /// First rejection for this transaction; no envelope will be produced.
    Abandoned { seq: u64, tx_id: TxId, endorser: NodeName, reason: String },
    /// Unknown endorser, duplicate, or a late answer for a finished transaction.
    Ignored,
}

#[derive(Debug, Default)]
struct PendingEnvelope {
    seq: u64,
    responded: HashSet<NodeName>,
    endorsements: HashMap<NodeName, Endorsement>,
    abandoned: bool,
}

/// Per-shard partial endorsement sets, keyed by transaction.
///
/// Owned by exactly one integrator worker. Entries are discarded as soon as the transaction is
/// complete, or once every endorser has answered an abandoned transaction. Only the most recent
/// `window` finished ids are remembered to ignore repeated results.
#[derive(Debug)]
pub struct PendingEndorsements {
    required: Vec<NodeName>,
    entries: HashMap<TxId, PendingEnvelope>,
    finished: HashSet<TxId>,
    finished_order: VecDeque<TxId>,
    window: usize,
}

impl PendingEndorsements {
    pub fn new(required: Vec<NodeName>) -> Self {
        Self::with_window(required, FINISHED_TX_WINDOW)
    }

    pub fn with_window(required: Vec<NodeName>, window: usize) -> Self {
        Self { required, entries: HashMap::new(), finished: HashSet::new(), finished_order: VecDeque::new(), window }
    }

    pub fn in_flight(&self) -> usize {
        self.entries.len()
    }

    pub fn accept(&mut self, result: EndorsementResult) -> IntegrationOutcome {
        if !self.required.contains(&result.endorser) || self.finished.contains(&result.tx_id) {
            return IntegrationOutcome::Ignored;
        }

        let required_count = self.required.len();
        let entry = self.entries.entry(result.tx_id).or_insert_with(|| PendingEnvelope { seq: result.seq, ..Default::default() });
        if !entry.responded.insert(result.endorser.clone()) {
            return IntegrationOutcome::Ignored;
        }
        let all_responded = entry.responded.len() == required_count;

        if entry.abandoned {
            if all_responded {
                self.finish(&result.tx_id);
            }
            return IntegrationOutcome::Ignored;
        }

        match result.outcome {
            EndorsementOutcome::Rejected { reason } => {
                entry.abandoned = true;
                entry.endorsements.clear();
                let seq = entry.seq;
                if all_responded {
                    self.finish(&result.tx_id);
                }
                IntegrationOutcome::Abandoned { seq, tx_id: result.tx_id, endorser: result.endorser, reason }
            }
            EndorsementOutcome::Endorsed(endorsement) => {
                entry.endorsements.insert(result.endorser, endorsement);
                if entry.endorsements.len() < required_count {
                    return IntegrationOutcome::Waiting;
                }
                let seq = entry.seq;
                let mut collected = match self.finish(&result.tx_id) {
                    Some(done) => done.endorsements,
                    None => return IntegrationOutcome::Waiting,
                };
                let endorsements = self
                    .required
                    .iter()
                    .filter_map(|name| collected.remove(name).map(|e| (name.clone(), e)))
                    .collect();
                IntegrationOutcome::Complete { seq, tx_id: result.tx_id, endorsements }
            }
        }
    }

    fn finish(&mut self, tx_id: &TxId) -> Option<PendingEnvelope> {
        if self.window > 0 && self.finished.insert(*tx_id) {
            self.finished_order.push_back(*tx_id);
            if self.finished_order.len() > self.window {
                if let Some(oldest) = self.finished_order.pop_front() {
                    self.finished.remove(&oldest);
                }
            }
        }
        self.entries.remove(tx_id)
    }
}
