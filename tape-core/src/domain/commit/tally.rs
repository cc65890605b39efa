use crate::domain::commit::threshold::CommitThreshold;
use crate::foundation::{NodeName, TxId};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TallyOutcome {
    /// New reporter recorded, threshold not reached yet. Carries the distinct reporter count.
    Pending(usize),
    /// This report made the transaction reach the threshold.
    Committed,
    /// The transaction was counted before; the report is observed but not counted.
    AlreadyCounted,
    /// The same committer reported the same transaction again.
    Duplicate,
}

/// Distinct-reporter tally across committers. Owned by the block collector.
#[derive(Debug)]
pub struct CommitTally {
    threshold: CommitThreshold,
    reporters: HashMap<TxId, HashSet<NodeName>>,
    counted: HashSet<TxId>,
}

impl CommitTally {
    pub fn new(threshold: CommitThreshold) -> Self {
        Self { threshold, reporters: HashMap::new(), counted: HashSet::new() }
    }

    pub fn record(&mut self, tx_id: TxId, committer: &NodeName) -> TallyOutcome {
        if self.counted.contains(&tx_id) {
            return TallyOutcome::AlreadyCounted;
        }
        let seen = self.reporters.entry(tx_id).or_default();
        if !seen.insert(committer.clone()) {
            return TallyOutcome::Duplicate;
        }
        let distinct = seen.len();
        if distinct < self.threshold.required() {
            return TallyOutcome::Pending(distinct);
        }
        self.reporters.remove(&tx_id);
        self.counted.insert(tx_id);
        TallyOutcome::Committed
    }

    pub fn committed(&self) -> usize {
        self.counted.len()
    }

    /// Transactions seen by at least one committer but below the threshold.
    pub fn below_threshold(&self) -> usize {
        self.reporters.len()
    }

    /// Most transactions that can still end up committed when only `live` committers keep
    /// reporting and the streams of `lost` have ended. `None` when nothing limits the count.
    pub fn reachable(&self, live: usize, lost: &HashSet<NodeName>) -> Option<usize> {
        let required = self.threshold.required();
        if live >= required {
            return None;
        }
        // A live committer that already reported adds nothing; a lost one keeps its report.
        let completable = self.reporters.values().filter(|seen| live + seen.intersection(lost).count() >= required).count();
        Some(self.counted.len() + completable)
    }
}
