use crate::application::context::StageContext;
use crate::application::observer::Isolation;
use crate::domain::{AddressedBlock, CollectorState, CommitTally, CommitThreshold, TallyOutcome};
use crate::foundation::{NodeName, Result, TapeError};
use log::{debug, info, trace};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Successful end of a run, as seen by the collector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Completion {
    pub committed: usize,
    pub elapsed: Duration,
    /// Committed transactions whose validation code was not `Valid`.
    pub invalid: usize,
}

/// Aggregates addressed blocks across committers. The only place completion is decided.
pub struct BlockCollector {
    tally: CommitTally,
    threshold: CommitThreshold,
    target: usize,
    state: CollectorState,
    start: Instant,
    invalid: usize,
    lost: HashSet<NodeName>,
}

impl BlockCollector {
    pub fn new(threshold: CommitThreshold, target: usize, start: Instant) -> Self {
        Self {
            tally: CommitTally::new(threshold),
            threshold,
            target,
            state: CollectorState::Running,
            start,
            invalid: 0,
            lost: HashSet::new(),
        }
    }

    pub fn committed(&self) -> usize {
        self.tally.committed()
    }

    /// Absorbs one block; returns the completion once the target is reached.
    pub fn absorb(&mut self, block: &AddressedBlock, ctx: &StageContext) -> Result<Option<Completion>> {
        if self.state.is_terminal() {
            return Ok(None);
        }
        for tx in &block.block.transactions {
            match self.tally.record(tx.tx_id, &block.committer) {
                TallyOutcome::Committed => {
                    if !tx.validation.is_valid() {
                        self.invalid += 1;
                    }
                    let committed = self.tally.committed();
                    ctx.observer.on_transaction_committed(&tx.tx_id, committed);
                    if committed >= self.target {
                        return self.complete().map(Some);
                    }
                }
                outcome => trace!("tx {} from {}: {:?}", tx.tx_id, block.committer, outcome),
            }
        }
        Ok(None)
    }

    fn complete(&mut self) -> Result<Completion> {
        self.state.transition(CollectorState::Completed)?;
        let completion = Completion { committed: self.tally.committed(), elapsed: self.start.elapsed(), invalid: self.invalid };
        info!("collector completed committed={} elapsed={:?}", completion.committed, completion.elapsed);
        Ok(completion)
    }

    pub fn live_committers(&self) -> usize {
        self.threshold.committers().saturating_sub(self.lost.len())
    }

    /// Records an ended committer stream. Fails once the remaining streams can no longer bring
    /// the committed count to the target.
    pub fn lose_committer(&mut self, committer: &NodeName) -> Result<()> {
        if self.state.is_terminal() || !self.lost.insert(committer.clone()) {
            return Ok(());
        }
        let live = self.live_committers();
        match self.tally.reachable(live, &self.lost) {
            Some(reachable) if reachable < self.target => {
                self.abort("not enough committer streams")?;
                Err(TapeError::InsufficientCommitters {
                    live,
                    required: self.threshold.required(),
                    committed: self.tally.committed(),
                    target: self.target,
                })
            }
            _ => {
                debug!("collector lost committer {} live={} committed={}", committer, live, self.tally.committed());
                Ok(())
            }
        }
    }

    pub fn abort(&mut self, reason: &str) -> Result<()> {
        debug!(
            "collector aborted committed={} below_threshold={} reason={}",
            self.tally.committed(),
            self.tally.below_threshold(),
            reason
        );
        self.state.transition(CollectorState::Aborted)
    }
}

/// Runs the collector until the target is reached, the run is cancelled, or the remaining
/// observer streams can no longer reach the target.
pub async fn run_collector(
    mut collector: BlockCollector,
    mut input: mpsc::Receiver<AddressedBlock>,
    mut isolations: mpsc::Receiver<Isolation>,
    ctx: StageContext,
) -> Result<Completion> {
    if collector.target == 0 {
        return collector.complete();
    }
    loop {
        let block = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                collector.abort("cancelled")?;
                return Err(TapeError::Cancelled);
            }
            Some(isolation) = isolations.recv() => {
                debug!("collector notified: committer {} isolated", isolation.committer);
                ctx.observer.on_observer_isolated(&isolation.committer, &isolation.reason);
                // Blocks the isolated stream forwarded before failing are already queued.
                while let Ok(block) = input.try_recv() {
                    if let Some(completion) = collector.absorb(&block, &ctx)? {
                        return Ok(completion);
                    }
                }
                collector.lose_committer(&isolation.committer)?;
                continue;
            }
            block = input.recv() => block,
        };
        let Some(block) = block else {
            collector.abort("observer streams ended")?;
            return Err(TapeError::ObserversExhausted { committed: collector.committed(), target: collector.target });
        };
        if let Some(completion) = collector.absorb(&block, &ctx)? {
            return Ok(completion);
        }
    }
}
