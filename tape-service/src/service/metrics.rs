use log::{debug, info};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tape_core::application::PipelineObserver;
use tape_core::domain::{EndorsementResult, FilteredBlock};
use tape_core::foundation::{NodeName, TxId};
use tape_core::{Result, TapeError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub requests_emitted: u64,
    pub endorsements_ok: u64,
    pub endorsements_rejected: u64,
    pub envelopes_broadcast: u64,
    pub blocks_observed: u64,
    pub transactions_committed: u64,
    pub transactions_dropped: u64,
    pub observers_isolated: u64,
}

/// Prometheus counters for one run, fed by the pipeline hooks.
pub struct Metrics {
    registry: Registry,
    stage_events_total: IntCounterVec,
    endorsements_total: IntCounterVec,
    blocks_observed_total: IntCounterVec,
    dropped_total: IntCounterVec,
    isolated_total: IntCounter,
    committed: IntGauge,
    started_at: Instant,
    requests_emitted: AtomicU64,
    endorsements_ok: AtomicU64,
    endorsements_rejected: AtomicU64,
    envelopes_broadcast: AtomicU64,
    blocks_observed: AtomicU64,
    transactions_committed: AtomicU64,
    transactions_dropped: AtomicU64,
    observers_isolated: AtomicU64,
}

fn metrics_err(err: prometheus::Error) -> TapeError {
    TapeError::Message(format!("metrics: {err}"))
}

impl Metrics {
    pub fn new() -> Result<Self> {
        debug!("initializing prometheus metrics");
        let registry = Registry::new();
        let stage_events_total =
            IntCounterVec::new(prometheus::Opts::new("tape_stage_events_total", "Pipeline events by stage"), &["stage"])
                .map_err(metrics_err)?;
        let endorsements_total =
            IntCounterVec::new(prometheus::Opts::new("tape_endorsements_total", "Endorsement results by endorser"), &["endorser", "ok"])
                .map_err(metrics_err)?;
        let blocks_observed_total =
            IntCounterVec::new(prometheus::Opts::new("tape_blocks_observed_total", "Filtered blocks per committer"), &["committer"])
                .map_err(metrics_err)?;
        let dropped_total =
            IntCounterVec::new(prometheus::Opts::new("tape_transactions_dropped_total", "Abandoned transactions by error code"), &["code"])
                .map_err(metrics_err)?;
        let isolated_total = IntCounter::new("tape_observers_isolated_total", "Committer streams stopped under isolation")
            .map_err(metrics_err)?;
        let committed = IntGauge::new("tape_transactions_committed", "Transactions counted as committed").map_err(metrics_err)?;

        registry.register(Box::new(stage_events_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(endorsements_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(blocks_observed_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(dropped_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(isolated_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(committed.clone())).map_err(metrics_err)?;

        debug!("prometheus metrics registered metric_count=6");
        Ok(Self {
            registry,
            stage_events_total,
            endorsements_total,
            blocks_observed_total,
            dropped_total,
            isolated_total,
            committed,
            started_at: Instant::now(),
            requests_emitted: AtomicU64::new(0),
            endorsements_ok: AtomicU64::new(0),
            endorsements_rejected: AtomicU64::new(0),
            envelopes_broadcast: AtomicU64::new(0),
            blocks_observed: AtomicU64::new(0),
            transactions_committed: AtomicU64::new(0),
            transactions_dropped: AtomicU64::new(0),
            observers_isolated: AtomicU64::new(0),
        })
    }

    fn inc_stage(&self, stage: &str) {
        self.stage_events_total.with_label_values(&[stage]).inc();
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.started_at.elapsed(),
            requests_emitted: self.requests_emitted.load(Ordering::Relaxed),
            endorsements_ok: self.endorsements_ok.load(Ordering::Relaxed),
            endorsements_rejected: self.endorsements_rejected.load(Ordering::Relaxed),
            envelopes_broadcast: self.envelopes_broadcast.load(Ordering::Relaxed),
            blocks_observed: self.blocks_observed.load(Ordering::Relaxed),
            transactions_committed: self.transactions_committed.load(Ordering::Relaxed),
            transactions_dropped: self.transactions_dropped.load(Ordering::Relaxed),
            observers_isolated: self.observers_isolated.load(Ordering::Relaxed),
        }
    }

    /// Prometheus text exposition of every registered metric.
    pub fn encode(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer).map_err(metrics_err)?;
        String::from_utf8(buffer).map_err(|err| TapeError::Message(err.to_string()))
    }
}

impl PipelineObserver for Metrics {
    fn on_request_emitted(&self, _seq: u64, _tx_id: &TxId) {
        self.inc_stage("request_emitted");
        self.requests_emitted.fetch_add(1, Ordering::Relaxed);
    }

    fn on_proposal_signed(&self, _tx_id: &TxId, _endorser: &NodeName) {
        self.inc_stage("proposal_signed");
    }

    fn on_endorsement_received(&self, result: &EndorsementResult) {
        let ok = result.is_endorsed();
        self.endorsements_total.with_label_values(&[result.endorser.as_str(), if ok { "true" } else { "false" }]).inc();
        if ok {
            self.endorsements_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.endorsements_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn on_envelope_built(&self, _tx_id: &TxId) {
        self.inc_stage("envelope_built");
    }

    fn on_envelope_broadcast(&self, _tx_id: &TxId, _orderer: &NodeName) {
        self.inc_stage("envelope_broadcast");
        self.envelopes_broadcast.fetch_add(1, Ordering::Relaxed);
    }

    fn on_block_observed(&self, committer: &NodeName, _block: &FilteredBlock) {
        self.blocks_observed_total.with_label_values(&[committer.as_str()]).inc();
        self.blocks_observed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_transaction_committed(&self, _tx_id: &TxId, committed: usize) {
        self.inc_stage("transaction_committed");
        self.committed.set(i64::try_from(committed).unwrap_or(i64::MAX));
        self.transactions_committed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_transaction_dropped(&self, reason: &TapeError) {
        let code = format!("{:?}", reason.code());
        self.dropped_total.with_label_values(&[code.as_str()]).inc();
        self.transactions_dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn on_observer_isolated(&self, _committer: &NodeName, _reason: &TapeError) {
        self.isolated_total.inc();
        self.observers_isolated.fetch_add(1, Ordering::Relaxed);
    }
}

/// Logs a progress line every `interval` until `cancel` fires.
pub fn spawn_status_reporter(metrics: Arc<Metrics>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("status reporter started interval_seconds={}", interval.as_secs());
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(100)));
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let snapshot = metrics.snapshot();
            info!(
                "status uptime_secs={} emitted={} endorsed={} rejected={} broadcast={} blocks={} committed={} dropped={} isolated={}",
                snapshot.uptime.as_secs(),
                snapshot.requests_emitted,
                snapshot.endorsements_ok,
                snapshot.endorsements_rejected,
                snapshot.envelopes_broadcast,
                snapshot.blocks_observed,
                snapshot.transactions_committed,
                snapshot.transactions_dropped,
                snapshot.observers_isolated
            );
        }
        debug!("status reporter stopped");
    })
}
