use crate::application::assembler::{run_assembler, EndorserRoutes};
use crate::application::broadcaster::run_broadcaster;
use crate::application::collector::{run_collector, BlockCollector, Completion};
use crate::application::context::{shared, StageContext};
use crate::application::initiator::run_initiator;
use crate::application::integrator::run_integrator;
use crate::application::lifecycle::{NoopObserver, PipelineObserver};
use crate::application::observer::{connect_observer, run_observer, ObserverSettings};
use crate::application::proposer::{run_proposer, ShardRouter};
use crate::domain::{CommitThreshold, ObserverErrorPolicy, TokenBucket};
use crate::foundation::{
    NodeName, NodeRole, Result, TapeError, DEFAULT_ASSEMBLER_WORKERS, DEFAULT_INTEGRATOR_WORKERS,
};
use crate::infrastructure::config::{ConnectionSettings, NetworkConfig, NodeConfig, RunConfig};
use crate::infrastructure::crypto::TransactionBuilder;
use crate::infrastructure::network::{Connector, Node};
use log::{info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    pub number: usize,
    pub burst: usize,
    /// Transactions per second; 0 means unlimited.
    pub rate: f64,
    pub commit_threshold: usize,
    /// Committed transactions that end the run. Defaults to `number`.
    pub commit_target: Option<usize>,
    pub assembler_workers: usize,
    pub integrator_workers: usize,
    pub observer_error_policy: ObserverErrorPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            number: 0,
            burst: 1,
            rate: 0.0,
            commit_threshold: 1,
            commit_target: None,
            assembler_workers: DEFAULT_ASSEMBLER_WORKERS,
            integrator_workers: DEFAULT_INTEGRATOR_WORKERS,
            observer_error_policy: ObserverErrorPolicy::Abort,
        }
    }
}

impl PipelineConfig {
    pub fn from_run_config(run: &RunConfig) -> Self {
        Self {
            number: run.number,
            burst: run.burst,
            rate: run.rate,
            commit_threshold: run.commit_threshold,
            commit_target: None,
            assembler_workers: run.assembler_workers,
            integrator_workers: run.integrator_workers,
            observer_error_policy: run.observer_error_policy,
        }
    }

    pub fn target(&self) -> usize {
        self.commit_target.unwrap_or(self.number)
    }
}

/// Endorsers, committers and orderers of the target network.
#[derive(Clone, Debug, Default)]
pub struct Topology {
    pub endorsers: Vec<Node>,
    pub committers: Vec<Node>,
    pub orderers: Vec<Node>,
}

impl Topology {
    pub fn from_config(network: &NetworkConfig, settings: &ConnectionSettings) -> Result<Self> {
        let nodes = |configs: &[NodeConfig], role: NodeRole| -> Result<Vec<Node>> {
            configs.iter().map(|config| Node::from_config(config, role, settings)).collect()
        };
        Ok(Self {
            endorsers: nodes(&network.endorsers, NodeRole::Endorser)?,
            committers: nodes(&network.committers, NodeRole::Committer)?,
            orderers: nodes(&network.orderers, NodeRole::Orderer)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (role, nodes) in [("endorser", &self.endorsers), ("committer", &self.committers), ("orderer", &self.orderers)] {
            if nodes.is_empty() {
                return Err(TapeError::ConfigError(format!("at least one {role} is required")));
            }
        }
        Ok(())
    }
}

/// Result of a completed run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub transactions: usize,
    pub elapsed: Duration,
    pub tps: f64,
    /// Transactions abandoned on the way (build failures, endorsement rejections).
    pub dropped: usize,
    /// Committed transactions the ledger marked invalid.
    pub invalid: usize,
}

impl RunReport {
    pub fn new(completion: Completion, dropped: usize) -> Self {
        let secs = completion.elapsed.as_secs_f64();
        let tps = if secs > 0.0 { completion.committed as f64 / secs } else { 0.0 };
        Self { transactions: completion.committed, elapsed: completion.elapsed, tps, dropped, invalid: completion.invalid }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "tx": self.transactions,
            "duration_secs": self.elapsed.as_secs_f64(),
            "tps": self.tps,
            "dropped": self.dropped,
            "invalid": self.invalid,
        })
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx: {}, duration: {:?}, tps: {:.6}", self.transactions, self.elapsed, self.tps)
    }
}

struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// One load run: connects every node, wires the stages, and waits for completion or the first
/// fatal error.
pub struct Pipeline {
    config: PipelineConfig,
    topology: Topology,
    connector: Arc<dyn Connector>,
    builder: Arc<dyn TransactionBuilder>,
    observer: Arc<dyn PipelineObserver>,
    cancel: CancellationToken,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        topology: Topology,
        connector: Arc<dyn Connector>,
        builder: Arc<dyn TransactionBuilder>,
    ) -> Self {
        Self { config, topology, connector, builder, observer: Arc::new(NoopObserver), cancel: CancellationToken::new() }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Cancelling this token aborts the run with `TapeError::Cancelled`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(self) -> Result<RunReport> {
        self.topology.validate()?;
        let threshold = CommitThreshold::new(self.config.commit_threshold, self.topology.committers.len())?;
        if self.config.burst == 0 {
            return Err(TapeError::ConfigError("burst must be > 0".to_string()));
        }
        let capacity = self.config.burst;
        let target = self.config.target();
        let (error_tx, mut error_rx) = mpsc::channel(capacity);
        let ctx = StageContext::new(self.cancel.clone(), error_tx, self.observer.clone());

        // Every connection is established, and every observer subscribed, before the first request.
        let mut endorser_clients = Vec::with_capacity(self.topology.endorsers.len());
        for node in &self.topology.endorsers {
            endorser_clients.push((node.name.clone(), self.connector.endorser(node).await?));
        }
        let mut orderer_clients = Vec::with_capacity(self.topology.orderers.len());
        for node in &self.topology.orderers {
            orderer_clients.push((node.name.clone(), self.connector.broadcaster(node).await?));
        }
        let mut deliver_clients = Vec::with_capacity(self.topology.committers.len());
        for node in &self.topology.committers {
            deliver_clients.push((node.name.clone(), connect_observer(self.connector.as_ref(), node, self.builder.as_ref()).await?));
        }
        info!(
            "connected endorsers={} orderers={} committers={} number={} target={} burst={} rate={} threshold={} policy={}",
            endorser_clients.len(),
            orderer_clients.len(),
            deliver_clients.len(),
            self.config.number,
            target,
            capacity,
            self.config.rate,
            threshold.required(),
            self.config.observer_error_policy
        );

        let start = Instant::now();
        let mut tasks = JoinSet::new();

        let (block_tx, block_rx) = mpsc::channel(capacity);
        let (isolation_tx, isolation_rx) = mpsc::channel(deliver_clients.len());
        for (committer, client) in deliver_clients {
            let settings =
                ObserverSettings { committer, policy: self.config.observer_error_policy, start, limit: self.config.number };
            let blocks = block_tx.clone();
            let isolations = isolation_tx.clone();
            let ctx = ctx.clone();
            tasks.spawn(async move {
                // `blocks` outlives the error report so the collector never sees the stream end first.
                ctx.supervise("observer", run_observer(settings, client, &blocks, &isolations, &ctx)).await;
                drop(blocks);
            });
        }
        drop(block_tx);
        drop(isolation_tx);
        let collector = BlockCollector::new(threshold, target, start);
        let mut collector = AbortOnDrop(tokio::spawn(run_collector(collector, block_rx, isolation_rx, ctx.clone())));

        let (envelope_tx, envelope_rx) = mpsc::channel(capacity);
        let mut shard_txs = Vec::with_capacity(self.config.integrator_workers.max(1));
        let required: Vec<NodeName> = endorser_clients.iter().map(|(name, _)| name.clone()).collect();
        for shard in 0..self.config.integrator_workers.max(1) {
            let (tx, rx) = mpsc::channel(capacity);
            shard_txs.push(tx);
            let worker = run_integrator(shard, self.builder.clone(), required.clone(), rx, envelope_tx.clone(), ctx.clone());
            let ctx = ctx.clone();
            tasks.spawn(async move { ctx.supervise("integrator", worker).await });
        }
        drop(envelope_tx);

        let envelope_rx = shared(envelope_rx);
        for (orderer, client) in orderer_clients {
            let worker = run_broadcaster(orderer, client, envelope_rx.clone(), ctx.clone());
            let ctx = ctx.clone();
            tasks.spawn(async move { ctx.supervise("broadcaster", worker).await });
        }

        let router = ShardRouter::new(shard_txs);
        let mut routes = Vec::with_capacity(endorser_clients.len());
        for (endorser, client) in endorser_clients {
            let (tx, rx) = mpsc::channel(capacity);
            routes.push((endorser.clone(), tx));
            let worker = run_proposer(endorser, client, rx, router.clone(), ctx.clone());
            let ctx = ctx.clone();
            tasks.spawn(async move { ctx.supervise("proposer", worker).await });
        }
        drop(router);

        let routes = EndorserRoutes::new(routes);
        let (raw_tx, raw_rx) = mpsc::channel(capacity);
        let raw_rx = shared(raw_rx);
        for worker_id in 0..self.config.assembler_workers.max(1) {
            let worker = run_assembler(worker_id, self.builder.clone(), raw_rx.clone(), routes.clone(), ctx.clone());
            let ctx = ctx.clone();
            tasks.spawn(async move { ctx.supervise("assembler", worker).await });
        }
        drop(routes);

        let pacer = TokenBucket::for_rate(self.config.rate, capacity);
        let initiator = run_initiator(self.builder.clone(), self.config.number, pacer, raw_tx, ctx.clone());
        {
            let ctx = ctx.clone();
            tasks.spawn(async move { ctx.supervise("initiator", initiator).await });
        }

        let mut dropped = 0usize;
        let outcome = loop {
            tokio::select! {
                biased;
                Some(err) = error_rx.recv() => {
                    if err.is_fatal() {
                        warn!("fatal error, aborting run: {}", err);
                        break Err(err);
                    }
                    dropped += 1;
                    warn!("transaction dropped ({} so far): {}", dropped, err);
                    self.observer.on_transaction_dropped(&err);
                }
                joined = &mut collector.0 => {
                    break match joined {
                        Ok(result) => result,
                        Err(err) => Err(TapeError::Message(format!("collector task failed: {err}"))),
                    };
                }
                Some(joined) = tasks.join_next() => {
                    if let Err(err) = joined {
                        if err.is_panic() {
                            break Err(TapeError::Message(format!("pipeline worker panicked: {err}")));
                        }
                    }
                }
            }
        };

        self.cancel.cancel();
        tasks.shutdown().await;

        let report = RunReport::new(outcome?, dropped);
        info!("{}", report);
        Ok(report)
    }
}
