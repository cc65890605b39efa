use crate::service::metrics::{spawn_status_reporter, Metrics};
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tape_core::application::{CompositeObserver, Pipeline, PipelineConfig, PipelineObserver, RunReport, Topology};
use tape_core::foundation::util::hex_fmt::hx;
use tape_core::foundation::{ChaincodeId, ChannelId};
use tape_core::infrastructure::config::AppConfig;
use tape_core::infrastructure::crypto::{DefaultTransactionBuilder, Ed25519Signer, TransactionBuilder};
use tape_core::infrastructure::network::MemoryNetwork;
use tape_core::Result;
use tokio_util::sync::CancellationToken;

/// Everything one `tape` invocation needs, wired from a validated `AppConfig`.
///
/// Load runs against the in-process `MemoryNetwork`. The configured nodes shape the topology
/// and their connection settings are validated, but no remote `Connector` is used.
pub struct RunFlow {
    config: AppConfig,
    network: MemoryNetwork,
    builder: Arc<dyn TransactionBuilder>,
    metrics: Arc<Metrics>,
    extra_observers: Vec<Arc<dyn PipelineObserver>>,
    shutdown: CancellationToken,
}

impl RunFlow {
    /// Must be called inside a tokio runtime; the loopback network starts its batch timer here.
    pub fn new(config: AppConfig) -> Result<Self> {
        let signer = Arc::new(Ed25519Signer::from_hex_seed(&config.identity.msp_id, &config.identity.signer_seed_hex)?);
        info!(
            "signer ready msp_id={} public_key={}",
            config.identity.msp_id,
            hx(&signer.verifying_key().to_bytes())
        );
        let builder = Arc::new(DefaultTransactionBuilder::new(
            signer,
            ChannelId::from(config.network.channel.as_str()),
            ChaincodeId::from(config.network.chaincode.as_str()),
            &config.network.args,
        )?);
        let network = MemoryNetwork::new(
            ChannelId::from(config.network.channel.as_str()),
            config.loopback.block_size,
            Duration::from_millis(config.loopback.batch_timeout_ms),
        );
        let metrics = Arc::new(Metrics::new()?);
        Ok(Self { config, network, builder, metrics, extra_observers: Vec::new(), shutdown: CancellationToken::new() })
    }

    /// Replaces the loopback network, e.g. with one carrying faults.
    pub fn with_network(mut self, network: MemoryNetwork) -> Self {
        self.network = network;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.extra_observers.push(observer);
        self
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub fn network(&self) -> &MemoryNetwork {
        &self.network
    }

    /// Cancelling this token stops a running `run` with `TapeError::Cancelled`.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let topology = Topology::from_config(&self.config.network, &self.config.connection)?;
        let mut observers = CompositeObserver::new();
        observers.add_observer(self.metrics.clone());
        for observer in &self.extra_observers {
            observers.add_observer(observer.clone());
        }
        Ok(Pipeline::new(
            PipelineConfig::from_run_config(&self.config.run),
            topology,
            Arc::new(self.network.clone()),
            self.builder.clone(),
        )
        .with_observer(Arc::new(observers)))
    }

    /// Runs the pipeline with the status reporter alongside it.
    pub async fn run(&self) -> Result<RunReport> {
        let pipeline = self.build_pipeline()?;
        let cancel = pipeline.cancellation_token();
        let interval = Duration::from_secs(self.config.run.status_interval_seconds);
        let reporter = spawn_status_reporter(self.metrics.clone(), interval, cancel.clone());
        let bridge = {
            let cancel = cancel.clone();
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        warn!("shutdown requested; cancelling run");
                        cancel.cancel();
                    }
                    _ = cancel.cancelled() => {}
                }
            })
        };
        info!(
            "run starting channel={} chaincode={} number={} burst={} rate={}",
            self.config.network.channel, self.config.network.chaincode, self.config.run.number, self.config.run.burst, self.config.run.rate
        );
        let result = pipeline.run().await;
        cancel.cancel();
        let _ = reporter.await;
        let _ = bridge.await;
        result
    }
}
