use crate::application::context::StageContext;
use crate::domain::{AddressedBlock, DeliverResponse, ObserverErrorPolicy};
use crate::foundation::{NodeName, Result, TapeError};
use crate::infrastructure::crypto::TransactionBuilder;
use crate::infrastructure::network::{Connector, DeliverClient, Node};
use log::{debug, info, warn};
use std::time::Instant;
use tokio::sync::mpsc;

/// Opens a filtered deliver stream from the newest block and drains the handshake response.
pub async fn connect_observer(
    connector: &dyn Connector,
    node: &Node,
    builder: &dyn TransactionBuilder,
) -> Result<Box<dyn DeliverClient>> {
    let mut client = connector.deliverer(node).await?;
    client.send_seek(builder.seek_newest()?).await?;
    match client.recv().await? {
        Some(DeliverResponse::FilteredBlock(block)) => {
            debug!("observer {} handshake at block {}", node.name, block.number);
        }
        Some(DeliverResponse::Status(status)) => {
            debug!("observer {} handshake status {}", node.name, status);
        }
        None => return Err(TapeError::protocol_violation(node.name.as_str(), "empty handshake response")),
    }
    Ok(client)
}

/// Per-committer stream settings.
pub struct ObserverSettings {
    pub committer: NodeName,
    pub policy: ObserverErrorPolicy,
    pub start: Instant,
    /// Transactions this committer reports before its stream is closed, normally N.
    pub limit: usize,
}

/// A committer stream that stopped under the isolate policy.
#[derive(Debug)]
pub struct Isolation {
    pub committer: NodeName,
    pub reason: TapeError,
}

/// Forwards the filtered blocks of one committer to the collector.
///
/// Stops once the committer has reported `limit` transactions, when the run is cancelled, or
/// when the collector stops listening. Completion is decided by the collector alone, so a run
/// that reaches its target earlier cancels this stream before the limit. Redelivered block
/// numbers are forwarded but not counted towards the limit.
///
/// Under `Isolate`, a receive error is sent on `isolations` and only this stream stops. Protocol
/// violations are fatal under both policies.
pub async fn run_observer(
    settings: ObserverSettings,
    mut client: Box<dyn DeliverClient>,
    blocks: &mpsc::Sender<AddressedBlock>,
    isolations: &mpsc::Sender<Isolation>,
    ctx: &StageContext,
) -> Result<()> {
    let ObserverSettings { committer, policy, start, limit } = settings;
    let mut observed = 0usize;
    let mut last_block: Option<u64> = None;
    loop {
        let received = tokio::select! {
            _ = ctx.cancel.cancelled() => return Ok(()),
            received = client.recv() => received,
        };
        let block = match received {
            Ok(Some(DeliverResponse::FilteredBlock(block))) => block,
            Ok(Some(DeliverResponse::Status(status))) => {
                return Err(TapeError::protocol_violation(committer.as_str(), format!("unexpected status {status} mid-stream")));
            }
            Ok(None) => return Err(TapeError::protocol_violation(committer.as_str(), "response without block payload")),
            Err(err) => match policy {
                ObserverErrorPolicy::Abort => return Err(err),
                ObserverErrorPolicy::Isolate => {
                    warn!("observer {} isolated after {} txs: {}", committer, observed, err);
                    ctx.forward(isolations, Isolation { committer: committer.clone(), reason: err }).await;
                    return Ok(());
                }
            },
        };

        if last_block.map_or(true, |last| block.number > last) {
            observed += block.transactions.len();
            last_block = Some(block.number);
        }
        info!(
            "Time {:8.2}s\tBlock {:6}\tTx {:6}\tCommitter {}",
            start.elapsed().as_secs_f64(),
            block.number,
            block.transactions.len(),
            committer
        );
        ctx.observer.on_block_observed(&committer, &block);
        if !ctx.forward(blocks, AddressedBlock { committer: committer.clone(), block }).await {
            debug!("observer {} stopping after {} txs", committer, observed);
            return Ok(());
        }
        if observed >= limit {
            debug!("observer {} reached {} txs", committer, observed);
            return Ok(());
        }
    }
}
