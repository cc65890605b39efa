use crate::application::context::{SharedReceiver, StageContext};
use crate::domain::{SignedProposal, TransactionRequest};
use crate::foundation::{NodeName, Result};
use crate::infrastructure::crypto::TransactionBuilder;
use log::{debug, trace};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Fixed per-endorser proposal channels, created once from the endorser list.
#[derive(Clone)]
pub struct EndorserRoutes {
    routes: Arc<Vec<(NodeName, mpsc::Sender<SignedProposal>)>>,
}

impl EndorserRoutes {
    pub fn new(routes: Vec<(NodeName, mpsc::Sender<SignedProposal>)>) -> Self {
        Self { routes: Arc::new(routes) }
    }

    pub fn endorsers(&self) -> impl Iterator<Item = &NodeName> {
        self.routes.iter().map(|(name, _)| name)
    }
}

/// Assembler pool worker: one signed proposal per endorser for every request.
///
/// All proposals are built before any is sent, so a signing failure abandons the transaction
/// without leaking partial proposals downstream.
pub async fn run_assembler(
    worker: usize,
    builder: Arc<dyn TransactionBuilder>,
    input: SharedReceiver<TransactionRequest>,
    routes: EndorserRoutes,
    ctx: StageContext,
) -> Result<()> {
    debug!("assembler worker {} started", worker);
    while let Some(request) = ctx.receive_shared(&input).await {
        let proposals: Result<Vec<SignedProposal>> =
            routes.endorsers().map(|endorser| builder.sign_proposal(&request, endorser)).collect();
        let proposals = match proposals {
            Ok(proposals) => proposals,
            Err(err) if !err.is_fatal() => {
                ctx.errors.report(err).await;
                continue;
            }
            Err(err) => return Err(err),
        };

        for (proposal, (endorser, tx)) in proposals.into_iter().zip(routes.routes.iter()) {
            let tx_id = proposal.tx_id;
            if !ctx.forward(tx, proposal).await {
                debug!("assembler worker {} stopping: channel for {} closed or run cancelled", worker, endorser);
                return Ok(());
            }
            trace!("proposal queued seq={} endorser={}", request.seq, endorser);
            ctx.observer.on_proposal_signed(&tx_id, endorser);
        }
    }
    debug!("assembler worker {} finished", worker);
    Ok(())
}
