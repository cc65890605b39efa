use crate::application::context::StageContext;
use crate::domain::{shard_for, EndorsementResult, SignedProposal};
use crate::foundation::{NodeName, Result};
use crate::infrastructure::network::EndorserClient;
use log::{debug, info, trace};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Routes endorsement results to the integrator shard that owns the transaction.
#[derive(Clone)]
pub struct ShardRouter {
    shards: Arc<Vec<mpsc::Sender<EndorsementResult>>>,
}

impl ShardRouter {
    pub fn new(shards: Vec<mpsc::Sender<EndorsementResult>>) -> Self {
        Self { shards: Arc::new(shards) }
    }

    pub async fn route(&self, ctx: &StageContext, result: EndorsementResult) -> bool {
        let Some(tx) = self.shards.get(shard_for(&result.tx_id, self.shards.len())) else {
            return false;
        };
        ctx.forward(tx, result).await
    }
}

/// Long-lived worker owning the connection to one endorser. A transport error ends the run.
pub async fn run_proposer(
    endorser: NodeName,
    mut client: Box<dyn EndorserClient>,
    mut input: mpsc::Receiver<SignedProposal>,
    router: ShardRouter,
    ctx: StageContext,
) -> Result<()> {
    debug!("proposer for {} started", endorser);
    let mut processed = 0usize;
    while let Some(proposal) = ctx.receive(&mut input).await {
        let response = tokio::select! {
            _ = ctx.cancel.cancelled() => return Ok(()),
            response = client.process_proposal(&proposal) => response?,
        };
        let result = EndorsementResult::from_response(&proposal, response);
        trace!("endorsement result seq={} endorser={} endorsed={}", result.seq, endorser, result.is_endorsed());
        ctx.observer.on_endorsement_received(&result);
        if !router.route(&ctx, result).await {
            return Ok(());
        }
        processed += 1;
    }
    info!("proposer for {} finished processed={}", endorser, processed);
    Ok(())
}
