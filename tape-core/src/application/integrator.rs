use crate::application::context::StageContext;
use crate::domain::{EndorsementResult, Envelope, IntegrationOutcome, PendingEndorsements};
use crate::foundation::util::hex_fmt::hx;
use crate::foundation::{NodeName, Result, TapeError};
use crate::infrastructure::crypto::TransactionBuilder;
use log::{debug, trace};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Integrator shard: sole owner of the pending state of every transaction hashed to it.
pub async fn run_integrator(
    shard: usize,
    builder: Arc<dyn TransactionBuilder>,
    required: Vec<NodeName>,
    mut input: mpsc::Receiver<EndorsementResult>,
    out: mpsc::Sender<Envelope>,
    ctx: StageContext,
) -> Result<()> {
    let mut pending = PendingEndorsements::new(required);
    let mut built = 0usize;
    while let Some(result) = ctx.receive(&mut input).await {
        match pending.accept(result) {
            IntegrationOutcome::Waiting | IntegrationOutcome::Ignored => {}
            IntegrationOutcome::Abandoned { seq, tx_id, endorser, reason } => {
                debug!("integrator shard {} abandoning seq={} tx_id={}", shard, seq, tx_id);
                ctx.errors
                    .report(TapeError::EndorsementRejected { tx_id: tx_id.to_string(), endorser: endorser.to_string(), reason })
                    .await;
            }
            IntegrationOutcome::Complete { seq, tx_id, endorsements } => {
                let envelope = match builder.build_envelope(seq, tx_id, &endorsements) {
                    Ok(envelope) => envelope,
                    Err(err) if !err.is_fatal() => {
                        ctx.errors.report(err).await;
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                trace!("envelope built seq={} tx_id={} shard={} payload={:#}", seq, tx_id, shard, hx(&envelope.payload));
                ctx.observer.on_envelope_built(&tx_id);
                if !ctx.forward(&out, envelope).await {
                    return Ok(());
                }
                built += 1;
            }
        }
    }
    debug!("integrator shard {} finished built={} in_flight={}", shard, built, pending.in_flight());
    Ok(())
}
