use crate::application::context::{SharedReceiver, StageContext};
use crate::domain::Envelope;
use crate::foundation::{NodeName, Result};
use crate::infrastructure::network::BroadcastClient;
use log::{debug, info};

/// One worker per orderer, all draining the shared envelope channel.
///
/// Success only means the orderer accepted the envelope; commitment is observed elsewhere.
pub async fn run_broadcaster(
    orderer: NodeName,
    mut client: Box<dyn BroadcastClient>,
    input: SharedReceiver<Envelope>,
    ctx: StageContext,
) -> Result<()> {
    debug!("broadcaster for {} started", orderer);
    let mut sent = 0usize;
    while let Some(envelope) = ctx.receive_shared(&input).await {
        let tx_id = envelope.tx_id;
        tokio::select! {
            _ = ctx.cancel.cancelled() => return Ok(()),
            result = client.send(envelope) => result?,
        }
        ctx.observer.on_envelope_broadcast(&tx_id, &orderer);
        sent += 1;
    }
    info!("broadcaster for {} finished sent={}", orderer, sent);
    Ok(())
}
