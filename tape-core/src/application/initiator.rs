use crate::application::context::StageContext;
use crate::domain::{TokenBucket, TransactionRequest};
use crate::foundation::Result;
use crate::infrastructure::crypto::TransactionBuilder;
use log::{debug, info};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

/// Emits `number` requests paced by `pacer`, then closes `out` by dropping it.
///
/// A request that fails to build is reported and its sequence number skipped.
pub async fn run_initiator(
    builder: Arc<dyn TransactionBuilder>,
    number: usize,
    mut pacer: Option<TokenBucket>,
    out: mpsc::Sender<TransactionRequest>,
    ctx: StageContext,
) -> Result<()> {
    info!("initiator starting number={} paced={}", number, pacer.is_some());
    let mut emitted = 0usize;
    for seq in 0..number as u64 {
        if let Some(bucket) = pacer.as_mut() {
            loop {
                let wait = bucket.wait_time_at(Instant::now());
                if wait.is_zero() && bucket.try_consume() {
                    break;
                }
                tokio::select! {
                    _ = ctx.cancel.cancelled() => return Ok(()),
                    _ = tokio::time::sleep(wait) => {}
                }
            }
        }

        let request = match builder.new_request(seq) {
            Ok(request) => request,
            Err(err) if !err.is_fatal() => {
                ctx.errors.report(err).await;
                continue;
            }
            Err(err) => return Err(err),
        };
        let tx_id = request.tx_id;
        if !ctx.forward(&out, request).await {
            debug!("initiator stopping early emitted={}", emitted);
            return Ok(());
        }
        ctx.observer.on_request_emitted(seq, &tx_id);
        emitted += 1;
    }
    info!("initiator finished emitted={}", emitted);
    Ok(())
}
