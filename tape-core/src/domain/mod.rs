//! Domain layer: transaction data model and the pure bookkeeping behind each pipeline stage.

pub mod commit;
pub mod endorsement;
pub mod pacing;
pub mod transaction;

pub use commit::{CollectorState, CommitTally, CommitThreshold, ObserverErrorPolicy, TallyOutcome};
pub use endorsement::{shard_for, IntegrationOutcome, PendingEndorsements};
pub use pacing::TokenBucket;
pub use transaction::*;
