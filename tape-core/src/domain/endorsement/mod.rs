pub mod pending;
pub mod shard;

pub use pending::{IntegrationOutcome, PendingEndorsements};
pub use shard::shard_for;
