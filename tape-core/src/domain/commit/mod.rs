pub mod policy;
pub mod state;
pub mod tally;
pub mod threshold;

pub use policy::ObserverErrorPolicy;
pub use state::CollectorState;
pub use tally::{CommitTally, TallyOutcome};
pub use threshold::CommitThreshold;
