use serde::{Deserialize, Serialize};

/// What a commit observer does with a receive error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserverErrorPolicy {
    /// The error is fatal for the whole run.
    #[default]
    Abort,
    /// The error stops only the failing stream; the run fails once the remaining streams cannot reach the target.
    Isolate,
}

impl std::fmt::Display for ObserverErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Abort => write!(f, "abort"),
            Self::Isolate => write!(f, "isolate"),
        }
    }
}
