pub mod flow;
pub mod metrics;

pub use flow::RunFlow;
pub use metrics::{spawn_status_reporter, Metrics, MetricsSnapshot};
