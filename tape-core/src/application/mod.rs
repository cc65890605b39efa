//! Application layer: pipeline stages and the run coordinator.

pub mod assembler;
pub mod broadcaster;
pub mod collector;
pub mod context;
pub mod initiator;
pub mod integrator;
pub mod lifecycle;
pub mod observer;
pub mod pipeline;
pub mod proposer;

pub use collector::Completion;
pub use context::{shared, ErrorSink, SharedReceiver, StageContext};
pub use lifecycle::{CompositeObserver, NoopObserver, PipelineObserver};
pub use pipeline::{Pipeline, PipelineConfig, RunReport, Topology};
