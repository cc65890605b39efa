pub mod connection;
pub mod memory;
pub mod traits;

pub use connection::{ConnectionConfig, KeepaliveOptions, Node, SecureOptions};
pub use memory::{CommitterFaults, EndorserFaults, MemoryNetwork, OrdererFaults};
pub use traits::{BroadcastClient, Connector, DeliverClient, EndorserClient};
