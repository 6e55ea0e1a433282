//! Durable change-propagation and crash-recovery core for a Catapult-family
//! blockchain node: a single node server process and a separate broker
//! process communicate entirely through the on-disk spool queues built by
//! `catapult-fq`/`catapult-subscribers`, recovered on boot by
//! `catapult-recovery` (spec.md §1, §4.9, §5).

pub mod broker;
pub mod config;
pub mod error;
pub mod logging_subscribers;
pub mod node;

pub use broker::{Broker, BrokerSubscribers};
pub use config::NodeConfig;
pub use error::NodeError;
pub use logging_subscribers::LoggingSubscriber;
pub use node::{BlockProducer, NodeServer, ProducedBlock};
