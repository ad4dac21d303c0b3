//! Contracts for the external collaborators.

pub mod gateway;
pub mod store;

pub use gateway::MessagingGateway;
pub use store::KvStore;
