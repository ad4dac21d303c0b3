//! # Recurbot Core
//!
//! Shared building blocks for the Recurbot workspace: the template data
//! model, the contracts of the two external collaborators (key-value store
//! and messaging gateway), configuration, and the error type.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::RecurbotConfig;
pub use error::{RecurbotError, Result};
pub use traits::{KvStore, MessagingGateway};
pub use types::{DeliveryResult, IntervalUnit, NewTemplate, Template};
