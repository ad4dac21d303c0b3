//! # Recurbot Channels
//! Messaging gateway implementations.

pub mod telegram;

pub use telegram::TelegramGateway;
