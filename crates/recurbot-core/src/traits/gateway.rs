//! Messaging gateway contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::DeliveryResult;

/// Delivers content to the single configured destination.
///
/// Destination and credentials belong to the implementation, never to the
/// caller. A remote rejection comes back as `Ok` with `ok == false`;
/// `Err` is reserved for transport and decoding faults.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    fn name(&self) -> &str;

    /// Send a plain text message.
    async fn send_text(&self, text: &str) -> Result<DeliveryResult>;

    /// Send an image by URL with a caption.
    async fn send_photo(&self, caption: &str, photo_url: &str) -> Result<DeliveryResult>;
}
