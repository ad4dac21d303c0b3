//! Dispatch executor — sends one template and records the attempt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use recurbot_core::error::Result;
use recurbot_core::traits::MessagingGateway;
use recurbot_core::types::{DeliveryResult, Template};

use crate::registry::TemplateRegistry;

/// Routes a template to the gateway and stamps `last_sent_time`.
#[derive(Clone)]
pub struct DispatchExecutor {
    gateway: Arc<dyn MessagingGateway>,
    registry: TemplateRegistry,
}

impl DispatchExecutor {
    pub fn new(gateway: Arc<dyn MessagingGateway>, registry: TemplateRegistry) -> Self {
        Self { gateway, registry }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Send as captioned photo when an image is enabled and present,
    /// otherwise as text. The gateway's result is returned as-is.
    pub async fn dispatch(&self, template: &Template) -> Result<DeliveryResult> {
        if template.sends_photo() {
            tracing::info!("📤 Sending template '{}' as photo", template.name);
            self.gateway
                .send_photo(&template.message, &template.image_url)
                .await
        } else {
            tracing::info!("📤 Sending template '{}'", template.name);
            self.gateway.send_text(&template.message).await
        }
    }

    /// Dispatch, then persist `last_sent_time = now` no matter how the
    /// attempt went. A transport fault is returned after the save.
    pub async fn dispatch_and_record(
        &self,
        mut template: Template,
        now: DateTime<Utc>,
    ) -> Result<DeliveryResult> {
        let outcome = self.dispatch(&template).await;

        match &outcome {
            Ok(result) if !result.ok => tracing::warn!(
                "⚠️ Gateway rejected '{}': {}",
                template.name,
                result.description.as_deref().unwrap_or("unknown error")
            ),
            Err(e) => tracing::warn!("⚠️ Dispatch of '{}' failed: {e}", template.name),
            Ok(_) => {}
        }

        template.last_sent_time = Some(now);
        if let Err(save_err) = self.registry.save(&template).await {
            if outcome.is_err() {
                tracing::error!(
                    "❌ Could not record attempt for '{}': {save_err}",
                    template.id
                );
                return outcome;
            }
            return Err(save_err);
        }

        outcome
    }

    /// Manual trigger: load by id, dispatch, record.
    pub async fn send_now(&self, id: &str, now: DateTime<Utc>) -> Result<DeliveryResult> {
        let template = self.registry.require(id).await?;
        self.dispatch_and_record(template, now).await
    }
}
