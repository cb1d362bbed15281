use async_trait::async_trait;
use crate::config::EmailConfig;
use crate::error::Result;
use crate::interfaces::notifier::{EmailMessage, Notifier};

/// Log-backed email transport. Deployments wire a real delivery channel
/// behind the `Notifier` trait; this implementation records the outbound
/// message through tracing and reports success.
pub struct TracingNotifier {
    sender_name: String,
    sender_address: String,
}

impl TracingNotifier {
    pub fn new(config: &EmailConfig) -> Self {
        TracingNotifier {
            sender_name: config.sender_name.clone(),
            sender_address: config.sender_address.clone(),
        }
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            sender = %self.sender_address,
            sender_name = %self.sender_name,
            to = %message.to,
            subject = %message.subject,
            body_bytes = message.html.len(),
            "outbound email"
        );
        Ok(())
    }
}
