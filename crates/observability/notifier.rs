use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use super::config::ServiceContext;

/// A job or operation failure that should reach a human.
#[derive(Clone, Debug)]
pub struct AlertEvent {
    pub timestamp: DateTime<Utc>,
    pub service_name: String,
    pub environment: String,
    pub component: String,
    pub title: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl AlertEvent {
    pub fn new(context: &ServiceContext, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            service_name: context.service_name.clone(),
            environment: context.environment.clone(),
            component: context.component.clone(),
            title: title.into(),
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl ToString) -> Self {
        self.fields.insert(key.to_string(), value.to_string());
        self
    }
}

#[async_trait]
pub trait AlertProvider: Send + Sync {
    async fn send(&self, event: &AlertEvent) -> Result<()>;
    fn provider_name(&self) -> &'static str;
}

/// Fire-and-forget fan-out to alert providers. Delivery runs on a background
/// task so a slow webhook never blocks the caller.
#[derive(Clone)]
pub struct AlertNotifier {
    context: ServiceContext,
    tx: mpsc::Sender<AlertEvent>,
}

impl AlertNotifier {
    pub fn new(context: ServiceContext, providers: Vec<Arc<dyn AlertProvider>>) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertEvent>(256);

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for provider in &providers {
                    if let Err(error) = provider.send(&event).await {
                        warn!(
                            provider = provider.provider_name(),
                            error = %error,
                            "alerts: provider failed"
                        );
                    }
                }
            }
        });

        Self { context, tx }
    }

    pub fn context(&self) -> &ServiceContext {
        &self.context
    }

    pub fn try_alert(&self, event: AlertEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("alerts: queue full; dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("alerts: queue closed; dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct ChannelProvider(mpsc::UnboundedSender<AlertEvent>);

    #[async_trait]
    impl AlertProvider for ChannelProvider {
        async fn send(&self, event: &AlertEvent) -> Result<()> {
            let _ = self.0.send(event.clone());
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "channel"
        }
    }

    #[tokio::test]
    async fn alerts_reach_every_provider() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let context = ServiceContext {
            service_name: "study-worker".to_string(),
            environment: "test".to_string(),
            component: "worker".to_string(),
        };
        let notifier = AlertNotifier::new(context.clone(), vec![Arc::new(ChannelProvider(tx))]);

        notifier.try_alert(AlertEvent::new(&context, "job dead", "boom").with_field("job_id", 7));

        let event = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.title, "job dead");
        assert_eq!(event.fields.get("job_id").map(String::as_str), Some("7"));
    }
}
