mod config;
mod discord;
mod notifier;

use anyhow::Result;
use config::ObservabilityConfig;
use discord::DiscordWebhookProvider;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub use config::ServiceContext;
pub use notifier::{AlertEvent, AlertNotifier, AlertProvider};

/// Installs the global tracing subscriber and builds the optional alert
/// notifier. Must be called from within a tokio runtime.
pub fn init_observability(component: &str) -> Result<Option<AlertNotifier>> {
    let config = ObservabilityConfig::from_env(component);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Local time so `TZ=...` offsets show up in log timestamps.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    let context = &config.service_context;

    for warning in &config.warnings {
        warn!(
            service = %context.service_name,
            environment = %context.environment,
            component = %context.component,
            warning = %warning,
            "observability: config warning"
        );
    }

    let notifier = match config.discord_webhook_url.clone() {
        Some(url) => {
            let provider: Arc<dyn AlertProvider> = Arc::new(DiscordWebhookProvider::new(url)?);
            info!(
                service = %context.service_name,
                environment = %context.environment,
                component = %context.component,
                "observability: discord failure alerts enabled"
            );
            Some(AlertNotifier::new(context.clone(), vec![provider]))
        }
        None => {
            info!(
                service = %context.service_name,
                environment = %context.environment,
                component = %context.component,
                "observability: discord failure alerts disabled"
            );
            None
        }
    };

    Ok(notifier)
}
