use std::env;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContext {
    pub service_name: String,
    pub environment: String,
    pub component: String,
}

#[derive(Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) discord_webhook_url: Option<Url>,
    /// Warnings captured during config parsing so they can be logged after tracing is initialized.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        let component = component.trim().to_string();

        let service_name = env_string("SERVICE_NAME").unwrap_or_else(|| component.clone());
        let environment = env_string("STAGE").unwrap_or_else(|| "unknown".to_string());

        let (discord_webhook_url, warnings) = discord_webhook_from(
            env_bool("DISCORD_NOTIFY_ENABLED"),
            env_string("DISCORD_WEBHOOK_URL"),
        );

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            discord_webhook_url,
            warnings,
        }
    }
}

/// Alerts stay off unless a valid URL is configured and notifications are not disabled.
fn discord_webhook_from(enabled: Option<bool>, raw_url: Option<String>) -> (Option<Url>, Vec<String>) {
    let mut warnings = Vec::new();

    if !enabled.unwrap_or(true) {
        return (None, warnings);
    }

    let Some(raw) = raw_url else {
        return (None, warnings);
    };

    match Url::parse(&raw) {
        Ok(url) => (Some(url), warnings),
        Err(err) => {
            // The raw URL carries the webhook token; only the parse error is reported.
            warnings.push(format!(
                "DISCORD_WEBHOOK_URL is set but invalid; job failure alerts disabled (parse error: {err})"
            ));
            (None, warnings)
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    let raw = env::var(key).ok()?;
    parse_bool(&raw)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
