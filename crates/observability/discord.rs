use super::notifier::{AlertEvent, AlertProvider};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use url::Url;

pub(crate) struct DiscordWebhookProvider {
    webhook_url: Url,
    client: Client,
}

impl DiscordWebhookProvider {
    pub(crate) fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(3)).build()?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

pub(crate) fn format_content(event: &AlertEvent) -> String {
    let mut lines = vec![
        format!(
            "**{}** `{}` `{}`",
            event.service_name, event.environment, event.component
        ),
        format!(
            "`{}` {}",
            event.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            event.title
        ),
    ];

    if !event.message.trim().is_empty() {
        lines.push(format!("> {}", event.message.trim()));
    }

    for (k, v) in &event.fields {
        lines.push(format!("- `{}` = `{}`", k, v));
    }

    truncate_for_discord(lines.join("\n"))
}

#[async_trait]
impl AlertProvider for DiscordWebhookProvider {
    async fn send(&self, event: &AlertEvent) -> Result<()> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": format_content(event) }))
            .send()
            .await
            .map_err(sanitize_reqwest_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "discord webhook returned non-success status: {}",
            response.status()
        ))
    }

    fn provider_name(&self) -> &'static str {
        "discord"
    }
}

// reqwest errors embed the request URL, which contains the webhook token.
fn sanitize_reqwest_error(error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!("discord webhook request timed out");
    }
    if error.is_connect() {
        return anyhow!("discord webhook connection failed");
    }
    anyhow!("discord webhook request failed")
}

fn truncate_for_discord(content: String) -> String {
    const LIMIT: usize = 2000;
    const SUFFIX: &str = "\n… (truncated)";

    if content.chars().count() <= LIMIT {
        return content;
    }

    let allowed = LIMIT.saturating_sub(SUFFIX.chars().count());
    let mut truncated: String = content.chars().take(allowed).collect();
    truncated.push_str(SUFFIX);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::config::ServiceContext;

    fn context() -> ServiceContext {
        ServiceContext {
            service_name: "study-worker".to_string(),
            environment: "local".to_string(),
            component: "worker".to_string(),
        }
    }

    #[test]
    fn content_lists_fields() {
        let event = AlertEvent::new(&context(), "job dead", "layout missing")
            .with_field("job_type", "notes.generate");

        let content = format_content(&event);

        assert!(content.starts_with("**study-worker** `local` `worker`"));
        assert!(content.contains("> layout missing"));
        assert!(content.contains("- `job_type` = `notes.generate`"));
    }

    #[test]
    fn long_content_is_truncated_to_discord_limit() {
        let event = AlertEvent::new(&context(), "job dead", "x".repeat(5000));

        let content = format_content(&event);

        assert_eq!(content.chars().count(), 2000);
        assert!(content.ends_with("(truncated)"));
    }
}
