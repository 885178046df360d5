use super::config_model::{Database, DotEnvyConfig, Gemini, WorkerServer, Workflow};
use anyhow::{Context, Result};
use crates::infra::ai::gemini_client::DEFAULT_GEMINI_BASE_URL;
use std::str::FromStr;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    load_from(|key| std::env::var(key).ok())
}

pub fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| lookup(key).with_context(|| format!("{key} is invalid"));
    let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let worker_server = WorkerServer {
        port: required("SERVER_PORT_WORKER")?
            .parse()
            .context("SERVER_PORT_WORKER is invalid")?,
        body_limit: parse_or(optional("SERVER_BODY_LIMIT"), 1, "SERVER_BODY_LIMIT")?,
        timeout: parse_or(optional("SERVER_TIMEOUT"), 30, "SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: parse_or(
            optional("DATABASE_MAX_CONNECTIONS"),
            10,
            "DATABASE_MAX_CONNECTIONS",
        )?,
    };

    let gemini = Gemini {
        api_key: required("GEMINI_API_KEY")?,
        model: optional("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string()),
        notes_model: optional("GEMINI_NOTES_MODEL"),
        base_url: optional("GEMINI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        timeout_secs: parse_or(optional("GEMINI_TIMEOUT_SECS"), 120, "GEMINI_TIMEOUT_SECS")?,
    };

    let workflow = Workflow {
        worker_id: optional("WORKER_ID")
            .unwrap_or_else(|| format!("worker-{}", uuid::Uuid::new_v4().simple())),
        concurrency: parse_or(optional("WORKER_CONCURRENCY"), 4, "WORKER_CONCURRENCY")?,
        notes_fanout: parse_or(
            optional("NOTES_FANOUT_CONCURRENCY"),
            4,
            "NOTES_FANOUT_CONCURRENCY",
        )?,
        backoff_base_secs: parse_or(optional("JOB_BACKOFF_BASE_SECS"), 5, "JOB_BACKOFF_BASE_SECS")?,
        backoff_max_secs: parse_or(optional("JOB_BACKOFF_MAX_SECS"), 300, "JOB_BACKOFF_MAX_SECS")?,
        poll_interval_ms: parse_or(
            optional("JOB_POLL_INTERVAL_MS"),
            1000,
            "JOB_POLL_INTERVAL_MS",
        )?,
        lease_secs: parse_or(optional("JOB_LEASE_SECS"), 600, "JOB_LEASE_SECS")?,
    };

    Ok(DotEnvyConfig {
        worker_server,
        database,
        gemini,
        workflow,
    })
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T, key: &str) -> Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{key} is invalid")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(extra: &[(&str, &str)]) -> HashMap<String, String> {
        [
            ("SERVER_PORT_WORKER", "8081"),
            ("DATABASE_URL", "postgres://localhost:5432/study"),
            ("GEMINI_API_KEY", "key"),
        ]
        .iter()
        .chain(extra.iter())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
    }

    #[test]
    fn workflow_defaults() {
        let env = vars(&[]);
        let config = load_from(|key| env.get(key).cloned()).unwrap();

        assert_eq!(config.workflow.concurrency, 4);
        assert_eq!(config.workflow.notes_fanout, 4);
        assert_eq!(config.workflow.backoff_base_secs, 5);
        assert_eq!(config.workflow.lease_secs, 600);
        assert!(config.workflow.worker_id.starts_with("worker-"));
        assert!(config.gemini.notes_model.is_none());
    }

    #[test]
    fn rejects_non_numeric_concurrency() {
        let env = vars(&[("WORKER_CONCURRENCY", "many")]);
        let err = load_from(|key| env.get(key).cloned()).unwrap_err();

        assert!(err.to_string().contains("WORKER_CONCURRENCY"));
    }
}
