use anyhow::{Context, Result, bail};
use crates::infra::ai::gemini_client::DEFAULT_GEMINI_BASE_URL;

use super::{
    config_model::{
        Auth, BackendServer, Credits, Database, DotEnvyConfig, Gemini, Jobs, Stripe,
    },
    stage::Stage,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    load_from(|key| std::env::var(key).ok())
}

/// Builds the config from any key lookup, so tests need not touch the process env.
pub fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| lookup(key).with_context(|| format!("{key} is invalid"));
    let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let stage = optional("STAGE")
        .map(|value| Stage::try_from(&value).unwrap_or_default())
        .unwrap_or_default();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: optional("SERVER_BODY_LIMIT")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: optional("SERVER_TIMEOUT")
            .unwrap_or_else(|| "90".to_string())
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: optional("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS is invalid")?,
    };

    let auth = Auth {
        jwt_secret: required("JWT_SECRET")?,
    };

    let gemini = Gemini {
        api_key: required("GEMINI_API_KEY")?,
        model: optional("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.0-flash".to_string()),
        base_url: optional("GEMINI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        timeout_secs: optional("GEMINI_TIMEOUT_SECS")
            .unwrap_or_else(|| "60".to_string())
            .parse()
            .context("GEMINI_TIMEOUT_SECS is invalid")?,
    };

    let stripe = Stripe {
        webhook_secret: optional("STRIPE_WEBHOOK_SECRET"),
    };
    if stage == Stage::Production && stripe.webhook_secret.is_none() {
        bail!("STRIPE_WEBHOOK_SECRET is required in production");
    }

    let credits = Credits {
        default_credits: optional("DEFAULT_CREDITS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .context("DEFAULT_CREDITS is invalid")?,
    };

    let jobs = Jobs {
        max_attempts: optional("JOB_MAX_ATTEMPTS")
            .unwrap_or_else(|| "3".to_string())
            .parse()
            .context("JOB_MAX_ATTEMPTS is invalid")?,
    };

    Ok(DotEnvyConfig {
        stage,
        backend_server,
        database,
        auth,
        gemini,
        stripe,
        credits,
        jobs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn base_env() -> HashMap<String, String> {
        env(&[
            ("SERVER_PORT_BACKEND", "8080"),
            ("DATABASE_URL", "postgres://localhost:5432/study"),
            ("JWT_SECRET", "secret"),
            ("GEMINI_API_KEY", "key"),
        ])
    }

    #[test]
    fn applies_defaults() {
        let vars = base_env();
        let config = load_from(|key| vars.get(key).cloned()).unwrap();

        assert_eq!(config.stage, Stage::Local);
        assert_eq!(config.backend_server.port, 8080);
        assert_eq!(config.backend_server.body_limit, 10);
        assert_eq!(config.credits.default_credits, 5);
        assert_eq!(config.jobs.max_attempts, 3);
        assert!(config.stripe.webhook_secret.is_none());
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let mut vars = base_env();
        vars.remove("JWT_SECRET");

        let err = load_from(|key| vars.get(key).cloned()).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn production_requires_webhook_secret() {
        let mut vars = base_env();
        vars.insert("STAGE".to_string(), "production".to_string());
        assert!(load_from(|key| vars.get(key).cloned()).is_err());

        vars.insert("STRIPE_WEBHOOK_SECRET".to_string(), "whsec_1".to_string());
        let config = load_from(|key| vars.get(key).cloned()).unwrap();
        assert_eq!(config.stage, Stage::Production);
    }
}
