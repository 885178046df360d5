use crate::config::stage::Stage;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub stage: Stage,
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: Auth,
    pub gemini: Gemini,
    pub stripe: Stripe,
    pub credits: Credits,
    pub jobs: Jobs,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Gemini {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Stripe {
    /// Unset only outside production; webhooks are then accepted unsigned.
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credits {
    pub default_credits: i32,
}

#[derive(Debug, Clone)]
pub struct Jobs {
    pub max_attempts: i32,
}
