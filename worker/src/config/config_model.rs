#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub worker_server: WorkerServer,
    pub database: Database,
    pub gemini: Gemini,
    pub workflow: Workflow,
}

#[derive(Debug, Clone)]
pub struct WorkerServer {
    pub port: u16,
    pub timeout: u64,
    pub body_limit: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Gemini {
    pub api_key: String,
    pub model: String,
    /// Chapter notes are long-form HTML and may use a different model.
    pub notes_model: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Workflow {
    pub worker_id: String,
    pub concurrency: usize,
    pub notes_fanout: usize,
    pub backoff_base_secs: u64,
    pub backoff_max_secs: u64,
    pub poll_interval_ms: u64,
    pub lease_secs: u64,
}
