use anyhow::Result;
use crates::{
    domain::repositories::{
        chapter_notes::ChapterNotesRepository, courses::CourseRepository, job::JobRepository,
        study_type_contents::StudyTypeContentRepository,
    },
    generation::{ContentGenerators, SharedModel},
    infra::{
        ai::gemini_client::{GeminiClient, GeminiConfig},
        db::{
            postgres::postgres_connection,
            repositories::{
                chapter_notes::ChapterNotesPostgres, courses::CoursePostgres, job::JobPostgres,
                study_type_contents::StudyTypeContentPostgres,
            },
        },
    },
    workflow::{RetryPolicy, WorkerSettings, WorkflowRunner},
};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};
use worker::{
    axum_http, config,
    usecases::{
        generate_notes::NotesGenerationHandler,
        generate_study_type_content::StudyTypeContentHandler,
    },
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Worker exited with error: {:#}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let alerts = crates::observability::init_observability("worker")?;

    let dotenvy_env = Arc::new(config::config_loader::load()?);
    info!(worker_id = %dotenvy_env.workflow.worker_id, "ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(
        &dotenvy_env.database.url,
        dotenvy_env.database.max_connections,
    )?;
    info!("Postgres connection has been established");

    let db_pool_arc = Arc::new(postgres_pool);

    let job_repository: Arc<dyn JobRepository + Send + Sync> =
        Arc::new(JobPostgres::new(Arc::clone(&db_pool_arc)));
    let course_repository: Arc<dyn CourseRepository + Send + Sync> =
        Arc::new(CoursePostgres::new(Arc::clone(&db_pool_arc)));
    let chapter_notes_repository: Arc<dyn ChapterNotesRepository + Send + Sync> =
        Arc::new(ChapterNotesPostgres::new(Arc::clone(&db_pool_arc)));
    let study_type_content_repository: Arc<dyn StudyTypeContentRepository + Send + Sync> =
        Arc::new(StudyTypeContentPostgres::new(Arc::clone(&db_pool_arc)));

    let gemini = &dotenvy_env.gemini;
    let gemini_model = |model: &str| -> Result<SharedModel> {
        let client: SharedModel = Arc::new(GeminiClient::new(GeminiConfig {
            api_key: gemini.api_key.clone(),
            model: model.to_string(),
            base_url: gemini.base_url.clone(),
            timeout: Duration::from_secs(gemini.timeout_secs),
        })?);
        Ok(client)
    };
    let mut generators = ContentGenerators::uniform(gemini_model(&gemini.model)?);
    if let Some(notes_model) = &gemini.notes_model {
        generators = generators.with_notes_model(gemini_model(notes_model)?);
    }

    let workflow = &dotenvy_env.workflow;
    let settings = WorkerSettings {
        worker_id: workflow.worker_id.clone(),
        concurrency: workflow.concurrency,
        poll_interval: Duration::from_millis(workflow.poll_interval_ms),
        lease: Duration::from_secs(workflow.lease_secs),
        retry: RetryPolicy {
            base_delay: Duration::from_secs(workflow.backoff_base_secs),
            max_delay: Duration::from_secs(workflow.backoff_max_secs),
        },
    };

    let runner = Arc::new(
        WorkflowRunner::new(Arc::clone(&job_repository), settings)
            .register(Arc::new(NotesGenerationHandler::new(
                Arc::clone(&course_repository),
                chapter_notes_repository,
                generators.clone(),
                workflow.notes_fanout,
            )))
            .register(Arc::new(StudyTypeContentHandler::new(
                study_type_content_repository,
                generators,
            )))
            .with_alerts(alerts),
    );

    let runner_loop = tokio::spawn(runner.run());

    let server_config = Arc::clone(&dotenvy_env);
    let health_server =
        tokio::spawn(async move { axum_http::http_serve::start(server_config).await });

    info!("Worker started");

    tokio::select! {
        result = runner_loop => result??,
        result = health_server => result??,
    };
    Ok(())
}
