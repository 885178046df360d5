use crate::{
    auth::AuthConfig,
    axum_http::{default_routers, routers},
    config::config_model::{BackendServer, DotEnvyConfig},
    usecases::{
        billing_webhooks::BillingWebhookUseCase, courses::CourseUseCase,
        entitlements::EntitlementUseCase, marketplace::MarketplaceUseCase,
        study_type_contents::StudyTypeContentUseCase,
    },
};
use anyhow::Result;
use axum::{
    Extension, Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use crates::{
    domain::repositories::{
        chapter_notes::ChapterNotesRepository, courses::CourseRepository,
        marketplace::MarketplaceRepository, payment_records::PaymentRecordRepository,
        study_type_contents::StudyTypeContentRepository, users::UserRepository,
    },
    generation::ContentGenerators,
    infra::{
        ai::gemini_client::{GeminiClient, GeminiConfig},
        db::{
            postgres::postgres_connection::PgPoolSquad,
            repositories::{
                chapter_notes::ChapterNotesPostgres, courses::CoursePostgres,
                job::JobPostgres, marketplace::MarketplacePostgres,
                payment_records::PaymentRecordPostgres,
                study_type_contents::StudyTypeContentPostgres, users::UserPostgres,
            },
        },
    },
    payments::stripe_client::StripeWebhookVerifier,
    workflow::JobQueue,
};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// Every use case the API serves, over whichever repositories back them.
pub struct AppUseCases<U, C, N, S, M, P>
where
    U: UserRepository + Send + Sync + 'static,
    C: CourseRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
    M: MarketplaceRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
{
    pub entitlements: Arc<EntitlementUseCase<U>>,
    pub courses: Arc<CourseUseCase<C, N, S, U>>,
    pub study_contents: Arc<StudyTypeContentUseCase<C, S>>,
    pub marketplace: Arc<MarketplaceUseCase<C, M, N, S>>,
    pub billing_webhooks: Arc<BillingWebhookUseCase<U, P>>,
}

pub fn app<U, C, N, S, M, P>(
    usecases: AppUseCases<U, C, N, S, M, P>,
    auth_config: Arc<AuthConfig>,
    server: &BackendServer,
) -> Result<Router>
where
    U: UserRepository + Send + Sync + 'static,
    C: CourseRepository + Send + Sync + 'static,
    N: ChapterNotesRepository + Send + Sync + 'static,
    S: StudyTypeContentRepository + Send + Sync + 'static,
    M: MarketplaceRepository + Send + Sync + 'static,
    P: PaymentRecordRepository + Send + Sync + 'static,
{
    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest(
            "/api/v1/users",
            routers::users::routes(Arc::clone(&usecases.entitlements)),
        )
        .nest(
            "/api/v1/credits",
            routers::credits::routes(Arc::clone(&usecases.entitlements)),
        )
        .nest(
            "/api/v1/courses",
            routers::courses::routes(usecases.courses)
                .merge(routers::study_content::routes(usecases.study_contents)),
        )
        .nest(
            "/api/v1/marketplace",
            routers::marketplace::routes(usecases.marketplace),
        )
        .nest(
            "/api/v1/payments",
            routers::payments::routes(usecases.billing_webhooks),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(Extension(auth_config))
        .layer(TimeoutLayer::new(Duration::from_secs(server.timeout)))
        .layer(RequestBodyLimitLayer::new(
            (server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let user_repository = Arc::new(UserPostgres::new(Arc::clone(&db_pool)));
    let course_repository = Arc::new(CoursePostgres::new(Arc::clone(&db_pool)));
    let chapter_notes_repository = Arc::new(ChapterNotesPostgres::new(Arc::clone(&db_pool)));
    let study_type_content_repository =
        Arc::new(StudyTypeContentPostgres::new(Arc::clone(&db_pool)));
    let marketplace_repository = Arc::new(MarketplacePostgres::new(Arc::clone(&db_pool)));
    let payment_record_repository = Arc::new(PaymentRecordPostgres::new(Arc::clone(&db_pool)));
    let job_queue = JobQueue::new(
        Arc::new(JobPostgres::new(Arc::clone(&db_pool))),
        config.jobs.max_attempts,
    );

    let gemini = GeminiClient::new(GeminiConfig {
        api_key: config.gemini.api_key.clone(),
        model: config.gemini.model.clone(),
        base_url: config.gemini.base_url.clone(),
        timeout: Duration::from_secs(config.gemini.timeout_secs),
    })?;
    let generators = ContentGenerators::uniform(Arc::new(gemini));

    let verifier = match &config.stripe.webhook_secret {
        Some(secret) => Some(StripeWebhookVerifier::new(secret.clone())),
        None => {
            warn!(stage = %config.stage, "payments: STRIPE_WEBHOOK_SECRET unset, webhooks are not verified");
            None
        }
    };

    let entitlements = Arc::new(EntitlementUseCase::new(
        Arc::clone(&user_repository),
        config.credits.default_credits,
    ));
    let usecases = AppUseCases {
        courses: Arc::new(CourseUseCase::new(
            Arc::clone(&course_repository),
            Arc::clone(&chapter_notes_repository),
            Arc::clone(&study_type_content_repository),
            Arc::clone(&entitlements),
            generators,
            job_queue.clone(),
        )),
        study_contents: Arc::new(StudyTypeContentUseCase::new(
            Arc::clone(&course_repository),
            Arc::clone(&study_type_content_repository),
            job_queue,
        )),
        marketplace: Arc::new(MarketplaceUseCase::new(
            Arc::clone(&course_repository),
            marketplace_repository,
            chapter_notes_repository,
            study_type_content_repository,
        )),
        billing_webhooks: Arc::new(BillingWebhookUseCase::new(
            Arc::clone(&entitlements),
            payment_record_repository,
            verifier,
        )),
        entitlements,
    };

    let auth_config = Arc::new(AuthConfig::new(&config.auth.jwt_secret));
    let app = app(usecases, auth_config, &config.backend_server)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.backend_server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to install CTRL+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
