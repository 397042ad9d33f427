use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use dispatcher::channel::WebhookChannel;
use dispatcher::scheduler::{DispatchScheduler, SchedulerConfig};
use dispatcher::store::PgDispatchStore;
use storage::Database;
use storage::services::points::PointsPolicy;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod state;

use config::Config;
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::completions::handlers::submit_completion,
        features::completions::handlers::evaluate_completion,
        features::completions::handlers::list_completions,
        features::rankings::handlers::get_user_ranking,
        features::rankings::handlers::get_user_progress,
        features::rankings::handlers::get_organization_ranking,
        features::templates::handlers::import_templates,
        features::templates::handlers::list_templates,
        features::dispatches::handlers::create_task,
        features::dispatches::handlers::list_tasks,
        features::dispatches::handlers::list_logs,
        features::webhook::handlers::receive_channel_event,
    ),
    components(
        schemas(
            storage::dto::completion::SubmitCompletionRequest,
            storage::dto::completion::EvaluateCompletionRequest,
            storage::dto::completion::EvaluationDecision,
            storage::dto::completion::CompletionResponse,
            storage::dto::ranking::UserRankingEntry,
            storage::dto::ranking::OrganizationRankingEntry,
            storage::dto::template::DayTemplateEntry,
            storage::dto::template::TemplateImportRequest,
            storage::dto::template::TemplateImportResponse,
            storage::dto::template::TemplateResponse,
            storage::dto::dispatch::CreateDispatchTaskRequest,
            storage::dto::dispatch::DispatchTaskResponse,
            storage::dto::dispatch::DispatchLogResponse,
            storage::models::CompletionStatus,
            storage::models::DispatchTaskStatus,
            storage::models::DispatchOutcome,
            storage::models::Organization,
            storage::models::User,
            storage::models::Project,
            storage::models::ProjectSubscription,
            storage::models::DayTemplate,
            storage::models::CompletionRecord,
            storage::models::RankingAggregate,
            storage::models::DispatchTask,
            storage::models::DispatchLog,
        )
    ),
    tags(
        (name = "completions", description = "Completion ledger endpoints"),
        (name = "rankings", description = "User and organization ranking endpoints"),
        (name = "templates", description = "Day template administration"),
        (name = "dispatches", description = "Outbound dispatch administration"),
        (name = "webhook", description = "Inbound channel events"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting Embark API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::new(&config.database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let state = AppState {
        db: db.clone(),
        policy: PointsPolicy::new(config.points_media_bonus),
        legacy_template_fallback: config.legacy_template_fallback,
        api_keys: ApiKeys::from_comma_separated(&config.api_keys),
    };

    let scheduler = Arc::new(DispatchScheduler::new(
        PgDispatchStore::new(db.pool().clone()),
        WebhookChannel::new(
            db.pool().clone(),
            config.channel_api_url.clone(),
            config.channel_provider.clone(),
        ),
        SchedulerConfig {
            interval: Duration::from_secs(config.dispatch_interval_secs),
            max_attempts: config.dispatch_max_attempts,
            ..SchedulerConfig::default()
        },
    ));
    tokio::spawn(scheduler.run());

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api/completions", features::completions::routes::routes(&state))
        .nest("/api/rankings", features::rankings::routes::routes())
        .nest("/api/projects", features::templates::routes::routes(&state))
        .nest("/api/dispatches", features::dispatches::routes::routes(&state))
        .nest("/api/webhook", features::webhook::routes::routes())
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .context("Failed to bind server address")?;
    axum::serve(listener, app).await?;

    Ok(())
}
