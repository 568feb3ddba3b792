use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use engine::{AggregationFacade, Database};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod state;

use config::Config;
use features::{awards, dashboard, grading, ranking, rewards, teams};

#[derive(OpenApi)]
#[openapi(
    paths(
        rewards::handlers::give_reward,
        rewards::handlers::reset_reward,
        rewards::handlers::get_team_total,
        rewards::handlers::get_grantor_usage,
        awards::handlers::cast_vote,
        awards::handlers::clear_vote,
        awards::handlers::list_awards,
        awards::handlers::list_tallies,
        awards::handlers::get_tally,
        grading::handlers::list_criteria,
        grading::handlers::create_criterion,
        grading::handlers::update_criterion,
        grading::handlers::delete_criterion,
        grading::handlers::purge_orphaned_scores,
        grading::handlers::submit_score,
        grading::handlers::get_grading,
        teams::handlers::delete_team,
        ranking::handlers::get_leaderboard,
        dashboard::handlers::organizer_dashboard,
        dashboard::handlers::grantor_dashboard,
        dashboard::handlers::committee_dashboard,
    ),
    components(
        schemas(
            engine::dto::reward::GiveRewardRequest,
            engine::dto::reward::ResetRewardRequest,
            engine::dto::reward::RewardResult,
            engine::dto::reward::GrantorUsage,
            engine::dto::reward::GrantSummary,
            engine::dto::award::CastVoteRequest,
            engine::dto::award::ClearVoteRequest,
            engine::dto::award::VoteTally,
            engine::dto::award::AwardSummary,
            engine::dto::grading::CreateCriterionRequest,
            engine::dto::grading::UpdateCriterionRequest,
            engine::dto::grading::SubmitScoreRequest,
            engine::dto::grading::GradingReport,
            engine::dto::grading::GradingResult,
            engine::dto::grading::CriterionAverage,
            engine::dto::grading::CommitteeScore,
            engine::dto::grading::CriterionValue,
            engine::dto::ranking::RankingRow,
            engine::dto::ranking::Badge,
            engine::dto::dashboard::GrantorDashboard,
            engine::dto::dashboard::CommitteeDashboard,
            engine::dto::dashboard::OrganizerDashboard,
            engine::models::EvaluationCriterion,
            engine::models::CriterionScore,
            engine::models::Role,
            grading::handlers::PurgeResponse,
        )
    ),
    tags(
        (name = "rewards", description = "Virtual reward grants"),
        (name = "awards", description = "Special award voting"),
        (name = "grading", description = "Weighted evaluation criteria and scores"),
        (name = "teams", description = "Team lifecycle"),
        (name = "rankings", description = "Event leaderboard"),
        (name = "dashboards", description = "Per-role summaries"),
    )
)]
struct ApiDoc;

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

    tracing::info!("Starting event rewards API");

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

    let state = Arc::new(AggregationFacade::new(db.repository()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let app = Router::new()
        .nest("/api", features::routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state);

    let bind_address = config.bind_address();
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app).await?;

    Ok(())
}
