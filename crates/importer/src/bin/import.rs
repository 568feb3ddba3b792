use clap::{Parser, Subcommand};
use engine::{AggregationFacade, Database, EventRepository, InMemoryRepository};
use importer::{EventSnapshot, ImporterError, SnapshotLoader, SnapshotValidator};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "event-import")]
#[command(about = "Event reward and evaluation snapshot importer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a snapshot file and load it into the database
    Snapshot {
        file: PathBuf,

        #[arg(long)]
        validate_only: bool,

        /// Load into an in-memory store and print the resulting leaderboard
        #[arg(long, conflicts_with = "validate_only")]
        dry_run: bool,
    },
    /// Print an event's reward leaderboard
    Leaderboard {
        event_id: Uuid,

        #[arg(long)]
        top: Option<i64>,

        #[arg(long)]
        json: bool,
    },
    /// Print an event's weighted grading table
    Grading {
        event_id: Uuid,

        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("import={},importer={},engine={}", log_level, log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Snapshot {
            file,
            validate_only,
            dry_run,
        } => {
            handle_snapshot_import(file, validate_only, dry_run, cli.database_url.as_deref())
                .await?;
        }
        Commands::Leaderboard {
            event_id,
            top,
            json,
        } => {
            let facade = AggregationFacade::new(connect(cli.database_url.as_deref()).await?);
            print_leaderboard(&facade, event_id, top, json).await?;
        }
        Commands::Grading { event_id, json } => {
            let facade = AggregationFacade::new(connect(cli.database_url.as_deref()).await?);
            print_grading(&facade, event_id, json).await?;
        }
    }

    Ok(())
}

async fn handle_snapshot_import(
    file: PathBuf,
    validate_only: bool,
    dry_run: bool,
    database_url: Option<&str>,
) -> importer::Result<()> {
    tracing::info!("Loading snapshot from: {}", file.display());

    let snapshot = EventSnapshot::from_path(&file).await?;

    tracing::info!(
        "Loaded event: {} (v{}, {} teams)",
        snapshot.name,
        snapshot.format_version,
        snapshot.teams.len()
    );

    tracing::info!("Validating snapshot...");
    let validation_report = SnapshotValidator::validate(&snapshot)?;
    validation_report.log_warnings();
    tracing::info!("Validation successful");

    if validate_only {
        return Ok(());
    }

    if dry_run {
        let facade = AggregationFacade::new(InMemoryRepository::new());
        let summary = SnapshotLoader::new(facade.repository())
            .load(&snapshot)
            .await?;
        tracing::info!("Dry run loaded {:?}", summary);
        return print_leaderboard(&facade, snapshot.event_id, None, false).await;
    }

    let repo = connect(database_url).await?;
    let summary = SnapshotLoader::new(&repo).load(&snapshot).await?;
    tracing::info!(
        "Import completed: {} teams, {} grants, {} votes, {} scores",
        summary.teams,
        summary.grants,
        summary.votes,
        summary.scores
    );

    Ok(())
}

async fn connect(database_url: Option<&str>) -> importer::Result<engine::PgRepository> {
    let database_url = database_url.ok_or_else(|| {
        ImporterError::ConfigError("DATABASE_URL is required (or pass --database-url)".to_string())
    })?;

    tracing::info!("Connecting to database...");
    let db = Database::new(database_url).await?;
    db.run_migrations().await?;

    Ok(db.repository())
}

async fn print_leaderboard<R: EventRepository>(
    facade: &AggregationFacade<R>,
    event_id: Uuid,
    top: Option<i64>,
    json: bool,
) -> importer::Result<()> {
    let rows = facade.leaderboard(event_id, top).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        tracing::warn!("Event {} has no teams", event_id);
    }
    for row in &rows {
        let badges: Vec<&str> = row.badges.iter().map(|b| b.award_name.as_str()).collect();
        let grading = row
            .grading_score
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "-".to_string());
        tracing::info!(
            "{:>3}. {:<30} {:>8} VR  grade {:>6}  {}",
            row.rank,
            row.team_name,
            row.total_reward,
            grading,
            badges.join(", ")
        );
    }

    Ok(())
}

async fn print_grading<R: EventRepository>(
    facade: &AggregationFacade<R>,
    event_id: Uuid,
    json: bool,
) -> importer::Result<()> {
    let report = facade.grading_table(event_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !report.balanced {
        tracing::warn!(
            "Criterion weights sum to {:.2}, not 100; averages are re-normalised",
            report.total_weight
        );
    }
    for (idx, result) in report.results.iter().enumerate() {
        tracing::info!(
            "{:>3}. {:<30} overall {:>6.2}  ({} reviewers)",
            idx + 1,
            result.team_name,
            result.overall_average,
            result.committee_scores.len()
        );
        for criterion in &result.criteria {
            let average = criterion
                .average
                .map(|a| format!("{:.2}", a))
                .unwrap_or_else(|| "-".to_string());
            tracing::info!(
                "       {:<24} {:>6} / {:<6} weight {:>5.1}%",
                criterion.name,
                average,
                criterion.max_score,
                criterion.weight_percentage
            );
        }
    }

    Ok(())
}
