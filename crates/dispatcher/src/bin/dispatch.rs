use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dispatcher::channel::{DEFAULT_PROVIDER, WebhookChannel};
use dispatcher::scheduler::{DispatchScheduler, SchedulerConfig};
use dispatcher::store::PgDispatchStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "embark-dispatch")]
#[command(about = "Embark dispatch scheduler and maintenance tool", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args)]
struct ChannelArgs {
    #[arg(long, env = "CHANNEL_API_URL")]
    channel_api_url: String,

    #[arg(long, env = "CHANNEL_PROVIDER", default_value = DEFAULT_PROVIDER)]
    channel_provider: String,

    #[arg(long, env = "DISPATCH_MAX_ATTEMPTS", default_value_t = 3)]
    max_attempts: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dispatch loop in the foreground
    Run {
        #[command(flatten)]
        channel: ChannelArgs,

        #[arg(long, env = "DISPATCH_INTERVAL_SECS", default_value_t = 60)]
        interval_secs: u64,
    },
    /// Process due tasks once and exit
    Tick {
        #[command(flatten)]
        channel: ChannelArgs,
    },
    /// Rewrite legacy media_refs encodings into proper JSON arrays
    NormalizeMedia,
    /// Rebuild ranking aggregates from the completion ledger
    Reconcile {
        #[arg(long)]
        project: Option<Uuid>,
    },
}

fn build_scheduler(
    pool: sqlx::PgPool,
    channel: ChannelArgs,
    interval_secs: u64,
) -> DispatchScheduler<PgDispatchStore, WebhookChannel> {
    let store = PgDispatchStore::new(pool.clone());
    let outbound = WebhookChannel::new(pool, channel.channel_api_url, channel.channel_provider);

    DispatchScheduler::new(
        store,
        outbound,
        SchedulerConfig {
            interval: Duration::from_secs(interval_secs),
            max_attempts: channel.max_attempts,
            ..SchedulerConfig::default()
        },
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("dispatch={},dispatcher={},storage={}", log_level, log_level, log_level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&cli.database_url)
        .await?;

    match cli.command {
        Commands::Run {
            channel,
            interval_secs,
        } => {
            let scheduler = Arc::new(build_scheduler(pool, channel, interval_secs));
            scheduler.run().await;
        }
        Commands::Tick { channel } => {
            let scheduler = build_scheduler(pool, channel, 60);
            let report = scheduler.tick().await?;
            if report.lease_held_elsewhere {
                println!("tick skipped: dispatch lease held elsewhere");
            } else {
                println!(
                    "processed {} task(s): {} delivered, {} failed",
                    report.tasks_processed, report.delivered, report.failed
                );
            }
        }
        Commands::NormalizeMedia => {
            let rewritten = storage::services::media::normalize_legacy_media_refs(&pool).await?;
            println!("normalized media_refs on {rewritten} row(s)");
        }
        Commands::Reconcile { project } => {
            let rebuilt = storage::services::reconcile::rebuild_aggregates(&pool, project).await?;
            println!("rebuilt {rebuilt} ranking aggregate(s)");
        }
    }

    Ok(())
}
