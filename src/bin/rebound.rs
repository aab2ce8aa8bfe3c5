//! rebound CLI: run the queue server or operate on queues directly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rebound::config::Config;
use rebound::db::Db;
use rebound::engine::{Engine, EngineConfig, MAX_TTR};
use rebound::model::{JobId, NewJob};
use rebound::telemetry::{TelemetryConfig, init_telemetry};
use secrecy::ExposeSecret;
use tracing::info;

#[derive(Parser)]
#[command(name = "rebound", version, about = "Durable job queue")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP queue server
    Serve {
        /// Address to listen on (overrides LISTEN_ADDR)
        #[arg(long)]
        listen: Option<SocketAddr>,
        /// Lease for jobs enqueued without a TTR, e.g. "2m" (overrides DEFAULT_TTR)
        #[arg(long, value_parser = humantime::parse_duration)]
        default_ttr: Option<Duration>,
    },
    /// Create or upgrade the database schema
    Migrate,
    /// Job operations against the configured database
    Job {
        #[command(subcommand)]
        action: JobAction,
    },
}

#[derive(Subcommand)]
enum JobAction {
    /// Enqueue a job
    Put {
        queue: String,
        body: String,
        /// Higher is served first
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i64,
        /// Time before the job becomes visible, e.g. "10s"
        #[arg(long, value_parser = humantime::parse_duration)]
        delay: Option<Duration>,
        /// Lease granted on reservation, e.g. "2m"
        #[arg(long, value_parser = humantime::parse_duration)]
        ttr: Option<Duration>,
    },
    /// Reserve the next eligible job and print it as JSON
    Reserve { queue: String },
    /// Delete a job
    Delete { queue: String, id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Serve {
            listen,
            default_ttr,
        } => cmd_serve(config, listen, default_ttr).await,
        Command::Migrate => {
            let db = open_db(&config).await?;
            println!("Migrated {} database.", db.backend());
            Ok(())
        }
        Command::Job { action } => {
            let db = open_db(&config).await?;
            let engine = Engine::new(
                db,
                EngineConfig {
                    default_ttr: config.default_ttr,
                },
            );
            cmd_job(&engine, action).await
        }
    }
}

async fn open_db(config: &Config) -> anyhow::Result<Db> {
    let db = Db::connect(config.database_url.expose_secret(), config.max_connections).await?;
    db.migrate().await?;
    Ok(db)
}

async fn cmd_serve(
    config: Config,
    listen: Option<SocketAddr>,
    default_ttr: Option<Duration>,
) -> anyhow::Result<()> {
    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "rebound".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let db = open_db(&config).await?;
    info!(backend = db.backend(), "database ready");

    let default_ttr = default_ttr.unwrap_or(config.default_ttr);
    anyhow::ensure!(!default_ttr.is_zero(), "--default-ttr must be positive");
    anyhow::ensure!(
        default_ttr <= MAX_TTR,
        "--default-ttr must not exceed {}",
        humantime::format_duration(MAX_TTR)
    );

    let engine = Arc::new(Engine::new(db, EngineConfig { default_ttr }));
    let listener = tokio::net::TcpListener::bind(listen.unwrap_or(config.listen_addr)).await?;

    rebound::http::serve(listener, engine, rebound::http::shutdown_signal()).await?;
    Ok(())
}

async fn cmd_job(engine: &Engine<Db>, action: JobAction) -> anyhow::Result<()> {
    match action {
        JobAction::Put {
            queue,
            body,
            priority,
            delay,
            ttr,
        } => {
            let mut new = NewJob::new(queue, body).priority(priority);
            if let Some(delay) = delay {
                new = new.delay(delay);
            }
            if let Some(ttr) = ttr {
                new = new.ttr(ttr);
            }
            let id = engine.enqueue(new).await?;
            println!("{id}");
        }
        JobAction::Reserve { queue } => match engine.reserve(&queue).await? {
            Some(job) => println!("{}", serde_json::to_string_pretty(&job)?),
            None => println!("No job available in {queue:?}."),
        },
        JobAction::Delete { queue, id } => {
            let removed = engine.delete(&queue, JobId(id)).await?;
            if removed {
                println!("Deleted {id}.");
            } else {
                println!("No job {id} in {queue:?}; nothing to delete.");
            }
        }
    }
    Ok(())
}
