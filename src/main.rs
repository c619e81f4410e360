use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrumboard::{api, db, services};

#[derive(Parser)]
#[command(name = "scrumboard")]
#[command(about = "Scrum work-item tracking: projects, sprints, tasks, teams and reports")]
struct Cli {
    /// SQLite database file (defaults to the platform data directory)
    #[arg(long, global = true, env = "SCRUMBOARD_DB")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
    /// Ingest a CSV, JSON or Excel file of work items
    Import {
        file: PathBuf,
    },
    /// Write the built-in config defaults as global rows
    SeedConfig,
}

fn open_database(path: Option<PathBuf>) -> anyhow::Result<db::Database> {
    let db = match path {
        Some(path) => db::Database::open(path)?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(db: db::Database, host: &str, port: u16) -> anyhow::Result<()> {
    let app = api::create_router(db);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!("scrumboard listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "scrumboard=debug,scrumboard_core=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let db = open_database(cli.database)?;

    match cli.command {
        Some(Commands::Serve { host, port }) => serve(db, &host, port).await?,
        Some(Commands::Import { file }) => {
            let count = services::ingestion::import_file(&db, &file)?;
            println!("Ingested {} work items from {}", count, file.display());
        }
        Some(Commands::SeedConfig) => {
            let count = services::config::seed_global_defaults(&db)?;
            println!("Seeded {} global config keys", count);
        }
        None => serve(db, "127.0.0.1", 8000).await?,
    }

    Ok(())
}
