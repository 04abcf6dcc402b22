use clap::{Args, Parser, Subcommand};
use jobledger::config::{AppConfig, LogFormat};
use jobledger::domain::ports::{DatasetImporter, ReadStore, TransactionalStore};
use jobledger::infrastructure::in_memory::InMemoryStore;
use jobledger::infrastructure::sqlite::SqliteStore;
use jobledger::interfaces::csv::seed_reader::load_dataset;
use jobledger::interfaces::http::{AppState, create_router};
use jobledger::telemetry::init_logging;
use miette::{IntoDiagnostic, Result, miette};
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, global = true, env = "JOBLEDGER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Import CSV seed files into a SQLite database
    Seed(SeedArgs),
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// SQLite URL. Without one the service runs on an in-memory store.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Directory holding profiles.csv, contracts.csv and jobs.csv, imported at startup
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Expected value of the admin_key header
    #[arg(long)]
    admin_key: Option<String>,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Args)]
struct SeedArgs {
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Directory holding profiles.csv, contracts.csv and jobs.csv
    dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref()).into_diagnostic()?;

    match cli.command {
        Command::Serve(args) => {
            apply_overrides(&mut config, args);
            init_logging(&config.logging).into_diagnostic()?;
            match config.database.url {
                Some(_) => {
                    let store = SqliteStore::connect(&config.database)
                        .await
                        .into_diagnostic()?;
                    serve(store, config).await
                }
                None => serve(InMemoryStore::new(), config).await,
            }
        }
        Command::Seed(args) => {
            if let Some(url) = args.database_url {
                config.database.url = Some(url);
            }
            if config.database.url.is_none() {
                return Err(miette!("seed needs --database-url or database.url"));
            }
            init_logging(&config.logging).into_diagnostic()?;
            let store = SqliteStore::connect(&config.database)
                .await
                .into_diagnostic()?;
            let summary = seed(&store, &args.dir).await?;
            println!(
                "Imported {} profiles, {} contracts, {} jobs",
                summary.profiles, summary.contracts, summary.jobs
            );
            Ok(())
        }
    }
}

fn apply_overrides(config: &mut AppConfig, args: ServeArgs) {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }
    if let Some(dir) = args.seed {
        config.seed = Some(dir);
    }
    if let Some(key) = args.admin_key {
        config.admin.api_key = Some(key);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }
}

async fn seed<S: DatasetImporter>(
    store: &S,
    dir: &Path,
) -> Result<jobledger::domain::dataset::ImportSummary> {
    let dataset = load_dataset(dir).into_diagnostic()?;
    store.import(dataset).await.into_diagnostic()
}

async fn serve<S>(store: S, config: AppConfig) -> Result<()>
where
    S: ReadStore + TransactionalStore + DatasetImporter + Clone + 'static,
{
    if let Some(dir) = &config.seed {
        let summary = seed(&store, dir).await?;
        info!(?summary, dir = %dir.display(), "seed data imported");
    }
    if config.admin.api_key.is_none() {
        warn!("no admin key configured; admin endpoints will refuse every request");
    }

    let addr = config.server.socket_addr().into_diagnostic()?;
    let app = create_router(AppState::new(store, config.admin.api_key));
    let listener = TcpListener::bind(addr).await.into_diagnostic()?;
    info!(%addr, "jobledger listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;
    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
