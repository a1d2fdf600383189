//! Kindred CLI and REST API entry point.
//!
//! Binary name: `kindred`
//!
//! Parses CLI arguments, initializes services, then either starts the REST
//! API server or runs a management command.

mod http;
mod state;

use clap::{Parser, Subcommand};

use kindred_core::repository::user::UserRepository;
use kindred_infra::config::resolve_data_dir;
use kindred_infra::sqlite::pool::DatabasePool;
use kindred_infra::sqlite::user::SqliteUserRepository;
use kindred_types::identity::NewUser;

use http::extractors::auth::issue_token;
use state::AppState;

#[derive(Parser)]
#[command(name = "kindred", about = "Messaging backend with AI companions")]
struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8000)]
        port: u16,

        /// Export spans via OpenTelemetry (stdout exporter)
        #[arg(long)]
        otel: bool,
    },

    /// Create a user and print their API token
    CreateUser {
        username: String,

        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,kindred=debug",
        _ => "trace",
    };
    let otel = matches!(&cli.command, Commands::Serve { otel: true, .. });
    kindred_observe::tracing_setup::init_tracing(filter, otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    match cli.command {
        Commands::Serve { host, port, .. } => {
            // Initialize application state (DB, vector store, embedder, model)
            let state = AppState::init().await?;

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Kindred API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::CreateUser { username, email } => {
            // Management path: only the relational store is needed, so the
            // embedder and model are never initialized here.
            let data_dir = resolve_data_dir();
            tokio::fs::create_dir_all(&data_dir).await?;
            let db_url = format!(
                "sqlite://{}?mode=rwc",
                data_dir.join("kindred.db").display()
            );
            let pool = DatabasePool::new(&db_url).await?;

            let users = SqliteUserRepository::new(pool.clone());
            let user = users.create(&NewUser { username, email }).await?;
            let token = issue_token(&pool, user.id).await?;

            println!();
            println!(
                "  {} User '{}' created (id {})",
                console::style("✓").green(),
                console::style(&user.username).cyan(),
                user.id
            );
            println!();
            println!("  API token (save this -- it won't be shown again):");
            println!();
            println!("  {}", console::style(&token).yellow().bold());
            println!();
        }
    }

    kindred_observe::tracing_setup::shutdown_tracing();
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
