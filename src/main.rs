//! Branch Compare - compare a branch against another reference
//!
//! # Usage
//! ```bash
//! branch-compare /path/to/repository         # Start the API server
//! branch-compare . --default-mode branch     # Historical comparisons by default
//! branch-compare show feature --repo .       # Print one comparison as JSON
//! ```

mod compare;
mod config;
mod error;
mod git;
mod models;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::{Args, Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{CompareConfig, DEFAULT_PAGE_SIZE};
use git::GitRepository;
use models::ComparisonMode;
use routes::AppState;

/// Branch Compare - see what a branch has and lacks relative to another ref
#[derive(Parser)]
#[command(name = "branch-compare")]
#[command(about = "Compare git branches over a small HTTP API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the git repository
    #[arg(value_name = "REPO_PATH")]
    repo_path: Option<String>,

    /// Port to run the server on
    #[arg(short, long, default_value = "3001", env = "BRANCH_COMPARE_PORT")]
    port: u16,

    #[command(flatten)]
    compare: CompareArgs,
}

#[derive(Args)]
struct CompareArgs {
    /// File holding the per-branch comparison choices
    #[arg(long, global = true, env = "BRANCH_COMPARE_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Commits per page when a request gives no limit (0 = everything)
    #[arg(long, global = true, default_value_t = DEFAULT_PAGE_SIZE, env = "BRANCH_COMPARE_PAGE_SIZE")]
    page_size: usize,

    /// Mode for branches without a stored comparison: working, branch or tag
    #[arg(long, global = true, default_value = "working", env = "BRANCH_COMPARE_DEFAULT_MODE")]
    default_mode: ComparisonMode,

    /// Keep comparison choices in memory only
    #[arg(long, global = true, env = "BRANCH_COMPARE_EPHEMERAL")]
    ephemeral: bool,
}

impl CompareArgs {
    fn config(&self) -> CompareConfig {
        CompareConfig {
            state_file: self.state_file.clone(),
            page_size: self.page_size,
            default_mode: self.default_mode,
            persist: !self.ephemeral,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the comparison of one branch as JSON and exit
    Show {
        /// Branch to compare (defaults to the checked-out branch)
        branch: Option<String>,

        /// Path to the git repository
        #[arg(long, default_value = ".")]
        repo: String,

        /// Commits per side in the report
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn open_repository(repo_path: &str) -> Arc<GitRepository> {
    match GitRepository::open(repo_path) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            eprintln!("✗ Failed to open repository: {}", e);
            eprintln!("  Path: {}", repo_path);
            std::process::exit(1);
        }
    }
}

async fn handle_show(
    repo_path: &str,
    branch: Option<&str>,
    limit: Option<usize>,
    config: CompareConfig,
) -> anyhow::Result<()> {
    let limit = config.page_limit(limit);
    let state = AppState::new(open_repository(repo_path), config)?;

    let mut node = state.node(branch).await?;
    let revision = state.refresh.revision(&node.id());
    let report = node.report(revision, limit).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (quieter for production)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = cli.compare.config();

    if let Some(Commands::Show { branch, repo, limit }) = cli.command {
        return handle_show(&repo, branch.as_deref(), limit, config).await;
    }

    let repo_path = cli.repo_path.unwrap_or_else(|| ".".to_string());
    let repo = open_repository(&repo_path);
    let canonical_path = repo.path.clone();
    let default_mode = config.default_mode;

    let state = match AppState::new(repo, config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("✗ Failed to set up comparison state: {}", e);
            std::process::exit(1);
        }
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Bind to the port
    let addr = format!("127.0.0.1:{}", cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to port {}: {}", cli.port, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    // Print startup message
    let url = format!("http://127.0.0.1:{}", cli.port);
    println!();
    println!("  ┌─────────────────────────────────────────────┐");
    println!("  │               Branch Compare                │");
    println!("  └─────────────────────────────────────────────┘");
    println!();
    println!("  Repository:   {}", canonical_path);
    println!("  API:          {}/api/v1/compare", url);
    println!("  Default mode: {}", default_mode);
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
        println!("\n  Shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
