use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filehost::{AppState, Config, MatchMode, routes};

#[derive(Parser, Debug)]
#[command(name = "filehost")]
#[command(about = "Minimal HTTP file hosting: download, upload, list and delete")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "FILEHOST_PORT", default_value = "6040")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "FILEHOST_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Root directory to serve files from
    #[arg(
        short,
        long,
        alias = "dir",
        visible_short_alias = 'd',
        env = "FILEHOST_ROOT",
        default_value = "storage"
    )]
    root: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, env = "FILEHOST_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "FILEHOST_CONFIG")]
    config: Option<PathBuf>,

    /// Listing match mode (overrides the config file)
    #[arg(long, value_enum, env = "FILEHOST_MATCH_MODE")]
    match_mode: Option<MatchMode>,

    /// Leave dotfiles out of listings (overrides the config file)
    #[arg(long, env = "FILEHOST_EXCLUDE_HIDDEN")]
    exclude_hidden: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "filehost=debug,tower_http=debug"
    } else {
        "filehost=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if cli.port == 0 {
        return Err("Invalid port number: 0".into());
    }

    // Load config from file if provided, otherwise use defaults
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };
    if let Some(match_mode) = cli.match_mode {
        config.match_mode = match_mode;
    }
    if cli.exclude_hidden {
        config.exclude_hidden = true;
    }

    if !cli.root.exists() {
        warn!("Root directory missing, creating: {}", cli.root.display());
        std::fs::create_dir_all(&cli.root)?;
    }

    let root_dir = cli.root.canonicalize()?;

    if !root_dir.is_dir() {
        return Err(format!("Root path is not a directory: {}", root_dir.display()).into());
    }

    info!("Hosting directory: {}", root_dir.display());
    info!(
        "Listing: match_mode={:?}, exclude_hidden={}",
        config.match_mode, config.exclude_hidden
    );

    let state = AppState::with_config(root_dir, config);
    let app = routes::app(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
