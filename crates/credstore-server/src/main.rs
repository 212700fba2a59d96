use anyhow::Context;
use clap::Parser;
use credstore_server::{AppState, config, create_router};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// CredStore token escalation server.
#[derive(Parser, Debug)]
#[command(name = "credstore-server", version, about)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "CREDSTORE_LISTEN")]
    listen: Option<String>,

    /// Path to the YAML policy file.
    #[arg(long = "config", env = "CREDSTORE_POLICY")]
    policy: Option<PathBuf>,

    /// Path to the PKCS#8 PEM signing key.
    #[arg(long, env = "CREDSTORE_SIGNING_KEY")]
    signing_key: Option<PathBuf>,

    /// Path to the TOML server config (defaults to $CREDSTORE_SERVER_CONFIG).
    #[arg(long)]
    config_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let args = Args::parse();
    let cfg = config::load_config(args.config_file.as_deref())?.with_overrides(
        args.listen,
        args.policy,
        args.signing_key,
    );

    let state = AppState::init(&cfg).context("failed to initialize server")?;
    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&cfg.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind))?;
    tracing::info!("credstore-server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("credstore-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
