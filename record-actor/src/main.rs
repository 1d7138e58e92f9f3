use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use record_actor::{JsonFileStore, cli::Cli, http, logging, spawn_actor};

const APP_NAME: &str = "record-actor";
const DATA_FILE_NAME: &str = "records.json";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(log_file) = logging::init_tracing(&cli.log_level, cli.log_dir.as_deref())? {
        info!(log_file = %log_file.display(), "logging to file");
    }

    let data_file = match &cli.data_file {
        Some(path) => path.clone(),
        None => logging::app_data_dir(APP_NAME)
            .context("failed to resolve application data directory")?
            .join(DATA_FILE_NAME),
    };
    let store = JsonFileStore::open(&data_file)
        .with_context(|| format!("failed to open record file {}", data_file.display()))?;
    let data_path = store.path().to_path_buf();

    let (cancel_tx, cancel_rx) = crossbeam_channel::bounded(1);
    let (actor, worker) = spawn_actor(store, cancel_rx).context("failed to spawn record actor")?;
    let actor = match cli.call_timeout() {
        Some(timeout) => actor.with_timeout(timeout),
        None => actor,
    };

    let listener = TcpListener::bind(cli.listen).await?;
    info!(
        addr = %listener.local_addr()?,
        data_file = %data_path.display(),
        "record service listening"
    );

    axum::serve(listener, http::router(actor))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    let _ = cancel_tx.send(());
    tokio::task::spawn_blocking(move || worker.join())
        .await?
        .map_err(|_| anyhow!("record actor thread panicked"))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = ?err, "failed to install ctrl-c handler");
    }
    info!("shutting down");
}
