use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use googly::{AppState, ModelStore, SeetaDetector, SessionConfig, app, logging};
use ogle::{Detector, DetectorConfig};
use tokio::sync::broadcast;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Address to bind the HTTP server
    #[arg(long, default_value = "127.0.0.1:3000", env = "GOOGLY_ADDR")]
    addr: String,

    /// Directory holding the detector model bundles
    #[arg(long, default_value = "models", env = "GOOGLY_MODELS")]
    models_dir: PathBuf,

    /// Poll cadence while waiting for the first face, in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_interval_ms: u64,

    /// Detection cadence once a face is tracked, in milliseconds
    #[arg(long, default_value_t = 33)]
    frame_interval_ms: u64,

    /// Send detection boxes to the page for its debug overlay
    #[arg(long)]
    overlay: bool,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let (log_tx, _) = broadcast::channel(100);
    logging::init(log_tx.clone());

    // A failed bootstrap still starts the server: sessions report the error
    // to the page instead of stalling silently.
    let (detector, boot_error): (Option<Arc<dyn Detector>>, Option<String>) =
        match ModelStore::load(&cli.models_dir, SeetaDetector::BUNDLES).await {
            Ok(store) => match SeetaDetector::from_store(&store, DetectorConfig::default()) {
                Ok(detector) => (Some(Arc::new(detector)), None),
                Err(err) => {
                    error!("detector setup failed: {err}");
                    (None, Some(err.to_string()))
                }
            },
            Err(err) => {
                error!("model bootstrap failed: {err}");
                (None, Some(err.to_string()))
            }
        };

    let state = AppState {
        detector,
        boot_error,
        logs: log_tx,
        config: SessionConfig {
            poll_interval: Duration::from_millis(cli.poll_interval_ms),
            frame_interval: Duration::from_millis(cli.frame_interval_ms),
            overlay: cli.overlay,
        },
    };
    let app = app(state);

    let addr: SocketAddr = cli.addr.parse()?;
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
