use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_recorder::{
    create_router, AppState, Config, DefaultBackendFactory, InterruptionHub, PlatformDirectories,
    RecordingController,
};

#[derive(Parser)]
#[command(name = "voice-recorder")]
#[command(about = "Interruption-tolerant audio recorder with an HTTP control API")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/voice-recorder")]
    config: String,

    /// Override the bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the HTTP port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Loaded config: {}", cfg.service.name);
    info!("Recordings directory: {}", cfg.audio.recordings_dir().display());
    info!(
        "Capture: {:?} at {}Hz, {} channel(s)",
        cfg.audio.source, cfg.audio.sample_rate, cfg.audio.channels
    );

    let interruptions = InterruptionHub::new();
    let mut builder = RecordingController::builder(
        Arc::new(DefaultBackendFactory::new(cfg.audio.source())),
        Arc::new(PlatformDirectories::new(
            cfg.service.name.clone(),
            cfg.audio.recordings_dir(),
        )),
    )
    .backend_config(cfg.audio.backend_config())
    .interruptions(Arc::new(interruptions.clone()));
    if let Some(interval) = cfg.metering.interval() {
        builder = builder.volume_metering(interval);
    }
    let controller = builder.spawn();

    let bind = args.bind.unwrap_or(cfg.service.http.bind);
    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", bind, port);

    let app = create_router(AppState::new(controller.clone(), interruptions));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP control API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(controller))
        .await
        .context("HTTP server failed")?;

    Ok(())
}

/// Ctrl-C ends the server; a live session is stopped so its audio is kept
async fn shutdown_signal(controller: RecordingController) {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
    if controller.get_current_status().await != voice_recorder::RecordingStatus::None {
        match controller.stop().await {
            Ok(data) => info!("Saved live recording ({}ms)", data.duration_ms),
            Err(e) => info!("Live recording could not be saved: {}", e),
        }
    }
}
