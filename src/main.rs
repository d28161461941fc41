use anyhow::{Context, Result};
use clap::Parser;
use speech_bridge::{
    create_router, AppState, Config, NatsClient, NatsConnector, NatsSynthesizer, NatsTranslator,
    SpeechServices,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Real-time interview interpretation service
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/speech-bridge")]
    config: String,

    /// Override the HTTP port from the configuration
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Speech Bridge v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let nats = NatsClient::connect(&cfg.nats.url).await?;

    let services = SpeechServices {
        connector: Arc::new(NatsConnector::new(nats.clone())),
        translator: Arc::new(NatsTranslator::new(
            nats.clone(),
            Duration::from_millis(cfg.nats.translate_timeout_ms),
        )),
        synthesizer: Arc::new(NatsSynthesizer::new(nats)),
        settings: cfg.speech.to_settings(),
        defaults: cfg.interview_defaults(),
    };
    info!(
        "Interview defaults: staff={}, client={}",
        services.defaults.staff_language, services.defaults.client_language
    );

    let app = create_router(AppState::new(services));

    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}
