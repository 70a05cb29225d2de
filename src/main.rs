use anyhow::{Context, Result};
use clap::Parser;
use interview_coach::ai::GeminiClient;
use interview_coach::motion::RemoteFrames;
use interview_coach::speech::{PacedSpeaker, RemoteCapture};
use interview_coach::store::{HttpStore, InterviewStore, MemoryStore};
use interview_coach::{create_router, AppState, Config, CoordinatorConfig, TurnCoordinator};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "interview-coach", about = "AI interview practice session service")]
struct Args {
    /// Config file path, without extension
    #[arg(long, default_value = "config/interview-coach")]
    config: String,

    /// Override the configured bind address (host:port)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);

    let http_client = reqwest::Client::new();

    let api_key = std::env::var(&cfg.generation.api_key_env)
        .with_context(|| format!("missing {} in environment", cfg.generation.api_key_env))?;
    let generator = Arc::new(GeminiClient::new(
        http_client.clone(),
        &cfg.generation.base_url,
        &cfg.generation.model,
        &api_key,
    ));

    let store: Arc<dyn InterviewStore> = if cfg.store.base_url.is_empty() {
        info!("No store URL configured; keeping interviews in memory");
        Arc::new(MemoryStore::new())
    } else {
        let auth_token = std::env::var(&cfg.store.auth_token_env).ok();
        Arc::new(HttpStore::new(http_client, &cfg.store.base_url, auth_token))
    };

    let (frame_push, frames) = RemoteFrames::channel();
    let (utterance_push, capture) =
        RemoteCapture::channel(Duration::from_secs(cfg.speech.capture_timeout_secs));
    let playback = Arc::new(PacedSpeaker::new(cfg.speech.words_per_minute));

    let coordinator = Arc::new(TurnCoordinator::new(
        CoordinatorConfig {
            candidate_name: cfg.candidate.name.clone(),
            video_enabled: cfg.video.enabled,
        },
        store,
        generator,
        Arc::new(capture),
        playback,
        Arc::new(frames),
    ));

    let state = AppState::new(coordinator, frame_push, utterance_push);
    let app = create_router(state);

    let addr = args
        .bind
        .unwrap_or_else(|| format!("{}:{}", cfg.service.http.bind, cfg.service.http.port));

    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
