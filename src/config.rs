use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub candidate: CandidateConfig,
    pub generation: GenerationConfig,
    pub store: StoreConfig,
    pub speech: SpeechConfig,
    pub video: VideoConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct CandidateConfig {
    /// Display name used in the interviewer's greeting
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key (never stored in the file)
    pub api_key_env: String,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Transcript store base URL; empty selects the in-memory store
    pub base_url: String,
    /// Environment variable holding the opaque auth credential
    pub auth_token_env: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    /// How long one capture waits for a recognized utterance
    pub capture_timeout_secs: u64,
    /// Pacing rate for interviewer utterances
    pub words_per_minute: u32,
}

#[derive(Debug, Deserialize)]
pub struct VideoConfig {
    /// When false the motion detector runs degraded (constant 0)
    pub enabled: bool,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
