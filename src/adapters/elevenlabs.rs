use crate::domain::ports::SpeechSynthesizer;
use crate::utils::error::{Result, SourceBotError};
use async_trait::async_trait;
use reqwest::Client;

pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
/// "George"
pub const DEFAULT_VOICE_ID: &str = "JBFqnCBsd6RMkjVDRZzb";
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";
const OUTPUT_FORMAT: &str = "mp3_44100_128";

#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    client: Client,
    api_key: Option<String>,
    voice_id: String,
    model_id: String,
    base_url: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: Option<String>, voice_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            voice_id: voice_id.into(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SourceBotError::config("ELEVENLABS_API_KEY is missing"))?;

        tracing::debug!(
            "🔊 Synthesizing {} chars with ElevenLabs voice {}",
            text.len(),
            self.voice_id
        );

        let response = self
            .client
            .post(format!(
                "{}/v1/text-to-speech/{}",
                self.base_url, self.voice_id
            ))
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header("xi-api-key", api_key)
            .header("Accept", "audio/mpeg")
            .json(&serde_json::json!({
                "text": text,
                "model_id": self.model_id,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceBotError::UpstreamError {
                service: "elevenlabs".to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}
