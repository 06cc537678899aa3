//! Speech-to-text seam. The dialogue core only ever sees the resulting text.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parlance_core::config::{SpeechBackend, SpeechConfig};
use parlance_core::SpeechError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioSource {
    File(PathBuf),
    Wav(Vec<u8>),
}

impl AudioSource {
    pub async fn load(&self) -> Result<Vec<u8>, SpeechError> {
        match self {
            Self::File(path) => tokio::fs::read(path).await.map_err(|error| {
                SpeechError::AudioInput(format!("`{}`: {error}", path.display()))
            }),
            Self::Wav(bytes) => Ok(bytes.clone()),
        }
    }
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Returns the recognized text, `SpeechError::NotUnderstood` when nothing
    /// intelligible was heard, `SpeechError::AudioInput` when the audio cannot
    /// be read, or `SpeechError::Service` on transport failures.
    async fn recognize(&self, audio: &AudioSource) -> Result<String, SpeechError>;
}

/// Trims a raw transcript; a blank transcript means the audio was not understood.
pub fn normalize_transcript(raw: &str) -> Result<String, SpeechError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(SpeechError::NotUnderstood);
    }
    Ok(text.to_string())
}

/// Builds the recognizer for the configured backend.
pub fn recognizer_from_config(
    config: &SpeechConfig,
) -> Result<Arc<dyn SpeechRecognizer>, SpeechError> {
    Ok(Arc::new(HttpSpeechRecognizer::from_config(config)?))
}

/// Posts WAV audio to a transcription server. `backend` picks the endpoint
/// and form layout: OpenAI-compatible `/audio/transcriptions` or the
/// whisper.cpp server's `/inference`.
#[derive(Clone, Debug)]
pub struct HttpSpeechRecognizer {
    backend: SpeechBackend,
    base_url: String,
    api_key: Option<SecretString>,
    model: String,
    language: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl HttpSpeechRecognizer {
    pub fn from_config(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| SpeechError::Service(error.to_string()))?;

        Ok(Self {
            backend: config.backend,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
            client,
        })
    }

    pub fn backend(&self) -> SpeechBackend {
        self.backend
    }
}

#[async_trait]
impl SpeechRecognizer for HttpSpeechRecognizer {
    async fn recognize(&self, audio: &AudioSource) -> Result<String, SpeechError> {
        let wav = audio.load().await?;
        if wav.is_empty() {
            return Err(SpeechError::NotUnderstood);
        }

        let part = reqwest::multipart::Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|error| SpeechError::Service(error.to_string()))?;
        let (url, mut form) = match self.backend {
            SpeechBackend::OpenAi => (
                format!("{}/audio/transcriptions", self.base_url),
                reqwest::multipart::Form::new()
                    .part("file", part)
                    .text("model", self.model.clone()),
            ),
            SpeechBackend::WhisperCpp => (
                format!("{}/inference", self.base_url),
                reqwest::multipart::Form::new()
                    .part("file", part)
                    .text("response_format", "json"),
            ),
        };
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        let mut request = self.client.post(&url).multipart(form);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response =
            request.send().await.map_err(|error| SpeechError::Service(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Service(format!("HTTP {status}: {}", body.trim())));
        }

        let payload: TranscriptionResponse =
            response.json().await.map_err(|error| SpeechError::Service(error.to_string()))?;
        normalize_transcript(&payload.text)
    }
}
