//! HTTP model adapters for an Ollama-style or OpenAI-compatible endpoint.
//!
//! A single [`HttpModelClient`] serves both the conversational and the
//! generative seam. Requests are sent once; retry policy belongs to the caller.

use std::time::Duration;

use async_trait::async_trait;
use parlance_core::config::{ModelConfig, ModelProvider};
use parlance_core::{ConversationTurn, MaxLength, ModelError};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm::{ConversationResult, ConversationalModel, GenerativeModel};

#[derive(Clone, Debug)]
pub struct HttpModelClient {
    provider: ModelProvider,
    base_url: String,
    api_key: Option<SecretString>,
    conversational_model: String,
    generative_model: String,
    client: reqwest::Client,
}

impl HttpModelClient {
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ModelError::Transport(error.to_string()))?;

        Ok(Self {
            provider: config.provider,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            conversational_model: config.conversational_model.clone(),
            generative_model: config.generative_model.clone(),
            client,
        })
    }

    async fn post(&self, model: &str, path: &str, body: Value) -> Result<Value, ModelError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| classify_send_error(model, error))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Unavailable {
                model: model.to_string(),
                message: format!("HTTP {status}: {}", body.trim()),
            });
        }

        response.json::<Value>().await.map_err(|error| ModelError::MalformedResponse(error.to_string()))
    }
}

fn classify_send_error(model: &str, error: reqwest::Error) -> ModelError {
    if error.is_connect() || error.is_timeout() {
        ModelError::Unavailable { model: model.to_string(), message: error.to_string() }
    } else {
        ModelError::Transport(error.to_string())
    }
}

#[async_trait]
impl ConversationalModel for HttpModelClient {
    fn name(&self) -> &str {
        &self.conversational_model
    }

    async fn converse(&self, turn: &ConversationTurn) -> Result<Vec<ConversationResult>, ModelError> {
        let messages = chat_messages(turn);
        match self.provider {
            ModelProvider::Ollama => {
                let body = json!({
                    "model": self.conversational_model,
                    "messages": messages,
                    "stream": false,
                });
                let value = self.post(&self.conversational_model, "/api/chat", body).await?;
                parse_ollama_chat(value)
            }
            ModelProvider::OpenAi => {
                let body = json!({
                    "model": self.conversational_model,
                    "messages": messages,
                });
                let value = self.post(&self.conversational_model, "/chat/completions", body).await?;
                parse_openai_chat(value)
            }
        }
    }
}

#[async_trait]
impl GenerativeModel for HttpModelClient {
    fn name(&self) -> &str {
        &self.generative_model
    }

    async fn generate(&self, prompt: &str, max_length: MaxLength) -> Result<String, ModelError> {
        match self.provider {
            ModelProvider::Ollama => {
                let body = json!({
                    "model": self.generative_model,
                    "prompt": prompt,
                    "stream": false,
                    "options": { "num_predict": max_length.get() },
                });
                let value = self.post(&self.generative_model, "/api/generate", body).await?;
                parse_ollama_generate(value)
            }
            ModelProvider::OpenAi => {
                let body = json!({
                    "model": self.generative_model,
                    "prompt": prompt,
                    "max_tokens": max_length.get(),
                    "n": 1,
                });
                let value = self.post(&self.generative_model, "/completions", body).await?;
                parse_openai_completion(value)
            }
        }
    }
}

fn chat_messages(turn: &ConversationTurn) -> Vec<Value> {
    let mut messages = Vec::with_capacity(turn.history.len() * 2 + 1);
    for exchange in &turn.history {
        messages.push(json!({ "role": "user", "content": exchange.user }));
        messages.push(json!({ "role": "assistant", "content": exchange.assistant }));
    }
    messages.push(json!({ "role": "user", "content": turn.utterance.as_str() }));
    messages
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChatChoice>,
}

#[derive(Deserialize)]
struct OpenAiChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct OpenAiCompletionResponse {
    choices: Vec<OpenAiCompletionChoice>,
}

#[derive(Deserialize)]
struct OpenAiCompletionChoice {
    text: String,
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, ModelError> {
    serde_json::from_value(value).map_err(|error| ModelError::MalformedResponse(error.to_string()))
}

fn parse_ollama_chat(value: Value) -> Result<Vec<ConversationResult>, ModelError> {
    let response: OllamaChatResponse = decode(value)?;
    Ok(vec![ConversationResult::new(response.message.content)])
}

fn parse_openai_chat(value: Value) -> Result<Vec<ConversationResult>, ModelError> {
    let response: OpenAiChatResponse = decode(value)?;
    Ok(response
        .choices
        .into_iter()
        .map(|choice| ConversationResult::new(choice.message.content))
        .collect())
}

fn parse_ollama_generate(value: Value) -> Result<String, ModelError> {
    let response: OllamaGenerateResponse = decode(value)?;
    Ok(response.response)
}

fn parse_openai_completion(value: Value) -> Result<String, ModelError> {
    let response: OpenAiCompletionResponse = decode(value)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.text)
        .ok_or_else(|| ModelError::MalformedResponse("completion returned no choices".to_string()))
}
