use std::error::Error as _;
use std::sync::Arc;

use parlance_agent::{
    recognizer_from_config, AudioSource, ConversationalModel, DialogueOrchestrator,
    GenerativeModel, HttpModelClient,
};
use parlance_core::config::{ModelConfig, ModelProvider, SpeechBackend, SpeechConfig};
use parlance_core::{
    AppConfig, ConversationTurn, DialogueError, IntentTaxonomy, MaxLength, ModelError, Reply,
    SpeechError, Strategy,
};
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAV: &[u8] = b"RIFF$...WAVEfmt data";

fn model_config(provider: ModelProvider, server: &MockServer, api_key: Option<&str>) -> ModelConfig {
    ModelConfig {
        provider,
        base_url: server.uri(),
        api_key: api_key.map(|key| key.to_string().into()),
        conversational_model: "chat".to_string(),
        generative_model: "gen".to_string(),
        timeout_secs: 5,
    }
}

fn speech_config(backend: SpeechBackend, server: &MockServer, api_key: Option<&str>) -> SpeechConfig {
    let mut config = AppConfig::default().speech;
    config.backend = backend;
    config.base_url = server.uri();
    config.api_key = api_key.map(|key| key.to_string().into());
    config
}

fn orchestrator(client: HttpModelClient) -> DialogueOrchestrator {
    let taxonomy = IntentTaxonomy::from_json_str(r#"{"weather": ["Sunny today."]}"#)
        .expect("taxonomy should parse");
    let client = Arc::new(client);
    DialogueOrchestrator::new(Arc::new(taxonomy), client.clone(), client)
}

#[tokio::test]
async fn ollama_generate_sends_budget_as_num_predict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "gen",
            "prompt": "Tell me a joke.",
            "stream": false,
            "options": { "num_predict": 12 },
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "Why did the chicken<|endoftext|>", "done": true })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpModelClient::from_config(&model_config(ModelProvider::Ollama, &server, None))
        .expect("client");
    let reply = orchestrator(client)
        .handle_with_max_length("Tell me a joke.", "generative", 12)
        .await;

    assert_eq!(reply, Ok(Reply::Answer("Why did the chicken".to_string())));
}

#[tokio::test]
async fn openai_completion_sends_max_tokens_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/completions"))
        .and(bearer_token("sk-test"))
        .and(body_partial_json(json!({ "model": "gen", "max_tokens": 7, "n": 1 })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "choices": [{ "text": " a short one" }] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpModelClient::from_config(&model_config(
        ModelProvider::OpenAi,
        &server,
        Some("sk-test"),
    ))
    .expect("client");
    let text = client
        .generate("Tell me", MaxLength::new(7).expect("positive budget"))
        .await
        .expect("completion");

    assert_eq!(text, " a short one");
}

#[tokio::test]
async fn ollama_chat_replays_history_and_returns_first_candidate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "chat",
            "stream": false,
            "messages": [{ "role": "user", "content": "Hello, how are you?" }],
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": { "role": "assistant", "content": "I'm fine!" } })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = HttpModelClient::from_config(&model_config(ModelProvider::Ollama, &server, None))
        .expect("client");
    let results = client
        .converse(&ConversationTurn::new("Hello, how are you?"))
        .await
        .expect("chat results");
    assert_eq!(results[0].generated_text, "I'm fine!");

    let reply = orchestrator(client).handle("Hello, how are you?", "retrieval_based").await;
    assert_eq!(reply, Ok(Reply::Answer("I'm fine!".to_string())));
}

#[tokio::test]
async fn non_success_status_is_unavailable_and_keeps_the_cause() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
        .mount(&server)
        .await;

    let client = HttpModelClient::from_config(&model_config(ModelProvider::Ollama, &server, None))
        .expect("client");

    let direct = client.generate("hello", MaxLength::default()).await;
    assert!(matches!(
        direct,
        Err(ModelError::Unavailable { ref model, ref message })
            if model == "gen" && message.contains("503") && message.contains("model is loading")
    ));

    let error = orchestrator(client)
        .handle("Tell me a story", "generative")
        .await
        .expect_err("503 should fail the turn");
    assert!(matches!(
        error,
        DialogueError::ServiceUnavailable {
            strategy: Strategy::Generative,
            source: ModelError::Unavailable { ref model, .. },
        } if model == "gen"
    ));
    let cause = error.source().map(ToString::to_string).unwrap_or_default();
    assert!(cause.contains("503"), "cause should carry the HTTP status: {cause}");
}

#[tokio::test]
async fn openai_transcription_posts_multipart_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .and(bearer_token("sk-speech"))
        .and(body_string_contains("name=\"model\""))
        .and(body_string_contains("whisper-1"))
        .and(body_string_contains("filename=\"audio.wav\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "  weather please \n" })))
        .expect(1)
        .mount(&server)
        .await;

    let recognizer =
        recognizer_from_config(&speech_config(SpeechBackend::OpenAi, &server, Some("sk-speech")))
            .expect("recognizer");
    let transcript = recognizer.recognize(&AudioSource::Wav(WAV.to_vec())).await;

    assert_eq!(transcript, Ok("weather please".to_string()));
}

#[tokio::test]
async fn whisper_cpp_backend_posts_to_inference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/inference"))
        .and(body_string_contains("name=\"response_format\""))
        .and(body_string_contains("filename=\"audio.wav\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": " tell me a joke" })))
        .expect(1)
        .mount(&server)
        .await;

    let recognizer = recognizer_from_config(&speech_config(SpeechBackend::WhisperCpp, &server, None))
        .expect("recognizer");
    let transcript = recognizer.recognize(&AudioSource::Wav(WAV.to_vec())).await;

    assert_eq!(transcript, Ok("tell me a joke".to_string()));
}

#[tokio::test]
async fn blank_transcription_is_not_understood() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "   " })))
        .expect(1)
        .mount(&server)
        .await;

    let recognizer = recognizer_from_config(&speech_config(SpeechBackend::OpenAi, &server, None))
        .expect("recognizer");
    let result = recognizer.recognize(&AudioSource::Wav(WAV.to_vec())).await;

    assert_eq!(result, Err(SpeechError::NotUnderstood));
}

#[tokio::test]
async fn transcription_service_error_is_reported_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let recognizer = recognizer_from_config(&speech_config(SpeechBackend::OpenAi, &server, None))
        .expect("recognizer");
    let result = recognizer.recognize(&AudioSource::Wav(WAV.to_vec())).await;

    assert!(matches!(
        result,
        Err(SpeechError::Service(ref message)) if message.contains("401") && message.contains("invalid api key")
    ));
}
