use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialogue::{MaxLength, Strategy, DEFAULT_MAX_LENGTH};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub taxonomy: TaxonomyConfig,
    pub dialogue: DialogueConfig,
    pub models: ModelConfig,
    pub speech: SpeechConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct TaxonomyConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct DialogueConfig {
    pub default_strategy: Strategy,
    pub max_length: i64,
}

#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub provider: ModelProvider,
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub conversational_model: String,
    pub generative_model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SpeechConfig {
    pub backend: SpeechBackend,
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub language: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelProvider {
    Ollama,
    #[serde(rename = "openai")]
    OpenAi,
}

/// Transcription service flavour behind `speech.base_url`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechBackend {
    /// OpenAI-compatible `/audio/transcriptions`.
    #[serde(rename = "openai")]
    OpenAi,
    /// Local whisper.cpp server `/inference`.
    WhisperCpp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl ModelProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
        }
    }
}

impl SpeechBackend {
    pub const ALL: [SpeechBackend; 2] = [Self::OpenAi, Self::WhisperCpp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::WhisperCpp => "whisper_cpp",
        }
    }
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub taxonomy_path: Option<PathBuf>,
    pub default_strategy: Option<Strategy>,
    pub max_length: Option<i64>,
    pub log_level: Option<String>,
    pub model_provider: Option<ModelProvider>,
    pub model_base_url: Option<String>,
    pub conversational_model: Option<String>,
    pub generative_model: Option<String>,
    pub speech_base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            taxonomy: TaxonomyConfig { path: PathBuf::from("intents.json") },
            dialogue: DialogueConfig {
                default_strategy: Strategy::RuleBased,
                max_length: i64::from(DEFAULT_MAX_LENGTH),
            },
            models: ModelConfig {
                provider: ModelProvider::Ollama,
                base_url: "http://localhost:11434".to_string(),
                api_key: None,
                conversational_model: "llama3.1".to_string(),
                generative_model: "llama3.1".to_string(),
                timeout_secs: 60,
            },
            speech: SpeechConfig {
                backend: SpeechBackend::OpenAi,
                base_url: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: "whisper-1".to_string(),
                language: None,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for ModelProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::Validation(format!(
                "unsupported model provider `{other}` (expected ollama|openai)"
            ))),
        }
    }
}

impl std::str::FromStr for SpeechBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "whisper_cpp" => Ok(Self::WhisperCpp),
            other => Err(ConfigError::Validation(format!(
                "speech backend `{other}` not supported (expected openai|whisper_cpp)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl DialogueConfig {
    /// Validated generation budget. `AppConfig::load` already rejects values
    /// that are not positive.
    pub fn max_length(&self) -> Result<MaxLength, ConfigError> {
        MaxLength::new(self.max_length).map_err(|error| ConfigError::Validation(error.to_string()))
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("parlance.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(taxonomy) = patch.taxonomy {
            if let Some(path) = taxonomy.path {
                self.taxonomy.path = path;
            }
        }

        if let Some(dialogue) = patch.dialogue {
            if let Some(default_strategy) = dialogue.default_strategy {
                self.dialogue.default_strategy = default_strategy;
            }
            if let Some(max_length) = dialogue.max_length {
                self.dialogue.max_length = max_length;
            }
        }

        if let Some(models) = patch.models {
            if let Some(provider) = models.provider {
                self.models.provider = provider;
            }
            if let Some(base_url) = models.base_url {
                self.models.base_url = base_url;
            }
            if let Some(model_api_key_value) = models.api_key {
                self.models.api_key = Some(secret_value(model_api_key_value));
            }
            if let Some(conversational_model) = models.conversational_model {
                self.models.conversational_model = conversational_model;
            }
            if let Some(generative_model) = models.generative_model {
                self.models.generative_model = generative_model;
            }
            if let Some(timeout_secs) = models.timeout_secs {
                self.models.timeout_secs = timeout_secs;
            }
        }

        if let Some(speech) = patch.speech {
            if let Some(backend) = speech.backend {
                self.speech.backend = backend.parse()?;
            }
            if let Some(base_url) = speech.base_url {
                self.speech.base_url = base_url;
            }
            if let Some(speech_api_key_value) = speech.api_key {
                self.speech.api_key = Some(secret_value(speech_api_key_value));
            }
            if let Some(model) = speech.model {
                self.speech.model = model;
            }
            if let Some(language) = speech.language {
                self.speech.language = Some(language);
            }
            if let Some(timeout_secs) = speech.timeout_secs {
                self.speech.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PARLANCE_TAXONOMY_PATH") {
            self.taxonomy.path = PathBuf::from(value);
        }

        if let Some(value) = read_env("PARLANCE_DIALOGUE_DEFAULT_STRATEGY") {
            self.dialogue.default_strategy =
                value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "PARLANCE_DIALOGUE_DEFAULT_STRATEGY".to_string(),
                    value: value.clone(),
                })?;
        }
        if let Some(value) = read_env("PARLANCE_DIALOGUE_MAX_LENGTH") {
            self.dialogue.max_length = parse_i64("PARLANCE_DIALOGUE_MAX_LENGTH", &value)?;
        }

        if let Some(value) = read_env("PARLANCE_MODELS_PROVIDER") {
            self.models.provider = value.parse()?;
        }
        if let Some(value) = read_env("PARLANCE_MODELS_BASE_URL") {
            self.models.base_url = value;
        }
        if let Some(value) = read_env("PARLANCE_MODELS_API_KEY") {
            self.models.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PARLANCE_MODELS_CONVERSATIONAL_MODEL") {
            self.models.conversational_model = value;
        }
        if let Some(value) = read_env("PARLANCE_MODELS_GENERATIVE_MODEL") {
            self.models.generative_model = value;
        }
        if let Some(value) = read_env("PARLANCE_MODELS_TIMEOUT_SECS") {
            self.models.timeout_secs = parse_u64("PARLANCE_MODELS_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("PARLANCE_SPEECH_BACKEND") {
            self.speech.backend = value.parse()?;
        }
        if let Some(value) = read_env("PARLANCE_SPEECH_BASE_URL") {
            self.speech.base_url = value;
        }
        if let Some(value) = read_env("PARLANCE_SPEECH_API_KEY") {
            self.speech.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("PARLANCE_SPEECH_MODEL") {
            self.speech.model = value;
        }
        if let Some(value) = read_env("PARLANCE_SPEECH_LANGUAGE") {
            self.speech.language = Some(value);
        }
        if let Some(value) = read_env("PARLANCE_SPEECH_TIMEOUT_SECS") {
            self.speech.timeout_secs = parse_u64("PARLANCE_SPEECH_TIMEOUT_SECS", &value)?;
        }

        let log_level =
            read_env("PARLANCE_LOGGING_LEVEL").or_else(|| read_env("PARLANCE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PARLANCE_LOGGING_FORMAT").or_else(|| read_env("PARLANCE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(taxonomy_path) = overrides.taxonomy_path {
            self.taxonomy.path = taxonomy_path;
        }
        if let Some(default_strategy) = overrides.default_strategy {
            self.dialogue.default_strategy = default_strategy;
        }
        if let Some(max_length) = overrides.max_length {
            self.dialogue.max_length = max_length;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(provider) = overrides.model_provider {
            self.models.provider = provider;
        }
        if let Some(base_url) = overrides.model_base_url {
            self.models.base_url = base_url;
        }
        if let Some(conversational_model) = overrides.conversational_model {
            self.models.conversational_model = conversational_model;
        }
        if let Some(generative_model) = overrides.generative_model {
            self.models.generative_model = generative_model;
        }
        if let Some(base_url) = overrides.speech_base_url {
            self.speech.base_url = base_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_taxonomy(&self.taxonomy)?;
        validate_dialogue(&self.dialogue)?;
        validate_models(&self.models)?;
        validate_speech(&self.speech)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("parlance.toml"), PathBuf::from("config/parlance.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_taxonomy(taxonomy: &TaxonomyConfig) -> Result<(), ConfigError> {
    if taxonomy.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "taxonomy.path must point at an intent taxonomy file".to_string(),
        ));
    }
    Ok(())
}

fn validate_dialogue(dialogue: &DialogueConfig) -> Result<(), ConfigError> {
    if dialogue.max_length <= 0 {
        return Err(ConfigError::Validation(format!(
            "dialogue.max_length must be greater than zero (got {})",
            dialogue.max_length
        )));
    }
    dialogue.max_length()?;
    Ok(())
}

fn validate_models(models: &ModelConfig) -> Result<(), ConfigError> {
    validate_http_url("models.base_url", &models.base_url)?;

    if models.timeout_secs == 0 || models.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "models.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if models.conversational_model.trim().is_empty() || models.generative_model.trim().is_empty()
    {
        return Err(ConfigError::Validation(
            "models.conversational_model and models.generative_model must not be empty"
                .to_string(),
        ));
    }

    if models.provider == ModelProvider::OpenAi {
        let missing = models
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing {
            return Err(ConfigError::Validation(
                "models.api_key is required for the openai provider".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_speech(speech: &SpeechConfig) -> Result<(), ConfigError> {
    validate_http_url("speech.base_url", &speech.base_url)?;

    if speech.timeout_secs == 0 || speech.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "speech.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if speech.model.trim().is_empty() {
        return Err(ConfigError::Validation("speech.model must not be empty".to_string()));
    }

    Ok(())
}

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

/// Reads an environment variable, treating blank values as unset.
pub fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    taxonomy: Option<TaxonomyPatch>,
    dialogue: Option<DialoguePatch>,
    models: Option<ModelsPatch>,
    speech: Option<SpeechPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct TaxonomyPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct DialoguePatch {
    default_strategy: Option<Strategy>,
    max_length: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelsPatch {
    provider: Option<ModelProvider>,
    base_url: Option<String>,
    api_key: Option<String>,
    conversational_model: Option<String>,
    generative_model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SpeechPatch {
    backend: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    language: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{
        AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat, ModelProvider,
        SpeechBackend,
    };
    use crate::dialogue::Strategy;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.dialogue.default_strategy == Strategy::RuleBased, "default is rule_based")?;
        ensure(config.dialogue.max_length == 50, "default max_length should be 50")?;
        ensure(config.taxonomy.path == PathBuf::from("intents.json"), "default taxonomy path")?;
        ensure(matches!(config.logging.format, LogFormat::Compact), "default format is compact")
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PARLANCE_MODEL_KEY", "sk-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("parlance.toml");
            fs::write(
                &path,
                r#"
[models]
provider = "openai"
base_url = "https://api.openai.com/v1"
api_key = "${TEST_PARLANCE_MODEL_KEY}"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.models.provider == ModelProvider::OpenAi, "provider from file")?;
            ensure(
                config
                    .models
                    .api_key
                    .as_ref()
                    .is_some_and(|key| key.expose_secret() == "sk-from-env"),
                "api key should be interpolated from environment",
            )
        })();

        clear_vars(&["TEST_PARLANCE_MODEL_KEY"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARLANCE_LOG_LEVEL", "warn");
        env::set_var("PARLANCE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )
        })();

        clear_vars(&["PARLANCE_LOG_LEVEL", "PARLANCE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARLANCE_TAXONOMY_PATH", "from-env.json");
        env::set_var("PARLANCE_DIALOGUE_DEFAULT_STRATEGY", "generative");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("parlance.toml");
            fs::write(
                &path,
                r#"
[taxonomy]
path = "from-file.json"

[dialogue]
default_strategy = "retrieval_based"
max_length = 80

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    taxonomy_path: Some(PathBuf::from("from-override.json")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.taxonomy.path == PathBuf::from("from-override.json"),
                "override taxonomy path should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.dialogue.default_strategy == Strategy::Generative,
                "env strategy should win over file",
            )?;
            ensure(config.dialogue.max_length == 80, "file max_length should win over default")
        })();

        clear_vars(&["PARLANCE_TAXONOMY_PATH", "PARLANCE_DIALOGUE_DEFAULT_STRATEGY"]);
        result
    }

    #[test]
    fn non_positive_max_length_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        for max_length in [0, -1] {
            let error = match AppConfig::load(LoadOptions {
                overrides: ConfigOverrides {
                    max_length: Some(max_length),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            }) {
                Ok(_) => return Err("expected validation failure for max_length".to_string()),
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::Validation(ref message) if message.contains("dialogue.max_length")
                ),
                "validation failure should mention dialogue.max_length",
            )?;
        }
        Ok(())
    }

    #[test]
    fn unknown_strategy_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARLANCE_DIALOGUE_DEFAULT_STRATEGY", "bogus_method");
        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid env override".to_string()),
            Err(error) => ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "PARLANCE_DIALOGUE_DEFAULT_STRATEGY"),
                "error should name the strategy env var",
            ),
        };

        clear_vars(&["PARLANCE_DIALOGUE_DEFAULT_STRATEGY"]);
        result
    }

    #[test]
    fn speech_backend_is_selected_from_env() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let defaults = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;
        ensure(defaults.speech.backend == SpeechBackend::OpenAi, "default backend is openai")?;

        env::set_var("PARLANCE_SPEECH_BACKEND", "whisper_cpp");
        let result = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))
            .and_then(|config| {
                ensure(
                    config.speech.backend == SpeechBackend::WhisperCpp,
                    "backend should come from env var",
                )
            });

        clear_vars(&["PARLANCE_SPEECH_BACKEND"]);
        result
    }

    #[test]
    fn unknown_speech_backend_from_env_is_a_validation_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARLANCE_SPEECH_BACKEND", "google");
        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected unsupported backend to fail".to_string()),
            Err(error) => ensure(
                matches!(error, ConfigError::Validation(ref message) if message.contains("`google` not supported")),
                "error should name the unsupported backend",
            ),
        };

        clear_vars(&["PARLANCE_SPEECH_BACKEND"]);
        result
    }

    #[test]
    fn unknown_speech_backend_in_file_is_a_validation_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("parlance.toml");
        fs::write(&path, "[speech]\nbackend = \"sphinx\"\n").map_err(|err| err.to_string())?;

        let result =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() });
        ensure(
            matches!(result, Err(ConfigError::Validation(ref message)) if message.contains("sphinx")),
            "file backend outside the supported set should fail validation",
        )
    }

    #[test]
    fn openai_provider_requires_api_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                model_provider: Some(ModelProvider::OpenAi),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        match result {
            Ok(_) => Err("expected missing api key failure".to_string()),
            Err(error) => ensure(
                matches!(error, ConfigError::Validation(ref message) if message.contains("models.api_key")),
                "validation failure should mention models.api_key",
            ),
        }
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PARLANCE_MODELS_API_KEY", "sk-secret-value");
        env::set_var("PARLANCE_SPEECH_API_KEY", "sk-speech-secret");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("sk-secret-value"), "debug output should not contain model key")?;
            ensure(
                !debug.contains("sk-speech-secret"),
                "debug output should not contain speech key",
            )
        })();

        clear_vars(&["PARLANCE_MODELS_API_KEY", "PARLANCE_SPEECH_API_KEY"]);
        result
    }

    #[test]
    fn missing_required_file_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let result = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            require_file: true,
            ..LoadOptions::default()
        });

        ensure(
            matches!(result, Err(ConfigError::MissingConfigFile(_))),
            "missing required file should fail",
        )
    }
}
