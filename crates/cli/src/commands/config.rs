use std::fs;
use std::path::Path;

use parlance_core::config::{read_env, resolve_config_path, AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

use super::{load_config, CommandResult};

struct Field {
    key: &'static str,
    value: String,
    /// Checked in order; the first one with a non-blank value is the source.
    env_keys: &'static [&'static str],
    overridden: bool,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec![
        "effective config (source precedence: flag > env > file > default):".to_string(),
    ];
    for field in fields(&config, options) {
        let source = field_source(&field, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(format!("- {} = {} (source: {source})", field.key, field.value));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn fields(config: &AppConfig, options: &LoadOptions) -> Vec<Field> {
    let overrides = &options.overrides;
    vec![
        Field {
            key: "taxonomy.path",
            value: config.taxonomy.path.display().to_string(),
            env_keys: &["PARLANCE_TAXONOMY_PATH"],
            overridden: overrides.taxonomy_path.is_some(),
        },
        Field {
            key: "dialogue.default_strategy",
            value: config.dialogue.default_strategy.to_string(),
            env_keys: &["PARLANCE_DIALOGUE_DEFAULT_STRATEGY"],
            overridden: overrides.default_strategy.is_some(),
        },
        Field {
            key: "dialogue.max_length",
            value: config.dialogue.max_length.to_string(),
            env_keys: &["PARLANCE_DIALOGUE_MAX_LENGTH"],
            overridden: overrides.max_length.is_some(),
        },
        Field {
            key: "models.provider",
            value: config.models.provider.as_str().to_string(),
            env_keys: &["PARLANCE_MODELS_PROVIDER"],
            overridden: overrides.model_provider.is_some(),
        },
        Field {
            key: "models.base_url",
            value: config.models.base_url.clone(),
            env_keys: &["PARLANCE_MODELS_BASE_URL"],
            overridden: overrides.model_base_url.is_some(),
        },
        Field {
            key: "models.api_key",
            value: redact_key(config.models.api_key.as_ref()),
            env_keys: &["PARLANCE_MODELS_API_KEY"],
            overridden: false,
        },
        Field {
            key: "models.conversational_model",
            value: config.models.conversational_model.clone(),
            env_keys: &["PARLANCE_MODELS_CONVERSATIONAL_MODEL"],
            overridden: overrides.conversational_model.is_some(),
        },
        Field {
            key: "models.generative_model",
            value: config.models.generative_model.clone(),
            env_keys: &["PARLANCE_MODELS_GENERATIVE_MODEL"],
            overridden: overrides.generative_model.is_some(),
        },
        Field {
            key: "models.timeout_secs",
            value: config.models.timeout_secs.to_string(),
            env_keys: &["PARLANCE_MODELS_TIMEOUT_SECS"],
            overridden: false,
        },
        Field {
            key: "speech.backend",
            value: config.speech.backend.as_str().to_string(),
            env_keys: &["PARLANCE_SPEECH_BACKEND"],
            overridden: false,
        },
        Field {
            key: "speech.base_url",
            value: config.speech.base_url.clone(),
            env_keys: &["PARLANCE_SPEECH_BASE_URL"],
            overridden: overrides.speech_base_url.is_some(),
        },
        Field {
            key: "speech.api_key",
            value: redact_key(config.speech.api_key.as_ref()),
            env_keys: &["PARLANCE_SPEECH_API_KEY"],
            overridden: false,
        },
        Field {
            key: "speech.model",
            value: config.speech.model.clone(),
            env_keys: &["PARLANCE_SPEECH_MODEL"],
            overridden: false,
        },
        Field {
            key: "speech.language",
            value: config.speech.language.clone().unwrap_or_else(|| "<unset>".to_string()),
            env_keys: &["PARLANCE_SPEECH_LANGUAGE"],
            overridden: false,
        },
        Field {
            key: "speech.timeout_secs",
            value: config.speech.timeout_secs.to_string(),
            env_keys: &["PARLANCE_SPEECH_TIMEOUT_SECS"],
            overridden: false,
        },
        Field {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["PARLANCE_LOGGING_LEVEL", "PARLANCE_LOG_LEVEL"],
            overridden: overrides.log_level.is_some(),
        },
        Field {
            key: "logging.format",
            value: config.logging.format.as_str().to_string(),
            env_keys: &["PARLANCE_LOGGING_FORMAT", "PARLANCE_LOG_FORMAT"],
            overridden: false,
        },
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    field: &Field,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if field.overridden {
        return "flag".to_string();
    }

    if let Some(env_key) = field.env_keys.iter().find(|key| read_env(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_key(key: Option<&SecretString>) -> String {
    let Some(key) = key else {
        return "<unset>".to_string();
    };

    let trimmed = key.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }
    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }
    "<redacted>".to_string()
}
