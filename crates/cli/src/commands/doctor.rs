use parlance_agent::{HttpModelClient, HttpSpeechRecognizer};
use parlance_core::config::{AppConfig, LoadOptions};
use parlance_core::IntentTaxonomy;
use serde::Serialize;

use super::{CommandResult, EXIT_CONFIGURATION};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DEPENDENT_CHECKS: [&str; 3] = ["taxonomy_load", "model_adapter", "speech_adapter"];

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_CONFIGURATION };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_taxonomy(&config));
            checks.push(check_model_adapter(&config));
            checks.push(check_speech_adapter(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(DEPENDENT_CHECKS.into_iter().map(|name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            }));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_taxonomy(config: &AppConfig) -> DoctorCheck {
    match IntentTaxonomy::load(&config.taxonomy.path) {
        Ok(taxonomy) => DoctorCheck {
            name: "taxonomy_load",
            status: CheckStatus::Pass,
            details: format!(
                "loaded {} intent(s) from `{}`: {}",
                taxonomy.len(),
                config.taxonomy.path.display(),
                taxonomy.intents().collect::<Vec<_>>().join(", ")
            ),
        },
        Err(error) => {
            DoctorCheck { name: "taxonomy_load", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

/// Builds the adapter without sending a request; the model server may be offline.
fn check_model_adapter(config: &AppConfig) -> DoctorCheck {
    match HttpModelClient::from_config(&config.models) {
        Ok(_) => DoctorCheck {
            name: "model_adapter",
            status: CheckStatus::Pass,
            details: format!(
                "{} via `{}` (conversational `{}`, generative `{}`)",
                config.models.provider.as_str(),
                config.models.base_url,
                config.models.conversational_model,
                config.models.generative_model
            ),
        },
        Err(error) => {
            DoctorCheck { name: "model_adapter", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_speech_adapter(config: &AppConfig) -> DoctorCheck {
    match HttpSpeechRecognizer::from_config(&config.speech) {
        Ok(_) => {
            let key_note =
                if config.speech.api_key.is_some() { "api key set" } else { "no api key" };
            DoctorCheck {
                name: "speech_adapter",
                status: CheckStatus::Pass,
                details: format!(
                    "{} `{}` via `{}` ({key_note})",
                    config.speech.backend.as_str(),
                    config.speech.model,
                    config.speech.base_url
                ),
            }
        }
        Err(error) => DoctorCheck {
            name: "speech_adapter",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
