pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use parlance_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "parlance",
    about = "Parlance dialogue CLI",
    long_about = "Route utterances through rule-based, retrieval or generative reply strategies, \
                  transcribe voice turns, and inspect runtime configuration.",
    after_help = "Examples:\n  parlance ask \"weather please\"\n  parlance ask \"Tell me a joke.\" --strategy generative --max-length 40\n  parlance listen turn.wav\n  parlance doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file path (defaults to parlance.toml or config/parlance.toml)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Intent taxonomy file, overriding taxonomy.path")]
    taxonomy: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Answer one utterance with the chosen strategy")]
    Ask {
        utterance: String,
        #[arg(long, help = "rule_based | retrieval_based | generative")]
        strategy: Option<String>,
        #[arg(long, allow_negative_numbers = true, help = "Token budget for generative replies")]
        max_length: Option<i64>,
    },
    #[command(about = "Print the keyword intent for an utterance")]
    Classify { utterance: String },
    #[command(about = "Tokenize, tag, extract entities and score sentiment")]
    Annotate { text: String },
    #[command(about = "Transcribe a WAV file and answer the transcript")]
    Listen {
        audio: PathBuf,
        #[arg(long, help = "rule_based | retrieval_based | generative")]
        strategy: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, taxonomy and adapter readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Ask { .. } => "ask",
            Self::Classify { .. } => "classify",
            Self::Annotate { .. } => "annotate",
            Self::Listen { .. } => "listen",
            Self::Config => "config",
            Self::Doctor { .. } => "doctor",
        }
    }
}

impl Cli {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            require_file: self.config.is_some(),
            config_path: self.config.clone(),
            overrides: ConfigOverrides {
                taxonomy_path: self.taxonomy.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.load_options();

    // Commands report config failures themselves; logging just stays off.
    if let Ok(config) = AppConfig::load(options.clone()) {
        if let Err(error) = init_logging(&config) {
            eprintln!("logging disabled: {error:#}");
        }
    }

    let result = match &cli.command {
        Command::Ask { utterance, strategy, max_length } => {
            commands::ask::run(&options, utterance, strategy.as_deref(), *max_length)
        }
        Command::Classify { utterance } => commands::classify::run(utterance),
        Command::Annotate { text } => commands::annotate::run(text),
        Command::Listen { audio, strategy } => {
            commands::listen::run(&options, audio, strategy.as_deref())
        }
        Command::Config => commands::config::run(&options),
        Command::Doctor { json } => commands::doctor::run(&options, *json),
    };

    tracing::info!(
        event_name = "cli.command.completed",
        command = cli.command.name(),
        exit_code = result.exit_code,
        "command finished"
    );
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Log events go to stderr so stdout stays machine-readable.
pub fn init_logging(config: &AppConfig) -> anyhow::Result<()> {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow::anyhow!("failed to install tracing subscriber: {error}"))
}
