mod telegram;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use services::{Dispatcher, EvaluatorConfig, ProcessEvaluator, QuizController};
use storage::SessionRegistry;
use teloxide::Bot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::telegram::TelegramSink;

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingKey,
    MissingEvaluator,
    UnknownArg(String),
    InvalidTimeout { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingKey => write!(f, "a Telegram API key is required (--key)"),
            ArgsError::MissingEvaluator => {
                write!(f, "an evaluator executable is required (--memo)")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTimeout { raw } => write!(f, "invalid --timeout-secs value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  verbs-bot run --key <telegram_token> --memo <evaluator_path> [--timeout-secs <n>]");
    eprintln!();
    eprintln!("Aliases: -k for --key, -m for --memo");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VERBS_BOT_TOKEN, VERBS_EVALUATOR, VERBS_EVALUATOR_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug)]
struct Args {
    key: String,
    evaluator: EvaluatorConfig,
}

impl Args {
    fn parse_run(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let env_config = EvaluatorConfig::from_env();
        let mut key = std::env::var("VERBS_BOT_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let mut executable = env_config.as_ref().map(|config| config.executable.clone());
        let mut timeout = env_config.and_then(|config| config.timeout);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--key" | "-k" => key = Some(require_value(args, "--key")?),
                "--memo" | "-m" => {
                    executable = Some(PathBuf::from(require_value(args, "--memo")?));
                }
                "--timeout-secs" => {
                    let value = require_value(args, "--timeout-secs")?;
                    let secs = value
                        .parse::<u64>()
                        .ok()
                        .filter(|secs| *secs > 0)
                        .ok_or(ArgsError::InvalidTimeout { raw: value })?;
                    timeout = Some(Duration::from_secs(secs));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let key = key.ok_or(ArgsError::MissingKey)?;
        let executable = executable.ok_or(ArgsError::MissingEvaluator)?;
        let mut evaluator = EvaluatorConfig::new(absolute_path(&executable));
        if let Some(timeout) = timeout {
            evaluator = evaluator.with_timeout(timeout);
        }
        Ok(Self { key, evaluator })
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    match argv.next().as_deref() {
        Some("run") => {}
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(other) => {
            eprintln!("unknown subcommand: {other}");
            print_usage();
            return Err(ArgsError::UnknownArg(other.to_owned()).into());
        }
    }

    let parsed = Args::parse_run(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    if !parsed.evaluator.executable.exists() {
        warn!(
            path = %parsed.evaluator.executable.display(),
            "evaluator executable not found; quizzes will fail to start"
        );
    }
    info!(
        evaluator = %parsed.evaluator.executable.display(),
        timeout = ?parsed.evaluator.timeout,
        "starting verbs bot"
    );

    let bot = Bot::new(parsed.key);
    let registry = Arc::new(SessionRegistry::new());
    let evaluator = Arc::new(ProcessEvaluator::new(parsed.evaluator));
    let controller = Arc::new(QuizController::new(registry, evaluator));
    let dispatcher = Arc::new(Dispatcher::new(
        controller,
        Arc::new(TelegramSink::new(bot.clone())),
    ));

    telegram::serve(bot, dispatcher).await;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
