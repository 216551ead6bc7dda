use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};

use revapp_action::{run_supervised, Orchestrator};
use revapp_core::event::{self, GITHUB_EVENT_PATH, GITHUB_REPOSITORY};
use revapp_core::workflow::{GITHUB_ACTIONS, GITHUB_OUTPUT};
use revapp_core::{
    Action, ActionConfig, FileConfig, LogLogger, Logger, Outputs, ReviewAppError, WorkflowLogger,
};

const DEFAULT_CONFIG: &str = ".revapp.toml";

#[derive(Parser)]
#[command(
    name = "revapp",
    version,
    about = "Provision and tear down Heroku review apps for pull requests",
    long_about = "Provision and tear down Heroku review apps for pull requests.\n\n\
                   Runs as a GitHub Actions step on pull_request events. Reads the event\n\
                   payload, then either creates a review app from the head commit's tarball\n\
                   or destroys the review app belonging to the pull request.\n\n\
                   Environment:\n  \
                     HEROKU_API_TOKEN    Heroku Platform API token (required)\n  \
                     HEROKU_PIPELINE_ID  Pipeline the review apps belong to (required)\n  \
                     GITHUB_TOKEN        Token used to resolve the tarball URL (create only)\n\n\
                   Examples:\n  \
                     revapp --action create\n  \
                     revapp --action destroy --event event.json --format json"
)]
struct Cli {
    /// Action to perform: create or destroy
    #[arg(
        long,
        env = "INPUT_ACTION",
        default_value = "",
        long_help = "Action to perform.\n\n\
                       create   Create a review app for the pull request head\n  \
                       destroy  Remove the pull request's review app, if any\n\n\
                       Any other value logs a warning and does nothing."
    )]
    action: String,

    /// Path to the event payload (default: $GITHUB_EVENT_PATH)
    #[arg(long, env = GITHUB_EVENT_PATH)]
    event: Option<PathBuf>,

    /// Path to configuration file (default: .revapp.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format when $GITHUB_OUTPUT is not set
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// `name=value` lines
    Text,
    /// A JSON object
    Json,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn load_file_config(path: Option<&Path>) -> Result<FileConfig> {
    match path {
        Some(path) => FileConfig::from_file(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG);
            if default_path.exists() {
                FileConfig::from_file(default_path)
                    .into_diagnostic()
                    .wrap_err(format!("reading {DEFAULT_CONFIG}"))
            } else {
                Ok(FileConfig::default())
            }
        }
    }
}

fn write_outputs(outputs: &Outputs, format: OutputFormat) -> Result<()> {
    if let Some(path) = std::env::var_os(GITHUB_OUTPUT).filter(|p| !p.is_empty()) {
        let path = PathBuf::from(path);
        return outputs
            .append_to_file(&path)
            .into_diagnostic()
            .wrap_err(format!("writing outputs to {}", path.display()));
    }

    match format {
        OutputFormat::Text => print!("{outputs}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&outputs.to_json()).into_diagnostic()?
        ),
    }
    Ok(())
}

async fn run(cli: &Cli, logger: Arc<dyn Logger>) -> Result<()> {
    let file = load_file_config(cli.config.as_deref())?;
    let config = ActionConfig::from_env(file)?;
    logger.debug(&format!("{config:?}"));

    let Some(event_path) = &cli.event else {
        return Err(ReviewAppError::MissingContext(format!(
            "{GITHUB_EVENT_PATH} is not set; pass --event or run inside GitHub Actions"
        ))
        .into());
    };
    let repository = std::env::var(GITHUB_REPOSITORY).ok();
    let pr = match event::pull_request_from_file(event_path, repository.as_deref()) {
        Ok(pr) => pr,
        Err(ReviewAppError::Io(e)) => {
            return Err(e)
                .into_diagnostic()
                .wrap_err(format!("reading event payload {}", event_path.display()));
        }
        Err(e) => return Err(e.into()),
    };
    logger.debug(&format!("pull request {pr} at {}", pr.head_sha));

    let action = Action::from_input(&cli.action);
    let orchestrator = Arc::new(Orchestrator::from_config(&config, logger.clone())?);
    let outcome = run_supervised(orchestrator, action, pr).await?;

    let outputs = outcome.outputs();
    if !outputs.is_empty() {
        write_outputs(&outputs, cli.format)?;
    }
    Ok(())
}

/// Flatten a report and its causes into one line for the runner log.
///
/// A cause already quoted by the message before it is skipped.
fn failure_message(report: &miette::Report) -> String {
    let mut message = String::new();
    for cause in report.chain() {
        let text = cause.to_string();
        if message.contains(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
    }
    message
}

#[tokio::main]
async fn main() -> ExitCode {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let in_actions = std::env::var(GITHUB_ACTIONS).is_ok_and(|v| v == "true");
    let logger: Arc<dyn Logger> = if in_actions {
        Arc::new(WorkflowLogger::stdout())
    } else {
        Arc::new(LogLogger)
    };

    match run(&cli, logger.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            if in_actions {
                logger.error(&failure_message(&report));
            } else {
                eprintln!("{report:?}");
            }
            ExitCode::FAILURE
        }
    }
}
