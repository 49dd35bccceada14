use std::{
    io::Read,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use styleparse::{
    config::RecoveryConfig,
    recovery::{
        observer::{JsonLinesObserver, PipelineObserver, TracingObserver},
        GenerationRequest, RecoveryController, ReplayGenerator, Tiers,
    },
    response::AnalysisResponse,
    tracing_init,
};

#[derive(Parser)]
#[command(
    name = "styleparse",
    version,
    about = "Recover schema-valid style analyses from saved model responses"
)]
struct App {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Append one JSON record per pipeline event to this file
    #[arg(long, global = true)]
    diagnostics: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline over a saved model response
    Recover {
        /// Response file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,
        /// Structured retries (overrides the config)
        #[arg(long)]
        max_retries: Option<u32>,
        /// Print the HTTP-style response instead of the full resolution
        #[arg(long)]
        response: bool,
    },
    /// Print the fallback result
    Fallback,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let app = App::parse();

    match &app.log_file {
        Some(path) => tracing_init::init_file_tracing(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?,
        None => tracing_init::init_stderr_tracing(),
    }

    let config = match &app.config {
        Some(path) => RecoveryConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RecoveryConfig::default(),
    };

    match app.command {
        Commands::Recover {
            input,
            max_retries,
            response,
        } => {
            let text = read_input(&input)?;
            let observer = build_observer(app.diagnostics.as_deref())?;
            let max_retries = max_retries.unwrap_or(config.max_retries);
            let controller =
                RecoveryController::new(Arc::new(ReplayGenerator::new(text)), config)
                    .with_observer(observer);

            let outcome = controller
                .resolve(&GenerationRequest::default(), max_retries)
                .await;

            let rendered = match (&outcome, response) {
                (Ok(resolution), false) => serde_json::to_string_pretty(resolution)?,
                _ => serde_json::to_string_pretty(&AnalysisResponse::from_outcome(&outcome))?,
            };
            println!("{rendered}");

            outcome?;
        }
        Commands::Fallback => {
            let result = Tiers::new(&config).fallback_result();
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn build_observer(diagnostics: Option<&Path>) -> Result<Arc<dyn PipelineObserver>> {
    let Some(path) = diagnostics else {
        return Ok(Arc::new(TracingObserver));
    };
    let file_observer = JsonLinesObserver::open(path)
        .with_context(|| format!("failed to open diagnostics file {}", path.display()))?;
    let observers: Vec<Arc<dyn PipelineObserver>> =
        vec![Arc::new(TracingObserver), Arc::new(file_observer)];
    Ok(Arc::new(observers))
}
