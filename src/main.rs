use anyhow::Result;
use clap::Parser;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use url_summarizer::cli::{Cli, Commands, OutputFormat};
use url_summarizer::config::Config;
use url_summarizer::output;
use url_summarizer::pipeline::validate_request;
use url_summarizer::{SummarizeError, SummaryPipeline, SummaryRequest, SummaryResult};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "url_summarizer=debug"
    } else {
        "url_summarizer=warn"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::load().await?;

    match cli.command {
        Commands::Summarize {
            url,
            api_key,
            model,
            output,
            format,
        } => {
            if let Some(model) = model {
                config.llm.model = model;
            }

            let api_key = api_key.or_else(|| config.llm.api_key.clone()).unwrap_or_default();
            let request = SummaryRequest::new(api_key, url);

            // Input problems are reported before the pipeline probes for yt-dlp
            if let Err(err) = validate_request(&request) {
                report_failure(&err, cli.verbose);
                return Ok(ExitCode::FAILURE);
            }

            let format = format
                .or_else(|| OutputFormat::from_config(&config.app.default_output_format))
                .unwrap_or(OutputFormat::Text);

            let pipeline = SummaryPipeline::new(&config).await?;

            match run_with_spinner(&pipeline, &request, cli.quiet).await {
                Ok(result) => match output {
                    Some(path) => {
                        output::save_to_file(&result, &path, format).await?;
                        println!("{}", style("Summary generated successfully!").green());
                        println!("Summary saved to: {}", path.display());
                    }
                    None => print_success(&result, format)?,
                },
                Err(err) => {
                    report_failure(&err, cli.verbose);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Commands::Interactive { api_key, model } => {
            if let Some(model) = model {
                config.llm.model = model;
            }

            interactive(&config, api_key, cli.quiet, cli.verbose).await?;
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Configuration file: {}", Config::config_path()?.display());
                println!("Edit it to change the model, endpoint, caption languages or prompt.");
            }
        }
        Commands::Sources => {
            let pipeline = SummaryPipeline::new(&config).await?;

            println!("Supported sources:");
            println!("  • YouTube videos (URLs containing youtube.com or youtu.be)");
            println!("  • Any other http(s) web page");
            println!("Transcript backend: {}", pipeline.transcript_backend());
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Prompt for the API key once, then summarize URLs until an empty line
async fn interactive(config: &Config, api_key: Option<String>, quiet: bool, verbose: bool) -> Result<()> {
    let term = Term::stdout();

    let api_key = match api_key
        .or_else(|| config.llm.api_key.clone())
        .filter(|key| !key.trim().is_empty())
    {
        Some(key) => key,
        None => {
            term.write_str("API key: ")?;
            term.read_secure_line()?
        }
    };

    let pipeline = SummaryPipeline::new(config).await?;

    loop {
        term.write_str("Enter YouTube or Website URL (empty to quit): ")?;
        let url = term.read_line()?;
        if url.trim().is_empty() {
            break;
        }

        let request = SummaryRequest::new(api_key.clone(), url);
        match run_with_spinner(&pipeline, &request, quiet).await {
            Ok(result) => print_success(&result, OutputFormat::Text)?,
            Err(err) => report_failure(&err, verbose),
        }
        println!();
    }

    Ok(())
}

async fn run_with_spinner(
    pipeline: &SummaryPipeline,
    request: &SummaryRequest,
    quiet: bool,
) -> Result<SummaryResult, SummarizeError> {
    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message("Loading and summarizing...");
    progress.enable_steady_tick(Duration::from_millis(100));

    let outcome = pipeline.run(request).await;

    progress.finish_and_clear();
    outcome
}

fn print_success(result: &SummaryResult, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Text {
        println!("{}", style("Summary generated successfully!").green());
        println!();
    }
    output::print_to_console(result, format)
}

fn report_failure(err: &SummarizeError, verbose: bool) {
    eprintln!("{} {}", style("❌").red(), style(err.user_message()).red());

    if err.is_input_error() {
        return;
    }

    tracing::error!(error = ?err, "Summary request failed");
    if verbose {
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            eprintln!("   caused by: {}", cause);
            source = std::error::Error::source(cause);
        }
    } else {
        eprintln!("   (run with --verbose for details)");
    }
}
