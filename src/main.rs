mod analysis;
mod config;
mod engine;
mod pr;
mod report;
mod review;
mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

/// PR Review: turns a GitHub Pull Request URL into a merge review, either
/// over HTTP or straight from the command line.
#[derive(Parser, Debug)]
#[command(name = "pr-review", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (POST /analyze, GET /health)
    Serve {
        /// Address to listen on. Overrides PR_REVIEW_BIND and the config file.
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Review a single PR and print the result
    Analyze {
        /// GitHub Pull Request URL (e.g., https://github.com/org/repo/pull/42)
        pr_url: String,

        /// Use the bundled sample instead of GitHub (no token needed)
        #[arg(long)]
        demo: bool,

        /// Write a markdown report to this file instead of the terminal
        #[arg(short, long, conflicts_with = "json")]
        output: Option<PathBuf>,

        /// Print the JSON response body to stdout
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let mut config = config::Config::load()?;
    debug!(
        engine = config.engine.is_configured(),
        github_token = config.github_token().is_some(),
        demo = config.demo.enabled,
        "configuration loaded"
    );

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = Some(bind);
            }
            let addr = config.bind_addr().to_string();
            let reviewer = Arc::new(review::Reviewer::new(config)?);
            server::serve(&addr, reviewer).await?;
        }
        Command::Analyze {
            pr_url,
            demo,
            output,
            json,
        } => {
            let _span = info_span!("pr_review", pr_url = %pr_url).entered();
            let reviewer = review::Reviewer::new(config)?;

            info!("running review");
            let request = review::AnalysisRequest::new(pr_url, demo);
            let response = reviewer.analyze(&request).await?;
            info!(mode = %response.mode, source = %response.source, "review complete");

            let format = match (&output, json) {
                (Some(path), _) => report::Format::Markdown(path),
                (None, true) => report::Format::Json,
                (None, false) => report::Format::Terminal,
            };
            report::output(&response, format)?;
        }
    }

    Ok(())
}
