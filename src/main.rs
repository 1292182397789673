mod config;
mod driver;
mod poster;
mod pr;
mod report;
mod review;

use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

/// PR Reviewer: CI tool that sends each changed file of a GitHub Pull Request
/// to Gemini and posts the returned review as inline comments.
///
/// The pull request, repository and credentials come from the environment:
/// GEMINI_API_KEY, GH_TOKEN, PR_NUMBER and REPO_FULL_NAME.
#[derive(Parser, Debug)]
#[command(name = "pr-reviewer", version, about)]
struct Cli {
    /// Optional TOML config file (API endpoints, model, reviewed extensions)
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Optional output file path for a markdown run summary
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!(path = %cli.config.display(), "loading configuration");
    let settings = config::Config::load(&cli.config)?;
    let env = config::Environment::from_env().inspect_err(|err| {
        error!(error = %err, "invalid environment");
    })?;

    let main_span = info_span!("pr_review", repo = %env.repo, pr = env.pr_number);
    async {
        info!("starting interactive code review");

        let github = pr::GitHubClient::connect(&settings.github, &settings.review, &env)
            .await
            .inspect_err(|err| error!(error = %err, "failed to initialize GitHub client"))?;
        let gemini = review::GeminiClient::new(&settings.gemini, &env.gemini_api_key)
            .inspect_err(|err| error!(error = %err, "failed to initialize Gemini client"))?;
        info!(model = %gemini.model(), "clients ready");

        let files = driver::run(&github, &gemini).await?;

        let summary = report::build(files, &env);
        report::output(&summary, cli.output.as_deref())?;
        info!(posted = summary.posted, failed = summary.failed, "done");

        Ok::<(), Box<dyn std::error::Error>>(())
    }
    .instrument(main_span)
    .await
}
