mod bot;
mod browser;
mod config;
mod db;
mod errors;
mod fallback;
mod form;
mod llm_client;
mod models;
mod profile;
mod routes;
mod state;
mod tracker;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::bot::{ApplicationBot, JobPosting};
use crate::browser::cdp::{BrowserSession, LaunchOptions};
use crate::config::Config;
use crate::db::{create_pool, migrate};
use crate::fallback::answer::AnswerService;
use crate::fallback::{FallbackResolver, Prompter, StdinPrompter};
use crate::models::profile::Profile;
use crate::profile::{setup::run_setup, ProfileStore};
use crate::routes::build_router;
use crate::state::AppState;
use crate::tracker::ApplicationTracker;

#[derive(Parser)]
#[command(name = "applier", version, about = "Fills job application forms from your profile")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply to a single job posting
    Apply {
        #[arg(long)]
        url: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        position: Option<String>,
        /// Click submit after filling (default is preview only)
        #[arg(long)]
        submit: bool,
        /// Never prompt; unanswerable fields stay empty
        #[arg(long)]
        no_interactive: bool,
        /// Overrides HEADLESS
        #[arg(long)]
        headless: Option<bool>,
    },
    /// Apply to every job in a JSON file of {company, position, url}
    Batch {
        #[arg(long)]
        jobs: PathBuf,
        #[arg(long)]
        submit: bool,
        #[arg(long)]
        no_interactive: bool,
        #[arg(long, default_value_t = 5_000)]
        delay_ms: u64,
    },
    /// Manage the applicant profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Print application statistics
    Stats {
        /// Also write every application to this CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Serve the read-only application report API
    Serve,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Print a summary of the stored profile
    Show,
    /// Write an empty template if no profile exists
    Init,
    /// Fill in the profile interactively
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting applier v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Apply {
            url,
            company,
            position,
            submit,
            no_interactive,
            headless,
        } => {
            let job = JobPosting::new(&url, company, position)?;
            let headless = headless.unwrap_or(config.headless);
            run_jobs(&config, vec![job], submit, !no_interactive, headless, Duration::ZERO).await
        }
        Command::Batch {
            jobs,
            submit,
            no_interactive,
            delay_ms,
        } => {
            let raw = tokio::fs::read_to_string(&jobs)
                .await
                .with_context(|| format!("Failed to read {}", jobs.display()))?;
            let postings: Vec<JobPosting> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a JSON list of jobs", jobs.display()))?;
            let postings = postings
                .into_iter()
                .map(|j| JobPosting::new(&j.url, Some(j.company), Some(j.position)))
                .collect::<Result<Vec<_>, _>>()?;
            if postings.is_empty() {
                bail!("{} contains no jobs", jobs.display());
            }
            run_jobs(
                &config,
                postings,
                submit,
                !no_interactive,
                config.headless,
                Duration::from_millis(delay_ms),
            )
            .await
        }
        Command::Profile { action } => run_profile(&config, action).await,
        Command::Stats { export } => {
            let tracker = ApplicationTracker::new(open_database(&config).await?);
            let stats = tracker.statistics().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            if let Some(path) = export {
                let rows = tracker.export_csv(&path).await?;
                println!("Exported {rows} application(s) to {}", path.display());
            }
            Ok(())
        }
        Command::Serve => serve(&config).await,
    }
}

async fn open_database(config: &Config) -> Result<SqlitePool> {
    let db = create_pool(&config.database_url).await?;
    migrate(&db).await?;
    Ok(db)
}

async fn load_configured_profile(config: &Config) -> Result<Profile> {
    let store = ProfileStore::new(&config.profile_path);
    let profile = store.load().await?;
    if !profile.is_configured() {
        bail!(
            "Profile at {} is not set up yet; run `applier profile setup` first",
            store.path().display()
        );
    }
    Ok(profile)
}

async fn run_jobs(
    config: &Config,
    jobs: Vec<JobPosting>,
    submit: bool,
    interactive: bool,
    headless: bool,
    delay: Duration,
) -> Result<()> {
    let profile = load_configured_profile(config).await?;
    println!("{}", profile.summary());

    let tracker = ApplicationTracker::new(open_database(config).await?);
    let prompter: Option<Arc<dyn Prompter>> = if interactive {
        Some(Arc::new(StdinPrompter))
    } else {
        None
    };
    let service = AnswerService::from_config(&config.answer_backend, config.answer_timeout)?;
    let fallback = FallbackResolver::new(prompter.clone(), service);

    let session = BrowserSession::launch(&LaunchOptions {
        headless,
        chrome_path: config.chrome_path.clone(),
    })
    .await?;

    let bot = ApplicationBot::new(
        session.page(),
        profile,
        fallback,
        prompter.clone(),
        tracker,
        config.screenshot_dir.clone(),
    );
    let results = bot.apply_to_many(&jobs, submit, delay).await;
    drop(bot);

    if let Some(prompter) = &prompter {
        if !headless {
            prompter.ask("", "Press Enter to close the browser").await;
        }
    }
    session.close().await;

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        bail!("{failed} of {} application(s) failed", results.len());
    }
    Ok(())
}

async fn run_profile(config: &Config, action: ProfileAction) -> Result<()> {
    let store = ProfileStore::new(&config.profile_path);
    match action {
        ProfileAction::Show => {
            let profile = store.load().await?;
            if !profile.is_configured() {
                println!("Profile not set up. Run `applier profile setup`.");
            } else {
                println!("{}", profile.summary());
            }
        }
        ProfileAction::Init => {
            if tokio::fs::try_exists(store.path()).await.unwrap_or(false) {
                println!("Profile already exists at {}", store.path().display());
            } else {
                store.save(&Profile::template()).await?;
                println!("Template written to {}", store.path().display());
            }
        }
        ProfileAction::Setup => {
            let existing = store.load().await?;
            let profile = run_setup(&StdinPrompter, existing).await;
            store.save(&profile).await?;
            println!("\n{}", profile.summary());
        }
    }
    Ok(())
}

async fn serve(config: &Config) -> Result<()> {
    let db = open_database(config).await?;
    let state = AppState::new(db);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
