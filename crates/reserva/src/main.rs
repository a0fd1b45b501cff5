mod settings;

use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use clap::{Args as ClapArgs, Parser, Subcommand};
use reserva_engine::config::loader::ConfigLoader;
use reserva_engine::config::schema::ReservaConfig;
use reserva_engine::driver::PageDriver;
use reserva_engine::orchestrator::{
    ConsoleFailureSink, FailureSink, LogFailureSink, Orchestrator,
};
use reserva_engine::request::{OpenAt, RequestDraft};
use reserva_engine::scheduler::SystemClock;
use reserva_engine::selectors::SelectorRegistry;
use reserva_wd::WebDriverPage;
use settings::Settings;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Days between today and the default reservation date.
const DEFAULT_LEAD_DAYS: u64 = 10;

#[derive(Parser)]
#[command(name = "reserva", version, about = "Facility reservation automator")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Wait for the open time and run the reservation flow
    Run(RunArgs),
    /// Print the effective selectors and timing, then exit
    CheckConfig {
        #[arg(long)]
        selectors: Option<PathBuf>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(ClapArgs)]
struct RunArgs {
    /// Reservation date (YYYY-MM-DD). Defaults to ten days from today.
    #[arg(long)]
    date: Option<String>,

    /// First hour of the block
    #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u32).range(9..=21))]
    start_hour: u32,

    /// Number of consecutive hours
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=15))]
    hours: u32,

    /// Local time the reservation window opens (HH:MM:SS)
    #[arg(long, default_value = "09:00:00", conflicts_with = "now")]
    open_at: OpenAt,

    /// Start immediately instead of waiting for the open time
    #[arg(long)]
    now: bool,

    /// Selector file (.yaml or .json)
    #[arg(long)]
    selectors: Option<PathBuf>,

    /// Engine config file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// External WebDriver URL. If not provided, chromedriver is launched.
    #[arg(long)]
    driver_url: Option<String>,

    #[arg(long)]
    headless: bool,

    /// Log the failure report and exit instead of waiting for Enter
    #[arg(long)]
    no_wait_on_failure: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Run(run) => {
            if !run_reservation(run).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::CheckConfig { selectors, config } => {
            check_config(selectors.as_deref(), config.as_deref()).await
        }
    }
}

async fn load_config(path: Option<&Path>) -> Result<ReservaConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from(path).await,
        None => ConfigLoader::load_default().await,
    };
    config.context("failed to load engine config")
}

fn default_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_days(Days::new(DEFAULT_LEAD_DAYS))
        .unwrap_or(today)
}

/// Returns whether the run reached `Submitted`.
async fn run_reservation(run: RunArgs) -> Result<bool> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    let mut config = load_config(run.config.as_deref()).await?;
    if let Some(url) = run.driver_url {
        config.browser.webdriver_url = Some(url);
    }
    if run.headless {
        config.browser.headless = true;
    }

    let registry = SelectorRegistry::load(run.selectors.as_deref())
        .await
        .context("failed to load selectors")?;
    let missing = registry.missing_required();
    if !missing.is_empty() {
        warn!("Selectors missing for: {}", missing.join(", "));
    }

    let date = run.date.unwrap_or_else(|| {
        default_date(Local::now().date_naive())
            .format("%Y-%m-%d")
            .to_string()
    });
    let draft = RequestDraft {
        date,
        open_at: if run.now { OpenAt::Immediate } else { run.open_at },
        start_hour: run.start_hour,
        duration_hours: run.hours,
        attendee_count: settings.people,
        purpose: settings.purpose.clone(),
        credentials: settings.credentials()?,
        login_url: settings.login_url.clone().unwrap_or_default(),
        reservation_base_url: settings.reservation_url.clone().unwrap_or_default(),
    };
    let request = draft.validate().context("invalid reservation request")?;
    info!(
        "Reservation: {} from {:02}:00 for {}h, open at {}",
        request.date(),
        request.start_hour(),
        request.duration_hours(),
        request.open_at()
    );

    let sink: Box<dyn FailureSink> = if run.no_wait_on_failure {
        Box::new(LogFailureSink)
    } else {
        Box::new(ConsoleFailureSink)
    };
    let detach = config.browser.detach;
    let orchestrator = Orchestrator::new(registry, config.timing, SystemClock, sink);

    let mut page = WebDriverPage::new(config.browser);
    page.launch().await.context("failed to start browser")?;
    info!("Browser ready.");

    let report = tokio::select! {
        report = orchestrator.run(&mut page, &request) => report,
        _ = tokio::signal::ctrl_c() => {
            warn!("Shutdown signal received, leaving browser as is.");
            return Ok(false);
        }
    };

    if report.succeeded() {
        if !detach && let Err(e) = page.close().await {
            error!("Failed to close browser: {}", e);
        }
        return Ok(true);
    }
    Ok(false)
}

async fn check_config(selectors: Option<&Path>, config: Option<&Path>) -> Result<()> {
    let config = load_config(config).await?;
    let registry = SelectorRegistry::load(selectors)
        .await
        .context("failed to load selectors")?;

    println!("selectors:");
    for key in registry.keys() {
        if let Some(spec) = registry.spec(key) {
            let strategies: Vec<String> =
                spec.strategies().iter().map(ToString::to_string).collect();
            println!("  {}: {}", key, strategies.join(" | "));
        }
    }
    let params = registry.url_params();
    println!("url_params: year={} month={}", params.year, params.month);
    println!("timing: {:#?}", config.timing);
    println!("browser: {:#?}", config.browser);

    let missing = registry.missing_required();
    if !missing.is_empty() {
        anyhow::bail!("selectors missing for: {}", missing.join(", "));
    }
    Ok(())
}
