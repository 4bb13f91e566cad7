use clap::Parser as ClapParser;
use std::time::Duration;
use tenax_e::backend::WebDriverBackend;
use tenax_engine::backend::Backend;
use tenax_engine::config::ConfigLoader;
use tenax_engine::driver::{Driver, Interaction, RetryPolicy};
use tenax_engine::locator::Locator;
use tenax_engine::signature::Severity;
use tenax_engine::suppressor::Suppressor;
use tracing_subscriber::EnvFilter;

/// Probe a page through a WebDriver session: open it, clear obstructions
/// and resiliently interact with one target.
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page to open
    url: String,

    /// CSS selector of the target
    selector: String,

    /// WebDriver endpoint (chromedriver, geckodriver, selenium)
    #[arg(long, default_value = "http://localhost:4444")]
    webdriver_url: String,

    /// Only scroll the target into view instead of clicking it
    #[arg(long)]
    scroll_only: bool,

    /// Total time budget in milliseconds
    #[arg(long)]
    deadline_ms: Option<u64>,

    /// Delay between attempts in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Sweep with the aggressive stacking-order cutoff
    #[arg(long)]
    aggressive: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = ConfigLoader::load_default().await?;

    let mut policy = RetryPolicy::from_config(&config.driver);
    if let Some(ms) = args.deadline_ms {
        policy.deadline = Duration::from_millis(ms);
    }
    if let Some(ms) = args.poll_ms {
        policy.poll_interval = Duration::from_millis(ms);
    }
    if args.aggressive {
        policy = policy.with_severity(Severity::Aggressive);
    }
    let driver = Driver::new(Suppressor::from_config(&config), policy);

    let mut backend = WebDriverBackend::new(args.webdriver_url.clone());
    backend.launch().await?;

    let outcome = probe(&driver, &mut backend, &args).await;
    backend.close().await?;
    outcome
}

async fn probe(
    driver: &Driver,
    backend: &mut WebDriverBackend,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let nav = backend.navigate(&args.url).await?;
    println!("Opened {} ({})", nav.url, nav.title);

    driver.suppressor().redirect_away_from_interstitial(backend).await?;

    let target = Locator::css(args.selector.clone());
    let interaction = if args.scroll_only {
        Interaction::ScrollIntoView
    } else {
        Interaction::Click
    };

    driver.perform(backend, interaction, &target).await?;
    println!("{} succeeded on `{}`", interaction, target);
    Ok(())
}
