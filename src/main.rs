use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use weatherbot::{ForecastClient, ReportScraper, WeatherBotConfig, bot};

fn main() -> Result<()> {
    // Keep local runs in sync with deployment variables
    let _ = dotenv::dotenv();

    let config = WeatherBotConfig::load()?;
    init_logging(&config)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("report") => {
            let scraper = ReportScraper::new(config.report)?;
            for message in bot::report_messages(&scraper) {
                println!("{message}\n");
            }
        }
        Some("forecast") => {
            let latitude: f64 = args
                .get(1)
                .context("Missing latitude argument")?
                .parse()
                .context("Latitude must be a number")?;
            let longitude: f64 = args
                .get(2)
                .context("Missing longitude argument")?
                .parse()
                .context("Longitude must be a number")?;

            let client = ForecastClient::new(config.forecast)?;
            println!("{}", bot::forecast_message(&client, latitude, longitude));
        }
        _ => {
            eprintln!("Usage: weatherbot <report | forecast <latitude> <longitude>>");
        }
    }

    Ok(())
}

fn init_logging(config: &WeatherBotConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;
    }

    Ok(())
}
