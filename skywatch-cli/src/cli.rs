use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use skywatch_core::{
    Config, InMemoryWeatherStore, Location, ProviderId, ResilientSource, StrategyKind,
    WeatherAssessor, WeatherRecord, WeatherService, provider::default_provider_from_config,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skywatch", version, about = "Weather conditions, alerts and risk assessment")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct LocationArgs {
    /// City name, e.g. "Austin".
    #[arg(long)]
    pub city: Option<String>,

    /// ISO-3166 alpha-2 country code, e.g. "US".
    #[arg(long)]
    pub country: Option<String>,

    /// State or province.
    #[arg(long)]
    pub state: Option<String>,

    /// Postal code; preferred over city/country when given.
    #[arg(long)]
    pub postal: Option<String>,
}

impl LocationArgs {
    fn to_location(&self) -> Location {
        let mut location = Location::new(
            self.city.clone().unwrap_or_default(),
            self.country.clone().unwrap_or_default(),
        );
        if let Some(state) = &self.state {
            location = location.with_state(state.clone());
        }
        if let Some(postal) = &self.postal {
            location = location.with_postal_code(postal.clone());
        }
        location
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show current weather for a location.
    Show {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Show current weather and any alerts it raises.
    Alerts {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// Assess current weather with one strategy.
    Assess {
        #[command(flatten)]
        location: LocationArgs,

        /// Strategy name; defaults to `default_strategy` from config.
        #[arg(long)]
        strategy: Option<String>,
    },

    /// Compare every assessment strategy side by side.
    Compare {
        #[command(flatten)]
        location: LocationArgs,
    },

    /// List available assessment strategies.
    Strategies,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider)?,
            Command::Show { location } => {
                let (_, record) = current_weather(&location).await?;
                output::print_record(&record);
            }
            Command::Alerts { location } => {
                let (service, record) = current_weather(&location).await?;
                output::print_record(&record);
                output::print_alerts(&service.analyze_for_alerts(&record));
            }
            Command::Assess { location, strategy } => {
                let config = Config::load()?;
                let kind = match strategy {
                    Some(name) => StrategyKind::try_from(name.as_str())?,
                    None => config.default_strategy_kind()?,
                };
                let (_, record) = current_weather(&location).await?;
                let assessor = WeatherAssessor::new(kind);
                output::print_record(&record);
                output::print_assessment(&assessor, &record);
            }
            Command::Compare { location } => {
                let (_, record) = current_weather(&location).await?;
                let assessor = WeatherAssessor::default();
                output::print_record(&record);
                println!();
                println!("{}", assessor.compare_strategies(&record));
            }
            Command::Strategies => {
                for kind in StrategyKind::all() {
                    println!("{:<18} {}", kind.as_str(), kind.strategy().name());
                }
            }
        }

        Ok(())
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = inquire::Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }

    let had_other_default = config.default_provider_id().is_ok_and(|current| current != id);
    config.upsert_provider_api_key(id, api_key.trim().to_string());

    if had_other_default {
        let make_default = inquire::Confirm::new(&format!("Make {id} the default provider?"))
            .with_default(false)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn current_weather(args: &LocationArgs) -> anyhow::Result<(WeatherService, WeatherRecord)> {
    let config = Config::load()?;
    let source = default_provider_from_config(&config)?;
    let resilient = ResilientSource::from_config(Arc::from(source), &config);
    let service = WeatherService::new(
        resilient,
        Arc::new(InMemoryWeatherStore::new()),
        config.reporting_settings(),
    );

    let record = service.get_current_weather(&args.to_location()).await?;
    Ok((service, record))
}
