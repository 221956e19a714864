use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use cityweather_core::{
    Config, Coordinator, FileStorage, PinChange, PinnedCities, Units, providers_from_config,
};
use inquire::{Confirm, InquireError, Password, Select, Text};

use crate::render::{self, Theme};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "City weather lookup")]
pub struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override configured units for this run: metric or imperial.
    #[arg(long, global = true)]
    pub units: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key and preferred units.
    Configure,

    /// Show current weather for a city.
    Show {
        city: String,

        /// Pin the city after a successful lookup.
        #[arg(long)]
        pin: bool,
    },

    /// List location suggestions for partial input.
    Suggest { text: String },

    /// Interactive search with suggestions.
    Search,

    /// Look a city up and pin it.
    Pin { city: String },

    /// Remove a pinned city.
    Unpin { city: String },

    /// List pinned cities.
    Pinned {
        /// Fetch fresh conditions for every pinned city first.
        #[arg(long)]
        refresh: bool,
    },

    /// Toggle dark mode.
    Theme,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        let run_units = match self.units.as_deref() {
            Some(units) => Units::try_from(units)?,
            None => config.units,
        };
        let theme = Theme::from_dark_mode(config.dark_mode);

        match self.command {
            Command::Configure => configure(&mut config)?,
            Command::Theme => {
                let dark = config.toggle_dark_mode();
                config.save()?;
                let label = if dark { "on" } else { "off" };
                println!("Dark mode {label} {}", Theme::from_dark_mode(dark).icon());
            }
            Command::Show { city, pin } => {
                let coord = open_coordinator(&config, run_units)?;
                show(&coord, &city, pin, theme).await?;
            }
            Command::Suggest { text } => {
                let coord = open_coordinator(&config, run_units)?;
                coord.input(&text).await;
                let state = coord.state();
                if state.suggestions().is_empty() {
                    println!("No suggestions.");
                }
                for s in state.suggestions() {
                    println!("{s}");
                }
            }
            Command::Search => {
                let coord = open_coordinator(&config, run_units)?;
                interactive_search(&coord, theme).await?;
            }
            Command::Pin { city } => {
                let coord = open_coordinator(&config, run_units)?;
                let (name, added) = coord.pin_city(&city).await?;
                if added {
                    println!("Pinned {name}.");
                } else {
                    println!("{name} is already pinned.");
                }
            }
            Command::Unpin { city } => {
                let coord = open_coordinator(&config, run_units)?;
                let name = resolve_pinned_name(&coord, &city).unwrap_or(city);
                if coord.unpin(&name)? {
                    println!("Unpinned {name}.");
                } else {
                    println!("{name} is not pinned.");
                }
            }
            Command::Pinned { refresh } => {
                let coord = open_coordinator(&config, run_units)?;
                if refresh {
                    let refreshed = coord.refresh_pinned().await;
                    tracing::info!("Refreshed {refreshed} pinned cities");
                }
                println!("{}", render::pinned_summary(coord.state().pinned()));
            }
        }

        Ok(())
    }
}

fn open_coordinator(config: &Config, units: Units) -> anyhow::Result<Coordinator> {
    let providers = providers_from_config(config)?;
    let storage = FileStorage::new(Config::data_dir()?);
    let pinned = PinnedCities::load(Box::new(storage));

    Ok(Coordinator::new(providers, units, pinned))
}

fn configure(config: &mut Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.set_api_key(api_key);

    let choices = vec![Units::Metric, Units::Imperial];
    let start = choices.iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Units:", choices)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read units")?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Matches `city` against pinned names ignoring case.
fn resolve_pinned_name(coord: &Coordinator, city: &str) -> Option<String> {
    coord
        .state()
        .pinned()
        .iter()
        .find(|r| r.location_name.eq_ignore_ascii_case(city.trim()))
        .map(|r| r.location_name.clone())
}

async fn show(coord: &Coordinator, city: &str, pin: bool, theme: Theme) -> anyhow::Result<()> {
    eprintln!("Loading...");
    coord.search(city).await;

    if let Some(error) = coord.state().error() {
        bail!("{error}");
    }

    // Already pinned: the lookup refreshed the pinned entry instead.
    if coord.state().active().is_none() {
        let state = coord.state();
        let pinned = state
            .last_resolved()
            .and_then(|name| state.pinned().iter().find(|r| r.is_same_city(name)));
        match pinned {
            Some(record) => println!("{} 📌", render::record(record, theme)),
            None => println!("{}", render::pinned_summary(state.pinned())),
        }
        return Ok(());
    }

    println!("{}", render::state(&coord.state(), theme));

    if !pin {
        return Ok(());
    }
    if let Some(name) = coord.pin_active()? {
        println!("Pinned {name}.");
    }
    Ok(())
}

async fn interactive_search(coord: &Coordinator, theme: Theme) -> anyhow::Result<()> {
    loop {
        let text = match Text::new("City:").with_help_message("empty input quits").prompt() {
            Ok(text) => text,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read city"),
        };
        if text.trim().is_empty() {
            break;
        }

        coord.input(&text).await;

        let options: Vec<String> =
            coord.state().suggestions().iter().map(ToString::to_string).collect();
        let suggestion_count = options.len();

        let selected = if suggestion_count == 0 {
            None
        } else {
            let mut options = options;
            options.push(format!("Search \"{}\" as typed", text.trim()));
            match Select::new("Pick a location:", options).raw_prompt() {
                Ok(choice) => Some(choice.index),
                Err(InquireError::OperationCanceled) => continue,
                Err(InquireError::OperationInterrupted) => break,
                Err(e) => return Err(e).context("Failed to read selection"),
            }
        };

        eprintln!("Loading...");
        match selected {
            Some(index) if index < suggestion_count => coord.select(index).await,
            _ => coord.submit().await,
        };

        println!("{}", render::state(&coord.state(), theme));

        let active_name = coord.state().active().map(|r| r.location_name.clone());
        if let Some(name) = active_name {
            let pin = Confirm::new(&format!("Pin {name}?"))
                .with_default(false)
                .prompt()
                .unwrap_or(false);
            if pin && coord.toggle_pin(&name)? == PinChange::Pinned {
                println!("Pinned {name}.");
            }
        }
    }

    Ok(())
}
