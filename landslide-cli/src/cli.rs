use std::{fmt, sync::Arc};

use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use inquire::{CustomType, InquireError, Select, Text};
use landslide_core::{
    CommunityId, CommunityLocation, Config, RiskDataStore, Settlement, StoreState,
    community, config::DEFAULT_TIMEOUT_SECS, transport_from_config,
};
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "landslide", version, about = "Landslide risk for Craig and Kasaan, Alaska")]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API URL, default community and request timeout.
    Configure,

    /// List the supported communities.
    Communities,

    /// Show current landslide risk for a community.
    Show {
        /// Community code, e.g. "AK91" (Craig) or "AK182" (Kasaan).
        /// Falls back to the configured default, then to a prompt.
        community: Option<String>,

        /// Print the store state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Switch between communities interactively.
    Browse,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Communities => {
                for id in CommunityId::all() {
                    println!("{}", render::community_line(id.location()));
                }
                Ok(())
            }
            Command::Show { community, json } => show(community, json).await,
            Command::Browse => browse().await,
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let current_url = cfg.api_base_url.clone().unwrap_or_default();
    let url = Text::new("Risk API base URL:")
        .with_initial_value(&current_url)
        .with_help_message("Requests go to {base}/landslide/{community}")
        .prompt()?;
    cfg.api_base_url = Some(url.trim().to_string());

    let choices: Vec<Choice> = CommunityId::all().iter().map(|id| Choice::Go(*id)).collect();
    let start = cfg
        .default_community_id()
        .ok()
        .flatten()
        .and_then(|id| CommunityId::all().iter().position(|c| *c == id))
        .unwrap_or(0);
    if let Choice::Go(id) =
        Select::new("Default community:", choices).with_starting_cursor(start).prompt()?
    {
        cfg.set_default_community(id);
    }

    let timeout = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
        .with_error_message("Please enter a whole number of seconds")
        .prompt()?;
    cfg.timeout_secs = Some(timeout);

    let path = cfg.save()?;
    println!("Saved configuration to {}", path.display());

    Ok(())
}

async fn show(community: Option<String>, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load()?;

    let code = match community {
        Some(code) => code,
        None => match cfg.default_community_id()? {
            Some(id) => id.to_string(),
            None => match pick_community()? {
                Choice::Go(id) => id.to_string(),
                Choice::Quit => return Ok(()),
            },
        },
    };

    let store = build_store(&cfg)?;
    let state = match store.fetch_risk_data(&code).await {
        Settlement::Published(state) => state,
        Settlement::Superseded => store.state(),
    };
    let location = community::resolve(&code);

    if json {
        let out = serde_json::json!({ "community": location, "state": state });
        println!("{}", serde_json::to_string_pretty(&out).context("Failed to encode state")?);
    } else {
        println!("{}", render::render_state(location, &state, Utc::now()));
    }

    if let Some(error) = state.error {
        bail!("Landslide risk unavailable for {code} ({:?})", error.category);
    }

    Ok(())
}

async fn browse() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let store = build_store(&cfg)?;

    loop {
        let choice = match pick_community() {
            Ok(choice) => choice,
            Err(err) if is_cancel(&err) => Choice::Quit,
            Err(err) => return Err(err),
        };

        let Choice::Go(id) = choice else {
            store.clear();
            return Ok(());
        };

        println!("Loading landslide risk data...");
        if let Settlement::Published(state) = store.fetch_risk_data(id.as_str()).await {
            println!("{}\n", render::render_state(Some(id.location()), &state, Utc::now()));
        } else {
            debug!(%id, "Result superseded before it could be shown");
            print_current(&store.state());
        }
    }
}

fn print_current(state: &StoreState) {
    if !state.is_idle() {
        println!("{}\n", render::render_state(None, state, Utc::now()));
    }
}

fn build_store(cfg: &Config) -> anyhow::Result<RiskDataStore> {
    let transport = transport_from_config(cfg)?;
    Ok(RiskDataStore::new(Arc::new(transport)).with_timeout(cfg.timeout()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Go(CommunityId),
    Quit,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Go(id) => {
                let location: &CommunityLocation = id.location();
                write!(f, "{} ({})", location.display_name, id)
            }
            Choice::Quit => f.write_str("Quit"),
        }
    }
}

fn pick_community() -> anyhow::Result<Choice> {
    let mut choices: Vec<Choice> = CommunityId::all().iter().map(|id| Choice::Go(*id)).collect();
    choices.push(Choice::Quit);

    Ok(Select::new("Community:", choices).prompt()?)
}

fn is_cancel(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<InquireError>(),
        Some(InquireError::OperationCanceled | InquireError::OperationInterrupted)
    )
}
