//! Cloud savings-action CLI
//!
//! A command-line tool for ranking savings actions, viewing cost rollups,
//! and debugging the pipeline over a directory of billing exports.

mod commands;
mod config;
mod loader;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{actions, costs, debug, Session};
use finops_lib::{ActionKind, ActionQuery, PriceStrategy, Service};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Cloud savings-action CLI
#[derive(Parser)]
#[command(name = "finops")]
#[command(author, version, about = "CLI for the cloud savings-action pipeline", long_about = None)]
pub struct Cli {
    /// Directory holding per-service CSV exports (can also be set via FINOPS_DATA_DIR env var)
    #[arg(long, env = "FINOPS_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Configuration file (defaults to ~/.config/finops/config.toml)
    #[arg(long, env = "FINOPS_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON price table; switches pricing to the external strategy
    #[arg(long, env = "FINOPS_PRICE_TABLE")]
    pub price_table: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List ranked, explained savings actions
    Actions {
        /// Filter by business area
        #[arg(long, short)]
        business_area: Option<String>,

        /// Filter by region
        #[arg(long, short)]
        region: Option<String>,

        /// Filter by action kind (repeatable), e.g. downsize, offhours_schedule
        #[arg(long, short)]
        kind: Vec<ActionKind>,

        /// Show at most this many actions
        #[arg(long, short)]
        limit: Option<usize>,

        /// Write the actions to a file instead (.json, otherwise CSV)
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// View cost rollups and savings
    #[command(subcommand)]
    Costs(CostsCommands),

    /// Debug and troubleshooting commands
    #[command(subcommand)]
    Debug(DebugCommands),
}

#[derive(Subcommand)]
pub enum CostsCommands {
    /// Total cost per business area
    ByBusinessArea,

    /// Total cost per business area and region
    ByRegion {
        /// Filter by business area
        #[arg(long, short)]
        business_area: Option<String>,
    },

    /// Groups with unusually many resources
    Sprawl {
        /// Restrict to one service (rds, ec2, ebs, snapshots)
        #[arg(long, short)]
        service: Option<Service>,
    },

    /// Potential savings per business area
    Savings,
}

#[derive(Subcommand)]
pub enum DebugCommands {
    /// Show the size ladder built from the loaded classes
    Ladder {
        /// Instance family, e.g. db.r5
        #[arg(long)]
        family: Option<String>,
    },

    /// Show unit prices observed in the loaded costs
    Prices {
        /// Filter by region
        #[arg(long, short)]
        region: Option<String>,
    },

    /// Compare downsize targets with the advisor's per-instance recommendations
    Advisor,

    /// Show per-stage counts for one run
    Stats,

    /// Print prometheus metrics after one run
    Metrics,
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)));
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut pipeline_config = config::load(cli.config.as_deref())?;
    if cli.price_table.is_some() {
        pipeline_config.price_strategy = PriceStrategy::External;
    }
    info!(data_dir = %cli.data_dir.display(), "Loading billing exports");
    let session = Session::open(&cli.data_dir, pipeline_config, cli.price_table.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Actions {
            business_area,
            region,
            kind,
            limit,
            export,
        } => {
            let query = ActionQuery {
                business_area,
                region,
                kinds: kind,
                limit,
            };
            actions::list_actions(&session, &query, export.as_deref(), cli.format)?;
        }
        Commands::Costs(costs_cmd) => match costs_cmd {
            CostsCommands::ByBusinessArea => {
                costs::show_by_business_area(&session, cli.format)?;
            }
            CostsCommands::ByRegion { business_area } => {
                costs::show_by_region(&session, business_area.as_deref(), cli.format)?;
            }
            CostsCommands::Sprawl { service } => {
                costs::show_sprawl(&session, service, cli.format)?;
            }
            CostsCommands::Savings => {
                costs::show_savings(&session, cli.format)?;
            }
        },
        Commands::Debug(debug_cmd) => match debug_cmd {
            DebugCommands::Ladder { family } => {
                debug::show_ladder(&session, family.as_deref(), cli.format)?;
            }
            DebugCommands::Prices { region } => {
                debug::show_prices(&session, region.as_deref(), cli.format)?;
            }
            DebugCommands::Advisor => {
                debug::show_advisor(&session, cli.format)?;
            }
            DebugCommands::Stats => {
                debug::show_stats(&session, cli.format)?;
            }
            DebugCommands::Metrics => {
                debug::show_metrics(&session)?;
            }
        },
    }

    Ok(())
}
