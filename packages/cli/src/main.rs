#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Branch deposit corridor analysis.
//!
//! Buffers a hand-drawn corridor line, selects the bank branches inside it
//! and compares their yearly deposits with a reference region. Run without
//! a subcommand for an interactive menu.
//!
//! Uses `indicatif-log-bridge` (via [`branch_corridor_cli_utils::init_logger`])
//! so log lines and progress bars never fight for the terminal.

mod config;
mod pipeline;

use std::path::PathBuf;

use branch_corridor_spatial::{BoundaryRule, PlanarCrs};
use clap::{Parser, Subcommand};
use dialoguer::Select;

use crate::config::{AnalysisConfig, Overrides};

#[derive(Parser)]
#[command(
    name = "branch_corridor",
    about = "Compare deposits inside a corridor with a reference region"
)]
struct Cli {
    /// Analysis config file (defaults to `branch_corridor.toml` if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Branch records CSV
    #[arg(long, global = true)]
    records: Option<PathBuf>,

    /// Corridor cache `GeoJSON`
    #[arg(long, global = true)]
    corridor: Option<PathBuf>,

    /// Buffer distance around the corridor line, in metres
    #[arg(long, global = true)]
    buffer_meters: Option<f64>,

    /// Whether edge points count as inside (`exclusive` or `inclusive`)
    #[arg(long, global = true)]
    boundary: Option<BoundaryRule>,

    /// Planar system for buffering (`auto` or e.g. `EPSG:32618`)
    #[arg(long, global = true)]
    planar_crs: Option<PlanarCrs>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis
    Run {
        /// Draw a new corridor instead of loading the cached one
        #[arg(long)]
        draw: bool,
    },
    /// Draw a corridor and save it to the cache
    Draw,
    /// Write the buffered corridor polygon as `GeoJSON`
    Buffer {
        /// Output path
        #[arg(long, default_value = "data/generated/corridor_buffer.geojson")]
        output: PathBuf,
    },
}

/// Menu entries shown when no subcommand is given.
#[derive(Clone, Copy)]
enum Action {
    RunCached,
    RunWithNewCorridor,
    Draw,
    Buffer,
}

impl Action {
    const ALL: &[Self] = &[
        Self::RunCached,
        Self::RunWithNewCorridor,
        Self::Draw,
        Self::Buffer,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::RunCached => "Run analysis with cached corridor",
            Self::RunWithNewCorridor => "Draw a new corridor and run analysis",
            Self::Draw => "Draw corridor only",
            Self::Buffer => "Export buffered corridor polygon",
        }
    }

    fn into_command(self) -> Commands {
        match self {
            Self::RunCached => Commands::Run { draw: false },
            Self::RunWithNewCorridor => Commands::Run { draw: true },
            Self::Draw => Commands::Draw,
            Self::Buffer => Commands::Buffer {
                output: PathBuf::from("data/generated/corridor_buffer.geojson"),
            },
        }
    }
}

fn choose_command() -> Result<Commands, dialoguer::Error> {
    println!("Branch Corridor Analysis");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(Action::ALL[idx].into_command())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = branch_corridor_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = AnalysisConfig::load(cli.config.as_deref())?.with_overrides(Overrides {
        records_path: cli.records,
        corridor_path: cli.corridor,
        buffer_meters: cli.buffer_meters,
        boundary: cli.boundary,
        planar_crs: cli.planar_crs,
    });

    let command = match cli.command {
        Some(command) => command,
        None => choose_command()?,
    };

    match command {
        Commands::Run { draw } => pipeline::run(&multi, &config, draw)?,
        Commands::Draw => {
            let records = match pipeline::load_records(&multi, &config) {
                Ok(records) => Some(records),
                Err(e) => {
                    log::warn!("Drawing without branch markers: {e}");
                    None
                }
            };
            let line = pipeline::draw_corridor(records.as_ref(), &config)?;
            println!(
                "Saved {}-vertex corridor to {}",
                line.vertex_count(),
                config.corridor_path.display()
            );
        }
        Commands::Buffer { output } => pipeline::buffer_only(&config, &output)?,
    }

    Ok(())
}
