//! `scribe`
//!
//! Draws SVG designs with a wall plotter.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use scribe::{plan, plot_svg, resume_point, serial::available_ports, Design, PlotError, PlotterConfig};

/// Draws SVG designs with a two-motor wall plotter.
#[derive(Parser, Debug)]
#[command(name = "scribe", version, about, long_about = None)]
struct Cli {
    /// What to do.
    #[command(subcommand)]
    command: Command,
}

/// The things scribe can do.
#[derive(Subcommand, Debug)]
enum Command {
    /// Draw a design.
    Plot {
        /// The SVG file to draw.
        svg: PathBuf,
        /// JSON configuration for the plotter, the reference rig is assumed without one.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Serial port the controller is on, overriding the configuration.
        #[arg(short, long)]
        port: Option<String>,
        /// Skip this many moves, as if an earlier run had drawn them.
        #[arg(long, conflicts_with = "resume")]
        start_from: Option<usize>,
        /// Carry on from where an interrupted run left off.
        #[arg(long)]
        resume: bool,
    },
    /// Print the moves that would draw a design, as JSON, without touching the plotter.
    Plan {
        /// The SVG file to plan.
        svg: PathBuf,
        /// JSON configuration for the plotter, the reference rig is assumed without one.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// List the serial ports on this machine.
    Ports,
}

/// Something that stopped a command.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// Planning or drawing failed.
    #[error(transparent)]
    Plot(#[from] PlotError),
    /// The plan could not be printed.
    #[error("failed to write the plan: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Runs a command.
///
/// # Errors
/// Whatever stopped the command.
fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Plot {
            svg,
            config,
            port,
            start_from,
            resume,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(port) = port {
                config.serial.port = port;
            }

            let start_from = match (start_from, resume) {
                (Some(start_from), _) => start_from,
                (None, true) => resume_point(&config).map_err(PlotError::from)?,
                (None, false) => config.start_from,
            };

            let summary = plot_svg(&svg, &config, start_from)?;
            log::info!(
                "drew {} of {} moves, {} were already drawn",
                summary.drawn,
                summary.total,
                summary.skipped
            );
        }
        Command::Plan { svg, config } => {
            let config = load_config(config.as_deref())?;
            let design = Design::load(&svg)?;
            let instructions = plan(&design, &config)?;
            println!("{}", serde_json::to_string_pretty(&instructions)?);
        }
        Command::Ports => {
            let ports = available_ports().map_err(PlotError::from)?;
            if ports.is_empty() {
                log::warn!("no serial ports found");
            }
            for (name, description) in ports {
                match description {
                    Some(description) => println!("{name}\t{description}"),
                    None => println!("{name}"),
                }
            }
        }
    }

    Ok(())
}

/// Loads the configuration, or the reference rig's if there is no file.
///
/// # Errors
/// A [`PlotError::Configuration`] if the file cannot be used.
fn load_config(path: Option<&Path>) -> Result<PlotterConfig, PlotError> {
    match path {
        Some(path) => Ok(PlotterConfig::load(path)?),
        None => Ok(PlotterConfig::default()),
    }
}
