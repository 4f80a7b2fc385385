//! `scribe`
//!
//! Draws SVG designs with a wall plotter: a pen holder hung from two belts, each wound onto a
//! stepper motor at a top corner of the canvas, with a servo to lift the pen. The motors, servo
//! and a "motors finished" sensor are driven by a microcontroller over a serial link.

pub mod actuator;
pub mod canvas;
pub mod checkpoint;
pub mod config;
pub mod device;
pub mod error;
pub mod geometry;
pub mod kinematics;
pub mod observation;
pub mod protocol;
pub mod range;
pub mod sequencer;
pub mod serial;
pub mod svg;

use std::{
    fs,
    io::{Read, Write},
    path::Path,
};

pub use config::PlotterConfig;
use device::DeviceLink;
pub use error::PlotError;
use error::CheckpointError;
pub use geometry::Instruction;
use geometry::Subpath;
use sequencer::{Actuators, JobSummary, Plotter};
use svg::{extract_subpaths, parse_svg};

/// A loaded design.
pub struct Design {
    /// The name of the design.
    name: String,
    /// The SVG tree.
    tree: usvg::Tree,
}

impl Design {
    /// Loads a design from an SVG file.
    ///
    /// # Arguments
    /// * `path`: The SVG file.
    ///
    /// # Errors
    /// [`PlotError::DesignUnreadable`] if the file cannot be read, [`PlotError::Svg`] if it is
    /// not a valid SVG.
    pub fn load(path: &Path) -> Result<Self, PlotError> {
        let bytes = fs::read(path).map_err(|source| PlotError::DesignUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map_or_else(|| "design".to_string(), |stem| stem.to_string_lossy().into_owned());

        Ok(Design {
            name,
            tree: parse_svg(path, &bytes)?,
        })
    }

    /// Gets the name of the design.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the SVG tree.
    #[must_use]
    pub fn tree(&self) -> &usvg::Tree {
        &self.tree
    }

    /// Gets the outlines of the design.
    ///
    /// # Arguments
    /// * `tolerance`: How far, in SVG units, flattened curves may stray from the real ones.
    #[must_use]
    pub fn subpaths(&self, tolerance: f32) -> Vec<Subpath> {
        extract_subpaths(&self.tree, tolerance)
    }
}

/// Warns about canvas edges with less padding than recommended or than the rig's pen holder
/// needs, where the pen holder may hit the edge of the canvas.
///
/// # Arguments
/// * `config`: The plotter's configuration.
pub fn warn_on_tight_padding(config: &PlotterConfig) {
    for edge in config
        .canvas
        .undersized_edges(&config.minimum_padding())
    {
        log::warn!("the {edge} padding is smaller than recommended, the pen holder may leave the canvas");
    }
}

/// Works out the moves that draw a design.
///
/// # Arguments
/// * `design`: The design to draw.
/// * `config`: The plotter's configuration.
///
/// # Returns
/// The moves, in drawing order.
///
/// # Errors
/// A [`PlotError`] if the configuration is unusable or the design cannot be fitted to the
/// canvas.
pub fn plan(design: &Design, config: &PlotterConfig) -> Result<Vec<Instruction>, PlotError> {
    let planner = config.planner()?;
    warn_on_tight_padding(config);

    let subpaths = design.subpaths(config.flatten_tolerance);
    log::info!("planning {}", design.name());
    Ok(planner.plan(&subpaths)?)
}

/// Draws planned moves over an open link to the controller.
///
/// # Arguments
/// * `instructions`: The moves.
/// * `link`: The controller.
/// * `actuators`: The hardware on the controller to drive.
/// * `config`: The plotter's configuration.
/// * `start_from`: How many moves to skip, because an earlier run drew them.
///
/// # Returns
/// What was done.
///
/// # Errors
/// [`PlotError::Halted`] if the controller could not be driven.
pub fn draw<T: Read + Write>(
    instructions: &[Instruction],
    link: DeviceLink<T>,
    actuators: Actuators,
    config: &PlotterConfig,
    start_from: usize,
) -> Result<JobSummary, PlotError> {
    let mut plotter = Plotter::new(link, actuators, config.pen, config.poll_interval())
        .with_checkpoint(config.checkpoint());
    plotter.run(instructions, start_from)
}

/// Draws an SVG file on the plotter.
///
/// Everything that can be checked is checked before the serial port is opened.
///
/// # Arguments
/// * `path`: The SVG file.
/// * `config`: The plotter's configuration.
/// * `start_from`: How many moves to skip, because an earlier run drew them.
///
/// # Returns
/// What was done.
///
/// # Errors
/// A [`PlotError`] if the design or configuration is unusable, or the controller could not be
/// reached or driven.
pub fn plot_svg(
    path: &Path,
    config: &PlotterConfig,
    start_from: usize,
) -> Result<JobSummary, PlotError> {
    let actuators = config.actuators()?;
    let design = Design::load(path)?;
    let instructions = plan(&design, config)?;

    let port = serial::open(&config.serial)?;
    let link = DeviceLink::new(port, config.serial.max_read_attempts);
    draw(&instructions, link, actuators, config, start_from)
}

/// Finds where an interrupted job left off.
///
/// # Arguments
/// * `config`: The plotter's configuration, which says where the checkpoint is.
///
/// # Returns
/// How many moves to skip. The last move recorded is repeated, since its targets are absolute
/// repeating it is harmless. 0 if there is no checkpoint.
///
/// # Errors
/// A [`CheckpointError`] if the checkpoint exists but cannot be used.
pub fn resume_point(config: &PlotterConfig) -> Result<usize, CheckpointError> {
    Ok(config.checkpoint().load()?.unwrap_or(0))
}
