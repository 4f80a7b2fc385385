//! `error`
//!
//! The things that can go wrong between reading a design and moving the pen.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::sequencer::Phase;

/// The rig or job has been configured with values that cannot work.
///
/// Raised while the rig is being set up, before anything is sent to the device.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// Shield-connected servos are addressed by a 4-bit channel.
    #[error("shield-connected servo pin {pin} is out of range, shield pins must be 15 or lower")]
    ShieldPinOutOfRange {
        /// The offending pin.
        pin: u8,
    },
    /// Pulse widths cannot be negative.
    #[error("servo microsecond range ({low}, {high}) contains a negative bound")]
    NegativeMicroseconds {
        /// Lower bound of the range.
        low: i32,
        /// Upper bound of the range.
        high: i32,
    },
    /// An actuation range whose ends are equal cannot be mapped onto pulse widths.
    #[error("servo actuation range ({low}, {high}) is empty")]
    EmptyActuationRange {
        /// Lower bound of the range.
        low: f64,
        /// Upper bound of the range.
        high: f64,
    },
    /// The canvas has no drawable area left once the padding is taken off.
    #[error("canvas frame is {width}cm x {height}cm, both sides must be positive")]
    EmptyFrame {
        /// Width of the frame in cm.
        width: f64,
        /// Height of the frame in cm.
        height: f64,
    },
    /// Padding pushes the frame outside the canvas.
    #[error("canvas padding must not be negative")]
    NegativePadding,
    /// Two instruction points cannot be closer than nothing.
    #[error("maximum spacing between points must be positive, got {0}cm")]
    NonPositiveSpacing(f64),
    /// The belt would never move.
    #[error("the rig must move a positive number of steps per cm, got {0}")]
    NonPositiveStepsPerCm(f64),
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}: {source}")]
    Unreadable {
        /// The file that was being read.
        path: PathBuf,
        /// What went wrong.
        source: io::Error,
    },
    /// The configuration file is not valid.
    #[error("invalid configuration in {path}: {source}")]
    Invalid {
        /// The file that was being read.
        path: PathBuf,
        /// What went wrong.
        source: serde_json::Error,
    },
}

/// The design cannot be fitted onto the canvas.
#[derive(Error, Debug, PartialEq)]
pub enum DrawingError {
    /// There are no points to draw at all.
    #[error("the drawing contains no points")]
    Empty,
    /// Every point lies on a single horizontal or vertical line, so there is no scale that fits it.
    #[error("the drawing is {width} units wide and {height} units tall, it needs extent in both axes")]
    Degenerate {
        /// Width of the drawing in its own units.
        width: f64,
        /// Height of the drawing in its own units.
        height: f64,
    },
}

/// Talking to the device failed.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// The serial port could not be opened.
    #[error("failed to open serial port {port}: {source}")]
    Open {
        /// The port that was being opened.
        port: String,
        /// What went wrong.
        source: serialport::Error,
    },
    /// The serial ports on this machine could not be listed.
    #[error("failed to list serial ports: {0}")]
    Enumerate(serialport::Error),
    /// Reading from or writing to the device failed.
    #[error("serial I/O failed: {0}")]
    Io(#[from] io::Error),
    /// The device never answered a sensor query.
    #[error("no response from sensor {sensor} after {attempts} reads")]
    Unresponsive {
        /// Index of the sensor that was queried.
        sensor: u8,
        /// How many reads were made before giving up.
        attempts: u32,
    },
}

/// The resume checkpoint could not be used.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// The checkpoint file could not be written, read or removed.
    #[error("checkpoint {path} is not accessible: {source}")]
    Persistence {
        /// Location of the checkpoint file.
        path: PathBuf,
        /// What went wrong.
        source: io::Error,
    },
    /// The checkpoint file does not hold an instruction index.
    #[error("checkpoint {path} does not contain an instruction index: {content:?}")]
    Corrupt {
        /// Location of the checkpoint file.
        path: PathBuf,
        /// What the file actually contained.
        content: String,
    },
}

/// Errors that halt a drawing job.
#[derive(Error, Debug)]
pub enum PlotError {
    /// The rig configuration is unusable.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The design file could not be read.
    #[error("failed to read design {path}: {source}")]
    DesignUnreadable {
        /// The design file.
        path: PathBuf,
        /// What went wrong.
        source: io::Error,
    },
    /// The SVG could not be parsed.
    #[error("error parsing design: {0}")]
    Svg(#[from] usvg::Error),
    /// The design could not be fitted onto the canvas.
    #[error(transparent)]
    Drawing(#[from] DrawingError),
    /// The device could not be reached before the job started.
    #[error(transparent)]
    Device(#[from] DeviceError),
    /// Motion stopped part way through the job, the pen is somewhere around `instruction`.
    #[error("halted at instruction {instruction} while {phase}: {source}")]
    Halted {
        /// Index of the instruction being carried out.
        instruction: usize,
        /// What the sequencer was doing at the time.
        phase: Phase,
        /// The underlying device failure.
        source: DeviceError,
    },
    /// The resume checkpoint could not be read.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}
