//! `sequencer`
//!
//! Carries out a list of instructions on the plotter, one at a time and in order.
//!
//! Each instruction goes through the same phases: both motor targets are issued, the
//! controller's completion sensor is polled until the motors have stopped, the pen is moved if
//! it needs to be, and then the instruction is committed to the checkpoint so that an
//! interrupted job can be resumed from it.

use std::{
    fmt,
    io::{Read, Write},
    thread,
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::{
    actuator::{Sensor, Servo, Stepper},
    checkpoint::Checkpoint,
    device::DeviceLink,
    error::{DeviceError, PlotError},
    geometry::Instruction,
};

/// What the sequencer is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Lifting the pen before the first move of a job.
    RaisingPen,
    /// Sending the motor targets.
    Issued,
    /// Waiting for the controller to report that the motors have stopped.
    AwaitingCompletion,
    /// Lifting or lowering the pen.
    PenAdjusting,
    /// Recording that the instruction is done.
    Committed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::RaisingPen => "raising the pen",
            Phase::Issued => "issuing motor targets",
            Phase::AwaitingCompletion => "awaiting motor completion",
            Phase::PenAdjusting => "adjusting the pen",
            Phase::Committed => "committing",
        })
    }
}

/// The hardware the sequencer drives.
#[derive(Debug, Clone, PartialEq)]
pub struct Actuators {
    /// Motor winding the top-left belt.
    pub left: Stepper,
    /// Motor winding the top-right belt.
    pub right: Stepper,
    /// Servo that lifts the pen off the canvas.
    pub pen: Servo,
    /// Sensor that reads non-zero once both motors have reached their targets.
    pub completion: Sensor,
}

/// How the pen is moved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenSettings {
    /// Pen servo angle that puts the pen on the canvas.
    pub down_angle: f64,
    /// Pen servo angle that lifts the pen off the canvas.
    pub up_angle: f64,
    /// How long to let the pen settle after moving it, in ms.
    pub settle_ms: u64,
}

impl Default for PenSettings {
    fn default() -> Self {
        PenSettings {
            down_angle: 30.0,
            up_angle: -90.0,
            settle_ms: 500,
        }
    }
}

/// What happened during a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSummary {
    /// Instructions in the job.
    pub total: usize,
    /// Instructions skipped because an earlier run had already drawn them.
    pub skipped: usize,
    /// Instructions carried out by this run.
    pub drawn: usize,
}

/// Drives the plotter through drawing jobs.
pub struct Plotter<T: Read + Write> {
    /// The controller.
    link: DeviceLink<T>,
    /// What is being driven.
    actuators: Actuators,
    /// How the pen is moved.
    pen: PenSettings,
    /// Time between completion polls.
    poll_interval: Duration,
    /// Whether the pen is believed to be on the canvas.
    pen_down: bool,
    /// Where progress is recorded, if anywhere.
    checkpoint: Option<Checkpoint>,
}

impl<T: Read + Write> Plotter<T> {
    /// Creates a new [`Plotter`].
    ///
    /// The pen is assumed to be down, so the first job always starts by lifting it.
    ///
    /// # Arguments
    /// * `link`: The controller.
    /// * `actuators`: The hardware on the controller to drive.
    /// * `pen`: How the pen is moved.
    /// * `poll_interval`: Time between completion polls.
    #[must_use]
    pub fn new(
        link: DeviceLink<T>,
        actuators: Actuators,
        pen: PenSettings,
        poll_interval: Duration,
    ) -> Self {
        Plotter {
            link,
            actuators,
            pen,
            poll_interval,
            pen_down: true,
            checkpoint: None,
        }
    }

    /// Records progress in a checkpoint while drawing.
    #[must_use]
    pub fn with_checkpoint(mut self, checkpoint: Checkpoint) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// Gets the link to the controller.
    #[must_use]
    pub fn link(&self) -> &DeviceLink<T> {
        &self.link
    }

    /// Gives back the link to the controller.
    #[must_use]
    pub fn into_link(self) -> DeviceLink<T> {
        self.link
    }

    /// Gets whether the pen is believed to be on the canvas.
    #[must_use]
    pub fn pen_down(&self) -> bool {
        self.pen_down
    }

    /// Puts the pen on or takes it off the canvas, unless it already is.
    ///
    /// # Arguments
    /// * `down`: Whether the pen should be on the canvas.
    ///
    /// # Errors
    /// A [`DeviceError`] if the servo could not be commanded.
    pub fn set_pen(&mut self, down: bool) -> Result<(), DeviceError> {
        if self.pen_down == down {
            return Ok(());
        }

        let angle = if down {
            self.pen.down_angle
        } else {
            self.pen.up_angle
        };
        self.link.set_servo(&self.actuators.pen, angle)?;
        thread::sleep(Duration::from_millis(self.pen.settle_ms));
        self.pen_down = down;

        Ok(())
    }

    /// Waits for the controller to report that the motors have stopped.
    ///
    /// # Errors
    /// A [`DeviceError`] if the controller stops answering.
    pub fn wait_for_completion(&mut self) -> Result<(), DeviceError> {
        while self.link.poll(&self.actuators.completion)? == 0 {
            log::trace!("motors still moving");
            thread::sleep(self.poll_interval);
        }

        Ok(())
    }

    /// Carries out a single instruction.
    ///
    /// # Arguments
    /// * `index`: Where the instruction is in its job, for reporting.
    /// * `instruction`: The instruction.
    ///
    /// # Errors
    /// [`PlotError::Halted`] if the controller could not be driven.
    pub fn follow(&mut self, index: usize, instruction: &Instruction) -> Result<(), PlotError> {
        let halted = |phase| move |source| PlotError::Halted {
            instruction: index,
            phase,
            source,
        };

        log::debug!("instruction {index}: {}", Phase::Issued);
        self.link
            .set_stepper(&self.actuators.left, instruction.left_motor_steps)
            .map_err(halted(Phase::Issued))?;
        self.link
            .set_stepper(&self.actuators.right, instruction.right_motor_steps)
            .map_err(halted(Phase::Issued))?;

        log::debug!("instruction {index}: {}", Phase::AwaitingCompletion);
        self.wait_for_completion()
            .map_err(halted(Phase::AwaitingCompletion))?;

        if self.pen_down != instruction.pen_down_after {
            log::debug!("instruction {index}: {}", Phase::PenAdjusting);
            self.set_pen(instruction.pen_down_after)
                .map_err(halted(Phase::PenAdjusting))?;
        }

        log::debug!("instruction {index}: {}", Phase::Committed);
        self.commit(index);

        Ok(())
    }

    /// Draws a job.
    ///
    /// The pen is lifted first, then the instructions are carried out in order, starting from
    /// `start_from`. Once every instruction is done the checkpoint is removed.
    ///
    /// # Arguments
    /// * `instructions`: The job.
    /// * `start_from`: How many instructions to skip, because an earlier run drew them.
    ///
    /// # Returns
    /// What was done.
    ///
    /// # Errors
    /// [`PlotError::Halted`] if the controller could not be driven. The checkpoint is left in
    /// place so that the job can be resumed.
    pub fn run(
        &mut self,
        instructions: &[Instruction],
        start_from: usize,
    ) -> Result<JobSummary, PlotError> {
        let total = instructions.len();
        let skipped = start_from.min(total);
        log::info!("drawing {total} instructions, starting from instruction {start_from}");
        if start_from > 0 {
            log::warn!("skipping the first {skipped} instructions, they were drawn by an earlier run");
        }

        log::debug!("instruction {start_from}: {}", Phase::RaisingPen);
        self.set_pen(false).map_err(|source| PlotError::Halted {
            instruction: start_from,
            phase: Phase::RaisingPen,
            source,
        })?;

        for (index, instruction) in instructions.iter().enumerate().skip(start_from) {
            self.follow(index, instruction)?;
        }

        if let Some(checkpoint) = &self.checkpoint {
            if let Err(err) = checkpoint.clear() {
                log::warn!("drawing finished but the checkpoint remains: {err}");
            }
        }

        let summary = JobSummary {
            total,
            skipped,
            drawn: total - skipped,
        };
        log::info!("drawing complete, {} instructions drawn", summary.drawn);

        Ok(summary)
    }

    /// Records that an instruction is done. Failing to record it does not stop the job, it only
    /// means a resumed job would repeat more work.
    fn commit(&self, index: usize) {
        if let Some(checkpoint) = &self.checkpoint {
            if let Err(err) = checkpoint.save(index) {
                log::warn!("could not record progress: {err}");
            }
        }
    }
}
