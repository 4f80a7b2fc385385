//! `geometry`
//!
//! Turns the outline of a design into the list of moves that draw it.
//!
//! Outlines arrive as subpaths, disconnected runs of points in whatever units the design uses,
//! with y increasing downwards. They are scaled to fit the canvas frame without stretching,
//! centred in it, flipped so that y increases upwards, filled in so that no two consecutive
//! points are further apart than the configured spacing, and finally converted into motor
//! targets. The pen is lifted after the last point of every subpath.

use serde::{Deserialize, Serialize};

use crate::{
    canvas::Canvas,
    error::{ConfigurationError, DrawingError},
    kinematics::Rig,
};

/// A point on the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point { x, y }
    }
}

impl Point {
    /// Gets the straight-line distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Finds the point a fraction of the way along the line to another point.
    ///
    /// # Arguments
    /// * `other`: Where the line ends.
    /// * `t`: How far along the line, 0 is `self` and 1 is `other`.
    #[must_use]
    pub fn lerp(&self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + t * (other.x - self.x),
            y: self.y + t * (other.y - self.y),
        }
    }
}

/// One continuous stroke of a design.
pub type Subpath = Vec<Point>;

/// A single move of the plotter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Horizontal position of the pen in cm from the left edge of the canvas.
    pub x_cm: f64,
    /// Vertical position of the pen in cm from the bottom edge of the canvas.
    pub y_cm: f64,
    /// Absolute target for the top-left motor, in steps from the origin.
    pub left_motor_steps: i64,
    /// Absolute target for the top-right motor, in steps from the origin.
    pub right_motor_steps: i64,
    /// Whether the pen should be on the canvas once this move has finished.
    pub pen_down_after: bool,
}

/// The smallest rectangle containing every point of a design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Smallest x and y.
    pub min: Point,
    /// Largest x and y.
    pub max: Point,
}

impl BoundingBox {
    /// Measures a design.
    ///
    /// # Arguments
    /// * `subpaths`: The design.
    ///
    /// # Returns
    /// The bounds of the design.
    ///
    /// # Errors
    /// [`DrawingError::Empty`] if there are no points, [`DrawingError::Degenerate`] if the
    /// points have no width or no height, since no scale would fit them to the canvas.
    pub fn of(subpaths: &[Subpath]) -> Result<Self, DrawingError> {
        let mut points = subpaths.iter().flatten();
        let first = points.next().ok_or(DrawingError::Empty)?;

        let bounds = points.fold(
            BoundingBox {
                min: *first,
                max: *first,
            },
            |bounds, point| BoundingBox {
                min: Point {
                    x: bounds.min.x.min(point.x),
                    y: bounds.min.y.min(point.y),
                },
                max: Point {
                    x: bounds.max.x.max(point.x),
                    y: bounds.max.y.max(point.y),
                },
            },
        );

        let (width, height) = (bounds.width(), bounds.height());
        if !(width > 0.0 && height > 0.0) {
            return Err(DrawingError::Degenerate { width, height });
        }

        Ok(bounds)
    }

    /// Gets the width of the box.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Gets the height of the box.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Places design points onto the canvas.
///
/// The design is scaled by the same factor in both axes, as large as the frame allows, and the
/// space left over in the other axis is split evenly either side of it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    /// Where the design starts in its own units.
    origin: Point,
    /// Canvas cm per design unit.
    scale: f64,
    /// Left edge of the placed design, in canvas cm.
    left: f64,
    /// Top edge of the placed design, in canvas cm from the bottom.
    top: f64,
}

impl Fit {
    /// Works out how to place a design with the given bounds.
    ///
    /// # Arguments
    /// * `bounds`: The bounds of the design, see [`BoundingBox::of`].
    /// * `canvas`: The canvas to place it on.
    #[must_use]
    pub fn new(bounds: &BoundingBox, canvas: &Canvas) -> Self {
        let frame_width = canvas.frame_width();
        let frame_height = canvas.frame_height();

        let scale = (frame_width / bounds.width()).min(frame_height / bounds.height());
        let slack_x = (frame_width - bounds.width() * scale) / 2.0;
        let slack_y = (frame_height - bounds.height() * scale) / 2.0;

        Fit {
            origin: bounds.min,
            scale,
            left: canvas.padding().left + slack_x,
            top: canvas.height() - canvas.padding().top - slack_y,
        }
    }

    /// Gets the number of canvas cm per design unit.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Moves a design point onto the canvas.
    ///
    /// # Arguments
    /// * `point`: A point in design units, y increasing downwards.
    ///
    /// # Returns
    /// The point in canvas cm, y increasing upwards.
    #[must_use]
    pub fn place(&self, point: Point) -> Point {
        Point {
            x: self.left + (point.x - self.origin.x) * self.scale,
            y: self.top - (point.y - self.origin.y) * self.scale,
        }
    }
}

/// Fills in a subpath so that consecutive points are never more than `max_spacing` apart.
///
/// Between each pair of points `floor(distance / max_spacing)` points are added, evenly spaced
/// along the straight line joining them.
///
/// # Arguments
/// * `subpath`: The points to fill in.
/// * `max_spacing`: The largest allowed gap, must be positive.
///
/// # Returns
/// The original points with the new points between them.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn interpolate(subpath: &[Point], max_spacing: f64) -> Vec<Point> {
    let Some(last) = subpath.last() else {
        return Vec::new();
    };

    let mut filled = Vec::with_capacity(subpath.len());
    for pair in subpath.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        filled.push(from);

        let extra = (from.distance_to(to) / max_spacing).floor() as usize;
        #[allow(clippy::cast_precision_loss)]
        let divisions = (extra + 1) as f64;
        for index in 1..=extra {
            #[allow(clippy::cast_precision_loss)]
            let t = index as f64 / divisions;
            filled.push(from.lerp(to, t));
        }
    }
    filled.push(*last);

    filled
}

/// Plans drawing jobs for a particular canvas and rig.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Planner {
    /// What is being drawn on.
    canvas: Canvas,
    /// What is doing the drawing.
    rig: Rig,
    /// Largest gap between consecutive moves, in cm.
    max_spacing: f64,
}

impl Planner {
    /// Creates a new [`Planner`].
    ///
    /// # Arguments
    /// * `canvas`: The canvas being drawn on.
    /// * `rig`: The plotter's measurements.
    /// * `max_spacing`: Largest gap between consecutive moves, in cm. Smaller gaps draw
    ///   straighter lines, but take longer.
    ///
    /// # Errors
    /// A [`ConfigurationError`] if `max_spacing` is not positive or the rig cannot move.
    pub fn new(canvas: Canvas, rig: Rig, max_spacing: f64) -> Result<Self, ConfigurationError> {
        if !(max_spacing > 0.0) {
            return Err(ConfigurationError::NonPositiveSpacing(max_spacing));
        }
        rig.validate()?;

        Ok(Planner {
            canvas,
            rig,
            max_spacing,
        })
    }

    /// Gets the canvas being planned for.
    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Scales a design onto the canvas.
    ///
    /// # Arguments
    /// * `subpaths`: The design, in its own units with y increasing downwards.
    ///
    /// # Returns
    /// The same subpaths in canvas cm, with y increasing upwards.
    ///
    /// # Errors
    /// A [`DrawingError`] if the design has no points or no area.
    pub fn place(&self, subpaths: &[Subpath]) -> Result<Vec<Subpath>, DrawingError> {
        let bounds = BoundingBox::of(subpaths)?;
        let fit = Fit::new(&bounds, &self.canvas);
        log::debug!(
            "design is {}x{} units, scaling by {}",
            bounds.width(),
            bounds.height(),
            fit.scale()
        );

        Ok(subpaths
            .iter()
            .map(|subpath| subpath.iter().map(|point| fit.place(*point)).collect())
            .collect())
    }

    /// Turns points on the canvas into moves.
    ///
    /// The pen goes down after every point except the last of each subpath. Empty subpaths are
    /// skipped.
    ///
    /// # Arguments
    /// * `subpaths`: Points in canvas cm, y increasing upwards.
    ///
    /// # Returns
    /// The moves, in drawing order.
    #[must_use]
    pub fn instructions(&self, subpaths: &[Subpath]) -> Vec<Instruction> {
        let mut instructions = Vec::new();

        for subpath in subpaths {
            let filled = interpolate(subpath, self.max_spacing);
            let last = filled.len().saturating_sub(1);

            instructions.extend(filled.into_iter().enumerate().map(|(index, point)| {
                let positions = self.rig.motor_positions(&self.canvas, point);
                Instruction {
                    x_cm: point.x,
                    y_cm: point.y,
                    left_motor_steps: positions.left,
                    right_motor_steps: positions.right,
                    pen_down_after: index != last,
                }
            }));
        }

        instructions
    }

    /// Plans a drawing job.
    ///
    /// # Arguments
    /// * `subpaths`: The design, in its own units with y increasing downwards.
    ///
    /// # Returns
    /// The moves that draw the design, in order.
    ///
    /// # Errors
    /// A [`DrawingError`] if the design has no points or no area.
    pub fn plan(&self, subpaths: &[Subpath]) -> Result<Vec<Instruction>, DrawingError> {
        let placed = self.place(subpaths)?;
        let instructions = self.instructions(&placed);
        log::info!(
            "planned {} moves across {} strokes",
            instructions.len(),
            subpaths.iter().filter(|subpath| !subpath.is_empty()).count()
        );

        Ok(instructions)
    }
}
