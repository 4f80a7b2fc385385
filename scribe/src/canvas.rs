//! `canvas`
//!
//! The surface being drawn on and the frame inside it that the drawing is fitted to.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Distances kept clear around each edge of the canvas, in cm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    /// Clearance below the top edge, where the motors hang.
    pub top: f64,
    /// Clearance from the left edge.
    pub left: f64,
    /// Clearance from the right edge.
    pub right: f64,
    /// Clearance above the bottom edge.
    pub bottom: f64,
}

impl Padding {
    /// Takes the larger padding on each edge.
    #[must_use]
    pub fn at_least(&self, other: &Padding) -> Padding {
        Padding {
            top: self.top.max(other.top),
            left: self.left.max(other.left),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// The smallest padding that keeps the pen holder on the canvas on the reference rig.
pub const RECOMMENDED_PADDING: Padding = Padding {
    top: 10.0,
    left: 5.0,
    right: 5.0,
    bottom: 5.0,
};

/// One side of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Top edge.
    Top,
    /// Left edge.
    Left,
    /// Right edge.
    Right,
    /// Bottom edge.
    Bottom,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Edge::Top => "top",
            Edge::Left => "left",
            Edge::Right => "right",
            Edge::Bottom => "bottom",
        })
    }
}

/// The drawing surface, measured in cm with the origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CanvasDimensions", into = "CanvasDimensions")]
pub struct Canvas {
    /// Width of the surface.
    width: f64,
    /// Height of the surface.
    height: f64,
    /// Clearance around the drawing.
    padding: Padding,
}

/// The serialised form of a [`Canvas`], validated on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasDimensions {
    /// Width of the surface in cm.
    pub width: f64,
    /// Height of the surface in cm.
    pub height: f64,
    /// Clearance around the drawing in cm.
    pub padding: Padding,
}

impl Canvas {
    /// Creates a new [`Canvas`].
    ///
    /// The pen holder needs room around the frame, which the padding must provide. This can
    /// only be checked against a particular rig, see [`Canvas::undersized_edges`].
    ///
    /// # Arguments
    /// * `width`: Width of the surface in cm.
    /// * `height`: Height of the surface in cm.
    /// * `padding`: Clearance around each edge in cm.
    ///
    /// # Errors
    /// A [`ConfigurationError`] if any padding is negative or the padding leaves no frame.
    pub fn new(width: f64, height: f64, padding: Padding) -> Result<Self, ConfigurationError> {
        let Padding {
            top,
            left,
            right,
            bottom,
        } = padding;
        if [top, left, right, bottom].iter().any(|side| *side < 0.0) {
            return Err(ConfigurationError::NegativePadding);
        }

        let canvas = Canvas {
            width,
            height,
            padding,
        };
        let (frame_width, frame_height) = (canvas.frame_width(), canvas.frame_height());
        // Written this way round so that NaN is rejected too.
        if !(frame_width > 0.0 && frame_height > 0.0) {
            return Err(ConfigurationError::EmptyFrame {
                width: frame_width,
                height: frame_height,
            });
        }

        Ok(canvas)
    }

    /// Gets the width of the surface in cm.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Gets the height of the surface in cm.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Gets the padding around each edge.
    #[must_use]
    pub fn padding(&self) -> &Padding {
        &self.padding
    }

    /// Gets the width available for drawing, in cm.
    #[must_use]
    pub fn frame_width(&self) -> f64 {
        self.width - self.padding.left - self.padding.right
    }

    /// Gets the height available for drawing, in cm.
    #[must_use]
    pub fn frame_height(&self) -> f64 {
        self.height - self.padding.top - self.padding.bottom
    }

    /// Finds the edges whose padding is below a minimum.
    ///
    /// # Arguments
    /// * `minimum`: The least padding the rig needs on each edge.
    ///
    /// # Returns
    /// The edges that are too close to the drawing, top, left, right, bottom order.
    #[must_use]
    pub fn undersized_edges(&self, minimum: &Padding) -> Vec<Edge> {
        [
            (Edge::Top, self.padding.top, minimum.top),
            (Edge::Left, self.padding.left, minimum.left),
            (Edge::Right, self.padding.right, minimum.right),
            (Edge::Bottom, self.padding.bottom, minimum.bottom),
        ]
        .into_iter()
        .filter(|(_, padding, minimum)| padding < minimum)
        .map(|(edge, _, _)| edge)
        .collect()
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Canvas {
            width: 51.0,
            height: 31.0,
            padding: Padding {
                top: 5.0,
                left: 2.0,
                right: 2.0,
                bottom: 5.0,
            },
        }
    }
}

impl TryFrom<CanvasDimensions> for Canvas {
    type Error = ConfigurationError;

    fn try_from(dimensions: CanvasDimensions) -> Result<Self, Self::Error> {
        Canvas::new(dimensions.width, dimensions.height, dimensions.padding)
    }
}

impl From<Canvas> for CanvasDimensions {
    fn from(canvas: Canvas) -> Self {
        CanvasDimensions {
            width: canvas.width,
            height: canvas.height,
            padding: canvas.padding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PADDING: Padding = Padding {
        top: 5.0,
        left: 2.0,
        right: 2.0,
        bottom: 5.0,
    };

    #[test]
    fn test_frame() {
        let canvas = Canvas::new(51.0, 31.0, PADDING).unwrap();
        assert_eq!(canvas.frame_width(), 47.0);
        assert_eq!(canvas.frame_height(), 21.0);
        assert_eq!(canvas, Canvas::default());
    }

    #[test]
    fn test_new_rejects_unusable_canvas() {
        assert!(matches!(
            Canvas::new(4.0, 31.0, PADDING),
            Err(ConfigurationError::EmptyFrame { .. })
        ));
        assert!(matches!(
            Canvas::new(51.0, 10.0, PADDING),
            Err(ConfigurationError::EmptyFrame { .. })
        ));
        assert!(matches!(
            Canvas::new(f64::NAN, 31.0, PADDING),
            Err(ConfigurationError::EmptyFrame { .. })
        ));
        assert!(matches!(
            Canvas::new(
                51.0,
                31.0,
                Padding {
                    left: -1.0,
                    ..PADDING
                }
            ),
            Err(ConfigurationError::NegativePadding)
        ));
    }

    #[test]
    fn test_undersized_edges() {
        let canvas = Canvas::default();
        assert_eq!(
            canvas.undersized_edges(&RECOMMENDED_PADDING),
            vec![Edge::Top, Edge::Left, Edge::Right]
        );
        assert!(canvas.undersized_edges(&PADDING).is_empty());
    }

    #[test]
    fn test_padding_at_least() {
        let wide = Padding {
            top: 1.0,
            left: 8.0,
            right: 8.0,
            bottom: 0.0,
        };
        assert_eq!(
            RECOMMENDED_PADDING.at_least(&wide),
            Padding {
                top: 10.0,
                left: 8.0,
                right: 8.0,
                bottom: 5.0,
            }
        );
        assert_eq!(wide.at_least(&RECOMMENDED_PADDING), RECOMMENDED_PADDING.at_least(&wide));
    }

    #[test]
    fn test_deserialise_validates() {
        let canvas: Canvas = serde_json::from_str(
            r#"{"width":60,"height":40,"padding":{"top":10,"left":5,"right":5,"bottom":5}}"#,
        )
        .unwrap();
        assert_eq!(canvas.frame_width(), 50.0);
        assert_eq!(canvas.frame_height(), 25.0);

        assert!(serde_json::from_str::<Canvas>(
            r#"{"width":6,"height":40,"padding":{"top":10,"left":5,"right":5,"bottom":5}}"#,
        )
        .is_err());
    }
}
