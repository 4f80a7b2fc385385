//! `svg`
//!
//! Reads designs from SVG files and breaks them down into the subpaths the plotter draws.
use std::{path::Path, sync::Arc};

use lyon_algorithms::path::{iterator::PathIterator, math::point, PathEvent};
use usvg::{tiny_skia_path::PathSegment, Transform};

use crate::geometry::{Point, Subpath};

/// Parses an SVG file.
///
/// # Arguments
/// * `path`: The path to the file, used to resolve anything the SVG links to relative to it.
/// * `bytes`: The bytes of the file.
///
/// # Returns
/// The parsed SVG.
///
/// # Errors
/// Parsing errors if a tree cannot be parsed from the provided `bytes`.
#[allow(clippy::module_name_repetitions)]
pub fn parse_svg(path: &Path, bytes: &[u8]) -> Result<usvg::Tree, usvg::Error> {
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();

    fontdb.set_serif_family("Times New Roman");
    fontdb.set_sans_serif_family("Arial");
    fontdb.set_monospace_family("Courier New");

    let options = usvg::Options {
        resources_dir: path.parent().map(Path::to_path_buf),
        languages: vec!["en-GB".to_string()],
        fontdb: Arc::new(fontdb),
        ..usvg::Options::default()
    };

    usvg::Tree::from_data(bytes, &options)
}

/// Finds every visible outline in an SVG and flattens it into straight lines.
///
/// Text is drawn using the outlines of its glyphs. Every outline is drawn whatever its stroke
/// or fill, so that the plotter draws what a viewer would see edges of.
///
/// # Arguments
/// * `svg`: The parsed SVG.
/// * `tolerance`: How far, in SVG units, a flattened curve may stray from the real one.
///
/// # Returns
/// The subpaths in document order, in SVG user units with y increasing downwards. Closed
/// subpaths end where they started.
#[must_use]
pub fn extract_subpaths(svg: &usvg::Tree, tolerance: f32) -> Vec<Subpath> {
    let mut subpaths = Vec::new();
    collect_subpaths(svg.root(), Transform::identity(), tolerance, &mut subpaths);
    log::debug!("extracted {} subpaths", subpaths.len());
    subpaths
}

/// Walks a group collecting subpaths.
/// Be warned, here be recursion.
///
/// Clip paths, masks and patterns are never visited, they shape what is seen but are not drawn
/// themselves.
///
/// # Arguments
/// * `group`: The SVG group to search through. May contain nested groups.
/// * `parent`: Placement of `group`'s tree in the document. Paths know their own absolute
///   transform within a tree, but the outlines of text form a tree of their own, so they need
///   the text's placement applied on top.
/// * `tolerance`: How far a flattened curve may stray from the real one.
/// * `subpaths`: Where to put the subpaths found.
fn collect_subpaths(
    group: &usvg::Group,
    parent: Transform,
    tolerance: f32,
    subpaths: &mut Vec<Subpath>,
) {
    for child in group.children() {
        match child {
            usvg::Node::Group(child_group) => {
                collect_subpaths(child_group, parent, tolerance, subpaths);
            }
            usvg::Node::Path(path) => {
                if path.is_visible() {
                    flatten_path(path, parent, tolerance, subpaths);
                }
            }
            usvg::Node::Text(text) => collect_subpaths(
                text.flattened(),
                parent.pre_concat(text.abs_transform()),
                tolerance,
                subpaths,
            ),
            // Raster images have no outlines to follow.
            usvg::Node::Image(_) => {}
        }
    }
}

/// Places a path in the document's coordinates and flattens it.
///
/// # Arguments
/// * `path`: The path to flatten.
/// * `parent`: Placement of the tree the path belongs to, see [`collect_subpaths`].
/// * `tolerance`: How far a flattened curve may stray from the real one.
/// * `subpaths`: Where to put the subpaths of the path.
fn flatten_path(
    path: &usvg::Path,
    parent: Transform,
    tolerance: f32,
    subpaths: &mut Vec<Subpath>,
) {
    let transform = parent.pre_concat(path.abs_transform());
    let Some(data) = path.data().clone().transform(transform) else {
        log::warn!("skipping path {:?}, its transform cannot be applied", path.id());
        return;
    };

    let mut builder = lyon_algorithms::path::Path::builder();
    let mut open = false;
    let mut start = point(0.0, 0.0);

    for segment in data.segments() {
        match segment {
            PathSegment::MoveTo(to) => {
                if open {
                    builder.end(false);
                }
                start = point(to.x, to.y);
                builder.begin(start);
                open = true;
            }
            PathSegment::LineTo(to) => {
                if !open {
                    builder.begin(start);
                    open = true;
                }
                builder.line_to(point(to.x, to.y));
            }
            // The target point is the end of the curve, the control point is somewhere in the middle.
            PathSegment::QuadTo(control, to) => {
                if !open {
                    builder.begin(start);
                    open = true;
                }
                builder.quadratic_bezier_to(point(control.x, control.y), point(to.x, to.y));
            }
            PathSegment::CubicTo(first_control, second_control, to) => {
                if !open {
                    builder.begin(start);
                    open = true;
                }
                builder.cubic_bezier_to(
                    point(first_control.x, first_control.y),
                    point(second_control.x, second_control.y),
                    point(to.x, to.y),
                );
            }
            PathSegment::Close => {
                if open {
                    builder.end(true);
                    open = false;
                }
            }
        }
    }
    if open {
        builder.end(false);
    }

    let built = builder.build();
    let mut current: Subpath = Vec::new();
    for event in built.iter().flattened(tolerance) {
        match event {
            PathEvent::Begin { at } => {
                current = vec![at.into_point()];
            }
            PathEvent::Line { to, .. } => current.push(to.into_point()),
            PathEvent::End { first, close, .. } => {
                let first = first.into_point();
                if close && current.last() != Some(&first) {
                    current.push(first);
                }
                subpaths.push(std::mem::take(&mut current));
            }
            PathEvent::Quadratic { .. } | PathEvent::Cubic { .. } => {}
        }
    }
}

/// Conversion from lyon's single precision points.
trait IntoPoint {
    /// Widens the point.
    fn into_point(self) -> Point;
}

impl IntoPoint for lyon_algorithms::path::math::Point {
    fn into_point(self) -> Point {
        Point {
            x: f64::from(self.x),
            y: f64::from(self.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subpaths_of(svg: &str) -> Vec<Subpath> {
        let tree = parse_svg(Path::new("design.svg"), svg.as_bytes()).unwrap();
        extract_subpaths(&tree, 0.1)
    }

    fn points(points: &[(f64, f64)]) -> Subpath {
        points.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn test_extract_lines() {
        let subpaths = subpaths_of(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
                <path d="M 10 10 L 90 10 L 90 90 Z" stroke="black" fill="none"/>
                <g transform="translate(5, 0)">
                    <path d="M 0 50 L 20 55 M 0 60 L 20 65" stroke="black" fill="none"/>
                </g>
            </svg>"#,
        );

        assert_eq!(
            subpaths,
            vec![
                points(&[(10.0, 10.0), (90.0, 10.0), (90.0, 90.0), (10.0, 10.0)]),
                points(&[(5.0, 50.0), (25.0, 55.0)]),
                points(&[(5.0, 60.0), (25.0, 65.0)]),
            ],
            "closed subpaths return to their start, transforms are applied"
        );
    }

    #[test]
    fn test_extract_curves() {
        let subpaths = subpaths_of(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
                <circle cx="50" cy="50" r="20" fill="red"/>
            </svg>"#,
        );

        assert_eq!(subpaths.len(), 1, "unstroked shapes are drawn too");
        let circle = &subpaths[0];
        assert!(circle.len() > 8, "curve is broken into many lines");
        assert_eq!(circle.first(), circle.last(), "circle is closed");
        let centre = Point { x: 50.0, y: 50.0 };
        for point in circle {
            let radius = point.distance_to(centre);
            assert!((radius - 20.0).abs() < 0.2, "{point:?} is off the circle");
        }
    }

    #[test]
    fn test_extract_text_follows_its_group() {
        let text = r#"<text x="10" y="50" font-family="DejaVu Sans" font-size="20">I</text>"#;
        let bare = subpaths_of(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100">{text}</svg>"#
        ));
        let moved = subpaths_of(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100">
                <g transform="translate(100, 0)">{text}</g>
            </svg>"#
        ));

        assert!(!bare.is_empty(), "glyph outlines are drawn");
        assert_eq!(bare.len(), moved.len());
        for (bare, moved) in bare.iter().zip(&moved) {
            assert_eq!(bare.len(), moved.len());
            for (bare, moved) in bare.iter().zip(moved) {
                assert!(
                    (moved.x - bare.x - 100.0).abs() < 1e-3 && (moved.y - bare.y).abs() < 1e-3,
                    "{moved:?} should be {bare:?} moved 100 to the right"
                );
            }
        }
    }

    #[test]
    fn test_hidden_paths_are_skipped() {
        let subpaths = subpaths_of(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
                <path d="M 10 10 L 90 90" stroke="black" visibility="hidden"/>
                <path d="M 10 90 L 90 10" stroke="black"/>
            </svg>"#,
        );
        assert_eq!(subpaths, vec![points(&[(10.0, 90.0), (90.0, 10.0)])]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_svg(Path::new("design.svg"), b"not an svg").is_err());
    }
}
