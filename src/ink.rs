//! Ink model and InkML trace loading.
//!
//! A [`Trace`] is the ordered set of strokes of one document. Stroke order is
//! the order of `<trace>` elements in the file and is preserved explicitly;
//! ABSENT numbering and chain tie-breaking both depend on it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{InkError, InkResult};
use crate::geometry::Point;
use crate::inkml::Element;

/// Multiplier applied to non-integral coordinates before rounding.
pub const DEFAULT_COORDINATE_SCALE: f64 = 10_000.0;

/// One continuous pen-down path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Identifier, unique within the document.
    pub id: String,
    /// Ordered pen samples.
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new(id: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            id: id.into(),
            points,
        }
    }
}

/// Ordered strokes of one document with O(1) lookup by id.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    strokes: Vec<Stroke>,
    index: HashMap<String, usize>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stroke. A stroke whose id is already present replaces the
    /// earlier points but keeps the earlier position.
    pub fn insert(&mut self, stroke: Stroke) {
        match self.index.get(&stroke.id) {
            Some(&pos) => {
                tracing::warn!(stroke = %stroke.id, "duplicate trace id, keeping later points");
                self.strokes[pos] = stroke;
            }
            None => {
                self.index.insert(stroke.id.clone(), self.strokes.len());
                self.strokes.push(stroke);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Stroke> {
        self.index.get(id).map(|&pos| &self.strokes[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Strokes in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Stroke> {
        self.strokes.iter()
    }

    /// Stroke ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.strokes.iter().map(|s| s.id.as_str())
    }
}

impl FromIterator<Stroke> for Trace {
    fn from_iter<I: IntoIterator<Item = Stroke>>(iter: I) -> Self {
        let mut trace = Trace::new();
        for stroke in iter {
            trace.insert(stroke);
        }
        trace
    }
}

/// Build the trace from the `<trace>` children of an InkML root element.
///
/// Any malformed trace fails the whole document.
pub fn traces_from(root: &Element, coordinate_scale: f64) -> InkResult<Trace> {
    let mut trace = Trace::new();
    for element in root.children_named("trace") {
        let id = element.attr("id").ok_or(InkError::MissingTraceId)?;
        let points = parse_points(id, element.text().unwrap_or_default(), coordinate_scale)?;
        trace.insert(Stroke::new(id, points));
    }
    Ok(trace)
}

/// Parse the body of a `<trace>`: comma-separated points, each a
/// whitespace-separated list of channels of which x and y come first.
pub fn parse_points(trace_id: &str, body: &str, coordinate_scale: f64) -> InkResult<Vec<Point>> {
    if body.trim().is_empty() {
        return Err(InkError::EmptyTrace {
            trace_id: trace_id.to_string(),
        });
    }
    let mut points = Vec::new();
    for sample in body.split(',') {
        let channels: Vec<&str> = sample.split_whitespace().take(2).collect();
        let &[x, y] = channels.as_slice() else {
            return Err(InkError::ShortPoint {
                trace_id: trace_id.to_string(),
                found: channels.len(),
            });
        };
        points.push(Point::new(
            scale_coordinate(trace_id, x, coordinate_scale)?,
            scale_coordinate(trace_id, y, coordinate_scale)?,
        ));
    }
    Ok(points)
}

/// Convert one channel value to an integer coordinate.
///
/// Integral values are kept as is; fractional values are multiplied by the
/// scale first. Rounding is half-to-even.
pub fn scale_coordinate(trace_id: &str, raw: &str, coordinate_scale: f64) -> InkResult<i64> {
    let invalid = || InkError::InvalidCoordinate {
        trace_id: trace_id.to_string(),
        value: raw.to_string(),
    };
    let value: f64 = raw.parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    let scaled = if value.fract() == 0.0 {
        value
    } else {
        (value * coordinate_scale).round_ties_even()
    };
    if scaled.abs() >= i64::MAX as f64 {
        return Err(invalid());
    }
    Ok(scaled as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inkml;

    #[test]
    fn integral_coordinates_kept() {
        let pts = parse_points("0", "10 20, 30 40", DEFAULT_COORDINATE_SCALE).unwrap();
        assert_eq!(pts, vec![Point::new(10, 20), Point::new(30, 40)]);
    }

    #[test]
    fn fractional_coordinates_scaled() {
        let pts = parse_points("0", "1.5 0.25", DEFAULT_COORDINATE_SCALE).unwrap();
        assert_eq!(pts, vec![Point::new(15_000, 2_500)]);
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(scale_coordinate("0", "0.25", 2.0).unwrap(), 0);
        assert_eq!(scale_coordinate("0", "0.75", 2.0).unwrap(), 2);
        assert_eq!(scale_coordinate("0", "1.25", 2.0).unwrap(), 2);
        assert_eq!(scale_coordinate("0", "-7", 2.0).unwrap(), -7);
    }

    #[test]
    fn extra_channels_ignored_and_newlines_tolerated() {
        let body = "1 2 100,\n 3 4 101,\n5 6 102";
        let pts = parse_points("0", body, DEFAULT_COORDINATE_SCALE).unwrap();
        assert_eq!(
            pts,
            vec![Point::new(1, 2), Point::new(3, 4), Point::new(5, 6)]
        );
    }

    #[test]
    fn malformed_points_rejected() {
        assert!(matches!(
            parse_points("7", "1 2, 3", DEFAULT_COORDINATE_SCALE),
            Err(InkError::ShortPoint { found: 1, .. })
        ));
        assert!(matches!(
            parse_points("7", "1 x", DEFAULT_COORDINATE_SCALE),
            Err(InkError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            parse_points("7", "1 inf", DEFAULT_COORDINATE_SCALE),
            Err(InkError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            parse_points("7", "   ", DEFAULT_COORDINATE_SCALE),
            Err(InkError::EmptyTrace { .. })
        ));
    }

    #[test]
    fn traces_keep_document_order() {
        let root = inkml::parse(
            r#"<ink><trace id="b">1 1</trace><trace id="a">0 0</trace><trace id="c">2 2</trace></ink>"#,
        )
        .unwrap();
        let trace = traces_from(&root, DEFAULT_COORDINATE_SCALE).unwrap();
        assert_eq!(trace.ids().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(trace.get("a").unwrap().points, vec![Point::new(0, 0)]);
    }

    #[test]
    fn trace_without_id_fails_document() {
        let root = inkml::parse("<ink><trace>1 1</trace></ink>").unwrap();
        assert!(matches!(
            traces_from(&root, DEFAULT_COORDINATE_SCALE),
            Err(InkError::MissingTraceId)
        ));
    }

    #[test]
    fn duplicate_id_keeps_first_position() {
        let trace: Trace = vec![
            Stroke::new("a", vec![Point::new(0, 0)]),
            Stroke::new("b", vec![Point::new(1, 1)]),
            Stroke::new("a", vec![Point::new(9, 9)]),
        ]
        .into_iter()
        .collect();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.ids().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(trace.get("a").unwrap().points, vec![Point::new(9, 9)]);
    }

    #[test]
    fn extreme_parsed_coordinates_have_finite_distance() {
        let left = parse_points("0", "9e18 0", DEFAULT_COORDINATE_SCALE).unwrap();
        let right = parse_points("1", "-9e18 0", DEFAULT_COORDINATE_SCALE).unwrap();
        assert_eq!(
            crate::geometry::nearest_distance(&left, &right),
            Some(1.8e19)
        );
    }
}
