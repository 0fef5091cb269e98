//! Ground-truth annotations: symbols and relationships.
//!
//! Symbols are read from the InkML `<traceGroup>` hierarchy of the ink file;
//! relationships come from the `R` lines of the paired label-graph file.
//!
//! ```text
//! <traceGroup>                       wrapper (first top-level group)
//!   <traceGroup>                     one symbol
//!     <annotation>x</annotation>     class
//!     <annotationXML href="x_1"/>    identifier
//!     <traceView traceDataRef="0"/>  member strokes, in order
//!   </traceGroup>
//! </traceGroup>
//! ```

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotationError, AnnotationResult};
use crate::inkml::Element;

/// Replacement for commas, which the label-graph format reserves.
pub const COMMA_TOKEN: &str = "COMMA";

/// Replace every comma with [`COMMA_TOKEN`].
pub fn sanitize(raw: &str) -> Cow<'_, str> {
    if raw.contains(',') {
        Cow::Owned(raw.replace(',', COMMA_TOKEN))
    } else {
        Cow::Borrowed(raw)
    }
}

/// A symbol as annotated in ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruthSymbol {
    pub id: String,
    pub class: String,
    /// Member stroke ids in annotation order.
    pub strokes: Vec<String>,
}

impl GroundTruthSymbol {
    pub fn new<S: Into<String>>(
        id: impl Into<String>,
        class: impl Into<String>,
        strokes: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            id: id.into(),
            class: class.into(),
            strokes: strokes.into_iter().map(Into::into).collect(),
        }
    }
}

/// A labelled relation between two ground-truth symbols.
///
/// The pair is matched without regard to order, but the stored order is the
/// direction emitted on a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundTruthRelationship {
    pub first: String,
    pub second: String,
    pub label: String,
}

impl GroundTruthRelationship {
    pub fn new(
        first: impl Into<String>,
        second: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            label: label.into(),
        }
    }
}

/// All ground truth known for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub symbols: Vec<GroundTruthSymbol>,
    pub relationships: Vec<GroundTruthRelationship>,
}

impl Annotation {
    pub fn new(
        symbols: Vec<GroundTruthSymbol>,
        relationships: Vec<GroundTruthRelationship>,
    ) -> Self {
        Self {
            symbols,
            relationships,
        }
    }
}

/// Read ground-truth symbols from an InkML root element.
///
/// A document without a wrapper trace group has no symbols. Symbols without
/// an `annotationXML` href get a deterministic `<class>_<k>` id, where `k`
/// counts per class and skips ids that are already taken.
pub fn symbols_from(root: &Element) -> AnnotationResult<Vec<GroundTruthSymbol>> {
    let Some(wrapper) = root.child("traceGroup") else {
        return Ok(Vec::new());
    };

    let mut parsed: Vec<(Option<String>, String, Vec<String>)> = Vec::new();
    for (position, group) in wrapper.children_named("traceGroup").enumerate() {
        let class = group
            .child("annotation")
            .and_then(Element::text)
            .ok_or(AnnotationError::MissingClass { position })?;
        let id = group
            .child("annotationXML")
            .and_then(|a| a.attr("href"))
            .map(|href| sanitize(href).into_owned());
        let strokes = group
            .children_named("traceView")
            .filter_map(|view| {
                let stroke = view.attr("traceDataRef");
                if stroke.is_none() {
                    tracing::debug!(position, "traceView without traceDataRef ignored");
                }
                stroke.map(str::to_string)
            })
            .collect();
        parsed.push((id, sanitize(class).into_owned(), strokes));
    }

    let mut taken: HashSet<String> = parsed.iter().filter_map(|(id, _, _)| id.clone()).collect();
    let mut counters: HashMap<String, usize> = HashMap::new();

    let symbols = parsed
        .into_iter()
        .map(|(id, class, strokes)| {
            let id = id.unwrap_or_else(|| {
                let counter = counters.entry(class.clone()).or_insert(0);
                loop {
                    *counter += 1;
                    let candidate = format!("{class}_{counter}");
                    if taken.insert(candidate.clone()) {
                        break candidate;
                    }
                }
            });
            GroundTruthSymbol { id, class, strokes }
        })
        .collect();
    Ok(symbols)
}

/// Parse the relationship lines of a label-graph file.
///
/// Only lines whose first column is exactly `R` are considered; their next
/// three columns are the two symbol ids and the label.
pub fn parse_relationships(text: &str) -> Vec<GroundTruthRelationship> {
    let mut relationships = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let cols: Vec<&str> = line.split(',').collect();
        if cols[0] != "R" {
            continue;
        }
        if cols.len() < 4 {
            tracing::debug!(line = line_no + 1, "relationship line with too few columns skipped");
            continue;
        }
        relationships.push(GroundTruthRelationship::new(
            cols[1].trim(),
            cols[2].trim(),
            cols[3].trim(),
        ));
    }
    relationships
}

/// Load the ground-truth relationships from a label-graph file.
pub fn load_relationships(path: &Path) -> AnnotationResult<Vec<GroundTruthRelationship>> {
    let bytes = std::fs::read(path).map_err(|e| AnnotationError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(parse_relationships(&String::from_utf8_lossy(&bytes)))
}
