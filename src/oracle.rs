//! Oracle engine: grouping + topology for one document.
//!
//! A [`Document`] owns the loaded trace and ground truth. Running an
//! [`OracleMode`] never mutates it; each run returns a fresh
//! [`OracleOutput`], so one document can be run under several modes in any
//! order.

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::annotation::{self, Annotation};
use crate::config::ConfigError;
use crate::error::{OracleResult, TopologyResult};
use crate::grouping::{Granularity, SymbolGroup, build_groups};
use crate::ink::{self, Trace};
use crate::inkml;
use crate::reconcile::RelationshipEdge;
use crate::topology::TopologyKind;

/// The four oracles: granularity × topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleMode {
    /// One group per stroke, left-right chain.
    LrStroke,
    /// One group per ground-truth symbol, left-right chain.
    LrSymbol,
    /// One group per stroke, minimum spanning tree.
    MstStroke,
    /// One group per ground-truth symbol, minimum spanning tree.
    MstSymbol,
}

impl OracleMode {
    pub const ALL: [OracleMode; 4] = [
        OracleMode::LrStroke,
        OracleMode::LrSymbol,
        OracleMode::MstStroke,
        OracleMode::MstSymbol,
    ];

    /// Name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            OracleMode::LrStroke => "lr_stroke",
            OracleMode::LrSymbol => "lr_symbol",
            OracleMode::MstStroke => "mst_stroke",
            OracleMode::MstSymbol => "mst_symbol",
        }
    }

    /// Directory the mode's label graphs are written to.
    pub fn output_dir_name(self) -> &'static str {
        match self {
            OracleMode::LrStroke => "lr_stroke_oracle",
            OracleMode::LrSymbol => "lr_symbol_oracle",
            OracleMode::MstStroke => "mst_stroke_oracle",
            OracleMode::MstSymbol => "mst_symbol_oracle",
        }
    }

    pub fn granularity(self) -> Granularity {
        match self {
            OracleMode::LrStroke | OracleMode::MstStroke => Granularity::Stroke,
            OracleMode::LrSymbol | OracleMode::MstSymbol => Granularity::Symbol,
        }
    }

    pub fn topology(self) -> TopologyKind {
        match self {
            OracleMode::LrStroke | OracleMode::LrSymbol => TopologyKind::Chain,
            OracleMode::MstStroke | OracleMode::MstSymbol => TopologyKind::SpanningTree,
        }
    }
}

impl std::fmt::Display for OracleMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OracleMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OracleMode::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ConfigError::UnknownMode {
                name: s.to_string(),
            })
    }
}

/// The hypothesis produced by one oracle run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleOutput {
    pub mode: OracleMode,
    /// Groups in creation order.
    pub groups: Vec<SymbolGroup>,
    /// Edges in generation order.
    pub edges: Vec<RelationshipEdge>,
}

impl OracleOutput {
    pub fn empty(mode: OracleMode) -> Self {
        Self {
            mode,
            groups: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty() && self.edges.is_empty()
    }
}

/// One input document: the trace and its ground truth.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Display name, usually the input file stem.
    pub name: String,
    pub trace: Trace,
    pub annotation: Annotation,
}

impl Document {
    pub fn new(name: impl Into<String>, trace: Trace, annotation: Annotation) -> Self {
        Self {
            name: name.into(),
            trace,
            annotation,
        }
    }

    /// Load an ink file and its paired label-graph file.
    ///
    /// An unreadable or malformed ink file yields a document with no strokes,
    /// and a malformed annotation block yields no ground-truth symbols; both
    /// are logged and recovered. The label-graph file is only read when there
    /// are strokes to reconcile, and failing to read it is an error.
    pub fn load(
        ink_path: &Path,
        ground_truth_path: &Path,
        coordinate_scale: f64,
    ) -> OracleResult<Self> {
        let name = ink_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| ink_path.display().to_string());

        let root = match inkml::read_file(ink_path).and_then(|text| inkml::parse(&text)) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!(
                    document = %name,
                    error = %e,
                    "unparseable ink file, treating as empty"
                );
                return Ok(Self::new(name, Trace::new(), Annotation::default()));
            }
        };

        let trace = ink::traces_from(&root, coordinate_scale).unwrap_or_else(|e| {
            tracing::warn!(document = %name, error = %e, "malformed trace data, treating as empty");
            Trace::new()
        });
        if trace.is_empty() {
            return Ok(Self::new(name, trace, Annotation::default()));
        }

        let symbols = annotation::symbols_from(&root).unwrap_or_else(|e| {
            tracing::warn!(document = %name, error = %e, "ignoring ground-truth symbols");
            Vec::new()
        });
        let relationships = annotation::load_relationships(ground_truth_path)?;

        tracing::debug!(
            document = %name,
            strokes = trace.len(),
            symbols = symbols.len(),
            relationships = relationships.len(),
            "document loaded"
        );
        Ok(Self::new(name, trace, Annotation::new(symbols, relationships)))
    }

    /// Run one oracle over this document.
    ///
    /// A document without strokes produces an empty output.
    pub fn run(&self, mode: OracleMode) -> TopologyResult<OracleOutput> {
        if self.trace.is_empty() {
            return Ok(OracleOutput::empty(mode));
        }
        let groups = build_groups(&self.trace, &self.annotation.symbols, mode.granularity());
        let builder = mode.topology().builder();
        let edges = builder.build(&self.trace, &groups, &self.annotation.relationships)?;
        tracing::debug!(
            document = %self.name,
            mode = %mode,
            topology = builder.name(),
            groups = groups.len(),
            edges = edges.len(),
            "oracle run complete"
        );
        Ok(OracleOutput {
            mode,
            groups,
            edges,
        })
    }
}
