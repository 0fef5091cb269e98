//! Relationship topologies over symbol groups.
//!
//! A topology decides *which* pairs of groups get an edge; reconciliation
//! decides each edge's label and direction. Two builders are provided:
//!
//! - [`LeftRightChain`]: adjacent groups in left-to-right order
//! - [`SpanningTree`]: minimum spanning tree over nearest-point distances

pub mod chain;
pub mod spanning_tree;

use serde::{Deserialize, Serialize};

use crate::annotation::GroundTruthRelationship;
use crate::error::{TopologyError, TopologyResult};
use crate::geometry::Point;
use crate::grouping::SymbolGroup;
use crate::ink::{Stroke, Trace};
use crate::reconcile::RelationshipEdge;

pub use chain::LeftRightChain;
pub use spanning_tree::{DistanceGraph, SpanningTree, WeightedEdge};

/// A strategy that connects symbol groups with labelled edges.
pub trait TopologyBuilder: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Build the edges for `groups`, labelling each through reconciliation.
    fn build(
        &self,
        trace: &Trace,
        groups: &[SymbolGroup],
        relationships: &[GroundTruthRelationship],
    ) -> TopologyResult<Vec<RelationshipEdge>>;
}

/// Selector for the built-in topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopologyKind {
    Chain,
    SpanningTree,
}

impl TopologyKind {
    pub fn builder(self) -> &'static dyn TopologyBuilder {
        match self {
            TopologyKind::Chain => &LeftRightChain,
            TopologyKind::SpanningTree => &SpanningTree,
        }
    }
}

/// Resolve a group's member strokes against the trace.
pub(crate) fn member_strokes<'t>(
    trace: &'t Trace,
    group: &SymbolGroup,
) -> TopologyResult<Vec<&'t Stroke>> {
    if group.strokes.is_empty() {
        return Err(TopologyError::EmptyGroup {
            group_id: group.id.clone(),
        });
    }
    group
        .strokes
        .iter()
        .map(|id| {
            trace.get(id).ok_or_else(|| TopologyError::UnknownStroke {
                group_id: group.id.clone(),
                stroke_id: id.clone(),
            })
        })
        .collect()
}

/// The point cluster of a group: all points of all member strokes.
pub fn group_cluster(trace: &Trace, group: &SymbolGroup) -> TopologyResult<Vec<Point>> {
    let points: Vec<Point> = member_strokes(trace, group)?
        .into_iter()
        .flat_map(|s| s.points.iter().copied())
        .collect();
    if points.is_empty() {
        return Err(TopologyError::NoPoints {
            group_id: group.id.clone(),
        });
    }
    Ok(points)
}
