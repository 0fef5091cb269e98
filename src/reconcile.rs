//! Relationship reconciliation against ground truth.
//!
//! A candidate edge between two groups takes the label of the first
//! ground-truth relationship whose (unordered) pair matches the groups'
//! ground-truth references, oriented the way ground truth states it.

use serde::{Deserialize, Serialize};

use crate::annotation::GroundTruthRelationship;
use crate::grouping::SymbolGroup;

/// Label for edges with no known ground-truth relation.
pub const NO_RELATION: &str = "_";

/// A directed, labelled edge between two symbol groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub from: String,
    pub to: String,
    pub label: String,
}

impl RelationshipEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: label.into(),
        }
    }

    /// Whether this edge carries a ground-truth label.
    pub fn is_known(&self) -> bool {
        self.label != NO_RELATION
    }
}

/// Resolve the edge between `first` and `second`.
///
/// Scans `relationships` once; the first match in either orientation wins.
/// Without a match the edge is `first → second` labelled [`NO_RELATION`].
pub fn reconcile(
    first: &SymbolGroup,
    second: &SymbolGroup,
    relationships: &[GroundTruthRelationship],
) -> RelationshipEdge {
    let (a, b) = (&first.ground_truth_id, &second.ground_truth_id);
    for rel in relationships {
        if *a == rel.first && *b == rel.second {
            return RelationshipEdge::new(&first.id, &second.id, &rel.label);
        }
        if *a == rel.second && *b == rel.first {
            return RelationshipEdge::new(&second.id, &first.id, &rel.label);
        }
    }
    RelationshipEdge::new(&first.id, &second.id, NO_RELATION)
}
