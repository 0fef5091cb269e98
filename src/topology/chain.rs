//! Left-to-right chain topology.

use crate::annotation::GroundTruthRelationship;
use crate::error::{TopologyError, TopologyResult};
use crate::geometry::min_x;
use crate::grouping::SymbolGroup;
use crate::ink::Trace;
use crate::reconcile::{RelationshipEdge, reconcile};

use super::{TopologyBuilder, member_strokes};

/// Links each group to its right-hand neighbour, ordering groups by the
/// minimum x-coordinate of their points.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeftRightChain;

impl TopologyBuilder for LeftRightChain {
    fn name(&self) -> &'static str {
        "left-right chain"
    }

    fn build(
        &self,
        trace: &Trace,
        groups: &[SymbolGroup],
        relationships: &[GroundTruthRelationship],
    ) -> TopologyResult<Vec<RelationshipEdge>> {
        let order = left_to_right(trace, groups)?;
        Ok(order
            .windows(2)
            .map(|pair| reconcile(&groups[pair[0]], &groups[pair[1]], relationships))
            .collect())
    }
}

/// Group indices sorted by minimum x. The sort is stable, so groups with
/// equal minimum x keep their creation order.
pub fn left_to_right(trace: &Trace, groups: &[SymbolGroup]) -> TopologyResult<Vec<usize>> {
    let mut keyed: Vec<(i64, usize)> = Vec::with_capacity(groups.len());
    for (index, group) in groups.iter().enumerate() {
        let strokes = member_strokes(trace, group)?;
        let x = min_x(strokes.iter().flat_map(|s| s.points.iter())).ok_or_else(|| {
            TopologyError::NoPoints {
                group_id: group.id.clone(),
            }
        })?;
        keyed.push((x, index));
    }
    keyed.sort_by_key(|&(x, _)| x);
    Ok(keyed.into_iter().map(|(_, index)| index).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::ink::Stroke;
    use crate::reconcile::NO_RELATION;

    fn setup(xs: &[(&str, i64)]) -> (Trace, Vec<SymbolGroup>) {
        let trace: Trace = xs
            .iter()
            .map(|(id, x)| Stroke::new(*id, vec![Point::new(*x, 0), Point::new(*x + 3, 10)]))
            .collect();
        let groups = xs
            .iter()
            .map(|(id, _)| SymbolGroup {
                id: format!("g{id}"),
                class: "c".into(),
                strokes: vec![id.to_string()],
                ground_truth_id: id.to_string(),
            })
            .collect();
        (trace, groups)
    }

    #[test]
    fn orders_by_minimum_x() {
        let (trace, groups) = setup(&[("a", 50), ("b", 10), ("c", 30)]);
        assert_eq!(left_to_right(&trace, &groups).unwrap(), vec![1, 2, 0]);

        let edges = LeftRightChain.build(&trace, &groups, &[]).unwrap();
        assert_eq!(
            edges,
            vec![
                RelationshipEdge::new("gb", "gc", NO_RELATION),
                RelationshipEdge::new("gc", "ga", NO_RELATION),
            ]
        );
    }

    #[test]
    fn ties_keep_creation_order() {
        let (trace, groups) = setup(&[("a", 5), ("b", 5), ("c", 1), ("d", 5)]);
        assert_eq!(left_to_right(&trace, &groups).unwrap(), vec![2, 0, 1, 3]);
    }

    #[test]
    fn edge_count_is_n_minus_one() {
        for n in 0..6usize {
            let xs: Vec<(String, i64)> = (0..n).map(|i| (i.to_string(), (n - i) as i64)).collect();
            let refs: Vec<(&str, i64)> = xs.iter().map(|(id, x)| (id.as_str(), *x)).collect();
            let (trace, groups) = setup(&refs);
            let edges = LeftRightChain.build(&trace, &groups, &[]).unwrap();
            assert_eq!(edges.len(), n.saturating_sub(1));
        }
    }

    #[test]
    fn labels_come_from_ground_truth() {
        let (trace, groups) = setup(&[("a", 0), ("b", 10)]);
        let rels = vec![GroundTruthRelationship::new("b", "a", "Left")];
        let edges = LeftRightChain.build(&trace, &groups, &rels).unwrap();
        assert_eq!(edges, vec![RelationshipEdge::new("gb", "ga", "Left")]);
    }

    #[test]
    fn empty_group_is_an_error() {
        let (trace, mut groups) = setup(&[("a", 0), ("b", 10)]);
        groups[1].strokes.clear();
        assert!(matches!(
            LeftRightChain.build(&trace, &groups, &[]),
            Err(TopologyError::EmptyGroup { .. })
        ));
    }
}
