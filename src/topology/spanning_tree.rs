//! Minimum-spanning-tree topology over nearest-point distances.
//!
//! Every pair of groups is joined in a complete [`DistanceGraph`] weighted by
//! single-linkage distance; Kruskal's algorithm then keeps the cheapest
//! acyclic subset. Equal weights are resolved by insertion order (row-major
//! over group indices), so the tree is fully deterministic.

use petgraph::unionfind::UnionFind;
use serde::{Deserialize, Serialize};

use crate::annotation::GroundTruthRelationship;
use crate::error::TopologyResult;
use crate::geometry::{Point, nearest_distance};
use crate::grouping::SymbolGroup;
use crate::ink::Trace;
use crate::reconcile::{RelationshipEdge, reconcile};

use super::{TopologyBuilder, group_cluster};

/// An undirected weighted edge; `a < b` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}

/// Symmetric weighted graph over group indices, stored as an edge list in
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct DistanceGraph {
    node_count: usize,
    edges: Vec<WeightedEdge>,
}

impl DistanceGraph {
    /// An edgeless graph over `node_count` nodes.
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            edges: Vec::new(),
        }
    }

    /// Complete graph over point clusters, edges added in row-major order
    /// `(0,1), (0,2), …, (1,2), …`. Pairs involving an empty cluster are left
    /// unconnected.
    pub fn from_clusters(clusters: &[Vec<Point>]) -> Self {
        let n = clusters.len();
        let mut graph = Self::new(n);
        graph.edges.reserve(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                if let Some(d) = nearest_distance(&clusters[i], &clusters[j]) {
                    graph.add_edge(i, j, d);
                }
            }
        }
        graph
    }

    /// Add an undirected edge. Endpoints are normalised so that `a < b`.
    ///
    /// # Panics
    ///
    /// Panics on a self-loop or an endpoint outside the graph.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        assert!(a != b, "self-loop on node {a}");
        assert!(
            a < self.node_count && b < self.node_count,
            "edge ({a}, {b}) outside graph of {} nodes",
            self.node_count
        );
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        self.edges.push(WeightedEdge { a, b, weight });
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[WeightedEdge] {
        &self.edges
    }

    /// Weight of the first edge joining `a` and `b`, in either order.
    pub fn weight(&self, a: usize, b: usize) -> Option<f64> {
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        self.edges
            .iter()
            .find(|e| e.a == a && e.b == b)
            .map(|e| e.weight)
    }

    /// Minimum spanning tree (a forest if the graph is disconnected) by
    /// Kruskal's algorithm.
    ///
    /// Edges are considered in ascending weight with a stable sort, so ties
    /// go to the edge inserted first. The result is returned sorted by
    /// `(a, b)`.
    pub fn minimum_spanning_tree(&self) -> Vec<WeightedEdge> {
        let mut candidates: Vec<&WeightedEdge> = self.edges.iter().collect();
        candidates.sort_by(|x, y| x.weight.total_cmp(&y.weight));

        let target = self.node_count.saturating_sub(1);
        let mut components = UnionFind::<usize>::new(self.node_count);
        let mut tree = Vec::with_capacity(target);
        for edge in candidates {
            if tree.len() == target {
                break;
            }
            if components.union(edge.a, edge.b) {
                tree.push(*edge);
            }
        }
        tree.sort_by_key(|e| (e.a, e.b));
        tree
    }
}

/// Connects groups along the minimum spanning tree of their nearest-point
/// distances.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanningTree;

impl TopologyBuilder for SpanningTree {
    fn name(&self) -> &'static str {
        "spanning tree"
    }

    fn build(
        &self,
        trace: &Trace,
        groups: &[SymbolGroup],
        relationships: &[GroundTruthRelationship],
    ) -> TopologyResult<Vec<RelationshipEdge>> {
        let clusters = groups
            .iter()
            .map(|g| group_cluster(trace, g))
            .collect::<TopologyResult<Vec<_>>>()?;
        let graph = DistanceGraph::from_clusters(&clusters);
        let tree = graph.minimum_spanning_tree();
        tracing::debug!(
            groups = groups.len(),
            candidates = graph.edges().len(),
            tree_edges = tree.len(),
            "spanning tree built"
        );
        Ok(tree
            .iter()
            .map(|e| reconcile(&groups[e.a], &groups[e.b], relationships))
            .collect())
    }
}
