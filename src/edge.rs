//! Edges and batches of edges.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::{Node, Time, Weight};

/// A timestamped, weighted, directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Edge {
    pub src: Node,
    pub dst: Node,
    pub weight: Weight,
    pub timestamp: Time,
}

impl Edge {
    pub fn new(src: Node, dst: Node, weight: Weight, timestamp: Time) -> Self {
        Edge { src, dst, weight, timestamp }
    }

    pub fn is_self_edge(&self) -> bool {
        self.src == self.dst
    }

    /// Order used for deduplication: `src` ascending, `dst` ascending, then
    /// `timestamp` descending, so the newest copy of a pair sorts first.
    ///
    /// This is not `Ord`: it ignores `weight`, while equality does not.
    pub fn dedup_cmp(a: &Edge, b: &Edge) -> Ordering {
        a.src.cmp(&b.src)
            .then(a.dst.cmp(&b.dst))
            .then(b.timestamp.cmp(&a.timestamp))
    }
}

/// An ordered run of edges applied to a graph in one step.
///
/// Batches handed out by loaded datasets borrow the dataset's edges; batches
/// produced by generators, or by [`Batch::deduplicated`], own their edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<'a> {
    edges: Cow<'a, [Edge]>,
}

impl<'a> Batch<'a> {
    pub fn new(edges: &'a [Edge]) -> Self {
        Batch { edges: Cow::Borrowed(edges) }
    }

    pub fn owned(edges: Vec<Edge>) -> Batch<'static> {
        Batch { edges: Cow::Owned(edges) }
    }

    pub fn empty() -> Batch<'static> {
        Batch::owned(Vec::new())
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// A view starting at the first edge with `timestamp >= threshold`.
    ///
    /// Batches are time ordered, so this cuts at a boundary rather than
    /// filtering: any older edges after that point are kept.
    pub fn filtered(self, threshold: Time) -> Batch<'a> {
        let start = self
            .edges
            .iter()
            .position(|e| e.timestamp >= threshold)
            .unwrap_or(self.edges.len());
        match self.edges {
            Cow::Borrowed(edges) => Batch::new(&edges[start..]),
            Cow::Owned(mut edges) => {
                edges.drain(..start);
                Batch::owned(edges)
            }
        }
    }

    /// An owned copy, sorted by [`Edge::dedup_cmp`], with one edge per
    /// `(src, dst)` pair: the one with the newest timestamp.
    ///
    /// Weights of the discarded duplicates are dropped, not summed.
    pub fn deduplicated(&self) -> Batch<'static> {
        let mut sorted = self.edges.to_vec();
        // stable, so equal timestamps keep their input order.
        sorted.sort_by(Edge::dedup_cmp);
        sorted.dedup_by(|later, kept| later.src == kept.src && later.dst == kept.dst);
        Batch::owned(sorted)
    }

    /// Number of distinct vertex ids appearing as either endpoint.
    pub fn num_vertices_affected(&self) -> usize {
        let mut vertices: Vec<Node> = self
            .edges
            .iter()
            .flat_map(|e| [e.src, e.dst])
            .collect();
        vertices.sort_unstable();
        vertices.dedup();
        vertices.len()
    }

    pub fn into_owned(self) -> Batch<'static> {
        Batch::owned(self.edges.into_owned())
    }
}

impl Deref for Batch<'_> {
    type Target = [Edge];
    fn deref(&self) -> &[Edge] {
        &self.edges
    }
}

impl<'b> IntoIterator for &'b Batch<'_> {
    type Item = &'b Edge;
    type IntoIter = std::slice::Iter<'b, Edge>;
    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(src: Node, dst: Node, weight: Weight, timestamp: Time) -> Edge {
        Edge::new(src, dst, weight, timestamp)
    }

    #[test]
    fn dedup_keeps_newest_copy() {
        let edges = vec![e(1, 2, 7, 10), e(3, 1, 1, 11), e(1, 2, 9, 12)];
        let deduped = Batch::new(&edges).deduplicated();
        assert_eq!(deduped.edges(), &[e(1, 2, 9, 12), e(3, 1, 1, 11)]);
    }

    #[test]
    fn dedup_does_not_merge_weights() {
        let edges = vec![e(4, 5, 100, 0), e(4, 5, 1, 1)];
        let deduped = Batch::new(&edges).deduplicated();
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].weight, 1);
    }

    #[test]
    fn filter_cuts_at_first_recent_edge() {
        let edges = vec![e(1, 2, 1, 0), e(1, 3, 1, 5), e(2, 3, 1, 5), e(3, 4, 1, 9)];
        let batch = Batch::new(&edges);
        assert_eq!(batch.clone().filtered(i64::MIN).len(), 4);
        assert_eq!(batch.clone().filtered(5).edges(), &edges[1..]);
        assert_eq!(batch.clone().filtered(6).edges(), &edges[3..]);
        assert!(batch.filtered(10).is_empty());
    }

    #[test]
    fn filter_on_owned_batch_drops_prefix() {
        let owned = Batch::owned(vec![e(1, 2, 1, 0), e(2, 3, 1, 4)]);
        assert_eq!(owned.filtered(1).edges(), &[e(2, 3, 1, 4)]);
    }

    #[test]
    fn vertices_affected_counts_endpoints() {
        let edges = vec![e(1, 2, 1, 0), e(2, 3, 1, 1), e(1, 2, 1, 2)];
        let batch = Batch::new(&edges);
        assert_eq!(batch.num_vertices_affected(), 3);
        assert_eq!(batch.deduplicated().num_vertices_affected(), 3);
        assert_eq!(Batch::empty().num_vertices_affected(), 0);
    }

    #[test]
    fn owned_batches_coerce_to_borrowed_lifetimes() {
        let edges = vec![e(1, 2, 1, 0)];
        let borrowed = Batch::new(&edges);
        let either: Vec<Batch<'_>> = vec![borrowed.deduplicated(), borrowed.filtered(0)];
        assert!(either.iter().all(|b| b.len() == 1));
    }
}
