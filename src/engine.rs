//! The graph engine contract, and a reference engine implementing it.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::Args;
use crate::edge::Batch;
use crate::error::BenchError;
use crate::{Node, Time, Weight};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexDegree {
    pub vertex_id: Node,
    pub out_degree: i64,
}

/// A dynamic graph data structure under test.
///
/// The benchmark drives an engine through batches of insertions and
/// windowed deletions, and periodically asks it to update algorithm results
/// in caller-owned buffers indexed by vertex id.
pub trait DynamicGraph: Sized {
    /// An empty graph with room for vertex ids `0 ..= max_vertex_id`.
    fn new(args: &Args, max_vertex_id: Node) -> Result<Self, BenchError>;

    /// Algorithm names accepted by [`DynamicGraph::update_alg`].
    fn supported_algs() -> &'static [&'static str];

    /// Called before the deletions and insertions for each batch.
    fn before_batch(&mut self, _batch: &Batch<'_>, _threshold: Time) {}

    fn delete_edges_older_than(&mut self, threshold: Time) -> Result<(), BenchError>;

    fn insert_batch(&mut self, batch: &Batch<'_>) -> Result<(), BenchError>;

    /// Runs `alg` from `sources`, updating `data` in place.
    fn update_alg(&mut self, alg: &str, sources: &[Node], data: &mut [i64]) -> Result<(), BenchError>;

    fn get_out_degree(&self, vertex: Node) -> i64;

    fn get_num_vertices(&self) -> i64;

    fn get_num_edges(&self) -> i64;

    /// The `n` vertices of greatest out-degree, highest first.
    fn get_high_degree_vertices(&self, n: usize) -> Vec<VertexDegree>;

    /// Empties the graph in place, dropping its storage before provisioning
    /// for `max_vertex_id`.
    fn reset(&mut self, args: &Args, max_vertex_id: Node) -> Result<(), BenchError>;
}

/// The `n` entries of greatest degree; ties go to the lower vertex id.
pub fn top_degree(degrees: impl IntoIterator<Item = VertexDegree>, n: usize) -> Vec<VertexDegree> {
    let mut degrees: Vec<VertexDegree> = degrees.into_iter().filter(|d| d.out_degree > 0).collect();
    degrees.sort_by(|x, y| y.out_degree.cmp(&x.out_degree).then(x.vertex_id.cmp(&y.vertex_id)));
    degrees.truncate(n);
    degrees
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Neighbor {
    dst: Node,
    weight: Weight,
    timestamp: Time,
}

/// Adjacency lists indexed by source vertex.
///
/// Re-inserting an existing edge adds its weight and keeps the newer
/// timestamp. Supports `bfs`, which writes hop counts from the nearest
/// source (`-1` if unreachable).
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    out: Vec<Vec<Neighbor>>,
    /// Edges incident to each vertex, in either direction.
    incident: Vec<i64>,
    num_vertices: i64,
    num_edges: i64,
}

impl ReferenceGraph {
    fn provision(max_vertex_id: Node) -> Vec<Vec<Neighbor>> {
        vec![Vec::new(); (max_vertex_id + 1).max(0) as usize]
    }

    fn slot(&mut self, vertex: Node) -> Result<&mut Vec<Neighbor>, BenchError> {
        if vertex < 0 {
            return Err(BenchError::Engine(format!("negative vertex id {vertex}")));
        }
        let index = vertex as usize;
        if index >= self.out.len() {
            self.out.resize_with(index + 1, Vec::new);
        }
        Ok(&mut self.out[index])
    }

    /// Adjusts the incident edge count of `vertex`, which must be non-negative.
    fn touch(&mut self, vertex: Node, delta: i64) {
        let index = vertex as usize;
        if index >= self.incident.len() {
            self.incident.resize(index + 1, 0);
        }
        let before = self.incident[index];
        self.incident[index] += delta;
        match (before > 0, self.incident[index] > 0) {
            (false, true) => self.num_vertices += 1,
            (true, false) => self.num_vertices -= 1,
            _ => {}
        }
    }

    fn bfs(&self, sources: &[Node], data: &mut [i64]) {
        data.iter_mut().for_each(|d| *d = -1);
        let mut queue = VecDeque::new();
        for &source in sources {
            if let Some(d) = data.get_mut(source as usize) {
                *d = 0;
                queue.push_back(source);
            }
        }
        while let Some(vertex) = queue.pop_front() {
            let next = data[vertex as usize] + 1;
            for n in self.out.get(vertex as usize).into_iter().flatten() {
                if let Some(d) = data.get_mut(n.dst as usize) {
                    if *d < 0 {
                        *d = next;
                        queue.push_back(n.dst);
                    }
                }
            }
        }
    }
}

impl DynamicGraph for ReferenceGraph {
    fn new(_args: &Args, max_vertex_id: Node) -> Result<Self, BenchError> {
        let out = Self::provision(max_vertex_id);
        Ok(ReferenceGraph { incident: vec![0; out.len()], out, num_vertices: 0, num_edges: 0 })
    }

    fn supported_algs() -> &'static [&'static str] {
        &["bfs"]
    }

    fn delete_edges_older_than(&mut self, threshold: Time) -> Result<(), BenchError> {
        let mut removed = Vec::new();
        for (src, neighbors) in self.out.iter_mut().enumerate() {
            neighbors.retain(|n| {
                let keep = n.timestamp >= threshold;
                if !keep {
                    removed.push((src as Node, n.dst));
                }
                keep
            });
        }
        for &(src, dst) in removed.iter() {
            self.touch(src, -1);
            self.touch(dst, -1);
        }
        self.num_edges -= removed.len() as i64;
        debug!("removed {} edges older than {}", removed.len(), threshold);
        Ok(())
    }

    fn insert_batch(&mut self, batch: &Batch<'_>) -> Result<(), BenchError> {
        let mut added = 0;
        for edge in batch {
            self.slot(edge.dst)?;
            let neighbors = self.slot(edge.src)?;
            match neighbors.iter_mut().find(|n| n.dst == edge.dst) {
                Some(existing) => {
                    existing.weight += edge.weight;
                    existing.timestamp = existing.timestamp.max(edge.timestamp);
                }
                None => {
                    neighbors.push(Neighbor { dst: edge.dst, weight: edge.weight, timestamp: edge.timestamp });
                    self.touch(edge.src, 1);
                    self.touch(edge.dst, 1);
                    added += 1;
                }
            }
        }
        self.num_edges += added;
        Ok(())
    }

    fn update_alg(&mut self, alg: &str, sources: &[Node], data: &mut [i64]) -> Result<(), BenchError> {
        match alg {
            "bfs" => {
                self.bfs(sources, data);
                Ok(())
            }
            _ => Err(BenchError::UnsupportedAlg {
                alg: alg.to_string(),
                supported: Self::supported_algs().iter().map(|s| s.to_string()).collect(),
            }),
        }
    }

    fn get_out_degree(&self, vertex: Node) -> i64 {
        self.out.get(vertex as usize).map_or(0, |n| n.len() as i64)
    }

    /// Vertices with at least one incident edge.
    fn get_num_vertices(&self) -> i64 {
        self.num_vertices
    }

    fn get_num_edges(&self) -> i64 {
        self.num_edges
    }

    fn get_high_degree_vertices(&self, n: usize) -> Vec<VertexDegree> {
        let degrees = self.out.iter().enumerate().map(|(vertex, neighbors)| VertexDegree {
            vertex_id: vertex as Node,
            out_degree: neighbors.len() as i64,
        });
        top_degree(degrees, n)
    }

    fn reset(&mut self, _args: &Args, max_vertex_id: Node) -> Result<(), BenchError> {
        self.out = Self::provision(max_vertex_id);
        self.incident = vec![0; self.out.len()];
        self.num_vertices = 0;
        self.num_edges = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;

    fn graph(edges: &[Edge]) -> ReferenceGraph {
        let mut graph = ReferenceGraph::new(&Args::new("g.graph.el", 1, 1), 5).unwrap();
        graph.insert_batch(&Batch::new(edges)).unwrap();
        graph
    }

    #[test]
    fn duplicate_inserts_accumulate_weight() {
        let g = graph(&[Edge::new(1, 2, 1, 0), Edge::new(1, 2, 5, 2), Edge::new(2, 3, 1, 3)]);
        assert_eq!(g.get_num_edges(), 2);
        assert_eq!(g.get_out_degree(1), 1);
        assert_eq!(g.out[1][0], Neighbor { dst: 2, weight: 6, timestamp: 2 });
        assert_eq!(g.get_num_vertices(), 3);
    }

    #[test]
    fn deletion_drops_old_edges() {
        let mut g = graph(&[Edge::new(1, 2, 1, 0), Edge::new(1, 3, 1, 4), Edge::new(3, 4, 1, 6)]);
        g.delete_edges_older_than(4).unwrap();
        assert_eq!(g.get_num_edges(), 2);
        assert_eq!(g.get_out_degree(1), 1);
        assert_eq!(g.get_num_vertices(), 3);
    }

    #[test]
    fn vertex_count_tracks_incident_edges() {
        let mut g = graph(&[Edge::new(1, 2, 1, 0), Edge::new(2, 3, 1, 2)]);
        assert_eq!(g.get_num_vertices(), 3);
        g.insert_batch(&Batch::owned(vec![Edge::new(1, 2, 4, 5)])).unwrap();
        assert_eq!(g.get_num_vertices(), 3);
        g.delete_edges_older_than(3).unwrap();
        assert_eq!(g.get_num_vertices(), 2);
        g.delete_edges_older_than(6).unwrap();
        assert_eq!((g.get_num_vertices(), g.get_num_edges()), (0, 0));
        g.insert_batch(&Batch::owned(vec![Edge::new(8, 3, 1, 7)])).unwrap();
        assert_eq!(g.get_num_vertices(), 2);
    }

    #[test]
    fn high_degree_ties_prefer_low_ids() {
        let g = graph(&[
            Edge::new(4, 1, 1, 0),
            Edge::new(4, 2, 1, 1),
            Edge::new(2, 1, 1, 2),
            Edge::new(1, 2, 1, 3),
        ]);
        let top = g.get_high_degree_vertices(2);
        assert_eq!(top, vec![VertexDegree { vertex_id: 4, out_degree: 2 }, VertexDegree { vertex_id: 1, out_degree: 1 }]);
        assert_eq!(g.get_high_degree_vertices(10).len(), 3);
    }

    #[test]
    fn bfs_counts_hops() {
        let mut g = graph(&[Edge::new(0, 1, 1, 0), Edge::new(1, 2, 1, 1), Edge::new(4, 5, 1, 2)]);
        let mut data = vec![7; 6];
        g.update_alg("bfs", &[0], &mut data).unwrap();
        assert_eq!(data, vec![0, 1, 2, -1, -1, -1]);
        assert!(matches!(g.update_alg("pagerank", &[], &mut data), Err(BenchError::UnsupportedAlg { .. })));
    }

    #[test]
    fn reset_empties_and_grows_on_demand() {
        let mut g = graph(&[Edge::new(0, 1, 1, 0)]);
        g.reset(&Args::new("g.graph.el", 1, 1), 2).unwrap();
        assert_eq!(g.get_num_edges(), 0);
        assert_eq!(g.get_num_vertices(), 0);
        g.insert_batch(&Batch::owned(vec![Edge::new(9, 1, 1, 0)])).unwrap();
        assert_eq!(g.get_out_degree(9), 1);
        assert!(g.insert_batch(&Batch::owned(vec![Edge::new(-1, 1, 1, 0)])).is_err());
    }
}
