//! Eulerian circuit detection and construction on undirected graphs.
//!
//! A circuit exists iff the graph has at least one edge, every vertex has
//! even degree, and the graph is connected. Construction runs Hierholzer's
//! algorithm with an explicit stack over an adjacency multiset, so edges
//! are consumed one by one and merged sub-tours come out in walk order.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

use ahash::AHashMap;
use itertools::Itertools;
use thiserror::Error;
use tracing::debug;

use crate::graph::{Graph, Undirected};

/// A closed walk using every edge exactly once.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EulerCircuit<T> {
    walk: Vec<T>,
}

impl<T> EulerCircuit<T> {
    /// Vertices in walk order. The first and last entry coincide.
    pub fn walk(&self) -> &[T] {
        &self.walk
    }

    /// Edges the walk traverses, one fewer than its vertex entries.
    pub fn edge_count(&self) -> usize {
        self.walk.len().saturating_sub(1)
    }
}

impl<T: fmt::Display> fmt::Display for EulerCircuit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.walk.iter().join(" -> "))
    }
}

/// Why no Eulerian circuit could be produced.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EulerError<T> {
    /// The precondition check failed; every violated condition is
    /// reported at once.
    #[error(
        "not eulerian: {edge_count} edge(s), {components} component(s), \
         odd-degree vertices {odd_vertices:?}"
    )]
    NotEulerian {
        odd_vertices: Vec<T>,
        components: usize,
        edge_count: usize,
    },
    /// The walk got stuck before consuming every edge.
    #[error("circuit construction consumed {used} of {total} edge(s)")]
    IncompleteCircuit { used: usize, total: usize },
    /// The walk ended away from its starting vertex.
    #[error("walk did not close on its starting vertex")]
    OpenWalk,
}

impl<T> Graph<T, Undirected>
where
    T: Clone + Eq + Hash,
{
    /// True iff the graph has at least one edge, only even degrees, and a
    /// single connected component.
    pub fn is_eulerian(&self) -> bool {
        self.order() > 0
            && self.size() > 0
            && self.vertices().all(|v| self.degree(v) % 2 == 0)
            && self.is_connected()
    }

    /// Builds an Eulerian circuit starting at the first inserted vertex.
    ///
    /// All violated preconditions are gathered before giving up, so a
    /// disconnected graph with odd vertices reports both at once.
    pub fn euler_circuit(&self) -> Result<EulerCircuit<T>, EulerError<T>> {
        let odd_vertices: Vec<T> = self
            .vertices()
            .filter(|v| self.degree(v) % 2 == 1)
            .cloned()
            .collect();
        let components = self.components().count();
        let edge_count = self.size();
        if edge_count == 0 || components != 1 || !odd_vertices.is_empty() {
            return Err(EulerError::NotEulerian {
                odd_vertices,
                components,
                edge_count,
            });
        }
        debug!(order = self.order(), size = edge_count, "euler circuit");

        // each logical edge appears once per endpoint
        let mut adjacency: AHashMap<&T, VecDeque<&T>> = AHashMap::new();
        for e in self.edges() {
            adjacency.entry(e.origin()).or_default().push_back(e.destination());
            adjacency.entry(e.destination()).or_default().push_back(e.origin());
        }

        let mut stack: Vec<&T> = self.vertices().take(1).collect();
        let mut circuit: VecDeque<&T> = VecDeque::new();
        while let Some(&top) = stack.last() {
            let next = adjacency.get_mut(top).and_then(VecDeque::pop_front);
            match next {
                Some(n) => {
                    // retire the same edge as seen from the far endpoint
                    if let Some(back) = adjacency.get_mut(n) {
                        if let Some(pos) = back.iter().position(|x| *x == top) {
                            back.remove(pos);
                        }
                    }
                    stack.push(n);
                }
                None => {
                    if let Some(v) = stack.pop() {
                        circuit.push_front(v);
                    }
                }
            }
        }

        let leftover: usize = adjacency.values().map(VecDeque::len).sum();
        if leftover > 0 {
            return Err(EulerError::IncompleteCircuit {
                used: edge_count - leftover / 2,
                total: edge_count,
            });
        }
        let walk: Vec<T> = circuit.into_iter().cloned().collect();
        match (walk.first(), walk.last()) {
            (Some(a), Some(b)) if a == b => Ok(EulerCircuit { walk }),
            _ => Err(EulerError::OpenWalk),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::UnGraph;

    fn four_cycle() -> UnGraph<char> {
        let mut g = UnGraph::new();
        g.add_edge('a', 'b');
        g.add_edge('b', 'c');
        g.add_edge('c', 'd');
        g.add_edge('d', 'a');
        g
    }

    #[test]
    fn four_cycle_has_a_circuit() {
        let g = four_cycle();
        assert!(g.is_eulerian());
        let c = g.euler_circuit().unwrap();
        assert_eq!(c.walk(), ['a', 'b', 'c', 'd', 'a']);
        assert_eq!(c.edge_count(), 4);
        assert_eq!(c.to_string(), "a -> b -> c -> d -> a");
    }

    #[test]
    fn triangle_has_a_circuit() {
        let mut g = UnGraph::new();
        g.add_edge('a', 'b');
        g.add_edge('b', 'c');
        g.add_edge('c', 'a');
        assert!(g.is_eulerian());
        let c = g.euler_circuit().unwrap();
        assert_eq!(c.walk().len(), 4);
        assert_eq!(c.walk().first(), c.walk().last());
    }

    #[test]
    fn odd_degrees_are_diagnosed() {
        let mut g = UnGraph::new();
        g.add_edge('a', 'b');
        g.add_edge('b', 'c');
        assert!(!g.is_eulerian());
        assert_eq!(
            g.euler_circuit(),
            Err(EulerError::NotEulerian {
                odd_vertices: vec!['a', 'c'],
                components: 1,
                edge_count: 2,
            })
        );
    }

    #[test]
    fn disconnection_and_odd_degrees_report_together() {
        let mut g = four_cycle();
        g.add_edge('x', 'y');
        let err = g.euler_circuit().unwrap_err();
        assert_eq!(
            err,
            EulerError::NotEulerian {
                odd_vertices: vec!['x', 'y'],
                components: 2,
                edge_count: 5,
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("2 component(s)"));
        assert!(msg.contains("odd-degree vertices ['x', 'y']"));
    }

    #[test]
    fn edgeless_graphs_have_no_circuit() {
        let mut g: UnGraph<char> = UnGraph::new();
        g.add_vertex('a');
        g.add_vertex('b');
        assert!(!g.is_eulerian());
        assert_eq!(
            g.euler_circuit(),
            Err(EulerError::NotEulerian {
                odd_vertices: vec![],
                components: 2,
                edge_count: 0,
            })
        );
    }

    #[test]
    fn weights_do_not_affect_the_walk() {
        let mut g = UnGraph::new();
        for (u, v) in [('a', 'b'), ('b', 'c'), ('c', 'd'), ('d', 'a')] {
            g.add_weighted_edge(u, v, 2.5).unwrap();
        }
        assert_eq!(g.euler_circuit().unwrap().edge_count(), 4);
    }

    #[test]
    fn bowtie_merges_sub_tours() {
        // two triangles sharing vertex c, all degrees even
        let mut g = UnGraph::new();
        g.add_edge('a', 'b');
        g.add_edge('b', 'c');
        g.add_edge('c', 'a');
        g.add_edge('c', 'd');
        g.add_edge('d', 'e');
        g.add_edge('e', 'c');
        assert!(g.is_eulerian());
        let c = g.euler_circuit().unwrap();
        assert_eq!(c.edge_count(), 6);
        assert_eq!(c.walk().first(), Some(&'a'));
        assert_eq!(c.walk().last(), Some(&'a'));

        // every hop is a real edge and no edge is walked twice
        let mut seen: Vec<(char, char)> = Vec::new();
        for w in c.walk().windows(2) {
            let pair = if w[0] <= w[1] { (w[0], w[1]) } else { (w[1], w[0]) };
            assert!(g.edge_between(&w[0], &w[1]).is_some());
            assert!(!seen.contains(&pair));
            seen.push(pair);
        }
        assert_eq!(seen.len(), g.size());
    }
}
