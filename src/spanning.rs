//! Minimum spanning structures: Prim's vertex-priority growth and
//! Kruskal's edge-sort with union-find.
//!
//! On directed graphs both methods keep the greedy behavior of their
//! undirected forms instead of solving the minimum-arborescence problem:
//! Prim grows along out-edges only and Kruskal additionally refuses a
//! second incoming edge per vertex. Neither is Chu-Liu/Edmonds, so the
//! directed results are a documented approximation, not a minimum.

use std::collections::BinaryHeap;
use std::fmt;
use std::hash::Hash;

use bitvec::prelude::*;
use tracing::debug;

use crate::graph::{Direction, Graph};
use crate::shortest_path::MinScored;
use crate::union_find::UnionFind;

/// Two costs closer than this count as equal when spanning structures are
/// compared.
pub const COST_TOLERANCE: f64 = 1e-4;

/// One accepted edge of a spanning structure.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpanningEdge<T> {
    pub origin: T,
    pub destination: T,
    pub weight: f64,
}

impl<T: PartialEq> SpanningEdge<T> {
    fn matches(&self, other: &Self, directed: bool) -> bool {
        if (self.weight - other.weight).abs() > COST_TOLERANCE {
            return false;
        }
        let same = self.origin == other.origin && self.destination == other.destination;
        if directed {
            same
        } else {
            same || (self.origin == other.destination && self.destination == other.origin)
        }
    }
}

/// A spanning tree, arborescence, or forest, depending on the algorithm
/// and the graph's connectivity.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpanningTree<T> {
    root: Option<T>,
    edges: Vec<SpanningEdge<T>>,
    vertex_count: usize,
    directed: bool,
}

impl<T> SpanningTree<T> {
    /// The growth root, `None` for Kruskal results.
    pub fn root(&self) -> Option<&T> {
        self.root.as_ref()
    }

    /// Accepted edges in vertex-insertion order (Prim) or ascending weight
    /// order (Kruskal).
    pub fn edges(&self) -> &[SpanningEdge<T>] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn total_cost(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Vertices the graph had when the run started.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// True iff the structure reaches every vertex, which on n vertices
    /// means exactly n - 1 accepted edges.
    pub fn is_spanning(&self) -> bool {
        self.vertex_count > 0 && self.edges.len() + 1 == self.vertex_count
    }

    /// Number of trees in the structure, counting untouched vertices as
    /// singletons.
    pub fn trees(&self) -> usize {
        self.vertex_count - self.edges.len()
    }
}

impl<T: PartialEq> SpanningTree<T> {
    /// Participating vertices without an incoming accepted edge, in the
    /// order the accepted edges mention them. Vertices touching no
    /// accepted edge are not listed.
    pub fn forest_roots(&self) -> Vec<&T> {
        let mut seen: Vec<&T> = Vec::new();
        for e in &self.edges {
            if !seen.contains(&&e.origin) {
                seen.push(&e.origin);
            }
            if !seen.contains(&&e.destination) {
                seen.push(&e.destination);
            }
        }
        seen.retain(|v| !self.edges.iter().any(|e| e.destination == **v));
        seen
    }
}

impl<T: fmt::Display> fmt::Display for SpanningTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = if self.directed { "->" } else { "--" };
        match &self.root {
            Some(r) => write!(
                f,
                "spanning structure from {r}: reaches {} of {} vertices",
                self.edges.len() + 1,
                self.vertex_count
            )?,
            None => write!(f, "spanning forest, {} tree(s)", self.trees())?,
        }
        writeln!(f, ", cost {}, {} edge(s)", self.total_cost(), self.edges.len())?;
        for e in &self.edges {
            writeln!(f, "  {} {link} {} ({})", e.origin, e.destination, e.weight)?;
        }
        Ok(())
    }
}

/// Verdict of running Prim and Kruskal on the same graph.
#[derive(Clone, Debug)]
pub struct SpanningComparison<T> {
    prim: SpanningTree<T>,
    kruskal: SpanningTree<T>,
}

impl<T> SpanningComparison<T> {
    pub fn prim(&self) -> &SpanningTree<T> {
        &self.prim
    }

    pub fn kruskal(&self) -> &SpanningTree<T> {
        &self.kruskal
    }

    /// Total costs within [`COST_TOLERANCE`] of each other.
    pub fn costs_match(&self) -> bool {
        (self.prim.total_cost() - self.kruskal.total_cost()).abs() <= COST_TOLERANCE
    }
}

impl<T: PartialEq> SpanningComparison<T> {
    /// Whether both runs accepted the same edges. Distinct optimal trees
    /// can legitimately differ here while matching in cost.
    pub fn same_edge_set(&self) -> bool {
        if self.prim.edges.len() != self.kruskal.edges.len() {
            return false;
        }
        let mut used = vec![false; self.kruskal.edges.len()];
        'outer: for e in &self.prim.edges {
            for (i, k) in self.kruskal.edges.iter().enumerate() {
                if !used[i] && e.matches(k, self.prim.directed) {
                    used[i] = true;
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }
}

impl<T: fmt::Display + PartialEq> fmt::Display for SpanningComparison<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "prim cost {} vs kruskal cost {}: {}",
            self.prim.total_cost(),
            self.kruskal.total_cost(),
            if self.costs_match() {
                "costs match"
            } else {
                "costs differ"
            }
        )?;
        writeln!(
            f,
            "edge sets {}",
            if self.same_edge_set() {
                "match"
            } else {
                "differ (distinct optimal trees are possible)"
            }
        )
    }
}

impl<T, D> Graph<T, D>
where
    T: Clone + Eq + Hash,
    D: Direction,
{
    /// Grows a spanning structure from `root` by repeatedly absorbing the
    /// vertex with the cheapest known connecting edge. Returns `None`
    /// when the root is not a vertex.
    ///
    /// Undirected graphs get a minimum spanning tree of the root's
    /// component; fewer than n - 1 edges mean the graph is disconnected
    /// and the tree is partial. Directed graphs grow along out-edges only,
    /// yielding a greedy arborescence approximation (see module docs).
    pub fn prim(&self, root: &T) -> Option<SpanningTree<T>> {
        let start = self.vertex_index(root)?;
        debug!(order = self.order(), size = self.size(), "prim");

        let slots: Vec<&T> = self.vertices().collect();
        let n = slots.len();
        let mut key = vec![f64::INFINITY; n];
        let mut pred: Vec<Option<usize>> = vec![None; n];
        let mut absorbed = bitvec![0; n];
        let mut heap = BinaryHeap::new();
        key[start] = 0.0;
        heap.push(MinScored(0.0, start));

        while let Some(MinScored(_, u)) = heap.pop() {
            if absorbed[u] {
                continue;
            }
            absorbed.set(u, true);
            for e in self.edges_from(slots[u]) {
                let v = match self.vertex_index(e.destination()) {
                    Some(v) => v,
                    None => continue,
                };
                let w = e.weight();
                if !absorbed[v] && w < key[v] {
                    key[v] = w;
                    pred[v] = Some(u);
                    heap.push(MinScored(w, v));
                }
            }
        }

        let edges = (0..n)
            .filter_map(|v| {
                pred[v].map(|p| SpanningEdge {
                    origin: slots[p].clone(),
                    destination: slots[v].clone(),
                    weight: key[v],
                })
            })
            .collect();
        Some(SpanningTree {
            root: Some(root.clone()),
            edges,
            vertex_count: n,
            directed: D::IS_DIRECTED,
        })
    }

    /// Sorts the weighted edges ascending and accepts each one whose
    /// endpoints union-find still keeps apart, producing a minimum
    /// spanning forest.
    ///
    /// Undirected graphs contribute each logical edge once. Directed
    /// graphs consider every record and additionally refuse an edge into
    /// a vertex that already has an incoming accepted edge, so every
    /// vertex keeps at most one predecessor (see module docs for why this
    /// is a heuristic). Equal weights keep insertion order.
    pub fn kruskal(&self) -> SpanningTree<T> {
        debug!(order = self.order(), size = self.size(), "kruskal");

        let mut candidates: Vec<_> = self.edges().filter(|e| e.kind().is_weighted()).collect();
        candidates.sort_by(|a, b| a.weight().total_cmp(&b.weight()));

        let mut dsu = UnionFind::new();
        for v in self.vertices() {
            dsu.make_set(v.clone());
        }
        let mut accepted: Vec<SpanningEdge<T>> = Vec::new();
        for e in candidates {
            let (u, v) = (e.origin(), e.destination());
            if dsu.connected(u, v) {
                continue;
            }
            if D::IS_DIRECTED && accepted.iter().any(|a| a.destination == *v) {
                continue;
            }
            dsu.union(u, v);
            accepted.push(SpanningEdge {
                origin: u.clone(),
                destination: v.clone(),
                weight: e.weight(),
            });
        }

        SpanningTree {
            root: None,
            edges: accepted,
            vertex_count: self.order(),
            directed: D::IS_DIRECTED,
        }
    }

    /// Runs Prim from `root` and Kruskal over the whole graph, pairing
    /// the results for cost and edge-set comparison. `None` when the root
    /// is not a vertex.
    pub fn compare_spanning(&self, root: &T) -> Option<SpanningComparison<T>> {
        let prim = self.prim(root)?;
        let kruskal = self.kruskal();
        Some(SpanningComparison { prim, kruskal })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DiGraph, UnGraph};
    use proptest::prelude::*;

    fn triangle() -> UnGraph<char> {
        let mut g = UnGraph::new();
        g.add_weighted_edge('a', 'b', 1.0).unwrap();
        g.add_weighted_edge('b', 'c', 2.0).unwrap();
        g.add_weighted_edge('a', 'c', 4.0).unwrap();
        g
    }

    #[test]
    fn kruskal_picks_the_two_cheap_edges() {
        let t = triangle().kruskal();
        assert_eq!(t.edge_count(), 2);
        assert_eq!(t.total_cost(), 3.0);
        assert!(t.is_spanning());
        let pairs: Vec<(char, char)> = t
            .edges()
            .iter()
            .map(|e| (e.origin, e.destination))
            .collect();
        similar_asserts::assert_eq!(pairs, [('a', 'b'), ('b', 'c')]);
    }

    #[test]
    fn prim_matches_kruskal_on_the_triangle() {
        let g = triangle();
        let p = g.prim(&'a').unwrap();
        assert_eq!(p.edge_count(), 2);
        assert_eq!(p.total_cost(), 3.0);
        assert!(p.is_spanning());
        let cmp = g.compare_spanning(&'a').unwrap();
        assert!(cmp.costs_match());
        assert!(cmp.same_edge_set());
    }

    #[test]
    fn prim_unknown_root_yields_nothing() {
        assert!(triangle().prim(&'z').is_none());
    }

    #[test]
    fn disconnected_graphs_produce_partial_structures() {
        let mut g = triangle();
        g.add_weighted_edge('x', 'y', 1.0).unwrap();
        let p = g.prim(&'a').unwrap();
        assert_eq!(p.edge_count(), 2);
        assert!(!p.is_spanning());

        let k = g.kruskal();
        assert_eq!(k.edge_count(), 3);
        assert_eq!(k.trees(), 2);
        assert!(!k.is_spanning());
    }

    #[test]
    fn plain_edges_never_join_the_structure() {
        let mut g: UnGraph<char> = UnGraph::new();
        g.add_edge('a', 'b');
        g.add_weighted_edge('b', 'c', 1.0).unwrap();
        assert_eq!(g.prim(&'b').unwrap().edge_count(), 1);
        assert_eq!(g.kruskal().edge_count(), 1);
    }

    #[test]
    fn equal_weights_keep_insertion_order() {
        let mut g: UnGraph<char> = UnGraph::new();
        g.add_weighted_edge('a', 'b', 1.0).unwrap();
        g.add_weighted_edge('b', 'c', 1.0).unwrap();
        g.add_weighted_edge('a', 'c', 1.0).unwrap();
        let pairs: Vec<(char, char)> = g
            .kruskal()
            .edges()
            .iter()
            .map(|e| (e.origin, e.destination))
            .collect();
        similar_asserts::assert_eq!(pairs, [('a', 'b'), ('b', 'c')]);
    }

    #[test]
    fn directed_kruskal_keeps_one_predecessor_per_vertex() {
        let mut g: DiGraph<char> = DiGraph::new();
        g.add_weighted_edge('a', 'c', 1.0).unwrap();
        g.add_weighted_edge('b', 'c', 2.0).unwrap();
        let k = g.kruskal();
        // b -> c joins different components but c already has a parent
        assert_eq!(k.edge_count(), 1);
        assert_eq!((k.edges()[0].origin, k.edges()[0].destination), ('a', 'c'));
        assert_eq!(k.forest_roots(), [&'a']);
    }

    #[test]
    fn directed_prim_grows_an_arborescence_from_the_root() {
        let mut g: DiGraph<char> = DiGraph::new();
        g.add_weighted_edge('a', 'b', 1.0).unwrap();
        g.add_weighted_edge('b', 'c', 1.0).unwrap();
        g.add_weighted_edge('c', 'a', 5.0).unwrap();
        g.add_weighted_edge('d', 'a', 1.0).unwrap();
        let p = g.prim(&'a').unwrap();
        // d only points into the root, so it stays out of reach
        assert_eq!(p.edge_count(), 2);
        assert!(!p.is_spanning());
        assert!(p.edges().iter().all(|e| e.destination != 'a'));
    }

    #[test]
    fn reports_render_cost_and_edges() {
        let g = triangle();
        let report = g.prim(&'a').unwrap().to_string();
        assert!(report.contains("spanning structure from a"));
        assert!(report.contains("cost 3"));
        assert!(report.contains("a -- b (1)"));

        let forest = g.kruskal().to_string();
        assert!(forest.contains("spanning forest, 1 tree(s)"));
    }

    proptest! {
        // on a connected graph both algorithms produce n - 1 edges and
        // the same total cost
        #[test]
        fn prim_and_kruskal_agree_on_connected_graphs(
            spine in proptest::collection::vec(1u32..100, 1..7),
            extra in proptest::collection::vec((0u8..8, 0u8..8, 1u32..100), 0..12),
        ) {
            let mut g: UnGraph<u8> = UnGraph::new();
            let n = spine.len() as u8 + 1;
            for (i, w) in spine.iter().enumerate() {
                g.add_weighted_edge(i as u8, i as u8 + 1, f64::from(*w)).unwrap();
            }
            for (u, v, w) in extra {
                if u != v && u < n && v < n {
                    g.add_weighted_edge(u, v, f64::from(w)).unwrap();
                }
            }
            let cmp = g.compare_spanning(&0).unwrap();
            prop_assert_eq!(cmp.prim().edge_count(), usize::from(n) - 1);
            prop_assert_eq!(cmp.kruskal().edge_count(), usize::from(n) - 1);
            prop_assert!(cmp.costs_match(), "{}", cmp);
        }
    }
}
