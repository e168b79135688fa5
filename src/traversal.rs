//! Breadth- and depth-first traversal, and the connectivity analysis
//! built on top of it.
//!
//! Every run allocates its own [`Traversal`] record and returns it; nothing
//! is cached on the graph, so runs never observe each other.

use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;

use ahash::AHashMap;
use tracing::debug;

use crate::graph::{Direction, Graph, Undirected};

/// Visit lifecycle of a vertex during one traversal run. Transitions are
/// monotonic: `Unvisited → Discovered → Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VisitState {
    Unvisited,
    Discovered,
    Finished,
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VisitState::Unvisited => "unvisited",
            VisitState::Discovered => "discovered",
            VisitState::Finished => "finished",
        };
        write!(f, "{s}")
    }
}

/// Per-vertex facts recorded by one traversal run: BFS fills `distance`,
/// DFS fills the two timestamps.
#[derive(Clone, Debug, PartialEq)]
pub struct VertexRecord<T> {
    pub state: VisitState,
    pub distance: Option<u32>,
    pub discovered: Option<u32>,
    pub finished: Option<u32>,
    pub predecessor: Option<T>,
}

impl<T> Default for VertexRecord<T> {
    fn default() -> Self {
        VertexRecord {
            state: VisitState::Unvisited,
            distance: None,
            discovered: None,
            finished: None,
            predecessor: None,
        }
    }
}

/// Result of one BFS or DFS run.
///
/// Holds a [`VertexRecord`] for every vertex the graph had when the run
/// started, plus the vertex order for deterministic reporting.
#[derive(Clone, Debug)]
pub struct Traversal<T> {
    order: Vec<T>,
    records: AHashMap<T, VertexRecord<T>>,
    source: Option<T>,
}

impl<T: Eq + Hash> Traversal<T> {
    /// The BFS source, `None` for whole-graph DFS.
    pub fn source(&self) -> Option<&T> {
        self.source.as_ref()
    }

    pub fn record(&self, v: &T) -> Option<&VertexRecord<T>> {
        self.records.get(v)
    }

    /// Hop count from the source, `None` when unreachable (the report
    /// renders that as ∞).
    pub fn distance(&self, v: &T) -> Option<u32> {
        self.records.get(v).and_then(|r| r.distance)
    }

    pub fn predecessor(&self, v: &T) -> Option<&T> {
        self.records.get(v).and_then(|r| r.predecessor.as_ref())
    }

    /// Records in vertex-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &VertexRecord<T>)> {
        self.order
            .iter()
            .filter_map(|v| self.records.get(v).map(|r| (v, r)))
    }
}

impl<T: Clone + Eq + Hash> Traversal<T> {
    /// Walks predecessors backward from `target` to its tree root.
    /// `None` when the target was never discovered or is unknown.
    pub fn path_to(&self, target: &T) -> Option<Vec<T>> {
        let mut rec = self.records.get(target)?;
        if rec.state == VisitState::Unvisited {
            return None;
        }
        let mut path = vec![target.clone()];
        while let Some(p) = &rec.predecessor {
            path.push(p.clone());
            rec = self.records.get(p)?;
        }
        path.reverse();
        Some(path)
    }
}

impl<T: fmt::Display + Eq + Hash> fmt::Display for Traversal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(s) => writeln!(f, "traversal from {s}")?,
            None => writeln!(f, "depth-first forest")?,
        }
        for (v, rec) in self.iter() {
            write!(f, "  {v}: {}", rec.state)?;
            if self.source.is_some() {
                match rec.distance {
                    Some(d) => write!(f, ", distance {d}")?,
                    None => write!(f, ", distance ∞")?,
                }
            }
            if let (Some(d), Some(fin)) = (rec.discovered, rec.finished) {
                write!(f, ", {d}/{fin}")?;
            }
            match &rec.predecessor {
                Some(p) => writeln!(f, ", from {p}")?,
                None => writeln!(f)?,
            }
        }
        Ok(())
    }
}

/// Connected components of an undirected graph. Ids are assigned in the
/// insertion order of each component's first-seen vertex.
#[derive(Clone, Debug)]
pub struct Components<T> {
    groups: Vec<Vec<T>>,
    id_of: AHashMap<T, usize>,
}

impl<T: Eq + Hash> Components<T> {
    pub fn count(&self) -> usize {
        self.groups.len()
    }

    /// Zero-based component id of `v`.
    pub fn component_of(&self, v: &T) -> Option<usize> {
        self.id_of.get(v).copied()
    }

    /// Members of each component, in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &[T]> {
        self.groups.iter().map(Vec::as_slice)
    }
}

impl<T: fmt::Display + Eq + Hash> fmt::Display for Components<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} component(s)", self.count())?;
        for (id, members) in self.groups.iter().enumerate() {
            write!(f, "  component {}:", id + 1)?;
            for m in members {
                write!(f, " {m}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

enum Frame<T> {
    Enter { vertex: T, parent: Option<T> },
    Exit(T),
}

impl<T, D> Graph<T, D>
where
    T: Clone + Eq + Hash,
    D: Direction,
{
    fn blank_records(&self) -> AHashMap<T, VertexRecord<T>> {
        self.vertices()
            .map(|v| (v.clone(), VertexRecord::default()))
            .collect()
    }

    /// Level-order traversal from `source`, assigning hop distances and
    /// predecessors. Returns `None` when the source is not a vertex.
    pub fn bfs(&self, source: &T) -> Option<Traversal<T>> {
        if !self.contains_vertex(source) {
            return None;
        }
        debug!(order = self.order(), size = self.size(), "bfs");

        let mut records = self.blank_records();
        if let Some(rec) = records.get_mut(source) {
            rec.state = VisitState::Discovered;
            rec.distance = Some(0);
        }
        let mut queue = VecDeque::new();
        queue.push_back((source.clone(), 0u32));
        while let Some((u, du)) = queue.pop_front() {
            for v in self.neighbors(&u) {
                if let Some(rec) = records.get_mut(v) {
                    if rec.state == VisitState::Unvisited {
                        rec.state = VisitState::Discovered;
                        rec.distance = Some(du + 1);
                        rec.predecessor = Some(u.clone());
                        queue.push_back((v.clone(), du + 1));
                    }
                }
            }
            if let Some(rec) = records.get_mut(&u) {
                rec.state = VisitState::Finished;
            }
        }

        Some(Traversal {
            order: self.vertices().cloned().collect(),
            records,
            source: Some(source.clone()),
        })
    }

    /// Whole-graph depth-first forest. Unvisited vertices are taken as
    /// roots in insertion order; discovery and finish events share one
    /// clock owned by this run. The walk keeps its own stack, so deep
    /// graphs cannot exhaust the call stack.
    pub fn dfs(&self) -> Traversal<T> {
        debug!(order = self.order(), size = self.size(), "dfs");

        let mut records = self.blank_records();
        let mut clock: u32 = 0;
        let mut stack: Vec<Frame<T>> = Vec::new();

        for root in self.vertices() {
            let fresh = records
                .get(root)
                .map_or(false, |r| r.state == VisitState::Unvisited);
            if !fresh {
                continue;
            }
            stack.push(Frame::Enter {
                vertex: root.clone(),
                parent: None,
            });
            while let Some(frame) = stack.pop() {
                match frame {
                    Frame::Enter { vertex, parent } => {
                        let unvisited = records
                            .get(&vertex)
                            .map_or(false, |r| r.state == VisitState::Unvisited);
                        if !unvisited {
                            continue;
                        }
                        clock += 1;
                        if let Some(rec) = records.get_mut(&vertex) {
                            rec.state = VisitState::Discovered;
                            rec.discovered = Some(clock);
                            rec.predecessor = parent;
                        }
                        stack.push(Frame::Exit(vertex.clone()));
                        let follow: Vec<T> = self
                            .neighbors(&vertex)
                            .filter(|w| {
                                records
                                    .get(*w)
                                    .map_or(false, |r| r.state == VisitState::Unvisited)
                            })
                            .cloned()
                            .collect();
                        // reversed so the first neighbor is visited first,
                        // matching the recursive order
                        for w in follow.into_iter().rev() {
                            stack.push(Frame::Enter {
                                vertex: w,
                                parent: Some(vertex.clone()),
                            });
                        }
                    }
                    Frame::Exit(vertex) => {
                        clock += 1;
                        if let Some(rec) = records.get_mut(&vertex) {
                            rec.state = VisitState::Finished;
                            rec.finished = Some(clock);
                        }
                    }
                }
            }
        }

        Traversal {
            order: self.vertices().cloned().collect(),
            records,
            source: None,
        }
    }
}

impl<T: Clone + Eq + Hash> Graph<T, Undirected> {
    /// Connected components, one per depth-first tree, ids assigned in
    /// vertex-insertion order of the roots.
    pub fn components(&self) -> Components<T> {
        let mut id_of: AHashMap<T, usize> = AHashMap::with_capacity(self.order());
        let mut groups: Vec<Vec<T>> = Vec::new();
        for root in self.vertices() {
            if id_of.contains_key(root) {
                continue;
            }
            let id = groups.len();
            id_of.insert(root.clone(), id);
            let mut members = Vec::new();
            let mut stack = vec![root.clone()];
            while let Some(u) = stack.pop() {
                members.push(u.clone());
                for w in self.neighbors(&u) {
                    if !id_of.contains_key(w) {
                        id_of.insert(w.clone(), id);
                        stack.push(w.clone());
                    }
                }
            }
            groups.push(members);
        }
        debug!(components = groups.len(), "component analysis");
        Components { groups, id_of }
    }

    /// Whether the graph forms a single connected component. The empty
    /// graph counts as connected.
    pub fn is_connected(&self) -> bool {
        self.order() == 0 || self.components().count() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DiGraph, UnGraph};
    use proptest::prelude::*;

    fn line(labels: &[char]) -> UnGraph<char> {
        let mut g = UnGraph::new();
        for w in labels.windows(2) {
            g.add_edge(w[0], w[1]);
        }
        g
    }

    #[test]
    fn bfs_assigns_hop_distances() {
        let g = line(&['a', 'b', 'c', 'd']);
        let t = g.bfs(&'a').unwrap();
        assert_eq!(t.distance(&'a'), Some(0));
        assert_eq!(t.distance(&'b'), Some(1));
        assert_eq!(t.distance(&'c'), Some(2));
        assert_eq!(t.distance(&'d'), Some(3));
        assert_eq!(t.predecessor(&'d'), Some(&'c'));
        assert_eq!(t.record(&'d').unwrap().state, VisitState::Finished);
    }

    #[test]
    fn bfs_unknown_source_yields_nothing() {
        let g = line(&['a', 'b']);
        assert!(g.bfs(&'z').is_none());
    }

    #[test]
    fn bfs_leaves_unreachable_vertices_unvisited() {
        let mut g: DiGraph<char> = DiGraph::new();
        g.add_edge('a', 'b');
        g.add_vertex('c');
        let t = g.bfs(&'a').unwrap();
        assert_eq!(t.distance(&'c'), None);
        assert_eq!(t.record(&'c').unwrap().state, VisitState::Unvisited);
        assert_eq!(t.path_to(&'c'), None);
    }

    #[test]
    fn bfs_respects_edge_direction() {
        let mut g: DiGraph<char> = DiGraph::new();
        g.add_edge('a', 'b');
        g.add_edge('c', 'b');
        let t = g.bfs(&'a').unwrap();
        assert_eq!(t.distance(&'b'), Some(1));
        assert_eq!(t.distance(&'c'), None);
    }

    #[test]
    fn path_reconstruction_walks_predecessors() {
        let g = line(&['a', 'b', 'c', 'd']);
        let t = g.bfs(&'a').unwrap();
        assert_eq!(t.path_to(&'d'), Some(vec!['a', 'b', 'c', 'd']));
        assert_eq!(t.path_to(&'a'), Some(vec!['a']));
        assert_eq!(t.path_to(&'z'), None);
    }

    #[test]
    fn dfs_timestamps_nest_along_a_chain() {
        let mut g: DiGraph<char> = DiGraph::new();
        g.add_edge('a', 'b');
        g.add_edge('b', 'c');
        let t = g.dfs();
        let a = t.record(&'a').unwrap();
        let b = t.record(&'b').unwrap();
        let c = t.record(&'c').unwrap();
        assert_eq!((a.discovered, a.finished), (Some(1), Some(6)));
        assert_eq!((b.discovered, b.finished), (Some(2), Some(5)));
        assert_eq!((c.discovered, c.finished), (Some(3), Some(4)));
        assert_eq!(t.predecessor(&'c'), Some(&'b'));
        assert_eq!(b.state, VisitState::Finished);
    }

    #[test]
    fn dfs_roots_follow_insertion_order() {
        let mut g: UnGraph<u8> = UnGraph::new();
        g.add_vertex(9);
        g.add_edge(1, 2);
        g.add_edge(9, 5);
        let t = g.dfs();
        // 9 was inserted first, so its tree is explored first
        assert!(t.record(&9).unwrap().discovered < t.record(&1).unwrap().discovered);
        assert_eq!(t.predecessor(&9), None);
        assert_eq!(t.predecessor(&1), None);
        assert_eq!(t.predecessor(&5), Some(&9));
    }

    #[test]
    fn components_follow_insertion_order() {
        let mut g: UnGraph<char> = UnGraph::new();
        g.add_edge('x', 'y');
        g.add_vertex('q');
        g.add_edge('m', 'x');
        let c = g.components();
        assert_eq!(c.count(), 2);
        assert_eq!(c.component_of(&'x'), Some(0));
        assert_eq!(c.component_of(&'m'), Some(0));
        assert_eq!(c.component_of(&'q'), Some(1));
        assert_eq!(c.component_of(&'?'), None);
    }

    #[test]
    fn connectivity_treats_empty_graph_as_connected() {
        let empty: UnGraph<char> = UnGraph::new();
        assert!(empty.is_connected());
        let single = {
            let mut g = UnGraph::new();
            g.add_vertex('a');
            g
        };
        assert!(single.is_connected());
        let mut split = UnGraph::new();
        split.add_edge('a', 'b');
        split.add_vertex('c');
        assert!(!split.is_connected());
    }

    #[test]
    fn traversal_report_marks_unreachable_distance() {
        let mut g: DiGraph<char> = DiGraph::new();
        g.add_edge('a', 'b');
        g.add_vertex('z');
        let report = g.bfs(&'a').unwrap().to_string();
        assert!(report.contains("traversal from a"));
        assert!(report.contains("z: unvisited, distance ∞"));
    }

    proptest! {
        // parenthesis property: any two discovery/finish intervals are
        // either nested or disjoint
        #[test]
        fn dfs_intervals_nest_or_are_disjoint(
            edges in proptest::collection::vec((0u8..8, 0u8..8), 0..24)
        ) {
            let mut g: DiGraph<u8> = DiGraph::new();
            for v in 0..8 {
                g.add_vertex(v);
            }
            for (u, v) in edges {
                g.add_edge(u, v);
            }
            let t = g.dfs();
            let spans: Vec<(u32, u32)> = (0..8)
                .filter_map(|v| {
                    let rec = t.record(&v)?;
                    Some((rec.discovered?, rec.finished?))
                })
                .collect();
            prop_assert_eq!(spans.len(), 8);
            for (i, &(d1, f1)) in spans.iter().enumerate() {
                prop_assert!(d1 < f1);
                for &(d2, f2) in &spans[i + 1..] {
                    let nested = (d1 < d2 && f2 < f1) || (d2 < d1 && f1 < f2);
                    let disjoint = f1 < d2 || f2 < d1;
                    prop_assert!(nested || disjoint);
                }
            }
        }

        // BFS distances never skip a level along a tree edge
        #[test]
        fn bfs_distances_grow_by_one_hop(
            edges in proptest::collection::vec((0u8..8, 0u8..8), 1..24)
        ) {
            let mut g: UnGraph<u8> = UnGraph::new();
            for (u, v) in edges {
                g.add_edge(u, v);
            }
            let source = *g.vertices().next().unwrap();
            let t = g.bfs(&source).unwrap();
            for v in g.vertices() {
                if let Some(d) = t.distance(v) {
                    match t.predecessor(v) {
                        Some(p) => prop_assert_eq!(t.distance(p), Some(d - 1)),
                        None => prop_assert_eq!(d, 0),
                    }
                }
            }
        }
    }
}
