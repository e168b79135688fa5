//! Labeled graphs with a direction discipline fixed at the type level.
//!
//! Vertices are identified by label equality and kept in insertion order.
//! Undirected graphs materialize every logical edge as a mirror pair of
//! directed records, so adjacency and lookup code is shared with the
//! directed case.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;

use ahash::RandomState;
use derive_more::{From, Into};
use indexmap::IndexSet;
use thiserror::Error;

/// Identifier of a stored edge record.
///
/// Ids are handed out from a per-graph sequence starting at `e1` and are
/// never reused, even after removals. The textual token round-trips through
/// [`fmt::Display`] and [`FromStr`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, From, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed edge token {token:?}, expected e<number>")]
pub struct EdgeIdParseError {
    pub token: String,
}

impl FromStr for EdgeId {
    type Err = EdgeIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('e')
            .and_then(|digits| digits.parse().ok())
            .map(EdgeId)
            .ok_or_else(|| EdgeIdParseError {
                token: s.to_owned(),
            })
    }
}

/// Weight inputs the store refuses to record.
#[derive(Debug, Error, PartialEq)]
pub enum WeightError {
    #[error("edge weight must be finite, got {0}")]
    NotFinite(f64),
}

/// Payload of an edge record: a bare connection or a finite weight.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeKind {
    Plain,
    Weighted(f64),
}

impl EdgeKind {
    /// The stored weight. Plain edges carry none and yield the
    /// `f64::INFINITY` sentinel, the same answer as "no edge at all".
    pub fn weight(self) -> f64 {
        match self {
            EdgeKind::Plain => f64::INFINITY,
            EdgeKind::Weighted(w) => w,
        }
    }

    pub fn is_weighted(self) -> bool {
        matches!(self, EdgeKind::Weighted(_))
    }
}

/// A stored edge record.
///
/// In undirected graphs every logical edge is kept as two mirror records,
/// one per traversal direction, sharing the weight and pointing at each
/// other through `twin`. The pair is inserted and removed together.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge<T> {
    id: EdgeId,
    origin: T,
    destination: T,
    kind: EdgeKind,
    twin: Option<EdgeId>,
}

impl<T> Edge<T> {
    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn origin(&self) -> &T {
        &self.origin
    }

    pub fn destination(&self) -> &T {
        &self.destination
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// The record's weight, `f64::INFINITY` for plain edges.
    pub fn weight(&self) -> f64 {
        self.kind.weight()
    }

    /// Id of the mirror record, `None` in directed graphs.
    pub fn twin(&self) -> Option<EdgeId> {
        self.twin
    }
}

impl<T: PartialEq> Edge<T> {
    fn touches(&self, v: &T) -> bool {
        self.origin == *v || self.destination == *v
    }
}

impl<T: fmt::Display> fmt::Display for Edge<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = if self.twin.is_some() { "--" } else { "->" };
        write!(f, "{}: {} {} {}", self.id, self.origin, link, self.destination)?;
        if let EdgeKind::Weighted(w) = self.kind {
            write!(f, " ({w})")?;
        }
        Ok(())
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Directed {}
    impl Sealed for super::Undirected {}
}

/// Marker trait selecting the edge-direction discipline of a [`Graph`].
pub trait Direction: sealed::Sealed + Copy + fmt::Debug + Default + 'static {
    const IS_DIRECTED: bool;
}

/// Edges are one-way records; adjacency follows origins only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Directed;

/// Every logical edge is stored as a mirror pair of records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Undirected;

impl Direction for Directed {
    const IS_DIRECTED: bool = true;
}

impl Direction for Undirected {
    const IS_DIRECTED: bool = false;
}

/// A graph over labels of type `T`, directed or undirected per `D`.
///
/// The vertex set preserves insertion order, which fixes the iteration
/// order of every whole-graph algorithm and report. Mutations take
/// `&mut self` while algorithms take `&self`, so a run always sees a
/// stable snapshot.
#[derive(Clone, Debug)]
pub struct Graph<T, D: Direction = Directed> {
    vertices: IndexSet<T, RandomState>,
    edges: Vec<Edge<T>>,
    next_edge: u32,
    direction: PhantomData<D>,
}

pub type DiGraph<T> = Graph<T, Directed>;
pub type UnGraph<T> = Graph<T, Undirected>;

impl<T, D: Direction> Default for Graph<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, D: Direction> Graph<T, D> {
    pub fn new() -> Self {
        Graph {
            vertices: IndexSet::with_hasher(RandomState::new()),
            edges: Vec::new(),
            next_edge: 1,
            direction: PhantomData,
        }
    }

    pub fn is_directed(&self) -> bool {
        D::IS_DIRECTED
    }

    /// Number of vertices.
    pub fn order(&self) -> usize {
        self.vertices.len()
    }

    /// Number of logical edges. Mirror pairs count once.
    pub fn size(&self) -> usize {
        if D::IS_DIRECTED {
            self.edges.len()
        } else {
            self.edges.len() / 2
        }
    }

    /// Vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = &T> {
        self.vertices.iter()
    }

    /// Logical edges in insertion order: one record per mirror pair for
    /// undirected graphs, every record for directed ones.
    pub fn edges(&self) -> impl Iterator<Item = &Edge<T>> {
        self.edges.iter().filter(|e| match e.twin {
            // the first record of a pair got the smaller id
            Some(twin) => e.id < twin,
            None => true,
        })
    }

    /// Every stored record, mirror records included.
    pub fn edge_records(&self) -> impl Iterator<Item = &Edge<T>> {
        self.edges.iter()
    }

    /// The record addressed by `id`.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge<T>> {
        self.edges.iter().find(|e| e.id == id)
    }

    fn fresh_edge_id(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        id
    }
}

impl<T, D> Graph<T, D>
where
    T: Eq + Hash,
    D: Direction,
{
    pub fn contains_vertex(&self, label: &T) -> bool {
        self.vertices.contains(label)
    }

    /// Inserts a vertex, returning whether it was new.
    pub fn add_vertex(&mut self, label: T) -> bool {
        self.vertices.insert(label)
    }

    /// Removes a vertex and every incident edge record. Unknown labels are
    /// a no-op returning false.
    pub fn remove_vertex(&mut self, label: &T) -> bool {
        if !self.vertices.shift_remove(label) {
            return false;
        }
        self.edges.retain(|e| !e.touches(label));
        true
    }

    /// Removes the record addressed by `id` together with its mirror twin.
    /// Unknown ids are a no-op returning false.
    pub fn remove_edge(&mut self, id: EdgeId) -> bool {
        let twin = match self.edge(id) {
            Some(record) => record.twin,
            None => return false,
        };
        self.edges.retain(|e| e.id != id && Some(e.id) != twin);
        true
    }

    /// The stored edge from `origin` to `destination`.
    ///
    /// Directed graphs match the ordered pair. Undirected graphs hold a
    /// record per direction, so the lookup is direction-insensitive
    /// without a separate code path.
    pub fn edge_between(&self, origin: &T, destination: &T) -> Option<&Edge<T>> {
        self.edges
            .iter()
            .find(|e| e.origin == *origin && e.destination == *destination)
    }

    /// Weight of the edge from `origin` to `destination`, or the
    /// `f64::INFINITY` sentinel when no weighted edge connects them.
    /// "No edge" is a queryable state, not an error.
    pub fn weight(&self, origin: &T, destination: &T) -> f64 {
        self.edge_between(origin, destination)
            .map_or(f64::INFINITY, Edge::weight)
    }

    /// The endpoint opposite `v` on the edge addressed by `id`, if that
    /// edge touches `v`.
    pub fn opposite(&self, v: &T, id: EdgeId) -> Option<&T> {
        let e = self.edge(id)?;
        if e.origin == *v {
            Some(&e.destination)
        } else if e.destination == *v {
            Some(&e.origin)
        } else {
            None
        }
    }

    /// Records oriented away from `v` in insertion order. For directed
    /// graphs these are the out-edges; for undirected graphs each incident
    /// logical edge shows up exactly once, pointing away from `v`.
    pub fn edges_from<'a>(&'a self, v: &'a T) -> impl Iterator<Item = &'a Edge<T>> {
        self.edges.iter().filter(move |e| e.origin == *v)
    }

    /// Neighbor labels reachable from `v`, in edge-insertion order.
    /// Out-neighbors only for directed graphs. Unknown labels yield an
    /// empty iterator.
    pub fn neighbors<'a>(&'a self, v: &'a T) -> impl Iterator<Item = &'a T> {
        self.edges_from(v).map(|e| &e.destination)
    }

    /// Every record touching `v`, both mirror records included for
    /// undirected graphs.
    pub fn incident_edges<'a>(&'a self, v: &'a T) -> impl Iterator<Item = &'a Edge<T>> {
        self.edges.iter().filter(move |e| e.touches(v))
    }

    /// Total degree of `v`: in plus out for directed graphs, count of
    /// unique incident logical edges for undirected ones (the mirror pair
    /// counts once, a self-loop counts once). Unknown labels have degree 0.
    pub fn degree(&self, v: &T) -> usize {
        if D::IS_DIRECTED {
            let out = self.edges.iter().filter(|e| e.origin == *v).count();
            let inc = self.edges.iter().filter(|e| e.destination == *v).count();
            out + inc
        } else {
            self.edges().filter(|e| e.touches(v)).count()
        }
    }

    pub(crate) fn vertex_index(&self, label: &T) -> Option<usize> {
        self.vertices.get_index_of(label)
    }
}

impl<T, D> Graph<T, D>
where
    T: Clone + Eq + Hash,
    D: Direction,
{
    /// Inserts a plain edge, creating missing endpoints.
    ///
    /// If any edge already connects the pair (the ordered pair for
    /// directed graphs, either orientation for undirected ones) nothing is
    /// inserted and the existing id is returned, keeping the graph free of
    /// parallel edges.
    pub fn add_edge(&mut self, origin: T, destination: T) -> EdgeId {
        self.vertices.insert(origin.clone());
        self.vertices.insert(destination.clone());
        if let Some(existing) = self.edge_between(&origin, &destination) {
            return existing.id;
        }
        self.push_records(origin, destination, EdgeKind::Plain)
    }

    /// Inserts a weighted edge, creating missing endpoints and replacing
    /// any edge already connecting the pair (the mirror pair goes with it
    /// in undirected graphs), so at most one edge exists per pair.
    ///
    /// Non-finite weights are refused.
    pub fn add_weighted_edge(
        &mut self,
        origin: T,
        destination: T,
        weight: f64,
    ) -> Result<EdgeId, WeightError> {
        if !weight.is_finite() {
            return Err(WeightError::NotFinite(weight));
        }
        self.vertices.insert(origin.clone());
        self.vertices.insert(destination.clone());
        if let Some(existing) = self.edge_between(&origin, &destination).map(Edge::id) {
            self.remove_edge(existing);
        }
        Ok(self.push_records(origin, destination, EdgeKind::Weighted(weight)))
    }

    fn push_records(&mut self, origin: T, destination: T, kind: EdgeKind) -> EdgeId {
        let id = self.fresh_edge_id();
        if D::IS_DIRECTED {
            self.edges.push(Edge {
                id,
                origin,
                destination,
                kind,
                twin: None,
            });
        } else {
            let twin = self.fresh_edge_id();
            self.edges.push(Edge {
                id,
                origin: origin.clone(),
                destination: destination.clone(),
                kind,
                twin: Some(twin),
            });
            self.edges.push(Edge {
                id: twin,
                origin: destination,
                destination: origin,
                kind,
                twin: Some(id),
            });
        }
        id
    }
}

impl<T: Eq + Hash> Graph<T, Directed> {
    /// Number of edges leaving `v`.
    pub fn out_degree(&self, v: &T) -> usize {
        self.edges.iter().filter(|e| e.origin == *v).count()
    }

    /// Number of edges arriving at `v`.
    pub fn in_degree(&self, v: &T) -> usize {
        self.edges.iter().filter(|e| e.destination == *v).count()
    }

    /// Records arriving at `v` in insertion order.
    pub fn in_edges<'a>(&'a self, v: &'a T) -> impl Iterator<Item = &'a Edge<T>> {
        self.edges.iter().filter(move |e| e.destination == *v)
    }

    /// In-neighbor labels of `v`, in edge-insertion order.
    pub fn predecessors<'a>(&'a self, v: &'a T) -> impl Iterator<Item = &'a T> {
        self.in_edges(v).map(|e| &e.origin)
    }
}

impl<T, D> fmt::Display for Graph<T, D>
where
    T: fmt::Display + Eq + Hash,
    D: Direction,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph of order {}, size {}", self.order(), self.size())?;
        for e in self.edges() {
            writeln!(f, "  {e}")?;
        }
        Ok(())
    }
}
