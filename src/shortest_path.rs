//! Single-source and all-pairs shortest paths.
//!
//! Dijkstra assumes non-negative weights and does not guard against
//! violations; Floyd-Warshall tolerates negative edges and flags negative
//! cycles instead of failing.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::hash::Hash;

use ahash::AHashMap;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::graph::{Direction, Graph};

/// Two distances closer than this count as equal when results of different
/// algorithms are compared.
pub const DISTANCE_TOLERANCE: f64 = 1e-4;

/// Heap entry ordered by reverse score, so a `BinaryHeap` behaves as a
/// min-priority structure. Scores are finite by construction (the store
/// refuses non-finite weights).
#[derive(Clone, Copy, Debug)]
pub(crate) struct MinScored<I>(pub f64, pub I);

impl<I> PartialEq for MinScored<I> {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl<I> Eq for MinScored<I> {}

impl<I> PartialOrd for MinScored<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I> Ord for MinScored<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.total_cmp(&self.0)
    }
}

fn fmt_dist(d: f64) -> String {
    if d.is_infinite() {
        "∞".to_owned()
    } else {
        format!("{d}")
    }
}

/// Tentative-distance map turned final: the result of one Dijkstra run.
#[derive(Clone, Debug)]
pub struct ShortestPaths<T> {
    source: T,
    order: Vec<T>,
    dist: AHashMap<T, f64>,
    pred: AHashMap<T, T>,
}

impl<T: Eq + Hash> ShortestPaths<T> {
    pub fn source(&self) -> &T {
        &self.source
    }

    /// Shortest distance from the source, `f64::INFINITY` when `v` is
    /// unreachable or unknown.
    pub fn distance(&self, v: &T) -> f64 {
        self.dist.get(v).copied().unwrap_or(f64::INFINITY)
    }

    pub fn predecessor(&self, v: &T) -> Option<&T> {
        self.pred.get(v)
    }

    /// Distances in vertex-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
        self.order.iter().map(|v| (v, self.distance(v)))
    }
}

impl<T: Clone + Eq + Hash> ShortestPaths<T> {
    /// The shortest path from the source to `target`, walking predecessors
    /// backward. `None` when the target is unreachable or unknown.
    pub fn path_to(&self, target: &T) -> Option<Vec<T>> {
        if !self.dist.contains_key(target) || self.distance(target).is_infinite() {
            return None;
        }
        let mut path = vec![target.clone()];
        let mut at = target;
        while let Some(p) = self.pred.get(at) {
            path.push(p.clone());
            at = p;
        }
        path.reverse();
        Some(path)
    }
}

impl<T: fmt::Display + Clone + Eq + Hash> fmt::Display for ShortestPaths<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "shortest paths from {}", self.source)?;
        for (v, d) in self.iter() {
            write!(f, "  {v}: {}", fmt_dist(d))?;
            match self.path_to(v) {
                Some(path) if path.len() > 1 => {
                    writeln!(f, " via {}", path.iter().join(" -> "))?
                }
                _ => writeln!(f)?,
            }
        }
        Ok(())
    }
}

/// All-pairs distances and next-hop pointers from one Floyd-Warshall run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceMatrix<T> {
    order: Vec<T>,
    dist: Vec<f64>,
    next: Vec<Option<usize>>,
    negative_witnesses: Vec<T>,
}

impl<T: PartialEq> DistanceMatrix<T> {
    /// Vertices in the row/column order of the matrix.
    pub fn vertices(&self) -> &[T] {
        &self.order
    }

    fn position(&self, v: &T) -> Option<usize> {
        self.order.iter().position(|x| x == v)
    }

    /// Shortest distance between two labels, `f64::INFINITY` when either
    /// is unknown or no path exists. Meaningless for vertices on a
    /// negative cycle, which the witnesses list flags.
    pub fn distance(&self, from: &T, to: &T) -> f64 {
        match (self.position(from), self.position(to)) {
            (Some(i), Some(j)) => self.dist[i * self.order.len() + j],
            _ => f64::INFINITY,
        }
    }

    /// Whether the diagonal scan found any vertex that can reach itself at
    /// negative cost.
    pub fn has_negative_cycle(&self) -> bool {
        !self.negative_witnesses.is_empty()
    }

    /// Vertices whose self-distance went negative.
    pub fn negative_cycle_witnesses(&self) -> &[T] {
        &self.negative_witnesses
    }
}

impl<T: Clone + PartialEq> DistanceMatrix<T> {
    /// The reconstructed path from `from` to `to`, following next-hop
    /// pointers. `None` when unreachable or unknown.
    pub fn path(&self, from: &T, to: &T) -> Option<Vec<T>> {
        let i = self.position(from)?;
        let j = self.position(to)?;
        let n = self.order.len();
        let mut at = i;
        let mut path = vec![self.order[i].clone()];
        while at != j {
            // a simple path visits each vertex at most once
            if path.len() > n {
                return None;
            }
            at = self.next[at * n + j]?;
            path.push(self.order[at].clone());
        }
        Some(path)
    }
}

impl<T: fmt::Display + PartialEq> fmt::Display for DistanceMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.order.len();
        writeln!(f, "all-pairs distances")?;
        for (i, v) in self.order.iter().enumerate() {
            let row = (0..n).map(|j| fmt_dist(self.dist[i * n + j])).join(" ");
            writeln!(f, "  {v}: {row}")?;
        }
        if self.has_negative_cycle() {
            let witnesses = self.negative_witnesses.iter().join(", ");
            writeln!(f, "negative cycle through: {witnesses}")?;
        }
        Ok(())
    }
}

/// Per-vertex disagreement between the two shortest-path algorithms.
#[derive(Clone, Debug)]
pub struct Mismatch<T> {
    pub vertex: T,
    pub dijkstra: f64,
    pub floyd_warshall: f64,
}

/// Verdict of running Dijkstra and Floyd-Warshall from the same source.
#[derive(Clone, Debug)]
pub struct PathComparison<T> {
    source: T,
    checked: usize,
    mismatches: Vec<Mismatch<T>>,
}

impl<T> PathComparison<T> {
    /// True when every vertex got the same distance from both algorithms,
    /// within [`DISTANCE_TOLERANCE`], counting shared unreachability as
    /// agreement.
    pub fn agree(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn mismatches(&self) -> &[Mismatch<T>] {
        &self.mismatches
    }
}

impl<T: fmt::Display> fmt::Display for PathComparison<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.agree() {
            writeln!(
                f,
                "dijkstra and floyd-warshall agree on {} vertices from {}",
                self.checked, self.source
            )
        } else {
            writeln!(f, "{} disagreement(s) from {}:", self.mismatches.len(), self.source)?;
            for m in &self.mismatches {
                writeln!(
                    f,
                    "  {}: dijkstra {} vs floyd-warshall {}",
                    m.vertex,
                    fmt_dist(m.dijkstra),
                    fmt_dist(m.floyd_warshall)
                )?;
            }
            Ok(())
        }
    }
}

impl<T, D> Graph<T, D>
where
    T: Clone + Eq + Hash,
    D: Direction,
{
    /// Single-source shortest paths over non-negative weights. Returns
    /// `None` when the source is not a vertex.
    ///
    /// Stale heap entries are skipped when popped rather than removed
    /// eagerly. Plain edges carry the ∞ sentinel and never relax anything,
    /// so only weighted edges shape the result. Negative weights are not
    /// guarded against and void the optimality claim.
    pub fn dijkstra(&self, source: &T) -> Option<ShortestPaths<T>> {
        let src = self.vertex_index(source)?;
        debug!(order = self.order(), size = self.size(), "dijkstra");

        let slots: Vec<&T> = self.vertices().collect();
        let n = slots.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut pred: Vec<Option<usize>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        dist[src] = 0.0;
        heap.push(MinScored(0.0, src));

        while let Some(MinScored(d, u)) = heap.pop() {
            if d > dist[u] {
                continue;
            }
            for e in self.edges_from(slots[u]) {
                let v = match self.vertex_index(e.destination()) {
                    Some(v) => v,
                    None => continue,
                };
                let via = d + e.weight();
                if via < dist[v] {
                    trace!(from = u, to = v, dist = via, "relax");
                    dist[v] = via;
                    pred[v] = Some(u);
                    heap.push(MinScored(via, v));
                }
            }
        }

        Some(ShortestPaths {
            source: source.clone(),
            order: slots.iter().map(|v| (*v).clone()).collect(),
            dist: slots
                .iter()
                .enumerate()
                .map(|(i, v)| ((*v).clone(), dist[i]))
                .collect(),
            pred: pred
                .iter()
                .enumerate()
                .filter_map(|(i, p)| p.map(|p| (slots[i].clone(), slots[p].clone())))
                .collect(),
        })
    }

    /// All-pairs shortest distances with next-hop path reconstruction.
    ///
    /// Negative weights are allowed; a negative diagonal entry after the
    /// triple loop flags a negative cycle in the result while the matrices
    /// are still returned.
    pub fn floyd_warshall(&self) -> DistanceMatrix<T> {
        let order: Vec<T> = self.vertices().cloned().collect();
        let n = order.len();
        debug!(order = n, size = self.size(), "floyd-warshall");

        let mut dist = vec![f64::INFINITY; n * n];
        let mut next: Vec<Option<usize>> = vec![None; n * n];
        for i in 0..n {
            dist[i * n + i] = 0.0;
        }
        for e in self.edge_records() {
            let (i, j) = match (
                self.vertex_index(e.origin()),
                self.vertex_index(e.destination()),
            ) {
                (Some(i), Some(j)) => (i, j),
                _ => continue,
            };
            let w = e.weight();
            if i != j && w.is_finite() {
                dist[i * n + j] = w;
                next[i * n + j] = Some(j);
            }
        }

        for k in 0..n {
            for i in 0..n {
                let dik = dist[i * n + k];
                if !dik.is_finite() {
                    continue;
                }
                for j in 0..n {
                    let via = dik + dist[k * n + j];
                    if via < dist[i * n + j] {
                        dist[i * n + j] = via;
                        next[i * n + j] = next[i * n + k];
                    }
                }
            }
        }

        let negative_witnesses: Vec<T> = (0..n)
            .filter(|&i| dist[i * n + i] < 0.0)
            .map(|i| order[i].clone())
            .collect();
        if !negative_witnesses.is_empty() {
            debug!(witnesses = negative_witnesses.len(), "negative cycle");
        }

        DistanceMatrix {
            order,
            dist,
            next,
            negative_witnesses,
        }
    }

    /// Runs both algorithms from `source` and records every vertex whose
    /// distances disagree beyond [`DISTANCE_TOLERANCE`] (one-sided
    /// unreachability counts as disagreement). `None` when the source is
    /// not a vertex.
    pub fn compare_shortest_paths(&self, source: &T) -> Option<PathComparison<T>> {
        let sp = self.dijkstra(source)?;
        let fw = self.floyd_warshall();
        let mut mismatches = Vec::new();
        for v in self.vertices() {
            let a = sp.distance(v);
            let b = fw.distance(source, v);
            if a.is_infinite() && b.is_infinite() {
                continue;
            }
            if (a - b).abs() > DISTANCE_TOLERANCE {
                mismatches.push(Mismatch {
                    vertex: v.clone(),
                    dijkstra: a,
                    floyd_warshall: b,
                });
            }
        }
        Some(PathComparison {
            source: source.clone(),
            checked: self.order(),
            mismatches,
        })
    }
}
