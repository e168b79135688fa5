//! # Siskin
//!
//! Siskin is a Rust library for label-addressed graph analysis. Graphs
//! store vertices of any hashable type together with plain or weighted
//! edge records and run the classic algorithm families on them:
//! traversal, shortest paths, minimum spanning structures, and Eulerian
//! circuits.
//!
//! Directed and undirected graphs share one representation. An undirected
//! edge is a pair of mirrored records, so every algorithm reads adjacency
//! the same way regardless of edge discipline, and each family reports
//! its result as a value that can be queried or rendered as text.

pub mod eulerian;
pub mod graph;
pub mod shortest_path;
pub mod spanning;
pub mod traversal;
pub mod union_find;
