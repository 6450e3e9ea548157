//! In-memory graph operations for per-frame region graphs.

pub mod builder;
pub mod weighted_graph;

pub use builder::ScaffoldBuilder;
pub use weighted_graph::WeightedGraph;
