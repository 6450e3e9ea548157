//! Persistence cycles (homological scaffold generators).

use serde::{Deserialize, Serialize};

use super::edge::GraphNode;

/// One topological generator of a frame: a persistence interval and the
/// edges the cycle traverses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceCycle {
    /// Scalar persistence of the generator, used as its weight.
    pub persistence_interval: f64,
    /// Ordered edge endpoint pairs traversed by the cycle.
    #[serde(alias = "cycles")]
    pub edges: Vec<(Endpoint, Endpoint)>,
}

impl PersistenceCycle {
    /// Create a cycle over integer region endpoints.
    pub fn new(persistence_interval: f64, edges: &[(i64, i64)]) -> Self {
        Self {
            persistence_interval,
            edges: edges
                .iter()
                .map(|&(u, v)| (Endpoint::Int(u), Endpoint::Int(v)))
                .collect(),
        }
    }
}

/// A cycle endpoint as it appears on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Endpoint {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Endpoint {
    /// Resolve into a graph vertex. Integral floats name regions.
    pub fn to_node(&self) -> GraphNode {
        match self {
            Self::Int(v) => GraphNode::Region(*v),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => GraphNode::Region(*f as i64),
            Self::Float(f) => GraphNode::Label(f.to_string()),
            Self::Text(s) => GraphNode::Label(s.clone()),
        }
    }
}
