//! Error types for the crusoe-recommend crate.

use thiserror::Error;

use crate::comparators::ComparatorKind;

#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Graph error: {0}")]
    Graph(#[from] crusoe_graph::GraphError),

    #[error("Configuration error: {0}")]
    Config(#[from] crusoe_core::CrusoeError),

    #[error("Comparator {comparator} is enabled but no population total was provided")]
    MissingTotal { comparator: ComparatorKind },

    #[error("Invalid candidate {ip}: {reason}")]
    InvalidCandidate { ip: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
