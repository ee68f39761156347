//! crusoe-graph: Neo4j client for the recommender's host data.
//!
//! Loads attacked hosts, nearby candidate hosts found by the
//! `traverse.findCloseHosts` procedure, and population totals. The graph is
//! read-only from the recommender's point of view.

pub mod client;
pub mod queries;

pub use client::{GraphClient, GraphConfig, GraphError};
