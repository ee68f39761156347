//! crusoe-core: Shared host model, configuration, and error handling for the
//! CRUSOE recommender.
//!
//! This crate provides the foundational types used across all CRUSOE components:
//! - Host records with software components and network services
//! - Scored hosts annotated with graph distance and path types
//! - Warning messages explaining high partial similarities
//! - Configuration management
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use error::CrusoeError;
pub use types::{
    Host, NetworkService, PathType, PathTypes, ScoredHost, SoftwareComponent, WarningMessage,
};
