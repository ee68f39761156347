//! Request and response types for recommendation operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crusoe_core::{Host, ScoredHost};

use crate::risk::SimilarityBreakdown;

/// How the attacked host is identified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostLookup {
    Ip(String),
    Domain(String),
}

impl std::fmt::Display for HostLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostLookup::Ip(ip) => write!(f, "ip {ip}"),
            HostLookup::Domain(domain) => write!(f, "domain {domain}"),
        }
    }
}

/// Request to rank the hosts around an attacked host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub attacked: HostLookup,
    /// Maximum graph distance to search. Defaults to the configured value.
    pub max_distance: Option<u32>,
}

/// Ranked hosts around an attacked host, riskiest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub id: Uuid,
    pub attacked_host: Host,
    pub max_distance: u32,
    pub hosts: Vec<ScoredHost>,
    pub computed_at: DateTime<Utc>,
    pub computation_ms: u64,
}

/// Pairwise comparison of two hosts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub first: Host,
    pub second: Host,
    #[serde(flatten)]
    pub breakdown: SimilarityBreakdown,
    /// Shortest graph distance, if within the search bound.
    pub distance: Option<u32>,
}

/// A self-contained scoring job, for running without a graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringInput {
    pub attacked_host: Host,
    pub candidates: Vec<ScoredHost>,
    #[serde(default)]
    pub total_cve_count: Option<u64>,
    #[serde(default)]
    pub total_event_count: Option<u64>,
}

/// Output of an offline scoring job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringOutput {
    pub attacked_host: Host,
    pub hosts: Vec<ScoredHost>,
}
