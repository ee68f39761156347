//! crusoe-recommend: ransomware mitigation recommendations for the CRUSOE
//! network graph.
//!
//! Given an attacked host, loads the hosts within a bounded graph distance,
//! compares each one to the attacked host along several dimensions (OS,
//! antivirus, CMS, vulnerability and incident history, exposed services) and
//! ranks them by risk: the more a host resembles the attacked one and the
//! closer it is, the more urgently it should be protected.

pub mod comparators;
pub mod error;
pub mod fetch;
pub mod output;
pub mod risk;
pub mod types;

pub use error::RecommendError;
pub use risk::{RiskCalculator, ScoringSession, SimilarityBreakdown};
pub use types::{
    ComparisonResult, HostLookup, RecommendRequest, RecommendationResult, ScoringInput,
    ScoringOutput,
};

use chrono::Utc;
use crusoe_core::config::RecommenderConfig;
use crusoe_core::ScoredHost;
use crusoe_graph::GraphClient;
use uuid::Uuid;

use crate::fetch::PopulationTotals;

/// The recommendation engine.
pub struct Recommender {
    graph_client: GraphClient,
    config: RecommenderConfig,
}

impl Recommender {
    pub fn new(graph_client: GraphClient, config: RecommenderConfig) -> Self {
        Self {
            graph_client,
            config,
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Rank the hosts around an attacked host.
    ///
    /// Orchestrates: resolve attacked host → find close hosts → fetch
    /// population totals → score → sort by risk.
    pub async fn recommend(&self, request: RecommendRequest) -> error::Result<RecommendationResult> {
        let start = std::time::Instant::now();
        let max_distance = request.max_distance.unwrap_or(self.config.max_distance);

        let attacked_host = fetch::fetch_attacked_host(&self.graph_client, &request.attacked).await?;
        let mut hosts = self
            .graph_client
            .find_close_hosts(&attacked_host.ip, max_distance)
            .await?;

        let totals = fetch::fetch_population_totals(&self.graph_client, &self.config).await?;
        let calculator = build_calculator(&self.config, totals)?;
        calculator.calculate_risk_scores(&attacked_host, &mut hosts)?;
        sort_by_risk(&mut hosts);

        let computation_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            attacked = %attacked_host.ip,
            max_distance,
            hosts = hosts.len(),
            computation_ms,
            "Recommendation computed"
        );

        Ok(RecommendationResult {
            id: Uuid::new_v4(),
            attacked_host,
            max_distance,
            hosts,
            computed_at: Utc::now(),
            computation_ms,
        })
    }

    /// Compare two hosts directly, without path or distance weighting.
    /// The graph distance between them is reported alongside.
    pub async fn compare(
        &self,
        first_ip: &str,
        second_ip: &str,
        max_distance: Option<u32>,
    ) -> error::Result<ComparisonResult> {
        let first = self.graph_client.get_host_by_ip(first_ip).await?;
        let second = self.graph_client.get_host_by_ip(second_ip).await?;

        let totals = fetch::fetch_population_totals(&self.graph_client, &self.config).await?;
        let calculator = build_calculator(&self.config, totals)?;
        let breakdown = calculator.calculate_similarities(&first, &second);

        let max_distance = max_distance.unwrap_or(self.config.max_distance);
        let distance = self
            .graph_client
            .get_distance(first_ip, second_ip, max_distance)
            .await?;

        Ok(ComparisonResult {
            first,
            second,
            breakdown,
            distance,
        })
    }
}

/// Score a self-contained input document, without a graph.
pub fn score_offline(config: &RecommenderConfig, input: ScoringInput) -> error::Result<ScoringOutput> {
    let totals = PopulationTotals {
        cve_count: input.total_cve_count,
        event_count: input.total_event_count,
    };
    let calculator = build_calculator(config, totals)?;

    let mut hosts = input.candidates;
    calculator.calculate_risk_scores(&input.attacked_host, &mut hosts)?;
    sort_by_risk(&mut hosts);

    Ok(ScoringOutput {
        attacked_host: input.attacked_host,
        hosts,
    })
}

/// Riskiest first. Hosts with equal risk keep their input order.
pub fn sort_by_risk(hosts: &mut [ScoredHost]) {
    hosts.sort_by(|a, b| b.risk_or_zero().total_cmp(&a.risk_or_zero()));
}

fn build_calculator(config: &RecommenderConfig, totals: PopulationTotals) -> error::Result<RiskCalculator> {
    let mut builder = RiskCalculator::builder(config);
    if let Some(total) = totals.cve_count {
        builder = builder.total_cve_count(total);
    }
    if let Some(total) = totals.event_count {
        builder = builder.total_event_count(total);
    }
    builder.build()
}
