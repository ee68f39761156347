//! Host and population fetching from Neo4j via the GraphClient.

use crusoe_core::config::RecommenderConfig;
use crusoe_core::Host;
use crusoe_graph::GraphClient;

use crate::error::Result;
use crate::types::HostLookup;

/// Network-wide totals the cumulative comparators are relative to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationTotals {
    pub cve_count: Option<u64>,
    pub event_count: Option<u64>,
}

/// Resolve the attacked host by IP address or domain name.
pub async fn fetch_attacked_host(client: &GraphClient, lookup: &HostLookup) -> Result<Host> {
    let host = match lookup {
        HostLookup::Ip(ip) => client.get_host_by_ip(ip).await?,
        HostLookup::Domain(domain) => client.get_host_by_domain(domain).await?,
    };
    Ok(host)
}

/// Fetch only the totals an enabled comparator needs.
pub async fn fetch_population_totals(
    client: &GraphClient,
    config: &RecommenderConfig,
) -> Result<PopulationTotals> {
    let cve_count = if config.cve_cumulative.apply {
        Some(client.get_total_cve_count().await?)
    } else {
        None
    };
    let event_count = if config.event_cumulative.apply {
        Some(client.get_total_event_count().await?)
    } else {
        None
    };

    tracing::debug!(?cve_count, ?event_count, "Population totals fetched");
    Ok(PopulationTotals {
        cve_count,
        event_count,
    })
}
