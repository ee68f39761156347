//! Read queries that load host records for the recommender.
//!
//! Every host query shares one profile block: it resolves the `Host` node
//! behind an IP address, then collects the latest OS, the antivirus that
//! ran during that OS runtime, the latest CMS, event and CVE counts,
//! contacts, domains, and the network services active during the OS
//! runtime.

use neo4rs::{query, Row};
use serde::Deserialize;

use crusoe_core::types::component_tag;
use crusoe_core::{Host, NetworkService, PathType, PathTypes, ScoredHost, SoftwareComponent};

use crate::client::{GraphClient, GraphError};

/// Cypher block expecting `ip_string` in scope. Leaves `host`, `ip`, the
/// software versions, counts, contacts, domains and services in scope.
const HOST_PROFILE: &str = "
    CALL {
        WITH ip_string
        MATCH (host:Host)<-[:IS_A]-(:Node)-[:HAS_ASSIGNED]->(ip:IP)
        WHERE ip.address = ip_string
        RETURN host, ip
        LIMIT 1
    }
    CALL {
        WITH host
        OPTIONAL MATCH (sw:SoftwareVersion)-[r:ON]->(host)
        WHERE sw.tag = 'os_component'
        RETURN sw.version AS os, r.start AS start, r.end AS end
        ORDER BY r.end DESC
        LIMIT 1
    }
    CALL {
        WITH host, start, end
        OPTIONAL MATCH (sw:SoftwareVersion)-[r:ON]->(host)
        WHERE sw.tag = 'services_component'
          AND (start IS NULL OR NOT (end < r.start OR start > r.end))
        RETURN sw.version AS antivirus
        LIMIT 1
    }
    CALL {
        WITH host
        OPTIONAL MATCH (sw:SoftwareVersion)-[r:ON]->(host)
        WHERE sw.tag = 'cms_client'
        RETURN sw.version AS cms
        ORDER BY id(r) DESC
        LIMIT 1
    }
    CALL {
        WITH ip
        OPTIONAL MATCH (ip)-[:SOURCE_OF]->(event:SecurityEvent)
        RETURN count(event) AS event_count
    }
    CALL {
        WITH host
        OPTIONAL MATCH (sw:SoftwareVersion)-[:ON]->(host)
        WITH DISTINCT sw
        OPTIONAL MATCH (cve:Vulnerability)-[:IN]->(sw)
        RETURN count(DISTINCT cve) AS cve_count
    }
    CALL {
        WITH ip
        OPTIONAL MATCH (ip)-[:PART_OF]-(:Subnet)-[:HAS]->(c:Contact)
        RETURN collect(c.name) AS contacts
    }
    CALL {
        WITH ip
        OPTIONAL MATCH (ip)-[:RESOLVES_TO]->(domain:DomainName)
        RETURN reduce(s = [], names IN collect(domain.domain_name) | s + names) AS domains
    }
    WITH *, [(service:NetworkService)-[r:ON]->(host)
             WHERE start IS NULL OR NOT (r.end < start OR r.start > end)
             | {port: service.port, protocol: service.protocol, service: service.service}] AS services
";

const HOST_COLUMNS: &str =
    "ip.address AS ip, domains, contacts, os, antivirus, cms, event_count, cve_count, services";

/// A network service as returned by the profile block.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceRow {
    pub port: i64,
    pub protocol: String,
    pub service: Option<String>,
}

impl ServiceRow {
    /// Convert to a [`NetworkService`], dropping out-of-range ports.
    pub fn into_service(self) -> Option<NetworkService> {
        match u16::try_from(self.port) {
            Ok(port) => Some(NetworkService::new(
                port,
                self.protocol,
                self.service.unwrap_or_default(),
            )),
            Err(_) => {
                tracing::warn!(port = self.port, "Dropping network service with invalid port");
                None
            }
        }
    }
}

/// The host columns of a profile row, before conversion.
#[derive(Debug, Clone, Default)]
pub struct HostRow {
    pub ip: String,
    pub domains: Vec<String>,
    pub contacts: Vec<String>,
    pub os: Option<String>,
    pub antivirus: Option<String>,
    pub cms: Option<String>,
    pub cve_count: i64,
    pub event_count: i64,
    pub services: Vec<ServiceRow>,
}

fn field(name: &str, e: impl std::fmt::Display) -> GraphError {
    GraphError::Deserialization(format!("Failed to read column {name}: {e}"))
}

impl HostRow {
    fn from_row(row: &Row) -> Result<Self, GraphError> {
        Ok(Self {
            ip: row.get("ip").map_err(|e| field("ip", e))?,
            domains: row.get("domains").unwrap_or_default(),
            contacts: row.get("contacts").unwrap_or_default(),
            os: row.get("os").map_err(|e| field("os", e))?,
            antivirus: row.get("antivirus").map_err(|e| field("antivirus", e))?,
            cms: row.get("cms").map_err(|e| field("cms", e))?,
            cve_count: row.get("cve_count").unwrap_or(0),
            event_count: row.get("event_count").unwrap_or(0),
            services: row.get("services").map_err(|e| field("services", e))?,
        })
    }

    pub fn into_host(self) -> Host {
        let component = |tag: &str, cpe: Option<String>| {
            cpe.map(|cpe| SoftwareComponent::parse(tag, &cpe))
        };

        Host {
            ip: self.ip,
            domains: self.domains,
            contacts: self.contacts,
            os_component: component(component_tag::OS, self.os),
            antivirus_component: component(component_tag::ANTIVIRUS, self.antivirus),
            cms_component: component(component_tag::CMS, self.cms),
            cve_count: self.cve_count.max(0) as u64,
            event_count: self.event_count.max(0) as u64,
            network_services: self
                .services
                .into_iter()
                .filter_map(ServiceRow::into_service)
                .collect(),
        }
    }
}

/// Attach traversal annotations to a host. Returns `None` for rows that
/// break the candidate contract (distance below 1, unknown or missing path
/// types).
pub fn candidate_from_parts(host: Host, distance: i64, path_types: &[String]) -> Option<ScoredHost> {
    let distance = match u32::try_from(distance) {
        Ok(d) if d >= 1 => d,
        _ => {
            tracing::warn!(ip = %host.ip, distance, "Dropping candidate with invalid distance");
            return None;
        }
    };

    let mut types = PathTypes::empty();
    for raw in path_types {
        match raw.parse::<PathType>() {
            Ok(path_type) => types.insert(path_type),
            Err(_) => {
                tracing::warn!(ip = %host.ip, path_type = %raw, "Dropping candidate with unknown path type");
                return None;
            }
        }
    }
    if types.is_empty() {
        tracing::warn!(ip = %host.ip, "Dropping candidate without path types");
        return None;
    }

    Some(ScoredHost::new(host, distance, types))
}

impl GraphClient {
    // ── Host Lookups ─────────────────────────────────────────────

    /// Load the host with the given IP address.
    pub async fn get_host_by_ip(&self, ip: &str) -> Result<Host, GraphError> {
        let cypher = format!("WITH $ip AS ip_string {HOST_PROFILE} RETURN {HOST_COLUMNS}");
        let q = query(&cypher).param("ip", ip.to_string());

        match self.query_one(q).await? {
            Some(row) => Ok(HostRow::from_row(&row)?.into_host()),
            None => Err(GraphError::NotFound {
                lookup: "ip".to_string(),
                value: ip.to_string(),
            }),
        }
    }

    /// Load the host that the given domain name resolves to.
    pub async fn get_host_by_domain(&self, domain: &str) -> Result<Host, GraphError> {
        let q = query(
            "MATCH (ip:IP)-[:RESOLVES_TO]->(domain:DomainName)
             WHERE $domain IN domain.domain_name
             RETURN ip.address AS address
             LIMIT 1",
        )
        .param("domain", domain.to_string());

        let row = self.query_one(q).await?.ok_or_else(|| GraphError::NotFound {
            lookup: "domain".to_string(),
            value: domain.to_string(),
        })?;
        let address: String = row
            .get("address")
            .map_err(|e| GraphError::Deserialization(format!("Failed to read address: {e}")))?;

        tracing::debug!(%domain, %address, "Domain resolved");
        self.get_host_by_ip(&address).await
    }

    // ── Traversal ────────────────────────────────────────────────

    /// Hosts within `max_distance` hops of `ip`, as found by the
    /// `traverse.findCloseHosts` procedure.
    pub async fn find_close_hosts(
        &self,
        ip: &str,
        max_distance: u32,
    ) -> Result<Vec<ScoredHost>, GraphError> {
        let cypher = format!(
            "CALL traverse.findCloseHosts($ip, $max_distance)
             YIELD ip AS ip_string, distance, path_types
             {HOST_PROFILE}
             RETURN {HOST_COLUMNS}, distance, path_types"
        );
        let q = query(&cypher)
            .param("ip", ip.to_string())
            .param("max_distance", max_distance as i64);

        let rows = self.query_rows(q).await?;
        let mut candidates = Vec::with_capacity(rows.len());
        for row in rows {
            let host = HostRow::from_row(&row)?.into_host();
            let distance: i64 = row.get("distance").unwrap_or(0);
            let path_types: Vec<String> = row.get("path_types").unwrap_or_default();
            if let Some(candidate) = candidate_from_parts(host, distance, &path_types) {
                candidates.push(candidate);
            }
        }

        tracing::info!(%ip, max_distance, found = candidates.len(), "Close hosts loaded");
        Ok(candidates)
    }

    /// Length of the shortest path between two IP addresses, if one exists
    /// within `max_distance` hops.
    pub async fn get_distance(
        &self,
        ip1: &str,
        ip2: &str,
        max_distance: u32,
    ) -> Result<Option<u32>, GraphError> {
        let q = query(&format!(
            "MATCH path = shortestPath((ip1:IP)-[*..{max_distance}]-(ip2:IP))
             WHERE ip1.address = $ip1 AND ip2.address = $ip2
             RETURN length(path) AS length"
        ))
        .param("ip1", ip1.to_string())
        .param("ip2", ip2.to_string());

        Ok(self
            .query_one(q)
            .await?
            .and_then(|row| row.get::<i64>("length").ok())
            .and_then(|length| u32::try_from(length).ok()))
    }

    // ── Population Totals ────────────────────────────────────────

    /// Number of distinct vulnerabilities in the network.
    pub async fn get_total_cve_count(&self) -> Result<u64, GraphError> {
        let q = query("MATCH (cve:Vulnerability) RETURN count(DISTINCT cve) AS cnt");
        self.count(q).await
    }

    /// Number of recorded security events in the network.
    pub async fn get_total_event_count(&self) -> Result<u64, GraphError> {
        let q = query("MATCH (e:SecurityEvent) RETURN count(e) AS cnt");
        self.count(q).await
    }

    async fn count(&self, q: neo4rs::Query) -> Result<u64, GraphError> {
        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0).max(0) as u64),
            None => Ok(0),
        }
    }
}
