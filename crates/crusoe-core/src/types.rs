//! Core domain types for the host-similarity recommender.
//!
//! A [`Host`] is what the graph knows about one machine in the network; a
//! [`ScoredHost`] is a host found near an attacked host, annotated with the
//! graph distance and path types and later with a risk score.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CrusoeError;

// ── Software Components ───────────────────────────────────────────

/// Wildcard CPE part, matches any value.
pub const CPE_ANY: &str = "*";

/// Software running on a host, identified by a CPE-like
/// `vendor:product:version` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ComponentRecord", into = "ComponentRecord")]
pub struct SoftwareComponent {
    /// What the component represents, e.g. `os_component`.
    pub tag: String,
    /// Ordered CPE parts: vendor, product, version.
    pub cpe_parts: Vec<String>,
}

impl SoftwareComponent {
    /// Split `cpe` into at most three parts. The version part keeps any
    /// remaining colons. An empty string produces no parts.
    pub fn parse(tag: impl Into<String>, cpe: &str) -> Self {
        let cpe_parts = if cpe.is_empty() {
            Vec::new()
        } else {
            cpe.splitn(3, ':').map(str::to_string).collect()
        };
        Self {
            tag: tag.into(),
            cpe_parts,
        }
    }

    /// Part at `position`, or `None` when the CPE is shorter.
    pub fn part(&self, position: usize) -> Option<&str> {
        self.cpe_parts.get(position).map(String::as_str)
    }

    pub fn vendor(&self) -> Option<&str> {
        self.part(0)
    }

    pub fn product(&self) -> Option<&str> {
        self.part(1)
    }

    pub fn version(&self) -> Option<&str> {
        self.part(2)
    }

    /// The parts joined back into a CPE string.
    pub fn cpe(&self) -> String {
        self.cpe_parts.join(":")
    }
}

impl fmt::Display for SoftwareComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tag, self.cpe())
    }
}

/// Wire form of a [`SoftwareComponent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ComponentRecord {
    tag: String,
    cpe: String,
}

impl From<ComponentRecord> for SoftwareComponent {
    fn from(record: ComponentRecord) -> Self {
        SoftwareComponent::parse(record.tag, &record.cpe)
    }
}

impl From<SoftwareComponent> for ComponentRecord {
    fn from(component: SoftwareComponent) -> Self {
        ComponentRecord {
            cpe: component.cpe(),
            tag: component.tag,
        }
    }
}

/// Tags used for the three software dimensions a host carries.
pub mod component_tag {
    pub const OS: &str = "os_component";
    pub const ANTIVIRUS: &str = "antivirus_component";
    pub const CMS: &str = "cms_component";
}

// ── Network Services ──────────────────────────────────────────────

/// A network service exposed by a host.
///
/// Equality and ordering use only the `(protocol, port)` key; the service
/// name is descriptive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkService {
    pub port: u16,
    pub protocol: String,
    pub service: String,
}

impl NetworkService {
    pub fn new(port: u16, protocol: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            port,
            protocol: protocol.into(),
            service: service.into(),
        }
    }

    /// The ordering key. Protocols compare case-sensitively.
    pub fn key(&self) -> (&str, u16) {
        (self.protocol.as_str(), self.port)
    }

    /// TCP 80 or TCP 443, with the protocol matched the same way as in
    /// [`NetworkService::key`].
    pub fn is_http(&self) -> bool {
        self.key() == ("TCP", 80) || self.key() == ("TCP", 443)
    }
}

impl PartialEq for NetworkService {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for NetworkService {}

impl PartialOrd for NetworkService {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NetworkService {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for NetworkService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.service, self.protocol, self.port)
    }
}

// ── Warnings ──────────────────────────────────────────────────────

/// A partial similarity high enough to be reported, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarningMessage {
    pub message: String,
    pub similarity_score: f64,
}

impl WarningMessage {
    pub fn new(message: impl Into<String>, similarity_score: f64) -> Self {
        Self {
            message: message.into(),
            similarity_score,
        }
    }
}

impl fmt::Display for WarningMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.message, self.similarity_score)
    }
}

// ── Hosts ─────────────────────────────────────────────────────────

/// A host in the network as loaded from the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub ip: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
    #[serde(default)]
    pub os_component: Option<SoftwareComponent>,
    #[serde(default)]
    pub antivirus_component: Option<SoftwareComponent>,
    #[serde(default)]
    pub cms_component: Option<SoftwareComponent>,
    #[serde(default)]
    pub cve_count: u64,
    #[serde(default)]
    pub event_count: u64,
    #[serde(default)]
    pub network_services: Vec<NetworkService>,
}

impl Host {
    /// A host with no detected software, services, or history.
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            domains: Vec::new(),
            contacts: Vec::new(),
            os_component: None,
            antivirus_component: None,
            cms_component: None,
            cve_count: 0,
            event_count: 0,
            network_services: Vec::new(),
        }
    }

    pub fn with_os(mut self, cpe: &str) -> Self {
        self.os_component = Some(SoftwareComponent::parse(component_tag::OS, cpe));
        self
    }

    pub fn with_antivirus(mut self, cpe: &str) -> Self {
        self.antivirus_component = Some(SoftwareComponent::parse(component_tag::ANTIVIRUS, cpe));
        self
    }

    pub fn with_cms(mut self, cpe: &str) -> Self {
        self.cms_component = Some(SoftwareComponent::parse(component_tag::CMS, cpe));
        self
    }

    pub fn with_counts(mut self, cve_count: u64, event_count: u64) -> Self {
        self.cve_count = cve_count;
        self.event_count = event_count;
        self
    }

    pub fn with_services(mut self, services: Vec<NetworkService>) -> Self {
        self.network_services = services;
        self
    }

    pub fn with_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = domains;
        self
    }

    /// Whether the host exposes HTTP or HTTPS over TCP.
    pub fn serves_http(&self) -> bool {
        self.network_services.iter().any(NetworkService::is_http)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn component(c: &Option<SoftwareComponent>) -> String {
            c.as_ref().map(|c| c.cpe()).unwrap_or_else(|| "-".to_string())
        }

        writeln!(f, "IP: {}", self.ip)?;
        writeln!(f, "DOMAIN(S): {}", self.domains.join(", "))?;
        writeln!(f, "OS: {}", component(&self.os_component))?;
        writeln!(f, "ANTIVIRUS: {}", component(&self.antivirus_component))?;
        writeln!(f, "CMS: {}", component(&self.cms_component))?;
        writeln!(f, "CVE: {}", self.cve_count)?;
        writeln!(f, "EVENTS: {}", self.event_count)?;
        let services: Vec<String> = self.network_services.iter().map(|s| s.to_string()).collect();
        write!(f, "NET SERVICES: [{}]", services.join(", "))
    }
}

// ── Path Types ────────────────────────────────────────────────────

/// How a candidate host is connected to the attacked host in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathType {
    Subnet,
    #[serde(alias = "organization_unit")]
    Organization,
    Contact,
}

impl PathType {
    pub const ALL: [PathType; 3] = [PathType::Subnet, PathType::Organization, PathType::Contact];

    fn bit(self) -> u8 {
        match self {
            PathType::Subnet => 0b001,
            PathType::Organization => 0b010,
            PathType::Contact => 0b100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathType::Subnet => "subnet",
            PathType::Organization => "organization",
            PathType::Contact => "contact",
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathType {
    type Err = CrusoeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "subnet" => Ok(PathType::Subnet),
            "organization" | "organization_unit" => Ok(PathType::Organization),
            "contact" => Ok(PathType::Contact),
            _ => Err(CrusoeError::InvalidHost(format!("unknown path type: {s}"))),
        }
    }
}

/// A set of path types, stored as a bitset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<PathType>", into = "Vec<PathType>")]
pub struct PathTypes(u8);

impl PathTypes {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, path_type: PathType) {
        self.0 |= path_type.bit();
    }

    pub fn contains(&self, path_type: PathType) -> bool {
        self.0 & path_type.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = PathType> + '_ {
        PathType::ALL.into_iter().filter(|p| self.contains(*p))
    }
}

impl FromIterator<PathType> for PathTypes {
    fn from_iter<I: IntoIterator<Item = PathType>>(iter: I) -> Self {
        let mut set = PathTypes::empty();
        for path_type in iter {
            set.insert(path_type);
        }
        set
    }
}

impl From<Vec<PathType>> for PathTypes {
    fn from(types: Vec<PathType>) -> Self {
        types.into_iter().collect()
    }
}

impl From<PathTypes> for Vec<PathType> {
    fn from(set: PathTypes) -> Self {
        set.iter().collect()
    }
}

// ── Scored Hosts ──────────────────────────────────────────────────

/// A host found near the attacked host and compared to it.
///
/// `risk` is written once by the scoring pipeline; `warnings` only grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHost {
    #[serde(flatten)]
    pub host: Host,
    /// Hops from the attacked host.
    pub distance: u32,
    pub path_types: PathTypes,
    #[serde(default)]
    pub risk: Option<f64>,
    #[serde(default)]
    pub warnings: Vec<WarningMessage>,
}

impl ScoredHost {
    pub fn new(host: Host, distance: u32, path_types: PathTypes) -> Self {
        Self {
            host,
            distance,
            path_types,
            risk: None,
            warnings: Vec::new(),
        }
    }

    pub fn add_warning(&mut self, warning: WarningMessage) {
        self.warnings.push(warning);
    }

    /// Risk, or 0.0 if the host has not been scored.
    pub fn risk_or_zero(&self) -> f64 {
        self.risk.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn software_component_splits_cpe() {
        let sw = SoftwareComponent::parse(component_tag::OS, "microsoft:windows:10");
        assert_eq!(sw.vendor(), Some("microsoft"));
        assert_eq!(sw.product(), Some("windows"));
        assert_eq!(sw.version(), Some("10"));
        assert_eq!(sw.part(3), None);
    }

    #[test]
    fn software_component_short_and_empty() {
        let sw = SoftwareComponent::parse(component_tag::CMS, "wordpress");
        assert_eq!(sw.cpe_parts, vec!["wordpress"]);
        assert_eq!(sw.product(), None);

        let empty = SoftwareComponent::parse(component_tag::CMS, "");
        assert!(empty.cpe_parts.is_empty());
        assert_eq!(empty.vendor(), None);
    }

    #[test]
    fn software_component_version_keeps_colons() {
        let sw = SoftwareComponent::parse(component_tag::OS, "canonical:ubuntu:22.04:lts");
        assert_eq!(sw.cpe_parts.len(), 3);
        assert_eq!(sw.version(), Some("22.04:lts"));
    }

    #[test]
    fn network_services_order_by_protocol_then_port() {
        let mut services = vec![
            NetworkService::new(80, "TCP", "http"),
            NetworkService::new(53, "UDP", "dns"),
            NetworkService::new(20, "TCP", "ftp-data"),
        ];
        services.sort();
        let keys: Vec<_> = services.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec![("TCP", 20), ("TCP", 80), ("UDP", 53)]);
    }

    #[test]
    fn network_service_equality_ignores_name() {
        assert_eq!(
            NetworkService::new(443, "TCP", "https"),
            NetworkService::new(443, "TCP", "ssl/http")
        );
        assert_ne!(
            NetworkService::new(53, "TCP", "dns"),
            NetworkService::new(53, "UDP", "dns")
        );
    }

    #[test]
    fn serves_http_requires_tcp() {
        let host = Host::new("10.0.0.1").with_services(vec![NetworkService::new(80, "UDP", "x")]);
        assert!(!host.serves_http());

        let host = Host::new("10.0.0.1").with_services(vec![NetworkService::new(443, "TCP", "https")]);
        assert!(host.serves_http());
    }

    #[test]
    fn protocol_case_is_significant() {
        let lower = NetworkService::new(443, "tcp", "https");
        let upper = NetworkService::new(443, "TCP", "https");
        assert_ne!(lower, upper);
        assert!(!lower.is_http());
        assert!(upper.is_http());
    }

    #[test]
    fn path_types_bitset() {
        let mut set = PathTypes::empty();
        assert!(set.is_empty());
        set.insert(PathType::Contact);
        set.insert(PathType::Subnet);
        set.insert(PathType::Contact);
        assert_eq!(set.len(), 2);
        assert!(set.contains(PathType::Subnet));
        assert!(!set.contains(PathType::Organization));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![PathType::Subnet, PathType::Contact]);
    }

    #[test]
    fn path_type_parses_graph_names() {
        assert_eq!("Subnet".parse::<PathType>().unwrap(), PathType::Subnet);
        assert_eq!("organization".parse::<PathType>().unwrap(), PathType::Organization);
        assert!("vlan".parse::<PathType>().is_err());
    }

    #[test]
    fn scored_host_json_shape() {
        let host = Host::new("10.0.1.42")
            .with_os("microsoft:windows:10")
            .with_counts(3, 1);
        let scored = ScoredHost::new(host, 2, [PathType::Subnet].into_iter().collect());

        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["ip"], "10.0.1.42");
        assert_eq!(json["os_component"]["cpe"], "microsoft:windows:10");
        assert_eq!(json["path_types"], serde_json::json!(["subnet"]));
        assert!(json["risk"].is_null());

        let back: ScoredHost = serde_json::from_value(json).unwrap();
        assert_eq!(back, scored);
    }
}
