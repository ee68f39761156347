//! Host comparators.
//!
//! Each comparator scores one dimension of similarity between a reference
//! (attacked) host and a candidate host as a partial similarity in `[0, 1]`.
//! When the similarity is suspiciously high (above the comparator's critical
//! bound) the comparator also returns a [`WarningMessage`] explaining it.
//!
//! Comparators hold only configuration. Everything derived from the
//! reference host is computed once in [`ReferenceHost::new`] and passed into
//! every call, so one comparator can serve any number of reference hosts
//! concurrently.

pub mod antivirus;
pub mod cms;
pub mod cpe;
pub mod cumulative;
pub mod cve;
pub mod event;
pub mod net_services;
pub mod os;

pub use antivirus::AntivirusComparator;
pub use cms::CmsComparator;
pub use cpe::CpeComparator;
pub use cumulative::CumulativeSimilarityComparator;
pub use cve::CveComparator;
pub use event::EventComparator;
pub use net_services::NetServicesComparator;
pub use os::OsComparator;

use std::fmt;

use serde::{Deserialize, Serialize};

use crusoe_core::{Host, NetworkService, WarningMessage};

/// The comparator dimensions, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparatorKind {
    Os,
    Antivirus,
    Cms,
    CveCumulative,
    EventCumulative,
    NetService,
}

impl ComparatorKind {
    /// Configuration section name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparatorKind::Os => "os",
            ComparatorKind::Antivirus => "antivirus",
            ComparatorKind::Cms => "cms",
            ComparatorKind::CveCumulative => "cve_cumulative",
            ComparatorKind::EventCumulative => "event_cumulative",
            ComparatorKind::NetService => "net_service",
        }
    }
}

impl fmt::Display for ComparatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One comparator's output for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSimilarity {
    pub similarity: f64,
    pub warning: Option<WarningMessage>,
}

impl PartialSimilarity {
    pub fn new(similarity: f64) -> Self {
        Self {
            similarity,
            warning: None,
        }
    }

    /// Attach `message` as a warning when `critical` holds.
    pub fn warn_if(mut self, critical: bool, message: impl Into<String>) -> Self {
        if critical {
            self.warning = Some(WarningMessage::new(message, self.similarity));
        }
        self
    }
}

/// The attacked host together with what comparators precompute from it.
#[derive(Debug, Clone)]
pub struct ReferenceHost<'a> {
    host: &'a Host,
    sorted_services: Vec<&'a NetworkService>,
    serves_http: bool,
}

impl<'a> ReferenceHost<'a> {
    pub fn new(host: &'a Host) -> Self {
        Self {
            host,
            sorted_services: net_services::sorted(&host.network_services),
            serves_http: host.serves_http(),
        }
    }

    pub fn host(&self) -> &'a Host {
        self.host
    }

    /// Network services ordered by `(protocol, port)`.
    pub fn sorted_services(&self) -> &[&'a NetworkService] {
        &self.sorted_services
    }

    /// Whether the reference host exposes TCP 80 or 443.
    pub fn serves_http(&self) -> bool {
        self.serves_http
    }
}

/// A strategy scoring one dimension of host similarity.
pub trait Comparator: Send + Sync {
    fn kind(&self) -> ComparatorKind;

    /// Partial similarity of `host` to the reference host, in `[0, 1]`.
    fn calc_partial_similarity(&self, reference: &ReferenceHost<'_>, host: &Host)
        -> PartialSimilarity;
}

/// `similarity > critical_bound`.
pub(crate) fn is_critical(similarity: f64, critical_bound: f64) -> bool {
    similarity > critical_bound
}
