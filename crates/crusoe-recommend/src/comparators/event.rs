//! Cumulative security incident comparator.

use crusoe_core::config::CumulativeComparatorConfig;
use crusoe_core::Host;

use super::{
    Comparator, ComparatorKind, CumulativeSimilarityComparator, PartialSimilarity, ReferenceHost,
};

/// Compares how many security events were recorded against each host,
/// relative to all recorded events.
pub struct EventComparator {
    cumulative: CumulativeSimilarityComparator,
    total_event_count: u64,
}

impl EventComparator {
    pub fn new(config: &CumulativeComparatorConfig, total_event_count: u64) -> Self {
        Self {
            cumulative: CumulativeSimilarityComparator::new(config),
            total_event_count,
        }
    }
}

impl Comparator for EventComparator {
    fn kind(&self) -> ComparatorKind {
        ComparatorKind::EventCumulative
    }

    fn calc_partial_similarity(&self, reference: &ReferenceHost<'_>, host: &Host) -> PartialSimilarity {
        let (similarity, critical) = self.cumulative.calculate(
            reference.host().event_count,
            host.event_count,
            self.total_event_count,
        );
        PartialSimilarity::new(similarity)
            .warn_if(critical, "High cumulative security incident count")
    }
}
