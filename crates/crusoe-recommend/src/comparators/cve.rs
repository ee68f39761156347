//! Cumulative vulnerability comparator.

use crusoe_core::config::CumulativeComparatorConfig;
use crusoe_core::Host;

use super::{
    Comparator, ComparatorKind, CumulativeSimilarityComparator, PartialSimilarity, ReferenceHost,
};

/// Compares how many distinct CVEs the two hosts carry, relative to the
/// number of CVEs present anywhere in the network.
pub struct CveComparator {
    cumulative: CumulativeSimilarityComparator,
    total_cve_count: u64,
}

impl CveComparator {
    pub fn new(config: &CumulativeComparatorConfig, total_cve_count: u64) -> Self {
        Self {
            cumulative: CumulativeSimilarityComparator::new(config),
            total_cve_count,
        }
    }
}

impl Comparator for CveComparator {
    fn kind(&self) -> ComparatorKind {
        ComparatorKind::CveCumulative
    }

    fn calc_partial_similarity(&self, reference: &ReferenceHost<'_>, host: &Host) -> PartialSimilarity {
        let (similarity, critical) =
            self.cumulative
                .calculate(reference.host().cve_count, host.cve_count, self.total_cve_count);
        PartialSimilarity::new(similarity).warn_if(critical, "High cumulative vulnerability count")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparators::fixtures::{assert_close, cumulative_config};

    #[test]
    fn test_uses_cve_counts() {
        let comparator = CveComparator::new(&cumulative_config(1.0, 0.95), 120);
        let attacked = Host::new("10.0.0.1").with_counts(54, 3);
        let candidate = Host::new("10.0.0.2").with_counts(23, 3);
        let reference = ReferenceHost::new(&attacked);

        let partial = comparator.calc_partial_similarity(&reference, &candidate);
        assert_close(partial.similarity, 23.0 / 54.0);
        assert!(partial.warning.is_none());
    }

    #[test]
    fn test_same_count_warns() {
        let comparator = CveComparator::new(&cumulative_config(1.0, 0.95), 120);
        let attacked = Host::new("10.0.0.1").with_counts(12, 0);
        let candidate = Host::new("10.0.0.2").with_counts(12, 40);
        let reference = ReferenceHost::new(&attacked);

        let partial = comparator.calc_partial_similarity(&reference, &candidate);
        let warning = partial.warning.expect("equal CVE counts should warn");
        assert_eq!(warning.message, "High cumulative vulnerability count");
        assert_close(warning.similarity_score, 1.0);
    }

    #[test]
    fn test_host_without_cves_uses_zero_value() {
        let comparator = CveComparator::new(&cumulative_config(0.6, 0.95), 120);
        let attacked = Host::new("10.0.0.1").with_counts(0, 0);
        let reference = ReferenceHost::new(&attacked);

        let partial = comparator.calc_partial_similarity(&reference, &Host::new("10.0.0.2").with_counts(9, 0));
        assert_close(partial.similarity, 0.6);
    }
}
