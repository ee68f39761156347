//! Operating system comparator.

use crusoe_core::config::CpeComparatorConfig;
use crusoe_core::Host;

use super::{Comparator, ComparatorKind, CpeComparator, PartialSimilarity, ReferenceHost};

pub struct OsComparator {
    cpe: CpeComparator,
}

impl OsComparator {
    pub fn new(config: &CpeComparatorConfig) -> Self {
        Self {
            cpe: CpeComparator::new(config),
        }
    }
}

impl Comparator for OsComparator {
    fn kind(&self) -> ComparatorKind {
        ComparatorKind::Os
    }

    fn calc_partial_similarity(&self, reference: &ReferenceHost<'_>, host: &Host) -> PartialSimilarity {
        let (similarity, critical) = self.cpe.compare(
            reference.host().os_component.as_ref(),
            host.os_component.as_ref(),
        );
        PartialSimilarity::new(similarity).warn_if(critical, "Similar OS between hosts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparators::fixtures::{assert_close, cpe_config, software_hosts};

    #[test]
    fn test_os_similarities() {
        let hosts = software_hosts();
        let comparator = OsComparator::new(&cpe_config([0.125, 0.75, 0.125], 0.1, 0.875));

        let cases: [(usize, &[(usize, f64)]); 3] = [
            (0, &[(2, 0.875), (5, 1.0), (1, 0.1), (7, 1.0)]),
            (1, &[(3, 0.125), (5, 0.1), (7, 1.0)]),
            (4, &[(3, 0.1), (5, 0.1), (6, 1.0), (7, 1.0)]),
        ];

        for (reference, expectations) in cases {
            let reference = ReferenceHost::new(&hosts[reference]);
            for &(candidate, expected) in expectations {
                let partial = comparator.calc_partial_similarity(&reference, &hosts[candidate]);
                assert_close(partial.similarity, expected);
            }
        }
    }

    #[test]
    fn test_identical_os_warns() {
        let hosts = software_hosts();
        let comparator = OsComparator::new(&cpe_config([0.125, 0.75, 0.125], 0.1, 0.875));
        let reference = ReferenceHost::new(&hosts[0]);

        let partial = comparator.calc_partial_similarity(&reference, &hosts[5]);
        let warning = partial.warning.expect("identical OS should warn");
        assert_eq!(warning.message, "Similar OS between hosts");
        assert_close(warning.similarity_score, 1.0);

        let partial = comparator.calc_partial_similarity(&reference, &hosts[2]);
        assert!(partial.warning.is_none());
    }
}
