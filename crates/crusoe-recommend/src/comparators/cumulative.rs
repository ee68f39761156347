//! Similarity of two counts relative to a network-wide total.
//!
//! Each host's count is turned into its share of the total, and the
//! similarity is the smaller share over the larger one. Two hosts with the
//! same number of CVEs (or incidents) are identical; a host with twice as
//! many scores one half.

use crusoe_core::config::CumulativeComparatorConfig;

use super::is_critical;

#[derive(Debug, Clone)]
pub struct CumulativeSimilarityComparator {
    zero_value: f64,
    critical_bound: f64,
}

impl CumulativeSimilarityComparator {
    pub fn new(config: &CumulativeComparatorConfig) -> Self {
        Self {
            zero_value: config.zero_value,
            critical_bound: config.critical_bound,
        }
    }

    /// Similarity of `n1` and `n2` out of `total`, and whether it exceeds
    /// the critical bound.
    ///
    /// A zero count on either side, or a zero total, yields the configured
    /// zero value, which is never critical.
    pub fn calculate(&self, n1: u64, n2: u64, total: u64) -> (f64, bool) {
        if n1 == 0 || n2 == 0 || total == 0 {
            return (self.zero_value, false);
        }

        let total = total as f64;
        let share1 = n1 as f64 / total;
        let share2 = n2 as f64 / total;
        let similarity = share1.min(share2) / share1.max(share2);

        (similarity, is_critical(similarity, self.critical_bound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparators::fixtures::{assert_close, cumulative_config};

    fn comparator() -> CumulativeSimilarityComparator {
        CumulativeSimilarityComparator::new(&cumulative_config(0.7, 0.9))
    }

    #[test]
    fn test_share_ratio() {
        let (similarity, critical) = comparator().calculate(54, 23, 120);
        assert_close(similarity, 23.0 / 54.0);
        assert!((similarity - 0.425926).abs() < 1e-6);
        assert!(!critical);
    }

    #[test]
    fn test_equal_counts_are_identical() {
        for n in [1, 7, 120, 10_000] {
            let (similarity, critical) = comparator().calculate(n, n, 10_000);
            assert_close(similarity, 1.0);
            assert!(critical);
        }
    }

    #[test]
    fn test_zero_inputs_use_zero_value() {
        let c = comparator();
        assert_eq!(c.calculate(0, 5, 100), (0.7, false));
        assert_eq!(c.calculate(5, 0, 100), (0.7, false));
        assert_eq!(c.calculate(0, 0, 100), (0.7, false));
        assert_eq!(c.calculate(5, 5, 0), (0.7, false));
    }

    #[test]
    fn test_bounded_and_symmetric() {
        let c = comparator();
        for n1 in 1..40 {
            for n2 in 1..40 {
                let (ab, _) = c.calculate(n1, n2, 100);
                let (ba, _) = c.calculate(n2, n1, 100);
                assert!(ab > 0.0 && ab <= 1.0);
                assert_close(ab, ba);
            }
        }
    }
}
