//! Weighted comparison of CPE-like `vendor:product:version` strings.
//!
//! Parts are compared left to right and each matching part adds its weight.
//! The walk stops at the first mismatch: a different vendor voids any product
//! or version match below it.

use crusoe_core::config::CpeComparatorConfig;
use crusoe_core::types::CPE_ANY;
use crusoe_core::SoftwareComponent;

use super::is_critical;

/// Shared CPE logic for the OS, antivirus and CMS comparators.
#[derive(Debug, Clone)]
pub struct CpeComparator {
    weights: [f64; 3],
    diff_value: f64,
    critical_bound: f64,
}

impl CpeComparator {
    pub fn new(config: &CpeComparatorConfig) -> Self {
        Self {
            weights: config.weights(),
            diff_value: config.diff_value,
            critical_bound: config.critical_bound,
        }
    }

    pub fn diff_value(&self) -> f64 {
        self.diff_value
    }

    /// Compare two optional components. Returns the similarity and whether
    /// it exceeds the critical bound.
    ///
    /// Both absent counts as full agreement; one absent, or no matching
    /// part at all, yields the configured diff value and is never critical.
    pub fn compare(
        &self,
        sw1: Option<&SoftwareComponent>,
        sw2: Option<&SoftwareComponent>,
    ) -> (f64, bool) {
        let (sw1, sw2) = match (sw1, sw2) {
            (None, None) => return (1.0, false),
            (Some(a), Some(b)) => (a, b),
            _ => return (self.diff_value, false),
        };

        let similarity = self.compare_cpe(&sw1.cpe_parts, &sw2.cpe_parts);
        if similarity == 0.0 {
            return (self.diff_value, false);
        }
        (similarity, is_critical(similarity, self.critical_bound))
    }

    /// Sum of weights over the matching prefix of the two part lists. Only
    /// the shorter list's length (and at most three parts) is examined.
    pub fn compare_cpe(&self, parts1: &[String], parts2: &[String]) -> f64 {
        parts1
            .iter()
            .zip(parts2)
            .zip(self.weights.iter())
            .take_while(|((p1, p2), _)| compare_cpe_parts(p1, p2))
            .map(|(_, weight)| weight)
            .sum()
    }
}

/// Parts match when equal or when either is the `*` wildcard.
pub fn compare_cpe_parts(part1: &str, part2: &str) -> bool {
    part1 == part2 || part1 == CPE_ANY || part2 == CPE_ANY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparators::fixtures::{assert_close, cpe_config};
    use crusoe_core::types::component_tag;

    fn os(cpe: &str) -> SoftwareComponent {
        SoftwareComponent::parse(component_tag::OS, cpe)
    }

    fn comparator() -> CpeComparator {
        CpeComparator::new(&cpe_config([0.125, 0.75, 0.125], 0.1, 0.875))
    }

    #[test]
    fn test_version_mismatch_keeps_vendor_and_product() {
        let (similarity, critical) =
            comparator().compare(Some(&os("microsoft:windows:10")), Some(&os("microsoft:windows:xp")));
        assert_close(similarity, 0.875);
        // 0.875 is not strictly above the bound.
        assert!(!critical);
    }

    #[test]
    fn test_vendor_mismatch_falls_back_to_diff_value() {
        let (similarity, critical) =
            comparator().compare(Some(&os("microsoft:windows:10")), Some(&os("apple:macOS:monterey")));
        assert_close(similarity, 0.1);
        assert!(!critical);
    }

    #[test]
    fn test_full_match_is_critical() {
        let (similarity, critical) =
            comparator().compare(Some(&os("microsoft:windows:10")), Some(&os("microsoft:windows:10")));
        assert_close(similarity, 1.0);
        assert!(critical);
    }

    #[test]
    fn test_absence() {
        let c = comparator();
        assert_eq!(c.compare(None, None), (1.0, false));
        assert_eq!(c.compare(Some(&os("microsoft:windows:10")), None), (0.1, false));
        assert_eq!(c.compare(None, Some(&os("microsoft:windows:10"))), (0.1, false));
    }

    #[test]
    fn test_wildcard_absorbs_any_part() {
        for part in ["", "microsoft", "10", "*", "x:y"] {
            assert!(compare_cpe_parts(part, "*"));
            assert!(compare_cpe_parts("*", part));
        }
        assert!(!compare_cpe_parts("microsoft", "apple"));
    }

    #[test]
    fn test_shorter_cpe_limits_comparison() {
        let c = comparator();
        let (similarity, _) = c.compare(Some(&os("microsoft")), Some(&os("microsoft:windows:10")));
        assert_close(similarity, 0.125);

        let (similarity, _) = c.compare(Some(&os("microsoft:windows")), Some(&os("microsoft:windows:10")));
        assert_close(similarity, 0.875);
    }

    #[test]
    fn test_empty_cpe_is_no_information() {
        let (similarity, critical) = comparator().compare(Some(&os("")), Some(&os("microsoft:windows:10")));
        assert_close(similarity, 0.1);
        assert!(!critical);
    }

    #[test]
    fn test_symmetry() {
        let c = comparator();
        let samples = [
            "microsoft:windows:10",
            "microsoft:windows:xp",
            "microsoft:*:*",
            "apple:macOS:monterey",
            "*:*:*",
            "apple",
            "",
        ];
        for a in samples {
            for b in samples {
                let ab = c.compare(Some(&os(a)), Some(&os(b))).0;
                let ba = c.compare(Some(&os(b)), Some(&os(a))).0;
                assert_close(ab, ba);
            }
        }
    }

    #[test]
    fn test_parts_after_mismatch_are_ignored() {
        let c = comparator();
        let reference = os("microsoft:windows:10");
        let base = c.compare(Some(&reference), Some(&os("microsoft:linux:10"))).0;
        for version in ["11", "xp", "*", "10"] {
            let changed = os(&format!("microsoft:linux:{version}"));
            assert_close(c.compare(Some(&reference), Some(&changed)).0, base);
        }
    }
}
