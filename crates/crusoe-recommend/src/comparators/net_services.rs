//! Network services comparator.
//!
//! Scores the overlap of the two hosts' service sets as a Jaccard index
//! (intersection over union), where a service is identified by its
//! `(protocol, port)` key. The intersection is counted with a two-cursor
//! merge over both lists sorted by that key, in O(n + m).

use std::cmp::Ordering;

use crusoe_core::config::NetServiceComparatorConfig;
use crusoe_core::{Host, NetworkService};

use super::{is_critical, Comparator, ComparatorKind, PartialSimilarity, ReferenceHost};

pub struct NetServicesComparator {
    diff_value: f64,
    critical_bound: f64,
}

impl NetServicesComparator {
    pub fn new(config: &NetServiceComparatorConfig) -> Self {
        Self {
            diff_value: config.diff_value,
            critical_bound: config.critical_bound,
        }
    }
}

impl Comparator for NetServicesComparator {
    fn kind(&self) -> ComparatorKind {
        ComparatorKind::NetService
    }

    fn calc_partial_similarity(&self, reference: &ReferenceHost<'_>, host: &Host) -> PartialSimilarity {
        let reference_services = reference.sorted_services();
        let services = sorted(&host.network_services);

        if reference_services.is_empty() && services.is_empty() {
            return PartialSimilarity::new(1.0);
        }

        let same_service_count = count_common(reference_services, &services);
        if same_service_count == 0 {
            return PartialSimilarity::new(self.diff_value);
        }

        let union = reference_services.len() + services.len() - same_service_count;
        let similarity = same_service_count as f64 / union as f64;

        PartialSimilarity::new(similarity).warn_if(
            is_critical(similarity, self.critical_bound),
            "High number of common net services between hosts",
        )
    }
}

/// References to `services` ordered by `(protocol, port)`, one per key.
pub fn sorted(services: &[NetworkService]) -> Vec<&NetworkService> {
    let mut sorted: Vec<&NetworkService> = services.iter().collect();
    sorted.sort_by(|a, b| a.key().cmp(&b.key()));
    sorted.dedup_by(|a, b| a.key() == b.key());
    sorted
}

/// Number of matching `(protocol, port)` keys in two sorted lists.
///
/// Keys are compared lexicographically as tuples. Comparing protocol and
/// port independently would skip matches whenever the two orderings
/// disagree.
pub fn count_common(s1: &[&NetworkService], s2: &[&NetworkService]) -> usize {
    let (mut i1, mut i2) = (0, 0);
    let mut same = 0;

    while i1 < s1.len() && i2 < s2.len() {
        match s1[i1].key().cmp(&s2[i2].key()) {
            Ordering::Equal => {
                same += 1;
                i1 += 1;
                i2 += 1;
            }
            Ordering::Less => i1 += 1,
            Ordering::Greater => i2 += 1,
        }
    }

    same
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparators::fixtures::{assert_close, net_service_config};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn comparator() -> NetServicesComparator {
        NetServicesComparator::new(&net_service_config(0.2, 0.8))
    }

    fn host(services: &[(u16, &str)]) -> Host {
        Host::new("10.0.0.1").with_services(
            services
                .iter()
                .map(|&(port, protocol)| NetworkService::new(port, protocol, ""))
                .collect(),
        )
    }

    #[test]
    fn test_jaccard_of_service_sets() {
        let attacked = host(&[(80, "TCP"), (20, "TCP"), (53, "UDP"), (25, "TCP")]);
        let candidate = host(&[(80, "TCP"), (20, "TCP"), (53, "TCP"), (194, "TCP")]);
        let reference = ReferenceHost::new(&attacked);

        let partial = comparator().calc_partial_similarity(&reference, &candidate);
        assert_close(partial.similarity, 1.0 / 3.0);
        assert!(partial.warning.is_none());
    }

    #[test]
    fn test_no_services_on_either_side() {
        let attacked = host(&[]);
        let reference = ReferenceHost::new(&attacked);
        let partial = comparator().calc_partial_similarity(&reference, &host(&[]));
        assert_close(partial.similarity, 1.0);
    }

    #[test]
    fn test_disjoint_services_use_diff_value() {
        let attacked = host(&[(22, "TCP")]);
        let reference = ReferenceHost::new(&attacked);

        let partial = comparator().calc_partial_similarity(&reference, &host(&[(22, "UDP")]));
        assert_close(partial.similarity, 0.2);

        let partial = comparator().calc_partial_similarity(&reference, &host(&[]));
        assert_close(partial.similarity, 0.2);
    }

    #[test]
    fn test_identical_services_warn() {
        let services = [(443, "TCP"), (22, "TCP")];
        let attacked = host(&services);
        let reference = ReferenceHost::new(&attacked);

        let partial = comparator().calc_partial_similarity(&reference, &host(&services));
        assert_close(partial.similarity, 1.0);
        assert_eq!(
            partial.warning.map(|w| w.message),
            Some("High number of common net services between hosts".to_string())
        );
    }

    #[test]
    fn test_repeated_service_counts_once() {
        let attacked = host(&[(443, "TCP"), (443, "TCP")]);
        let reference = ReferenceHost::new(&attacked);
        assert_eq!(reference.sorted_services().len(), 1);

        let partial = comparator().calc_partial_similarity(&reference, &host(&[(443, "TCP")]));
        assert_close(partial.similarity, 1.0);

        let candidate = host(&[(443, "TCP"), (22, "TCP"), (22, "TCP")]);
        let partial = comparator().calc_partial_similarity(&reference, &candidate);
        assert_close(partial.similarity, 0.5);
    }

    #[test]
    fn test_disagreeing_orders_still_match() {
        // (TCP, 8080) < (UDP, 53) even though 8080 > 53.
        let a = [NetworkService::new(8080, "TCP", ""), NetworkService::new(53, "UDP", "")];
        let b = [NetworkService::new(53, "UDP", ""), NetworkService::new(8080, "TCP", "")];
        assert_eq!(count_common(&sorted(&a), &sorted(&b)), 2);
    }

    fn random_services(rng: &mut StdRng) -> Vec<NetworkService> {
        let protocols = ["TCP", "UDP", "SCTP"];
        let len = rng.gen_range(0..12);
        let mut seen = HashSet::new();
        let mut services = Vec::new();
        for _ in 0..len {
            let protocol = protocols[rng.gen_range(0..protocols.len())];
            let port = rng.gen_range(1..40u16);
            if seen.insert((protocol, port)) {
                services.push(NetworkService::new(port, protocol, ""));
            }
        }
        services
    }

    #[test]
    fn test_merge_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let c = comparator();

        for _ in 0..500 {
            let attacked = Host::new("10.0.0.1").with_services(random_services(&mut rng));
            let candidate = Host::new("10.0.0.2").with_services(random_services(&mut rng));

            let brute_common = attacked
                .network_services
                .iter()
                .filter(|s1| candidate.network_services.iter().any(|s2| s1.key() == s2.key()))
                .count();
            assert_eq!(
                count_common(&sorted(&attacked.network_services), &sorted(&candidate.network_services)),
                brute_common
            );

            let reference = ReferenceHost::new(&attacked);
            let similarity = c.calc_partial_similarity(&reference, &candidate).similarity;
            let (n, m) = (attacked.network_services.len(), candidate.network_services.len());
            let expected = match (n + m, brute_common) {
                (0, _) => 1.0,
                (_, 0) => 0.2,
                (_, k) => k as f64 / (n + m - k) as f64,
            };
            assert_close(similarity, expected);
        }
    }
}
