//! Antivirus comparator.

use crusoe_core::config::CpeComparatorConfig;
use crusoe_core::Host;

use super::{Comparator, ComparatorKind, CpeComparator, PartialSimilarity, ReferenceHost};

pub struct AntivirusComparator {
    cpe: CpeComparator,
}

impl AntivirusComparator {
    pub fn new(config: &CpeComparatorConfig) -> Self {
        Self {
            cpe: CpeComparator::new(config),
        }
    }
}

impl Comparator for AntivirusComparator {
    fn kind(&self) -> ComparatorKind {
        ComparatorKind::Antivirus
    }

    fn calc_partial_similarity(&self, reference: &ReferenceHost<'_>, host: &Host) -> PartialSimilarity {
        let (similarity, critical) = self.cpe.compare(
            reference.host().antivirus_component.as_ref(),
            host.antivirus_component.as_ref(),
        );
        PartialSimilarity::new(similarity).warn_if(critical, "Similar antivirus between hosts")
    }
}
