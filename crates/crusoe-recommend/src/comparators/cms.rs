//! Content management system comparator.
//!
//! With `require_open_ports`, CMS versions are only compared when both hosts
//! expose HTTP(S) (TCP 80 or 443). A host serving HTTP and one that does not
//! are scored with the diff value; two hosts without HTTP count as similar.

use crusoe_core::config::CmsComparatorConfig;
use crusoe_core::Host;

use super::{Comparator, ComparatorKind, CpeComparator, PartialSimilarity, ReferenceHost};

pub struct CmsComparator {
    cpe: CpeComparator,
    require_open_ports: bool,
}

impl CmsComparator {
    pub fn new(config: &CmsComparatorConfig) -> Self {
        Self {
            cpe: CpeComparator::new(&config.cpe),
            require_open_ports: config.require_open_ports,
        }
    }
}

impl Comparator for CmsComparator {
    fn kind(&self) -> ComparatorKind {
        ComparatorKind::Cms
    }

    fn calc_partial_similarity(&self, reference: &ReferenceHost<'_>, host: &Host) -> PartialSimilarity {
        if self.require_open_ports {
            let candidate_http = host.serves_http();
            if candidate_http != reference.serves_http() {
                return PartialSimilarity::new(self.cpe.diff_value());
            }
            if !candidate_http {
                return PartialSimilarity::new(1.0);
            }
        }

        let (similarity, critical) = self.cpe.compare(
            reference.host().cms_component.as_ref(),
            host.cms_component.as_ref(),
        );

        let message = if self.require_open_ports {
            "Similar CMS between hosts, both hosts have open HTTP(S) ports"
        } else {
            "Similar CMS between hosts"
        };
        PartialSimilarity::new(similarity).warn_if(critical, message)
    }
}
