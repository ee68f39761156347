//! Risk calculation.
//!
//! Formula: `risk = Π(partial similarities) × Π(path coefficients) / distance`
//!
//! The partial similarities come from the enabled comparators, always in the
//! order os, antivirus, cms, cve_cumulative, event_cumulative, net_service.
//! Path coefficients apply only when path weighting is enabled; a candidate
//! reached through several kinds of links is discounted by each of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crusoe_core::config::{PathConfig, RecommenderConfig};
use crusoe_core::{Host, PathType, PathTypes, ScoredHost, WarningMessage};

use crate::comparators::{
    AntivirusComparator, CmsComparator, Comparator, ComparatorKind, CveComparator,
    EventComparator, NetServicesComparator, OsComparator, ReferenceHost,
};
use crate::error::{RecommendError, Result};

// ── Calculator ────────────────────────────────────────────────────

/// Combines comparator outputs, path weighting and distance into a risk
/// score. Holds configuration only and can be shared across threads.
pub struct RiskCalculator {
    comparators: Vec<Box<dyn Comparator>>,
    path: Option<PathConfig>,
}

impl std::fmt::Debug for RiskCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskCalculator")
            .field("comparators", &self.kinds())
            .field("path", &self.path)
            .finish()
    }
}

impl RiskCalculator {
    pub fn builder(config: &RecommenderConfig) -> RiskCalculatorBuilder<'_> {
        RiskCalculatorBuilder {
            config,
            total_cve_count: None,
            total_event_count: None,
        }
    }

    /// Enabled comparators, in pipeline order.
    pub fn kinds(&self) -> Vec<ComparatorKind> {
        self.comparators.iter().map(|c| c.kind()).collect()
    }

    /// Bind `attacked` as the reference host for a batch of candidates.
    pub fn session<'a>(&'a self, attacked: &'a Host) -> ScoringSession<'a> {
        ScoringSession {
            calculator: self,
            reference: ReferenceHost::new(attacked),
        }
    }

    /// Score every candidate against `attacked`, setting `risk` and
    /// appending warnings.
    ///
    /// The whole batch is checked first: one candidate with distance 0, or
    /// with no path types while path weighting is on, fails the call before
    /// any candidate is touched.
    pub fn calculate_risk_scores(&self, attacked: &Host, candidates: &mut [ScoredHost]) -> Result<()> {
        for candidate in candidates.iter() {
            self.check_candidate(candidate)?;
        }

        let session = self.session(attacked);
        for candidate in candidates.iter_mut() {
            session.apply(candidate);
        }

        tracing::info!(
            attacked = %attacked.ip,
            candidates = candidates.len(),
            comparators = self.comparators.len(),
            "Risk scores calculated"
        );
        Ok(())
    }

    /// Pairwise comparison without path or distance weighting.
    pub fn calculate_similarities(&self, host1: &Host, host2: &Host) -> SimilarityBreakdown {
        let reference = ReferenceHost::new(host1);
        let mut breakdown = SimilarityBreakdown {
            similarity: 1.0,
            partial_similarities: BTreeMap::new(),
            warnings: Vec::new(),
        };

        for comparator in &self.comparators {
            let partial = comparator.calc_partial_similarity(&reference, host2);
            breakdown.similarity *= partial.similarity;
            breakdown
                .partial_similarities
                .insert(comparator.kind(), partial.similarity);
            breakdown.warnings.extend(partial.warning);
        }

        breakdown
    }

    fn check_candidate(&self, candidate: &ScoredHost) -> Result<()> {
        if candidate.distance == 0 {
            return Err(RecommendError::InvalidCandidate {
                ip: candidate.host.ip.clone(),
                reason: "distance must be at least 1".into(),
            });
        }
        if self.path.is_some() && candidate.path_types.is_empty() {
            return Err(RecommendError::InvalidCandidate {
                ip: candidate.host.ip.clone(),
                reason: "no path types while path weighting is enabled".into(),
            });
        }
        Ok(())
    }

    /// Product of the coefficients of every path type in `path_types`.
    fn path_coefficient(&self, path_types: PathTypes) -> f64 {
        let Some(path) = &self.path else {
            return 1.0;
        };
        path_types
            .iter()
            .map(|path_type| match path_type {
                PathType::Subnet => path.subnet,
                PathType::Organization => path.organization_unit,
                PathType::Contact => path.contact,
            })
            .product()
    }
}

// ── Builder ───────────────────────────────────────────────────────

/// Builds a [`RiskCalculator`]. The cumulative comparators need the
/// network-wide CVE and event totals, which only the caller can supply.
pub struct RiskCalculatorBuilder<'c> {
    config: &'c RecommenderConfig,
    total_cve_count: Option<u64>,
    total_event_count: Option<u64>,
}

impl RiskCalculatorBuilder<'_> {
    pub fn total_cve_count(mut self, total: u64) -> Self {
        self.total_cve_count = Some(total);
        self
    }

    pub fn total_event_count(mut self, total: u64) -> Self {
        self.total_event_count = Some(total);
        self
    }

    pub fn build(self) -> Result<RiskCalculator> {
        let config = self.config;
        config.validate()?;

        let mut comparators: Vec<Box<dyn Comparator>> = Vec::new();
        if config.os.apply {
            comparators.push(Box::new(OsComparator::new(&config.os)));
        }
        if config.antivirus.apply {
            comparators.push(Box::new(AntivirusComparator::new(&config.antivirus)));
        }
        if config.cms.cpe.apply {
            comparators.push(Box::new(CmsComparator::new(&config.cms)));
        }
        if config.cve_cumulative.apply {
            let total = self.total_cve_count.ok_or(RecommendError::MissingTotal {
                comparator: ComparatorKind::CveCumulative,
            })?;
            comparators.push(Box::new(CveComparator::new(&config.cve_cumulative, total)));
        }
        if config.event_cumulative.apply {
            let total = self.total_event_count.ok_or(RecommendError::MissingTotal {
                comparator: ComparatorKind::EventCumulative,
            })?;
            comparators.push(Box::new(EventComparator::new(&config.event_cumulative, total)));
        }
        if config.net_service.apply {
            comparators.push(Box::new(NetServicesComparator::new(&config.net_service)));
        }

        let path = config.path.apply.then(|| config.path.clone());

        tracing::debug!(
            comparators = comparators.len(),
            path_weighting = path.is_some(),
            "Risk calculator built"
        );

        Ok(RiskCalculator { comparators, path })
    }
}

// ── Session ───────────────────────────────────────────────────────

/// A calculator bound to one attacked host. Everything derived from the
/// attacked host is computed once when the session is created.
pub struct ScoringSession<'a> {
    calculator: &'a RiskCalculator,
    reference: ReferenceHost<'a>,
}

impl<'a> ScoringSession<'a> {
    pub fn reference_host(&self) -> &'a Host {
        self.reference.host()
    }

    /// Score a single candidate.
    pub fn score(&self, candidate: &mut ScoredHost) -> Result<()> {
        self.calculator.check_candidate(candidate)?;
        self.apply(candidate);
        Ok(())
    }

    /// Product of all partial similarities, with the warnings raised on the
    /// way in pipeline order.
    pub fn similarity(&self, host: &Host) -> (f64, Vec<WarningMessage>) {
        let mut similarity = 1.0;
        let mut warnings = Vec::new();

        for comparator in &self.calculator.comparators {
            let partial = comparator.calc_partial_similarity(&self.reference, host);
            tracing::debug!(
                comparator = %comparator.kind(),
                candidate = %host.ip,
                similarity = partial.similarity,
                "Partial similarity"
            );
            similarity *= partial.similarity;
            warnings.extend(partial.warning);
        }

        (similarity, warnings)
    }

    fn apply(&self, candidate: &mut ScoredHost) {
        let (similarity, warnings) = self.similarity(&candidate.host);
        for warning in warnings {
            candidate.add_warning(warning);
        }

        let weighted = similarity * self.calculator.path_coefficient(candidate.path_types);
        candidate.risk = Some(weighted / f64::from(candidate.distance));
    }
}

// ── Results ───────────────────────────────────────────────────────

/// Outcome of a pairwise comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    /// Product of the partial similarities.
    pub similarity: f64,
    pub partial_similarities: BTreeMap<ComparatorKind, f64>,
    pub warnings: Vec<WarningMessage>,
}
