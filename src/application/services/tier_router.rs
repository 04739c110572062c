use std::sync::atomic::{AtomicU64, Ordering};

use serde::Deserialize;

use crate::domain::{ComplexityScore, DocumentKind, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoutingThresholds {
    /// Below this overall score a document may take the fast tier (T1).
    pub layout_aware_at: f32,
    /// At or above this overall score a document goes to the generative tier (T2).
    pub generative_at: f32,
    pub min_confidence: f32,
    pub acceptance_quality: f32,
    pub visual_high: f32,
    pub semantic_low: f32,
}

impl Default for RoutingThresholds {
    fn default() -> Self {
        Self {
            layout_aware_at: 0.3,
            generative_at: 0.7,
            min_confidence: 0.4,
            acceptance_quality: 0.7,
            visual_high: 0.6,
            semantic_low: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheState {
    Hit { similarity: f32 },
    Miss,
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingInput<'a> {
    pub complexity: Option<&'a ComplexityScore>,
    pub classification: Option<DocumentKind>,
    pub cache: Option<CacheState>,
    pub prior_quality: Option<f32>,
    /// Most expensive tier the caller is willing to pay for.
    pub tier_ceiling: Option<Tier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    UseCached,
    Convert(Tier),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    pub cost_usd: f64,
    pub seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    pub target: RouteTarget,
    pub rationale: String,
    pub degraded: bool,
    pub estimate: Option<CostEstimate>,
}

impl RoutingDecision {
    pub fn tier(&self) -> Option<Tier> {
        match self.target {
            RouteTarget::Convert(tier) => Some(tier),
            RouteTarget::UseCached => None,
        }
    }
}

/// Threshold table, evaluated top to bottom; the first matching row wins.
pub fn decide(thresholds: &RoutingThresholds, input: &RoutingInput<'_>) -> RoutingDecision {
    if let Some(CacheState::Hit { similarity }) = input.cache {
        return RoutingDecision {
            target: RouteTarget::UseCached,
            rationale: format!("cache hit at similarity {similarity:.3}"),
            degraded: false,
            estimate: None,
        };
    }

    let (tier, rationale, degraded) = match input.complexity {
        None => (
            Tier::GenerativeAssisted,
            "complexity unavailable, routing to the most capable tier".to_string(),
            true,
        ),
        Some(score) => {
            let (tier, rationale) = decide_scored(thresholds, score, input);
            (tier, rationale, false)
        }
    };

    match input.tier_ceiling {
        Some(ceiling) if tier > ceiling => RoutingDecision {
            target: RouteTarget::Convert(ceiling),
            rationale: format!("{rationale}; capped at {ceiling} by tier ceiling"),
            degraded,
            estimate: None,
        },
        _ => RoutingDecision {
            target: RouteTarget::Convert(tier),
            rationale,
            degraded,
            estimate: None,
        },
    }
}

fn decide_scored(
    thresholds: &RoutingThresholds,
    score: &ComplexityScore,
    input: &RoutingInput<'_>,
) -> (Tier, String) {
    if let Some(prior) = input
        .prior_quality
        .filter(|q| *q < thresholds.acceptance_quality)
    {
        return (
            Tier::GenerativeAssisted,
            format!("prior quality {prior:.2} below acceptance"),
        );
    }
    if score.confidence() < thresholds.min_confidence {
        return (
            Tier::GenerativeAssisted,
            format!("complexity confidence {:.2} too low", score.confidence()),
        );
    }
    if score.overall() >= thresholds.generative_at {
        return (
            Tier::GenerativeAssisted,
            format!("overall complexity {:.2} is high", score.overall()),
        );
    }
    if score.visual() >= thresholds.visual_high && score.semantic() < thresholds.semantic_low {
        return (
            Tier::LayoutAware,
            format!(
                "visual complexity {:.2} with low semantic complexity {:.2}",
                score.visual(),
                score.semantic()
            ),
        );
    }
    if score.overall() >= thresholds.layout_aware_at {
        return (
            Tier::LayoutAware,
            format!("overall complexity {:.2} is moderate", score.overall()),
        );
    }
    match input.classification {
        Some(kind) if !kind.is_well_structured() => (
            Tier::LayoutAware,
            format!("low complexity but {} layout is unreliable", kind.as_str()),
        ),
        _ => (
            Tier::Fast,
            format!("overall complexity {:.2} is low", score.overall()),
        ),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TierCostModel {
    pub base_cost_usd: [f64; 3],
    pub base_seconds: [f64; 3],
}

impl Default for TierCostModel {
    fn default() -> Self {
        Self {
            base_cost_usd: [0.001, 0.005, 0.020],
            base_seconds: [2.0, 5.0, 15.0],
        }
    }
}

impl TierCostModel {
    /// Base figures scale with page count (1 + pages / 10) and complexity (1 + overall).
    pub fn estimate(&self, tier: Tier, pages: usize, overall: f32) -> CostEstimate {
        let index = tier as usize;
        let factor = (1.0 + pages as f64 / 10.0) * (1.0 + f64::from(overall));
        CostEstimate {
            cost_usd: self.base_cost_usd[index] * factor,
            seconds: self.base_seconds[index] * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterStats {
    pub fast: u64,
    pub layout_aware: u64,
    pub generative_assisted: u64,
    pub cache_skips: u64,
    pub degraded: u64,
    pub escalations: u64,
}

impl RouterStats {
    pub fn total(&self) -> u64 {
        self.fast + self.layout_aware + self.generative_assisted + self.cache_skips
    }
}

#[derive(Default)]
struct Counters {
    per_tier: [AtomicU64; 3],
    cache_skips: AtomicU64,
    degraded: AtomicU64,
    escalations: AtomicU64,
}

pub struct TierRouter {
    thresholds: RoutingThresholds,
    costs: TierCostModel,
    counters: Counters,
}

impl TierRouter {
    pub fn new(thresholds: RoutingThresholds, costs: TierCostModel) -> Self {
        Self {
            thresholds,
            costs,
            counters: Counters::default(),
        }
    }

    pub fn thresholds(&self) -> &RoutingThresholds {
        &self.thresholds
    }

    pub fn route(&self, input: &RoutingInput<'_>) -> RoutingDecision {
        let mut decision = decide(&self.thresholds, input);

        match decision.target {
            RouteTarget::UseCached => {
                self.counters.cache_skips.fetch_add(1, Ordering::Relaxed);
            }
            RouteTarget::Convert(tier) => {
                self.counters.per_tier[tier as usize].fetch_add(1, Ordering::Relaxed);
                let (pages, overall) = input
                    .complexity
                    .map_or((0, 1.0), |s| (s.metrics().page_count, s.overall()));
                decision.estimate = Some(self.costs.estimate(tier, pages, overall));
            }
        }

        if decision.degraded {
            self.counters.degraded.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(rationale = %decision.rationale, "Degraded routing decision");
        } else {
            tracing::debug!(
                target_tier = ?decision.tier(),
                rationale = %decision.rationale,
                "Routing decision"
            );
        }
        decision
    }

    pub fn accepts(&self, quality_score: f32) -> bool {
        quality_score >= self.thresholds.acceptance_quality
    }

    /// One tier up, bounded by the ceiling. `None` when no higher tier may be tried.
    pub fn escalation_target(&self, current: Tier, ceiling: Option<Tier>) -> Option<Tier> {
        current
            .next()
            .filter(|next| ceiling.is_none_or(|cap| *next <= cap))
    }

    pub fn record_escalation(&self) {
        self.counters.escalations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> RouterStats {
        let tier = |t: Tier| self.counters.per_tier[t as usize].load(Ordering::Relaxed);
        RouterStats {
            fast: tier(Tier::Fast),
            layout_aware: tier(Tier::LayoutAware),
            generative_assisted: tier(Tier::GenerativeAssisted),
            cache_skips: self.counters.cache_skips.load(Ordering::Relaxed),
            degraded: self.counters.degraded.load(Ordering::Relaxed),
            escalations: self.counters.escalations.load(Ordering::Relaxed),
        }
    }
}
