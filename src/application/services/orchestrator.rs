use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::application::ports::{
    AttemptSummary, ConversionHints, ConverterError, DocumentParser, ParserError, TierConverter,
};
use crate::domain::{
    ComplexityScore, ConversionResult, DocumentKind, DocumentPattern, DocumentSource,
    EnhancedDocument, IssueKind, PipelineState, PipelineWarning, RawDocument, StateTrail, Tier,
};

use super::complexity_analyzer::ComplexityAnalyzer;
use super::fingerprint_cache::{CacheLookup, FingerprintCache, Flight};
use super::pattern_detector::PatternDetector;
use super::reconstructor::AdaptiveReconstructor;
use super::tier_router::{CacheState, RouteTarget, RoutingDecision, RoutingInput, TierRouter};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TierDeadlines {
    pub fast_ms: u64,
    pub layout_aware_ms: u64,
    pub generative_assisted_ms: u64,
}

impl Default for TierDeadlines {
    fn default() -> Self {
        Self {
            fast_ms: 10_000,
            layout_aware_ms: 30_000,
            generative_assisted_ms: 120_000,
        }
    }
}

impl TierDeadlines {
    pub fn for_tier(&self, tier: Tier) -> Duration {
        Duration::from_millis(match tier {
            Tier::Fast => self.fast_ms,
            Tier::LayoutAware => self.layout_aware_ms,
            Tier::GenerativeAssisted => self.generative_assisted_ms,
        })
    }
}

/// A document entering the pipeline with the caller's routing context.
#[derive(Debug, Clone)]
pub struct Submission {
    pub document: RawDocument,
    pub classification: Option<DocumentKind>,
    pub prior_quality: Option<f32>,
    pub tier_ceiling: Option<Tier>,
}

impl Submission {
    pub fn new(document: RawDocument) -> Self {
        Self {
            document,
            classification: None,
            prior_quality: None,
            tier_ceiling: None,
        }
    }

    pub fn with_classification(mut self, classification: DocumentKind) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn with_prior_quality(mut self, quality: f32) -> Self {
        self.prior_quality = Some(quality);
        self
    }

    pub fn with_tier_ceiling(mut self, ceiling: Tier) -> Self {
        self.tier_ceiling = Some(ceiling);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub tier: Tier,
    pub quality_score: Option<f32>,
    pub issue: Option<IssueKind>,
}

/// Everything one pipeline run produced, for the consumer and for audit.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub result: ConversionResult,
    pub trail: StateTrail,
    pub decision: RoutingDecision,
    pub attempts: Vec<AttemptRecord>,
    pub pattern: DocumentPattern,
    pub complexity: ComplexityScore,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("unrecoverable parse failure: {0}")]
    UnrecoverableParse(#[from] ParserError),
    #[error("conversion failed at {tier}: {reason}")]
    ConversionFailed { tier: Tier, reason: String },
    #[error("no converter registered for {0} or any lower tier")]
    NoConverter(Tier),
}

/// Outcome of the convert/escalate section, before it is merged into the run.
struct ConversionRun {
    result: ConversionResult,
    states: Vec<PipelineState>,
    attempts: Vec<AttemptRecord>,
    escalated: bool,
}

enum Attempt {
    Produced(ConversionResult),
    Failed {
        tier: Tier,
        issue: IssueKind,
        reason: String,
    },
}

pub struct Orchestrator {
    detector: PatternDetector,
    analyzer: ComplexityAnalyzer,
    reconstructor: AdaptiveReconstructor,
    cache: Option<Arc<FingerprintCache>>,
    router: Arc<TierRouter>,
    converters: HashMap<Tier, Arc<dyn TierConverter>>,
    deadlines: TierDeadlines,
}

impl Orchestrator {
    pub fn new(
        detector: PatternDetector,
        analyzer: ComplexityAnalyzer,
        router: Arc<TierRouter>,
        converters: Vec<Arc<dyn TierConverter>>,
        deadlines: TierDeadlines,
    ) -> Self {
        Self {
            detector,
            analyzer,
            reconstructor: AdaptiveReconstructor::new(),
            cache: None,
            router,
            converters: converters.into_iter().map(|c| (c.tier(), c)).collect(),
            deadlines,
        }
    }

    pub fn with_cache(mut self, cache: Arc<FingerprintCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn router(&self) -> &TierRouter {
        &self.router
    }

    pub fn cache(&self) -> Option<&FingerprintCache> {
        self.cache.as_deref()
    }

    pub async fn process_bytes(
        &self,
        parser: &dyn DocumentParser,
        data: &[u8],
        source: &DocumentSource,
    ) -> Result<PipelineRun, PipelineError> {
        let document = parser.parse(data, source).await.map_err(|e| {
            tracing::error!(error = %e, filename = %source.filename, "Parsing failed");
            PipelineError::UnrecoverableParse(e)
        })?;

        let mut submission = Submission::new(document);
        submission.classification = source.kind();
        self.process(submission).await
    }

    #[tracing::instrument(
        name = "pipeline",
        skip(self, submission),
        fields(
            document_id = %submission.document.id(),
            filename = %submission.document.filename(),
            pages = submission.document.page_count()
        )
    )]
    pub async fn process(&self, submission: Submission) -> Result<PipelineRun, PipelineError> {
        let mut trail = StateTrail::new();
        let mut warnings = Vec::new();

        let report = self.detector.detect(&submission.document).await;
        if report.pattern.is_degraded() {
            warnings.push(PipelineWarning::new(
                IssueKind::RecoverableUnavailable,
                "embedding provider unavailable; pattern uses marker density only",
            ));
        }
        trail.advance(PipelineState::PatternDetected);

        let reconstruction = self
            .reconstructor
            .reconstruct(&submission.document, &report.pattern);
        let complexity = self.analyzer.analyze(
            &submission.document,
            Some(&report.pattern),
            report.sample.as_ref(),
        );
        trail.advance(PipelineState::ComplexityScored);

        let fingerprint = match (&self.cache, &report.sample) {
            (Some(cache), Some(sample)) => cache.fingerprint_sample(sample),
            _ => None,
        };
        let lookup = match (&self.cache, &fingerprint) {
            (Some(cache), Some(fingerprint)) => cache.lookup(fingerprint).await,
            (Some(_), None) => {
                if !submission.document.is_empty() {
                    warnings.push(PipelineWarning::new(
                        IssueKind::RecoverableUnavailable,
                        "document could not be fingerprinted; cache bypassed",
                    ));
                }
                CacheLookup::Miss
            }
            (None, _) => CacheLookup::Miss,
        };
        let cache_state = match &lookup {
            CacheLookup::Hit(hit) => CacheState::Hit {
                similarity: hit.similarity,
            },
            CacheLookup::Miss => CacheState::Miss,
            CacheLookup::Unavailable(reason) => {
                warnings.push(PipelineWarning::new(
                    IssueKind::RecoverableUnavailable,
                    format!("result cache unavailable: {reason}"),
                ));
                CacheState::Unavailable
            }
        };

        let decision = self.router.route(&RoutingInput {
            complexity: Some(&complexity),
            classification: submission.classification,
            cache: Some(cache_state),
            prior_quality: submission.prior_quality,
            tier_ceiling: submission.tier_ceiling,
        });
        trail.advance(PipelineState::Routed);

        let tier = match (decision.target, lookup) {
            (RouteTarget::UseCached, CacheLookup::Hit(hit)) => {
                trail.advance(PipelineState::Done);
                let mut result = hit.lease.result.as_cached();
                result.warnings.extend(warnings);
                tracing::info!(tier = %result.tier_used, "Served from cache");
                return Ok(PipelineRun {
                    result,
                    trail,
                    decision,
                    attempts: Vec::new(),
                    pattern: report.pattern,
                    complexity,
                });
            }
            (RouteTarget::Convert(tier), _) => tier,
            (RouteTarget::UseCached, _) => Tier::GenerativeAssisted,
        };

        let hints = ConversionHints {
            flow_type: Some(report.pattern.flow_type()),
            section_boundaries: report.pattern.section_boundaries().to_vec(),
            complexity: Some(complexity.clone()),
            previous_attempt: None,
            rationale: decision.rationale.clone(),
        };
        let enhanced = EnhancedDocument::new(
            submission.document,
            report.pattern.clone(),
            reconstruction,
        );
        let ceiling = submission.tier_ceiling;

        let flight = match (&self.cache, &fingerprint) {
            (Some(cache), Some(fingerprint)) => {
                cache
                    .single_flight(
                        fingerprint,
                        |run: &ConversionRun| self.cacheable(run),
                        || self.convert_with_escalation(tier, ceiling, &enhanced, &hints),
                    )
                    .await
            }
            _ => self
                .convert_with_escalation(tier, ceiling, &enhanced, &hints)
                .await
                .map(|run| Flight::Computed {
                    value: run,
                    stored: false,
                }),
        };

        let flight = match flight {
            Ok(flight) => flight,
            Err((states, error)) => {
                for state in states {
                    trail.advance(state);
                }
                trail.advance(PipelineState::Failed);
                tracing::error!(error = %error, "Pipeline failed");
                return Err(error);
            }
        };

        let (mut result, attempts) = match flight {
            Flight::Cached(hit) => {
                trail.advance(PipelineState::Done);
                (hit.lease.result.as_cached(), Vec::new())
            }
            Flight::Computed { value: run, stored } => {
                for state in run.states {
                    trail.advance(state);
                }
                if stored {
                    trail.advance(PipelineState::Cached);
                }
                trail.advance(PipelineState::Done);
                if run.escalated {
                    self.router.record_escalation();
                }
                (run.result, run.attempts)
            }
        };

        result.warnings.splice(0..0, warnings);
        tracing::info!(
            tier = %result.tier_used,
            quality = result.quality_score,
            cached = result.cached,
            "Pipeline completed"
        );

        Ok(PipelineRun {
            result,
            trail,
            decision,
            attempts,
            pattern: report.pattern,
            complexity,
        })
    }

    /// Only accepted, sufficiently good results are worth serving to near-duplicates.
    fn cacheable(&self, run: &ConversionRun) -> Option<ConversionResult> {
        self.router
            .accepts(run.result.quality_score)
            .then(|| run.result.clone())
    }

    /// Converts at `tier`, escalating at most once. Errors carry the states reached
    /// before the failure.
    async fn convert_with_escalation(
        &self,
        tier: Tier,
        ceiling: Option<Tier>,
        document: &EnhancedDocument,
        hints: &ConversionHints,
    ) -> Result<ConversionRun, (Vec<PipelineState>, PipelineError)> {
        let mut states = vec![PipelineState::Converting];
        let mut attempts = Vec::new();

        let first = self.attempt(tier, document, hints).await;
        states.push(PipelineState::QualityChecked);

        let first_result = match first {
            Ok(Attempt::Produced(result)) => {
                attempts.push(AttemptRecord {
                    tier: result.tier_used,
                    quality_score: Some(result.quality_score),
                    issue: None,
                });
                if self.router.accepts(result.quality_score) {
                    states.push(PipelineState::Accepted);
                    return Ok(ConversionRun {
                        result,
                        states,
                        attempts,
                        escalated: false,
                    });
                }
                Some(result)
            }
            Ok(Attempt::Failed {
                tier: attempted,
                issue,
                reason,
            }) => {
                attempts.push(AttemptRecord {
                    tier: attempted,
                    quality_score: None,
                    issue: Some(issue),
                });
                tracing::warn!(
                    tier = %attempted,
                    issue = issue.as_str(),
                    reason = %reason,
                    "Tier attempt failed"
                );
                None
            }
            Err(error) => return Err((states, error)),
        };

        let first_tier = attempts.last().map_or(tier, |a| a.tier);
        let first_issue = match &first_result {
            Some(result) => PipelineWarning::new(
                IssueKind::QualityBelowThreshold,
                format!(
                    "{} produced quality {:.2}",
                    result.tier_used, result.quality_score
                ),
            ),
            None => {
                let issue = attempts
                    .last()
                    .and_then(|a| a.issue)
                    .unwrap_or(IssueKind::RecoverableUnavailable);
                PipelineWarning::new(issue, format!("{tier} did not produce a result"))
            }
        };

        let next = self
            .router
            .escalation_target(first_tier, ceiling)
            .filter(|next| self.converters.contains_key(next));
        let Some(next) = next else {
            return match first_result {
                Some(mut result) => {
                    result.warnings.push(first_issue);
                    states.push(PipelineState::Accepted);
                    Ok(ConversionRun {
                        result,
                        states,
                        attempts,
                        escalated: false,
                    })
                }
                None => Err((
                    states,
                    PipelineError::ConversionFailed {
                        tier,
                        reason: first_issue.detail,
                    },
                )),
            };
        };

        tracing::info!(from = %first_tier, to = %next, "Escalating conversion");
        states.push(PipelineState::Escalated);
        states.push(PipelineState::Converting);

        let retry_hints = ConversionHints {
            previous_attempt: Some(AttemptSummary {
                tier: first_tier,
                quality_score: first_result.as_ref().map(|r| r.quality_score),
            }),
            ..hints.clone()
        };
        let second = self.attempt(next, document, &retry_hints).await;
        states.push(PipelineState::QualityChecked);

        let second_result = match second {
            Ok(Attempt::Produced(result)) => {
                attempts.push(AttemptRecord {
                    tier: result.tier_used,
                    quality_score: Some(result.quality_score),
                    issue: None,
                });
                Some(result)
            }
            Ok(Attempt::Failed {
                tier: attempted,
                issue,
                reason,
            }) => {
                attempts.push(AttemptRecord {
                    tier: attempted,
                    quality_score: None,
                    issue: Some(issue),
                });
                tracing::warn!(
                    tier = %attempted,
                    issue = issue.as_str(),
                    reason = %reason,
                    "Escalated attempt failed"
                );
                None
            }
            Err(error) => return Err((states, error)),
        };

        let best = match (first_result, second_result) {
            (Some(a), Some(b)) => Some(if b.quality_score >= a.quality_score { b } else { a }),
            (a, b) => b.or(a),
        };

        match best {
            Some(mut result) => {
                result.warnings.push(first_issue);
                if !self.router.accepts(result.quality_score) {
                    result.warnings.push(PipelineWarning::new(
                        IssueKind::QualityBelowThreshold,
                        format!(
                            "best result after escalation has quality {:.2}",
                            result.quality_score
                        ),
                    ));
                }
                states.push(PipelineState::Accepted);
                Ok(ConversionRun {
                    result,
                    states,
                    attempts,
                    escalated: true,
                })
            }
            None => Err((
                states,
                PipelineError::ConversionFailed {
                    tier: next,
                    reason: "no tier produced a result".to_string(),
                },
            )),
        }
    }

    /// One converter call under the tier deadline. `Err` only for failures that must
    /// not be retried.
    async fn attempt(
        &self,
        tier: Tier,
        document: &EnhancedDocument,
        hints: &ConversionHints,
    ) -> Result<Attempt, PipelineError> {
        let (effective_tier, converter) = self.converter_for(tier)?;
        let deadline = self.deadlines.for_tier(effective_tier);

        tracing::debug!(
            tier = %effective_tier,
            deadline_ms = deadline.as_millis() as u64,
            "Converting"
        );
        match tokio::time::timeout(deadline, converter.convert(document, hints)).await {
            Ok(Ok(output)) => {
                let mut result = ConversionResult::from_output(effective_tier, output);
                if effective_tier != tier {
                    result.warnings.push(PipelineWarning::new(
                        IssueKind::DegradedSignal,
                        format!("no {tier} converter registered; used {effective_tier}"),
                    ));
                }
                tracing::debug!(
                    tier = %effective_tier,
                    quality = result.quality_score,
                    "Quality checked"
                );
                Ok(Attempt::Produced(result))
            }
            Ok(Err(ConverterError::Unrecoverable(reason))) => {
                Err(PipelineError::ConversionFailed {
                    tier: effective_tier,
                    reason,
                })
            }
            Ok(Err(e)) => Ok(Attempt::Failed {
                tier: effective_tier,
                issue: IssueKind::RecoverableUnavailable,
                reason: e.to_string(),
            }),
            Err(_) => Ok(Attempt::Failed {
                tier: effective_tier,
                issue: IssueKind::Timeout,
                reason: format!("{effective_tier} exceeded {}ms", deadline.as_millis()),
            }),
        }
    }

    /// The converter for `tier`, or the nearest lower tier that has one.
    fn converter_for(
        &self,
        tier: Tier,
    ) -> Result<(Tier, &Arc<dyn TierConverter>), PipelineError> {
        let mut candidate = Some(tier);
        while let Some(current) = candidate {
            if let Some(converter) = self.converters.get(&current) {
                return Ok((current, converter));
            }
            candidate = current.previous();
        }
        Err(PipelineError::NoConverter(tier))
    }
}
