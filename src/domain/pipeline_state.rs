use std::fmt;
use std::str::FromStr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Received,
    PatternDetected,
    ComplexityScored,
    Routed,
    Converting,
    QualityChecked,
    Escalated,
    Accepted,
    Cached,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Received => "RECEIVED",
            PipelineState::PatternDetected => "PATTERN_DETECTED",
            PipelineState::ComplexityScored => "COMPLEXITY_SCORED",
            PipelineState::Routed => "ROUTED",
            PipelineState::Converting => "CONVERTING",
            PipelineState::QualityChecked => "QUALITY_CHECKED",
            PipelineState::Escalated => "ESCALATED",
            PipelineState::Accepted => "ACCEPTED",
            PipelineState::Cached => "CACHED",
            PipelineState::Done => "DONE",
            PipelineState::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        if next == Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Received, PatternDetected)
                | (PatternDetected, ComplexityScored)
                | (ComplexityScored, Routed)
                | (Routed, Converting)
                | (Routed, Done)
                | (Converting, QualityChecked)
                | (QualityChecked, Accepted)
                | (QualityChecked, Escalated)
                | (Escalated, Converting)
                | (Accepted, Cached)
                | (Accepted, Done)
                | (Cached, Done)
        )
    }
}

impl FromStr for PipelineState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEIVED" => Ok(PipelineState::Received),
            "PATTERN_DETECTED" => Ok(PipelineState::PatternDetected),
            "COMPLEXITY_SCORED" => Ok(PipelineState::ComplexityScored),
            "ROUTED" => Ok(PipelineState::Routed),
            "CONVERTING" => Ok(PipelineState::Converting),
            "QUALITY_CHECKED" => Ok(PipelineState::QualityChecked),
            "ESCALATED" => Ok(PipelineState::Escalated),
            "ACCEPTED" => Ok(PipelineState::Accepted),
            "CACHED" => Ok(PipelineState::Cached),
            "DONE" => Ok(PipelineState::Done),
            "FAILED" => Ok(PipelineState::Failed),
            _ => Err(format!("Invalid pipeline state: {}", s)),
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered record of the states one document passed through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateTrail {
    states: Vec<PipelineState>,
}

impl StateTrail {
    pub fn new() -> Self {
        Self {
            states: vec![PipelineState::Received],
        }
    }

    pub fn current(&self) -> PipelineState {
        self.states
            .last()
            .copied()
            .unwrap_or(PipelineState::Received)
    }

    /// Records `next`. Returns `false` and leaves the trail untouched when the move is not
    /// allowed from the current state.
    pub fn advance(&mut self, next: PipelineState) -> bool {
        let current = self.current();
        if !current.can_transition_to(next) {
            tracing::error!(from = %current, to = %next, "Rejected pipeline state transition");
            return false;
        }
        tracing::debug!(from = %current, to = %next, "Pipeline state transition");
        self.states.push(next);
        true
    }

    pub fn states(&self) -> &[PipelineState] {
        &self.states
    }

    pub fn escalations(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s == PipelineState::Escalated)
            .count()
    }
}

impl Default for StateTrail {
    fn default() -> Self {
        Self::new()
    }
}
