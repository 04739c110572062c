use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Processing tiers in escalation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Fast,
    LayoutAware,
    GenerativeAssisted,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Fast, Tier::LayoutAware, Tier::GenerativeAssisted];

    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Fast => Some(Tier::LayoutAware),
            Tier::LayoutAware => Some(Tier::GenerativeAssisted),
            Tier::GenerativeAssisted => None,
        }
    }

    pub fn previous(self) -> Option<Tier> {
        match self {
            Tier::Fast => None,
            Tier::LayoutAware => Some(Tier::Fast),
            Tier::GenerativeAssisted => Some(Tier::LayoutAware),
        }
    }

    pub fn is_final(self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Fast => "fast",
            Tier::LayoutAware => "layout_aware",
            Tier::GenerativeAssisted => "generative_assisted",
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fast" | "tier1" => Ok(Tier::Fast),
            "layout_aware" | "tier2" => Ok(Tier::LayoutAware),
            "generative_assisted" | "generative" | "tier3" => Ok(Tier::GenerativeAssisted),
            _ => Err(format!("Invalid tier: {}", s)),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
