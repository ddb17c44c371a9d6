//! Ordinal levels: urgency, complexity, and experience.
//!
//! All three are totally ordered (`Low < Medium < High`,
//! `Junior < Regular < Senior`) and carry a 1-based ordinal used as a
//! fitness multiplier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Failure to parse a level from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} level: '{value}'")]
pub struct ParseLevelError {
    /// Which level type was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseLevelError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Patient priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Urgency {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Urgency {
    /// Ordinal value (Low = 1, High = 3).
    #[inline]
    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

impl FromStr for Urgency {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            _ => Err(ParseLevelError::new("urgency", s)),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Urgency::Low => "LOW",
            Urgency::Medium => "MEDIUM",
            Urgency::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// Clinical complexity of a patient's case.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ComplexityLevel {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
}

impl FromStr for ComplexityLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(ComplexityLevel::Low),
            "medium" => Ok(ComplexityLevel::Medium),
            "high" => Ok(ComplexityLevel::High),
            _ => Err(ParseLevelError::new("complexity", s)),
        }
    }
}

/// Doctor seniority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum ExperienceLevel {
    Junior = 1,
    #[default]
    Regular = 2,
    Senior = 3,
}

impl ExperienceLevel {
    /// Minimum experience implied by a patient's urgency when no
    /// procedure dictates one.
    pub fn minimum_for(urgency: Urgency) -> Self {
        match urgency {
            Urgency::High => ExperienceLevel::Regular,
            Urgency::Medium | Urgency::Low => ExperienceLevel::Junior,
        }
    }
}

impl FromStr for ExperienceLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junior" => Ok(ExperienceLevel::Junior),
            "regular" => Ok(ExperienceLevel::Regular),
            "senior" => Ok(ExperienceLevel::Senior),
            _ => Err(ParseLevelError::new("experience", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Urgency::High > Urgency::Medium);
        assert!(ExperienceLevel::Senior > ExperienceLevel::Junior);
        assert_eq!(Urgency::High.ordinal(), 3);
        assert_eq!(Urgency::Low.ordinal(), 1);
    }

    #[test]
    fn test_parse() {
        assert_eq!("High".parse::<Urgency>(), Ok(Urgency::High));
        assert_eq!(" medium ".parse::<ComplexityLevel>(), Ok(ComplexityLevel::Medium));
        assert_eq!("SENIOR".parse::<ExperienceLevel>(), Ok(ExperienceLevel::Senior));

        let err = "extreme".parse::<ComplexityLevel>().unwrap_err();
        assert_eq!(err.kind, "complexity");
        assert_eq!(err.to_string(), "invalid complexity level: 'extreme'");
    }

    #[test]
    fn test_minimum_experience() {
        assert_eq!(ExperienceLevel::minimum_for(Urgency::High), ExperienceLevel::Regular);
        assert_eq!(ExperienceLevel::minimum_for(Urgency::Low), ExperienceLevel::Junior);
    }
}
