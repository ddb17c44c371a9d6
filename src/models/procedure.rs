//! Medical procedure model.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::ExperienceLevel;

/// A surgical procedure a patient may require.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalProcedure {
    /// Unique procedure identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Specialization the surgeon must have.
    pub required_specialization: String,
    /// Estimated duration (minutes).
    pub duration_minutes: i64,
    /// Minimum surgeon experience.
    pub min_experience: ExperienceLevel,
}

impl MedicalProcedure {
    /// Creates a procedure requiring a `Junior` surgeon or better.
    pub fn new(
        id: impl Into<String>,
        required_specialization: impl Into<String>,
        duration_minutes: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            required_specialization: required_specialization.into(),
            duration_minutes,
            min_experience: ExperienceLevel::Junior,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the minimum experience.
    pub fn with_min_experience(mut self, level: ExperienceLevel) -> Self {
        self.min_experience = level;
        self
    }

    /// Estimated duration, `None` if the minute count does not fit a
    /// [`Duration`].
    #[inline]
    pub fn duration(&self) -> Option<Duration> {
        Duration::try_minutes(self.duration_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_out_of_range_is_none() {
        assert_eq!(
            MedicalProcedure::new("P", "Surgery", 90).duration(),
            Some(Duration::minutes(90))
        );
        assert_eq!(MedicalProcedure::new("P", "Surgery", i64::MAX).duration(), None);
    }
}
