//! Doctor model.
//!
//! Doctors are the resources the optimizer assigns patients to. Each has a
//! specialization, an experience level, a workload capacity, and optional
//! preference rules. Surgical capability is attached as data
//! ([`SurgeonCapability`]) rather than a separate doctor type.
//!
//! Doctors are immutable facts during a run: current workload is always
//! derived from a [`Schedule`](super::Schedule).

use serde::{Deserialize, Serialize};

use super::{ComplexityLevel, ExperienceLevel, ParseLevelError, Patient, Urgency, WeeklyWindow};

/// A doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    /// Unique doctor identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Specialization tag (e.g. "Cardiology").
    pub specialization: String,
    /// Seniority.
    pub experience: ExperienceLevel,
    /// Maximum number of simultaneously assigned patients.
    pub max_workload: usize,
    /// Preference rules, in declaration order.
    pub preferences: Vec<DoctorPreference>,
    /// Surgical capability, if any.
    pub surgeon: Option<SurgeonCapability>,
}

/// Surgery-related data for doctors who operate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurgeonCapability {
    /// Weekly availability for surgery. Empty = always available.
    pub availability: Vec<WeeklyWindow>,
    /// Whether the surgeon currently accepts surgeries.
    pub available_for_surgery: bool,
}

/// Which patient attribute a preference rule looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferenceType {
    Complexity,
    Urgency,
    Condition,
}

/// Whether a rule attracts or repels matching patients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferenceDirection {
    Prefers,
    Avoids,
}

/// A single preference rule: "prefers HIGH complexity", "avoids diabetes".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorPreference {
    /// Attribute inspected.
    pub preference_type: PreferenceType,
    /// Attract or repel.
    pub direction: PreferenceDirection,
    /// Target value; parsed as a level for `Complexity`/`Urgency`.
    pub value: String,
}

/// Score used when no rule applies or a rule cannot be evaluated.
pub const NEUTRAL_PREFERENCE: f64 = 0.5;

impl DoctorPreference {
    /// Creates a new preference rule.
    pub fn new(
        preference_type: PreferenceType,
        direction: PreferenceDirection,
        value: impl Into<String>,
    ) -> Self {
        Self {
            preference_type,
            direction,
            value: value.into(),
        }
    }

    /// Shorthand for a `Prefers` rule.
    pub fn prefers(preference_type: PreferenceType, value: impl Into<String>) -> Self {
        Self::new(preference_type, PreferenceDirection::Prefers, value)
    }

    /// Shorthand for an `Avoids` rule.
    pub fn avoids(preference_type: PreferenceType, value: impl Into<String>) -> Self {
        Self::new(preference_type, PreferenceDirection::Avoids, value)
    }

    /// Whether this rule says anything about the patient.
    ///
    /// Condition rules only apply to patients with a condition tag.
    pub fn applies_to(&self, patient: &Patient) -> bool {
        match self.preference_type {
            PreferenceType::Complexity | PreferenceType::Urgency => true,
            PreferenceType::Condition => !patient.condition.trim().is_empty(),
        }
    }

    /// Whether the patient matches the rule's target value.
    pub fn matches(&self, patient: &Patient) -> Result<bool, ParseLevelError> {
        Ok(match self.preference_type {
            PreferenceType::Complexity => {
                self.value.parse::<ComplexityLevel>()? == patient.complexity
            }
            PreferenceType::Urgency => self.value.parse::<Urgency>()? == patient.urgency,
            PreferenceType::Condition => self
                .value
                .trim()
                .eq_ignore_ascii_case(patient.condition.trim()),
        })
    }

    /// Rule score in [0, 1]: 1 = fully satisfied, 0 = violated.
    ///
    /// A rule whose target cannot be parsed scores neutrally.
    pub fn score(&self, patient: &Patient) -> f64 {
        match self.matches(patient) {
            Ok(matched) => match (self.direction, matched) {
                (PreferenceDirection::Prefers, true) | (PreferenceDirection::Avoids, false) => 1.0,
                (PreferenceDirection::Prefers, false) | (PreferenceDirection::Avoids, true) => 0.0,
            },
            Err(err) => {
                tracing::debug!(%err, patient = %patient.id, "preference rule scored neutrally");
                NEUTRAL_PREFERENCE
            }
        }
    }
}

impl Doctor {
    /// Creates a doctor with the given specialization.
    ///
    /// Defaults: `Regular` experience, capacity 10, no preferences,
    /// no surgical capability.
    pub fn new(id: impl Into<String>, specialization: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            specialization: specialization.into(),
            experience: ExperienceLevel::Regular,
            max_workload: 10,
            preferences: Vec::new(),
            surgeon: None,
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the experience level.
    pub fn with_experience(mut self, experience: ExperienceLevel) -> Self {
        self.experience = experience;
        self
    }

    /// Sets the maximum workload.
    pub fn with_max_workload(mut self, max_workload: usize) -> Self {
        self.max_workload = max_workload;
        self
    }

    /// Adds a preference rule.
    pub fn with_preference(mut self, preference: DoctorPreference) -> Self {
        self.preferences.push(preference);
        self
    }

    /// Attaches surgical capability, available for surgery.
    pub fn with_surgery_availability(mut self, availability: Vec<WeeklyWindow>) -> Self {
        self.surgeon = Some(SurgeonCapability {
            availability,
            available_for_surgery: true,
        });
        self
    }

    /// Whether this doctor can currently be booked for surgery.
    pub fn is_available_surgeon(&self) -> bool {
        self.surgeon
            .as_ref()
            .is_some_and(|s| s.available_for_surgery)
    }

    /// Whether the doctor's specialization equals the tag.
    #[inline]
    pub fn has_specialization(&self, specialization: &str) -> bool {
        self.specialization == specialization
    }

    /// Mean score of the rules that apply to the patient.
    ///
    /// Returns [`NEUTRAL_PREFERENCE`] when no rule applies.
    pub fn preference_score(&self, patient: &Patient) -> f64 {
        let (sum, count) = self
            .preferences
            .iter()
            .filter(|p| p.applies_to(patient))
            .fold((0.0, 0usize), |(sum, count), p| (sum + p.score(patient), count + 1));
        if count == 0 {
            NEUTRAL_PREFERENCE
        } else {
            sum / count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Weekday};

    fn patient() -> Patient {
        Patient::new("P1", "Cardiology")
            .with_urgency(Urgency::High)
            .with_complexity(ComplexityLevel::Medium)
            .with_condition("Arrhythmia")
    }

    #[test]
    fn test_doctor_builder() {
        let d = Doctor::new("D1", "Cardiology")
            .with_name("Dr. Kim")
            .with_experience(ExperienceLevel::Senior)
            .with_max_workload(3);
        assert_eq!(d.max_workload, 3);
        assert_eq!(d.experience, ExperienceLevel::Senior);
        assert!(d.has_specialization("Cardiology"));
        assert!(!d.is_available_surgeon());
    }

    #[test]
    fn test_surgeon_capability() {
        let window = WeeklyWindow::new(
            Weekday::Mon,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        );
        let mut d = Doctor::new("S1", "Surgery").with_surgery_availability(vec![window]);
        assert!(d.is_available_surgeon());
        d.surgeon.as_mut().unwrap().available_for_surgery = false;
        assert!(!d.is_available_surgeon());
    }

    #[test]
    fn test_preference_rules() {
        let p = patient();
        assert_eq!(
            DoctorPreference::prefers(PreferenceType::Urgency, "HIGH").score(&p),
            1.0
        );
        assert_eq!(
            DoctorPreference::avoids(PreferenceType::Complexity, "MEDIUM").score(&p),
            0.0
        );
        assert_eq!(
            DoctorPreference::avoids(PreferenceType::Condition, "diabetes").score(&p),
            1.0
        );
        assert_eq!(
            DoctorPreference::prefers(PreferenceType::Condition, "arrhythmia").score(&p),
            1.0
        );
    }

    #[test]
    fn test_malformed_rule_is_neutral() {
        let p = patient();
        let d = Doctor::new("D1", "Cardiology")
            .with_preference(DoctorPreference::prefers(PreferenceType::Complexity, "???"))
            .with_preference(DoctorPreference::prefers(PreferenceType::Urgency, "HIGH"));
        // (0.5 + 1.0) / 2
        assert!((d.preference_score(&p) - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_preference_score_without_relevant_rules() {
        let p = Patient::new("P2", "Cardiology");
        let d = Doctor::new("D1", "Cardiology")
            .with_preference(DoctorPreference::prefers(PreferenceType::Condition, "Asthma"));
        assert_eq!(d.preference_score(&p), NEUTRAL_PREFERENCE);
        assert_eq!(Doctor::new("D2", "X").preference_score(&p), NEUTRAL_PREFERENCE);
    }
}
