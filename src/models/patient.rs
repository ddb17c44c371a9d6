//! Patient model.
//!
//! A patient needs either a doctor (non-surgical) or a surgery slot
//! (surgical). Treatment history feeds continuity-of-care scoring.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{ComplexityLevel, ExperienceLevel, MedicalProcedure, Urgency};

/// A patient awaiting assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    /// Unique patient identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Priority.
    pub urgency: Urgency,
    /// Specialization the patient should be treated by.
    pub required_specialization: String,
    /// Case complexity.
    pub complexity: ComplexityLevel,
    /// Condition tag (e.g. "Diabetes"). Empty = unknown.
    pub condition: String,
    /// Admission date; earlier admissions are operated first.
    pub admission_date: NaiveDate,
    /// Whether the patient needs surgery.
    pub needs_surgery: bool,
    /// Procedure ID, for surgical patients.
    pub required_procedure: Option<String>,
    /// Scheduled surgery start, if any.
    pub surgery_date: Option<NaiveDateTime>,
    /// Surgeon booked for the surgery.
    #[serde(default)]
    pub surgeon_id: Option<String>,
    /// Operating room booked for the surgery.
    #[serde(default)]
    pub room_id: Option<String>,
    /// Doctors who treated this patient before, oldest first.
    pub previous_doctors: Vec<String>,
}

impl Patient {
    /// Creates a non-surgical, low-urgency patient.
    pub fn new(id: impl Into<String>, required_specialization: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            urgency: Urgency::Low,
            required_specialization: required_specialization.into(),
            complexity: ComplexityLevel::Low,
            condition: String::new(),
            admission_date: NaiveDate::default(),
            needs_surgery: false,
            required_procedure: None,
            surgery_date: None,
            surgeon_id: None,
            room_id: None,
            previous_doctors: Vec::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the urgency.
    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    /// Sets the complexity.
    pub fn with_complexity(mut self, complexity: ComplexityLevel) -> Self {
        self.complexity = complexity;
        self
    }

    /// Sets the condition tag.
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    /// Sets the admission date.
    pub fn with_admission_date(mut self, date: NaiveDate) -> Self {
        self.admission_date = date;
        self
    }

    /// Marks the patient as needing the given procedure.
    pub fn with_surgery(mut self, procedure_id: impl Into<String>) -> Self {
        self.needs_surgery = true;
        self.required_procedure = Some(procedure_id.into());
        self
    }

    /// Sets an already scheduled surgery start.
    pub fn with_surgery_date(mut self, start: NaiveDateTime) -> Self {
        self.surgery_date = Some(start);
        self
    }

    /// Records a booked surgery: start time, surgeon and room.
    pub fn stamp_surgery(
        &mut self,
        start: NaiveDateTime,
        surgeon_id: impl Into<String>,
        room_id: impl Into<String>,
    ) {
        self.surgery_date = Some(start);
        self.surgeon_id = Some(surgeon_id.into());
        self.room_id = Some(room_id.into());
    }

    /// Appends a previously treating doctor (most recent last).
    pub fn with_previous_doctor(mut self, doctor_id: impl Into<String>) -> Self {
        self.previous_doctors.push(doctor_id.into());
        self
    }

    /// Most recent previous doctor.
    pub fn last_doctor(&self) -> Option<&str> {
        self.previous_doctors.last().map(|s| s.as_str())
    }

    /// Minimum experience a treating doctor must have.
    ///
    /// The procedure's minimum when one is given, otherwise derived from
    /// urgency.
    pub fn required_experience(&self, procedure: Option<&MedicalProcedure>) -> ExperienceLevel {
        procedure
            .map(|p| p.min_experience)
            .unwrap_or_else(|| ExperienceLevel::minimum_for(self.urgency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_builder() {
        let p = Patient::new("P1", "Neurology")
            .with_urgency(Urgency::Medium)
            .with_previous_doctor("D1")
            .with_previous_doctor("D2")
            .with_surgery("PROC1");
        assert!(p.needs_surgery);
        assert_eq!(p.required_procedure.as_deref(), Some("PROC1"));
        assert_eq!(p.last_doctor(), Some("D2"));
        assert_eq!(Patient::new("P2", "X").last_doctor(), None);
    }

    #[test]
    fn test_required_experience() {
        let p = Patient::new("P1", "Surgery").with_urgency(Urgency::High);
        assert_eq!(p.required_experience(None), ExperienceLevel::Regular);

        let proc = MedicalProcedure::new("PR", "Surgery", 60)
            .with_min_experience(ExperienceLevel::Senior);
        assert_eq!(p.required_experience(Some(&proc)), ExperienceLevel::Senior);
    }
}
