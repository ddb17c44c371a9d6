//! Input validation for scheduling runs.
//!
//! Checks structural integrity of doctors, patients, procedures, rooms,
//! and the scheduling period before any scheduler is constructed.
//! Detects:
//! - Empty doctor or patient lists
//! - Duplicate IDs
//! - Periods whose end is not after their start
//! - Procedure durations outside one day
//! - Broken allocator settings (working hours, slot granularity)
//!
//! Stale references (a history entry naming an unknown doctor, a patient
//! naming an unknown procedure) are NOT errors: schedulers skip them.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::models::{Doctor, MedicalProcedure, OperatingRoom, Patient, SchedulingPeriod};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// No doctors supplied.
    EmptyDoctors,
    /// No patients supplied.
    EmptyPatients,
    /// Two entities share the same ID.
    DuplicateId,
    /// Period end is not after its start.
    InvalidPeriod,
    /// Working day ends before it starts.
    InvalidWorkingHours,
    /// Slot granularity is not positive or exceeds the working day.
    InvalidSlotGranularity,
    /// Procedure duration is not positive or exceeds one day.
    InvalidDuration,
    /// A tunable is out of range.
    InvalidConfig,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the entity lists of a full run.
///
/// Checks:
/// 1. At least one doctor and one patient
/// 2. No duplicate doctor, patient, procedure, or room IDs
/// 3. Every procedure lasts between one minute and one day
/// 4. The period end lies after its start
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    doctors: &[Doctor],
    patients: &[Patient],
    procedures: &[MedicalProcedure],
    rooms: &[OperatingRoom],
    period: &SchedulingPeriod,
) -> ValidationResult {
    let mut errors = Vec::new();

    if doctors.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyDoctors,
            "Doctor list is empty",
        ));
    }
    if patients.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyPatients,
            "Patient list is empty",
        ));
    }

    check_unique("doctor", doctors.iter().map(|d| d.id.as_str()), &mut errors);
    check_unique("patient", patients.iter().map(|p| p.id.as_str()), &mut errors);
    check_unique(
        "procedure",
        procedures.iter().map(|p| p.id.as_str()),
        &mut errors,
    );
    check_unique("room", rooms.iter().map(|r| r.id.as_str()), &mut errors);

    if let Err(e) = validate_procedures(procedures) {
        errors.extend(e);
    }

    if let Err(e) = validate_period(period) {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the entities the optimizer needs.
///
/// An empty patient list is accepted: the run simply has nothing to do.
pub fn validate_assignment_input(doctors: &[Doctor], patients: &[Patient]) -> ValidationResult {
    let mut errors = Vec::new();
    if doctors.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyDoctors,
            "Doctor list is empty",
        ));
    }
    check_unique("doctor", doctors.iter().map(|d| d.id.as_str()), &mut errors);
    check_unique("patient", patients.iter().map(|p| p.id.as_str()), &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that the period end lies after its start.
pub fn validate_period(period: &SchedulingPeriod) -> Result<(), ValidationError> {
    if period.is_valid() {
        Ok(())
    } else {
        Err(ValidationError::new(
            ValidationErrorKind::InvalidPeriod,
            format!(
                "Period end {} must be after start {}",
                period.end, period.start
            ),
        ))
    }
}

/// Checks allocator working hours and slot granularity.
pub fn validate_working_day(
    day_start: NaiveTime,
    day_end: NaiveTime,
    slot_minutes: i64,
) -> ValidationResult {
    let mut errors = Vec::new();
    if day_end <= day_start {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidWorkingHours,
            format!("Working day end {day_end} must be after start {day_start}"),
        ));
    }
    let day_minutes = (day_end - day_start).num_minutes();
    if slot_minutes <= 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidSlotGranularity,
            format!("Slot granularity must be positive, got {slot_minutes} minutes"),
        ));
    } else if day_minutes > 0 && slot_minutes > day_minutes {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidSlotGranularity,
            format!("Slot of {slot_minutes} minutes exceeds the {day_minutes}-minute working day"),
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that every procedure lasts between one minute and one day.
pub fn validate_procedures(procedures: &[MedicalProcedure]) -> ValidationResult {
    let errors: Vec<ValidationError> = procedures
        .iter()
        .filter(|p| !(1..=MINUTES_PER_DAY).contains(&p.duration_minutes))
        .map(|p| {
            ValidationError::new(
                ValidationErrorKind::InvalidDuration,
                format!(
                    "Procedure {} lasts {} minutes; expected 1..={MINUTES_PER_DAY}",
                    p.id, p.duration_minutes
                ),
            )
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_unique<'a>(
    entity: &str,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {entity} ID: {id}"),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn period() -> SchedulingPeriod {
        SchedulingPeriod::single_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn test_valid_input() {
        let doctors = vec![Doctor::new("D1", "Cardiology")];
        let patients = vec![Patient::new("P1", "Cardiology")];
        assert!(validate_input(&doctors, &patients, &[], &[], &period()).is_ok());
    }

    #[test]
    fn test_empty_lists() {
        let errors = validate_input(&[], &[], &[], &[], &period()).unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&ValidationErrorKind::EmptyDoctors));
        assert!(kinds.contains(&ValidationErrorKind::EmptyPatients));
    }

    #[test]
    fn test_duplicate_ids() {
        let doctors = vec![Doctor::new("D1", "A"), Doctor::new("D1", "B")];
        let patients = vec![Patient::new("P1", "A")];
        let rooms = vec![OperatingRoom::new("OR1"), OperatingRoom::new("OR1")];
        let errors = validate_input(&doctors, &patients, &[], &rooms, &period()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::DuplicateId));
        assert_eq!(errors[0].to_string(), "Duplicate doctor ID: D1");
    }

    #[test]
    fn test_invalid_period() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let err = validate_period(&SchedulingPeriod::new(day, day)).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidPeriod);
    }

    #[test]
    fn test_assignment_input_allows_empty_patients() {
        let doctors = vec![Doctor::new("D1", "A")];
        assert!(validate_assignment_input(&doctors, &[]).is_ok());
        assert!(validate_assignment_input(&[], &[]).is_err());
    }

    #[test]
    fn test_working_day() {
        let eight = NaiveTime::from_hms_opt(8, 0, 0).unwrap();
        let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap();
        assert!(validate_working_day(eight, five, 30).is_ok());
        let errors = validate_working_day(five, eight, 0).unwrap_err();
        assert_eq!(errors.len(), 2);

        let errors = validate_working_day(eight, five, i64::MAX).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidSlotGranularity);
        assert!(validate_working_day(eight, five, 9 * 60).is_ok());
        assert!(validate_working_day(eight, five, 9 * 60 + 1).is_err());
    }

    #[test]
    fn test_procedure_durations() {
        let procedures = vec![
            MedicalProcedure::new("OK", "Surgery", 90),
            MedicalProcedure::new("ZERO", "Surgery", 0),
            MedicalProcedure::new("NEG", "Surgery", -60),
            MedicalProcedure::new("HUGE", "Surgery", i64::MAX),
        ];
        let errors = validate_procedures(&procedures).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::InvalidDuration));

        let doctors = vec![Doctor::new("D1", "Surgery")];
        let patients = vec![Patient::new("P1", "Surgery")];
        let errors =
            validate_input(&doctors, &patients, &procedures[1..2], &[], &period()).unwrap_err();
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidDuration);
    }
}
