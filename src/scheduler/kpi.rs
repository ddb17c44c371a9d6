//! Schedule quality metrics.
//!
//! Computes summary indicators from a completed schedule and the entities
//! it was built from.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total Assigned | Doctor assignments + scheduled surgeries |
//! | Assignment Rate | Total assigned / total patients (%) |
//! | Specialization Match | Assignments whose doctor matches the patient's need (%) |
//! | Avg Workload | Mean of workload / capacity over doctors (%) |
//! | Unassigned | Non-surgical patients without a doctor |
//!
//! All percentages are 0 when their denominator is 0.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 1.2: Performance Measures

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::models::{Doctor, Patient, Schedule};

/// Schedule performance indicators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleStatistics {
    /// Patients considered.
    pub total_patients: usize,
    /// Patients with a doctor or a surgery slot.
    pub total_assigned: usize,
    /// `total_assigned / total_patients` (0..100).
    pub assignment_rate: f64,
    /// Share of doctor assignments matching the patient's specialization (0..100).
    pub specialization_match_rate: f64,
    /// Mean doctor load (0..100).
    pub average_workload: f64,
    /// Per-doctor load (0..100).
    pub workload_by_doctor: HashMap<String, f64>,
    /// Surgeries placed.
    pub surgeries_scheduled: usize,
    /// Non-surgical patients left without a doctor.
    pub unassigned_patients: usize,
}

impl ScheduleStatistics {
    /// Computes statistics for a schedule.
    ///
    /// Only patients present in `patients` are counted; assignments to
    /// unknown doctors contribute to the totals but not to workloads.
    pub fn calculate(schedule: &Schedule, doctors: &[Doctor], patients: &[Patient]) -> Self {
        let doctor_specs: HashMap<&str, &str> = doctors
            .iter()
            .map(|d| (d.id.as_str(), d.specialization.as_str()))
            .collect();

        let operated: BTreeSet<&str> = schedule
            .surgeries()
            .values()
            .flat_map(|rooms| rooms.values())
            .flat_map(|ids| ids.iter().map(String::as_str))
            .collect();

        let mut assigned = 0usize;
        let mut matched = 0usize;
        let mut unassigned = 0usize;
        let mut surgeries = 0usize;

        for patient in patients {
            if let Some(doctor_id) = schedule.doctor_of(&patient.id) {
                assigned += 1;
                if doctor_specs.get(doctor_id) == Some(&patient.required_specialization.as_str()) {
                    matched += 1;
                }
            } else if operated.contains(patient.id.as_str()) {
                surgeries += 1;
            } else if !patient.needs_surgery {
                unassigned += 1;
            }
        }

        let workload_by_doctor: HashMap<String, f64> = doctors
            .iter()
            .map(|d| {
                let load = if d.max_workload == 0 {
                    0.0
                } else {
                    schedule.workload_of(&d.id) as f64 / d.max_workload as f64 * 100.0
                };
                (d.id.clone(), load)
            })
            .collect();

        let average_workload = if doctors.is_empty() {
            0.0
        } else {
            workload_by_doctor.values().sum::<f64>() / doctors.len() as f64
        };

        let total_assigned = assigned + surgeries;

        Self {
            total_patients: patients.len(),
            total_assigned,
            assignment_rate: percentage(total_assigned, patients.len()),
            specialization_match_rate: percentage(matched, assigned),
            average_workload,
            workload_by_doctor,
            surgeries_scheduled: surgeries,
            unassigned_patients: unassigned,
        }
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
