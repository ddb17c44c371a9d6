//! Schedule (solution) model.
//!
//! A schedule holds doctor/patient assignments as two mutually consistent
//! maps, plus the surgeries placed per day and room. It is the only
//! mutable state in a run; entities stay untouched.
//!
//! # Invariant
//! `patient_to_doctor[p] == d` iff `p ∈ doctor_to_patients[d]`. A patient
//! is never listed under two doctors. `assign`/`unassign` are the only
//! mutators of the two maps and keep this invariant.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fitness value meaning "not computed yet / stale".
pub const STALE_FITNESS: f64 = f64::NEG_INFINITY;

fn stale_fitness() -> f64 {
    STALE_FITNESS
}

/// A doctor/patient assignment plus surgery placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    doctor_to_patients: BTreeMap<String, BTreeSet<String>>,
    patient_to_doctor: BTreeMap<String, String>,
    /// date → room → patients, in booking order.
    surgeries: BTreeMap<NaiveDate, BTreeMap<String, Vec<String>>>,
    #[serde(skip, default = "stale_fitness")]
    fitness: f64,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            doctor_to_patients: BTreeMap::new(),
            patient_to_doctor: BTreeMap::new(),
            surgeries: BTreeMap::new(),
            fitness: STALE_FITNESS,
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a patient to a doctor, replacing any previous assignment.
    ///
    /// Performs no capacity or suitability checks.
    pub fn assign(&mut self, patient_id: &str, doctor_id: &str) {
        self.unassign(patient_id);
        self.doctor_to_patients
            .entry(doctor_id.to_string())
            .or_default()
            .insert(patient_id.to_string());
        self.patient_to_doctor
            .insert(patient_id.to_string(), doctor_id.to_string());
    }

    /// Removes a patient's assignment. Returns the former doctor.
    pub fn unassign(&mut self, patient_id: &str) -> Option<String> {
        let doctor_id = self.patient_to_doctor.remove(patient_id)?;
        if let Some(patients) = self.doctor_to_patients.get_mut(&doctor_id) {
            patients.remove(patient_id);
            if patients.is_empty() {
                self.doctor_to_patients.remove(&doctor_id);
            }
        }
        Some(doctor_id)
    }

    /// Doctor assigned to a patient.
    pub fn doctor_of(&self, patient_id: &str) -> Option<&str> {
        self.patient_to_doctor.get(patient_id).map(|s| s.as_str())
    }

    /// Whether the patient has a doctor.
    #[inline]
    pub fn is_assigned(&self, patient_id: &str) -> bool {
        self.patient_to_doctor.contains_key(patient_id)
    }

    /// Patients assigned to a doctor, in id order.
    pub fn patients_of(&self, doctor_id: &str) -> impl Iterator<Item = &str> {
        self.doctor_to_patients
            .get(doctor_id)
            .into_iter()
            .flat_map(|set| set.iter().map(|s| s.as_str()))
    }

    /// Number of patients assigned to a doctor.
    pub fn workload_of(&self, doctor_id: &str) -> usize {
        self.doctor_to_patients.get(doctor_id).map_or(0, |s| s.len())
    }

    /// Current workload of every doctor with at least one patient.
    pub fn workloads_by_doctor(&self) -> HashMap<&str, usize> {
        self.doctor_to_patients
            .iter()
            .map(|(d, ps)| (d.as_str(), ps.len()))
            .collect()
    }

    /// All (patient, doctor) pairs, in patient id order.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.patient_to_doctor
            .iter()
            .map(|(p, d)| (p.as_str(), d.as_str()))
    }

    /// Number of assigned patients.
    pub fn assignment_count(&self) -> usize {
        self.patient_to_doctor.len()
    }

    /// Whether both maps describe the same assignment.
    pub fn is_consistent(&self) -> bool {
        let forward = self
            .patient_to_doctor
            .iter()
            .all(|(p, d)| self.doctor_to_patients.get(d).is_some_and(|s| s.contains(p)));
        let listed: usize = self.doctor_to_patients.values().map(|s| s.len()).sum();
        let backward = self.doctor_to_patients.iter().all(|(d, ps)| {
            !ps.is_empty()
                && ps
                    .iter()
                    .all(|p| self.patient_to_doctor.get(p).is_some_and(|x| x == d))
        });
        forward && backward && listed == self.patient_to_doctor.len()
    }

    /// Records a surgery for a patient in a room on a day.
    pub fn record_surgery(&mut self, date: NaiveDate, room_id: &str, patient_id: &str) {
        self.surgeries
            .entry(date)
            .or_default()
            .entry(room_id.to_string())
            .or_default()
            .push(patient_id.to_string());
    }

    /// Surgeries on a day: room → patients.
    pub fn surgeries_on(&self, date: NaiveDate) -> Option<&BTreeMap<String, Vec<String>>> {
        self.surgeries.get(&date)
    }

    /// All surgeries: date → room → patients.
    pub fn surgeries(&self) -> &BTreeMap<NaiveDate, BTreeMap<String, Vec<String>>> {
        &self.surgeries
    }

    /// Total number of recorded surgeries.
    pub fn surgery_count(&self) -> usize {
        self.surgeries
            .values()
            .flat_map(|rooms| rooms.values())
            .map(|ps| ps.len())
            .sum()
    }

    /// Folds another schedule's assignments and surgeries into this one.
    ///
    /// Assignments in `other` win over existing ones for the same patient.
    pub fn merge(&mut self, other: &Schedule) {
        for (patient, doctor) in other.assignments() {
            self.assign(patient, doctor);
        }
        for (date, rooms) in &other.surgeries {
            for (room, patients) in rooms {
                for patient in patients {
                    self.record_surgery(*date, room, patient);
                }
            }
        }
        self.invalidate_fitness();
    }

    /// Cached fitness ([`STALE_FITNESS`] when stale).
    #[inline]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Stores a freshly computed fitness.
    #[inline]
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Marks the cached fitness as stale.
    #[inline]
    pub fn invalidate_fitness(&mut self) {
        self.fitness = STALE_FITNESS;
    }

    /// Whether the cached fitness must be recomputed.
    #[inline]
    pub fn is_fitness_stale(&self) -> bool {
        self.fitness == STALE_FITNESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new();
        s.assign("P1", "D1");
        s.assign("P2", "D1");
        s.assign("P3", "D2");
        s
    }

    #[test]
    fn test_assign_is_idempotent() {
        let mut s = sample_schedule();
        s.assign("P1", "D1");
        assert_eq!(s.workload_of("D1"), 2);
        assert_eq!(s.assignment_count(), 3);
        assert!(s.is_consistent());
    }

    #[test]
    fn test_reassign_moves_patient() {
        let mut s = sample_schedule();
        s.assign("P3", "D1");
        assert_eq!(s.doctor_of("P3"), Some("D1"));
        assert_eq!(s.workload_of("D1"), 3);
        // D2 pruned once empty
        assert_eq!(s.workload_of("D2"), 0);
        assert!(!s.workloads_by_doctor().contains_key("D2"));
        assert!(s.is_consistent());
    }

    #[test]
    fn test_unassign() {
        let mut s = sample_schedule();
        assert_eq!(s.unassign("P3"), Some("D2".to_string()));
        assert_eq!(s.unassign("P3"), None);
        assert!(!s.is_assigned("P3"));
        assert_eq!(s.workloads_by_doctor().len(), 1);
        assert!(s.is_consistent());
    }

    #[test]
    fn test_patients_of() {
        let s = sample_schedule();
        let d1: Vec<_> = s.patients_of("D1").collect();
        assert_eq!(d1, vec!["P1", "P2"]);
        assert_eq!(s.patients_of("D9").count(), 0);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sample_schedule();
        let mut copy = original.clone();
        assert_eq!(copy, original);

        copy.assign("P1", "D2");
        copy.unassign("P2");
        assert_eq!(original.doctor_of("P1"), Some("D1"));
        assert_eq!(original.workload_of("D1"), 2);
        assert_ne!(copy, original);
    }

    #[test]
    fn test_surgeries() {
        let mut s = Schedule::new();
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        s.record_surgery(day, "OR1", "P7");
        s.record_surgery(day, "OR1", "P8");
        s.record_surgery(day, "OR2", "P9");
        assert_eq!(s.surgery_count(), 3);
        assert_eq!(s.surgeries_on(day).unwrap()["OR1"], vec!["P7", "P8"]);
        assert!(s.surgeries_on(day.succ_opt().unwrap()).is_none());
    }

    #[test]
    fn test_merge() {
        let mut a = sample_schedule();
        let mut b = Schedule::new();
        b.assign("P4", "D3");
        b.record_surgery(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "OR1", "P5");
        a.set_fitness(10.0);
        a.merge(&b);
        assert_eq!(a.assignment_count(), 4);
        assert_eq!(a.surgery_count(), 1);
        assert!(a.is_fitness_stale());
        assert!(a.is_consistent());
    }

    #[test]
    fn test_fitness_cache() {
        let mut s = Schedule::new();
        assert!(s.is_fitness_stale());
        s.set_fitness(42.0);
        assert!(!s.is_fitness_stale());
        s.invalidate_fitness();
        assert_eq!(s.fitness(), STALE_FITNESS);
    }

    #[test]
    fn test_serde_roundtrip_keeps_content() {
        let mut s = sample_schedule();
        s.record_surgery(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), "OR1", "P9");
        s.set_fitness(3.5);
        let json = serde_json::to_string(&s).unwrap();
        let back: Schedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.assignment_count(), 3);
        assert_eq!(back.surgery_count(), 1);
        // Cached fitness is not persisted
        assert!(back.is_fitness_stale());
    }
}
