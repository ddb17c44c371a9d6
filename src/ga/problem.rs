//! Doctor/patient assignment GA problem.
//!
//! Implements [`GaProblem`] for matching non-surgical patients to doctors.
//! Bridges domain models (Doctor, Patient) to the generic runner: builds
//! initial schedules, scores them, and exposes the suitability and
//! doctor-search helpers the operators rely on.
//!
//! Doctors and patients are indexed once at construction. The patient
//! list is kept sorted by id; that order is the canonical ordering used
//! by crossover.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

use super::operators::GeneticOperators;
use super::runner::{GaProblem, Individual};
use super::FitnessWeights;
use crate::error::Result;
use crate::models::{Doctor, ExperienceLevel, MedicalProcedure, Patient, Schedule};
use crate::validation::validate_assignment_input;

impl Individual for Schedule {
    fn fitness(&self) -> f64 {
        Schedule::fitness(self)
    }

    fn set_fitness(&mut self, fitness: f64) {
        Schedule::set_fitness(self, fitness);
    }

    fn invalidate_fitness(&mut self) {
        Schedule::invalidate_fitness(self);
    }
}

/// GA problem definition for doctor/patient assignment.
///
/// Only non-surgical patients take part; surgical patients are the
/// surgery allocator's concern and are dropped at construction.
pub struct AssignmentProblem {
    doctors: Vec<Doctor>,
    patients: Vec<Patient>,
    doctor_index: HashMap<String, usize>,
    patient_index: HashMap<String, usize>,
    /// Minimum experience per patient (parallel to `patients`).
    required_experience: Vec<ExperienceLevel>,
    weights: FitnessWeights,
    operators: GeneticOperators,
}

impl AssignmentProblem {
    /// Creates a problem from domain models.
    ///
    /// Fails if the doctor list is empty or IDs repeat. An empty patient
    /// list is accepted.
    pub fn new(
        doctors: &[Doctor],
        patients: &[Patient],
        procedures: &[MedicalProcedure],
    ) -> Result<Self> {
        validate_assignment_input(doctors, patients)?;

        let procedure_by_id: HashMap<&str, &MedicalProcedure> =
            procedures.iter().map(|p| (p.id.as_str(), p)).collect();

        let mut patients: Vec<Patient> = patients
            .iter()
            .filter(|p| !p.needs_surgery)
            .cloned()
            .collect();
        patients.sort_by(|a, b| a.id.cmp(&b.id));

        let doctor_index: HashMap<String, usize> = doctors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        let patient_index = patients
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();

        let mut required_experience = Vec::with_capacity(patients.len());
        for patient in &patients {
            let procedure = patient.required_procedure.as_deref().and_then(|id| {
                let found = procedure_by_id.get(id).copied();
                if found.is_none() {
                    warn!(patient = %patient.id, procedure = id, "unknown procedure reference");
                }
                found
            });
            required_experience.push(patient.required_experience(procedure));

            for doctor_id in &patient.previous_doctors {
                if !doctor_index.contains_key(doctor_id) {
                    warn!(patient = %patient.id, doctor = %doctor_id, "unknown doctor in treatment history");
                }
            }
        }

        Ok(Self {
            doctors: doctors.to_vec(),
            patients,
            doctor_index,
            patient_index,
            required_experience,
            weights: FitnessWeights::default(),
            operators: GeneticOperators::default(),
        })
    }

    /// Sets fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the genetic operator settings.
    pub fn with_operators(mut self, operators: GeneticOperators) -> Self {
        self.operators = operators;
        self
    }

    /// Doctors, in input order.
    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    /// Non-surgical patients, in canonical (id) order.
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    /// Fitness weights in use.
    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Operator settings in use.
    pub fn operators(&self) -> &GeneticOperators {
        &self.operators
    }

    /// Index of a doctor by id.
    pub fn doctor_idx(&self, doctor_id: &str) -> Option<usize> {
        self.doctor_index.get(doctor_id).copied()
    }

    /// Index of a patient by id.
    pub fn patient_idx(&self, patient_id: &str) -> Option<usize> {
        self.patient_index.get(patient_id).copied()
    }

    /// Minimum experience for a patient.
    pub fn required_experience(&self, patient: usize) -> ExperienceLevel {
        self.required_experience[patient]
    }

    // ======================== Suitability ========================

    /// Specialization matches and experience is adequate.
    pub fn is_suitable(&self, doctor: usize, patient: usize) -> bool {
        self.doctors[doctor].has_specialization(&self.patients[patient].required_specialization)
            && self.is_qualified(doctor, patient)
    }

    /// Experience is adequate (specialization waived).
    pub fn is_qualified(&self, doctor: usize, patient: usize) -> bool {
        self.doctors[doctor].experience >= self.required_experience[patient]
    }

    /// Doctor can take one more patient in this schedule.
    pub fn has_capacity(&self, schedule: &Schedule, doctor: usize) -> bool {
        let d = &self.doctors[doctor];
        schedule.workload_of(&d.id) < d.max_workload
    }

    /// Load-to-capacity ratio in this schedule (0 for zero-capacity doctors).
    pub fn load_ratio(&self, schedule: &Schedule, doctor: usize) -> f64 {
        let d = &self.doctors[doctor];
        if d.max_workload == 0 {
            0.0
        } else {
            schedule.workload_of(&d.id) as f64 / d.max_workload as f64
        }
    }

    /// Assigns if the doctor is known, qualified, and has capacity.
    pub fn try_assign(&self, schedule: &mut Schedule, patient: usize, doctor_id: &str) -> bool {
        let Some(doctor) = self.doctor_idx(doctor_id) else {
            debug!(doctor = doctor_id, "skipping unknown doctor");
            return false;
        };
        if !self.has_capacity(schedule, doctor) || !self.is_qualified(doctor, patient) {
            return false;
        }
        schedule.assign(&self.patients[patient].id, doctor_id);
        true
    }

    // ======================== Doctor search ========================

    /// Initialization search: previous doctor, then least-loaded
    /// specialist, then least-loaded qualified doctor of any specialization.
    pub fn find_doctor(&self, schedule: &Schedule, patient: usize) -> Option<usize> {
        if let Some(previous) = self.patients[patient].last_doctor() {
            match self.doctor_idx(previous) {
                Some(d) if self.has_capacity(schedule, d) && self.is_suitable(d, patient) => {
                    return Some(d);
                }
                Some(_) => {}
                None => debug!(doctor = previous, "previous doctor not found"),
            }
        }
        self.find_fallback_doctor(schedule, patient)
    }

    /// Least-loaded specialist, else least-loaded qualified doctor.
    pub fn find_fallback_doctor(&self, schedule: &Schedule, patient: usize) -> Option<usize> {
        self.least_loaded(schedule, |d| self.is_suitable(d, patient))
            .or_else(|| self.least_loaded(schedule, |d| self.is_qualified(d, patient)))
    }

    fn least_loaded(&self, schedule: &Schedule, accept: impl Fn(usize) -> bool) -> Option<usize> {
        (0..self.doctors.len())
            .filter(|&d| accept(d) && self.has_capacity(schedule, d))
            .min_by_key(|&d| schedule.workload_of(&self.doctors[d].id))
    }

    /// Unassigned patients, most urgent first (canonical order within a tier).
    pub fn unassigned_by_urgency(&self, schedule: &Schedule) -> Vec<usize> {
        let mut unassigned: Vec<usize> = (0..self.patients.len())
            .filter(|&p| !schedule.is_assigned(&self.patients[p].id))
            .collect();
        unassigned.sort_by(|&a, &b| self.patients[b].urgency.cmp(&self.patients[a].urgency));
        unassigned
    }

    /// Legalization pass: places every still-unassigned patient that fits,
    /// most urgent first.
    pub fn legalize(&self, schedule: &mut Schedule) {
        for patient in self.unassigned_by_urgency(schedule) {
            if let Some(doctor) = self.find_doctor(schedule, patient) {
                schedule.assign(&self.patients[patient].id, &self.doctors[doctor].id);
            }
        }
    }

    // ======================== Construction ========================

    /// Builds one initial schedule.
    ///
    /// Patients are processed by descending urgency; order within an
    /// urgency tier is shuffled. Unplaceable patients stay unassigned.
    pub fn build_initial<R: Rng>(&self, rng: &mut R) -> Schedule {
        let mut order: Vec<usize> = (0..self.patients.len()).collect();
        order.shuffle(rng);
        order.sort_by(|&a, &b| self.patients[b].urgency.cmp(&self.patients[a].urgency));

        let mut schedule = Schedule::new();
        for patient in order {
            if let Some(doctor) = self.find_doctor(&schedule, patient) {
                schedule.assign(&self.patients[patient].id, &self.doctors[doctor].id);
            }
        }
        schedule
    }

    // ======================== Fitness ========================

    /// Score of a single doctor/patient pairing.
    pub fn assignment_score(&self, doctor: usize, patient: usize) -> f64 {
        let w = &self.weights;
        let d = &self.doctors[doctor];
        let p = &self.patients[patient];
        let required = self.required_experience[patient];

        let mut score = w.base_assignment;
        score += if d.has_specialization(&p.required_specialization) {
            w.specialization
        } else {
            -w.specialization
        };
        score += p.urgency.ordinal() as f64 * w.urgency;
        score += if d.experience >= required {
            w.experience
        } else {
            -2.0 * w.experience
        };
        if d.experience == required {
            score += w.hierarchy;
        }
        if p.last_doctor() == Some(d.id.as_str()) {
            score += w.continuity;
        }
        score += d.preference_score(p) * w.preference;
        score
    }

    /// Rewards evenly spread load: `(1 − mean(ratio²)) × weight × doctors`.
    pub fn workload_balance(&self, schedule: &Schedule) -> f64 {
        if self.doctors.is_empty() {
            return 0.0;
        }
        let n = self.doctors.len() as f64;
        let mean_sq = (0..self.doctors.len())
            .map(|d| self.load_ratio(schedule, d).powi(2))
            .sum::<f64>()
            / n;
        (1.0 - mean_sq) * self.weights.workload_balance * n
    }

    /// Penalty for every unassigned patient, scaled by urgency.
    pub fn unassigned_penalty(&self, schedule: &Schedule) -> f64 {
        let w = &self.weights;
        self.patients
            .iter()
            .filter(|p| !schedule.is_assigned(&p.id))
            .map(|p| p.urgency.ordinal() as f64 * w.urgency * w.unassigned_penalty_multiplier)
            .sum()
    }

    /// Total fitness of a schedule (higher = better).
    ///
    /// Assignments naming unknown doctors or patients are skipped.
    pub fn compute_fitness(&self, schedule: &Schedule) -> f64 {
        let mut total = 0.0;
        for (patient_id, doctor_id) in schedule.assignments() {
            match (self.patient_idx(patient_id), self.doctor_idx(doctor_id)) {
                (Some(p), Some(d)) => total += self.assignment_score(d, p),
                _ => debug!(
                    patient = patient_id,
                    doctor = doctor_id,
                    "skipping assignment with unknown reference"
                ),
            }
        }
        total + self.workload_balance(schedule) - self.unassigned_penalty(schedule)
    }
}

impl GaProblem for AssignmentProblem {
    type Individual = Schedule;

    fn create_individual<R: Rng>(&self, rng: &mut R) -> Schedule {
        self.build_initial(rng)
    }

    fn evaluate(&self, individual: &Schedule) -> f64 {
        self.compute_fitness(individual)
    }

    fn crossover<R: Rng>(&self, parent1: &Schedule, parent2: &Schedule, rng: &mut R) -> Vec<Schedule> {
        let (c1, c2) = self.operators.crossover(self, parent1, parent2, rng);
        vec![c1, c2]
    }

    fn mutate<R: Rng>(&self, individual: &mut Schedule, rng: &mut R) {
        self.operators.mutate(self, individual, rng);
    }
}
