//! Genetic operators for doctor/patient schedules.
//!
//! Provides a PMX-style crossover over the canonical patient ordering and
//! five repair-oriented mutation strategies, selected stochastically via
//! [`GeneticOperators`].
//!
//! # Usage
//!
//! ```
//! use u_medsched::ga::operators::{GeneticOperators, MutationStrategy};
//!
//! let ops = GeneticOperators::default();
//! assert_eq!(ops.weight_of(MutationStrategy::FillUnassigned), 25);
//! ```
//!
//! # Reference
//! Goldberg & Lingle (1985), "Alleles, loci, and the traveling salesman problem"

use std::collections::HashMap;

use rand::prelude::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::AssignmentProblem;
use crate::models::Schedule;

/// Mutation strategy for assignment schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationStrategy {
    /// Place the most urgent unassigned patients.
    FillUnassigned,
    /// Swap two patients' doctors when preferences improve.
    PreferenceOptimization,
    /// Move a patient back to a doctor who treated them before.
    ContinuityRepair,
    /// Move a patient from the most to the least loaded doctor.
    WorkloadRebalancing,
    /// Reassign a random patient to another suitable doctor.
    RandomReassignment,
}

impl MutationStrategy {
    /// All strategies, in weight-table order.
    pub const ALL: [MutationStrategy; 5] = [
        MutationStrategy::FillUnassigned,
        MutationStrategy::PreferenceOptimization,
        MutationStrategy::ContinuityRepair,
        MutationStrategy::WorkloadRebalancing,
        MutationStrategy::RandomReassignment,
    ];
}

/// Operator settings for the assignment GA.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticOperators {
    /// Relative selection weight per strategy, in [`MutationStrategy::ALL`] order.
    pub mutation_weights: [u32; 5],
    /// Load-ratio gap that triggers workload rebalancing.
    pub rebalance_threshold: f64,
    /// Patients placed per fill-unassigned mutation.
    pub fill_batch: usize,
}

impl Default for GeneticOperators {
    fn default() -> Self {
        Self {
            mutation_weights: [25, 20, 20, 20, 15],
            rebalance_threshold: 0.2,
            fill_batch: 5,
        }
    }
}

impl GeneticOperators {
    /// Selection weight of a strategy.
    pub fn weight_of(&self, strategy: MutationStrategy) -> u32 {
        let idx = MutationStrategy::ALL
            .iter()
            .position(|s| *s == strategy)
            .unwrap_or(0);
        self.mutation_weights[idx]
    }

    /// Draws a strategy according to the weights.
    ///
    /// Falls back to uniform choice when all weights are zero.
    pub fn choose_strategy<R: Rng>(&self, rng: &mut R) -> MutationStrategy {
        let total: u32 = self.mutation_weights.iter().sum();
        if total == 0 {
            return MutationStrategy::ALL[rng.random_range(0..MutationStrategy::ALL.len())];
        }
        let mut roll = rng.random_range(0..total);
        for (strategy, &weight) in MutationStrategy::ALL.iter().zip(&self.mutation_weights) {
            if roll < weight {
                return *strategy;
            }
            roll -= weight;
        }
        MutationStrategy::RandomReassignment
    }

    /// Performs PMX crossover.
    pub fn crossover<R: Rng>(
        &self,
        problem: &AssignmentProblem,
        p1: &Schedule,
        p2: &Schedule,
        rng: &mut R,
    ) -> (Schedule, Schedule) {
        pmx_crossover(problem, p1, p2, rng)
    }

    /// Mutates using a stochastically chosen strategy.
    ///
    /// Returns whether the schedule changed.
    pub fn mutate<R: Rng>(
        &self,
        problem: &AssignmentProblem,
        schedule: &mut Schedule,
        rng: &mut R,
    ) -> bool {
        let strategy = self.choose_strategy(rng);
        self.apply(strategy, problem, schedule, rng)
    }

    /// Applies one specific strategy. Returns whether the schedule changed.
    pub fn apply<R: Rng>(
        &self,
        strategy: MutationStrategy,
        problem: &AssignmentProblem,
        schedule: &mut Schedule,
        rng: &mut R,
    ) -> bool {
        let changed = match strategy {
            MutationStrategy::FillUnassigned => fill_unassigned(problem, schedule, self.fill_batch),
            MutationStrategy::PreferenceOptimization => {
                preference_optimization(problem, schedule, rng)
            }
            MutationStrategy::ContinuityRepair => continuity_repair(problem, schedule, rng),
            MutationStrategy::WorkloadRebalancing => {
                workload_rebalancing(problem, schedule, self.rebalance_threshold)
            }
            MutationStrategy::RandomReassignment => random_reassignment(problem, schedule, rng),
        };
        if changed {
            schedule.invalidate_fitness();
        }
        changed
    }
}

// ======================== Crossover ========================

/// PMX-style crossover over the canonical patient ordering.
///
/// A segment [start, end) is drawn. Inside it each child takes the other
/// parent's doctor where feasible; when both swaps succeed the two doctors
/// are recorded as corresponding. Outside it each child keeps its own
/// parent's doctor, then tries the corresponding doctor, then the general
/// fallback search. A final legalization pass places what is left.
///
/// Children never list a patient twice: every placement goes through
/// [`Schedule::assign`].
pub fn pmx_crossover<R: Rng>(
    problem: &AssignmentProblem,
    p1: &Schedule,
    p2: &Schedule,
    rng: &mut R,
) -> (Schedule, Schedule) {
    let n = problem.patients().len();
    let mut child1 = Schedule::new();
    let mut child2 = Schedule::new();
    if n == 0 {
        return (child1, child2);
    }

    let a = rng.random_range(0..=n);
    let b = rng.random_range(0..=n);
    let (start, end) = (a.min(b), a.max(b));

    // child1's primary parent is p1: maps p1's doctor → p2's doctor
    let mut mapping1: HashMap<String, String> = HashMap::new();
    let mut mapping2: HashMap<String, String> = HashMap::new();

    for patient in start..end {
        let id = &problem.patients()[patient].id;
        let d1 = p1.doctor_of(id);
        let d2 = p2.doctor_of(id);
        let took1 = d2.is_some_and(|d| problem.try_assign(&mut child1, patient, d));
        let took2 = d1.is_some_and(|d| problem.try_assign(&mut child2, patient, d));
        if let (true, true, Some(d1), Some(d2)) = (took1, took2, d1, d2) {
            if d1 != d2 {
                mapping1.insert(d1.to_string(), d2.to_string());
                mapping2.insert(d2.to_string(), d1.to_string());
            }
        }
    }

    for patient in (0..start).chain(end..n) {
        inherit(problem, &mut child1, patient, p1, &mapping1);
        inherit(problem, &mut child2, patient, p2, &mapping2);
    }

    problem.legalize(&mut child1);
    problem.legalize(&mut child2);
    (child1, child2)
}

fn inherit(
    problem: &AssignmentProblem,
    child: &mut Schedule,
    patient: usize,
    parent: &Schedule,
    mapping: &HashMap<String, String>,
) {
    let id = &problem.patients()[patient].id;
    if let Some(doctor) = parent.doctor_of(id) {
        if problem.try_assign(child, patient, doctor) {
            return;
        }
        if let Some(mapped) = mapping.get(doctor) {
            if problem.try_assign(child, patient, mapped) {
                return;
            }
        }
    }
    if let Some(doctor) = problem.find_fallback_doctor(child, patient) {
        child.assign(id, &problem.doctors()[doctor].id);
    }
}

// ======================== Mutation operators ========================

/// Places up to `batch` of the most urgent unassigned patients.
pub fn fill_unassigned(problem: &AssignmentProblem, schedule: &mut Schedule, batch: usize) -> bool {
    let mut changed = false;
    for patient in problem.unassigned_by_urgency(schedule).into_iter().take(batch) {
        if let Some(doctor) = problem.find_doctor(schedule, patient) {
            schedule.assign(&problem.patients()[patient].id, &problem.doctors()[doctor].id);
            changed = true;
        }
    }
    changed
}

/// Swaps the doctors of two random assignments if the summed preference
/// score improves and both doctors stay suitable.
pub fn preference_optimization<R: Rng>(
    problem: &AssignmentProblem,
    schedule: &mut Schedule,
    rng: &mut R,
) -> bool {
    let pairs = known_assignments(problem, schedule);
    if pairs.len() < 2 {
        return false;
    }
    let i = rng.random_range(0..pairs.len());
    let mut j = rng.random_range(0..pairs.len() - 1);
    if j >= i {
        j += 1;
    }
    let (pa, da) = pairs[i];
    let (pb, db) = pairs[j];
    if da == db || !problem.is_suitable(db, pa) || !problem.is_suitable(da, pb) {
        return false;
    }

    let doctors = problem.doctors();
    let patients = problem.patients();
    let current =
        doctors[da].preference_score(&patients[pa]) + doctors[db].preference_score(&patients[pb]);
    let swapped =
        doctors[db].preference_score(&patients[pa]) + doctors[da].preference_score(&patients[pb]);
    if swapped <= current {
        return false;
    }

    schedule.assign(&patients[pa].id, &doctors[db].id);
    schedule.assign(&patients[pb].id, &doctors[da].id);
    true
}

/// Moves one random eligible patient back to a previous doctor.
///
/// Eligible: the patient's most recent previous doctor that differs from
/// the current one has spare capacity and is suitable.
pub fn continuity_repair<R: Rng>(
    problem: &AssignmentProblem,
    schedule: &mut Schedule,
    rng: &mut R,
) -> bool {
    let candidates: Vec<(usize, usize)> = known_assignments(problem, schedule)
        .into_iter()
        .filter_map(|(patient, current)| {
            problem.patients()[patient]
                .previous_doctors
                .iter()
                .rev()
                .filter_map(|id| problem.doctor_idx(id))
                .find(|&d| {
                    d != current
                        && problem.has_capacity(schedule, d)
                        && problem.is_suitable(d, patient)
                })
                .map(|d| (patient, d))
        })
        .collect();

    let Some(&(patient, doctor)) = candidates.choose(rng) else {
        return false;
    };
    schedule.assign(&problem.patients()[patient].id, &problem.doctors()[doctor].id);
    true
}

/// Moves one patient from the most loaded doctor (by load ratio) to the
/// least loaded one when their gap exceeds `threshold`.
pub fn workload_rebalancing(
    problem: &AssignmentProblem,
    schedule: &mut Schedule,
    threshold: f64,
) -> bool {
    let doctors = problem.doctors();
    let active: Vec<usize> = (0..doctors.len())
        .filter(|&d| doctors[d].max_workload > 0)
        .collect();
    if active.len() < 2 {
        return false;
    }

    let ratio = |d: usize| problem.load_ratio(schedule, d);
    let mut most = active[0];
    let mut least = active[0];
    for &d in &active[1..] {
        if ratio(d) > ratio(most) {
            most = d;
        }
        if ratio(d) < ratio(least) {
            least = d;
        }
    }
    if ratio(most) - ratio(least) <= threshold || !problem.has_capacity(schedule, least) {
        return false;
    }

    let movable = schedule
        .patients_of(&doctors[most].id)
        .filter_map(|id| problem.patient_idx(id))
        .find(|&p| problem.is_suitable(least, p));
    let Some(patient) = movable else {
        return false;
    };
    schedule.assign(&problem.patients()[patient].id, &doctors[least].id);
    true
}

/// Reassigns a random patient to a random other suitable doctor with
/// spare capacity.
pub fn random_reassignment<R: Rng>(
    problem: &AssignmentProblem,
    schedule: &mut Schedule,
    rng: &mut R,
) -> bool {
    let pairs = known_assignments(problem, schedule);
    let Some(&(patient, current)) = pairs.choose(rng) else {
        return false;
    };
    let others: Vec<usize> = (0..problem.doctors().len())
        .filter(|&d| {
            d != current && problem.has_capacity(schedule, d) && problem.is_suitable(d, patient)
        })
        .collect();
    let Some(&doctor) = others.choose(rng) else {
        return false;
    };
    schedule.assign(&problem.patients()[patient].id, &problem.doctors()[doctor].id);
    true
}

/// (patient, doctor) index pairs of assignments whose ids are both known.
fn known_assignments(problem: &AssignmentProblem, schedule: &Schedule) -> Vec<(usize, usize)> {
    schedule
        .assignments()
        .filter_map(|(p, d)| Some((problem.patient_idx(p)?, problem.doctor_idx(d)?)))
        .collect()
}
