//! Doctor/patient optimizer facade.
//!
//! Wires an [`AssignmentProblem`] to the [`GaRunner`] and turns the raw
//! GA result into a schedule the caller can use directly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::operators::GeneticOperators;
use super::progress::{CancellationToken, ProgressObserver};
use super::runner::{GaRunner, TerminationReason};
use super::{AssignmentProblem, FitnessWeights, GaConfig};
use crate::error::Result;
use crate::models::{Doctor, MedicalProcedure, Patient, Schedule};

/// Outcome of an optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best schedule found (empty if the population was empty).
    pub schedule: Schedule,
    /// Its fitness.
    pub best_fitness: f64,
    /// Generations evolved.
    pub generations: usize,
    /// Why the search stopped.
    pub termination: TerminationReason,
    /// Best fitness so far, per generation.
    pub history: Vec<f64>,
}

/// Genetic doctor/patient matcher.
///
/// # Example
/// ```
/// use u_medsched::ga::{GaConfig, PatientAssignmentOptimizer};
/// use u_medsched::models::{Doctor, Patient};
///
/// let doctors = vec![Doctor::new("D1", "Cardiology")];
/// let patients = vec![Patient::new("P1", "Cardiology")];
/// let config = GaConfig::default()
///     .with_population_size(10)
///     .with_max_generations(5)
///     .with_seed(42);
/// let optimizer = PatientAssignmentOptimizer::new(&doctors, &patients, &[], config).unwrap();
/// let result = optimizer.optimize();
/// assert_eq!(result.schedule.doctor_of("P1"), Some("D1"));
/// ```
pub struct PatientAssignmentOptimizer {
    problem: AssignmentProblem,
    runner: GaRunner,
}

impl PatientAssignmentOptimizer {
    /// Creates an optimizer. Fails fast on invalid input or configuration.
    pub fn new(
        doctors: &[Doctor],
        patients: &[Patient],
        procedures: &[MedicalProcedure],
        config: GaConfig,
    ) -> Result<Self> {
        let runner = GaRunner::new(config)?;
        let problem = AssignmentProblem::new(doctors, patients, procedures)?;
        Ok(Self { problem, runner })
    }

    /// Sets fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.problem = self.problem.with_weights(weights);
        self
    }

    /// Sets operator settings.
    pub fn with_operators(mut self, operators: GeneticOperators) -> Self {
        self.problem = self.problem.with_operators(operators);
        self
    }

    /// Attaches a progress observer.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.runner = self.runner.with_observer(observer);
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.runner = self.runner.with_cancellation(token);
        self
    }

    /// The underlying problem.
    pub fn problem(&self) -> &AssignmentProblem {
        &self.problem
    }

    /// Runs the genetic search.
    pub fn optimize(&self) -> OptimizationResult {
        info!(
            doctors = self.problem.doctors().len(),
            patients = self.problem.patients().len(),
            population = self.runner.config().population_size,
            "starting doctor/patient optimization"
        );

        let result = self.runner.execute(&self.problem);

        OptimizationResult {
            schedule: result.best.unwrap_or_default(),
            best_fitness: result.best_fitness,
            generations: result.generations,
            termination: result.termination,
            history: result.history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExperienceLevel, Urgency};

    fn config() -> GaConfig {
        GaConfig::default()
            .with_population_size(20)
            .with_max_generations(25)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_high_urgency_assigned_first() {
        let doctors = vec![Doctor::new("D1", "Cardiology")
            .with_experience(ExperienceLevel::Senior)
            .with_max_workload(1)];
        let patients = vec![
            Patient::new("P1", "Cardiology").with_urgency(Urgency::High),
            Patient::new("P2", "Cardiology").with_urgency(Urgency::Low),
        ];
        let optimizer = PatientAssignmentOptimizer::new(&doctors, &patients, &[], config()).unwrap();
        let result = optimizer.optimize();
        assert_eq!(result.schedule.doctor_of("P1"), Some("D1"));
        assert!(!result.schedule.is_assigned("P2"));
        assert!(result.schedule.is_consistent());
    }

    #[test]
    fn test_empty_patients_terminates() {
        let doctors = vec![Doctor::new("D1", "Cardiology")];
        let optimizer = PatientAssignmentOptimizer::new(
            &doctors,
            &[],
            &[],
            config().with_max_generations(1000).with_max_stagnation(10),
        )
        .unwrap();
        let result = optimizer.optimize();
        assert_eq!(result.schedule.assignment_count(), 0);
        assert_eq!(result.schedule.surgery_count(), 0);
        assert!(result.best_fitness.is_finite());
        assert!(matches!(
            result.termination,
            TerminationReason::Stagnation | TerminationReason::MaxGenerations
        ));
        assert!(result.generations <= 10);
    }

    #[test]
    fn test_empty_patients_hit_generation_limit() {
        let doctors = vec![Doctor::new("D1", "Cardiology")];
        let optimizer = PatientAssignmentOptimizer::new(
            &doctors,
            &[],
            &[],
            config().with_max_generations(5).with_max_stagnation(1000),
        )
        .unwrap();
        let result = optimizer.optimize();
        assert_eq!(result.termination, TerminationReason::MaxGenerations);
        assert_eq!(result.generations, 5);
        assert_eq!(result.history.len(), 6);
        assert_eq!(result.schedule.assignment_count(), 0);
    }

    #[test]
    fn test_empty_population_returns_empty_schedule() {
        let doctors = vec![Doctor::new("D1", "Cardiology")];
        let patients = vec![Patient::new("P1", "Cardiology")];
        let optimizer = PatientAssignmentOptimizer::new(
            &doctors,
            &patients,
            &[],
            config().with_population_size(0),
        )
        .unwrap();
        let result = optimizer.optimize();
        assert_eq!(result.termination, TerminationReason::PopulationEmpty);
        assert_eq!(result.schedule.assignment_count(), 0);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let doctors = vec![Doctor::new("D1", "Cardiology")];
        let mut bad = config();
        bad.crossover_rate = 3.0;
        assert!(PatientAssignmentOptimizer::new(&doctors, &[], &[], bad).is_err());
    }

    #[test]
    fn test_best_fitness_non_decreasing() {
        let doctors: Vec<_> = (0..4)
            .map(|i| {
                Doctor::new(format!("D{i}"), if i % 2 == 0 { "A" } else { "B" })
                    .with_max_workload(3)
            })
            .collect();
        let patients: Vec<_> = (0..14)
            .map(|i| {
                Patient::new(format!("P{i:02}"), if i % 3 == 0 { "A" } else { "B" })
                    .with_urgency(if i % 4 == 0 { Urgency::High } else { Urgency::Medium })
                    .with_previous_doctor(format!("D{}", i % 4))
            })
            .collect();
        let optimizer = PatientAssignmentOptimizer::new(
            &doctors,
            &patients,
            &[],
            config().with_mutation_rate(0.6),
        )
        .unwrap();
        let result = optimizer.optimize();
        for pair in result.history.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert!(result.schedule.is_consistent());
        for doctor in &doctors {
            assert!(result.schedule.workload_of(&doctor.id) <= doctor.max_workload);
        }
    }

    #[test]
    fn test_best_schedule_fitness_matches_problem() {
        let doctors = vec![Doctor::new("D1", "A").with_max_workload(2)];
        let patients = vec![Patient::new("P1", "A"), Patient::new("P2", "B")];
        let optimizer = PatientAssignmentOptimizer::new(&doctors, &patients, &[], config()).unwrap();
        let result = optimizer.optimize();
        let recomputed = optimizer.problem().compute_fitness(&result.schedule);
        assert!((recomputed - result.best_fitness).abs() < 1e-9);
    }
}
