//! GA-based doctor/patient assignment.
//!
//! A candidate solution is a [`Schedule`](crate::models::Schedule); the
//! population evolves toward higher fitness under capacity and
//! suitability constraints.
//!
//! # Submodules
//!
//! - [`operators`]: PMX crossover and the five mutation strategies
//! - [`progress`]: observers and cancellation
//!
//! # Fitness
//! Per assignment: base reward, specialization match, urgency, experience
//! adequacy, exact-level hierarchy bonus, continuity of care, doctor
//! preferences. Globally: workload balance and an urgency-scaled penalty
//! for every unassigned patient.
//!
//! # Reference
//! Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"

mod config;
pub mod operators;
mod optimizer;
mod problem;
pub mod progress;
mod runner;

pub use config::{FitnessWeights, GaConfig};
pub use operators::{GeneticOperators, MutationStrategy};
pub use optimizer::{OptimizationResult, PatientAssignmentOptimizer};
pub use problem::AssignmentProblem;
pub use progress::{CancellationToken, ChannelObserver, ProgressObserver, ProgressUpdate};
pub use runner::{tournament_select, GaProblem, GaResult, GaRunner, Individual, TerminationReason};
