//! GA run parameters and fitness weights.
//!
//! Both structs deserialize with defaults for missing fields, so a
//! consumer can keep partial overrides in a JSON or YAML file.

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, ValidationErrorKind, ValidationResult};

/// Genetic algorithm run parameters.
///
/// # Example
/// ```
/// use u_medsched::ga::GaConfig;
///
/// let config = GaConfig::default()
///     .with_population_size(20)
///     .with_max_generations(10)
///     .with_seed(42)
///     .with_parallel(false);
/// assert_eq!(config.elite_count(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Number of candidate schedules per generation.
    pub population_size: usize,
    /// Fraction of the population carried over unchanged (at least one).
    pub elitism_rate: f64,
    /// Probability that a selected pair is recombined rather than cloned.
    pub crossover_rate: f64,
    /// Probability that an offspring is mutated.
    pub mutation_rate: f64,
    /// Candidates drawn per tournament.
    pub tournament_size: usize,
    /// Generation limit.
    pub max_generations: usize,
    /// Stop once the best fitness reaches this value.
    pub fitness_threshold: Option<f64>,
    /// Stop after this many generations without improvement.
    pub max_stagnation: usize,
    /// Minimum gain that counts as improvement.
    pub stagnation_tolerance: f64,
    /// Seed for reproducible runs. `None` = seeded from the OS.
    pub seed: Option<u64>,
    /// Build and evaluate the population on the rayon thread pool.
    pub parallel: bool,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            elitism_rate: 0.1,
            crossover_rate: 0.8,
            mutation_rate: 0.2,
            tournament_size: 7,
            max_generations: 200,
            fitness_threshold: None,
            max_stagnation: 30,
            stagnation_tolerance: 1e-6,
            seed: None,
            parallel: true,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the elitism fraction (clamped to [0, 1]).
    pub fn with_elitism_rate(mut self, rate: f64) -> Self {
        self.elitism_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the crossover probability (clamped to [0, 1]).
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the mutation probability (clamped to [0, 1]).
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size;
        self
    }

    /// Sets the generation limit.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Sets the early-stop fitness threshold.
    pub fn with_fitness_threshold(mut self, threshold: f64) -> Self {
        self.fitness_threshold = Some(threshold);
        self
    }

    /// Sets the stagnation limit.
    pub fn with_max_stagnation(mut self, generations: usize) -> Self {
        self.max_stagnation = generations;
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables parallel population work.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of elites carried per generation.
    ///
    /// `ceil(population_size × elitism_rate)`, at least 1 for a non-empty
    /// population.
    pub fn elite_count(&self) -> usize {
        if self.population_size == 0 {
            return 0;
        }
        let count = (self.population_size as f64 * self.elitism_rate).ceil() as usize;
        count.clamp(1, self.population_size)
    }

    /// Checks that probabilities are in range and the tournament is not empty.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();
        for (name, value) in [
            ("elitism_rate", self.elitism_rate),
            ("crossover_rate", self.crossover_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidConfig,
                    format!("{name} must be within [0, 1], got {value}"),
                ));
            }
        }
        if self.tournament_size == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidConfig,
                "tournament_size must be at least 1",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Per-criterion fitness weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    /// Bonus (or symmetric penalty) for specialization match.
    pub specialization: f64,
    /// Multiplied by the urgency ordinal of each assigned patient.
    pub urgency: f64,
    /// Scale of the global workload-balance term.
    pub workload_balance: f64,
    /// Flat reward per assignment.
    pub base_assignment: f64,
    /// Bonus for keeping the patient's last doctor.
    pub continuity: f64,
    /// Bonus when experience equals the required level exactly.
    pub hierarchy: f64,
    /// Bonus for adequate experience; twice this is deducted when under-qualified.
    pub experience: f64,
    /// Multiplied by the doctor's preference score (0..1).
    pub preference: f64,
    /// Scales the penalty for unassigned patients.
    pub unassigned_penalty_multiplier: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            specialization: 10.0,
            urgency: 5.0,
            workload_balance: 3.0,
            base_assignment: 20.0,
            continuity: 8.0,
            hierarchy: 4.0,
            experience: 6.0,
            preference: 5.0,
            unassigned_penalty_multiplier: 10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GaConfig::default().validate().is_ok());
        assert_eq!(GaConfig::default().elite_count(), 10);
    }

    #[test]
    fn test_elite_count_minimum() {
        let config = GaConfig::default()
            .with_population_size(5)
            .with_elitism_rate(0.0);
        assert_eq!(config.elite_count(), 1);
        assert_eq!(GaConfig::default().with_population_size(0).elite_count(), 0);
    }

    #[test]
    fn test_builders_clamp_rates() {
        let config = GaConfig::default()
            .with_mutation_rate(1.5)
            .with_crossover_rate(-0.1);
        assert_eq!(config.mutation_rate, 1.0);
        assert_eq!(config.crossover_rate, 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GaConfig::default().with_tournament_size(0);
        config.mutation_rate = 2.0;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GaConfig =
            serde_json::from_str(r#"{"population_size": 12, "seed": 7}"#).unwrap();
        assert_eq!(config.population_size, 12);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.tournament_size, 7);

        let weights: FitnessWeights = serde_json::from_str(r#"{"continuity": 1.5}"#).unwrap();
        assert_eq!(weights.continuity, 1.5);
        assert_eq!(weights.base_assignment, 20.0);
    }
}
