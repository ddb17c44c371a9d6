//! Generational GA driver.
//!
//! Generic over [`GaProblem`]: the problem supplies individuals and
//! operators, the runner owns selection, elitism, the generational loop,
//! and termination. Fitness is maximized.
//!
//! # Concurrency
//! Initial population construction and fitness evaluation run on the
//! rayon pool when [`GaConfig::parallel`] is set. Every parallel task gets
//! its own `SmallRng`, seeded from the run's master generator, so a seeded
//! run gives the same result with or without parallelism. Selection,
//! crossover, and mutation stay on the calling thread.
//!
//! # Reference
//! Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::progress::{CancellationToken, ProgressObserver};
use super::GaConfig;
use crate::error::Result;

/// A candidate solution with a cached fitness.
pub trait Individual: Clone + Send + Sync {
    /// Cached fitness (higher = better).
    fn fitness(&self) -> f64;

    /// Stores a computed fitness.
    fn set_fitness(&mut self, fitness: f64);

    /// Marks the cached fitness as stale.
    fn invalidate_fitness(&mut self);
}

/// Problem definition consumed by [`GaRunner`].
pub trait GaProblem: Sync {
    /// Solution representation.
    type Individual: Individual;

    /// Builds one initial individual.
    fn create_individual<R: Rng>(&self, rng: &mut R) -> Self::Individual;

    /// Computes fitness (higher = better).
    fn evaluate(&self, individual: &Self::Individual) -> f64;

    /// Recombines two parents into offspring.
    fn crossover<R: Rng>(
        &self,
        parent1: &Self::Individual,
        parent2: &Self::Individual,
        rng: &mut R,
    ) -> Vec<Self::Individual>;

    /// Mutates an individual in place.
    fn mutate<R: Rng>(&self, individual: &mut Self::Individual, rng: &mut R);
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// The population had no members.
    PopulationEmpty,
    /// The generation limit was reached.
    MaxGenerations,
    /// The best fitness reached the configured threshold.
    FitnessThreshold,
    /// No improvement for `max_stagnation` generations.
    Stagnation,
    /// Cancelled through a [`CancellationToken`].
    Cancelled,
}

/// Outcome of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult<I> {
    /// Best individual seen (`None` only for an empty population).
    pub best: Option<I>,
    /// Fitness of `best` (`-inf` when there is none).
    pub best_fitness: f64,
    /// Generations evolved after the initial population.
    pub generations: usize,
    /// Why the run stopped.
    pub termination: TerminationReason,
    /// Best fitness so far, one entry per evaluated generation.
    pub history: Vec<f64>,
}

/// Generational GA with tournament selection and elitism.
///
/// # Example
/// ```no_run
/// use u_medsched::ga::{AssignmentProblem, GaConfig, GaRunner};
/// use u_medsched::models::{Doctor, Patient};
///
/// let doctors = vec![Doctor::new("D1", "Cardiology")];
/// let patients = vec![Patient::new("P1", "Cardiology")];
/// let problem = AssignmentProblem::new(&doctors, &patients, &[]).unwrap();
/// let result = GaRunner::run(&problem, &GaConfig::default().with_seed(1)).unwrap();
/// assert!(result.best.is_some());
/// ```
pub struct GaRunner {
    config: GaConfig,
    observer: Option<Arc<dyn ProgressObserver>>,
    cancellation: Option<CancellationToken>,
}

impl GaRunner {
    /// Creates a runner. Fails if the configuration is out of range.
    pub fn new(config: GaConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            observer: None,
            cancellation: None,
        })
    }

    /// Runs a problem with the given configuration.
    pub fn run<P: GaProblem>(problem: &P, config: &GaConfig) -> Result<GaResult<P::Individual>> {
        Ok(Self::new(config.clone())?.execute(problem))
    }

    /// The validated configuration.
    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Attaches a progress observer.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Attaches a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Runs the generational loop until a termination condition holds.
    pub fn execute<P: GaProblem>(&self, problem: &P) -> GaResult<P::Individual> {
        let config = &self.config;
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        let mut population = self.initial_population(problem, &mut rng);
        self.evaluate_population(problem, &mut population);

        let mut generation = 0usize;
        let mut best: Option<P::Individual> = None;
        let mut best_fitness = f64::NEG_INFINITY;
        let mut stagnation = 0usize;
        let mut history = Vec::new();

        let termination = loop {
            if self.is_cancelled() {
                break TerminationReason::Cancelled;
            }

            let Some(current_idx) = best_index(&population) else {
                break TerminationReason::PopulationEmpty;
            };
            let current = &population[current_idx];
            let current_fitness = current.fitness();

            if best.is_none() || current_fitness > best_fitness + config.stagnation_tolerance {
                stagnation = 0;
                best = Some(current.clone());
                best_fitness = current_fitness;
            } else {
                stagnation += 1;
                if current_fitness > best_fitness {
                    best = Some(current.clone());
                    best_fitness = current_fitness;
                }
            }
            history.push(best_fitness);

            debug!(generation, best_fitness, stagnation, "generation evaluated");
            self.notify(
                generation,
                best_fitness,
                &format!("generation {generation}: best fitness {best_fitness:.3}"),
            );

            if generation >= config.max_generations {
                break TerminationReason::MaxGenerations;
            }
            if config.fitness_threshold.is_some_and(|t| best_fitness >= t) {
                break TerminationReason::FitnessThreshold;
            }
            if stagnation >= config.max_stagnation {
                break TerminationReason::Stagnation;
            }

            population = self.next_generation(problem, &population, &mut rng);
            self.evaluate_population(problem, &mut population);
            generation += 1;
        };

        info!(
            generations = generation,
            best_fitness,
            ?termination,
            "genetic search finished"
        );

        GaResult {
            best,
            best_fitness,
            generations: generation,
            termination,
            history,
        }
    }

    fn initial_population<P: GaProblem>(
        &self,
        problem: &P,
        rng: &mut SmallRng,
    ) -> Vec<P::Individual> {
        let seeds: Vec<u64> = (0..self.config.population_size)
            .map(|_| rng.random())
            .collect();
        let build = |seed: &u64| {
            let mut task_rng = SmallRng::seed_from_u64(*seed);
            problem.create_individual(&mut task_rng)
        };
        if self.config.parallel {
            seeds.par_iter().map(build).collect()
        } else {
            seeds.iter().map(build).collect()
        }
    }

    fn evaluate_population<P: GaProblem>(&self, problem: &P, population: &mut [P::Individual]) {
        let score = |individual: &mut P::Individual| {
            individual.invalidate_fitness();
            let fitness = problem.evaluate(individual);
            individual.set_fitness(fitness);
        };
        if self.config.parallel {
            population.par_iter_mut().for_each(score);
        } else {
            population.iter_mut().for_each(score);
        }
    }

    fn next_generation<P: GaProblem>(
        &self,
        problem: &P,
        population: &[P::Individual],
        rng: &mut SmallRng,
    ) -> Vec<P::Individual> {
        let config = &self.config;
        let size = config.population_size;
        let mut next = Vec::with_capacity(size);

        // Elitism: stable sort keeps first-found order among equals
        let mut ranked: Vec<usize> = (0..population.len()).collect();
        ranked.sort_by(|&a, &b| population[b].fitness().total_cmp(&population[a].fitness()));
        next.extend(
            ranked
                .iter()
                .take(config.elite_count().min(population.len()))
                .map(|&i| population[i].clone()),
        );

        while next.len() < size {
            let parent1 = tournament_select(population, config.tournament_size, rng);
            let parent2 = tournament_select(population, config.tournament_size, rng);

            let offspring = if rng.random_bool(config.crossover_rate) {
                problem.crossover(parent1, parent2, rng)
            } else {
                vec![parent1.clone(), parent2.clone()]
            };

            for mut child in offspring {
                if next.len() >= size {
                    break;
                }
                if rng.random_bool(config.mutation_rate) {
                    problem.mutate(&mut child, rng);
                }
                child.invalidate_fitness();
                next.push(child);
            }
        }

        next
    }

    fn notify(&self, generation: usize, best_fitness: f64, message: &str) {
        if let Some(observer) = &self.observer {
            observer.on_progress(generation, best_fitness, message);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Index of the fittest individual; the first one wins ties.
fn best_index<I: Individual>(population: &[I]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, individual) in population.iter().enumerate() {
        match best {
            Some(b) if population[b].fitness() >= individual.fitness() => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Tournament selection: draws `k` members uniformly (with replacement)
/// and returns the fittest, first found on ties.
///
/// # Panics
/// Panics if `population` is empty.
pub fn tournament_select<'a, I: Individual, R: Rng>(
    population: &'a [I],
    k: usize,
    rng: &mut R,
) -> &'a I {
    let mut winner = &population[rng.random_range(0..population.len())];
    for _ in 1..k.max(1) {
        let candidate = &population[rng.random_range(0..population.len())];
        if candidate.fitness() > winner.fitness() {
            winner = candidate;
        }
    }
    winner
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Maximize the number of `true` bits.
    struct OneMax {
        len: usize,
    }

    #[derive(Debug, Clone)]
    struct Bits {
        genes: Vec<bool>,
        fitness: f64,
    }

    impl Individual for Bits {
        fn fitness(&self) -> f64 {
            self.fitness
        }
        fn set_fitness(&mut self, fitness: f64) {
            self.fitness = fitness;
        }
        fn invalidate_fitness(&mut self) {
            self.fitness = f64::NEG_INFINITY;
        }
    }

    impl GaProblem for OneMax {
        type Individual = Bits;

        fn create_individual<R: Rng>(&self, rng: &mut R) -> Bits {
            Bits {
                genes: (0..self.len).map(|_| rng.random_bool(0.3)).collect(),
                fitness: f64::NEG_INFINITY,
            }
        }

        fn evaluate(&self, individual: &Bits) -> f64 {
            individual.genes.iter().filter(|g| **g).count() as f64
        }

        fn crossover<R: Rng>(&self, p1: &Bits, p2: &Bits, rng: &mut R) -> Vec<Bits> {
            let cut = rng.random_range(0..=self.len);
            let mut c1 = p1.clone();
            let mut c2 = p2.clone();
            c1.genes[cut..].copy_from_slice(&p2.genes[cut..]);
            c2.genes[cut..].copy_from_slice(&p1.genes[cut..]);
            vec![c1, c2]
        }

        fn mutate<R: Rng>(&self, individual: &mut Bits, rng: &mut R) {
            if self.len == 0 {
                return;
            }
            let i = rng.random_range(0..self.len);
            individual.genes[i] = !individual.genes[i];
        }
    }

    fn config() -> GaConfig {
        GaConfig::default()
            .with_population_size(30)
            .with_max_generations(40)
            .with_seed(42)
            .with_parallel(false)
    }

    #[test]
    fn test_runner_improves_onemax() {
        let problem = OneMax { len: 24 };
        let result = GaRunner::run(&problem, &config()).unwrap();
        let first = result.history[0];
        assert!(result.best_fitness >= first);
        assert!(result.best.is_some());
        assert_eq!(result.history.len(), result.generations + 1);
    }

    #[test]
    fn test_best_fitness_is_monotonic() {
        let problem = OneMax { len: 32 };
        let result = GaRunner::run(&problem, &config().with_mutation_rate(0.9)).unwrap();
        for pair in result.history.windows(2) {
            assert!(pair[1] >= pair[0], "history regressed: {:?}", pair);
        }
    }

    #[test]
    fn test_fitness_threshold_stops_early() {
        let problem = OneMax { len: 8 };
        let result = GaRunner::run(
            &problem,
            &config().with_max_generations(500).with_fitness_threshold(2.0),
        )
        .unwrap();
        assert_eq!(result.termination, TerminationReason::FitnessThreshold);
        assert!(result.best_fitness >= 2.0);
    }

    #[test]
    fn test_empty_population_terminates() {
        let problem = OneMax { len: 8 };
        let result = GaRunner::run(&problem, &config().with_population_size(0)).unwrap();
        assert_eq!(result.termination, TerminationReason::PopulationEmpty);
        assert!(result.best.is_none());
        assert_eq!(result.generations, 0);
    }

    #[test]
    fn test_stagnation_stops_flat_landscape() {
        let problem = OneMax { len: 0 };
        let result = GaRunner::run(
            &problem,
            &config().with_max_generations(1000).with_max_stagnation(5),
        )
        .unwrap();
        assert_eq!(result.termination, TerminationReason::Stagnation);
        assert_eq!(result.generations, 5);
    }

    #[test]
    fn test_max_generations() {
        let problem = OneMax { len: 200 };
        let result = GaRunner::run(&problem, &config().with_max_generations(3)).unwrap();
        assert_eq!(result.termination, TerminationReason::MaxGenerations);
        assert_eq!(result.generations, 3);
    }

    #[test]
    fn test_cancellation_before_first_generation() {
        let token = CancellationToken::new();
        token.cancel();
        let result = GaRunner::new(config())
            .unwrap()
            .with_cancellation(token)
            .execute(&OneMax { len: 8 });
        assert_eq!(result.termination, TerminationReason::Cancelled);
    }

    #[test]
    fn test_observer_receives_every_generation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer = move |g: usize, _: f64, _: &str| sink.lock().unwrap().push(g);
        let result = GaRunner::new(config().with_max_generations(4))
            .unwrap()
            .with_observer(Arc::new(observer))
            .execute(&OneMax { len: 64 });
        let generations = seen.lock().unwrap().clone();
        assert_eq!(generations.len(), result.history.len());
        assert_eq!(generations[0], 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let problem = OneMax { len: 40 };
        let sequential = GaRunner::run(&problem, &config()).unwrap();
        let parallel = GaRunner::run(&problem, &config().with_parallel(true)).unwrap();
        assert_eq!(sequential.history, parallel.history);
    }

    #[test]
    fn test_out_of_range_config_is_rejected() {
        let loaded: GaConfig =
            serde_json::from_str(r#"{"mutation_rate": 1.5, "seed": 1, "parallel": false}"#).unwrap();
        let err = GaRunner::run(&OneMax { len: 8 }, &loaded).err().unwrap();
        assert_eq!(
            err.validation_errors()[0].kind,
            crate::validation::ValidationErrorKind::InvalidConfig
        );

        let mut nan = config();
        nan.crossover_rate = f64::NAN;
        assert!(GaRunner::new(nan).is_err());
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let population: Vec<Bits> = (0..5)
            .map(|i| Bits {
                genes: vec![],
                fitness: i as f64,
            })
            .collect();
        let mut rng = SmallRng::seed_from_u64(42);
        // With a huge tournament the best member is practically always drawn
        let winner = tournament_select(&population, 200, &mut rng);
        assert_eq!(winner.fitness(), 4.0);
    }
}
