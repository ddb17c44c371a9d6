//! End-to-end scheduling run.
//!
//! The [`Orchestrator`] reads entities through an [`EntityRepository`],
//! books surgeries with the [`SurgeryAllocator`], assigns the remaining
//! patients with the [`PatientAssignmentOptimizer`], merges both results
//! into one [`Schedule`] and computes [`ScheduleStatistics`].
//!
//! Entities are read once, at construction. Later repository changes do
//! not affect a constructed orchestrator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::Result;
use crate::ga::{
    CancellationToken, FitnessWeights, GaConfig, GeneticOperators, PatientAssignmentOptimizer,
    ProgressObserver, TerminationReason,
};
use crate::models::{
    Doctor, MedicalProcedure, OperatingRoom, Patient, Schedule, SchedulingPeriod, SurgeryBooking,
};
use crate::scheduler::{AllocatorConfig, ScheduleStatistics, SurgeryAllocator};
use crate::validation::{validate_input, validate_working_day};

/// Source of scheduling entities.
///
/// Each call returns a snapshot; the orchestrator never writes back.
pub trait EntityRepository: Send + Sync {
    /// All doctors, surgeons included.
    fn doctors(&self) -> Vec<Doctor>;
    /// All patients, surgical and non-surgical.
    fn patients(&self) -> Vec<Patient>;
    /// Operating rooms with their existing bookings.
    fn rooms(&self) -> Vec<OperatingRoom>;
    /// Procedure catalogue.
    fn procedures(&self) -> Vec<MedicalProcedure>;
}

/// Repository backed by plain vectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryRepository {
    /// Doctors served by [`EntityRepository::doctors`].
    pub doctors: Vec<Doctor>,
    /// Patients served by [`EntityRepository::patients`].
    pub patients: Vec<Patient>,
    /// Rooms served by [`EntityRepository::rooms`].
    pub rooms: Vec<OperatingRoom>,
    /// Procedures served by [`EntityRepository::procedures`].
    pub procedures: Vec<MedicalProcedure>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a doctor.
    pub fn with_doctor(mut self, doctor: Doctor) -> Self {
        self.doctors.push(doctor);
        self
    }

    /// Adds a patient.
    pub fn with_patient(mut self, patient: Patient) -> Self {
        self.patients.push(patient);
        self
    }

    /// Adds an operating room.
    pub fn with_room(mut self, room: OperatingRoom) -> Self {
        self.rooms.push(room);
        self
    }

    /// Adds a procedure.
    pub fn with_procedure(mut self, procedure: MedicalProcedure) -> Self {
        self.procedures.push(procedure);
        self
    }
}

impl EntityRepository for InMemoryRepository {
    fn doctors(&self) -> Vec<Doctor> {
        self.doctors.clone()
    }

    fn patients(&self) -> Vec<Patient> {
        self.patients.clone()
    }

    fn rooms(&self) -> Vec<OperatingRoom> {
        self.rooms.clone()
    }

    fn procedures(&self) -> Vec<MedicalProcedure> {
        self.procedures.clone()
    }
}

/// Settings for a full run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Genetic search parameters.
    pub ga: GaConfig,
    /// Fitness weights for doctor assignment.
    pub weights: FitnessWeights,
    /// Crossover and mutation settings.
    pub operators: GeneticOperators,
    /// Surgery allocator settings.
    pub allocator: AllocatorConfig,
}

/// How the optimizer run ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSummary {
    /// Fitness of the returned assignment.
    pub best_fitness: f64,
    /// Generations evolved.
    pub generations: usize,
    /// Why the search stopped.
    pub termination: TerminationReason,
}

/// Everything a run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    /// Doctor assignments and surgeries, merged.
    pub schedule: Schedule,
    /// Metrics over the merged schedule.
    pub statistics: ScheduleStatistics,
    /// Surgeries booked in this run.
    pub bookings: Vec<SurgeryBooking>,
    /// Surgical patients booked in this run, stamped with start time,
    /// surgeon and room.
    pub scheduled_surgical: Vec<Patient>,
    /// Surgical patients without a slot, in priority order.
    pub unscheduled_surgical: Vec<Patient>,
    /// Surgical patients not considered: unknown or missing procedure, or
    /// a surgery already fixed outside the period.
    pub skipped_surgical: Vec<Patient>,
    /// Rooms with this run's bookings recorded.
    pub rooms: Vec<OperatingRoom>,
    /// Optimizer summary.
    pub optimization: OptimizationSummary,
}

/// Runs the surgery allocator and the assignment optimizer over one period.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use u_medsched::models::{Doctor, Patient, SchedulingPeriod};
/// use u_medsched::orchestrator::{InMemoryRepository, Orchestrator, OrchestratorConfig};
///
/// let repository = InMemoryRepository::new()
///     .with_doctor(Doctor::new("D1", "Cardiology"))
///     .with_patient(Patient::new("P1", "Cardiology"));
/// let mut config = OrchestratorConfig::default();
/// config.ga = config.ga.with_population_size(10).with_max_generations(5).with_seed(1);
///
/// let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let orchestrator = Orchestrator::new(
///     Arc::new(repository),
///     SchedulingPeriod::single_day(day),
///     config,
/// ).unwrap();
/// let outcome = orchestrator.run().unwrap();
/// assert_eq!(outcome.schedule.doctor_of("P1"), Some("D1"));
/// ```
pub struct Orchestrator {
    repository: Arc<dyn EntityRepository>,
    period: SchedulingPeriod,
    config: OrchestratorConfig,
    doctors: Vec<Doctor>,
    patients: Vec<Patient>,
    rooms: Vec<OperatingRoom>,
    procedures: Vec<MedicalProcedure>,
    observer: Option<Arc<dyn ProgressObserver>>,
    cancellation: Option<CancellationToken>,
}

impl Orchestrator {
    /// Loads entities and validates the whole input.
    ///
    /// Fails on empty doctor or patient lists, duplicate ids, an empty
    /// period, a malformed working day, or an invalid GA configuration.
    pub fn new(
        repository: Arc<dyn EntityRepository>,
        period: SchedulingPeriod,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        let doctors = repository.doctors();
        let patients = repository.patients();
        let rooms = repository.rooms();
        let procedures = repository.procedures();

        let mut errors = Vec::new();
        if let Err(e) = validate_input(&doctors, &patients, &procedures, &rooms, &period) {
            errors.extend(e);
        }
        if let Err(e) = validate_working_day(
            config.allocator.day_start,
            config.allocator.day_end,
            config.allocator.slot_minutes,
        ) {
            errors.extend(e);
        }
        if let Err(e) = config.ga.validate() {
            errors.extend(e);
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(Self {
            repository,
            period,
            config,
            doctors,
            patients,
            rooms,
            procedures,
            observer: None,
            cancellation: None,
        })
    }

    /// Attaches a progress observer for the optimizer phase.
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Attaches a cancellation token for the optimizer phase.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The repository entities were loaded from.
    pub fn repository(&self) -> &Arc<dyn EntityRepository> {
        &self.repository
    }

    /// The period being scheduled.
    pub fn period(&self) -> SchedulingPeriod {
        self.period
    }

    /// Runs surgery allocation, then doctor assignment.
    #[instrument(skip(self), fields(start = %self.period.start, end = %self.period.end))]
    pub fn run(&self) -> Result<ScheduleOutcome> {
        let allocation = SurgeryAllocator::new(
            self.period,
            &self.doctors,
            &self.patients,
            &self.rooms,
            &self.procedures,
            self.config.allocator.clone(),
        )?
        .schedule();

        let mut optimizer = PatientAssignmentOptimizer::new(
            &self.doctors,
            &self.patients,
            &self.procedures,
            self.config.ga.clone(),
        )?
        .with_weights(self.config.weights.clone())
        .with_operators(self.config.operators.clone());
        if let Some(observer) = &self.observer {
            optimizer = optimizer.with_observer(Arc::clone(observer));
        }
        if let Some(token) = &self.cancellation {
            optimizer = optimizer.with_cancellation(token.clone());
        }
        let optimization = optimizer.optimize();

        let mut schedule = allocation.schedule;
        schedule.merge(&optimization.schedule);

        let statistics = ScheduleStatistics::calculate(&schedule, &self.doctors, &self.patients);
        info!(
            assigned = statistics.total_assigned,
            surgeries = statistics.surgeries_scheduled,
            unassigned = statistics.unassigned_patients,
            unscheduled_surgical = allocation.unscheduled.len(),
            skipped_surgical = allocation.skipped.len(),
            "scheduling run finished"
        );

        Ok(ScheduleOutcome {
            schedule,
            statistics,
            bookings: allocation.bookings,
            scheduled_surgical: allocation.scheduled,
            unscheduled_surgical: allocation.unscheduled,
            skipped_surgical: allocation.skipped,
            rooms: allocation.rooms,
            optimization: OptimizationSummary {
                best_fitness: optimization.best_fitness,
                generations: optimization.generations,
                termination: optimization.termination,
            },
        })
    }
}
