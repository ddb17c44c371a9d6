//! Medical resource assignment for hospitals.
//!
//! Assigns patients to doctors with a genetic algorithm and books surgeries
//! into operating-room time slots with a greedy allocator.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Doctor`, `Patient`, `MedicalProcedure`,
//!   `OperatingRoom`, `Schedule`, calendar windows and ordinal levels
//! - **`ga`**: Doctor/patient optimizer (population, PMX crossover,
//!   five mutation strategies, weighted fitness)
//! - **`scheduler`**: Surgery allocator and schedule statistics
//! - **`orchestrator`**: Repository seam and the end-to-end run
//! - **`validation`**: Input integrity checks (empty lists, duplicate IDs,
//!   periods, working hours, GA tunables)
//! - **`error`**: Crate error type
//!
//! # Architecture
//!
//! Entities are read-only inputs. Every scheduler writes only to the
//! [`Schedule`](models::Schedule) it returns; doctor workload is always
//! derived from a schedule. Logging goes through `tracing`; the crate
//! never installs a subscriber.
//!
//! # References
//!
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Cardoen, Demeulemeester & Beliën (2010), "Operating room planning and
//!   scheduling: A literature review"

pub mod error;
pub mod ga;
pub mod models;
pub mod orchestrator;
pub mod scheduler;
pub mod validation;

pub use error::{Error, Result};
