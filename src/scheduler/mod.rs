//! Surgery scheduling and schedule metrics.
//!
//! # Algorithm
//!
//! [`SurgeryAllocator`] is a greedy, priority-driven, earliest-slot
//! heuristic over a discrete time grid. It is not optimal, but every
//! placement respects surgeon and room calendars and existing bookings.
//!
//! # Statistics
//!
//! [`ScheduleStatistics`] summarizes the combined schedule: assignment
//! rate, specialization match, doctor workload and surgeries placed.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3-4
//! - Cardoen, Demeulemeester & Beliën (2010), "Operating room planning and
//!   scheduling: A literature review"

mod kpi;
mod surgery;

pub use kpi::ScheduleStatistics;
pub use surgery::{AllocationOutcome, AllocatorConfig, SlotPolicy, SurgeryAllocator};
