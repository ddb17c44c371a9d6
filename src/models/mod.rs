//! Medical scheduling domain models.
//!
//! Provides the entity types the schedulers read (doctors, patients,
//! procedures, operating rooms) and the [`Schedule`] they write.
//!
//! # Domain Mappings
//!
//! | u-medsched | Scheduling role |
//! |------------|-----------------|
//! | Doctor | Capacitated resource |
//! | Patient | Job with priority |
//! | OperatingRoom | Time-slotted resource |
//! | MedicalProcedure | Job duration + skill requirement |
//! | Schedule | Solution |

mod calendar;
mod doctor;
mod level;
mod patient;
mod procedure;
mod room;
mod schedule;

pub use calendar::{weekly_covers, SchedulingPeriod, TimeWindow, WeeklyWindow};
pub use doctor::{
    Doctor, DoctorPreference, PreferenceDirection, PreferenceType, SurgeonCapability,
    NEUTRAL_PREFERENCE,
};
pub use level::{ComplexityLevel, ExperienceLevel, ParseLevelError, Urgency};
pub use patient::Patient;
pub use procedure::MedicalProcedure;
pub use room::{OperatingRoom, SurgeryBooking};
pub use schedule::{Schedule, STALE_FITNESS};
