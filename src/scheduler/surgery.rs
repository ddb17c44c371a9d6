//! Greedy time-slot surgery allocator.
//!
//! # Algorithm
//!
//! 1. Keep patients needing surgery with a known procedure that are not
//!    already scheduled outside the period; sort by urgency (descending),
//!    then admission date (ascending). This order is fixed for the run.
//! 2. Drop every room booking inside the period, so re-planning the same
//!    period is idempotent.
//! 3. Walk every day, every slot of the working day. At each slot try the
//!    pending patients in priority order: the procedure must end before
//!    the working day does; a qualified surgeon must be available and
//!    unbooked; a room must be open and free for the whole interval.
//! 4. Under [`SlotPolicy::OnePerSlot`] the first placement ends the slot;
//!    under [`SlotPolicy::FillAllFreeResources`] placement continues.
//!
//! Infeasibility is not an error: whoever cannot be placed is returned,
//! and so is every surgical patient the allocator set aside in step 1.
//!
//! # Complexity
//! O(d × s × p × (u + r × b)) for d days, s slots/day, p patients,
//! u surgeons, r rooms, b bookings per room.
//!
//! # Reference
//! Pinedo (2016), "Scheduling", Ch. 4: Priority Dispatching

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{
    weekly_covers, Doctor, MedicalProcedure, OperatingRoom, Patient, Schedule, SchedulingPeriod,
    SurgeryBooking, TimeWindow,
};
use crate::validation::{
    validate_period, validate_procedures, validate_working_day, ValidationError,
    ValidationErrorKind,
};

/// How many surgeries may start in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotPolicy {
    /// At most one placement per slot across the whole facility.
    #[default]
    OnePerSlot,
    /// Keep placing patients while rooms and surgeons are free.
    FillAllFreeResources,
}

/// Allocator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Slot granularity (minutes).
    pub slot_minutes: i64,
    /// Start of the working day.
    pub day_start: NaiveTime,
    /// End of the working day; surgeries must finish by then.
    pub day_end: NaiveTime,
    /// Placements per slot.
    pub policy: SlotPolicy,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            day_start: NaiveTime::MIN + Duration::hours(8),
            day_end: NaiveTime::MIN + Duration::hours(17),
            policy: SlotPolicy::OnePerSlot,
        }
    }
}

impl AllocatorConfig {
    /// Sets the slot granularity.
    pub fn with_slot_minutes(mut self, minutes: i64) -> Self {
        self.slot_minutes = minutes;
        self
    }

    /// Sets the working hours.
    pub fn with_working_hours(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.day_start = start;
        self.day_end = end;
        self
    }

    /// Sets the slot policy.
    pub fn with_policy(mut self, policy: SlotPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Result of an allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationOutcome {
    /// Surgeries per day and room.
    pub schedule: Schedule,
    /// Every booking made, in placement order.
    pub bookings: Vec<SurgeryBooking>,
    /// Booked patients, stamped with start time, surgeon and room, in
    /// placement order.
    pub scheduled: Vec<Patient>,
    /// Patients left without a slot, in priority order.
    pub unscheduled: Vec<Patient>,
    /// Surgical patients never considered: unknown or missing procedure,
    /// or a surgery already fixed outside the period.
    pub skipped: Vec<Patient>,
    /// Rooms with the new bookings recorded.
    pub rooms: Vec<OperatingRoom>,
}

impl AllocationOutcome {
    /// Writes each booking (start, surgeon, room) onto the matching patient.
    pub fn stamp_patients(&self, patients: &mut [Patient]) {
        let by_patient: HashMap<&str, &SurgeryBooking> = self
            .bookings
            .iter()
            .map(|b| (b.patient_id.as_str(), b))
            .collect();
        for patient in patients {
            if let Some(b) = by_patient.get(patient.id.as_str()) {
                patient.stamp_surgery(b.window.start, &b.surgeon_id, &b.room_id);
            }
        }
    }
}

/// Greedy, time-ordered surgery scheduler.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use u_medsched::models::{Doctor, MedicalProcedure, OperatingRoom, Patient, SchedulingPeriod};
/// use u_medsched::scheduler::{AllocatorConfig, SurgeryAllocator};
///
/// let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let surgeons = vec![Doctor::new("S1", "Orthopedics").with_surgery_availability(vec![])];
/// let procedures = vec![MedicalProcedure::new("KNEE", "Orthopedics", 90)];
/// let patients = vec![Patient::new("P1", "Orthopedics").with_surgery("KNEE")];
/// let rooms = vec![OperatingRoom::new("OR1")];
///
/// let allocator = SurgeryAllocator::new(
///     SchedulingPeriod::single_day(monday),
///     &surgeons, &patients, &rooms, &procedures,
///     AllocatorConfig::default(),
/// ).unwrap();
/// let outcome = allocator.schedule();
/// assert_eq!(outcome.bookings.len(), 1);
/// assert!(outcome.unscheduled.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct SurgeryAllocator {
    period: SchedulingPeriod,
    config: AllocatorConfig,
    step: Duration,
    patients: Vec<Patient>,
    skipped: Vec<Patient>,
    surgeons: Vec<Doctor>,
    procedures: HashMap<String, MedicalProcedure>,
    rooms: Vec<OperatingRoom>,
}

impl SurgeryAllocator {
    /// Creates an allocator for a period.
    ///
    /// Fails if the period is empty, the working day is malformed or a
    /// procedure duration is out of range. Existing room bookings inside
    /// the period are dropped.
    pub fn new(
        period: SchedulingPeriod,
        doctors: &[Doctor],
        patients: &[Patient],
        rooms: &[OperatingRoom],
        procedures: &[MedicalProcedure],
        config: AllocatorConfig,
    ) -> Result<Self> {
        validate_period(&period)?;
        validate_working_day(config.day_start, config.day_end, config.slot_minutes)?;
        validate_procedures(procedures)?;
        let step = Duration::try_minutes(config.slot_minutes).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::InvalidSlotGranularity,
                format!("Slot of {} minutes is out of range", config.slot_minutes),
            )
        })?;

        let procedures: HashMap<String, MedicalProcedure> = procedures
            .iter()
            .map(|p| (p.id.clone(), p.clone()))
            .collect();

        let (mut pending, skipped): (Vec<Patient>, Vec<Patient>) = patients
            .iter()
            .filter(|p| p.needs_surgery)
            .cloned()
            .partition(|p| {
                let known = match p.required_procedure.as_deref() {
                    Some(id) if procedures.contains_key(id) => true,
                    Some(id) => {
                        warn!(patient = %p.id, procedure = id, "skipping patient with unknown procedure");
                        false
                    }
                    None => {
                        warn!(patient = %p.id, "skipping surgical patient without procedure");
                        false
                    }
                };
                let in_period = p
                    .surgery_date
                    .map_or(true, |start| period.contains_date(start.date()));
                if known && !in_period {
                    debug!(patient = %p.id, "surgery already fixed outside the period");
                }
                known && in_period
            });
        pending.sort_by(|a, b| {
            b.urgency
                .cmp(&a.urgency)
                .then(a.admission_date.cmp(&b.admission_date))
                .then_with(|| a.id.cmp(&b.id))
        });

        let surgeons: Vec<Doctor> = doctors
            .iter()
            .filter(|d| d.is_available_surgeon())
            .cloned()
            .collect();

        let mut rooms = rooms.to_vec();
        let purged: usize = rooms.iter_mut().map(|r| r.clear_period(&period)).sum();
        if purged > 0 {
            debug!(purged, "cleared existing bookings for re-planning");
        }

        Ok(Self {
            period,
            config,
            step,
            patients: pending,
            skipped,
            surgeons,
            procedures,
            rooms,
        })
    }

    /// Patients to schedule, in priority order.
    pub fn pending(&self) -> &[Patient] {
        &self.patients
    }

    /// Surgical patients set aside at construction.
    pub fn skipped(&self) -> &[Patient] {
        &self.skipped
    }

    /// Surgeons available for surgery.
    pub fn surgeons(&self) -> &[Doctor] {
        &self.surgeons
    }

    /// Rooms as they stand (period bookings cleared).
    pub fn rooms(&self) -> &[OperatingRoom] {
        &self.rooms
    }

    /// Runs the allocation.
    pub fn schedule(mut self) -> AllocationOutcome {
        let mut schedule = Schedule::new();
        let mut bookings = Vec::new();
        let mut scheduled = Vec::new();
        let mut pending = std::mem::take(&mut self.patients);

        for day in self.period.days() {
            let day_end = day.and_time(self.config.day_end);
            let mut slot = day.and_time(self.config.day_start);

            while slot < day_end && !pending.is_empty() {
                let mut idx = 0;
                while idx < pending.len() {
                    let Some(booking) = self.try_place(&pending[idx], slot, day_end) else {
                        idx += 1;
                        continue;
                    };
                    debug!(
                        patient = %booking.patient_id,
                        surgeon = %booking.surgeon_id,
                        room = %booking.room_id,
                        start = %booking.window.start,
                        "surgery booked"
                    );
                    schedule.record_surgery(day, &booking.room_id, &booking.patient_id);
                    if let Some(room) = self.rooms.iter_mut().find(|r| r.id == booking.room_id) {
                        room.book(booking.clone());
                    }
                    let mut patient = pending.remove(idx);
                    patient.stamp_surgery(
                        booking.window.start,
                        &booking.surgeon_id,
                        &booking.room_id,
                    );
                    scheduled.push(patient);
                    bookings.push(booking);

                    if self.config.policy == SlotPolicy::OnePerSlot {
                        break;
                    }
                }
                let Some(next) = slot.checked_add_signed(self.step) else {
                    break;
                };
                slot = next;
            }
        }

        info!(
            scheduled = bookings.len(),
            unscheduled = pending.len(),
            skipped = self.skipped.len(),
            "surgery allocation finished"
        );

        AllocationOutcome {
            schedule,
            bookings,
            scheduled,
            unscheduled: pending,
            skipped: self.skipped,
            rooms: self.rooms,
        }
    }

    /// Finds a surgeon and a room for the patient starting at `start`.
    fn try_place(
        &self,
        patient: &Patient,
        start: NaiveDateTime,
        day_end: NaiveDateTime,
    ) -> Option<SurgeryBooking> {
        let procedure = self.procedures.get(patient.required_procedure.as_deref()?)?;
        let end = start.checked_add_signed(procedure.duration()?)?;
        let window = TimeWindow::new(start, end);
        if window.end > day_end {
            return None;
        }

        let surgeon = self.surgeons.iter().find(|s| {
            s.has_specialization(&procedure.required_specialization)
                && s.experience >= procedure.min_experience
                && s.surgeon
                    .as_ref()
                    .is_some_and(|cap| weekly_covers(&cap.availability, &window))
                && !self.surgeon_busy(&s.id, &window)
        })?;
        let room = self.rooms.iter().find(|r| r.is_free(&window))?;

        Some(SurgeryBooking {
            patient_id: patient.id.clone(),
            surgeon_id: surgeon.id.clone(),
            room_id: room.id.clone(),
            window,
        })
    }

    fn surgeon_busy(&self, surgeon_id: &str, window: &TimeWindow) -> bool {
        self.rooms
            .iter()
            .flat_map(|r| r.bookings.iter())
            .any(|b| b.surgeon_id == surgeon_id && b.window.overlaps(window))
    }
}
