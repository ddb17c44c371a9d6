//! Operating room model.
//!
//! Rooms carry their weekly opening hours and the surgeries already
//! booked in them. Room suitability is generic: any room can host any
//! procedure.

use serde::{Deserialize, Serialize};

use super::{weekly_covers, SchedulingPeriod, TimeWindow, WeeklyWindow};

/// A booked surgery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeryBooking {
    /// Operated patient.
    pub patient_id: String,
    /// Operating surgeon.
    pub surgeon_id: String,
    /// Room the surgery takes place in.
    pub room_id: String,
    /// Booked interval.
    pub window: TimeWindow,
}

/// An operating room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingRoom {
    /// Unique room identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Weekly opening hours. Empty = always open.
    pub availability: Vec<WeeklyWindow>,
    /// Surgeries already booked.
    pub bookings: Vec<SurgeryBooking>,
}

impl OperatingRoom {
    /// Creates an always-open room with no bookings.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            availability: Vec::new(),
            bookings: Vec::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a weekly opening window.
    pub fn with_availability(mut self, window: WeeklyWindow) -> Self {
        self.availability.push(window);
        self
    }

    /// Whether the room is open and unbooked for the whole interval.
    pub fn is_free(&self, window: &TimeWindow) -> bool {
        weekly_covers(&self.availability, window)
            && !self.bookings.iter().any(|b| b.window.overlaps(window))
    }

    /// Records a booking.
    pub fn book(&mut self, booking: SurgeryBooking) {
        self.bookings.push(booking);
    }

    /// Drops every booking touching the period. Returns how many were removed.
    pub fn clear_period(&mut self, period: &SchedulingPeriod) -> usize {
        let before = self.bookings.len();
        self.bookings.retain(|b| !period.touches(&b.window));
        before - self.bookings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

    fn at(day: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn booking(day: u32, from: u32, to: u32) -> SurgeryBooking {
        SurgeryBooking {
            patient_id: "P1".into(),
            surgeon_id: "S1".into(),
            room_id: "OR1".into(),
            window: TimeWindow::new(at(day, from), at(day, to)),
        }
    }

    #[test]
    fn test_room_is_free() {
        let mut room = OperatingRoom::new("OR1");
        let w = TimeWindow::new(at(1, 9), at(1, 10));
        assert!(room.is_free(&w));
        room.book(booking(1, 8, 10));
        assert!(!room.is_free(&w));
        assert!(room.is_free(&TimeWindow::new(at(1, 10), at(1, 11))));
    }

    #[test]
    fn test_room_opening_hours() {
        let room = OperatingRoom::new("OR1").with_availability(WeeklyWindow::new(
            Weekday::Mon,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        ));
        assert!(room.is_free(&TimeWindow::new(at(1, 8), at(1, 12))));
        assert!(!room.is_free(&TimeWindow::new(at(1, 15), at(1, 17))));
        assert!(!room.is_free(&TimeWindow::new(at(2, 8), at(2, 9))));
    }

    #[test]
    fn test_clear_period() {
        let mut room = OperatingRoom::new("OR1");
        room.book(booking(1, 8, 10));
        room.book(booking(2, 8, 10));
        room.book(booking(3, 8, 10));
        let period = SchedulingPeriod::new(at(2, 0).date(), at(4, 0).date());
        assert_eq!(room.clear_period(&period), 2);
        assert_eq!(room.bookings.len(), 1);
        assert_eq!(room.bookings[0].window.start, at(1, 8));
    }
}
