//! # slot-engine
//!
//! Booking-slot availability and team host assignment for Smart Scheduler.
//!
//! The engine is a set of pure functions over explicit inputs: a booking
//! link's configuration, the already-committed bookings of the responsible
//! host(s), a date range, and the current instant. It performs no I/O and
//! holds no global state; persisting bookings and serializing concurrent
//! commits is the caller's job.
//!
//! ## Modules
//!
//! - [`config`] — Booking link configuration and validation
//! - [`availability`] — Offerable slots for a link or a team
//! - [`assignment`] — Round-robin, pooled, and specific host selection
//! - [`interval`] — Half-open interval overlap and buffer expansion
//! - [`booking`] — Existing bookings read from persistence
//! - [`source`] — Persistence collaborator contracts
//! - [`dst`] — DST gap policies for wall-clock slot starts
//! - [`error`] — Error types

pub mod assignment;
pub mod availability;
pub mod booking;
pub mod config;
pub mod dst;
pub mod error;
pub mod interval;
pub mod source;

pub use assignment::{assign_host, Assignment, AssignmentMethod, TeamMember, TeamPool};
pub use availability::{
    compute_available_slots, compute_slot_grid, compute_team_slots, CandidateSlot, SlotRejection,
    TeamSlot,
};
pub use booking::{group_by_host, BookingStatus, BookingsByMember, ExistingBooking};
pub use config::{BookingLinkConfig, WorkingHours};
pub use dst::DstPolicy;
pub use error::{Result, SchedulingError};
pub use source::{available_slots_from_source, BookingSource, InMemoryBookings, SourceError};
