//! Host selection for team booking links.
//!
//! [`assign_host`] works on an in-memory [`TeamPool`] snapshot. The caller
//! loads the snapshot, refreshes member availability for the requested slot,
//! assigns, and persists the updated pool in the same unit of work as the
//! booking commit. Concurrent assignments against one pool must be serialized
//! by the caller, or two of them can pick the same least-recently-used member.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::availability::CandidateSlot;
use crate::booking::BookingsByMember;
use crate::config::BookingLinkConfig;
use crate::error::{Result, SchedulingError};
use crate::interval::conflicts_with;

/// How a team link picks the member for an incoming booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "member_id", rename_all = "snake_case")]
pub enum AssignmentMethod {
    /// Strict least-recently-assigned rotation; weight is a repeat count.
    RoundRobin,
    /// Highest weight first, least-recently-assigned as tie-break.
    Pooled,
    /// A named member, no fallback.
    Specific(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    /// Priority for pooled links, consecutive turns for round-robin. Absent means 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
    #[serde(default)]
    pub last_assigned_at: Option<DateTime<Utc>>,
    /// Whether the member is free at the slot being assigned.
    #[serde(default = "available_by_default")]
    pub is_available: bool,
    /// Round-robin turns consumed in the member's current visit.
    #[serde(default)]
    pub turns_taken: u32,
}

fn available_by_default() -> bool {
    true
}

impl TeamMember {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            weight: None,
            last_assigned_at: None,
            is_available: true,
            turns_taken: 0,
        }
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn last_assigned(mut self, at: DateTime<Utc>) -> Self {
        self.last_assigned_at = Some(at);
        self
    }

    fn priority(&self) -> u32 {
        self.weight.unwrap_or(1)
    }

    /// Turns per rotation visit; a zero weight still gets one.
    fn turns_per_visit(&self) -> u32 {
        self.priority().max(1)
    }

    fn mid_visit(&self) -> bool {
        self.turns_taken > 0 && self.turns_taken < self.turns_per_visit()
    }
}

/// Ordered team members; order breaks every remaining tie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamPool {
    pub members: Vec<TeamMember>,
}

impl TeamPool {
    pub fn new(members: Vec<TeamMember>) -> Self {
        Self { members }
    }

    pub fn member(&self, id: &str) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Derive every member's `is_available` for `slot` from their confirmed
    /// bookings, expanded by the link buffers. Members with no entry in
    /// `bookings` are free.
    pub fn refresh_availability(
        &mut self,
        bookings: &BookingsByMember,
        slot: &CandidateSlot,
        config: &BookingLinkConfig,
    ) {
        let candidate = slot.interval();
        for member in &mut self.members {
            member.is_available = bookings.get(&member.id).is_none_or(|own| {
                !conflicts_with(&candidate, own, config.buffer_before(), config.buffer_after())
            });
        }
    }
}

/// The outcome of a successful assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub member_id: String,
    /// The slot start, now the member's `last_assigned_at`.
    pub assigned_at: DateTime<Utc>,
    pub previous_assigned_at: Option<DateTime<Utc>>,
}

/// Pick the member who receives a booking of `slot`.
///
/// On success the chosen member's `last_assigned_at` is set to the slot start
/// (and, for round-robin, its turn counter advances). On failure the pool is
/// left untouched.
///
/// # Errors
/// Returns `SchedulingError::HostUnavailable` when a specific member is busy
/// or not part of the pool, and `SchedulingError::NoAvailableHost` when no
/// member of the pool is free for pooled or round-robin selection.
pub fn assign_host(
    pool: &mut TeamPool,
    slot: &CandidateSlot,
    method: &AssignmentMethod,
) -> Result<Assignment> {
    let assignment = match method {
        AssignmentMethod::Specific(member_id) => {
            let idx = pool
                .members
                .iter()
                .position(|m| &m.id == member_id)
                .ok_or_else(|| {
                    SchedulingError::HostUnavailable(format!("{member_id} is not in the team pool"))
                })?;
            if !pool.members[idx].is_available {
                return Err(SchedulingError::HostUnavailable(format!(
                    "{member_id} has a conflicting booking at {}",
                    slot.start
                )));
            }
            stamp(&mut pool.members[idx], slot)
        }
        AssignmentMethod::Pooled => {
            let idx = pool
                .members
                .iter()
                .enumerate()
                .filter(|(_, m)| m.is_available)
                .min_by_key(|(idx, m)| (Reverse(m.priority()), m.last_assigned_at, *idx))
                .map(|(idx, _)| idx)
                .ok_or(SchedulingError::NoAvailableHost)?;
            stamp(&mut pool.members[idx], slot)
        }
        AssignmentMethod::RoundRobin => {
            let continuing = pool
                .members
                .iter()
                .position(|m| m.is_available && m.mid_visit());
            let idx = match continuing {
                Some(idx) => idx,
                None => pool
                    .members
                    .iter()
                    .enumerate()
                    .filter(|(_, m)| m.is_available)
                    .min_by_key(|(idx, m)| (m.last_assigned_at, *idx))
                    .map(|(idx, _)| idx)
                    .ok_or(SchedulingError::NoAvailableHost)?,
            };
            if continuing.is_some() {
                pool.members[idx].turns_taken += 1;
            } else {
                for member in &mut pool.members {
                    member.turns_taken = 0;
                }
                pool.members[idx].turns_taken = 1;
            }
            stamp(&mut pool.members[idx], slot)
        }
    };

    debug!(
        member = %assignment.member_id,
        ?method,
        slot_start = %slot.start,
        "assigned host"
    );
    Ok(assignment)
}

fn stamp(member: &mut TeamMember, slot: &CandidateSlot) -> Assignment {
    let previous_assigned_at = member.last_assigned_at.replace(slot.start);
    Assignment {
        member_id: member.id.clone(),
        assigned_at: slot.start,
        previous_assigned_at,
    }
}
