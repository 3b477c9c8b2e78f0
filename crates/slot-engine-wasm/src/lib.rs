//! WASM bindings for slot-engine.
//!
//! Exposes slot computation and host assignment to the booking front end via
//! `wasm-bindgen`. Requests and responses cross the boundary as JSON strings.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir web/src/wasm/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slot_engine::{
    Assignment, AssignmentMethod, BookingLinkConfig, BookingsByMember, CandidateSlot,
    ExistingBooking, TeamPool,
};
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Request / response shapes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SlotsRequest {
    config: BookingLinkConfig,
    #[serde(default)]
    bookings: Vec<ExistingBooking>,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    /// JavaScript has no access to a trusted clock here, so `now` is required.
    now: DateTime<Utc>,
    #[serde(default)]
    include_rejected: bool,
}

#[derive(Deserialize)]
struct AssignRequest {
    pool: TeamPool,
    slot: CandidateSlot,
    assignment: AssignmentMethod,
    #[serde(default)]
    member_bookings: Option<BookingsByMember>,
    #[serde(default)]
    config: Option<BookingLinkConfig>,
}

#[derive(Serialize)]
struct AssignResponse {
    assignment: Assignment,
    pool: TeamPool,
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

// ---------------------------------------------------------------------------
// JSON core, shared by the exports and native tests
// ---------------------------------------------------------------------------

/// Compute slots for a `SlotsRequest` JSON document.
pub fn compute_slots_json(request_json: &str) -> Result<String, String> {
    let request: SlotsRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid request JSON: {}", e))?;

    let compute = if request.include_rejected {
        slot_engine::compute_slot_grid
    } else {
        slot_engine::compute_available_slots
    };
    let slots = compute(
        &request.config,
        &request.bookings,
        request.range_start,
        request.range_end,
        request.now,
    )
    .map_err(|e| e.to_string())?;

    serde_json::to_string(&slots).map_err(|e| format!("Serialization error: {}", e))
}

/// Assign a host for an `AssignRequest` JSON document and return the
/// assignment together with the updated pool.
pub fn assign_host_json(request_json: &str) -> Result<String, String> {
    let mut request: AssignRequest =
        serde_json::from_str(request_json).map_err(|e| format!("Invalid request JSON: {}", e))?;

    if let (Some(bookings), Some(config)) = (&request.member_bookings, &request.config) {
        config.validate().map_err(|e| e.to_string())?;
        request
            .pool
            .refresh_availability(bookings, &request.slot, config);
    }

    let assignment = slot_engine::assign_host(&mut request.pool, &request.slot, &request.assignment)
        .map_err(|e| e.to_string())?;

    serde_json::to_string(&AssignResponse {
        assignment,
        pool: request.pool,
    })
    .map_err(|e| format!("Serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Compute offerable slots for a booking link.
///
/// `request_json` holds `config`, `bookings`, `range_start`, `range_end`,
/// `now` and an optional `include_rejected` flag. Returns a JSON array of
/// `{start, end, available, rejection?}` objects.
#[wasm_bindgen(js_name = "computeAvailableSlots")]
pub fn compute_available_slots(request_json: &str) -> Result<String, JsValue> {
    compute_slots_json(request_json).map_err(|e| js_error("computeAvailableSlots", e))
}

/// Pick the team member for a slot.
///
/// `request_json` holds `pool`, `slot`, `assignment` and optionally
/// `member_bookings` with `config`. Returns `{assignment, pool}`; the caller
/// must persist the pool with the booking.
#[wasm_bindgen(js_name = "assignHost")]
pub fn assign_host(request_json: &str) -> Result<String, JsValue> {
    assign_host_json(request_json).map_err(|e| js_error("assignHost", e))
}
