//! Property-based tests for slot generation and round-robin fairness.
//!
//! These hold for any valid link configuration and booking set, not just the
//! hand-picked cases in `availability_tests.rs`.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use slot_engine::{
    assign_host, compute_available_slots, AssignmentMethod, BookingLinkConfig, CandidateSlot,
    ExistingBooking, TeamMember, TeamPool, WorkingHours,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap()
}

fn arb_timezone() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("UTC".to_string()),
        Just("America/New_York".to_string()),
        Just("Europe/Berlin".to_string()),
        Just("Asia/Kolkata".to_string()),
    ]
}

fn arb_config() -> impl Strategy<Value = BookingLinkConfig> {
    (
        prop_oneof![Just(15u32), Just(30), Just(45), Just(60), Just(90)],
        prop_oneof![Just(10u32), Just(15), Just(30), Just(60)],
        (6u32..=11, 13u32..=20),
        (0u32..=30, 0u32..=30),
        0u32..=600,
        0u32..=3,
        arb_timezone(),
    )
        .prop_map(|(duration, increment, (open, close), (before, after), lead, cap, tz)| {
            let mut config = BookingLinkConfig::new(duration, &tz);
            config.start_time_increment_minutes = increment;
            config.working_hours = WorkingHours::new((open, 0), (close, 0)).unwrap();
            config.buffer_before_minutes = before;
            config.buffer_after_minutes = after;
            config.lead_time_minutes = lead;
            config.max_bookings_per_day = cap;
            config
        })
}

/// Bookings within the first week after `base()`, in 5-minute units.
fn arb_bookings() -> impl Strategy<Value = Vec<ExistingBooking>> {
    prop::collection::vec((0i64..2016, 1i64..=24, any::<bool>()), 0..12).prop_map(|raw| {
        raw.into_iter()
            .map(|(offset, len, confirmed)| {
                let start = base() + Duration::minutes(offset * 5);
                let end = start + Duration::minutes(len * 5);
                if confirmed {
                    ExistingBooking::confirmed(start, end)
                } else {
                    ExistingBooking::cancelled(start, end)
                }
            })
            .collect()
    })
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    }
}

fn slots_for(
    config: &BookingLinkConfig,
    bookings: &[ExistingBooking],
    now_offset: i64,
) -> Vec<CandidateSlot> {
    let now = base() + Duration::minutes(now_offset);
    compute_available_slots(config, bookings, base(), base() + Duration::days(7), now)
        .expect("generated configs are valid")
}

// ---------------------------------------------------------------------------
// Property 1: every slot has the configured duration
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn every_slot_has_configured_duration(
        cfg in arb_config(),
        bookings in arb_bookings(),
        now_offset in -1440i64..2880,
    ) {
        for slot in slots_for(&cfg, &bookings, now_offset) {
            prop_assert_eq!(
                slot.end - slot.start,
                Duration::minutes(i64::from(cfg.duration_minutes))
            );
            prop_assert!(slot.available);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: no slot overlaps a buffered confirmed booking
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn no_slot_overlaps_buffered_booking(
        cfg in arb_config(),
        bookings in arb_bookings(),
        now_offset in -1440i64..2880,
    ) {
        let before = Duration::minutes(i64::from(cfg.buffer_before_minutes));
        let after = Duration::minutes(i64::from(cfg.buffer_after_minutes));
        for slot in slots_for(&cfg, &bookings, now_offset) {
            for booking in bookings.iter().filter(|b| b.is_blocking()) {
                let blocked_start = booking.start - before;
                let blocked_end = booking.end + after;
                prop_assert!(
                    !(slot.start < blocked_end && blocked_start < slot.end),
                    "slot {:?} overlaps booking {:?}",
                    slot,
                    booking
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 3: lead time is honoured
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn no_slot_starts_inside_lead_time(
        cfg in arb_config(),
        now_offset in -1440i64..2880,
    ) {
        let earliest = base()
            + Duration::minutes(now_offset)
            + Duration::minutes(i64::from(cfg.lead_time_minutes));
        for slot in slots_for(&cfg, &[], now_offset) {
            prop_assert!(slot.start >= earliest);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 4: output is sorted, duplicate-free and deterministic
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn output_is_sorted_unique_and_idempotent(
        cfg in arb_config(),
        bookings in arb_bookings(),
        now_offset in -1440i64..2880,
    ) {
        let first = slots_for(&cfg, &bookings, now_offset);
        let second = slots_for(&cfg, &bookings, now_offset);
        prop_assert_eq!(&first, &second);
        for pair in first.windows(2) {
            prop_assert!(pair[0].start < pair[1].start);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: round-robin spreads N assignments evenly over M members
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn round_robin_is_fair(members in 1usize..=8, calls in 0u32..=64) {
        let mut pool = TeamPool::new(
            (0..members).map(|i| TeamMember::new(format!("member-{i}"))).collect(),
        );
        let mut counts = vec![0u32; members];

        for i in 0..calls {
            let start = base() + Duration::minutes(30 * i64::from(i));
            let slot = CandidateSlot::open(start, start + Duration::minutes(30));
            let assignment = assign_host(&mut pool, &slot, &AssignmentMethod::RoundRobin).unwrap();
            let idx = pool.members.iter().position(|m| m.id == assignment.member_id).unwrap();
            counts[idx] += 1;
        }

        let floor = calls / members as u32;
        let ceil = calls.div_ceil(members as u32);
        for count in counts {
            prop_assert!(
                count == floor || count == ceil,
                "count {} not in [{}, {}]",
                count,
                floor,
                ceil
            );
        }
    }
}
