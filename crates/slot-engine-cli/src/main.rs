//! `slots` CLI — compute booking slots and assign team hosts from JSON.
//!
//! ## Usage
//!
//! ```sh
//! # Offerable slots for a link (stdin → stdout)
//! slots available < request.json
//!
//! # Full grid, including rejected candidates and the reason
//! slots available -i request.json --all
//!
//! # Pick a team member for a slot and print the updated pool
//! slots assign -i assign.json -o result.json
//!
//! # Check a booking link config
//! slots validate -i link.json
//! ```
//!
//! Logs go to stderr; `RUST_LOG` overrides the level chosen by `-v`.

use std::collections::BTreeMap;
use std::io::{self, Read};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use slot_engine::{
    assign_host, compute_available_slots, compute_slot_grid, compute_team_slots, group_by_host,
    Assignment, AssignmentMethod, BookingLinkConfig, BookingsByMember, CandidateSlot,
    ExistingBooking, TeamPool,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Booking slot availability and team host assignment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute offerable slots for a booking link
    Available {
        /// Request file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Include rejected candidates with their rejection reason
        #[arg(long, conflicts_with = "team")]
        all: bool,
        /// Treat the request as a team link and list free members per slot
        #[arg(long)]
        team: bool,
    },
    /// Assign a team member to a slot
    Assign {
        /// Request file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Validate a booking link config
    Validate {
        /// Config file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

/// Input of `slots available`.
#[derive(Deserialize)]
struct AvailabilityRequest {
    config: BookingLinkConfig,
    #[serde(default)]
    bookings: Vec<ExistingBooking>,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    /// Defaults to the current time.
    #[serde(default)]
    now: Option<DateTime<Utc>>,
    /// Team members for `--team`; bookings are matched by `host_id`.
    #[serde(default)]
    members: Vec<String>,
}

/// Input of `slots assign`.
#[derive(Deserialize)]
struct AssignRequest {
    pool: TeamPool,
    slot: CandidateSlot,
    assignment: AssignmentMethod,
    /// When present together with `config`, member availability is derived
    /// from these bookings instead of trusting the pool's flags.
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

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Available {
            input,
            output,
            all,
            team,
        } => {
            let request: AvailabilityRequest = read_json(input.as_deref())?;
            let now = request.now.unwrap_or_else(Utc::now);
            debug!(%now, bookings = request.bookings.len(), "computing availability");

            let json = if team {
                let mut members: BookingsByMember = request
                    .members
                    .iter()
                    .map(|id| (id.clone(), Vec::new()))
                    .collect::<BTreeMap<_, _>>();
                for (host, bookings) in group_by_host(&request.bookings) {
                    if let Some(entry) = members.get_mut(&host) {
                        *entry = bookings;
                    }
                }
                let slots = compute_team_slots(
                    &request.config,
                    &members,
                    request.range_start,
                    request.range_end,
                    now,
                )
                .context("Failed to compute team availability")?;
                info!(slots = slots.len(), members = members.len(), "team availability computed");
                serde_json::to_string_pretty(&slots)?
            } else {
                let compute = if all {
                    compute_slot_grid
                } else {
                    compute_available_slots
                };
                let slots = compute(
                    &request.config,
                    &request.bookings,
                    request.range_start,
                    request.range_end,
                    now,
                )
                .context("Failed to compute availability")?;
                info!(slots = slots.len(), "availability computed");
                serde_json::to_string_pretty(&slots)?
            };

            write_output(output.as_deref(), &json)?;
        }
        Commands::Assign { input, output } => {
            let mut request: AssignRequest = read_json(input.as_deref())?;

            if let (Some(bookings), Some(config)) = (&request.member_bookings, &request.config) {
                config.validate().context("Invalid booking link config")?;
                request
                    .pool
                    .refresh_availability(bookings, &request.slot, config);
            }

            let assignment = assign_host(&mut request.pool, &request.slot, &request.assignment)
                .context("Failed to assign a host")?;
            info!(member = %assignment.member_id, "host assigned");

            let response = AssignResponse {
                assignment,
                pool: request.pool,
            };
            write_output(output.as_deref(), &serde_json::to_string_pretty(&response)?)?;
        }
        Commands::Validate { input } => {
            let raw = read_input(input.as_deref())?;
            let config = BookingLinkConfig::from_json(&raw).context("Invalid booking link config")?;
            let tz = config.validate()?;
            println!("valid: {} minute slots in {}", config.duration_minutes, tz);
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn read_json<T: for<'de> Deserialize<'de>>(path: Option<&str>) -> Result<T> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).context("Failed to parse request JSON")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
