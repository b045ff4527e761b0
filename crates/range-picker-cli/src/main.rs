use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use range_picker::{
    clamp_end, compute_field_errors, inclusive_day_span, period_to_range, ActiveField,
    DisplayZone, FieldText, Instant, LocalZone, RangeConstraints, TimeMode,
};
use serde_json::json;

/// Exit status of `validate` when any field has an error.
const EXIT_FIELD_ERRORS: u8 = 2;

#[derive(Parser)]
#[command(
    name = "rangepick",
    version,
    about = "Resolve period tokens, clamp spans and validate date/time ranges"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a period token such as `15m`, `6h` or `7d` into a range
    Period {
        /// `<n><unit>` with unit one of m, h, d
        token: String,
        /// End of the range (RFC 3339); defaults to the current time
        #[arg(long, value_parser = parse_instant)]
        now: Option<Instant>,
    },
    /// Pull the end of a range back so it spans at most N calendar days
    Clamp {
        #[arg(long, value_parser = parse_instant)]
        start: Instant,
        #[arg(long, value_parser = parse_instant)]
        end: Instant,
        #[arg(long)]
        max_days: u32,
        #[command(flatten)]
        zone: ZoneArgs,
    },
    /// Check the four text fields of a range and print per-field errors
    Validate {
        #[arg(long)]
        start_date: String,
        #[arg(long)]
        start_time: String,
        #[arg(long)]
        end_date: String,
        #[arg(long)]
        end_time: String,
        /// The endpoint being edited; ordering errors are reported on the other one
        #[arg(long, value_enum, default_value_t = Endpoint::Start)]
        active: Endpoint,
        /// Earliest selectable instant (RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        min: Option<Instant>,
        /// Latest selectable instant (RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        max: Option<Instant>,
        #[command(flatten)]
        zone: ZoneArgs,
    },
}

#[derive(clap::Args)]
struct ZoneArgs {
    /// Interpret wall-clock values as local or UTC time
    #[arg(long, default_value = "utc")]
    mode: TimeMode,
    /// Local zone: `system`, an offset such as `+02:00`, or an IANA name
    #[arg(long, default_value = "system")]
    zone: LocalZone,
}

impl ZoneArgs {
    fn display_zone(&self) -> DisplayZone {
        DisplayZone::new(self.mode, self.zone)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Endpoint {
    Start,
    End,
}

impl From<Endpoint> for ActiveField {
    fn from(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Start => ActiveField::Start,
            Endpoint::End => ActiveField::End,
        }
    }
}

fn parse_instant(s: &str) -> std::result::Result<Instant, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Period { token, now } => {
            let end = now.unwrap_or_else(Utc::now);
            let (start, end) = period_to_range(&token, end)
                .ok_or_else(|| anyhow!("invalid period token '{token}'"))?;
            print_json(&json!({ "start": start, "end": end }))?;
        }
        Commands::Clamp {
            start,
            end,
            max_days,
            zone,
        } => {
            let zone = zone.display_zone();
            let clamped = clamp_end(start, end, Some(max_days), &zone);
            print_json(&json!({
                "start": start,
                "end": clamped,
                "clamped": clamped != end,
                "days": inclusive_day_span(&start, &clamped, &zone),
            }))?;
        }
        Commands::Validate {
            start_date,
            start_time,
            end_date,
            end_time,
            active,
            min,
            max,
            zone,
        } => {
            let constraints = RangeConstraints {
                min_date: min,
                max_date: max,
                max_range_in_days: None,
            };
            let errors = compute_field_errors(
                &FieldText::new(start_date, start_time),
                &FieldText::new(end_date, end_time),
                &constraints,
                active.into(),
                &zone.display_zone(),
            );
            print_json(&errors)?;
            if !errors.is_clear() {
                return Ok(ExitCode::from(EXIT_FIELD_ERRORS));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{text}");
    Ok(())
}
