//! Temporal primitives for range selection.
//!
//! Pure functions for validating date/time text, rendering instants as text,
//! combining text back into instants, and resolving quick-select periods. All
//! functions take explicit inputs (no system clock access): the caller provides
//! the reference "now" when a period is resolved, keeping these functions
//! deterministic and testable.
//!
//! Every conversion between an [`Instant`] and wall-clock text goes through a
//! [`DisplayZone`], which is the only place where the local-vs-UTC asymmetry
//! lives.
//!
//! # Functions
//!
//! - [`validate_date`] / [`validate_time`] — strict `YYYY-MM-DD` / `H:MM` checks
//! - [`format_date`] / [`format_time`] — render an instant in a display zone
//! - [`combine_date_time`] — date text + time text → instant
//! - [`period_to_range`] — `"15m"`, `"3h"`, `"7d"` → `[end - n·unit, end]`

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{RangeError, Result};

/// An absolute point in time, independent of the display zone.
pub type Instant = DateTime<Utc>;

// ── Time mode and zones ─────────────────────────────────────────────────────

/// How instants are rendered to and parsed from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    /// Wall-clock time of the configured [`LocalZone`].
    Local,
    /// Coordinated Universal Time.
    #[default]
    Utc,
}

impl TimeMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            TimeMode::Local => TimeMode::Utc,
            TimeMode::Utc => TimeMode::Local,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeMode::Local => "local",
            TimeMode::Utc => "utc",
        }
    }
}

impl fmt::Display for TimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeMode {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(TimeMode::Local),
            "utc" => Ok(TimeMode::Utc),
            _ => Err(RangeError::InvalidZone(format!(
                "unknown time mode '{s}' (expected 'local' or 'utc')"
            ))),
        }
    }
}

/// The zone that "local wall-clock time" refers to in [`TimeMode::Local`].
///
/// Parsed from `"system"`, a fixed offset such as `"+02:00"`, or an IANA name
/// such as `"Europe/Paris"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LocalZone {
    /// The host's zone, as reported by [`chrono::Local`].
    #[default]
    System,
    Fixed(FixedOffset),
    Named(Tz),
}

impl LocalZone {
    /// A human-facing zone name, if one is known.
    pub fn name(&self) -> Option<String> {
        match self {
            LocalZone::System => None,
            LocalZone::Fixed(offset) => Some(offset.to_string()),
            LocalZone::Named(tz) => Some(tz.name().to_string()),
        }
    }

    /// Wall-clock reading of `instant` in this zone.
    pub fn wall_clock(&self, instant: &Instant) -> NaiveDateTime {
        match self {
            LocalZone::System => instant.with_timezone(&Local).naive_local(),
            LocalZone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
            LocalZone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }

    /// Every instant whose wall-clock reading in this zone is `naive`.
    pub fn resolve(&self, naive: &NaiveDateTime) -> LocalResult<Instant> {
        match self {
            LocalZone::System => Local
                .from_local_datetime(naive)
                .map(|dt| dt.with_timezone(&Utc)),
            LocalZone::Fixed(offset) => offset
                .from_local_datetime(naive)
                .map(|dt| dt.with_timezone(&Utc)),
            LocalZone::Named(tz) => tz
                .from_local_datetime(naive)
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

impl fmt::Display for LocalZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalZone::System => f.write_str("system"),
            LocalZone::Fixed(offset) => write!(f, "{offset}"),
            LocalZone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

impl FromStr for LocalZone {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("system") || s.eq_ignore_ascii_case("local") {
            return Ok(LocalZone::System);
        }
        if s.starts_with('+') || s.starts_with('-') {
            return parse_fixed_offset(s).map(LocalZone::Fixed);
        }
        s.parse::<Tz>()
            .map(LocalZone::Named)
            .map_err(|_| RangeError::InvalidZone(format!("'{s}'")))
    }
}

impl TryFrom<String> for LocalZone {
    type Error = RangeError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<LocalZone> for String {
    fn from(zone: LocalZone) -> Self {
        zone.to_string()
    }
}

/// A [`TimeMode`] together with the [`LocalZone`] it falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayZone {
    pub mode: TimeMode,
    pub local: LocalZone,
}

impl DisplayZone {
    pub fn new(mode: TimeMode, local: LocalZone) -> Self {
        Self { mode, local }
    }

    pub fn utc() -> Self {
        Self::new(TimeMode::Utc, LocalZone::System)
    }

    /// The same local zone viewed under another mode.
    pub fn with_mode(self, mode: TimeMode) -> Self {
        Self { mode, ..self }
    }

    /// Wall-clock reading of `instant` under the current mode.
    pub fn wall_clock(&self, instant: &Instant) -> NaiveDateTime {
        match self.mode {
            TimeMode::Utc => instant.naive_utc(),
            TimeMode::Local => self.local.wall_clock(instant),
        }
    }

    /// Calendar date of `instant` under the current mode.
    pub fn calendar_date(&self, instant: &Instant) -> NaiveDate {
        self.wall_clock(instant).date()
    }

    /// Every instant whose wall-clock reading under the current mode is `naive`.
    pub fn resolve(&self, naive: &NaiveDateTime) -> LocalResult<Instant> {
        match self.mode {
            TimeMode::Utc => Utc.from_local_datetime(naive),
            TimeMode::Local => self.local.resolve(naive),
        }
    }

    /// Resolve `naive` to a single instant, never failing.
    ///
    /// Ambiguous readings take the earliest instant. Readings that fall into a
    /// forward gap are moved forward by one hour, the way wall clocks jump.
    pub fn resolve_lenient(&self, naive: &NaiveDateTime) -> Instant {
        if let Some(instant) = self.resolve(naive).earliest() {
            return instant;
        }
        let shifted = *naive + Duration::hours(1);
        self.resolve(&shifted)
            .earliest()
            .unwrap_or_else(|| naive.and_utc())
    }

    /// Midnight of `date` under the current mode.
    pub fn start_of_day(&self, date: NaiveDate) -> Instant {
        self.resolve_lenient(&date.and_time(NaiveTime::MIN))
    }

    /// `date` combined with the wall-clock time of day of `instant`.
    pub fn move_to_date(&self, instant: &Instant, date: NaiveDate) -> Instant {
        let time = self.wall_clock(instant).time();
        self.resolve_lenient(&date.and_time(time))
    }
}

// ── Field text ──────────────────────────────────────────────────────────────

/// The editable text of one range endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldText {
    pub date: String,
    pub time: String,
}

impl FieldText {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }

    /// Render `instant` as date and time text in `zone`.
    pub fn render(instant: &Instant, zone: &DisplayZone) -> Self {
        Self {
            date: format_date(instant, zone),
            time: format_time(instant, zone),
        }
    }

    /// Both parts pass their format checks.
    pub fn is_well_formed(&self) -> bool {
        validate_date(&self.date) && validate_time(&self.time)
    }

    /// The wall-clock literal this text denotes, if both parts are valid.
    pub fn wall_clock(&self) -> Option<NaiveDateTime> {
        Some(parse_date(&self.date)?.and_time(parse_time(&self.time)?))
    }

    /// See [`combine_date_time`].
    pub fn combine(&self, zone: &DisplayZone) -> Result<Instant> {
        combine_date_time(&self.date, &self.time, zone)
    }
}

// ── validate ────────────────────────────────────────────────────────────────

/// Check that `text` is a real calendar date written exactly as `YYYY-MM-DD`.
///
/// # Examples
///
/// ```
/// use range_picker::temporal::validate_date;
///
/// assert!(validate_date("2024-02-29"));
/// assert!(!validate_date("2023-02-29"));
/// assert!(!validate_date("2024-2-01"));
/// ```
pub fn validate_date(text: &str) -> bool {
    parse_date(text).is_some()
}

/// Check that `text` is a 24-hour `H:MM` or `HH:MM` time.
///
/// Seconds, AM/PM suffixes and surrounding whitespace are rejected.
pub fn validate_time(text: &str) -> bool {
    parse_time(text).is_some()
}

// ── format ──────────────────────────────────────────────────────────────────

/// Render the calendar date of `instant` as `YYYY-MM-DD` in `zone`.
pub fn format_date(instant: &Instant, zone: &DisplayZone) -> String {
    zone.wall_clock(instant).format("%Y-%m-%d").to_string()
}

/// Render the time of day of `instant` as zero-padded `HH:MM` in `zone`.
pub fn format_time(instant: &Instant, zone: &DisplayZone) -> String {
    zone.wall_clock(instant).format("%H:%M").to_string()
}

// ── combine_date_time ───────────────────────────────────────────────────────

/// Combine date and time text into an instant.
///
/// The literal is read as wall-clock time of the local zone in
/// [`TimeMode::Local`] and as UTC in [`TimeMode::Utc`]. A local literal that
/// occurs twice (clocks set back) resolves to the earlier instant.
///
/// # Errors
///
/// Returns [`RangeError::InvalidFormat`] if either part fails validation, or
/// [`RangeError::NonexistentLocalTime`] if the local literal falls into a
/// skipped interval (clocks set forward).
///
/// # Examples
///
/// ```
/// use range_picker::temporal::{combine_date_time, DisplayZone};
///
/// let instant = combine_date_time("2024-01-08", "9:30", &DisplayZone::utc()).unwrap();
/// assert_eq!(instant.to_rfc3339(), "2024-01-08T09:30:00+00:00");
/// ```
pub fn combine_date_time(date_text: &str, time_text: &str, zone: &DisplayZone) -> Result<Instant> {
    let date = parse_date(date_text).ok_or_else(|| {
        RangeError::InvalidFormat(format!("date '{date_text}' is not YYYY-MM-DD"))
    })?;
    let time = parse_time(time_text)
        .ok_or_else(|| RangeError::InvalidFormat(format!("time '{time_text}' is not HH:MM")))?;

    zone.resolve(&date.and_time(time)).earliest().ok_or_else(|| {
        RangeError::NonexistentLocalTime(format!(
            "'{date_text} {time_text}' in {}",
            zone.local
        ))
    })
}

// ── period_to_range ─────────────────────────────────────────────────────────

/// Unit of a quick-select period token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Minutes,
    Hours,
    Days,
}

impl PeriodUnit {
    pub fn millis(self) -> i64 {
        match self {
            PeriodUnit::Minutes => 60_000,
            PeriodUnit::Hours => 3_600_000,
            PeriodUnit::Days => 86_400_000,
        }
    }

    fn suffix(self) -> char {
        match self {
            PeriodUnit::Minutes => 'm',
            PeriodUnit::Hours => 'h',
            PeriodUnit::Days => 'd',
        }
    }

    fn noun(self) -> &'static str {
        match self {
            PeriodUnit::Minutes => "minute",
            PeriodUnit::Hours => "hour",
            PeriodUnit::Days => "day",
        }
    }
}

/// A parsed `<n><unit>` period token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    pub amount: i64,
    pub unit: PeriodUnit,
}

impl Period {
    /// Parse a token matching `^(\d+)([mhd])$`, case-insensitively.
    ///
    /// Returns `None` for malformed tokens, a zero amount, or an amount whose
    /// length in milliseconds does not fit in an `i64`.
    pub fn parse(token: &str) -> Option<Self> {
        let (split, unit) = token.char_indices().last()?;
        let digits = &token[..split];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let unit = match unit {
            'm' | 'M' => PeriodUnit::Minutes,
            'h' | 'H' => PeriodUnit::Hours,
            'd' | 'D' => PeriodUnit::Days,
            _ => return None,
        };
        let amount: i64 = digits.parse().ok()?;
        if amount == 0 {
            return None;
        }
        amount.checked_mul(unit.millis())?;
        Some(Self { amount, unit })
    }

    /// Length of the period in milliseconds.
    pub fn millis(&self) -> i64 {
        self.amount.saturating_mul(self.unit.millis())
    }

    /// Human-readable label (e.g., "Last 15 minutes").
    pub fn label(&self) -> String {
        let noun = self.unit.noun();
        if self.amount == 1 {
            format!("Last {noun}")
        } else {
            format!("Last {} {noun}s", self.amount)
        }
    }

    /// `[reference_end - period, reference_end]`, or `None` on underflow.
    pub fn range_ending_at(&self, reference_end: Instant) -> Option<(Instant, Instant)> {
        let start = reference_end.checked_sub_signed(Duration::milliseconds(self.millis()))?;
        Some((start, reference_end))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

/// Resolve a period token against an explicit reference end.
///
/// Returns `None` when the token is not a valid non-zero `<n><unit>` period.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use range_picker::temporal::period_to_range;
///
/// let end = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
/// let (start, _) = period_to_range("7d", end).unwrap();
/// assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
/// assert!(period_to_range("0m", end).is_none());
/// ```
pub fn period_to_range(token: &str, reference_end: Instant) -> Option<(Instant, Instant)> {
    Period::parse(token)?.range_ending_at(reference_end)
}

// ── Internal helpers ────────────────────────────────────────────────────────

/// Parse strict `YYYY-MM-DD` text into a calendar date.
pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !digits_ok {
        return None;
    }
    let year: i32 = text[0..4].parse().ok()?;
    let month: u32 = text[5..7].parse().ok()?;
    let day: u32 = text[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse strict `H:MM` / `HH:MM` text into a time of day.
pub(crate) fn parse_time(text: &str) -> Option<NaiveTime> {
    let (hour, minute) = text.split_once(':')?;
    let hour_ok = (1..=2).contains(&hour.len()) && hour.bytes().all(|b| b.is_ascii_digit());
    let minute_ok = minute.len() == 2 && minute.bytes().all(|b| b.is_ascii_digit());
    if !hour_ok || !minute_ok {
        return None;
    }
    NaiveTime::from_hms_opt(hour.parse().ok()?, minute.parse().ok()?, 0)
}

/// Parse a `±HH:MM` offset.
fn parse_fixed_offset(s: &str) -> Result<FixedOffset> {
    let invalid = || RangeError::InvalidZone(format!("offset '{s}' is not ±HH:MM"));

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

// ── Tests ───────────────────────────────────────────────────────────────────
