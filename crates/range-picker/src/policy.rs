//! Range policy: the invariants a candidate range must satisfy.
//!
//! Nothing here rejects a range outright. An over-long range is clamped
//! silently by [`clamp_end`]; every other violation is reported per text field
//! through [`compute_field_errors`] so the user can keep typing.

use chrono::{Days, Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::temporal::{format_date, validate_date, validate_time, DisplayZone, FieldText, Instant};

/// Retention above which the picker enforces a maximum span.
pub const RETENTION_SPAN_THRESHOLD_DAYS: u32 = 30;

// ── Constraints ─────────────────────────────────────────────────────────────

/// Externally supplied bounds on a selectable range.
///
/// Replaced as a whole, never patched field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeConstraints {
    pub min_date: Option<Instant>,
    pub max_date: Option<Instant>,
    pub max_range_in_days: Option<u32>,
}

impl RangeConstraints {
    /// Bounds for data kept `retention_days` days back from `now`.
    ///
    /// Long retentions also cap the selectable span at
    /// [`RETENTION_SPAN_THRESHOLD_DAYS`].
    pub fn for_retention(retention_days: u32, now: Instant) -> Self {
        Self {
            min_date: now.checked_sub_signed(Duration::days(i64::from(retention_days))),
            max_date: Some(now),
            max_range_in_days: (retention_days > RETENTION_SPAN_THRESHOLD_DAYS)
                .then_some(RETENTION_SPAN_THRESHOLD_DAYS),
        }
    }

    /// The span cap, with a zero cap treated as no cap.
    pub fn span_limit(&self) -> Option<u32> {
        self.max_range_in_days.filter(|days| *days > 0)
    }
}

/// The default selection for a retention window: the last 30 calendar days,
/// today included, from `today-29 00:00:00` to `today 23:59:59`.
///
/// Short retentions have no default selection.
pub fn retention_default_range(
    retention_days: u32,
    now: Instant,
    zone: &DisplayZone,
) -> Option<(Instant, Instant)> {
    if retention_days <= RETENTION_SPAN_THRESHOLD_DAYS {
        return None;
    }
    let today = zone.calendar_date(&now);
    let first = today.checked_sub_days(Days::new(u64::from(RETENTION_SPAN_THRESHOLD_DAYS - 1)))?;
    let last_second = NaiveTime::from_hms_opt(23, 59, 59)?;
    Some((
        zone.start_of_day(first),
        zone.resolve_lenient(&today.and_time(last_second)),
    ))
}

// ── clamp_end ───────────────────────────────────────────────────────────────

/// Number of calendar days touched by `[start, end]`, both ends included.
///
/// Order-insensitive: a backwards range has the same span as its reverse.
pub fn inclusive_day_span(start: &Instant, end: &Instant, zone: &DisplayZone) -> i64 {
    let start_date = zone.calendar_date(start);
    let end_date = zone.calendar_date(end);
    (end_date - start_date).num_days().abs() + 1
}

/// Pull `end` back so the inclusive day span from `start` is at most
/// `max_range_in_days`.
///
/// A clamped end lands on `start_date + (max_range_in_days - 1)` and keeps the
/// wall-clock time of day of the original `end`. An end already within the
/// span, or an unset (or zero) limit, returns `end` unchanged.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use range_picker::policy::clamp_end;
/// use range_picker::temporal::DisplayZone;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap();
/// let clamped = clamp_end(start, end, Some(3), &DisplayZone::utc());
/// assert_eq!(clamped, Utc.with_ymd_and_hms(2024, 1, 4, 15, 0, 0).unwrap());
/// ```
pub fn clamp_end(
    start: Instant,
    end: Instant,
    max_range_in_days: Option<u32>,
    zone: &DisplayZone,
) -> Instant {
    let Some(max_days) = max_range_in_days.filter(|days| *days > 0) else {
        return end;
    };
    if inclusive_day_span(&start, &end, zone) <= i64::from(max_days) {
        return end;
    }
    let start_date = zone.calendar_date(&start);
    match start_date.checked_add_days(Days::new(u64::from(max_days - 1))) {
        Some(last_date) => zone.move_to_date(&end, last_date),
        None => end,
    }
}

// ── Calendar day marking ────────────────────────────────────────────────────

/// How the calendar should present a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayMarking {
    Available,
    /// Before `min_date` or after `max_date`.
    OutOfBounds,
    /// Selecting this day as the end would exceed the span cap.
    MaxRangeExceeded,
}

/// Mark `day` for the calendar given the current start selection.
pub fn mark_day(
    day: NaiveDate,
    start: Option<&Instant>,
    constraints: &RangeConstraints,
    zone: &DisplayZone,
) -> DayMarking {
    let before_min = constraints
        .min_date
        .is_some_and(|min| day < zone.calendar_date(&min));
    let after_max = constraints
        .max_date
        .is_some_and(|max| day > zone.calendar_date(&max));
    if before_min || after_max {
        return DayMarking::OutOfBounds;
    }

    let (Some(start), Some(max_days)) = (start, constraints.span_limit()) else {
        return DayMarking::Available;
    };
    let start_date = zone.calendar_date(start);
    if day >= start_date && (day - start_date).num_days() >= i64::from(max_days) {
        DayMarking::MaxRangeExceeded
    } else {
        DayMarking::Available
    }
}

// ── Field errors ────────────────────────────────────────────────────────────

/// Which endpoint the user is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveField {
    #[default]
    Start,
    End,
}

/// One of the four editable text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    StartDate,
    StartTime,
    EndDate,
    EndTime,
}

impl TextField {
    pub fn endpoint(self) -> ActiveField {
        match self {
            TextField::StartDate | TextField::StartTime => ActiveField::Start,
            TextField::EndDate | TextField::EndTime => ActiveField::End,
        }
    }
}

/// Error taxonomy surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidFormat,
    OutOfBounds,
    OrderViolation,
}

/// A user-facing problem with one text field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("Invalid date format (YYYY-MM-DD)")]
    InvalidDate,

    #[error("Invalid time format (HH:MM)")]
    InvalidTime,

    #[error("Time does not exist in local timezone")]
    NonexistentTime,

    #[error("Cannot exceed {0}")]
    ExceedsMaxDate(String),

    #[error("Cannot precede {0}")]
    PrecedesMinDate(String),

    #[error("Cannot exceed end date")]
    ExceedsEndDate,

    #[error("Cannot precede start date")]
    PrecedesStartDate,
}

impl FieldError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FieldError::InvalidDate | FieldError::InvalidTime | FieldError::NonexistentTime => {
                ErrorKind::InvalidFormat
            }
            FieldError::ExceedsMaxDate(_) | FieldError::PrecedesMinDate(_) => {
                ErrorKind::OutOfBounds
            }
            FieldError::ExceedsEndDate | FieldError::PrecedesStartDate => {
                ErrorKind::OrderViolation
            }
        }
    }
}

impl Serialize for FieldError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-field errors of a candidate range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorSet {
    pub start_date: Option<FieldError>,
    pub start_time: Option<FieldError>,
    pub end_date: Option<FieldError>,
    pub end_time: Option<FieldError>,
}

impl ErrorSet {
    pub fn is_clear(&self) -> bool {
        self.start_date.is_none()
            && self.start_time.is_none()
            && self.end_date.is_none()
            && self.end_time.is_none()
    }

    pub fn get(&self, field: TextField) -> Option<&FieldError> {
        match field {
            TextField::StartDate => self.start_date.as_ref(),
            TextField::StartTime => self.start_time.as_ref(),
            TextField::EndDate => self.end_date.as_ref(),
            TextField::EndTime => self.end_time.as_ref(),
        }
    }

    /// Whether either field of `endpoint` has an error.
    pub fn endpoint_has_error(&self, endpoint: ActiveField) -> bool {
        match endpoint {
            ActiveField::Start => self.start_date.is_some() || self.start_time.is_some(),
            ActiveField::End => self.end_date.is_some() || self.end_time.is_some(),
        }
    }

    /// The message shown next to `endpoint`: the date error wins over the time error.
    pub fn endpoint_message(&self, endpoint: ActiveField) -> Option<String> {
        let (date, time) = match endpoint {
            ActiveField::Start => (&self.start_date, &self.start_time),
            ActiveField::End => (&self.end_date, &self.end_time),
        };
        date.as_ref().or(time.as_ref()).map(ToString::to_string)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextField, &FieldError)> {
        [
            (TextField::StartDate, &self.start_date),
            (TextField::StartTime, &self.start_time),
            (TextField::EndDate, &self.end_date),
            (TextField::EndTime, &self.end_time),
        ]
        .into_iter()
        .filter_map(|(field, error)| error.as_ref().map(|e| (field, e)))
    }
}

/// Outcome of checking one endpoint on its own.
struct EndpointCheck {
    date: Option<FieldError>,
    time: Option<FieldError>,
    instant: Option<Instant>,
}

fn check_endpoint(
    text: &FieldText,
    constraints: &RangeConstraints,
    zone: &DisplayZone,
) -> EndpointCheck {
    let date = (!validate_date(&text.date)).then_some(FieldError::InvalidDate);
    let time = (!validate_time(&text.time)).then_some(FieldError::InvalidTime);
    if date.is_some() || time.is_some() {
        return EndpointCheck {
            date,
            time,
            instant: None,
        };
    }

    match text.combine(zone) {
        Ok(instant) => EndpointCheck {
            date: check_bounds(&instant, constraints, zone),
            time: None,
            instant: Some(instant),
        },
        Err(_) => EndpointCheck {
            date: None,
            time: Some(FieldError::NonexistentTime),
            instant: None,
        },
    }
}

/// Bounds are compared by calendar date in the display zone.
fn check_bounds(
    instant: &Instant,
    constraints: &RangeConstraints,
    zone: &DisplayZone,
) -> Option<FieldError> {
    let date = zone.calendar_date(instant);
    if let Some(max) = &constraints.max_date {
        if date > zone.calendar_date(max) {
            return Some(FieldError::ExceedsMaxDate(format_date(max, zone)));
        }
    }
    if let Some(min) = &constraints.min_date {
        if date < zone.calendar_date(min) {
            return Some(FieldError::PrecedesMinDate(format_date(min, zone)));
        }
    }
    None
}

/// Validate the four text fields of a candidate range.
///
/// Checks run in order: the format of each field; then, for each endpoint whose
/// date and time both parse, its bounds against `min_date`/`max_date`; then,
/// only if no field has an error yet, `start <= end`. An ordering violation is
/// reported on the endpoint the user is *not* editing, so a half-typed value is
/// never blamed for disagreeing with its stale partner.
pub fn compute_field_errors(
    start: &FieldText,
    end: &FieldText,
    constraints: &RangeConstraints,
    active: ActiveField,
    zone: &DisplayZone,
) -> ErrorSet {
    let start_check = check_endpoint(start, constraints, zone);
    let end_check = check_endpoint(end, constraints, zone);

    let mut errors = ErrorSet {
        start_date: start_check.date,
        start_time: start_check.time,
        end_date: end_check.date,
        end_time: end_check.time,
    };

    if let (true, Some(start), Some(end)) =
        (errors.is_clear(), start_check.instant, end_check.instant)
    {
        if start > end {
            match active {
                ActiveField::Start => errors.end_date = Some(FieldError::PrecedesStartDate),
                ActiveField::End => errors.start_date = Some(FieldError::ExceedsEndDate),
            }
        }
    }

    log::trace!(
        "field errors for {start:?}..{end:?} (active {active:?}): {} error(s)",
        errors.iter().count()
    );
    errors
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{LocalZone, TimeMode};
    use chrono::{FixedOffset, TimeZone, Utc};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Instant {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn date(y: i32, mo: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap()
    }

    fn text(date: &str, time: &str) -> FieldText {
        FieldText::new(date, time)
    }

    fn january() -> RangeConstraints {
        RangeConstraints {
            min_date: Some(utc(2024, 1, 1, 0, 0)),
            max_date: Some(utc(2024, 1, 10, 0, 0)),
            max_range_in_days: Some(3),
        }
    }

    // ── clamp_end tests ─────────────────────────────────────────────────

    #[test]
    fn test_clamp_unset_limit_is_identity() {
        let zone = DisplayZone::utc();
        let (start, end) = (utc(2024, 1, 1, 0, 0), utc(2024, 3, 1, 0, 0));
        assert_eq!(clamp_end(start, end, None, &zone), end);
        assert_eq!(clamp_end(start, end, Some(0), &zone), end);
    }

    #[test]
    fn test_clamp_within_span_is_identity() {
        let zone = DisplayZone::utc();
        let (start, end) = (utc(2024, 1, 2, 8, 0), utc(2024, 1, 4, 23, 59));
        assert_eq!(clamp_end(start, end, Some(3), &zone), end);
    }

    #[test]
    fn test_clamp_over_span_keeps_time_of_day() {
        let zone = DisplayZone::utc();
        let clamped = clamp_end(utc(2024, 1, 2, 0, 0), utc(2024, 1, 8, 17, 45), Some(3), &zone);
        assert_eq!(clamped, utc(2024, 1, 4, 17, 45));
    }

    #[test]
    fn test_clamp_single_day_limit() {
        let zone = DisplayZone::utc();
        let clamped = clamp_end(utc(2024, 1, 2, 9, 0), utc(2024, 1, 5, 10, 0), Some(1), &zone);
        assert_eq!(clamped, utc(2024, 1, 2, 10, 0));
    }

    #[test]
    fn test_clamp_backwards_range_anchors_on_start() {
        let zone = DisplayZone::utc();
        let clamped = clamp_end(utc(2024, 1, 10, 0, 0), utc(2024, 1, 1, 6, 0), Some(3), &zone);
        assert_eq!(clamped, utc(2024, 1, 12, 6, 0));
    }

    #[test]
    fn test_clamp_uses_display_zone_calendar_days() {
        // 2024-01-01T23:00Z is already 2024-01-02 at UTC+2
        let zone = DisplayZone::new(
            TimeMode::Local,
            LocalZone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap()),
        );
        let start = utc(2024, 1, 1, 23, 0);
        let end = utc(2024, 1, 3, 12, 0);
        assert_eq!(inclusive_day_span(&start, &end, &zone), 2);
        assert_eq!(inclusive_day_span(&start, &end, &DisplayZone::utc()), 3);
        assert_eq!(clamp_end(start, end, Some(2), &zone), end);
        assert_eq!(clamp_end(start, end, Some(2), &DisplayZone::utc()), utc(2024, 1, 2, 12, 0));
    }

    // ── compute_field_errors tests ──────────────────────────────────────

    #[test]
    fn test_errors_clear_for_valid_range() {
        let errors = compute_field_errors(
            &text("2024-01-02", "00:00"),
            &text("2024-01-03", "23:59"),
            &january(),
            ActiveField::Start,
            &DisplayZone::utc(),
        );
        assert!(errors.is_clear());
    }

    #[test]
    fn test_errors_report_format_per_field() {
        let errors = compute_field_errors(
            &text("2024-13-01", "00:00"),
            &text("2024-01-03", "25:00"),
            &RangeConstraints::default(),
            ActiveField::Start,
            &DisplayZone::utc(),
        );
        assert_eq!(errors.start_date, Some(FieldError::InvalidDate));
        assert_eq!(errors.start_time, None);
        assert_eq!(errors.end_date, None);
        assert_eq!(errors.end_time, Some(FieldError::InvalidTime));
        assert_eq!(
            errors.start_date.as_ref().unwrap().to_string(),
            "Invalid date format (YYYY-MM-DD)"
        );
    }

    #[test]
    fn test_errors_report_bounds_with_formatted_dates() {
        let errors = compute_field_errors(
            &text("2023-12-31", "10:00"),
            &text("2024-01-11", "10:00"),
            &january(),
            ActiveField::End,
            &DisplayZone::utc(),
        );
        assert_eq!(
            errors.start_date.as_ref().map(ToString::to_string).as_deref(),
            Some("Cannot precede 2024-01-01")
        );
        assert_eq!(
            errors.end_date.as_ref().map(ToString::to_string).as_deref(),
            Some("Cannot exceed 2024-01-10")
        );
        assert_eq!(errors.start_date.as_ref().unwrap().kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn test_errors_bounds_are_date_granular() {
        // max_date is midnight of Jan 10, but any time on Jan 10 is accepted
        let errors = compute_field_errors(
            &text("2024-01-10", "00:00"),
            &text("2024-01-10", "23:59"),
            &january(),
            ActiveField::End,
            &DisplayZone::utc(),
        );
        assert!(errors.is_clear());
    }

    #[test]
    fn test_order_violation_blames_end_while_editing_start() {
        let errors = compute_field_errors(
            &text("2024-01-02", "00:00"),
            &text("2024-01-01", "00:00"),
            &RangeConstraints::default(),
            ActiveField::Start,
            &DisplayZone::utc(),
        );
        assert_eq!(errors.start_date, None);
        assert_eq!(errors.end_date, Some(FieldError::PrecedesStartDate));
        assert_eq!(
            errors.end_date.as_ref().unwrap().to_string(),
            "Cannot precede start date"
        );
    }

    #[test]
    fn test_order_violation_blames_start_while_editing_end() {
        let errors = compute_field_errors(
            &text("2024-01-02", "00:00"),
            &text("2024-01-01", "00:00"),
            &RangeConstraints::default(),
            ActiveField::End,
            &DisplayZone::utc(),
        );
        assert_eq!(errors.start_date, Some(FieldError::ExceedsEndDate));
        assert_eq!(errors.end_date, None);
        assert_eq!(errors.start_date.as_ref().unwrap().kind(), ErrorKind::OrderViolation);
    }

    #[test]
    fn test_order_check_skipped_when_any_field_invalid() {
        let errors = compute_field_errors(
            &text("2024-01-05", "00:00"),
            &text("2024-01-01", "0:0"),
            &RangeConstraints::default(),
            ActiveField::Start,
            &DisplayZone::utc(),
        );
        assert_eq!(errors.end_date, None);
        assert_eq!(errors.end_time, Some(FieldError::InvalidTime));
    }

    #[test]
    fn test_order_is_compared_by_instant_not_date() {
        let errors = compute_field_errors(
            &text("2024-01-02", "12:00"),
            &text("2024-01-02", "11:59"),
            &RangeConstraints::default(),
            ActiveField::End,
            &DisplayZone::utc(),
        );
        assert_eq!(errors.start_date, Some(FieldError::ExceedsEndDate));
    }

    #[test]
    fn test_nonexistent_local_time_is_time_error() {
        let zone = DisplayZone::new(TimeMode::Local, LocalZone::Named(chrono_tz::Europe::Paris));
        let errors = compute_field_errors(
            &text("2024-03-31", "02:15"),
            &text("2024-04-01", "00:00"),
            &RangeConstraints::default(),
            ActiveField::Start,
            &zone,
        );
        assert_eq!(errors.start_time, Some(FieldError::NonexistentTime));
        assert_eq!(errors.start_date, None);
    }

    #[test]
    fn test_endpoint_message_prefers_date_error() {
        let errors = ErrorSet {
            start_date: Some(FieldError::InvalidDate),
            start_time: Some(FieldError::InvalidTime),
            ..ErrorSet::default()
        };
        assert_eq!(
            errors.endpoint_message(ActiveField::Start).as_deref(),
            Some("Invalid date format (YYYY-MM-DD)")
        );
        assert_eq!(errors.endpoint_message(ActiveField::End), None);
        assert!(errors.endpoint_has_error(ActiveField::Start));
    }

    #[test]
    fn test_error_set_serializes_messages() {
        let errors = ErrorSet {
            end_date: Some(FieldError::ExceedsMaxDate("2024-01-10".to_string())),
            ..ErrorSet::default()
        };
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["end_date"], "Cannot exceed 2024-01-10");
        assert!(json["start_date"].is_null());
    }

    // ── mark_day tests ──────────────────────────────────────────────────

    #[test]
    fn test_mark_day_out_of_bounds() {
        let zone = DisplayZone::utc();
        assert_eq!(mark_day(date(2023, 12, 31), None, &january(), &zone), DayMarking::OutOfBounds);
        assert_eq!(mark_day(date(2024, 1, 11), None, &january(), &zone), DayMarking::OutOfBounds);
        assert_eq!(mark_day(date(2024, 1, 10), None, &january(), &zone), DayMarking::Available);
    }

    #[test]
    fn test_mark_day_max_range_from_start() {
        let zone = DisplayZone::utc();
        let start = utc(2024, 1, 2, 0, 0);
        assert_eq!(
            mark_day(date(2024, 1, 4), Some(&start), &january(), &zone),
            DayMarking::Available
        );
        assert_eq!(
            mark_day(date(2024, 1, 5), Some(&start), &january(), &zone),
            DayMarking::MaxRangeExceeded
        );
        assert_eq!(
            mark_day(date(2024, 1, 1), Some(&start), &january(), &zone),
            DayMarking::Available
        );
    }

    // ── retention tests ─────────────────────────────────────────────────

    #[test]
    fn test_retention_constraints() {
        let now = utc(2024, 3, 1, 12, 0);
        let long = RangeConstraints::for_retention(90, now);
        assert_eq!(long.max_range_in_days, Some(30));
        assert_eq!(long.max_date, Some(now));
        assert_eq!(long.min_date, Some(utc(2023, 12, 2, 12, 0)));

        let short = RangeConstraints::for_retention(15, now);
        assert_eq!(short.max_range_in_days, None);
    }

    #[test]
    fn test_retention_default_range_spans_thirty_days() {
        let now = utc(2024, 3, 1, 12, 0);
        let zone = DisplayZone::utc();
        let (start, end) = retention_default_range(90, now, &zone).unwrap();
        assert_eq!(start, utc(2024, 2, 1, 0, 0));
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap());
        assert_eq!(inclusive_day_span(&start, &end, &zone), 30);
        assert!(retention_default_range(30, now, &zone).is_none());
    }
}
