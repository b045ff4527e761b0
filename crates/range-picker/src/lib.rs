//! # range-picker
//!
//! Date/time range selection for "filter by period" controls.
//!
//! A range picker has three ways to choose the same range: a calendar, four
//! free-text date/time fields, and a list of quick-select periods such as
//! "last 15 minutes". This crate keeps them in agreement. It enforces timezone
//! semantics, historical bounds and a maximum span, and only ever hands out a
//! range that is complete and valid.
//!
//! ## Modules
//!
//! - [`temporal`] — Date/time text validation, local/UTC rendering, period tokens
//! - [`policy`] — Span clamping, per-field errors, calendar day marking, retention bounds
//! - [`options`] — What a page opens a picker with
//! - [`controller`] — The state machine that reconciles every input surface
//! - [`surfaces`] — Projections for the UI and routing of its events
//! - [`error`] — Error types

pub mod controller;
pub mod error;
pub mod options;
pub mod policy;
pub mod surfaces;
pub mod temporal;

pub use controller::{
    AppliedRange, LastInteraction, Notification, Phase, RangeController, RangeState,
};
pub use error::RangeError;
pub use options::{PeriodOption, PickerOptions};
pub use policy::{
    clamp_end, compute_field_errors, inclusive_day_span, mark_day, retention_default_range,
    ActiveField, DayMarking, ErrorKind, ErrorSet, FieldError, RangeConstraints, TextField,
};
pub use surfaces::{Clock, RangeObserver, SelectionSurfaces, SurfaceEvent, SystemClock};
pub use temporal::{
    combine_date_time, format_date, format_time, period_to_range, validate_date, validate_time,
    DisplayZone, FieldText, Instant, LocalZone, Period, PeriodUnit, TimeMode,
};
