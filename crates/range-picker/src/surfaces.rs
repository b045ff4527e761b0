//! The presentation-facing side of a picker.
//!
//! [`SelectionSurfaces`] projects a [`RangeController`] into what each surface
//! draws (two text-input groups, a calendar, a period list, a timezone toggle)
//! and forwards raw UI events back to the controller. It makes no decisions of
//! its own: validation and clamping stay in the controller.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::controller::{AppliedRange, Notification, Phase, RangeController};
use crate::options::PickerOptions;
use crate::policy::{ActiveField, DayMarking, TextField};
use crate::temporal::{Instant, TimeMode};

// ── Collaborators ───────────────────────────────────────────────────────────

/// The page that owns the picker.
pub trait RangeObserver {
    /// A range was applied.
    fn on_change(&mut self, start: Instant, end: Instant);

    fn on_timezone_change(&mut self, _mode: TimeMode) {}

    /// A period was selected, or cleared when `token` is empty.
    fn on_period_change(&mut self, _token: &str) {}
}

/// Source of "now" for resolving quick-select periods.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Utc::now()
    }
}

impl<F: Fn() -> Instant> Clock for F {
    fn now(&self) -> Instant {
        self()
    }
}

// ── Events ──────────────────────────────────────────────────────────────────

/// A raw event from one of the surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    /// The calendar selection changed; `None` for an unselected end.
    CalendarChanged {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    TextChanged {
        field: TextField,
        value: String,
    },
    PeriodClicked {
        value: String,
    },
    TimezoneSelected(TimeMode),
    ApplyClicked,
}

// ── Projections ─────────────────────────────────────────────────────────────

/// One date/time input group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputGroupView {
    pub date_text: String,
    pub time_text: String,
    pub error: Option<String>,
}

/// What the calendar highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarView {
    pub start: Option<Instant>,
    pub end: Option<Instant>,
    pub start_day: Option<NaiveDate>,
    pub end_day: Option<NaiveDate>,
    pub min_day: Option<NaiveDate>,
    pub max_day: Option<NaiveDate>,
}

/// One entry of the period list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodItemView {
    pub label: String,
    pub value: String,
    pub selected: bool,
    pub locked: bool,
    pub disabled: bool,
}

/// One choice of the timezone toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimezoneChoice {
    pub mode: TimeMode,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimezoneView {
    pub mode: TimeMode,
    pub choices: Vec<TimezoneChoice>,
}

// ── Adapter ─────────────────────────────────────────────────────────────────

pub struct SelectionSurfaces<O, C = SystemClock> {
    controller: RangeController,
    observer: O,
    clock: C,
}

impl<O: RangeObserver, C: Clock> SelectionSurfaces<O, C> {
    /// Open a picker, taking "today" for the empty text fields from `clock`.
    pub fn open(options: PickerOptions, observer: O, clock: C) -> Self {
        let controller = RangeController::new(options, clock.now());
        Self {
            controller,
            observer,
            clock,
        }
    }

    pub fn controller(&self) -> &RangeController {
        &self.controller
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Close the picker, handing the observer back.
    pub fn close(self) -> O {
        self.observer
    }

    /// Forward one UI event to the controller and relay what it reports.
    ///
    /// Returns the applied range when the event was a successful Apply.
    pub fn dispatch(&mut self, event: SurfaceEvent) -> Option<AppliedRange> {
        log::trace!("surface event {event:?}");
        let notifications = match event {
            SurfaceEvent::CalendarChanged { start, end } => self.controller.pick_days(start, end),
            SurfaceEvent::TextChanged { field, value } => self.controller.edit_text(field, value),
            SurfaceEvent::PeriodClicked { value } => {
                let now = self.clock.now();
                self.controller.select_period(&value, now)
            }
            SurfaceEvent::TimezoneSelected(mode) => self.controller.set_time_mode(mode),
            SurfaceEvent::ApplyClicked => {
                let applied = self.controller.apply().ok()?;
                self.observer.on_change(applied.start, applied.end);
                return Some(applied);
            }
        };
        self.relay(notifications);
        None
    }

    fn relay(&mut self, notifications: Vec<Notification>) {
        for notification in notifications {
            match notification {
                Notification::TimezoneChanged { mode } => self.observer.on_timezone_change(mode),
                Notification::PeriodChanged { token } => self.observer.on_period_change(&token),
            }
        }
    }

    /// Apply is only offered while the range is valid.
    pub fn apply_enabled(&self) -> bool {
        self.controller.phase().can_apply()
    }

    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    pub fn inputs(&self, endpoint: ActiveField) -> InputGroupView {
        let state = self.controller.state();
        let text = state.text(endpoint);
        InputGroupView {
            date_text: text.date.clone(),
            time_text: text.time.clone(),
            error: state.errors.endpoint_message(endpoint),
        }
    }

    pub fn calendar(&self) -> CalendarView {
        let state = self.controller.state();
        let zone = self.controller.zone();
        let constraints = self.controller.constraints();
        let day = |instant: &Option<Instant>| instant.as_ref().map(|i| zone.calendar_date(i));
        CalendarView {
            start: state.start,
            end: state.end,
            start_day: day(&state.start),
            end_day: day(&state.end),
            min_day: day(&constraints.min_date),
            max_day: day(&constraints.max_date),
        }
    }

    pub fn day_marking(&self, day: NaiveDate) -> DayMarking {
        self.controller.mark_day(day)
    }

    pub fn periods(&self) -> Vec<PeriodItemView> {
        let selected = self.controller.selected_period();
        self.controller
            .period_options()
            .iter()
            .map(|option| PeriodItemView {
                label: option.label.clone(),
                value: option.value.clone(),
                selected: selected == Some(option.value.as_str()),
                locked: option.is_locked,
                disabled: option.is_disabled,
            })
            .collect()
    }

    pub fn selected_period(&self) -> Option<&str> {
        self.controller.selected_period()
    }

    pub fn timezone(&self) -> TimezoneView {
        let local_label = match self.controller.zone().local.name() {
            Some(name) => format!("Browser time ({name})"),
            None => "Browser time".to_string(),
        };
        TimezoneView {
            mode: self.controller.time_mode(),
            choices: vec![
                TimezoneChoice {
                    mode: TimeMode::Local,
                    label: local_label,
                },
                TimezoneChoice {
                    mode: TimeMode::Utc,
                    label: "UTC".to_string(),
                },
            ],
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
