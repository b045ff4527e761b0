//! The range controller: one canonical [`RangeState`] behind three input surfaces.
//!
//! Every user event is a transition method that runs to completion and leaves
//! the state consistent. Instants are canonical; text is derived from them,
//! except right after a manual edit, when the typed text is the source and the
//! instants follow it wherever the text is valid.
//!
//! Transitions return the [`Notification`]s the page should hear about. A
//! finalized range is only ever produced by [`RangeController::apply`].

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{RangeError, Result};
use crate::options::{PeriodOption, PickerOptions};
use crate::policy::{
    clamp_end, compute_field_errors, mark_day, ActiveField, DayMarking, ErrorSet,
    RangeConstraints, TextField,
};
use crate::temporal::{format_date, period_to_range, DisplayZone, FieldText, Instant, TimeMode};

/// Start time text shown before anything is selected.
pub const DEFAULT_START_TIME: &str = "00:00";
/// End time text shown before anything is selected.
pub const DEFAULT_END_TIME: &str = "23:59";

const ENDPOINTS: [ActiveField; 2] = [ActiveField::Start, ActiveField::End];

// ── State ───────────────────────────────────────────────────────────────────

/// Where the picker stands, derived from its [`RangeState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No endpoint selected.
    Empty,
    /// Exactly one endpoint selected, e.g. between two calendar clicks.
    PartialSelection,
    /// Both endpoints selected and every field clear.
    Valid,
    /// At least one field has an error.
    Invalid,
}

impl Phase {
    pub fn can_apply(self) -> bool {
        self == Phase::Valid
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Empty => "empty",
            Phase::PartialSelection => "partially selected",
            Phase::Valid => "valid",
            Phase::Invalid => "invalid",
        })
    }
}

/// Which surface last changed the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastInteraction {
    /// Seeded from the page's default dates, or nothing yet.
    #[default]
    Default,
    Calendar,
    Input,
    Period,
}

/// The canonical range plus its editable text and per-field errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeState {
    pub start: Option<Instant>,
    pub end: Option<Instant>,
    pub start_text: FieldText,
    pub end_text: FieldText,
    pub errors: ErrorSet,
}

impl RangeState {
    pub fn phase(&self) -> Phase {
        if !self.errors.is_clear() {
            return Phase::Invalid;
        }
        match (self.start, self.end) {
            (Some(_), Some(_)) => Phase::Valid,
            (None, None) => Phase::Empty,
            _ => Phase::PartialSelection,
        }
    }

    pub fn instant(&self, endpoint: ActiveField) -> Option<Instant> {
        match endpoint {
            ActiveField::Start => self.start,
            ActiveField::End => self.end,
        }
    }

    pub fn text(&self, endpoint: ActiveField) -> &FieldText {
        match endpoint {
            ActiveField::Start => &self.start_text,
            ActiveField::End => &self.end_text,
        }
    }

    fn instant_mut(&mut self, endpoint: ActiveField) -> &mut Option<Instant> {
        match endpoint {
            ActiveField::Start => &mut self.start,
            ActiveField::End => &mut self.end,
        }
    }

    fn text_mut(&mut self, endpoint: ActiveField) -> &mut FieldText {
        match endpoint {
            ActiveField::Start => &mut self.start_text,
            ActiveField::End => &mut self.end_text,
        }
    }

    fn field_mut(&mut self, field: TextField) -> &mut String {
        match field {
            TextField::StartDate => &mut self.start_text.date,
            TextField::StartTime => &mut self.start_text.time,
            TextField::EndDate => &mut self.end_text.date,
            TextField::EndTime => &mut self.end_text.time,
        }
    }
}

/// Something the page listening to the picker should be told.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    TimezoneChanged { mode: TimeMode },
    /// A period was selected, or cleared when `token` is empty.
    PeriodChanged { token: String },
}

/// A range accepted by [`RangeController::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppliedRange {
    pub start: Instant,
    pub end: Instant,
}

// ── Controller ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RangeController {
    state: RangeState,
    zone: DisplayZone,
    constraints: RangeConstraints,
    period_options: Vec<PeriodOption>,
    selected_period: Option<String>,
    last_interaction: LastInteraction,
    active_field: ActiveField,
}

impl RangeController {
    /// Open a picker. `now` only decides which day the empty text fields show.
    pub fn new(options: PickerOptions, now: Instant) -> Self {
        let zone = options.display_zone();
        let today = format_date(&now, &zone);
        let mut controller = Self {
            state: RangeState {
                start_text: FieldText::new(today.clone(), DEFAULT_START_TIME),
                end_text: FieldText::new(today, DEFAULT_END_TIME),
                ..RangeState::default()
            },
            zone,
            constraints: options.constraints,
            period_options: options.period_options,
            selected_period: None,
            last_interaction: LastInteraction::Default,
            active_field: ActiveField::Start,
        };
        if let Some((start, end)) = options.default_dates {
            controller.seed(start, end);
        }
        controller
    }

    pub fn state(&self) -> &RangeState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn zone(&self) -> &DisplayZone {
        &self.zone
    }

    pub fn time_mode(&self) -> TimeMode {
        self.zone.mode
    }

    pub fn constraints(&self) -> &RangeConstraints {
        &self.constraints
    }

    pub fn period_options(&self) -> &[PeriodOption] {
        &self.period_options
    }

    /// The token of the selected quick period, if the range still is one.
    pub fn selected_period(&self) -> Option<&str> {
        self.selected_period.as_deref()
    }

    pub fn last_interaction(&self) -> LastInteraction {
        self.last_interaction
    }

    pub fn active_field(&self) -> ActiveField {
        self.active_field
    }

    /// How the calendar should present `day` given the current start.
    pub fn mark_day(&self, day: NaiveDate) -> DayMarking {
        mark_day(day, self.state.start.as_ref(), &self.constraints, &self.zone)
    }

    // ── Transitions ─────────────────────────────────────────────────────

    /// Load a page-supplied range. Goes straight to [`Phase::Valid`].
    pub fn seed(&mut self, start: Instant, end: Instant) {
        let (start, end) = ordered(start, end);
        self.load(start, end);
        self.last_interaction = LastInteraction::Default;
        log::debug!("seeded range {start} .. {end}");
    }

    /// A calendar selection of `[start, end]`, `[start, none]` or nothing.
    ///
    /// A complete pick is ordered, clamped to the span cap and rendered into
    /// both text groups. A pick without a start clears the selection but
    /// leaves the text as typed.
    pub fn pick_range(&mut self, start: Option<Instant>, end: Option<Instant>) -> Vec<Notification> {
        self.last_interaction = LastInteraction::Calendar;
        let notifications = self.clear_period();

        match (start, end) {
            (Some(start), Some(end)) => {
                let (start, end) = ordered(start, end);
                let clamped = clamp_end(start, end, self.constraints.span_limit(), &self.zone);
                if clamped != end {
                    log::debug!("clamped calendar end {end} -> {clamped}");
                }
                self.load(start, clamped);
            }
            (Some(start), None) => {
                self.state.start = Some(start);
                self.state.end = None;
                self.state.start_text = FieldText::render(&start, &self.zone);
                self.state.end_text.date.clear();
                self.state.errors = ErrorSet::default();
            }
            (None, _) => {
                self.state.start = None;
                self.state.end = None;
            }
        }

        log::debug!("calendar pick -> {}", self.phase());
        notifications
    }

    /// A calendar selection expressed in days of the display zone.
    ///
    /// The start day begins at 00:00 and the end day finishes at 23:59.
    pub fn pick_days(
        &mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<Notification> {
        let start = start.map(|day| self.zone.start_of_day(day));
        let end = end
            .and_then(|day| day.and_hms_opt(23, 59, 0))
            .map(|naive| self.zone.resolve_lenient(&naive));
        self.pick_range(start, end)
    }

    /// A keystroke in one of the four text fields.
    ///
    /// Errors are recomputed with the edited endpoint as the active one, and
    /// each endpoint whose own fields are clear takes the instant its text
    /// denotes. An endpoint with an error keeps its previous instant.
    pub fn edit_text(&mut self, field: TextField, value: impl Into<String>) -> Vec<Notification> {
        self.last_interaction = LastInteraction::Input;
        self.active_field = field.endpoint();
        *self.state.field_mut(field) = value.into();

        self.revalidate(&[]);
        let notifications = self.clear_period();

        log::debug!("edited {field:?} -> {}", self.phase());
        notifications
    }

    /// A click on a quick-select period, resolved against `now`.
    ///
    /// Malformed tokens and locked or disabled options change nothing.
    pub fn select_period(&mut self, token: &str, now: Instant) -> Vec<Notification> {
        let blocked = self
            .period_options
            .iter()
            .any(|option| option.value == token && !option.is_selectable());
        if blocked {
            log::debug!("period '{token}' is not selectable");
            return Vec::new();
        }
        let Some((start, end)) = period_to_range(token, now) else {
            log::debug!("ignoring malformed period '{token}'");
            return Vec::new();
        };

        self.load(start, end);
        self.last_interaction = LastInteraction::Period;
        self.selected_period = Some(token.to_string());

        log::debug!("period '{token}' -> {start} .. {end}");
        vec![Notification::PeriodChanged {
            token: token.to_string(),
        }]
    }

    pub fn toggle_time_mode(&mut self) -> Vec<Notification> {
        self.set_time_mode(self.zone.mode.toggled())
    }

    /// Switch between local and UTC rendering.
    ///
    /// After a manual edit the typed literals stay and are reinterpreted in the
    /// new mode. A literal that is ambiguous or skipped in the new mode keeps
    /// its previous instant and is re-rendered from it instead. After any other
    /// interaction the text is re-rendered from the instants.
    pub fn set_time_mode(&mut self, mode: TimeMode) -> Vec<Notification> {
        if mode == self.zone.mode {
            return Vec::new();
        }
        self.zone = self.zone.with_mode(mode);

        match self.last_interaction {
            LastInteraction::Input => self.reinterpret_text(),
            _ => self.rerender_text(),
        }

        log::debug!("time mode {mode} -> {}", self.phase());
        vec![Notification::TimezoneChanged { mode }]
    }

    /// Replace the constraints as a whole.
    ///
    /// Typed text is revalidated and may move its instants. A complete range
    /// from any other surface is only rechecked, so a tighter bound turns it
    /// [`Phase::Invalid`] instead of silently shifting it.
    pub fn set_constraints(&mut self, constraints: RangeConstraints) {
        self.constraints = constraints;
        match self.last_interaction {
            LastInteraction::Input => self.revalidate(&[]),
            _ if self.state.start.is_some() && self.state.end.is_some() => {
                self.revalidate(&ENDPOINTS)
            }
            _ => {}
        }
    }

    /// Finalize the range. Only a [`Phase::Valid`] picker can be applied.
    ///
    /// The end is clamped to the span cap once more, since typed ranges are
    /// not clamped while the user edits them.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::NotApplicable`] in any other phase.
    pub fn apply(&self) -> Result<AppliedRange> {
        let phase = self.phase();
        let (Phase::Valid, Some(start), Some(end)) = (phase, self.state.start, self.state.end)
        else {
            log::warn!("apply rejected while {phase}");
            return Err(RangeError::NotApplicable { phase });
        };

        let end = clamp_end(start, end, self.constraints.span_limit(), &self.zone);
        log::debug!("applied range {start} .. {end}");
        Ok(AppliedRange { start, end })
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn load(&mut self, start: Instant, end: Instant) {
        self.state.start = Some(start);
        self.state.end = Some(end);
        self.state.start_text = FieldText::render(&start, &self.zone);
        self.state.end_text = FieldText::render(&end, &self.zone);
        self.state.errors = ErrorSet::default();
    }

    fn clear_period(&mut self) -> Vec<Notification> {
        match self.selected_period.take() {
            Some(_) => vec![Notification::PeriodChanged {
                token: String::new(),
            }],
            None => Vec::new(),
        }
    }

    /// Recompute errors, then move every endpoint not in `keep` whose own
    /// fields are clear to the instant its text denotes.
    ///
    /// Text that still reads exactly as its instant renders was not edited and
    /// leaves the instant alone: the rendering drops seconds and cannot tell
    /// the two sides of a DST fold apart.
    fn revalidate(&mut self, keep: &[ActiveField]) {
        self.state.errors = compute_field_errors(
            &self.state.start_text,
            &self.state.end_text,
            &self.constraints,
            self.active_field,
            &self.zone,
        );

        for endpoint in ENDPOINTS {
            if keep.contains(&endpoint) || self.state.errors.endpoint_has_error(endpoint) {
                continue;
            }
            let text = self.state.text(endpoint);
            let unedited = self
                .state
                .instant(endpoint)
                .is_some_and(|instant| FieldText::render(&instant, &self.zone) == *text);
            if unedited {
                continue;
            }
            if let Ok(instant) = text.combine(&self.zone) {
                *self.state.instant_mut(endpoint) = Some(instant);
            }
        }
    }

    fn rerender_text(&mut self) {
        for endpoint in ENDPOINTS {
            if let Some(instant) = self.state.instant(endpoint) {
                *self.state.text_mut(endpoint) = FieldText::render(&instant, &self.zone);
            }
        }
    }

    fn reinterpret_text(&mut self) {
        let mut keep = Vec::new();
        for endpoint in ENDPOINTS {
            let Some(naive) = self.state.text(endpoint).wall_clock() else {
                continue;
            };
            if self.zone.resolve(&naive).single().is_some() {
                continue;
            }
            if let Some(prior) = self.state.instant(endpoint) {
                log::trace!("{endpoint:?} literal {naive} is not unique, keeping {prior}");
                *self.state.text_mut(endpoint) = FieldText::render(&prior, &self.zone);
                keep.push(endpoint);
            }
        }
        self.revalidate(&keep);
    }
}

fn ordered(a: Instant, b: Instant) -> (Instant, Instant) {
    if b < a {
        (b, a)
    } else {
        (a, b)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
