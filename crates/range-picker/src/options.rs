//! Inputs a page supplies when it opens a picker.

use serde::{Deserialize, Serialize};

use crate::error::{RangeError, Result};
use crate::policy::RangeConstraints;
use crate::temporal::{DisplayZone, Instant, LocalZone, Period, TimeMode};

/// One entry of the quick-select period list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOption {
    pub label: String,
    /// A `<n><unit>` period token, unit one of `m`, `h`, `d`.
    pub value: String,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub is_disabled: bool,
}

impl PeriodOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            is_locked: false,
            is_disabled: false,
        }
    }

    /// An option labelled from its own token (e.g., "Last 15 minutes").
    pub fn from_token(token: &str) -> Result<Self> {
        let period = Period::parse(token)
            .ok_or_else(|| RangeError::InvalidPeriod(format!("'{token}'")))?;
        Ok(Self::new(period.label(), token))
    }

    pub fn locked(mut self) -> Self {
        self.is_locked = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.is_disabled = true;
        self
    }

    /// Locked and disabled options cannot be selected.
    pub fn is_selectable(&self) -> bool {
        !self.is_locked && !self.is_disabled
    }

    pub fn period(&self) -> Option<Period> {
        Period::parse(&self.value)
    }
}

/// Everything a picker is opened with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerOptions {
    /// Seeds the picker with an already-valid range.
    pub default_dates: Option<(Instant, Instant)>,
    pub constraints: RangeConstraints,
    pub period_options: Vec<PeriodOption>,
    pub time_mode: TimeMode,
    pub local_zone: LocalZone,
}

impl PickerOptions {
    /// Parse options from JSON, rejecting period options with malformed tokens.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::InvalidOptions`] if the JSON does not describe
    /// picker options, or [`RangeError::InvalidPeriod`] if a period option's
    /// value is not a `<n><unit>` token.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self =
            serde_json::from_str(json).map_err(|e| RangeError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every period option carries a usable token.
    pub fn validate(&self) -> Result<()> {
        match self.period_options.iter().find(|o| o.period().is_none()) {
            Some(bad) => Err(RangeError::InvalidPeriod(format!(
                "option '{}' has value '{}'",
                bad.label, bad.value
            ))),
            None => Ok(()),
        }
    }

    pub fn with_default_dates(mut self, start: Instant, end: Instant) -> Self {
        self.default_dates = Some((start, end));
        self
    }

    pub fn with_constraints(mut self, constraints: RangeConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_period_options(mut self, period_options: Vec<PeriodOption>) -> Self {
        self.period_options = period_options;
        self
    }

    pub fn with_time_mode(mut self, time_mode: TimeMode) -> Self {
        self.time_mode = time_mode;
        self
    }

    pub fn with_local_zone(mut self, local_zone: LocalZone) -> Self {
        self.local_zone = local_zone;
        self
    }

    pub fn display_zone(&self) -> DisplayZone {
        DisplayZone::new(self.time_mode, self.local_zone)
    }
}
