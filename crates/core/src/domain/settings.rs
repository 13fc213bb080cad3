// Queue Settings - value object with range-validated fields

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

pub const GRACE_PERIOD_MIN: u32 = 1;
pub const GRACE_PERIOD_MAX: u32 = 15;
pub const MAX_CALLED_MIN: u32 = 1;
pub const MAX_CALLED_MAX: u32 = 5;
pub const NEAR_FRONT_MIN: u32 = 1;
pub const NEAR_FRONT_MAX: u32 = 10;

/// Per-queue settings. Replaced field-by-field via `SettingsPatch`;
/// out-of-range values are rejected, never clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    /// None = unbounded
    pub max_queue_size: Option<u32>,
    pub estimated_service_time_minutes: u32,
    pub grace_period_minutes: u32,
    pub max_called_at_once: u32,
    pub auto_no_show_enabled: bool,
    pub allow_join_when_paused: bool,
    /// No-show customers re-enter the line at the back instead of terminating
    pub allow_rejoin: bool,
    /// Position at which the one-shot "almost your turn" alert fires
    pub near_front_threshold: Option<u32>,
    pub welcome_message: Option<String>,
    pub called_message: Option<String>,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_queue_size: None,
            estimated_service_time_minutes: 5,
            grace_period_minutes: 5,
            max_called_at_once: 1,
            auto_no_show_enabled: true,
            allow_join_when_paused: false,
            allow_rejoin: false,
            near_front_threshold: None,
            welcome_message: None,
            called_message: None,
        }
    }
}

/// Partial settings update. Outer `None` = leave unchanged; for nullable
/// fields the inner `None` clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub max_queue_size: Option<Option<u32>>,
    pub estimated_service_time_minutes: Option<u32>,
    pub grace_period_minutes: Option<u32>,
    pub max_called_at_once: Option<u32>,
    pub auto_no_show_enabled: Option<bool>,
    pub allow_join_when_paused: Option<bool>,
    pub allow_rejoin: Option<bool>,
    pub near_front_threshold: Option<Option<u32>>,
    pub welcome_message: Option<Option<String>>,
    pub called_message: Option<Option<String>>,
}

impl QueueSettings {
    /// Apply a partial update. Validates the patched result before touching
    /// `self`, so a rejected patch leaves the settings unchanged.
    pub fn apply(&mut self, patch: &SettingsPatch) -> Result<()> {
        let mut candidate = self.clone();

        if let Some(v) = patch.max_queue_size {
            candidate.max_queue_size = v;
        }
        if let Some(v) = patch.estimated_service_time_minutes {
            candidate.estimated_service_time_minutes = v;
        }
        if let Some(v) = patch.grace_period_minutes {
            candidate.grace_period_minutes = v;
        }
        if let Some(v) = patch.max_called_at_once {
            candidate.max_called_at_once = v;
        }
        if let Some(v) = patch.auto_no_show_enabled {
            candidate.auto_no_show_enabled = v;
        }
        if let Some(v) = patch.allow_join_when_paused {
            candidate.allow_join_when_paused = v;
        }
        if let Some(v) = patch.allow_rejoin {
            candidate.allow_rejoin = v;
        }
        if let Some(v) = patch.near_front_threshold {
            candidate.near_front_threshold = v;
        }
        if let Some(ref v) = patch.welcome_message {
            candidate.welcome_message = v.clone();
        }
        if let Some(ref v) = patch.called_message {
            candidate.called_message = v.clone();
        }

        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    /// Check all range invariants, reporting the first violated constraint
    pub fn validate(&self) -> Result<()> {
        if let Some(max) = self.max_queue_size {
            if max == 0 {
                return Err(DomainError::InvalidSettings {
                    field: "max_queue_size",
                    allowed: "positive integer or unset",
                });
            }
        }
        if self.estimated_service_time_minutes == 0 {
            return Err(DomainError::InvalidSettings {
                field: "estimated_service_time_minutes",
                allowed: "positive integer",
            });
        }
        if !(GRACE_PERIOD_MIN..=GRACE_PERIOD_MAX).contains(&self.grace_period_minutes) {
            return Err(DomainError::InvalidSettings {
                field: "grace_period_minutes",
                allowed: "1..=15",
            });
        }
        if !(MAX_CALLED_MIN..=MAX_CALLED_MAX).contains(&self.max_called_at_once) {
            return Err(DomainError::InvalidSettings {
                field: "max_called_at_once",
                allowed: "1..=5",
            });
        }
        if let Some(threshold) = self.near_front_threshold {
            if !(NEAR_FRONT_MIN..=NEAR_FRONT_MAX).contains(&threshold) {
                return Err(DomainError::InvalidSettings {
                    field: "near_front_threshold",
                    allowed: "1..=10 or unset",
                });
            }
        }
        Ok(())
    }

    /// Grace period in epoch-ms units
    pub fn grace_period_millis(&self) -> i64 {
        self.grace_period_minutes as i64 * 60_000
    }
}
