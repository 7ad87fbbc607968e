//! City rotation selector.
//!
//! Pure mapping from (persisted state, city list, now) to the next city and
//! the state to persist once that city's post succeeds. The reset check and
//! the city advance are independent steps: a reset only forgets the pointer
//! and moves the epoch, the advance always walks the list in order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::ConfigError;
use crate::models::{City, CityList, RotationState};

/// What to do when the stored city is no longer configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCityPolicy {
    /// Restart at the head of the list and keep the current epoch
    #[default]
    RestartPosition,
    /// Restart at the head of the list and start a new epoch at `now`
    RestartEpoch,
}

impl FromStr for UnknownCityPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "restart_position" => Ok(Self::RestartPosition),
            "restart_epoch" => Ok(Self::RestartEpoch),
            other => Err(ConfigError::InvalidUnknownCityPolicy(other.to_string())),
        }
    }
}

/// Parameters of the rotation
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    pub reset_interval: TimeDelta,
    pub unknown_city: UnknownCityPolicy,
}

impl RotationPolicy {
    pub fn new(reset_interval: TimeDelta) -> Self {
        Self {
            reset_interval,
            unknown_city: UnknownCityPolicy::default(),
        }
    }

    pub fn with_unknown_city(mut self, policy: UnknownCityPolicy) -> Self {
        self.unknown_city = policy;
        self
    }
}

/// Why a selection started a new epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    /// No epoch was recorded yet
    FirstRun,
    /// The reset interval elapsed since the last epoch
    IntervalElapsed,
    /// The stored city is not configured and the policy restarts the epoch
    UnknownCity,
}

impl fmt::Display for ResetCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetCause::FirstRun => write!(f, "first run"),
            ResetCause::IntervalElapsed => write!(f, "reset interval elapsed"),
            ResetCause::UnknownCity => write!(f, "stored city is no longer configured"),
        }
    }
}

/// Result of a selection
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// City to post about this cycle
    pub city: City,
    /// State to write back if and only if the post succeeds
    pub next_state: RotationState,
    /// Set when this cycle starts a new epoch
    pub reset: Option<ResetCause>,
}

/// Picks the next city.
pub fn select_next(
    state: &RotationState,
    cities: &CityList,
    now: DateTime<Utc>,
    policy: &RotationPolicy,
) -> Selection {
    let (pointer, mut clear_time, mut reset) = match state.last_clear_time {
        None => (None, now, Some(ResetCause::FirstRun)),
        Some(last) if now.signed_duration_since(last) >= policy.reset_interval => {
            (None, now, Some(ResetCause::IntervalElapsed))
        }
        Some(last) => (state.last_posted_city.as_deref(), last, None),
    };

    let index = match pointer {
        None => 0,
        Some(name) => match cities.position(name) {
            Some(current) => (current + 1) % cities.len(),
            None => {
                log::warn!(
                    "Last posted city '{}' is not in the configured list, restarting at '{}'",
                    name,
                    cities.first().name
                );
                if policy.unknown_city == UnknownCityPolicy::RestartEpoch {
                    // never move the epoch backwards, even if the clock did
                    clear_time = clear_time.max(now);
                    reset = Some(ResetCause::UnknownCity);
                }
                0
            }
        },
    };

    let city = cities.get(index).unwrap_or_else(|| cities.first()).clone();

    Selection {
        next_state: RotationState::new(city.name.clone(), clear_time),
        city,
        reset,
    }
}
