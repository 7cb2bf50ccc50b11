use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dao::models::GameClockEntity,
    state::error::{EngineError, InvalidTransition, TransitionSource, Trigger},
};

/// Lifecycle of the clock within a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClockStatus {
    /// Created with the game; no period has been played yet.
    NotStarted,
    /// Time is flowing for the current period.
    Running,
    /// Stopped mid-period; resumable.
    Paused,
    /// Current period is over; a new one must be started.
    Ended,
}

/// Period-scoped game clock.
///
/// Invariant: `status == Running` exactly when `period_start` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameClock {
    status: ClockStatus,
    period_number: u32,
    period_start: Option<SystemTime>,
    accumulated: Duration,
    stopped_at: Option<SystemTime>,
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            status: ClockStatus::NotStarted,
            period_number: 1,
            period_start: None,
            accumulated: Duration::ZERO,
            stopped_at: None,
        }
    }
}

impl GameClock {
    /// Fresh clock waiting for the first period.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ClockStatus {
        self.status
    }

    pub fn period_number(&self) -> u32 {
        self.period_number
    }

    pub fn period_start(&self) -> Option<SystemTime> {
        self.period_start
    }

    /// Instant the clock last stopped (pause or end of period), if it is stopped.
    pub fn stopped_at(&self) -> Option<SystemTime> {
        self.stopped_at
    }

    pub fn is_running(&self) -> bool {
        self.status == ClockStatus::Running
    }

    /// Whether `start` would be accepted for `period_number`.
    ///
    /// Periods only move forward one at a time: the first start must be
    /// period 1 and every later one the period after the current one.
    pub fn check_start(&self, period_number: u32) -> Result<(), EngineError> {
        let next = match self.status {
            ClockStatus::NotStarted => 1,
            ClockStatus::Paused | ClockStatus::Ended => self.period_number + 1,
            ClockStatus::Running => {
                return Err(self.reject(Trigger::StartPeriod(period_number)));
            }
        };
        if period_number != next {
            return Err(self.reject(Trigger::StartPeriod(period_number)));
        }
        Ok(())
    }

    /// Begin `period_number`, discarding the time counted for the previous one.
    pub fn start(&mut self, period_number: u32, now: SystemTime) -> Result<(), EngineError> {
        self.check_start(period_number)?;
        self.status = ClockStatus::Running;
        self.period_number = period_number;
        self.period_start = Some(now);
        self.accumulated = Duration::ZERO;
        self.stopped_at = None;
        Ok(())
    }

    pub fn pause(&mut self, now: SystemTime) -> Result<(), EngineError> {
        if self.status != ClockStatus::Running {
            return Err(self.reject(Trigger::Pause));
        }
        self.fold_run(now);
        self.status = ClockStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now: SystemTime) -> Result<(), EngineError> {
        if self.status != ClockStatus::Paused {
            return Err(self.reject(Trigger::Resume));
        }
        self.status = ClockStatus::Running;
        self.period_start = Some(now);
        self.stopped_at = None;
        Ok(())
    }

    /// Close the current period. Accepted from running or paused.
    pub fn end_period(&mut self, now: SystemTime) -> Result<(), EngineError> {
        match self.status {
            ClockStatus::Running => self.fold_run(now),
            ClockStatus::Paused => {}
            ClockStatus::NotStarted | ClockStatus::Ended => {
                return Err(self.reject(Trigger::EndPeriod));
            }
        }
        self.status = ClockStatus::Ended;
        Ok(())
    }

    /// Elapsed time of the current period at `now`.
    ///
    /// A `now` earlier than the period start contributes nothing, so the value
    /// never goes negative.
    pub fn elapsed(&self, now: SystemTime) -> Duration {
        match self.period_start {
            Some(start) => self.accumulated + now.duration_since(start).unwrap_or_default(),
            None => self.accumulated,
        }
    }

    pub fn elapsed_seconds(&self, now: SystemTime) -> u64 {
        self.elapsed(now).as_secs()
    }

    /// Instant against which on-field time is measured: `now` while the clock
    /// runs, the stop instant otherwise.
    pub fn accounting_instant(&self, now: SystemTime) -> SystemTime {
        match (self.status, self.stopped_at) {
            (ClockStatus::Running, _) | (_, None) => now,
            (_, Some(stopped)) => stopped,
        }
    }

    fn fold_run(&mut self, now: SystemTime) {
        if let Some(start) = self.period_start.take() {
            self.accumulated += now.duration_since(start).unwrap_or_default();
        }
        self.stopped_at = Some(now);
    }

    fn reject(&self, trigger: Trigger) -> EngineError {
        InvalidTransition {
            from: TransitionSource::Clock(self.status),
            trigger,
        }
        .into()
    }
}

/// Render a duration as `MM:SS`; minutes are not capped at 59.
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

impl From<GameClockEntity> for GameClock {
    /// A running record without a start instant loads as paused.
    fn from(value: GameClockEntity) -> Self {
        let (status, period_start) = match (value.status, value.period_start) {
            (ClockStatus::Running, Some(start)) => (ClockStatus::Running, Some(start)),
            (ClockStatus::Running, None) => (ClockStatus::Paused, None),
            (status, _) => (status, None),
        };
        Self {
            status,
            period_number: value.period_number.max(1),
            period_start,
            accumulated: value.accumulated,
            stopped_at: value.stopped_at,
        }
    }
}

impl From<&GameClock> for GameClockEntity {
    fn from(value: &GameClock) -> Self {
        Self {
            status: value.status,
            period_number: value.period_number,
            period_start: value.period_start,
            accumulated: value.accumulated,
            stopped_at: value.stopped_at,
        }
    }
}
