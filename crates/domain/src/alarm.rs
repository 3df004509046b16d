//! Alarm — house-level security state machine.
//!
//! Transitions: Disarmed —arm→ Armed; Armed —disarm→ Disarmed;
//! Armed —trigger→ Triggered; Triggered —stop/disarm→ Disarmed.
//! Repeating a command that would not move the state reports
//! [`Applied::Unchanged`]; transitions outside the machine are rejected.

use serde::{Deserialize, Serialize};

use crate::device::Applied;
use crate::error::{DomainError, InvalidValueError};

/// Current alarm state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    #[default]
    Disarmed,
    Armed,
    Triggered,
}

/// Manual alarm commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmCommand {
    Arm,
    Disarm,
    Trigger,
    Stop,
}

/// The per-house alarm: state plus the failed-unlock threshold that drives
/// autonomous triggering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub state: AlarmState,
    pub threshold: u32,
}

/// Default failed-unlock threshold before the alarm trips.
pub const DEFAULT_THRESHOLD: u32 = 3;

impl Default for Alarm {
    fn default() -> Self {
        Self {
            state: AlarmState::Disarmed,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Alarm {
    /// Create a disarmed alarm with the given threshold.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            state: AlarmState::Disarmed,
            threshold,
        }
    }

    /// Apply a manual command.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidValue`] for transitions outside the
    /// state machine (arming a triggered alarm, triggering a disarmed one,
    /// stopping an alarm that is not triggered).
    pub fn apply(&mut self, command: AlarmCommand) -> Result<Applied, DomainError> {
        let next = match (self.state, command) {
            (AlarmState::Disarmed, AlarmCommand::Arm) => AlarmState::Armed,
            (AlarmState::Armed, AlarmCommand::Disarm) => AlarmState::Disarmed,
            (AlarmState::Armed, AlarmCommand::Trigger) => AlarmState::Triggered,
            (AlarmState::Triggered, AlarmCommand::Stop | AlarmCommand::Disarm) => {
                AlarmState::Disarmed
            }
            (state, command) if Self::is_idempotent(state, command) => {
                return Ok(Applied::Unchanged);
            }
            (state, command) => {
                return Err(InvalidValueError {
                    field: "alarm",
                    reason: format!("cannot {command:?} while {state:?}"),
                }
                .into());
            }
        };
        self.state = next;
        Ok(Applied::Changed)
    }

    /// Autonomous trigger from the failed-unlock threshold.
    ///
    /// Only an armed alarm trips; a disarmed alarm ignores the condition and
    /// a triggered one stays triggered. Returns `true` when the state
    /// actually transitioned, so the caller can emit the security event
    /// exactly once.
    pub fn trip(&mut self) -> bool {
        if self.state == AlarmState::Armed {
            self.state = AlarmState::Triggered;
            true
        } else {
            false
        }
    }

    /// Whether the alarm currently vetoes non-security device actions.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.state == AlarmState::Triggered
    }

    fn is_idempotent(state: AlarmState, command: AlarmCommand) -> bool {
        matches!(
            (state, command),
            (AlarmState::Armed, AlarmCommand::Arm)
                | (AlarmState::Disarmed, AlarmCommand::Disarm)
                | (AlarmState::Triggered, AlarmCommand::Trigger)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_walk_the_full_state_machine() {
        let mut alarm = Alarm::default();
        assert_eq!(alarm.apply(AlarmCommand::Arm).unwrap(), Applied::Changed);
        assert_eq!(alarm.state, AlarmState::Armed);
        assert_eq!(
            alarm.apply(AlarmCommand::Trigger).unwrap(),
            Applied::Changed
        );
        assert_eq!(alarm.state, AlarmState::Triggered);
        assert_eq!(alarm.apply(AlarmCommand::Stop).unwrap(), Applied::Changed);
        assert_eq!(alarm.state, AlarmState::Disarmed);
    }

    #[test]
    fn should_allow_disarm_while_triggered() {
        let mut alarm = Alarm::default();
        alarm.apply(AlarmCommand::Arm).unwrap();
        alarm.apply(AlarmCommand::Trigger).unwrap();
        assert_eq!(alarm.apply(AlarmCommand::Disarm).unwrap(), Applied::Changed);
        assert_eq!(alarm.state, AlarmState::Disarmed);
    }

    #[test]
    fn should_report_unchanged_for_idempotent_commands() {
        let mut alarm = Alarm::default();
        assert_eq!(
            alarm.apply(AlarmCommand::Disarm).unwrap(),
            Applied::Unchanged
        );
        alarm.apply(AlarmCommand::Arm).unwrap();
        assert_eq!(alarm.apply(AlarmCommand::Arm).unwrap(), Applied::Unchanged);
    }

    #[test]
    fn should_reject_trigger_while_disarmed() {
        let mut alarm = Alarm::default();
        let result = alarm.apply(AlarmCommand::Trigger);
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
        assert_eq!(alarm.state, AlarmState::Disarmed);
    }

    #[test]
    fn should_reject_stop_while_disarmed() {
        let mut alarm = Alarm::default();
        let result = alarm.apply(AlarmCommand::Stop);
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
    }

    #[test]
    fn should_trip_only_when_armed() {
        let mut alarm = Alarm::default();
        assert!(!alarm.trip());
        assert_eq!(alarm.state, AlarmState::Disarmed);

        alarm.apply(AlarmCommand::Arm).unwrap();
        assert!(alarm.trip());
        assert_eq!(alarm.state, AlarmState::Triggered);

        // already triggered: trips exactly once
        assert!(!alarm.trip());
    }
}
