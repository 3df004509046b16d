//! Security controller — the lock ↔ alarm interaction.
//!
//! Two free functions, both called inside the state manager's per-house
//! critical section so the guard check and the mutation it protects can
//! never be separated by a concurrent alarm change:
//!
//! - [`check_device_guard`] — the guard predicate: while the alarm is
//!   triggered, every non-lock device action in the house is vetoed.
//! - [`record_unlock_outcome`] — failed-unlock bookkeeping: when a lock's
//!   counter reaches the armed alarm's threshold, the alarm trips exactly
//!   once and the security event to broadcast is returned.

use domo_domain::device::{Applied, DeviceAction};
use domo_domain::error::DomainError;
use domo_domain::event::{EventKind, StateEvent};
use domo_domain::house::House;
use domo_domain::id::{DeviceId, RoomId};

/// Guard predicate consulted before any device action is applied.
///
/// Lock actions pass even while the alarm is triggered, so a resident can
/// resolve the condition; everything else is refused with `alarm-active`.
///
/// # Errors
///
/// Returns [`DomainError::AlarmActive`] when the house alarm is triggered
/// and the action is not security-related.
pub fn check_device_guard(house: &House, action: &DeviceAction) -> Result<(), DomainError> {
    if house.alarm.is_triggered() && !action.is_security() {
        return Err(DomainError::AlarmActive);
    }
    Ok(())
}

/// Failed-unlock bookkeeping, run after a lock action was applied.
///
/// When the rejected attempt pushed the lock's counter to the alarm
/// threshold and the alarm is armed, the alarm transitions to triggered and
/// the corresponding [`EventKind::AlarmTriggered`] event is returned — the
/// caller must hand it to the event sink once the house lock is released.
pub fn record_unlock_outcome(
    house: &mut House,
    room_id: RoomId,
    device_id: DeviceId,
    applied: Applied,
) -> Option<StateEvent> {
    if applied != Applied::UnlockRejected {
        return None;
    }
    let attempts = house
        .room(room_id)?
        .device(device_id)?
        .failed_attempts()?;
    if attempts >= house.alarm.threshold && house.alarm.trip() {
        tracing::warn!(
            house = %house.id,
            room = %room_id,
            device = %device_id,
            attempts,
            "failed-unlock threshold crossed, alarm triggered"
        );
        return Some(StateEvent::alarm(
            EventKind::AlarmTriggered,
            house.id,
            house.alarm.state,
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use domo_domain::alarm::AlarmCommand;
    use domo_domain::device::DeviceDraft;
    use domo_domain::id::HouseId;

    fn house_with_lock(threshold: u32) -> (House, RoomId, DeviceId) {
        let mut house = House::new(HouseId::new(1), "Test House", threshold);
        let room_id = house.add_room("Hall");
        let device_id = house
            .room_mut(room_id)
            .unwrap()
            .add_device(DeviceDraft::Lock {
                code: "1234".to_string(),
            })
            .unwrap();
        (house, room_id, device_id)
    }

    fn fail_unlock(house: &mut House, room_id: RoomId, device_id: DeviceId) -> Applied {
        house
            .room_mut(room_id)
            .unwrap()
            .device_mut(device_id)
            .unwrap()
            .apply(&DeviceAction::Unlock {
                code: "0000".to_string(),
            })
            .unwrap()
    }

    #[test]
    fn should_trigger_alarm_exactly_once_at_threshold() {
        let (mut house, room_id, device_id) = house_with_lock(3);
        house.alarm.apply(AlarmCommand::Arm).unwrap();

        let mut events = Vec::new();
        for _ in 0..5 {
            let applied = fail_unlock(&mut house, room_id, device_id);
            if let Some(event) = record_unlock_outcome(&mut house, room_id, device_id, applied) {
                events.push(event);
            }
        }

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::AlarmTriggered);
        assert!(house.alarm.is_triggered());
    }

    #[test]
    fn should_not_trigger_when_alarm_is_disarmed() {
        let (mut house, room_id, device_id) = house_with_lock(2);
        for _ in 0..4 {
            let applied = fail_unlock(&mut house, room_id, device_id);
            assert!(record_unlock_outcome(&mut house, room_id, device_id, applied).is_none());
        }
        assert!(!house.alarm.is_triggered());
    }

    #[test]
    fn should_ignore_successful_unlocks() {
        let (mut house, room_id, device_id) = house_with_lock(1);
        house.alarm.apply(AlarmCommand::Arm).unwrap();
        let applied = house
            .room_mut(room_id)
            .unwrap()
            .device_mut(device_id)
            .unwrap()
            .apply(&DeviceAction::Unlock {
                code: "1234".to_string(),
            })
            .unwrap();
        assert!(record_unlock_outcome(&mut house, room_id, device_id, applied).is_none());
        assert!(!house.alarm.is_triggered());
    }

    #[test]
    fn should_veto_non_security_actions_while_triggered() {
        let (mut house, _, _) = house_with_lock(1);
        house.alarm.apply(AlarmCommand::Arm).unwrap();
        house.alarm.apply(AlarmCommand::Trigger).unwrap();

        let result = check_device_guard(&house, &DeviceAction::Toggle);
        assert!(matches!(result, Err(DomainError::AlarmActive)));
    }

    #[test]
    fn should_let_lock_actions_through_while_triggered() {
        let (mut house, _, _) = house_with_lock(1);
        house.alarm.apply(AlarmCommand::Arm).unwrap();
        house.alarm.apply(AlarmCommand::Trigger).unwrap();

        assert!(
            check_device_guard(
                &house,
                &DeviceAction::Unlock {
                    code: "1234".to_string()
                }
            )
            .is_ok()
        );
        assert!(check_device_guard(&house, &DeviceAction::Lock).is_ok());
    }

    #[test]
    fn should_allow_everything_while_not_triggered() {
        let (house, _, _) = house_with_lock(1);
        assert!(check_device_guard(&house, &DeviceAction::Toggle).is_ok());
    }
}
