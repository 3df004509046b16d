//! Cross-thread behavior of the shared state manager.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use domo_app::ports::EventSink;
use domo_app::state_manager::StateManager;
use domo_domain::alarm::{AlarmCommand, AlarmState};
use domo_domain::attribute::AttributeValue;
use domo_domain::device::{DeviceAction, DeviceDraft};
use domo_domain::event::{EventKind, StateEvent};

#[derive(Default)]
struct CountingSink {
    triggered: AtomicUsize,
}

impl EventSink for CountingSink {
    fn emit(&self, event: &StateEvent) {
        if event.kind == EventKind::AlarmTriggered {
            self.triggered.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn should_serialize_concurrent_toggles_on_one_device() {
    let manager = Arc::new(StateManager::new(Arc::new(CountingSink::default())));
    let house_id = manager.register_house("Suburban Home", 3);
    let (room_id, _) = manager.add_room(house_id, "Living Room").unwrap();
    let (lamp_id, _) = manager
        .add_device(
            house_id,
            room_id,
            DeviceDraft::Lamp {
                brightness: None,
                color: None,
            },
        )
        .unwrap();

    let threads = 8;
    let toggles_per_thread = 25;
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for _ in 0..toggles_per_thread {
                    manager
                        .apply_device_action(house_id, room_id, lamp_id, &DeviceAction::Toggle)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 200 atomic toggles land back on the initial state; a lost update
    // would break the parity
    let snapshot = manager
        .get_device_snapshot(house_id, room_id, lamp_id)
        .unwrap();
    assert_eq!(snapshot.attributes["on"], AttributeValue::Bool(false));
}

#[test]
fn should_trigger_alarm_exactly_once_under_concurrent_bad_unlocks() {
    let sink = Arc::new(CountingSink::default());
    let manager = Arc::new(StateManager::new(Arc::clone(&sink)));
    let house_id = manager.register_house("Beach House", 3);
    let (room_id, _) = manager.add_room(house_id, "Entrance").unwrap();
    let (lock_id, _) = manager
        .add_device(
            house_id,
            room_id,
            DeviceDraft::Lock {
                code: "1234".to_string(),
            },
        )
        .unwrap();
    manager.set_alarm(house_id, AlarmCommand::Arm).unwrap();

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for _ in 0..5 {
                    manager
                        .apply_device_action(
                            house_id,
                            room_id,
                            lock_id,
                            &DeviceAction::Unlock {
                                code: "0000".to_string(),
                            },
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(sink.triggered.load(Ordering::SeqCst), 1);
    let snapshot = manager.get_house_snapshot(house_id).unwrap();
    assert_eq!(snapshot.alarm.state, AlarmState::Triggered);
}

#[test]
fn should_keep_houses_independent_under_concurrent_mutation() {
    let manager = Arc::new(StateManager::new(Arc::new(CountingSink::default())));
    let mut targets = Vec::new();
    for index in 0..4 {
        let house_id = manager.register_house(format!("House {index}"), 3);
        let (room_id, _) = manager.add_room(house_id, "Room").unwrap();
        let (lamp_id, _) = manager
            .add_device(
                house_id,
                room_id,
                DeviceDraft::Lamp {
                    brightness: None,
                    color: None,
                },
            )
            .unwrap();
        targets.push((house_id, room_id, lamp_id));
    }

    let handles: Vec<_> = targets
        .iter()
        .copied()
        .map(|(house_id, room_id, lamp_id)| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for _ in 0..50 {
                    manager
                        .apply_device_action(house_id, room_id, lamp_id, &DeviceAction::Toggle)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for (house_id, room_id, lamp_id) in targets {
        let snapshot = manager
            .get_device_snapshot(house_id, room_id, lamp_id)
            .unwrap();
        assert_eq!(snapshot.attributes["on"], AttributeValue::Bool(false));
    }
}
