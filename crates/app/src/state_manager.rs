//! Shared state manager — the single authoritative in-memory model.
//!
//! One mutex per house is the unit of mutual exclusion: operations on
//! different houses run in parallel, operations on the same house are
//! strictly serialized and never interleave partial mutations. The security
//! guard is evaluated inside the same critical section as the mutation it
//! protects, so the alarm state cannot flip between check and act.
//!
//! Security-triggered events (an alarm tripping from the failed-unlock
//! threshold) are published through the [`EventSink`] port after the house
//! lock is released — fan-out never runs under a state lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use domo_domain::alarm::{AlarmCommand, AlarmState};
use domo_domain::device::{Applied, DeviceAction, DeviceDraft, DeviceKind};
use domo_domain::error::{DomainError, NotFoundError};
use domo_domain::event::{EventKind, StateEvent};
use domo_domain::house::House;
use domo_domain::id::{DeviceId, HouseId, RoomId};
use domo_domain::snapshot::{DeviceSnapshot, HouseSnapshot, RoomSnapshot};
use serde::Serialize;

use crate::ports::EventSink;
use crate::security;

/// Result of a successfully-applied device action.
#[derive(Debug)]
pub struct ActionApplied {
    /// How the device reacted (changed, already in state, unlock rejected).
    pub applied: Applied,
    /// Change-event payload for the caller to broadcast.
    pub event: StateEvent,
}

/// Per-device result inside a group action.
#[derive(Debug)]
pub struct DeviceOutcome {
    pub room_id: RoomId,
    pub device_id: DeviceId,
    pub result: Result<Applied, DomainError>,
}

/// Aggregated result of a group action. Partial failure is reported per
/// device, never as a single all-or-nothing failure.
#[derive(Debug, Default)]
pub struct GroupOutcome {
    pub outcomes: Vec<DeviceOutcome>,
    /// Change events for the devices that were actually processed.
    pub events: Vec<StateEvent>,
}

impl GroupOutcome {
    /// Number of devices whose action was processed.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of devices whose action was refused.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// One row of the house listing offered to clients before they join.
#[derive(Debug, Clone, Serialize)]
pub struct HouseOverview {
    pub id: HouseId,
    pub name: String,
}

/// A device listed with its owning room, for house-wide device queries.
#[derive(Debug, Clone, Serialize)]
pub struct ListedDevice {
    pub room_id: RoomId,
    #[serde(flatten)]
    pub device: DeviceSnapshot,
}

/// The process-wide registry of houses, constructed once at startup and
/// handed by reference to every client-handler task.
pub struct StateManager<S> {
    houses: RwLock<HashMap<HouseId, Arc<Mutex<House>>>>,
    next_house_id: Mutex<HouseId>,
    security_sink: S,
}

impl<S: EventSink> StateManager<S> {
    /// Create an empty manager publishing security events into `sink`.
    pub fn new(security_sink: S) -> Self {
        Self {
            houses: RwLock::new(HashMap::new()),
            next_house_id: Mutex::new(HouseId::new(1)),
            security_sink,
        }
    }

    /// Register a new empty house, returning its id.
    pub fn register_house(&self, name: impl Into<String>, alarm_threshold: u32) -> HouseId {
        let id = {
            let mut next = self
                .next_house_id
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let id = *next;
            *next = id.next();
            id
        };
        let house = House::new(id, name, alarm_threshold);
        self.houses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(house)));
        id
    }

    /// Ids of all registered houses, ascending.
    #[must_use]
    pub fn house_ids(&self) -> Vec<HouseId> {
        let mut ids: Vec<HouseId> = self
            .houses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Id and name of every registered house, ascending by id.
    #[must_use]
    pub fn list_houses(&self) -> Vec<HouseOverview> {
        let houses = self.houses.read().unwrap_or_else(PoisonError::into_inner);
        let mut listed: Vec<HouseOverview> = houses
            .iter()
            .map(|(id, handle)| HouseOverview {
                id: *id,
                name: lock_house(handle).name.clone(),
            })
            .collect();
        listed.sort_unstable_by_key(|house| house.id);
        listed
    }

    /// Point-in-time view of a whole house.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when the house does not exist.
    pub fn get_house_snapshot(&self, house_id: HouseId) -> Result<HouseSnapshot, DomainError> {
        let handle = self.handle(house_id)?;
        let house = lock_house(&handle);
        Ok(HouseSnapshot::of(&house))
    }

    /// Point-in-time view of one room.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when house or room is missing.
    pub fn get_room_snapshot(
        &self,
        house_id: HouseId,
        room_id: RoomId,
    ) -> Result<RoomSnapshot, DomainError> {
        let handle = self.handle(house_id)?;
        let house = lock_house(&handle);
        Ok(RoomSnapshot::of(house.require_room(room_id)?))
    }

    /// Point-in-time view of one device.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when house, room, or device is
    /// missing.
    pub fn get_device_snapshot(
        &self,
        house_id: HouseId,
        room_id: RoomId,
        device_id: DeviceId,
    ) -> Result<DeviceSnapshot, DomainError> {
        let handle = self.handle(house_id)?;
        let house = lock_house(&handle);
        let device = house
            .require_room(room_id)?
            .device(device_id)
            .ok_or_else(|| device_not_found(device_id))?;
        Ok(DeviceSnapshot::of(device_id, device))
    }

    /// List devices across the house, optionally filtered by kind.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when the house does not exist.
    pub fn list_devices(
        &self,
        house_id: HouseId,
        kind: Option<DeviceKind>,
    ) -> Result<Vec<ListedDevice>, DomainError> {
        let handle = self.handle(house_id)?;
        let house = lock_house(&handle);
        let mut listed = Vec::new();
        for (room_id, room) in house.rooms() {
            for (device_id, device) in room.devices() {
                if kind.is_none_or(|k| k == device.kind()) {
                    listed.push(ListedDevice {
                        room_id,
                        device: DeviceSnapshot::of(device_id, device),
                    });
                }
            }
        }
        Ok(listed)
    }

    /// Apply one action to one device.
    ///
    /// Resolves the target, consults the security guard, applies the
    /// mutation, and returns the change event — all within the house's
    /// critical section. A tripped alarm is published through the event
    /// sink after the lock is released.
    ///
    /// # Errors
    ///
    /// `not-found` for a missing target, `alarm-active` when the guard
    /// vetoes the action, `invalid-value` for unsupported actions or
    /// out-of-range parameters.
    #[tracing::instrument(skip(self, action), fields(house = %house_id, room = %room_id, device = %device_id))]
    pub fn apply_device_action(
        &self,
        house_id: HouseId,
        room_id: RoomId,
        device_id: DeviceId,
        action: &DeviceAction,
    ) -> Result<ActionApplied, DomainError> {
        let handle = self.handle(house_id)?;
        let (outcome, security_event) = {
            let mut house = lock_house(&handle);
            if house.require_room(room_id)?.device(device_id).is_none() {
                return Err(device_not_found(device_id));
            }
            security::check_device_guard(&house, action)?;

            let applied = house
                .require_room_mut(room_id)?
                .device_mut(device_id)
                .ok_or_else(|| device_not_found(device_id))?
                .apply(action)?;
            let security_event =
                security::record_unlock_outcome(&mut house, room_id, device_id, applied);

            let device = house
                .require_room(room_id)?
                .device(device_id)
                .ok_or_else(|| device_not_found(device_id))?;
            let event =
                StateEvent::device(EventKind::DeviceUpdated, house_id, room_id, device_id, device);
            (ActionApplied { applied, event }, security_event)
        };
        if let Some(event) = &security_event {
            self.security_sink.emit(event);
        }
        Ok(outcome)
    }

    /// Apply one action to every device of `kind` in the house, aggregating
    /// per-device outcomes.
    ///
    /// The whole group runs inside one critical section, so a lock whose
    /// failed unlock trips the alarm mid-group vetoes the remaining
    /// non-security devices in the same pass.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] only when the house itself is
    /// missing; everything else is reported per device.
    #[tracing::instrument(skip(self, action), fields(house = %house_id, kind = %kind))]
    pub fn apply_group_action(
        &self,
        house_id: HouseId,
        kind: DeviceKind,
        action: &DeviceAction,
    ) -> Result<GroupOutcome, DomainError> {
        let handle = self.handle(house_id)?;
        let (outcome, security_events) = {
            let mut house = lock_house(&handle);
            let targets: Vec<(RoomId, DeviceId)> = house
                .rooms()
                .flat_map(|(room_id, room)| {
                    room.devices()
                        .filter(|(_, device)| device.kind() == kind)
                        .map(move |(device_id, _)| (room_id, device_id))
                })
                .collect();

            let mut outcome = GroupOutcome::default();
            let mut security_events = Vec::new();
            for (room_id, device_id) in targets {
                let result = apply_one(&mut house, room_id, device_id, action);
                if let Ok(applied) = result {
                    if let Some(event) =
                        security::record_unlock_outcome(&mut house, room_id, device_id, applied)
                    {
                        security_events.push(event);
                    }
                    if let Some(device) =
                        house.room(room_id).and_then(|room| room.device(device_id))
                    {
                        outcome.events.push(StateEvent::device(
                            EventKind::DeviceUpdated,
                            house_id,
                            room_id,
                            device_id,
                            device,
                        ));
                    }
                }
                outcome.outcomes.push(DeviceOutcome {
                    room_id,
                    device_id,
                    result,
                });
            }
            (outcome, security_events)
        };
        for event in &security_events {
            self.security_sink.emit(event);
        }
        Ok(outcome)
    }

    /// Add a room to a house.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when the house does not exist.
    pub fn add_room(
        &self,
        house_id: HouseId,
        name: &str,
    ) -> Result<(RoomId, StateEvent), DomainError> {
        let handle = self.handle(house_id)?;
        let mut house = lock_house(&handle);
        let room_id = house.add_room(name);
        let event = StateEvent::room(EventKind::RoomAdded, house_id, room_id, name);
        Ok((room_id, event))
    }

    /// Remove a room, cascading deletion of its devices.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when house or room is missing.
    pub fn del_room(&self, house_id: HouseId, room_id: RoomId) -> Result<StateEvent, DomainError> {
        let handle = self.handle(house_id)?;
        let mut house = lock_house(&handle);
        let room = house.remove_room(room_id)?;
        Ok(StateEvent::room(
            EventKind::RoomRemoved,
            house_id,
            room_id,
            &room.name,
        ))
    }

    /// Add a device to a room.
    ///
    /// # Errors
    ///
    /// `not-found` for a missing house/room, `duplicate` for a second
    /// ceiling light, `invalid-value` for out-of-range draft attributes.
    pub fn add_device(
        &self,
        house_id: HouseId,
        room_id: RoomId,
        draft: DeviceDraft,
    ) -> Result<(DeviceId, StateEvent), DomainError> {
        let handle = self.handle(house_id)?;
        let mut house = lock_house(&handle);
        let room = house.require_room_mut(room_id)?;
        let device_id = room.add_device(draft)?;
        let device = room
            .device(device_id)
            .ok_or_else(|| device_not_found(device_id))?;
        let event =
            StateEvent::device(EventKind::DeviceAdded, house_id, room_id, device_id, device);
        Ok((device_id, event))
    }

    /// Remove a device from a room.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when house, room, or device is
    /// missing.
    pub fn del_device(
        &self,
        house_id: HouseId,
        room_id: RoomId,
        device_id: DeviceId,
    ) -> Result<StateEvent, DomainError> {
        let handle = self.handle(house_id)?;
        let mut house = lock_house(&handle);
        let removed = house.require_room_mut(room_id)?.remove_device(device_id)?;
        Ok(StateEvent::device_removed(
            house_id,
            room_id,
            device_id,
            removed.kind(),
        ))
    }

    /// Apply a manual alarm command.
    ///
    /// # Errors
    ///
    /// `not-found` for a missing house, `invalid-value` for a transition
    /// outside the alarm state machine.
    pub fn set_alarm(
        &self,
        house_id: HouseId,
        command: AlarmCommand,
    ) -> Result<(Applied, StateEvent), DomainError> {
        let handle = self.handle(house_id)?;
        let mut house = lock_house(&handle);
        let applied = house.alarm.apply(command)?;
        let kind = if house.alarm.state == AlarmState::Triggered {
            EventKind::AlarmTriggered
        } else {
            EventKind::AlarmUpdated
        };
        let event = StateEvent::alarm(kind, house_id, house.alarm.state);
        Ok((applied, event))
    }

    fn handle(&self, house_id: HouseId) -> Result<Arc<Mutex<House>>, DomainError> {
        self.houses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&house_id)
            .cloned()
            .ok_or_else(|| {
                NotFoundError {
                    entity: "House",
                    id: house_id.to_string(),
                }
                .into()
            })
    }
}

fn apply_one(
    house: &mut House,
    room_id: RoomId,
    device_id: DeviceId,
    action: &DeviceAction,
) -> Result<Applied, DomainError> {
    security::check_device_guard(house, action)?;
    house
        .require_room_mut(room_id)?
        .device_mut(device_id)
        .ok_or_else(|| device_not_found(device_id))?
        .apply(action)
}

fn device_not_found(device_id: DeviceId) -> DomainError {
    NotFoundError {
        entity: "Device",
        id: device_id.to_string(),
    }
    .into()
}

fn lock_house(handle: &Arc<Mutex<House>>) -> MutexGuard<'_, House> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}
