//! Change-event payloads broadcast to house subscribers.
//!
//! Events are flat mappings — house id, entity path (optional room/device
//! id), changed attribute values — so collaborators can serialize them to
//! JSON without understanding the domain graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::alarm::AlarmState;
use crate::attribute::AttributeValue;
use crate::device::{Device, DeviceKind};
use crate::id::{DeviceId, HouseId, RoomId};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    DeviceUpdated,
    DeviceAdded,
    DeviceRemoved,
    RoomAdded,
    RoomRemoved,
    AlarmUpdated,
    AlarmTriggered,
}

/// A state-change record delivered to every subscriber of the house.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEvent {
    pub kind: EventKind,
    pub house_id: HouseId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_kind: Option<DeviceKind>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl StateEvent {
    /// Event describing the current state of one device.
    #[must_use]
    pub fn device(
        kind: EventKind,
        house_id: HouseId,
        room_id: RoomId,
        device_id: DeviceId,
        device: &Device,
    ) -> Self {
        Self {
            kind,
            house_id,
            room_id: Some(room_id),
            device_id: Some(device_id),
            device_kind: Some(device.kind()),
            attributes: device.attributes(),
        }
    }

    /// Event describing a removed device (attributes empty).
    #[must_use]
    pub fn device_removed(
        house_id: HouseId,
        room_id: RoomId,
        device_id: DeviceId,
        kind: DeviceKind,
    ) -> Self {
        Self {
            kind: EventKind::DeviceRemoved,
            house_id,
            room_id: Some(room_id),
            device_id: Some(device_id),
            device_kind: Some(kind),
            attributes: BTreeMap::new(),
        }
    }

    /// Event describing a room addition or removal.
    #[must_use]
    pub fn room(kind: EventKind, house_id: HouseId, room_id: RoomId, name: &str) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("name".to_string(), AttributeValue::from(name));
        Self {
            kind,
            house_id,
            room_id: Some(room_id),
            device_id: None,
            device_kind: None,
            attributes,
        }
    }

    /// Event describing an alarm state change.
    #[must_use]
    pub fn alarm(kind: EventKind, house_id: HouseId, state: AlarmState) -> Self {
        let mut attributes = BTreeMap::new();
        let state_name = match state {
            AlarmState::Disarmed => "disarmed",
            AlarmState::Armed => "armed",
            AlarmState::Triggered => "triggered",
        };
        attributes.insert("state".to_string(), AttributeValue::from(state_name));
        Self {
            kind,
            house_id,
            room_id: None,
            device_id: None,
            device_kind: None,
            attributes,
        }
    }
}
