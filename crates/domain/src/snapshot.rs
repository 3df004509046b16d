//! Serializable read views of the model.
//!
//! Snapshots are point-in-time copies produced inside the state manager's
//! critical section; they never expose a partially-applied mutation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::alarm::{Alarm, AlarmState};
use crate::attribute::AttributeValue;
use crate::device::{Device, DeviceKind};
use crate::house::House;
use crate::id::{DeviceId, HouseId, RoomId};
use crate::room::Room;

/// Read view of one device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub kind: DeviceKind,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl DeviceSnapshot {
    #[must_use]
    pub fn of(id: DeviceId, device: &Device) -> Self {
        Self {
            id,
            kind: device.kind(),
            attributes: device.attributes(),
        }
    }
}

/// Read view of one room and its devices.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub name: String,
    pub devices: Vec<DeviceSnapshot>,
}

impl RoomSnapshot {
    #[must_use]
    pub fn of(room: &Room) -> Self {
        Self {
            id: room.id,
            name: room.name.clone(),
            devices: room
                .devices()
                .map(|(id, device)| DeviceSnapshot::of(id, device))
                .collect(),
        }
    }
}

/// Read view of the house alarm.
#[derive(Debug, Clone, Serialize)]
pub struct AlarmSnapshot {
    pub state: AlarmState,
    pub threshold: u32,
}

impl AlarmSnapshot {
    #[must_use]
    pub fn of(alarm: &Alarm) -> Self {
        Self {
            state: alarm.state,
            threshold: alarm.threshold,
        }
    }
}

/// Read view of a whole house.
#[derive(Debug, Clone, Serialize)]
pub struct HouseSnapshot {
    pub id: HouseId,
    pub name: String,
    pub rooms: Vec<RoomSnapshot>,
    pub alarm: AlarmSnapshot,
}

impl HouseSnapshot {
    #[must_use]
    pub fn of(house: &House) -> Self {
        Self {
            id: house.id,
            name: house.name.clone(),
            rooms: house.rooms().map(|(_, room)| RoomSnapshot::of(room)).collect(),
            alarm: AlarmSnapshot::of(&house.alarm),
        }
    }
}
