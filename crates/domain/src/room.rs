//! Room — container of devices within a house.
//!
//! The room owns device-identifier assignment: ids are handed out from a
//! monotonic counter and never reused, even after a device is deleted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceDraft, DeviceKind};
use crate::error::{DomainError, DuplicateError, NotFoundError};
use crate::id::{DeviceId, RoomId};

/// A room: named device container with monotonic device-id assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    devices: BTreeMap<DeviceId, Device>,
    next_device_id: DeviceId,
}

impl Room {
    /// Create an empty room. Ids start at 1, matching the original numbering.
    #[must_use]
    pub fn new(id: RoomId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            devices: BTreeMap::new(),
            next_device_id: DeviceId::new(1),
        }
    }

    /// Add a device built from `draft`, assigning the next device id.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Duplicate`] when the room already has a
    /// ceiling light and the draft would add a second one, or
    /// [`DomainError::InvalidValue`] when the draft's attributes are out of
    /// range. The room is untouched on error.
    pub fn add_device(&mut self, draft: DeviceDraft) -> Result<DeviceId, DomainError> {
        if draft.kind() == DeviceKind::CeilingLight
            && self
                .devices
                .values()
                .any(|d| d.kind() == DeviceKind::CeilingLight)
        {
            return Err(DuplicateError {
                entity: "CeilingLight",
                detail: format!("room {} already has a ceiling light", self.id),
            }
            .into());
        }

        let device = Device::create(draft)?;
        let id = self.next_device_id;
        self.next_device_id = id.next();
        self.devices.insert(id, device);
        Ok(id)
    }

    /// Remove a device, returning it.
    ///
    /// The id counter is not rewound: a later `add_device` never reuses the
    /// deleted id.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when no device with `id` exists.
    pub fn remove_device(&mut self, id: DeviceId) -> Result<Device, DomainError> {
        self.devices.remove(&id).ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Look up a device.
    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    /// Look up a device mutably.
    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        self.devices.get_mut(&id)
    }

    /// Iterate devices in id order.
    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &Device)> {
        self.devices.iter().map(|(id, device)| (*id, device))
    }

    /// Iterate devices mutably in id order.
    pub fn devices_mut(&mut self) -> impl Iterator<Item = (DeviceId, &mut Device)> {
        self.devices.iter_mut().map(|(id, device)| (*id, device))
    }

    /// Number of devices currently in the room.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
