//! House — top-level container of rooms and one alarm.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::alarm::Alarm;
use crate::error::{DomainError, NotFoundError};
use crate::id::{HouseId, RoomId};
use crate::room::Room;

/// A house: ordered rooms plus exactly one alarm.
///
/// Room ids are unique within the house and assigned monotonically; the
/// alarm is created with the house and never independently destroyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct House {
    pub id: HouseId,
    pub name: String,
    rooms: BTreeMap<RoomId, Room>,
    pub alarm: Alarm,
    next_room_id: RoomId,
}

impl House {
    /// Create an empty house with a disarmed alarm.
    #[must_use]
    pub fn new(id: HouseId, name: impl Into<String>, alarm_threshold: u32) -> Self {
        Self {
            id,
            name: name.into(),
            rooms: BTreeMap::new(),
            alarm: Alarm::new(alarm_threshold),
            next_room_id: RoomId::new(1),
        }
    }

    /// Add a room, assigning the next room id.
    pub fn add_room(&mut self, name: impl Into<String>) -> RoomId {
        let id = self.next_room_id;
        self.next_room_id = id.next();
        self.rooms.insert(id, Room::new(id, name));
        id
    }

    /// Remove a room, cascading deletion of every device it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when no room with `id` exists.
    pub fn remove_room(&mut self, id: RoomId) -> Result<Room, DomainError> {
        self.rooms.remove(&id).ok_or_else(|| {
            NotFoundError {
                entity: "Room",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Look up a room.
    #[must_use]
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    /// Look up a room mutably.
    pub fn room_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&id)
    }

    /// Look up a room, converting absence into `not-found`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when the room is missing.
    pub fn require_room(&self, id: RoomId) -> Result<&Room, DomainError> {
        self.room(id).ok_or_else(|| {
            NotFoundError {
                entity: "Room",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Mutable variant of [`House::require_room`].
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotFound`] when the room is missing.
    pub fn require_room_mut(&mut self, id: RoomId) -> Result<&mut Room, DomainError> {
        self.rooms.get_mut(&id).ok_or_else(|| {
            NotFoundError {
                entity: "Room",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Iterate rooms in id order.
    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &Room)> {
        self.rooms.iter().map(|(id, room)| (*id, room))
    }

    /// Iterate rooms mutably in id order.
    pub fn rooms_mut(&mut self) -> impl Iterator<Item = (RoomId, &mut Room)> {
        self.rooms.iter_mut().map(|(id, room)| (*id, room))
    }
}
