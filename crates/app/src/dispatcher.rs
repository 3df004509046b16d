//! Command dispatcher — the single entry point a transport calls per
//! client request.
//!
//! The dispatcher owns the policy that surrounds a state mutation: role
//! checks before, broadcast to the originator's house (minus the
//! originator, who gets the direct response) after. It holds no per-client
//! state; the session context travels with every call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use domo_domain::alarm::{AlarmCommand, AlarmState};
use domo_domain::device::{Applied, DeviceAction, DeviceDraft, DeviceKind};
use domo_domain::error::{DomainError, InvalidValueError};
use domo_domain::event::StateEvent;
use domo_domain::id::{ClientId, DeviceId, HouseId, RoomId};
use domo_domain::snapshot::{DeviceSnapshot, HouseSnapshot, RoomSnapshot};

use crate::broadcaster::Broadcaster;
use crate::ports::ClientDirectory;
use crate::state_manager::{HouseOverview, ListedDevice, StateManager};
use crate::subscriptions::SubscriptionRegistry;

/// What a connected client is allowed to do.
///
/// Guests observe, regulars control devices, admins additionally reshape
/// houses and drive the alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Regular,
    Guest,
}

impl Role {
    #[must_use]
    pub fn can_control_devices(self) -> bool {
        matches!(self, Self::Admin | Self::Regular)
    }

    #[must_use]
    pub fn can_manage(self) -> bool {
        self == Self::Admin
    }
}

impl std::str::FromStr for Role {
    type Err = InvalidValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "regular" => Ok(Self::Regular),
            "guest" => Ok(Self::Guest),
            other => Err(InvalidValueError {
                field: "role",
                reason: format!("unknown role `{other}`"),
            }),
        }
    }
}

/// Identity and role of the calling client, established by the transport
/// at connection time.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub client: ClientId,
    pub role: Role,
}

/// Everything a client can ask of the hub.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    ListHouses,
    JoinHouse {
        house_id: HouseId,
    },
    LeaveHouse,
    QueryHouse,
    QueryRoom {
        room_id: RoomId,
    },
    QueryDevice {
        room_id: RoomId,
        device_id: DeviceId,
    },
    ListDevices {
        #[serde(default)]
        kind: Option<DeviceKind>,
    },
    DeviceAction {
        room_id: RoomId,
        device_id: DeviceId,
        #[serde(flatten)]
        action: DeviceAction,
    },
    GroupAction {
        kind: DeviceKind,
        #[serde(flatten)]
        action: DeviceAction,
    },
    AddRoom {
        name: String,
    },
    DelRoom {
        room_id: RoomId,
    },
    AddDevice {
        room_id: RoomId,
        #[serde(flatten)]
        draft: DeviceDraft,
    },
    DelDevice {
        room_id: RoomId,
        device_id: DeviceId,
    },
    SetAlarm {
        #[serde(rename = "alarm")]
        command: AlarmCommand,
    },
}

/// Per-device entry of a group action reply.
#[derive(Debug, Clone, Serialize)]
pub struct GroupEntry {
    pub room_id: RoomId,
    pub device_id: DeviceId,
    #[serde(flatten)]
    pub outcome: GroupEntryOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GroupEntryOutcome {
    Applied { applied: Applied },
    Refused { error: &'static str },
}

/// Direct reply to the originating client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Response {
    Houses {
        houses: Vec<HouseOverview>,
    },
    Joined {
        house: HouseSnapshot,
    },
    Left,
    House {
        house: HouseSnapshot,
    },
    Room {
        room: RoomSnapshot,
    },
    Device {
        device: DeviceSnapshot,
    },
    Devices {
        devices: Vec<ListedDevice>,
    },
    ActionApplied {
        applied: Applied,
    },
    GroupApplied {
        succeeded: usize,
        failed: usize,
        outcomes: Vec<GroupEntry>,
    },
    RoomAdded {
        room_id: RoomId,
    },
    RoomRemoved,
    DeviceAdded {
        device_id: DeviceId,
    },
    DeviceRemoved,
    AlarmSet {
        state: AlarmState,
    },
}

/// Routes client commands into the state manager and fans successful
/// mutations out to the rest of the house.
pub struct Dispatcher<D> {
    state: Arc<StateManager<Arc<Broadcaster<D>>>>,
    registry: Arc<SubscriptionRegistry>,
    broadcaster: Arc<Broadcaster<D>>,
}

impl<D: ClientDirectory> Dispatcher<D> {
    pub fn new(
        state: Arc<StateManager<Arc<Broadcaster<D>>>>,
        registry: Arc<SubscriptionRegistry>,
        broadcaster: Arc<Broadcaster<D>>,
    ) -> Self {
        Self {
            state,
            registry,
            broadcaster,
        }
    }

    /// Handle one command on behalf of `session`.
    ///
    /// # Errors
    ///
    /// `permission-denied` when the session's role does not cover the
    /// command, plus whatever the state manager reports for the operation
    /// itself.
    #[tracing::instrument(skip(self, command), fields(client = %session.client, role = ?session.role))]
    pub fn dispatch(&self, session: Session, command: Command) -> Result<Response, DomainError> {
        match command {
            Command::ListHouses => Ok(Response::Houses {
                houses: self.state.list_houses(),
            }),
            Command::JoinHouse { house_id } => {
                // snapshot first so joining a phantom house fails cleanly
                let house = self.state.get_house_snapshot(house_id)?;
                self.registry.join(house_id, session.client);
                Ok(Response::Joined { house })
            }
            Command::LeaveHouse => {
                self.registry.detach(session.client);
                Ok(Response::Left)
            }
            Command::QueryHouse => {
                let house_id = self.joined_house(session)?;
                Ok(Response::House {
                    house: self.state.get_house_snapshot(house_id)?,
                })
            }
            Command::QueryRoom { room_id } => {
                let house_id = self.joined_house(session)?;
                Ok(Response::Room {
                    room: self.state.get_room_snapshot(house_id, room_id)?,
                })
            }
            Command::QueryDevice { room_id, device_id } => {
                let house_id = self.joined_house(session)?;
                Ok(Response::Device {
                    device: self.state.get_device_snapshot(house_id, room_id, device_id)?,
                })
            }
            Command::ListDevices { kind } => {
                let house_id = self.joined_house(session)?;
                Ok(Response::Devices {
                    devices: self.state.list_devices(house_id, kind)?,
                })
            }
            Command::DeviceAction {
                room_id,
                device_id,
                action,
            } => {
                require_control(session, "device_action")?;
                let house_id = self.joined_house(session)?;
                let applied =
                    self.state
                        .apply_device_action(house_id, room_id, device_id, &action)?;
                self.publish(session, house_id, &applied.event);
                Ok(Response::ActionApplied {
                    applied: applied.applied,
                })
            }
            Command::GroupAction { kind, action } => {
                require_control(session, "device_group_action")?;
                let house_id = self.joined_house(session)?;
                let outcome = self.state.apply_group_action(house_id, kind, &action)?;
                for event in &outcome.events {
                    self.publish(session, house_id, event);
                }
                let entries: Vec<GroupEntry> = outcome
                    .outcomes
                    .iter()
                    .map(|entry| GroupEntry {
                        room_id: entry.room_id,
                        device_id: entry.device_id,
                        outcome: match &entry.result {
                            Ok(applied) => GroupEntryOutcome::Applied { applied: *applied },
                            Err(err) => GroupEntryOutcome::Refused { error: err.kind() },
                        },
                    })
                    .collect();
                Ok(Response::GroupApplied {
                    succeeded: outcome.succeeded(),
                    failed: outcome.failed(),
                    outcomes: entries,
                })
            }
            Command::AddRoom { name } => {
                require_manage(session, "add_room")?;
                let house_id = self.joined_house(session)?;
                let (room_id, event) = self.state.add_room(house_id, &name)?;
                self.publish(session, house_id, &event);
                Ok(Response::RoomAdded { room_id })
            }
            Command::DelRoom { room_id } => {
                require_manage(session, "del_room")?;
                let house_id = self.joined_house(session)?;
                let event = self.state.del_room(house_id, room_id)?;
                self.publish(session, house_id, &event);
                Ok(Response::RoomRemoved)
            }
            Command::AddDevice { room_id, draft } => {
                require_manage(session, "add_device")?;
                let house_id = self.joined_house(session)?;
                let (device_id, event) = self.state.add_device(house_id, room_id, draft)?;
                self.publish(session, house_id, &event);
                Ok(Response::DeviceAdded { device_id })
            }
            Command::DelDevice { room_id, device_id } => {
                require_manage(session, "del_device")?;
                let house_id = self.joined_house(session)?;
                let event = self.state.del_device(house_id, room_id, device_id)?;
                self.publish(session, house_id, &event);
                Ok(Response::DeviceRemoved)
            }
            Command::SetAlarm { command } => {
                require_manage(session, "set_alarm")?;
                let house_id = self.joined_house(session)?;
                let (_, event) = self.state.set_alarm(house_id, command)?;
                self.publish(session, house_id, &event);
                let state = self.state.get_house_snapshot(house_id)?.alarm.state;
                Ok(Response::AlarmSet { state })
            }
        }
    }

    /// Drop the client's subscription on disconnect.
    pub fn disconnect(&self, client: ClientId) {
        self.registry.detach(client);
    }

    fn joined_house(&self, session: Session) -> Result<HouseId, DomainError> {
        self.registry.house_of(session.client).ok_or_else(|| {
            InvalidValueError {
                field: "session",
                reason: "no house joined".to_string(),
            }
            .into()
        })
    }

    fn publish(&self, session: Session, house_id: HouseId, event: &StateEvent) {
        self.broadcaster
            .broadcast(house_id, event, Some(session.client));
    }
}

fn require_control(session: Session, operation: &'static str) -> Result<(), DomainError> {
    if session.role.can_control_devices() {
        Ok(())
    } else {
        Err(DomainError::PermissionDenied {
            operation,
            required: "regular",
        })
    }
}

fn require_manage(session: Session, operation: &'static str) -> Result<(), DomainError> {
    if session.role.can_manage() {
        Ok(())
    } else {
        Err(DomainError::PermissionDenied {
            operation,
            required: "admin",
        })
    }
}
