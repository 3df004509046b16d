//! Device — a controllable entity with a type-specific attribute set.
//!
//! Devices are a tagged union over four variants (lamp, ceiling light, lock,
//! blinds) with action dispatch keyed by the variant, rather than trait
//! objects — variants stay simple data and the match in [`Device::apply`]
//! is the single place action semantics live.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeValue;
use crate::error::{DomainError, InvalidValueError};

/// Colors supported by lamps and ceiling lights.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    Orange,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::White => "white",
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Orange => "orange",
        };
        f.write_str(name)
    }
}

/// Device type tag, used for group actions and wire payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Lamp,
    CeilingLight,
    Lock,
    Blinds,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lamp => "lamp",
            Self::CeilingLight => "ceiling_light",
            Self::Lock => "lock",
            Self::Blinds => "blinds",
        };
        f.write_str(name)
    }
}

/// An action a client can request on a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeviceAction {
    /// Flip a light on/off.
    Toggle,
    /// Turn a light on (no-op when already on).
    TurnOn,
    /// Turn a light off (no-op when already off).
    TurnOff,
    /// Set light brightness, 0–100.
    SetBrightness { level: u8 },
    /// Set light color.
    SetColor { color: Color },
    /// Engage a lock.
    Lock,
    /// Attempt to disengage a lock with a code.
    Unlock { code: String },
    /// Raise blinds.
    Raise,
    /// Lower blinds.
    Lower,
    /// Open blind slats.
    Open,
    /// Close blind slats.
    Close,
}

impl DeviceAction {
    /// Whether this action targets a lock.
    ///
    /// Lock actions are still processed while the house alarm is triggered,
    /// so a resident can resolve the condition; everything else is refused.
    #[must_use]
    pub fn is_security(&self) -> bool {
        matches!(self, Self::Lock | Self::Unlock { .. })
    }
}

/// Outcome of a successfully-processed action.
///
/// A wrong unlock code is *processed*, not an error: the attempt counter
/// advances and the outcome is [`Applied::UnlockRejected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Applied {
    /// The device state changed.
    Changed,
    /// The device was already in the requested state.
    Unchanged,
    /// An unlock attempt was counted and refused (wrong code).
    UnlockRejected,
}

/// A lamp: on/off, brightness, color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lamp {
    pub on: bool,
    pub brightness: u8,
    pub color: Color,
}

/// A ceiling light — same attributes as a lamp, but at most one per room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeilingLight {
    pub on: bool,
    pub brightness: u8,
    pub color: Color,
}

/// A door lock with a secret code and a failed-attempt counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub locked: bool,
    code: String,
    pub failed_attempts: u32,
}

/// Window blinds: raised/lowered position plus open/closed slats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blinds {
    pub raised: bool,
    pub open: bool,
}

/// Creation request for a device, with optional attribute overrides.
///
/// Omitted attributes take the documented defaults: lights start off at
/// brightness 100 in white, blinds start raised and closed, locks start
/// locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceDraft {
    Lamp {
        #[serde(default)]
        brightness: Option<u8>,
        #[serde(default)]
        color: Option<Color>,
    },
    CeilingLight {
        #[serde(default)]
        brightness: Option<u8>,
        #[serde(default)]
        color: Option<Color>,
    },
    Lock { code: String },
    Blinds,
}

impl DeviceDraft {
    /// The kind of device this draft will create.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Lamp { .. } => DeviceKind::Lamp,
            Self::CeilingLight { .. } => DeviceKind::CeilingLight,
            Self::Lock { .. } => DeviceKind::Lock,
            Self::Blinds => DeviceKind::Blinds,
        }
    }
}

/// A controllable device, polymorphic over its four variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Device {
    Lamp(Lamp),
    CeilingLight(CeilingLight),
    Lock(Lock),
    Blinds(Blinds),
}

const MAX_BRIGHTNESS: u8 = 100;

fn validate_brightness(level: u8) -> Result<u8, DomainError> {
    if level > MAX_BRIGHTNESS {
        return Err(InvalidValueError {
            field: "brightness",
            reason: format!("level {level} must be between 0 and {MAX_BRIGHTNESS}"),
        }
        .into());
    }
    Ok(level)
}

fn validate_code(code: &str) -> Result<(), DomainError> {
    if code.len() < 4 || code.len() > 8 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InvalidValueError {
            field: "code",
            reason: "lock code must be 4 to 8 digits".to_string(),
        }
        .into());
    }
    Ok(())
}

fn unsupported(kind: DeviceKind, action: &DeviceAction) -> DomainError {
    InvalidValueError {
        field: "action",
        reason: format!("{kind} does not support {action:?}"),
    }
    .into()
}

impl Device {
    /// Build a device from a creation request, validating attribute ranges.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidValue`] when brightness is out of range
    /// or a lock code is malformed.
    pub fn create(draft: DeviceDraft) -> Result<Self, DomainError> {
        match draft {
            DeviceDraft::Lamp { brightness, color } => Ok(Self::Lamp(Lamp {
                on: false,
                brightness: validate_brightness(brightness.unwrap_or(MAX_BRIGHTNESS))?,
                color: color.unwrap_or_default(),
            })),
            DeviceDraft::CeilingLight { brightness, color } => {
                Ok(Self::CeilingLight(CeilingLight {
                    on: false,
                    brightness: validate_brightness(brightness.unwrap_or(MAX_BRIGHTNESS))?,
                    color: color.unwrap_or_default(),
                }))
            }
            DeviceDraft::Lock { code } => {
                validate_code(&code)?;
                Ok(Self::Lock(Lock {
                    locked: true,
                    code,
                    failed_attempts: 0,
                }))
            }
            DeviceDraft::Blinds => Ok(Self::Blinds(Blinds {
                raised: true,
                open: false,
            })),
        }
    }

    /// The device's type tag.
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Lamp(_) => DeviceKind::Lamp,
            Self::CeilingLight(_) => DeviceKind::CeilingLight,
            Self::Lock(_) => DeviceKind::Lock,
            Self::Blinds(_) => DeviceKind::Blinds,
        }
    }

    /// Apply an action, mutating only this device's own fields.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidValue`] when the action does not apply
    /// to this device variant or a parameter is out of range. A wrong unlock
    /// code is not an error — see [`Applied::UnlockRejected`].
    pub fn apply(&mut self, action: &DeviceAction) -> Result<Applied, DomainError> {
        let kind = self.kind();
        match self {
            Self::Lamp(Lamp {
                on,
                brightness,
                color,
            })
            | Self::CeilingLight(CeilingLight {
                on,
                brightness,
                color,
            }) => apply_light(on, brightness, color, kind, action),
            Self::Lock(lock) => lock.apply(action),
            Self::Blinds(blinds) => blinds.apply(action),
        }
    }

    /// Flat attribute map for snapshots and change events.
    #[must_use]
    pub fn attributes(&self) -> BTreeMap<String, AttributeValue> {
        let mut attrs = BTreeMap::new();
        match self {
            Self::Lamp(Lamp {
                on,
                brightness,
                color,
            })
            | Self::CeilingLight(CeilingLight {
                on,
                brightness,
                color,
            }) => {
                attrs.insert("on".to_string(), (*on).into());
                attrs.insert("brightness".to_string(), i64::from(*brightness).into());
                attrs.insert("color".to_string(), color.to_string().as_str().into());
            }
            Self::Lock(lock) => {
                attrs.insert("locked".to_string(), lock.locked.into());
                attrs.insert(
                    "failed_attempts".to_string(),
                    i64::from(lock.failed_attempts).into(),
                );
            }
            Self::Blinds(blinds) => {
                attrs.insert("raised".to_string(), blinds.raised.into());
                attrs.insert("open".to_string(), blinds.open.into());
            }
        }
        attrs
    }

    /// The lock's failed-attempt counter, when this device is a lock.
    #[must_use]
    pub fn failed_attempts(&self) -> Option<u32> {
        match self {
            Self::Lock(lock) => Some(lock.failed_attempts),
            _ => None,
        }
    }
}

fn apply_light(
    on: &mut bool,
    brightness: &mut u8,
    color: &mut Color,
    kind: DeviceKind,
    action: &DeviceAction,
) -> Result<Applied, DomainError> {
    match action {
        DeviceAction::Toggle => {
            *on = !*on;
            Ok(Applied::Changed)
        }
        DeviceAction::TurnOn => {
            if *on {
                Ok(Applied::Unchanged)
            } else {
                *on = true;
                Ok(Applied::Changed)
            }
        }
        DeviceAction::TurnOff => {
            if *on {
                *on = false;
                Ok(Applied::Changed)
            } else {
                Ok(Applied::Unchanged)
            }
        }
        DeviceAction::SetBrightness { level } => {
            let level = validate_brightness(*level)?;
            if *brightness == level {
                Ok(Applied::Unchanged)
            } else {
                *brightness = level;
                Ok(Applied::Changed)
            }
        }
        DeviceAction::SetColor { color: next } => {
            if color == next {
                Ok(Applied::Unchanged)
            } else {
                *color = *next;
                Ok(Applied::Changed)
            }
        }
        other => Err(unsupported(kind, other)),
    }
}

impl Lock {
    fn apply(&mut self, action: &DeviceAction) -> Result<Applied, DomainError> {
        match action {
            DeviceAction::Lock => {
                if self.locked {
                    Ok(Applied::Unchanged)
                } else {
                    self.locked = true;
                    Ok(Applied::Changed)
                }
            }
            DeviceAction::Unlock { code } => {
                if *code == self.code {
                    let changed = self.locked || self.failed_attempts > 0;
                    self.locked = false;
                    self.failed_attempts = 0;
                    Ok(if changed {
                        Applied::Changed
                    } else {
                        Applied::Unchanged
                    })
                } else {
                    self.failed_attempts += 1;
                    Ok(Applied::UnlockRejected)
                }
            }
            other => Err(unsupported(DeviceKind::Lock, other)),
        }
    }
}

impl Blinds {
    fn apply(&mut self, action: &DeviceAction) -> Result<Applied, DomainError> {
        let (field, desired) = match action {
            DeviceAction::Raise => (&mut self.raised, true),
            DeviceAction::Lower => (&mut self.raised, false),
            DeviceAction::Open => (&mut self.open, true),
            DeviceAction::Close => (&mut self.open, false),
            other => return Err(unsupported(DeviceKind::Blinds, other)),
        };
        if *field == desired {
            Ok(Applied::Unchanged)
        } else {
            *field = desired;
            Ok(Applied::Changed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> Device {
        Device::create(DeviceDraft::Lamp {
            brightness: None,
            color: None,
        })
        .unwrap()
    }

    fn lock(code: &str) -> Device {
        Device::create(DeviceDraft::Lock {
            code: code.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn should_default_lamp_to_off_full_brightness_white() {
        let device = lamp();
        let attrs = device.attributes();
        assert_eq!(attrs["on"], AttributeValue::Bool(false));
        assert_eq!(attrs["brightness"], AttributeValue::Int(100));
        assert_eq!(attrs["color"], AttributeValue::from("white"));
    }

    #[test]
    fn should_honor_draft_overrides() {
        let device = Device::create(DeviceDraft::Lamp {
            brightness: Some(50),
            color: Some(Color::Blue),
        })
        .unwrap();
        let attrs = device.attributes();
        assert_eq!(attrs["on"], AttributeValue::Bool(false));
        assert_eq!(attrs["brightness"], AttributeValue::Int(50));
        assert_eq!(attrs["color"], AttributeValue::from("blue"));
    }

    #[test]
    fn should_reject_out_of_range_brightness_at_creation() {
        let result = Device::create(DeviceDraft::Lamp {
            brightness: Some(101),
            color: None,
        });
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
    }

    #[test]
    fn should_toggle_lamp() {
        let mut device = lamp();
        assert_eq!(device.apply(&DeviceAction::Toggle).unwrap(), Applied::Changed);
        assert_eq!(device.attributes()["on"], AttributeValue::Bool(true));
    }

    #[test]
    fn should_report_unchanged_when_turning_on_twice() {
        let mut device = lamp();
        assert_eq!(
            device.apply(&DeviceAction::TurnOn).unwrap(),
            Applied::Changed
        );
        assert_eq!(
            device.apply(&DeviceAction::TurnOn).unwrap(),
            Applied::Unchanged
        );
    }

    #[test]
    fn should_reject_brightness_above_maximum() {
        let mut device = lamp();
        let result = device.apply(&DeviceAction::SetBrightness { level: 150 });
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
        // no partial mutation
        assert_eq!(device.attributes()["brightness"], AttributeValue::Int(100));
    }

    #[test]
    fn should_reject_lock_action_on_lamp() {
        let mut device = lamp();
        let result = device.apply(&DeviceAction::Lock);
        assert!(matches!(result, Err(DomainError::InvalidValue(_))));
    }

    #[test]
    fn should_reject_malformed_lock_code_at_creation() {
        for bad in ["123", "123456789", "12ab"] {
            let result = Device::create(DeviceDraft::Lock {
                code: bad.to_string(),
            });
            assert!(matches!(result, Err(DomainError::InvalidValue(_))), "{bad}");
        }
    }

    #[test]
    fn should_unlock_with_correct_code_and_reset_counter() {
        let mut device = lock("1234");
        assert_eq!(
            device.apply(&DeviceAction::Unlock {
                code: "9999".to_string()
            })
            .unwrap(),
            Applied::UnlockRejected
        );
        assert_eq!(device.failed_attempts(), Some(1));

        assert_eq!(
            device.apply(&DeviceAction::Unlock {
                code: "1234".to_string()
            })
            .unwrap(),
            Applied::Changed
        );
        assert_eq!(device.failed_attempts(), Some(0));
        assert_eq!(device.attributes()["locked"], AttributeValue::Bool(false));
    }

    #[test]
    fn should_count_consecutive_failed_unlocks() {
        let mut device = lock("4321");
        for expected in 1..=3 {
            device
                .apply(&DeviceAction::Unlock {
                    code: "0000".to_string(),
                })
                .unwrap();
            assert_eq!(device.failed_attempts(), Some(expected));
        }
    }

    #[test]
    fn should_raise_and_lower_blinds_idempotently() {
        let mut device = Device::create(DeviceDraft::Blinds).unwrap();
        assert_eq!(
            device.apply(&DeviceAction::Raise).unwrap(),
            Applied::Unchanged
        );
        assert_eq!(
            device.apply(&DeviceAction::Lower).unwrap(),
            Applied::Changed
        );
        assert_eq!(device.attributes()["raised"], AttributeValue::Bool(false));
    }

    #[test]
    fn should_mark_lock_actions_as_security() {
        assert!(DeviceAction::Lock.is_security());
        assert!(
            DeviceAction::Unlock {
                code: "1234".to_string()
            }
            .is_security()
        );
        assert!(!DeviceAction::Toggle.is_security());
    }

    #[test]
    fn should_roundtrip_action_through_serde() {
        let action = DeviceAction::SetBrightness { level: 40 };
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"action":"set_brightness","level":40}"#);
        let parsed: DeviceAction = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, action);
    }
}
