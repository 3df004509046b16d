//! # domo-domain
//!
//! Pure domain model for the domo smart-house system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions
//! - Define **Houses** (top-level containers: rooms plus one alarm)
//! - Define **Rooms** (device containers owning device-id assignment)
//! - Define **Devices** (tagged union: lamp, ceiling light, lock, blinds)
//! - Define **Alarms** (per-house security state machine)
//! - Define **Events** (flat change payloads suitable for broadcast)
//! - Define **Snapshots** (serializable read views)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod alarm;
pub mod attribute;
pub mod device;
pub mod error;
pub mod event;
pub mod house;
pub mod id;
pub mod room;
pub mod snapshot;
