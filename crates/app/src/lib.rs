//! # domo-app
//!
//! Application core — the shared-state manager and its collaborators.
//!
//! ## Responsibilities
//! - **Ports** (traits) that the transport adapter implements:
//!   - [`ports::ClientDirectory`] — deliver a payload to one client handle
//!   - [`ports::EventSink`] — publish a security-triggered event
//! - [`state_manager::StateManager`] — the single authoritative in-memory
//!   model with one mutex per house
//! - [`security`] — the alarm guard predicate and failed-unlock bookkeeping
//! - [`subscriptions::SubscriptionRegistry`] — house ↔ client membership
//! - [`broadcaster::Broadcaster`] — per-house fan-out of change events
//! - [`dispatcher::Dispatcher`] — parsed command → state operation →
//!   broadcast
//!
//! ## Dependency rule
//! Depends on `domo-domain` only. Never imports adapter crates; adapters
//! depend on *this* crate, not the reverse.

pub mod broadcaster;
pub mod dispatcher;
pub mod ports;
pub mod security;
pub mod state_manager;
pub mod subscriptions;
