//! # domo-adapter-ws-axum
//!
//! WebSocket adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Accept WebSocket connections at `/ws` and run the line protocol:
//!   one `hello` handshake frame, then JSON commands and replies
//! - Own the connection table ([`directory::WsClientDirectory`]) the core
//!   addresses by client id when broadcasting
//! - Map protocol frames into dispatcher calls (driving adapter) and
//!   dispatcher results back into frames
//!
//! ## Dependency rule
//! Depends on `domo-app` (dispatcher and port traits) and `domo-domain`
//! (types used in frame mapping). Never leaks axum types into the core.

pub mod connection;
pub mod directory;
pub mod protocol;
pub mod router;
pub mod state;
