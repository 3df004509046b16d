//! Frame mapping between the wire and the dispatcher.
//!
//! The line protocol is newline-free JSON text frames:
//!
//! - client → server, first frame: `{"role":"admin"}`
//! - client → server, afterwards: a command, e.g.
//!   `{"command":"device_action","room_id":1,"device_id":2,"action":"toggle"}`
//! - server → client: a reply (`{"reply":...}`), an error
//!   (`{"reply":"error",...}`), or an unsolicited change event broadcast
//!   to the house.

use serde::Deserialize;
use serde_json::json;

use domo_app::dispatcher::{Response, Role};
use domo_app::state_manager::HouseOverview;
use domo_domain::error::DomainError;
use domo_domain::id::ClientId;

/// Handshake frame, expected once before any command.
#[derive(Debug, Deserialize)]
pub struct Hello {
    pub role: Role,
}

/// Greeting sent after a successful handshake.
#[must_use]
pub fn welcome_frame(client: ClientId, houses: &[HouseOverview]) -> String {
    json!({
        "reply": "welcome",
        "client_id": client,
        "houses": houses,
    })
    .to_string()
}

/// Serialize a dispatcher reply.
#[must_use]
pub fn response_frame(response: &Response) -> String {
    serde_json::to_string(response)
        .unwrap_or_else(|_| error_text("internal", "failed to serialize reply"))
}

/// Serialize a refusal.
#[must_use]
pub fn domain_error_frame(error: &DomainError) -> String {
    error_text(error.kind(), &error.to_string())
}

/// Serialize a malformed-frame refusal.
#[must_use]
pub fn bad_frame(detail: &str) -> String {
    error_text("bad-frame", detail)
}

fn error_text(kind: &str, message: &str) -> String {
    json!({
        "reply": "error",
        "error": kind,
        "message": message,
    })
    .to_string()
}
