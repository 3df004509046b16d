//! Per-connection protocol loop.
//!
//! Each socket gets two halves: this read loop, and a writer task draining
//! the connection's channel into the sink. Replies and broadcasts both go
//! through the channel, so frame ordering toward one client is the channel
//! order and the read loop never blocks on a slow socket.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use domo_app::dispatcher::{Command, Role, Session};
use domo_app::ports::ClientDirectory;
use domo_domain::id::ClientId;

use crate::protocol::{self, Hello};
use crate::state::HubState;

/// Run the protocol for one accepted socket until it disconnects.
pub async fn serve(state: HubState, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();

    let Some(role) = handshake(&mut sink, &mut stream).await else {
        return;
    };
    let client = ClientId::new();
    let session = Session { client, role };
    tracing::info!(%client, ?role, "client connected");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    state.directory.register(client, tx);

    let welcome = protocol::welcome_frame(client, &state.manager.list_houses());
    if sink.send(Message::Text(welcome.into())).await.is_err() {
        state.directory.unregister(client);
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let reply = handle_frame(&state, session, text.as_str());
                if state.directory.send(client, &reply).is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            // pings are answered by the websocket layer; binary is not
            // part of the protocol
            Ok(_) => {}
        }
    }

    state.dispatcher.disconnect(client);
    state.directory.unregister(client);
    writer.abort();
    tracing::info!(%client, "client disconnected");
}

async fn handshake(
    sink: &mut SplitSink<WebSocket, Message>,
    stream: &mut SplitStream<WebSocket>,
) -> Option<Role> {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<Hello>(text.as_str()) {
                Ok(hello) => return Some(hello.role),
                Err(err) => {
                    let refusal = protocol::bad_frame(&format!("expected hello frame: {err}"));
                    let _ = sink.send(Message::Text(refusal.into())).await;
                    return None;
                }
            },
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
    None
}

fn handle_frame(state: &HubState, session: Session, text: &str) -> String {
    match serde_json::from_str::<Command>(text) {
        Ok(command) => match state.dispatcher.dispatch(session, command) {
            Ok(response) => protocol::response_frame(&response),
            Err(err) => {
                tracing::debug!(client = %session.client, error = %err, "command refused");
                protocol::domain_error_frame(&err)
            }
        },
        Err(err) => protocol::bad_frame(&err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domo_domain::device::DeviceDraft;
    use domo_domain::id::HouseId;

    fn seeded_state() -> (HubState, HouseId) {
        let state = HubState::assemble();
        let house_id = state.manager.register_house("Test House", 3);
        let (room_id, _) = state.manager.add_room(house_id, "Hall").unwrap();
        state
            .manager
            .add_device(
                house_id,
                room_id,
                DeviceDraft::Lamp {
                    brightness: None,
                    color: None,
                },
            )
            .unwrap();
        (state, house_id)
    }

    fn session(role: Role) -> Session {
        Session {
            client: ClientId::new(),
            role,
        }
    }

    #[test]
    fn should_reply_with_houses_for_list_command() {
        let (state, _) = seeded_state();
        let reply = handle_frame(
            &state,
            session(Role::Guest),
            r#"{"command":"list_houses"}"#,
        );
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["reply"], "houses");
        assert_eq!(value["houses"][0]["name"], "Test House");
    }

    #[test]
    fn should_reply_with_error_frame_for_domain_refusal() {
        let (state, _) = seeded_state();
        let reply = handle_frame(
            &state,
            session(Role::Guest),
            r#"{"command":"join_house","house_id":99}"#,
        );
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["reply"], "error");
        assert_eq!(value["error"], "not-found");
    }

    #[test]
    fn should_reply_with_bad_frame_for_garbage() {
        let (state, _) = seeded_state();
        let reply = handle_frame(&state, session(Role::Admin), "not json");
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["reply"], "error");
        assert_eq!(value["error"], "bad-frame");
    }

    #[test]
    fn should_run_join_then_action_over_frames() {
        let (state, house_id) = seeded_state();
        let actor = session(Role::Regular);

        let reply = handle_frame(
            &state,
            actor,
            &format!(r#"{{"command":"join_house","house_id":{house_id}}}"#),
        );
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["reply"], "joined");

        let reply = handle_frame(
            &state,
            actor,
            r#"{"command":"device_action","room_id":1,"device_id":1,"action":"turn_on"}"#,
        );
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["reply"], "action_applied");
        assert_eq!(value["applied"], "changed");
    }
}
