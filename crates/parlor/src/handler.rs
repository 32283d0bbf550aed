//! Per-connection handler: identity, event routing, and disconnect cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a small outbound pump task. The flow is:
//!   1. Track the connection in presence (mint its outbound channel)
//!   2. Loop: receive frames → decode client events → dispatch
//!   3. On close: leave every room, release the identity binding

use std::sync::Arc;

use parlor_presence::{Authenticator, PeerSender};
use parlor_protocol::{ClientEvent, Codec, ConnId, ServerEvent};
use parlor_room::{MatchRules, RoomError};
use parlor_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::invite;
use crate::server::ServerState;
use crate::ParlorError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<R, A, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<R, A, C>>,
) -> Result<(), ParlorError>
where
    R: MatchRules,
    A: Authenticator,
    C: Codec,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // The outbound channel is minted here and shared three ways: presence
    // keeps one sender for unicast delivery, rooms get clones on join, and
    // the pump below drains the receiver onto the socket.
    let (tx, rx) = mpsc::unbounded_channel();
    {
        let mut presence = state.presence.lock().await;
        presence.track(conn_id, tx.clone());
    }

    let pump = tokio::spawn(outbound_pump(
        Arc::clone(&conn),
        Arc::clone(&state),
        rx,
    ));

    // --- Inbound loop ---
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(
                    %conn_id, error = %e, "failed to decode event, dropping"
                );
                continue;
            }
        };

        dispatch(&state, conn_id, &tx, event).await;
    }

    // --- Disconnect cleanup ---
    pump.abort();
    let left = {
        let mut rooms = state.rooms.lock().await;
        rooms.leave_all(conn_id).await
    };
    let released = {
        let mut presence = state.presence.lock().await;
        presence.untrack(conn_id)
    };
    tracing::info!(
        %conn_id,
        rooms_left = left.len(),
        user_id = ?released,
        "connection cleaned up"
    );
    let _ = conn.close().await;

    Ok(())
}

/// Drains the connection's event queue onto the socket, one frame per
/// event. Exits when the queue closes (connection untracked) or a send
/// fails (peer gone).
async fn outbound_pump<R, A, C>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<R, A, C>>,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) where
    R: MatchRules,
    A: Authenticator,
    C: Codec,
{
    while let Some(event) = rx.recv().await {
        let frame = match state.codec.encode(&event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(
                    conn_id = %conn.id(), error = %e, "encode failed"
                );
                continue;
            }
        };
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(
                conn_id = %conn.id(), error = %e, "outbound send failed"
            );
            break;
        }
    }
}

/// Routes one decoded client event to the layer that owns it.
async fn dispatch<R, A, C>(
    state: &Arc<ServerState<R, A, C>>,
    conn_id: ConnId,
    tx: &PeerSender,
    event: ClientEvent,
) where
    R: MatchRules,
    A: Authenticator,
    C: Codec,
{
    match event {
        ClientEvent::Register { token } => {
            match state.auth.verify(&token).await {
                Ok(user_id) => {
                    tracing::info!(%conn_id, user = %user_id.0, "registered");
                    let mut presence = state.presence.lock().await;
                    presence.register(conn_id, user_id);
                }
                Err(e) => {
                    tracing::warn!(%conn_id, error = %e, "register failed");
                    let _ = tx.send(ServerEvent::RoomError {
                        reason: "authentication failed".to_string(),
                    });
                }
            }
        }

        ClientEvent::JoinRoom {
            room_name,
            username,
        } => {
            let user_id = {
                let presence = state.presence.lock().await;
                presence.user_id(conn_id).cloned()
            };

            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms
                    .join(&room_name, conn_id, user_id, &username, tx.clone())
                    .await
            };

            match result {
                Ok(_) => {
                    // Stamped only once the room has confirmed the join,
                    // so a rejected joiner stays invisible to
                    // invite-by-username.
                    let mut presence = state.presence.lock().await;
                    presence.stamp_username(conn_id, &username);
                }
                Err(e) => {
                    let _ = tx.send(ServerEvent::RoomError {
                        reason: client_reason(&e),
                    });
                }
            }
        }

        ClientEvent::LeaveRoom { room_name } => {
            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms.leave(&room_name, conn_id).await
            };
            if let Err(e) = result {
                tracing::debug!(
                    %conn_id, room = %room_name, error = %e, "leave failed"
                );
            }
        }

        ClientEvent::PlayerReady { room_name } => {
            let handle = state.rooms.lock().await.get(&room_name);
            match handle {
                Some(handle) => {
                    let _ = handle.ready(conn_id).await;
                }
                None => {
                    tracing::debug!(
                        %conn_id, room = %room_name, "ready for unknown room"
                    );
                }
            }
        }

        ClientEvent::MakeMove { room, payload } => {
            let handle = state.rooms.lock().await.get(&room);
            if let Some(handle) = handle {
                let _ = handle.relay_move(conn_id, payload).await;
            }
        }

        ClientEvent::SendMessage {
            room,
            username,
            text,
        } => {
            let handle = state.rooms.lock().await.get(&room);
            if let Some(handle) = handle {
                let _ = handle.chat(conn_id, &username, &text).await;
            }
        }

        ClientEvent::KickPlayer { room_name, target } => {
            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms.kick(&room_name, conn_id, target).await
            };
            if let Err(e) = result {
                let _ = tx.send(ServerEvent::RoomError {
                    reason: client_reason(&e),
                });
            }
        }

        ClientEvent::InviteFriend {
            receiver_id,
            room,
            sender_name,
        } => {
            let presence = state.presence.lock().await;
            invite::by_user_id(
                &presence,
                conn_id,
                &receiver_id,
                &room,
                &sender_name,
            );
        }

        ClientEvent::InviteByUsername {
            username,
            room,
            sender_name,
        } => {
            let presence = state.presence.lock().await;
            invite::by_username(
                &presence,
                conn_id,
                &username,
                &room,
                &sender_name,
            );
        }
    }
}

/// Maps a room error onto the message the client displays verbatim.
fn client_reason(err: &RoomError) -> String {
    match err {
        RoomError::Full { capacity, .. } => {
            format!("Room is full (max {capacity} players).")
        }
        other => other.to_string(),
    }
}
