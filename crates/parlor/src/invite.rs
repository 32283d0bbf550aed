//! Invitation routing: deliver a room invite to an online player and
//! acknowledge the sender either way.
//!
//! Both lookups go through presence only — no room state is touched, and
//! the invite itself carries everything the receiver needs to join.

use parlor_presence::Presence;
use parlor_protocol::{ConnId, ServerEvent, UserId};

/// Invites a player by durable user id.
///
/// The target must currently have a registered connection; otherwise the
/// sender is told the player is not online.
pub(crate) fn by_user_id(
    presence: &Presence,
    sender: ConnId,
    receiver_id: &UserId,
    room: &str,
    sender_name: &str,
) {
    match presence.resolve(receiver_id) {
        Some(target) => {
            presence.send(
                target,
                ServerEvent::ReceiveInvite {
                    room: room.to_string(),
                    sender_name: sender_name.to_string(),
                },
            );
            tracing::info!(
                %sender,
                %target,
                room = %room,
                "invite delivered"
            );
            ack(presence, sender, true, "Invite sent!".to_string());
        }
        None => {
            tracing::debug!(
                %sender,
                receiver = %receiver_id.0,
                "invite target offline"
            );
            ack(presence, sender, false, "Player is not online.".to_string());
        }
    }
}

/// Invites a player by display name.
///
/// Display names are only stamped once a player joins a room, so this
/// finds "someone who is online and playing". Guests can share a name;
/// the first match wins.
pub(crate) fn by_username(
    presence: &Presence,
    sender: ConnId,
    username: &str,
    room: &str,
    sender_name: &str,
) {
    match presence.find_by_username(username, sender) {
        Some(target) => {
            presence.send(
                target,
                ServerEvent::ReceiveInvite {
                    room: room.to_string(),
                    sender_name: sender_name.to_string(),
                },
            );
            tracing::info!(
                %sender,
                %target,
                room = %room,
                "invite delivered by name"
            );
            ack(
                presence,
                sender,
                true,
                format!("Invite sent to {username}!"),
            );
        }
        None => {
            tracing::debug!(
                %sender,
                username = %username,
                "invite target not found by name"
            );
            ack(
                presence,
                sender,
                false,
                format!(
                    "Player \"{username}\" is not online or has not joined \
                     a game yet."
                ),
            );
        }
    }
}

fn ack(presence: &Presence, sender: ConnId, success: bool, message: String) {
    presence.send(sender, ServerEvent::InviteSent { success, message });
}
