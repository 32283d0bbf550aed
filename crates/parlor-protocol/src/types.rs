//! Event and identity types for Parlor's wire format.
//!
//! Every event is an internally tagged JSON object: the `event` field names
//! the variant in snake_case, the remaining fields are the payload. Move
//! payloads stay opaque (`serde_json::Value`) — the coordinator relays them
//! without interpreting the variant-specific contents.

use std::fmt;

use parlor_transport::ConnId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Durable identifier for a user, issued by the external auth provider.
///
/// Opaque to the coordinator. Distinct from [`ConnId`]: a user keeps the
/// same `UserId` across connections, while every socket gets a fresh
/// `ConnId`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Match roles
// ---------------------------------------------------------------------------

/// The two complementary positions in a two-player match.
///
/// Role `A` is always the first mover. The built-in tic-tac-toe variant
/// renders A as "X" and B as "O", but the coordinator itself only knows
/// about A and B.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Role {
    A,
    B,
}

impl Role {
    /// Returns the opposing role.
    pub fn opponent(self) -> Role {
        match self {
            Role::A => Role::B,
            Role::B => Role::A,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::A => write!(f, "A"),
            Role::B => write!(f, "B"),
        }
    }
}

// ---------------------------------------------------------------------------
// Roster entry
// ---------------------------------------------------------------------------

/// One entry of a room roster broadcast.
///
/// `user_id` is `None` until the connection has registered its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMember {
    pub conn_id: ConnId,
    pub user_id: Option<UserId>,
    pub username: String,
}

// ---------------------------------------------------------------------------
// Client → server events
// ---------------------------------------------------------------------------

/// Everything a client can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Bind this connection to a user identity. The token is verified by
    /// the external auth provider before any binding happens.
    Register { token: String },

    /// Join (implicitly creating) a room, stamping the display name.
    JoinRoom { room_name: String, username: String },

    /// Leave a room explicitly.
    LeaveRoom { room_name: String },

    /// Signal readiness for a match in the given room.
    PlayerReady { room_name: String },

    /// A game move. The payload is opaque to the coordinator.
    MakeMove {
        room: String,
        payload: serde_json::Value,
    },

    /// A chat line for every member of the room, sender included.
    SendMessage {
        room: String,
        username: String,
        text: String,
    },

    /// Remove another connection from the room. Host only.
    KickPlayer { room_name: String, target: ConnId },

    /// Invite a friend by their durable user id.
    InviteFriend {
        receiver_id: UserId,
        room: String,
        sender_name: String,
    },

    /// Invite whoever is currently online under a display name.
    InviteByUsername {
        username: String,
        room: String,
        sender_name: String,
    },
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// Everything the coordinator can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A request failed. Sent only to the requester.
    RoomError { reason: String },

    /// Chat broadcast — player lines and system announcements alike.
    ReceiveMessage {
        room: String,
        username: String,
        text: String,
    },

    /// Current room roster, in join order.
    RoomUsers { users: Vec<RoomMember> },

    /// Readiness count after a mutation (0–2).
    UpdateReadyCount { count: usize },

    /// The match is starting. Unicast, one per participant.
    /// Role A always has the first turn.
    GameStart { role: Role, is_first_turn: bool },

    /// A relayed move payload, forwarded unchanged to the other members.
    UpdateBoard { payload: serde_json::Value },

    /// The match reached a terminal state. `winner: None` means a draw.
    GameOver {
        winner: Option<Role>,
        reason: String,
    },

    /// Unicast to a connection that was just kicked.
    KickedFromRoom,

    /// An invitation delivered to its target.
    ReceiveInvite { room: String, sender_name: String },

    /// Delivery report for an invitation, unicast to the sender.
    InviteSent { success: bool, message: String },
}

// =========================================================================
// Tests
// =========================================================================
