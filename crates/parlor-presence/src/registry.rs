//! The presence registry: live connections and their identity bindings.
//!
//! # Concurrency note
//!
//! `Presence` is NOT thread-safe by itself — plain `HashMap`s, no locks.
//! The server owns one instance behind a `tokio::sync::Mutex`; keeping the
//! registry lock-free here avoids double locking and keeps every operation
//! a synchronous read-modify-write, which is what makes the binding
//! invariants easy to uphold.

use std::collections::HashMap;

use parlor_protocol::{ConnId, ServerEvent, UserId};
use tokio::sync::mpsc;

/// Channel sender for delivering outbound events to one connection's
/// writer task. Unbounded: broadcasts already enqueued for a peer are
/// still drained even while that peer is mid-disconnect.
pub type PeerSender = mpsc::UnboundedSender<ServerEvent>;

/// Per-connection metadata.
struct Peer {
    user_id: Option<UserId>,
    /// Stamped on the first room join; invite-by-username only finds
    /// connections that have one.
    username: Option<String>,
    sender: PeerSender,
}

/// Tracks every live connection and which one speaks for each user id.
///
/// ## Binding invariants
///
/// - At most one binding per user id at any time.
/// - A new registration for the same user overwrites the old binding
///   (last-registered-wins). The orphaned connection is NOT notified —
///   a known limitation inherited from the casual-use design: the old
///   socket stays open but can no longer receive invites.
/// - A late disconnect of an overwritten connection must not tear down
///   the newer binding; [`release`](Self::release) guards against that.
pub struct Presence {
    peers: HashMap<ConnId, Peer>,
    bindings: HashMap<UserId, ConnId>,
}

impl Presence {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            peers: HashMap::new(),
            bindings: HashMap::new(),
        }
    }

    /// Starts tracking a freshly accepted connection.
    pub fn track(&mut self, conn_id: ConnId, sender: PeerSender) {
        self.peers.insert(
            conn_id,
            Peer {
                user_id: None,
                username: None,
                sender,
            },
        );
        tracing::debug!(%conn_id, "connection tracked");
    }

    /// Binds a user id to a connection. Idempotent; overwrites any prior
    /// binding for the same user (last-registered-wins).
    pub fn register(&mut self, conn_id: ConnId, user_id: UserId) {
        if let Some(old) = self.bindings.insert(user_id.clone(), conn_id) {
            if old != conn_id {
                tracing::info!(
                    %user_id, %old, new = %conn_id,
                    "identity binding overwritten"
                );
            }
        }
        if let Some(peer) = self.peers.get_mut(&conn_id) {
            peer.user_id = Some(user_id);
        }
    }

    /// Returns the connection currently bound to a user, if any.
    pub fn resolve(&self, user_id: &UserId) -> Option<ConnId> {
        self.bindings.get(user_id).copied()
    }

    /// Removes a user binding, but only if `conn_id` still owns it.
    ///
    /// A no-op when the binding was already overwritten by a newer
    /// registration — a late disconnect event must not unbind the user's
    /// current connection. Returns the released user id, if any.
    pub fn release(&mut self, conn_id: ConnId) -> Option<UserId> {
        let user_id = self
            .peers
            .get(&conn_id)
            .and_then(|p| p.user_id.clone())?;
        if self.bindings.get(&user_id) == Some(&conn_id) {
            self.bindings.remove(&user_id);
            tracing::debug!(%conn_id, %user_id, "identity binding released");
            return Some(user_id);
        }
        None
    }

    /// Stamps the display name a connection joined under.
    pub fn stamp_username(&mut self, conn_id: ConnId, username: &str) {
        if let Some(peer) = self.peers.get_mut(&conn_id) {
            peer.username = Some(username.to_string());
        }
    }

    /// Returns the stamped display name of a connection, if any.
    pub fn username(&self, conn_id: ConnId) -> Option<&str> {
        self.peers.get(&conn_id)?.username.as_deref()
    }

    /// Returns the user id a connection registered as, if any.
    pub fn user_id(&self, conn_id: ConnId) -> Option<&UserId> {
        self.peers.get(&conn_id)?.user_id.as_ref()
    }

    /// Scans live connections for one stamped with the given display name,
    /// skipping the requester's own connection.
    ///
    /// Display names are not unique across guests; when several match, the
    /// first one found wins. Names are only stamped once a connection has
    /// joined a room, so a logged-in user who never joined is not found.
    pub fn find_by_username(
        &self,
        username: &str,
        excluding: ConnId,
    ) -> Option<ConnId> {
        self.peers.iter().find_map(|(id, peer)| {
            (*id != excluding && peer.username.as_deref() == Some(username))
                .then_some(*id)
        })
    }

    /// Delivers an event to one connection. Silently drops it when the
    /// connection is gone or its writer has shut down.
    pub fn send(&self, conn_id: ConnId, event: ServerEvent) {
        if let Some(peer) = self.peers.get(&conn_id) {
            let _ = peer.sender.send(event);
        }
    }

    /// Stops tracking a connection: releases its identity binding (stale-
    /// guarded) and drops its metadata. Returns the released user id.
    pub fn untrack(&mut self, conn_id: ConnId) -> Option<UserId> {
        let released = self.release(conn_id);
        if self.peers.remove(&conn_id).is_some() {
            tracing::debug!(%conn_id, "connection untracked");
        }
        released
    }

    /// Number of tracked connections.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Returns `true` if no connection is tracked.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl Default for Presence {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
