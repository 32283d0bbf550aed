//! Room directory: create-on-join, routing by name, sweep of empty rooms.

use std::collections::{HashMap, HashSet};

use parlor_presence::PeerSender;
use parlor_protocol::{ConnId, UserId};

use crate::room::spawn_room;
use crate::{MatchRules, RoomConfig, RoomError, RoomHandle};

/// The directory of live rooms.
///
/// Rooms come into existence when the first player joins a name and are
/// reaped by [`RoomManager::sweep`] once empty — there is no explicit
/// create or destroy operation.
///
/// The manager also keeps a connection → rooms index so a disconnect can
/// be cleaned up without scanning every room. The index may briefly
/// over-approximate (a kick removes the member inside the actor before
/// the index catches up), which is fine: [`RoomHandle::leave`] on a
/// non-member is a no-op.
pub struct RoomManager<R: MatchRules> {
    config: RoomConfig,
    rules: R,
    rooms: HashMap<String, RoomHandle>,
    memberships: HashMap<ConnId, HashSet<String>>,
}

impl<R: MatchRules> RoomManager<R> {
    /// Creates a manager that spawns rooms with the given rules and config.
    pub fn new(rules: R, config: RoomConfig) -> Self {
        Self {
            config,
            rules,
            rooms: HashMap::new(),
            memberships: HashMap::new(),
        }
    }

    /// Returns the handle for a room, if it exists.
    pub fn get(&self, room_name: &str) -> Option<RoomHandle> {
        self.rooms.get(room_name).cloned()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Joins a connection to a room, creating the room if needed.
    pub async fn join(
        &mut self,
        room_name: &str,
        conn_id: ConnId,
        user_id: Option<UserId>,
        username: &str,
        sender: PeerSender,
    ) -> Result<RoomHandle, RoomError> {
        let handle = match self.rooms.get(room_name) {
            Some(handle) => handle.clone(),
            None => {
                tracing::info!(room = %room_name, "creating room");
                let handle = spawn_room(
                    room_name.to_string(),
                    self.config.clone(),
                    self.rules.clone(),
                );
                self.rooms.insert(room_name.to_string(), handle.clone());
                handle
            }
        };

        handle.join(conn_id, user_id, username, sender).await?;
        self.memberships
            .entry(conn_id)
            .or_default()
            .insert(room_name.to_string());
        Ok(handle)
    }

    /// Removes a connection from a room. Returns `true` if it was a member.
    pub async fn leave(
        &mut self,
        room_name: &str,
        conn_id: ConnId,
    ) -> Result<bool, RoomError> {
        let handle = self
            .get(room_name)
            .ok_or_else(|| RoomError::NotFound(room_name.to_string()))?;
        let was_member = handle.leave(conn_id).await?;
        if let Some(rooms) = self.memberships.get_mut(&conn_id) {
            rooms.remove(room_name);
            if rooms.is_empty() {
                self.memberships.remove(&conn_id);
            }
        }
        Ok(was_member)
    }

    /// Removes a connection from every room it is in. Used on disconnect.
    /// Returns the names of the rooms it was actually a member of.
    pub async fn leave_all(&mut self, conn_id: ConnId) -> Vec<String> {
        let Some(rooms) = self.memberships.remove(&conn_id) else {
            return Vec::new();
        };

        let mut left = Vec::new();
        for room_name in rooms {
            if let Some(handle) = self.get(&room_name) {
                match handle.leave(conn_id).await {
                    Ok(true) => left.push(room_name),
                    Ok(false) => {}
                    Err(err) => {
                        tracing::warn!(
                            room = %room_name,
                            %conn_id,
                            error = %err,
                            "failed to leave room on disconnect"
                        );
                    }
                }
            }
        }
        left
    }

    /// Kicks `target` out of a room on behalf of `requester`. Host-only;
    /// the room actor enforces that.
    pub async fn kick(
        &mut self,
        room_name: &str,
        requester: ConnId,
        target: ConnId,
    ) -> Result<(), RoomError> {
        let handle = self
            .get(room_name)
            .ok_or_else(|| RoomError::NotFound(room_name.to_string()))?;
        handle.kick(requester, target).await?;
        if let Some(rooms) = self.memberships.get_mut(&target) {
            rooms.remove(room_name);
            if rooms.is_empty() {
                self.memberships.remove(&target);
            }
        }
        Ok(())
    }

    /// Shuts down and removes every room with no members. Returns how
    /// many were reaped.
    pub async fn sweep(&mut self) -> usize {
        let mut empty = Vec::new();
        for (name, handle) in &self.rooms {
            match handle.member_count().await {
                Ok(0) => empty.push(name.clone()),
                Ok(_) => {}
                // Actor already gone; reap the entry.
                Err(_) => empty.push(name.clone()),
            }
        }

        for name in &empty {
            if let Some(handle) = self.rooms.remove(name) {
                let _ = handle.shutdown().await;
            }
            tracing::info!(room = %name, "swept empty room");
        }
        empty.len()
    }
}
