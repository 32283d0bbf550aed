//! Room actor: an isolated Tokio task that owns one room's state.
//!
//! Membership, the readiness set, and the active match all live inside the
//! actor; the outside world talks to it through an mpsc channel. That is
//! the whole concurrency story for a room — two connections signaling
//! ready "at the same time" are just two commands processed one after the
//! other, so the both-ready transition fires exactly once.

use std::collections::HashSet;

use parlor_presence::PeerSender;
use parlor_protocol::{ConnId, Role, RoomMember, ServerEvent, UserId};
use rand::Rng;
use tokio::sync::{mpsc, oneshot};

use crate::{MatchRules, MatchVerdict, RoomConfig, RoomError};

/// Display name used for coordinator-generated chat lines.
const SYSTEM_NAME: &str = "System";

/// Returns the user id a room name designates as host, if it follows the
/// personal-lobby convention (`room_<user id>`).
pub fn host_user_id(room_name: &str) -> Option<UserId> {
    room_name
        .strip_prefix("room_")
        .filter(|rest| !rest.is_empty())
        .map(|rest| UserId(rest.to_string()))
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Add a connection to the room (idempotent for existing members).
    Join {
        conn_id: ConnId,
        user_id: Option<UserId>,
        username: String,
        sender: PeerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a connection. `true` in the reply means it was a member.
    Leave {
        conn_id: ConnId,
        reply: oneshot::Sender<bool>,
    },

    /// Host-only removal of another member.
    Kick {
        requester: ConnId,
        target: ConnId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Signal readiness for a match.
    Ready { conn_id: ConnId },

    /// Relay a move payload.
    Move {
        conn_id: ConnId,
        payload: serde_json::Value,
    },

    /// Relay a chat line to every member, sender included.
    Chat {
        conn_id: ConnId,
        username: String,
        text: String,
    },

    /// Current number of members (used by the sweeper).
    MemberCount { reply: oneshot::Sender<usize> },

    /// Shut down the room.
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone, Debug)]
pub struct RoomHandle {
    name: String,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.name.clone())
    }

    /// Sends a join request to the room.
    pub async fn join(
        &self,
        conn_id: ConnId,
        user_id: Option<UserId>,
        username: &str,
        sender: PeerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                conn_id,
                user_id,
                username: username.to_string(),
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Removes a connection. Returns `true` if it was a member.
    pub async fn leave(&self, conn_id: ConnId) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                conn_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Sends a kick request to the room.
    pub async fn kick(
        &self,
        requester: ConnId,
        target: ConnId,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Kick {
                requester,
                target,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Signals readiness (fire-and-forget).
    pub async fn ready(&self, conn_id: ConnId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Ready { conn_id })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Relays a move payload (fire-and-forget).
    pub async fn relay_move(
        &self,
        conn_id: ConnId,
        payload: serde_json::Value,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Move { conn_id, payload })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Relays a chat line (fire-and-forget).
    pub async fn chat(
        &self,
        conn_id: ConnId,
        username: &str,
        text: &str,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Chat {
                conn_id,
                username: username.to_string(),
                text: text.to_string(),
            })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Returns the current member count.
    pub async fn member_count(&self) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::MemberCount { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }
}

/// One member of the room, in join order.
struct Member {
    conn_id: ConnId,
    user_id: Option<UserId>,
    username: String,
    sender: PeerSender,
}

/// The match currently in progress, if any.
struct ActiveMatch<S> {
    state: S,
    role_a: ConnId,
    role_b: ConnId,
    turn: Role,
}

impl<S> ActiveMatch<S> {
    fn role_of(&self, conn_id: ConnId) -> Option<Role> {
        if conn_id == self.role_a {
            Some(Role::A)
        } else if conn_id == self.role_b {
            Some(Role::B)
        } else {
            None
        }
    }
}

/// Maps the two ready connections to (first mover, second mover).
///
/// Pure so the one-shot random designation stays testable: the caller
/// draws a single boolean and the assignment follows from it.
fn assign_first_mover(pair: [ConnId; 2], flip: bool) -> (ConnId, ConnId) {
    if flip {
        (pair[0], pair[1])
    } else {
        (pair[1], pair[0])
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<R: MatchRules> {
    name: String,
    config: RoomConfig,
    rules: R,
    members: Vec<Member>,
    /// Invariant: a subset of the member connections at all times. Every
    /// path that removes a member purges it here in the same command.
    ready: HashSet<ConnId>,
    /// Set once anyone has signaled readiness in this room's lifetime.
    ready_seen: bool,
    active: Option<ActiveMatch<R::State>>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<R: MatchRules> RoomActor<R> {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        tracing::info!(room = %self.name, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    conn_id,
                    user_id,
                    username,
                    sender,
                    reply,
                } => {
                    let result =
                        self.handle_join(conn_id, user_id, username, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { conn_id, reply } => {
                    let _ = reply.send(self.handle_leave(conn_id));
                }
                RoomCommand::Kick {
                    requester,
                    target,
                    reply,
                } => {
                    let _ = reply.send(self.handle_kick(requester, target));
                }
                RoomCommand::Ready { conn_id } => {
                    self.handle_ready(conn_id);
                }
                RoomCommand::Move { conn_id, payload } => {
                    self.handle_move(conn_id, payload);
                }
                RoomCommand::Chat {
                    conn_id,
                    username,
                    text,
                } => {
                    self.handle_chat(conn_id, username, text);
                }
                RoomCommand::MemberCount { reply } => {
                    let _ = reply.send(self.members.len());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room = %self.name, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room = %self.name, "room actor stopped");
    }

    fn member(&self, conn_id: ConnId) -> Option<&Member> {
        self.members.iter().find(|m| m.conn_id == conn_id)
    }

    fn handle_join(
        &mut self,
        conn_id: ConnId,
        user_id: Option<UserId>,
        username: String,
        sender: PeerSender,
    ) -> Result<(), RoomError> {
        if let Some(member) =
            self.members.iter_mut().find(|m| m.conn_id == conn_id)
        {
            // Idempotent rejoin: refresh the stamped name, re-announce so
            // the client sees the same events as a fresh join.
            member.username = username.clone();
        } else {
            if self.members.len() >= self.config.capacity {
                return Err(RoomError::Full {
                    room: self.name.clone(),
                    capacity: self.config.capacity,
                });
            }
            self.members.push(Member {
                conn_id,
                user_id,
                username: username.clone(),
                sender,
            });
        }

        tracing::info!(
            room = %self.name,
            %conn_id,
            members = self.members.len(),
            "player joined"
        );

        self.system_chat(format!("{username} joined the game."));
        self.broadcast_roster();
        // A late joiner must see the ready state it walked into. Announced
        // whenever readiness has ever been signaled here, zero included —
        // a started match clears the set but the count stays published.
        if self.ready_seen {
            self.broadcast_ready_count();
        }
        Ok(())
    }

    fn handle_leave(&mut self, conn_id: ConnId) -> bool {
        let Some(pos) =
            self.members.iter().position(|m| m.conn_id == conn_id)
        else {
            return false;
        };
        let member = self.members.remove(pos);

        tracing::info!(
            room = %self.name,
            %conn_id,
            members = self.members.len(),
            "player left"
        );

        self.system_chat(format!("{} left the room.", member.username));
        self.broadcast_roster();
        // The count is only re-announced when the departure changed it.
        if self.ready.remove(&conn_id) {
            self.broadcast_ready_count();
        }
        self.forfeit_if_participant(conn_id, &member.username);
        true
    }

    fn handle_kick(
        &mut self,
        requester: ConnId,
        target: ConnId,
    ) -> Result<(), RoomError> {
        let host = host_user_id(&self.name);
        let requester_user =
            self.member(requester).and_then(|m| m.user_id.clone());
        if host.is_none() || requester_user != host {
            return Err(RoomError::NotHost(requester, self.name.clone()));
        }

        let Some(pos) =
            self.members.iter().position(|m| m.conn_id == target)
        else {
            return Err(RoomError::NotMember(target, self.name.clone()));
        };
        let member = self.members.remove(pos);

        tracing::info!(
            room = %self.name,
            %requester,
            %target,
            "player kicked"
        );

        // The target gets a dedicated event, distinct from the broadcast.
        let _ = member.sender.send(ServerEvent::KickedFromRoom);
        self.system_chat(format!(
            "{} was kicked from the room.",
            member.username
        ));
        self.broadcast_roster();
        if self.ready.remove(&target) {
            self.broadcast_ready_count();
        }
        self.forfeit_if_participant(target, &member.username);
        Ok(())
    }

    fn handle_ready(&mut self, conn_id: ConnId) {
        if self.member(conn_id).is_none() {
            tracing::warn!(
                room = %self.name,
                %conn_id,
                "ready signal from non-member, ignoring"
            );
            return;
        }

        // Idempotent; re-signaling does not duplicate.
        self.ready.insert(conn_id);
        self.ready_seen = true;
        self.broadcast_ready_count();

        if self.ready.len() == 2 {
            self.start_match();
        }
    }

    /// The readiness-to-start transition: one random draw designates the
    /// first mover, both participants get their private assignment, and
    /// the readiness set resets so a rematch needs both to re-signal.
    fn start_match(&mut self) {
        // Take the pair in join order so the flip is the only randomness.
        let pair: Vec<ConnId> = self
            .members
            .iter()
            .map(|m| m.conn_id)
            .filter(|c| self.ready.contains(c))
            .collect();
        let (a, b) = match pair.as_slice() {
            &[a, b] => (a, b),
            _ => {
                tracing::warn!(room = %self.name, "ready set out of sync");
                return;
            }
        };

        let flip = rand::rng().random::<bool>();
        let (first, second) = assign_first_mover([a, b], flip);

        self.send_to(
            first,
            ServerEvent::GameStart {
                role: Role::A,
                is_first_turn: true,
            },
        );
        self.send_to(
            second,
            ServerEvent::GameStart {
                role: Role::B,
                is_first_turn: false,
            },
        );

        self.ready.clear();
        self.active = Some(ActiveMatch {
            state: self.rules.start(),
            role_a: first,
            role_b: second,
            turn: Role::A,
        });

        tracing::info!(
            room = %self.name,
            first = %first,
            second = %second,
            "match started"
        );
    }

    fn handle_move(&mut self, conn_id: ConnId, payload: serde_json::Value) {
        let Some(active) = &mut self.active else {
            tracing::debug!(
                room = %self.name,
                %conn_id,
                "move with no active match, dropping"
            );
            return;
        };

        let Some(role) = active.role_of(conn_id) else {
            tracing::warn!(
                room = %self.name,
                %conn_id,
                "move from non-participant, dropping"
            );
            return;
        };

        if role != active.turn {
            tracing::debug!(
                room = %self.name,
                %conn_id,
                "move out of turn, dropping"
            );
            return;
        }

        if let Err(reason) =
            self.rules.validate(&active.state, role, &payload)
        {
            tracing::debug!(
                room = %self.name,
                %conn_id,
                %reason,
                "illegal move, dropping"
            );
            return;
        }

        let verdict = self.rules.apply(&mut active.state, role, &payload);
        active.turn = active.turn.opponent();

        // Relayed unchanged, to everyone but the mover.
        self.broadcast_except(
            conn_id,
            ServerEvent::UpdateBoard { payload },
        );

        match verdict {
            MatchVerdict::Continue => {}
            MatchVerdict::Won { winner, reason } => {
                self.finish_match(Some(winner), reason);
            }
            MatchVerdict::Drawn { reason } => {
                self.finish_match(None, reason);
            }
        }
    }

    fn handle_chat(
        &mut self,
        conn_id: ConnId,
        username: String,
        text: String,
    ) {
        if self.member(conn_id).is_none() {
            tracing::warn!(
                room = %self.name,
                %conn_id,
                "chat from non-member, ignoring"
            );
            return;
        }
        // Includes the sender: their client renders the authoritative
        // echo rather than optimistic local state.
        self.broadcast(ServerEvent::ReceiveMessage {
            room: self.name.clone(),
            username,
            text,
        });
    }

    /// Ends the active match when a participant is removed mid-game: the
    /// remaining participant wins by forfeit.
    fn forfeit_if_participant(&mut self, conn_id: ConnId, username: &str) {
        let Some(active) = &self.active else {
            return;
        };
        let Some(role) = active.role_of(conn_id) else {
            return;
        };
        self.finish_match(
            Some(role.opponent()),
            format!("{username} left the match"),
        );
    }

    fn finish_match(&mut self, winner: Option<Role>, reason: String) {
        tracing::info!(room = %self.name, ?winner, %reason, "match over");
        self.active = None;
        self.broadcast(ServerEvent::GameOver { winner, reason });
    }

    // -- Broadcast helpers -------------------------------------------------

    fn broadcast(&self, event: ServerEvent) {
        for member in &self.members {
            let _ = member.sender.send(event.clone());
        }
    }

    fn broadcast_except(&self, excluded: ConnId, event: ServerEvent) {
        for member in &self.members {
            if member.conn_id != excluded {
                let _ = member.sender.send(event.clone());
            }
        }
    }

    fn send_to(&self, conn_id: ConnId, event: ServerEvent) {
        if let Some(member) = self.member(conn_id) {
            let _ = member.sender.send(event);
        }
    }

    fn system_chat(&self, text: String) {
        self.broadcast(ServerEvent::ReceiveMessage {
            room: self.name.clone(),
            username: SYSTEM_NAME.to_string(),
            text,
        });
    }

    fn broadcast_roster(&self) {
        let users: Vec<RoomMember> = self
            .members
            .iter()
            .map(|m| RoomMember {
                conn_id: m.conn_id,
                user_id: m.user_id.clone(),
                username: m.username.clone(),
            })
            .collect();
        self.broadcast(ServerEvent::RoomUsers { users });
    }

    fn broadcast_ready_count(&self) {
        self.broadcast(ServerEvent::UpdateReadyCount {
            count: self.ready.len(),
        });
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room<R: MatchRules>(
    name: String,
    config: RoomConfig,
    rules: R,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let actor = RoomActor {
        name: name.clone(),
        config,
        rules,
        members: Vec::new(),
        ready: HashSet::new(),
        ready_seen: false,
        active: None,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { name, sender: tx }
}
