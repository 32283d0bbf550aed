//! Periodic reaper for empty rooms.

use std::sync::Arc;
use std::time::Duration;

use parlor_presence::Authenticator;
use parlor_protocol::Codec;
use parlor_room::MatchRules;
use tokio::task::JoinHandle;

use crate::server::ServerState;

/// Spawns the background task that sweeps empty rooms on an interval.
///
/// Rooms have no explicit destroy operation: the last player leaves (or
/// drops the socket) and the next sweep reaps the empty shell. Until
/// then the room name still resolves, so a quick reconnect lands back
/// in the same room.
pub(crate) fn spawn_sweeper<R, A, C>(
    state: Arc<ServerState<R, A, C>>,
    interval: Duration,
) -> JoinHandle<()>
where
    R: MatchRules,
    A: Authenticator,
    C: Codec,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a freshly started
        // server does not sweep before anyone has connected.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let reaped = {
                let mut rooms = state.rooms.lock().await;
                rooms.sweep().await
            };
            if reaped > 0 {
                tracing::info!(reaped, "swept empty rooms");
            }
        }
    })
}
