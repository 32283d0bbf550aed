//! `ParlorServer` builder and server loop.
//!
//! This is the entry point for running a Parlor coordinator. It ties
//! together all the layers: transport → protocol → presence → room.

use std::sync::Arc;
use std::time::Duration;

use parlor_presence::{Authenticator, Presence};
use parlor_protocol::{Codec, JsonCodec};
use parlor_room::{MatchRules, RoomConfig, RoomManager};
use parlor_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::sweeper::spawn_sweeper;
use crate::ParlorError;

/// How often empty rooms are reaped unless overridden on the builder.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
/// Interior mutability via `Mutex` where needed.
pub(crate) struct ServerState<R: MatchRules, A: Authenticator, C: Codec> {
    pub(crate) presence: Mutex<Presence>,
    pub(crate) rooms: Mutex<RoomManager<R>>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,ignore
/// use parlor::prelude::*;
///
/// let server = ParlorServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(TicTacToe, my_auth)
///     .await?;
/// server.run().await
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    sweep_interval: Duration,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets how often empty rooms are swept.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Builds and starts the server with the given match rules and
    /// authenticator.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build<R: MatchRules>(
        self,
        rules: R,
        auth: impl Authenticator,
    ) -> Result<ParlorServer<R, impl Authenticator, JsonCodec>, ParlorError>
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            presence: Mutex::new(Presence::new()),
            rooms: Mutex::new(RoomManager::new(rules, self.room_config)),
            auth,
            codec: JsonCodec,
        });

        Ok(ParlorServer {
            transport,
            state,
            sweep_interval: self.sweep_interval,
        })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Parlor coordinator.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer<R: MatchRules, A: Authenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<R, A, C>>,
    sweep_interval: Duration,
}

impl<R, A, C> ParlorServer<R, A, C>
where
    R: MatchRules,
    A: Authenticator,
    C: Codec + Clone + 'static,
{
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Starts the empty-room sweeper, then accepts incoming connections
    /// and spawns a handler task for each connected player. Runs until
    /// the process is terminated.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        tracing::info!("Parlor coordinator running");

        spawn_sweeper(Arc::clone(&self.state), self.sweep_interval);

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection::<R, A, C>(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
