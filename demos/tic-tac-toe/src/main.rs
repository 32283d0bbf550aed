//! Tic-tac-toe coordinator: the built-in variant served over WebSocket.
//!
//! Run with `RUST_LOG=info cargo run`, then point the browser client at
//! `ws://localhost:8080`.

use parlor::prelude::*;

/// Accepts any non-empty token verbatim as the user id.
///
/// This reproduces a trust-the-client setup for local development; a real
/// deployment swaps in a verifier for the auth provider's tokens.
struct TokenAuth;

impl Authenticator for TokenAuth {
    async fn verify(&self, token: &str) -> Result<UserId, PresenceError> {
        if token.is_empty() {
            return Err(PresenceError::AuthFailed("empty token".into()));
        }
        Ok(UserId(token.to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<(), ParlorError> {
    parlor::init_tracing();

    let server = ParlorServerBuilder::new()
        .bind("0.0.0.0:8080")
        .build(TicTacToe, TokenAuth)
        .await?;

    server.run().await
}
