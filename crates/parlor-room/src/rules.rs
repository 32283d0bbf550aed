//! The `MatchRules` trait — the per-variant extension point.
//!
//! The room actor is game-agnostic: it relays move payloads untouched and
//! only keeps turn order. A variant plugs in through this trait to answer
//! the two questions the relay cannot: "is this payload a legal move" and
//! "did it end the match".

use parlor_protocol::Role;

/// Outcome of applying one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchVerdict {
    /// The match goes on; the turn passes to the opponent.
    Continue,
    /// The mover's side won.
    Won { winner: Role, reason: String },
    /// Terminal with no winner.
    Drawn { reason: String },
}

/// Thin rules policy for one game variant.
///
/// The coordinator owns turn bookkeeping (whose turn it is); the policy
/// owns occupancy — whatever "this move is possible on the current board"
/// means for the variant. Payloads arrive as opaque JSON and are relayed
/// to the opponent byte-for-byte before `apply` runs.
pub trait MatchRules: Clone + Send + Sync + 'static {
    /// Per-match bookkeeping state (board occupancy and the like).
    type State: Send + 'static;

    /// Creates fresh match state at the readiness-to-start transition.
    fn start(&self) -> Self::State;

    /// Checks a payload from the player holding `role` against the
    /// current state. Turn order has already been enforced by the room.
    ///
    /// # Errors
    /// A human-readable reason; the move is logged and dropped, never
    /// relayed.
    fn validate(
        &self,
        state: &Self::State,
        role: Role,
        payload: &serde_json::Value,
    ) -> Result<(), String>;

    /// Applies a validated move and reports whether the match ended.
    fn apply(
        &self,
        state: &mut Self::State,
        role: Role,
        payload: &serde_json::Value,
    ) -> MatchVerdict;
}
