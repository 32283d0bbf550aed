//! The built-in tic-tac-toe variant.
//!
//! Move payloads carry a flat cell index, matching the browser client:
//! `{"room": "...", "index": 0..=8, "symbol": "X"|"O"}`. Only `index` is
//! authoritative here; `symbol` is cosmetic and relayed as-is.

use parlor_protocol::Role;

use crate::{MatchRules, MatchVerdict};

/// The eight winning lines of a 3×3 board, as flat indices.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Tic-tac-toe rules. Role A plays "X", Role B plays "O".
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToe;

/// Board occupancy: which side, if any, holds each of the nine cells.
pub type Board = [Option<Role>; 9];

fn mark(role: Role) -> char {
    match role {
        Role::A => 'X',
        Role::B => 'O',
    }
}

fn cell_index(payload: &serde_json::Value) -> Result<usize, String> {
    let index = payload
        .get("index")
        .and_then(|v| v.as_u64())
        .ok_or("move payload has no cell index")?;
    if index >= 9 {
        return Err(format!("cell index {index} out of range"));
    }
    Ok(index as usize)
}

fn has_line(board: &Board, role: Role) -> bool {
    LINES
        .iter()
        .any(|line| line.iter().all(|&i| board[i] == Some(role)))
}

impl MatchRules for TicTacToe {
    type State = Board;

    fn start(&self) -> Board {
        [None; 9]
    }

    fn validate(
        &self,
        state: &Board,
        _role: Role,
        payload: &serde_json::Value,
    ) -> Result<(), String> {
        let index = cell_index(payload)?;
        if state[index].is_some() {
            return Err(format!("cell {index} is occupied"));
        }
        Ok(())
    }

    fn apply(
        &self,
        state: &mut Board,
        role: Role,
        payload: &serde_json::Value,
    ) -> MatchVerdict {
        // validate() ran first; a bad index here means a room bug, so
        // treat it as a no-op continue rather than panicking.
        let Ok(index) = cell_index(payload) else {
            return MatchVerdict::Continue;
        };
        state[index] = Some(role);

        if has_line(state, role) {
            return MatchVerdict::Won {
                winner: role,
                reason: format!("{} wins!", mark(role)),
            };
        }
        if state.iter().all(|c| c.is_some()) {
            return MatchVerdict::Drawn {
                reason: "draw".into(),
            };
        }
        MatchVerdict::Continue
    }
}

// =========================================================================
// Tests
// =========================================================================
