/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// The 10x10 board: squares, pieces, moves, positions and move generation.
mod board;

/// Command-line interface of the engine.
mod cli;

/// Code related to the engine's functionality, such as user input handling.
mod engine;

/// Evaluation of draughts positions.
mod eval;

/// Ordering moves by a one-ply look-ahead.
mod movepicker;

/// The harness-facing player that owns all state kept between searches.
mod player;

/// Pseudo-random number generation for the Zobrist tables.
mod prng;

/// Heuristic scores.
mod score;

/// Main engine logic; all search related code.
mod search;

/// The boundary between the engine and the game it plays.
mod state;

/// Transposition table.
mod ttable;

/// Misc utility functions, constants, and types.
mod utils;

/// Zobrist hashing of positions.
mod zobrist;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use eval::*;
pub use movepicker::*;
pub use player::*;
pub use prng::*;
pub use score::*;
pub use search::*;
pub use state::*;
pub use ttable::*;
pub use utils::*;
pub use zobrist::*;
