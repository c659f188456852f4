/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Bitboard set of playable squares.
mod bitboard;

/// Moves and move lists.
mod moves;

/// Counting reachable positions, for validating move generation.
mod perft;

/// Colors, piece kinds and pieces.
mod piece;

/// Board state, move generation, and FEN parsing.
mod position;

/// Square numbering and diagonal geometry.
mod square;

pub use bitboard::*;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use square::*;
