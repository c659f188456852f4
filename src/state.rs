/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Color, Move, MoveList, Piece, Position, Square};

/// The view of a move that the search needs.
///
/// Everything else about a move is opaque to the engine; it is only ever handed back to the
/// [`GameState`] it came from.
pub trait GameMove: Copy + Eq + fmt::Display + fmt::Debug {
    /// Returns `true` if the moving piece is a king.
    fn is_king_move(&self) -> bool;

    /// Square the moving piece starts on.
    fn from(&self) -> Square;
}

/// A mutable game position that the engine can search.
///
/// `make_move` followed by `unmake_move` with the same move must restore the exact prior state.
pub trait GameState {
    type Move: GameMove;

    /// All moves available to the side to move.
    fn legal_moves(&self) -> MoveList<Self::Move>;

    /// Applies `mv` in place and passes the turn.
    fn make_move(&mut self, mv: Self::Move);

    /// Reverses `mv`, which must be the most recently applied move.
    fn unmake_move(&mut self, mv: Self::Move);

    fn side_to_move(&self) -> Color;

    /// The piece standing on `square`, if any.
    fn piece_at(&self, square: Square) -> Option<Piece>;
}

impl GameMove for Move {
    #[inline(always)]
    fn is_king_move(&self) -> bool {
        Move::is_king_move(self)
    }

    #[inline(always)]
    fn from(&self) -> Square {
        Move::from(self)
    }
}

impl GameState for Position {
    type Move = Move;

    #[inline(always)]
    fn legal_moves(&self) -> MoveList<Self::Move> {
        Position::legal_moves(self)
    }

    #[inline(always)]
    fn make_move(&mut self, mv: Self::Move) {
        Position::make_move(self, mv)
    }

    #[inline(always)]
    fn unmake_move(&mut self, mv: Self::Move) {
        Position::unmake_move(self, mv)
    }

    #[inline(always)]
    fn side_to_move(&self) -> Color {
        Position::side_to_move(self)
    }

    #[inline(always)]
    fn piece_at(&self, square: Square) -> Option<Piece> {
        Position::piece_at(self, square)
    }
}
