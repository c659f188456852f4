/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, bail, Result};

use super::{Bitboard, Position, Square};

/// Upper bound on the number of legal moves in any draughts position.
///
/// Kings with long capture trees can produce many distinct sequences, so this is generous.
pub const MAX_NUM_MOVES: usize = 256;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList<M = Move> = arrayvec::ArrayVec<M, MAX_NUM_MOVES>;

/// A single draughts move: a step, a flying king slide, or a complete capture sequence.
///
/// Capture sequences are stored by their endpoints plus the set of captured squares,
/// which is everything needed to apply and reverse the move. The intermediate landing
/// squares are not kept; two sequences with identical endpoints and captures are the same move.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    captured: Bitboard,
    captured_kings: Bitboard,
    flags: u8,
}

impl Move {
    /// Set if the moving piece is a king.
    pub const FLAG_KING: u8 = 1 << 0;
    /// Set if the moving man is promoted at the end of this move.
    pub const FLAG_PROMOTION: u8 = 1 << 1;

    /// Creates a non-capturing move.
    #[inline(always)]
    pub const fn new(from: Square, to: Square, flags: u8) -> Self {
        Self::new_capture(from, to, Bitboard::EMPTY_BOARD, Bitboard::EMPTY_BOARD, flags)
    }

    /// Creates a capturing move that removes every piece in `captured`.
    ///
    /// `captured_kings` must be the subset of `captured` that held kings, so the move can be undone.
    #[inline(always)]
    pub const fn new_capture(
        from: Square,
        to: Square,
        captured: Bitboard,
        captured_kings: Bitboard,
        flags: u8,
    ) -> Self {
        Self {
            from,
            to,
            captured,
            captured_kings,
            flags,
        }
    }

    /// Square the moving piece starts on.
    #[inline(always)]
    pub const fn from(&self) -> Square {
        self.from
    }

    /// Square the moving piece ends on. May equal [`Move::from`] for a circular king capture.
    #[inline(always)]
    pub const fn to(&self) -> Square {
        self.to
    }

    #[inline(always)]
    pub const fn captured(&self) -> Bitboard {
        self.captured
    }

    #[inline(always)]
    pub const fn captured_kings(&self) -> Bitboard {
        self.captured_kings
    }

    /// Number of pieces removed by this move.
    #[inline(always)]
    pub const fn num_captured(&self) -> u8 {
        self.captured.population()
    }

    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.captured.is_nonempty()
    }

    #[inline(always)]
    pub const fn is_king_move(&self) -> bool {
        self.flags & Self::FLAG_KING != 0
    }

    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        self.flags & Self::FLAG_PROMOTION != 0
    }

    /// Parses a move in standard notation (`32-28` or `28x19`) by matching it against the legal moves of `position`.
    ///
    /// A capture may list intermediate landing squares (`28x19x10`); only the endpoints are matched.
    /// Fails if the move is illegal, or if more than one legal capture sequence matches.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::*;
    /// let position = Position::default();
    /// let mv = Move::from_text(&position, "32-28").unwrap();
    /// assert_eq!(mv.from().number(), 32);
    /// assert_eq!(mv.to().number(), 28);
    ///
    /// assert!(Move::from_text(&position, "32-23").is_err());
    /// assert!(Move::from_text(&position, "19-23").is_err());
    /// ```
    pub fn from_text(position: &Position, text: &str) -> Result<Self> {
        let text = text.trim();
        let is_capture = text.contains('x');
        let separator = if is_capture { 'x' } else { '-' };

        let squares = text
            .split(separator)
            .map(Square::from_notation)
            .collect::<Result<Vec<_>>>()?;

        if squares.len() < 2 {
            bail!("Move {text:?} must name at least a source and a destination square");
        }
        let (from, to) = (squares[0], squares[squares.len() - 1]);

        let mut candidates = position
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.from() == from && mv.to() == to && mv.is_capture() == is_capture);

        let mv = candidates
            .next()
            .ok_or(anyhow!("Illegal move {text:?} on position {}", position.to_fen()))?;

        if let Some(other) = candidates.next() {
            bail!(
                "Move {text:?} is ambiguous: it could capture {:?} or {:?}",
                mv.captured(),
                other.captured()
            );
        }

        Ok(mv)
    }
}

impl fmt::Display for Move {
    /// Standard notation: `from-to` for steps, `fromxto` for captures.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = if self.is_capture() { 'x' } else { '-' };
        write!(f, "{}{separator}{}", self.from, self.to)
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")?;
        if self.is_capture() {
            write!(f, " captures {:?}", self.captured)?;
        }
        if self.is_promotion() {
            write!(f, " (promotes)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_display() {
        let sq = |n| Square::new(n).unwrap();

        let quiet = Move::new(sq(32), sq(28), 0);
        assert_eq!(quiet.to_string(), "32-28");
        assert!(!quiet.is_capture());
        assert!(!quiet.is_king_move());

        let captured = Bitboard::from_square(sq(23));
        let capture = Move::new_capture(sq(28), sq(19), captured, Bitboard::EMPTY_BOARD, 0);
        assert_eq!(capture.to_string(), "28x19");
        assert_eq!(capture.num_captured(), 1);
    }

    #[test]
    fn test_move_flags() {
        let sq = |n| Square::new(n).unwrap();
        let mv = Move::new(sq(7), sq(1), Move::FLAG_PROMOTION);
        assert!(mv.is_promotion());
        assert!(!mv.is_king_move());

        let mv = Move::new(sq(46), sq(5), Move::FLAG_KING);
        assert!(mv.is_king_move());
        assert!(!mv.is_promotion());
    }
}
