/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Color, Direction, GameMove, GameState, Piece, Score, Square};

/// Positional weight of every square, indexed by `square - 1`.
///
/// Edges and back rows are worth more than the centre.
#[rustfmt::skip]
pub const SQUARE_WEIGHTS: [i32; Square::COUNT] = [
       5,  5,  5,  5,  5,
     5,  4,  4,  4,  4,
       4,  3,  3,  3,  5,
     5,  3,  2,  2,  4,
       4,  2,  1,  3,  5,
     5,  3,  1,  2,  4,
       4,  2,  2,  3,  5,
     5,  3,  3,  3,  4,
       4,  4,  4,  4,  4,
     5,  5,  5,  5,  5,
];

/// First and last square numbers of the central band checked for protection.
const CENTRAL_SQUARES: (u8, u8) = (16, 35);

/// The two diagonal axes through a square, each as a pair of opposite directions.
const AXES: [(Direction, Direction); 2] = [
    (Direction::NorthWest, Direction::SouthEast),
    (Direction::NorthEast, Direction::SouthWest),
];

/// Returns the material value of a piece kind: a man is worth 1, a king 2.
#[inline(always)]
pub const fn value_of(piece: Piece) -> i32 {
    if piece.is_king() {
        2
    } else {
        1
    }
}

/// Per-component breakdown of a static evaluation.
///
/// Every field is relative to the evaluating color.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Evaluation {
    /// Weighted own material minus weighted opponent material.
    pub material: i32,

    /// Own pieces still on the own back row.
    pub back_row: i32,

    /// Central squares protected by own pieces.
    pub protected: i32,

    /// Own men with a clear path to promotion.
    pub runaways: i32,

    /// Own kings that cannot move. Subtracted from the total.
    pub trapped_kings: i32,
}

impl Evaluation {
    /// Sum of all components, with trapped kings as a penalty.
    #[inline(always)]
    pub const fn total(&self) -> Score {
        Score(self.material + self.back_row + self.protected + self.runaways - self.trapped_kings)
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Material:      {:>4}", self.material)?;
        writeln!(f, "Back row:      {:>4}", self.back_row)?;
        writeln!(f, "Protected:     {:>4}", self.protected)?;
        writeln!(f, "Runaways:      {:>4}", self.runaways)?;
        writeln!(f, "Trapped kings: {:>4}", -self.trapped_kings)?;
        write!(f, "Total:         {:>4}", self.total())
    }
}

/// Encapsulates the logic of scoring a draughts position.
///
/// Unlike a negamax evaluation, the score is always from the point of view of one fixed color,
/// normally the color the engine is playing, regardless of whose turn it is.
#[derive(Debug, Clone)]
pub struct Evaluator<'a, S> {
    /// The game whose position to evaluate.
    state: &'a S,

    /// The color whose perspective the score is given from.
    color: Color,

    /// Snapshot of the board, so every component reads the same occupancy.
    squares: [Option<Piece>; Square::COUNT],
}

impl<'a, S: GameState> Evaluator<'a, S> {
    /// Construct a new [`Evaluator`] that scores `state` for `color`.
    #[inline(always)]
    pub fn new(state: &'a S, color: Color) -> Self {
        let mut squares = [None; Square::COUNT];
        for square in Square::iter() {
            squares[square] = state.piece_at(square);
        }

        Self {
            state,
            color,
            squares,
        }
    }

    /// Evaluate this position from the evaluator's color's perspective.
    ///
    /// A positive/high number is good for that color, while a negative number is better for the opponent.
    #[inline(always)]
    pub fn eval(&self) -> Score {
        self.evaluation().total()
    }

    /// Computes every component of the evaluation.
    pub fn evaluation(&self) -> Evaluation {
        Evaluation {
            material: self.material(),
            back_row: self.back_row(),
            protected: self.protected_squares(),
            runaways: self.runaways(),
            trapped_kings: self.trapped_kings(),
        }
    }

    #[inline(always)]
    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square]
    }

    #[inline(always)]
    fn is_empty(&self, square: Square) -> bool {
        self.squares[square].is_none()
    }

    #[inline(always)]
    fn is_own(&self, square: Square) -> bool {
        self.piece_at(square).is_some_and(|p| p.color() == self.color)
    }

    /// Own pieces, with their squares.
    fn own_pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::iter().filter_map(|sq| {
            self.piece_at(sq)
                .filter(|p| p.color() == self.color)
                .map(|p| (sq, p))
        })
    }

    /// Contribution of the piece on `square` to [`Evaluation::material`], if there is one.
    #[inline(always)]
    fn value_at(&self, square: Square) -> Option<i32> {
        self.piece_at(square).map(|piece| {
            let value = value_of(piece) * SQUARE_WEIGHTS[square];
            if piece.color() == self.color {
                value
            } else {
                -value
            }
        })
    }

    fn material(&self) -> i32 {
        Square::iter().filter_map(|sq| self.value_at(sq)).sum()
    }

    fn back_row(&self) -> i32 {
        let row = self.color.back_row();
        self.own_pieces().filter(|(sq, _)| sq.row() == row).count() as i32
    }

    fn protected_squares(&self) -> i32 {
        let (first, last) = CENTRAL_SQUARES;
        (first..=last)
            .filter_map(Square::new)
            .filter(|sq| self.is_protected(*sq))
            .count() as i32
    }

    /// A square is protected if, along either diagonal axis, one side holds an own piece right next to it
    /// (or an own king further along an otherwise empty line) while the other side is empty.
    fn is_protected(&self, square: Square) -> bool {
        AXES.into_iter().any(|(a, b)| {
            [(a, b), (b, a)].into_iter().any(|(toward, away)| {
                let away_is_empty = square.neighbor(away).is_some_and(|sq| self.is_empty(sq));
                if !away_is_empty {
                    return false;
                }

                let adjacent_is_own = square.neighbor(toward).is_some_and(|sq| self.is_own(sq));
                let king_on_line = square
                    .ray(toward)
                    .find_map(|sq| self.piece_at(sq))
                    .is_some_and(|p| p.is_king() && p.color() == self.color);

                adjacent_is_own || king_on_line
            })
        })
    }

    fn runaways(&self) -> i32 {
        self.own_pieces()
            .filter(|(sq, piece)| piece.is_man() && self.is_runaway(*sq))
            .count() as i32
    }

    /// Walks two rows at a time towards the promotion row, requiring both forward diagonals
    /// and the square two rows straight ahead to be empty at every step.
    ///
    /// Squares beyond the edge of the board count as empty.
    fn is_runaway(&self, from: Square) -> bool {
        let color = self.color;
        let mut current = from;

        loop {
            let blocked = Direction::forward(color)
                .into_iter()
                .filter_map(|dir| current.neighbor(dir))
                .any(|sq| !self.is_empty(sq));
            if blocked {
                return false;
            }

            let Some(ahead) = current.ahead(color, 2) else {
                // Two rows ahead is past the promotion row
                return true;
            };
            if !self.is_empty(ahead) {
                return false;
            }
            if ahead.is_promotion_row(color) {
                return true;
            }

            current = ahead;
        }
    }

    /// Own kings that are not the origin of any available king move.
    ///
    /// When it is not the evaluating color's turn, none of its kings can move.
    fn trapped_kings(&self) -> i32 {
        let kings = self
            .own_pieces()
            .filter(|(_, piece)| piece.is_king())
            .map(|(sq, _)| sq)
            .collect::<Vec<_>>();

        if kings.is_empty() {
            return 0;
        }
        if self.state.side_to_move() != self.color {
            return kings.len() as i32;
        }

        let moves = self.state.legal_moves();
        kings
            .into_iter()
            .filter(|king| {
                !moves
                    .iter()
                    .any(|mv| mv.is_king_move() && mv.from() == *king)
            })
            .count() as i32
    }
}

impl<S: GameState> fmt::Display for Evaluator<'_, S> {
    /// Draws the board with every piece's material contribution, then the component breakdown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let divider = format!("  +{}", "----+".repeat(10));

        writeln!(f, "{divider}")?;
        for row in 0..10 {
            write!(f, "{row} |")?;
            for col in 0..10 {
                let piece = Square::from_coords(row, col).and_then(|sq| self.piece_at(sq));
                let piece_char = piece.map(|p| p.char()).unwrap_or(' ');
                write!(f, " {piece_char}  |")?;
            }
            writeln!(f)?;

            write!(f, "  |")?;
            for col in 0..10 {
                let value = Square::from_coords(row, col).and_then(|sq| self.value_at(sq));
                let cell = match value {
                    Some(v) if v > 0 => format!("+{v}"),
                    Some(v) => format!("{v}"),
                    None => String::new(),
                };
                write!(f, "{cell:^4}|")?;
            }
            writeln!(f)?;
            writeln!(f, "{divider}")?;
        }

        writeln!(f, "\nPerspective: {}", self.color)?;
        write!(f, "{}", self.evaluation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    fn evaluate(fen: &str, color: Color) -> Evaluation {
        let position = Position::from_fen(fen).unwrap();
        Evaluator::new(&position, color).evaluation()
    }

    #[test]
    fn test_startpos_components() {
        let position = Position::default();
        let white = Evaluator::new(&position, Color::White).evaluation();
        let black = Evaluator::new(&position, Color::Black).evaluation();

        // The square weights are not symmetric, so Black's half is worth one point more
        assert_eq!(white.material, -1);
        assert_eq!(black.material, 1);
        assert_eq!(white.back_row, 5);
        assert_eq!(black.back_row, 5);
        assert_eq!(white.trapped_kings, 0);
    }

    #[test]
    fn test_material_uses_square_weights() {
        // Man on 23 (weight 1), king on 1 (weight 5 * 2)
        let eval = evaluate("W:W23:BK1", Color::White);
        assert_eq!(eval.material, 1 - 10);

        let eval = evaluate("W:W23:BK1", Color::Black);
        assert_eq!(eval.material, 10 - 1);
    }

    #[test]
    fn test_runaway_man() {
        let clear = evaluate("W:W33:B", Color::White);
        let boxed = evaluate("W:W33:B28,29,23", Color::White);

        assert_eq!(clear.runaways, 1);
        assert_eq!(boxed.runaways, 0);
        assert!(clear.runaways > boxed.runaways);

        // Off-board squares count as clear
        assert_eq!(evaluate("W:W6:B", Color::White).runaways, 1);

        // Blocked two rows straight ahead
        assert_eq!(evaluate("W:W33:B23", Color::White).runaways, 0);

        // Kings are never runaways
        assert_eq!(evaluate("W:WK33:B", Color::White).runaways, 0);

        // Black runs the other way
        assert_eq!(evaluate("B:W:B18", Color::Black).runaways, 1);
        assert_eq!(evaluate("B:W38:B18", Color::Black).runaways, 0);
    }

    #[test]
    fn test_trapped_kings() {
        // A king in the corner behind its own man on 41, with 37 also occupied, cannot move
        let eval = evaluate("W:WK46,41:B37,32", Color::White);
        assert_eq!(eval.trapped_kings, 1);

        // A free king is not trapped
        let eval = evaluate("W:WK46:B1", Color::White);
        assert_eq!(eval.trapped_kings, 0);

        // When the opponent is to move, every own king counts
        let eval = evaluate("B:WK46:B1", Color::White);
        assert_eq!(eval.trapped_kings, 1);

        // A king whose only legal moves belong to a capturing man is trapped
        let eval = evaluate("W:WK50,28:B23", Color::White);
        assert_eq!(eval.trapped_kings, 1);
    }

    #[test]
    fn test_protected_squares() {
        // An empty board protects nothing
        assert_eq!(evaluate("W:W:B", Color::White).protected, 0);

        // A lone man on 33 protects 28 and 29 (adjacent own piece, empty square opposite),
        // and the central squares it touches diagonally
        let eval = evaluate("W:W33:B", Color::White);
        assert!(eval.protected >= 2);

        // An opposing man protects nothing for White
        assert_eq!(evaluate("W:W:B33", Color::White).protected, 0);

        // A king protects along its whole open diagonal
        let king = evaluate("W:WK46:B", Color::White);
        let man = evaluate("W:W46:B", Color::White);
        assert!(king.protected > man.protected);
    }

    #[test]
    fn test_total() {
        let eval = Evaluation {
            material: 10,
            back_row: 2,
            protected: 3,
            runaways: 1,
            trapped_kings: 2,
        };
        assert_eq!(eval.total(), Score(14));
    }
}
