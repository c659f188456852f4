/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};

use super::{Bitboard, Color, Direction, Move, MoveList, Piece, PieceKind, Square};

/// A draughts position: which squares hold which pieces, and whose turn it is.
///
/// Internally, one [`Bitboard`] per color plus one [`Bitboard`] of all kings.
/// A man is any occupied square that is not in the king set.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    colors: [Bitboard; Color::COUNT],
    kings: Bitboard,
    side_to_move: Color,
}

/// Fixed data shared by every step of one piece's capture search.
struct CaptureSearch {
    from: Square,
    is_king: bool,
    color: Color,
    /// Empty squares, counting the origin square as empty.
    empty: Bitboard,
    opponents: Bitboard,
    opponent_kings: Bitboard,
}

impl Position {
    /// Creates an empty board with White to move.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            colors: [Bitboard::EMPTY_BOARD; Color::COUNT],
            kings: Bitboard::EMPTY_BOARD,
            side_to_move: Color::White,
        }
    }

    /// Creates a new [`Position`] from a FEN string in PDN notation.
    ///
    /// The format is `<side>:W<pieces>:B<pieces>`, where `<pieces>` is a comma-separated
    /// list of square numbers, each optionally prefixed by `K` to mark a king.
    /// Ranges such as `31-35` are accepted. A trailing `.` is ignored.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::*;
    /// let position = Position::from_fen("B:W31-35,K46:B1,K2").unwrap();
    /// assert_eq!(position.side_to_move(), Color::Black);
    /// assert_eq!(position.piece_at(Square::new(46).unwrap()), Some(Piece::WHITE_KING));
    /// assert_eq!(position.piece_at(Square::new(33).unwrap()), Some(Piece::WHITE_MAN));
    /// assert_eq!(position.piece_at(Square::new(2).unwrap()), Some(Piece::BLACK_KING));
    /// assert_eq!(position.piece_at(Square::new(20).unwrap()), None);
    ///
    /// assert!(Position::from_fen("X:W31:B1").is_err());
    /// assert!(Position::from_fen("W:W31:B31").is_err());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut pos = Self::new();
        let fen = fen.trim().trim_end_matches('.');
        let mut sections = fen.split(':');

        let side = sections
            .next()
            .filter(|s| !s.trim().is_empty())
            .ok_or(anyhow!("FEN string must start with the side to move. Got {fen:?}"))?;
        pos.side_to_move = Color::from_str(side.trim())?;

        for section in sections {
            let section = section.trim();
            let mut chars = section.chars();
            let color = chars
                .next()
                .ok_or(anyhow!("FEN piece section must start with W or B. Got {fen:?}"))
                .and_then(Color::from_char)?;

            for item in chars.as_str().split(',').map(str::trim) {
                if item.is_empty() {
                    continue;
                }

                let (is_king, numbers) = match item.strip_prefix(['K', 'k']) {
                    Some(rest) => (true, rest),
                    None => (false, item),
                };

                let squares = match numbers.split_once('-') {
                    Some((first, last)) => {
                        let first = Square::from_notation(first)?;
                        let last = Square::from_notation(last)?;
                        Bitboard::from_numbers(first.number(), last.number())
                    }
                    None => Bitboard::from_square(Square::from_notation(numbers)?),
                };

                if pos.occupied().intersects(squares) {
                    bail!("FEN string places more than one piece on {item:?}");
                }

                let kind = if is_king {
                    PieceKind::King
                } else {
                    PieceKind::Man
                };
                for square in squares {
                    pos.place(Piece::new(color, kind), square);
                }
            }
        }

        Ok(pos)
    }

    /// Renders this position as a FEN string in PDN notation.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::*;
    /// let fen = "W:W31,32,K45:BK1,2";
    /// assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
    /// ```
    pub fn to_fen(&self) -> String {
        let pieces = |color: Color| {
            self.color(color)
                .iter()
                .map(|sq| {
                    if self.kings.contains(sq) {
                        format!("K{sq}")
                    } else {
                        sq.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(",")
        };

        format!(
            "{}:W{}:B{}",
            self.side_to_move.char(),
            pieces(Color::White),
            pieces(Color::Black)
        )
    }

    /// Copies `self` and applies `mv` to the copy.
    #[inline(always)]
    pub fn with_move_made(&self, mv: Move) -> Self {
        let mut new = *self;
        new.make_move(mv);
        new
    }

    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub fn toggle_side_to_move(&mut self) {
        self.side_to_move = self.side_to_move.opponent();
    }

    /// All squares holding a piece of `color`.
    #[inline(always)]
    pub const fn color(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// All squares holding a king, of either color.
    #[inline(always)]
    pub const fn kings(&self) -> Bitboard {
        self.kings
    }

    #[inline(always)]
    pub fn kings_of(&self, color: Color) -> Bitboard {
        self.color(color) & self.kings
    }

    #[inline(always)]
    pub fn men_of(&self, color: Color) -> Bitboard {
        self.color(color) & !self.kings
    }

    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.colors[0] | self.colors[1]
    }

    #[inline(always)]
    pub fn empty(&self) -> Bitboard {
        !self.occupied()
    }

    #[inline(always)]
    pub fn is_empty_at(&self, square: Square) -> bool {
        !self.occupied().contains(square)
    }

    /// Fetches the [`Piece`] on `square`, if there is one.
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let color = if self.colors[0].contains(square) {
            Color::White
        } else if self.colors[1].contains(square) {
            Color::Black
        } else {
            return None;
        };

        let kind = if self.kings.contains(square) {
            PieceKind::King
        } else {
            PieceKind::Man
        };

        Some(Piece::new(color, kind))
    }

    /// Places `piece` on `square`, replacing whatever was there.
    pub fn place(&mut self, piece: Piece, square: Square) {
        self.take(square);
        self.colors[piece.color().index()].set(square);
        if piece.is_king() {
            self.kings.set(square);
        }
    }

    /// Removes and returns the piece on `square`.
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.piece_at(square)?;
        self.colors[piece.color().index()].clear(square);
        self.kings.clear(square);
        Some(piece)
    }

    /// Applies `mv` for the side to move, then passes the turn.
    ///
    /// `mv` is assumed to be legal in this position.
    pub fn make_move(&mut self, mv: Move) {
        let us = self.side_to_move.index();
        let them = self.side_to_move.opponent().index();
        let (from, to) = (mv.from(), mv.to());

        // Clear before set, so that a piece returning to its origin survives
        self.colors[us].clear(from);
        self.colors[us].set(to);

        if mv.is_king_move() {
            self.kings.clear(from);
            self.kings.set(to);
        } else if mv.is_promotion() {
            self.kings.set(to);
        }

        self.colors[them].clear(mv.captured());
        self.kings.clear(mv.captured());

        self.toggle_side_to_move();
    }

    /// Reverses `mv`, which must be the last move applied with [`Position::make_move`].
    pub fn unmake_move(&mut self, mv: Move) {
        self.toggle_side_to_move();

        let us = self.side_to_move.index();
        let them = self.side_to_move.opponent().index();
        let (from, to) = (mv.from(), mv.to());

        self.colors[them].set(mv.captured());
        self.kings.set(mv.captured_kings());

        if mv.is_king_move() {
            self.kings.clear(to);
            self.kings.set(from);
        } else if mv.is_promotion() {
            self.kings.clear(to);
        }

        self.colors[us].clear(to);
        self.colors[us].set(from);
    }

    /// Generates all legal moves for the side to move.
    ///
    /// If any capture is available, only the captures removing the most pieces are returned.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::*;
    /// assert_eq!(Position::default().legal_moves().len(), 9);
    ///
    /// // The capture is mandatory, so the quiet moves of 46 are not legal
    /// let position = Position::from_fen("W:W46,28:B23").unwrap();
    /// let moves = position.legal_moves();
    /// assert_eq!(moves.len(), 1);
    /// assert_eq!(moves[0].to_string(), "28x19");
    /// ```
    pub fn legal_moves(&self) -> MoveList {
        let mut moves = self.capture_moves();
        if moves.is_empty() {
            self.quiet_moves(&mut moves);
        }
        moves
    }

    /// Generates every maximal capture sequence for the side to move.
    pub fn capture_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        let color = self.side_to_move;
        let them = color.opponent();

        for from in self.color(color) {
            let search = CaptureSearch {
                from,
                is_king: self.kings.contains(from),
                color,
                empty: self.empty() | from,
                opponents: self.color(them),
                opponent_kings: self.kings_of(them),
            };
            self.search_captures(&search, from, Bitboard::EMPTY_BOARD, &mut moves);
        }

        moves
    }

    /// Depth-first walk over all capture continuations from `current`.
    ///
    /// Jumped pieces stay on the board until the sequence ends, so they block further jumps
    /// and can never be taken twice.
    fn search_captures(
        &self,
        search: &CaptureSearch,
        current: Square,
        captured: Bitboard,
        moves: &mut MoveList,
    ) {
        let mut extended = false;
        let capturable = search.opponents & !captured;

        for direction in Direction::ALL {
            if search.is_king {
                let mut ray = current.ray(direction);

                // Slide over empty squares until something is in the way
                let Some(target) = ray.find(|sq| !search.empty.contains(*sq)) else {
                    continue;
                };
                if !capturable.contains(target) {
                    continue;
                }

                for landing in ray.take_while(|sq| search.empty.contains(*sq)) {
                    extended = true;
                    self.search_captures(search, landing, captured | target, moves);
                }
            } else {
                let Some(target) = current.neighbor(direction) else {
                    continue;
                };
                let Some(landing) = target.neighbor(direction) else {
                    continue;
                };

                if capturable.contains(target) && search.empty.contains(landing) {
                    extended = true;
                    self.search_captures(search, landing, captured | target, moves);
                }
            }
        }

        if extended || captured.is_empty() {
            return;
        }

        let mut flags = 0;
        if search.is_king {
            flags |= Move::FLAG_KING;
        } else if current.is_promotion_row(search.color) {
            flags |= Move::FLAG_PROMOTION;
        }

        let mv = Move::new_capture(
            search.from,
            current,
            captured,
            captured & search.opponent_kings,
            flags,
        );

        // Only the longest sequences are legal
        match moves.first().map(Move::num_captured) {
            Some(best) if mv.num_captured() < best => {}
            Some(best) if mv.num_captured() > best => {
                moves.clear();
                moves.push(mv);
            }
            _ => {
                if !moves.contains(&mv) {
                    moves.push(mv);
                }
            }
        }
    }

    /// Appends every non-capturing move for the side to move.
    fn quiet_moves(&self, moves: &mut MoveList) {
        let color = self.side_to_move;
        let empty = self.empty();

        for from in self.men_of(color) {
            for direction in Direction::forward(color) {
                let Some(to) = from.neighbor(direction) else {
                    continue;
                };
                if empty.contains(to) {
                    let flags = if to.is_promotion_row(color) {
                        Move::FLAG_PROMOTION
                    } else {
                        0
                    };
                    moves.push(Move::new(from, to, flags));
                }
            }
        }

        for from in self.kings_of(color) {
            for direction in Direction::ALL {
                for to in from.ray(direction).take_while(|sq| empty.contains(*sq)) {
                    moves.push(Move::new(from, to, Move::FLAG_KING));
                }
            }
        }
    }
}

impl Default for Position {
    /// The initial position: Black on 1-20, White on 31-50, White to move.
    fn default() -> Self {
        let mut pos = Self::new();
        pos.colors[Color::Black.index()] = Bitboard::from_numbers(1, 20);
        pos.colors[Color::White.index()] = Bitboard::from_numbers(31, 50);
        pos
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s).with_context(|| format!("Failed to parse FEN {s:?}"))
    }
}

impl fmt::Display for Position {
    /// Display this position's FEN string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl fmt::Debug for Position {
    /// Draws the board, with light squares left blank and empty dark squares as `.`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..10 {
            write!(f, "{row}|")?;
            for col in 0..10 {
                let cell = match Square::from_coords(row, col) {
                    Some(sq) => self.piece_at(sq).map(|p| p.char()).unwrap_or('.'),
                    None => ' ',
                };
                write!(f, " {cell}")?;
            }

            if row == 1 {
                write!(f, "      FEN: {}", self.to_fen())?;
            } else if row == 2 {
                write!(f, "     Side: {}", self.side_to_move())?;
            } else if row == 3 {
                write!(
                    f,
                    "    White: {} men, {} kings",
                    self.men_of(Color::White).population(),
                    self.kings_of(Color::White).population()
                )?;
            } else if row == 4 {
                write!(
                    f,
                    "    Black: {} men, {} kings",
                    self.men_of(Color::Black).population(),
                    self.kings_of(Color::Black).population()
                )?;
            }
            writeln!(f)?;
        }
        write!(f, " +{}", "--".repeat(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(n: u8) -> Square {
        Square::new(n).unwrap()
    }

    fn move_strings(position: &Position) -> Vec<String> {
        let mut moves = position
            .legal_moves()
            .iter()
            .map(|mv| mv.to_string())
            .collect::<Vec<_>>();
        moves.sort();
        moves
    }

    #[test]
    fn test_startpos_fen() {
        let fen = "W:W31,32,33,34,35,36,37,38,39,40,41,42,43,44,45,46,47,48,49,50:B1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18,19,20";
        assert_eq!(Position::default().to_fen(), fen);
        assert_eq!(Position::from_fen("W:W31-50:B1-20").unwrap(), Position::default());
    }

    #[test]
    fn test_startpos_moves() {
        assert_eq!(
            move_strings(&Position::default()),
            ["31-26", "31-27", "32-27", "32-28", "33-28", "33-29", "34-29", "34-30", "35-30"]
        );

        let black = Position::from_fen("B:W31-50:B1-20").unwrap();
        assert_eq!(black.legal_moves().len(), 9);
        assert!(black.legal_moves().iter().all(|mv| mv.from().row() == 3));
    }

    #[test]
    fn test_men_capture_backwards() {
        let position = Position::from_fen("W:W28:B33").unwrap();
        assert_eq!(move_strings(&position), ["28x39"]);
    }

    #[test]
    fn test_maximum_capture_rule() {
        // 28x19 takes one piece, 28x17x8 takes two
        let position = Position::from_fen("W:W28:B23,22,12").unwrap();
        let moves = position.legal_moves();
        assert!(moves.iter().all(|mv| mv.num_captured() == 2));
        assert_eq!(move_strings(&position), ["28x8"]);
    }

    #[test]
    fn test_flying_king() {
        let position = Position::from_fen("W:WK46:B1").unwrap();
        assert_eq!(
            move_strings(&position),
            ["46-10", "46-14", "46-19", "46-23", "46-28", "46-32", "46-37", "46-41", "46-5"]
        );
    }

    #[test]
    fn test_king_capture_lands_anywhere_beyond() {
        // King on 46 takes 37 and may stop on any empty square behind it
        let position = Position::from_fen("W:WK46:B37").unwrap();
        assert_eq!(
            move_strings(&position),
            ["46x10", "46x14", "46x19", "46x23", "46x28", "46x32", "46x5"]
        );
        assert!(position.legal_moves().iter().all(|mv| mv.is_king_move()));
    }

    #[test]
    fn test_adjacent_pieces_cannot_be_jumped() {
        let position = Position::from_fen("W:WK46:B37,32").unwrap();
        assert!(position.capture_moves().is_empty());
        assert_eq!(move_strings(&position), ["46-41"]);
    }

    #[test]
    fn test_promotion_only_at_end_of_move() {
        // Quiet move onto the far row promotes
        let position = Position::from_fen("W:W7:B40").unwrap();
        let moves = position.legal_moves();
        assert!(moves.iter().all(|mv| mv.is_promotion()));
        assert_eq!(move_strings(&position), ["7-1", "7-2"]);

        // Passing through the far row mid-capture does not promote: 12x3x14 ends on row 2
        let position = Position::from_fen("W:W12:B8,9").unwrap();
        let moves = position.legal_moves();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].to_string(), "12x14");
        assert!(!moves[0].is_promotion());
    }

    #[test]
    fn test_make_unmake_restores_position() {
        let positions = [
            "W:W31-50:B1-20",
            "W:WK46:B37,32",
            "W:W28:B23,22,12",
            "W:W12:B8,9",
            "B:W33,K41:BK23,5",
            "W:W7:B40",
        ];

        for fen in positions {
            let original = Position::from_fen(fen).unwrap();
            let mut position = original;
            for mv in original.legal_moves() {
                position.make_move(mv);
                assert_ne!(position.side_to_move(), original.side_to_move());
                position.unmake_move(mv);
                assert_eq!(position, original, "{mv:?} was not undone on {fen}");
            }
        }
    }

    #[test]
    fn test_make_move_applies_capture() {
        let mut position = Position::from_fen("W:W28:BK23").unwrap();
        let mv = Move::from_text(&position, "28x19").unwrap();
        position.make_move(mv);
        assert_eq!(position.to_fen(), "B:W19:B");
        assert!(mv.captured_kings().contains(sq(23)));
    }

    #[test]
    fn test_circular_capture() {
        // The man on 43 takes a ring of four men and lands back on its own square
        let position = Position::from_fen("W:W43:B38,28,29,39").unwrap();
        let moves = position.legal_moves();
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].from(), moves[0].to());
        assert_eq!(moves[0].num_captured(), 4);

        let mut after = position;
        after.make_move(moves[0]);
        assert_eq!(after.to_fen(), "B:W43:B");
        after.unmake_move(moves[0]);
        assert_eq!(after, position);
    }
}
