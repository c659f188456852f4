/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Not, str::FromStr};

use anyhow::{bail, Result};

/// Represents the color of a player or piece on a draughts board.
///
/// White moves first, and therefore [`Color`] defaults to [`Color::White`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// An array of both colors, starting with White.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Returns `true` if this [`Color`] is Black.
    #[inline(always)]
    pub const fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }

    /// Returns the opposing color.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::Color;
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// assert_eq!(Color::Black.opponent(), Color::White);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Row on which this color's men are promoted.
    #[inline(always)]
    pub const fn promotion_row(&self) -> u8 {
        match self {
            Self::White => 0,
            Self::Black => 9,
        }
    }

    /// Row closest to this color's side of the board.
    #[inline(always)]
    pub const fn back_row(&self) -> u8 {
        self.opponent().promotion_row()
    }

    /// Index of this color (White = 0, Black = 1).
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Converts this [`Color`] to the character used in FEN strings.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::White => 'W',
            Self::Black => 'B',
        }
    }

    /// Returns this [`Color`] as a lowercase string.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }

    /// Parses a [`Color`] from `W`/`B` (case-insensitive).
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'W' | 'w' => Ok(Self::White),
            'B' | 'b' => Ok(Self::Black),
            _ => bail!("Invalid char for Color: Must be 'W' or 'B'. Got {c:?}."),
        }
    }
}

impl Not for Color {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        self.opponent()
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => bail!("Invalid str for Color: Must be a single char. Got {s:?}."),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name().fmt(f)
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.char().fmt(f)
    }
}

/// The kind of a draughts piece: a plain man or a (flying) king.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum PieceKind {
    Man,
    King,
}

/// A colored piece standing on the board.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
}

impl Piece {
    /// Number of distinct colored pieces.
    pub const COUNT: usize = 4;

    pub const WHITE_KING: Self = Self::new(Color::White, PieceKind::King);
    pub const WHITE_MAN: Self = Self::new(Color::White, PieceKind::Man);
    pub const BLACK_KING: Self = Self::new(Color::Black, PieceKind::King);
    pub const BLACK_MAN: Self = Self::new(Color::Black, PieceKind::Man);

    /// All pieces, in [`Piece::index`] order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::WHITE_KING,
        Self::WHITE_MAN,
        Self::BLACK_KING,
        Self::BLACK_MAN,
    ];

    /// Creates a new [`Piece`] of the given color and kind.
    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    #[inline(always)]
    pub const fn is_king(&self) -> bool {
        matches!(self.kind, PieceKind::King)
    }

    #[inline(always)]
    pub const fn is_man(&self) -> bool {
        matches!(self.kind, PieceKind::Man)
    }

    /// Index of this piece, used to address Zobrist tables.
    ///
    /// White king = 0, white man = 1, black king = 2, black man = 3.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::Piece;
    /// for (i, piece) in Piece::ALL.iter().enumerate() {
    ///     assert_eq!(piece.index(), i);
    /// }
    /// ```
    #[inline(always)]
    pub const fn index(&self) -> usize {
        let kind = match self.kind {
            PieceKind::King => 0,
            PieceKind::Man => 1,
        };
        self.color.index() * 2 + kind
    }

    /// Character used to draw this piece on a board diagram.
    ///
    /// Men are `w`/`b`, kings are `W`/`B`.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match (self.color, self.kind) {
            (Color::White, PieceKind::Man) => 'w',
            (Color::White, PieceKind::King) => 'W',
            (Color::Black, PieceKind::Man) => 'b',
            (Color::Black, PieceKind::King) => 'B',
        }
    }

    /// Parses a [`Piece`] from the characters produced by [`Piece::char`].
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'w' => Ok(Self::WHITE_MAN),
            'W' => Ok(Self::WHITE_KING),
            'b' => Ok(Self::BLACK_MAN),
            'B' => Ok(Self::BLACK_KING),
            _ => bail!("Invalid char for Piece: Must be one of 'w', 'W', 'b', 'B'. Got {c:?}."),
        }
    }
}

impl FromStr for Piece {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => bail!("Invalid str for Piece: Must be a single char. Got {s:?}."),
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.char().fmt(f)
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.color, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_rows() {
        assert_eq!(Color::White.back_row(), 9);
        assert_eq!(Color::Black.back_row(), 0);
        assert_eq!(!Color::White, Color::Black);
    }

    #[test]
    fn test_color_parsing() {
        assert_eq!("W".parse::<Color>().unwrap(), Color::White);
        assert_eq!("b".parse::<Color>().unwrap(), Color::Black);
        assert!("x".parse::<Color>().is_err());
        assert!("WB".parse::<Color>().is_err());
    }

    #[test]
    fn test_piece_chars() {
        for piece in Piece::ALL {
            assert_eq!(Piece::from_char(piece.char()).unwrap(), piece);
        }
        assert!("k".parse::<Piece>().is_err());
    }
}
