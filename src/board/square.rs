/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use anyhow::{bail, Context, Result};

use super::Color;

/// Number of rows (and columns) on an international draughts board.
pub const BOARD_SIZE: u8 = 10;

/// Diagonal neighbours of every square, indexed by [`Direction::index`].
///
/// Computed at compile time from the row/column coordinates of each square.
const NEIGHBORS: [[Option<Square>; Direction::COUNT]; Square::COUNT] = {
    let mut neighbors = [[None; Direction::COUNT]; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let square = Square(i as u8);
        let row = square.row() as i8;
        let col = square.col() as i8;

        let mut d = 0;
        while d < Direction::COUNT {
            let (dr, dc) = Direction::ALL[d].delta();
            neighbors[i][d] = Square::from_coords(row + dr, col + dc);
            d += 1;
        }

        i += 1;
    }

    neighbors
};

/// One of the four diagonal directions a piece can travel in.
///
/// "North" is towards row 0 (squares 1-5), which is the direction White's men advance in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Direction {
    /// Number of diagonal directions.
    pub const COUNT: usize = 4;

    /// All directions, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// Returns the index of this [`Direction`] into [`Direction::ALL`].
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Returns the `(row, column)` offset of a single step in this direction.
    #[inline(always)]
    pub const fn delta(&self) -> (i8, i8) {
        match self {
            Self::NorthWest => (-1, -1),
            Self::NorthEast => (-1, 1),
            Self::SouthWest => (1, -1),
            Self::SouthEast => (1, 1),
        }
    }

    /// Returns the direction pointing the opposite way along the same diagonal.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::Direction;
    /// assert_eq!(Direction::NorthWest.opposite(), Direction::SouthEast);
    /// assert_eq!(Direction::SouthWest.opposite(), Direction::NorthEast);
    /// ```
    #[inline(always)]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::NorthWest => Self::SouthEast,
            Self::NorthEast => Self::SouthWest,
            Self::SouthWest => Self::NorthEast,
            Self::SouthEast => Self::NorthWest,
        }
    }

    /// The two directions a man of `color` moves in.
    #[inline(always)]
    pub const fn forward(color: Color) -> [Self; 2] {
        match color {
            Color::White => [Self::NorthWest, Self::NorthEast],
            Color::Black => [Self::SouthWest, Self::SouthEast],
        }
    }
}

/// A playable (dark) square on a `10x10` board, numbered `1..=50` in standard notation.
///
/// Internally the square is stored as its zero-based index (`number - 1`).
/// The numbering runs left to right, top to bottom, five squares per row:
/// ```text
///  0|    01    02    03    04    05
///  1| 06    07    08    09    10
///  2|    11    12    13    14    15
///  3| 16    17    18    19    20
///  4|    21    22    23    24    25
///  5| 26    27    28    29    30
///  6|    31    32    33    34    35
///  7| 36    37    38    39    40
///  8|    41    42    43    44    45
///  9| 46    47    48    49    50
/// ```
/// White starts on 31-50 and moves up the board; Black starts on 1-20 and moves down.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Square(pub(crate) u8);

impl Square {
    /// Number of playable squares on the board.
    pub const COUNT: usize = 50;

    /// Creates a [`Square`] from its standard number in `1..=50`.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::Square;
    /// assert!(Square::new(1).is_some());
    /// assert!(Square::new(50).is_some());
    /// assert!(Square::new(0).is_none());
    /// assert!(Square::new(51).is_none());
    /// ```
    #[inline(always)]
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number as usize <= Self::COUNT {
            Some(Self(number - 1))
        } else {
            None
        }
    }

    /// Creates a [`Square`] from a zero-based index, without bounds checking.
    #[inline(always)]
    pub const fn from_index_unchecked(index: usize) -> Self {
        Self(index as u8)
    }

    /// Creates a [`Square`] from `(row, column)` coordinates on the full `10x10` grid.
    ///
    /// Yields `None` if the coordinates are off the board or name a light (unplayable) square.
    #[inline(always)]
    pub const fn from_coords(row: i8, col: i8) -> Option<Self> {
        if row < 0 || col < 0 || row >= BOARD_SIZE as i8 || col >= BOARD_SIZE as i8 {
            return None;
        }

        // Dark squares are those where row + column is odd
        if (row + col) % 2 == 0 {
            return None;
        }

        Some(Self((row * 5 + col / 2) as u8))
    }

    /// Standard notation number of this square, in `1..=50`.
    #[inline(always)]
    pub const fn number(&self) -> u8 {
        self.0 + 1
    }

    /// Zero-based index of this square, in `0..50`.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Row of this square, where row 0 holds squares 1-5.
    #[inline(always)]
    pub const fn row(&self) -> u8 {
        self.0 / 5
    }

    /// Column of this square on the full `10x10` grid.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::Square;
    /// assert_eq!(Square::new(1).unwrap().col(), 1);
    /// assert_eq!(Square::new(6).unwrap().col(), 0);
    /// assert_eq!(Square::new(5).unwrap().col(), 9);
    /// ```
    #[inline(always)]
    pub const fn col(&self) -> u8 {
        let offset = (self.0 % 5) * 2;
        if self.row() % 2 == 0 {
            offset + 1
        } else {
            offset
        }
    }

    /// Returns the adjacent square in `direction`, if it is on the board.
    #[inline(always)]
    pub const fn neighbor(&self, direction: Direction) -> Option<Self> {
        NEIGHBORS[self.index()][direction.index()]
    }

    /// Returns an iterator over every square in `direction`, starting with (and excluding) `self`.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::{Direction, Square};
    /// let from = Square::new(46).unwrap();
    /// let ray: Vec<u8> = from.ray(Direction::NorthEast).map(|sq| sq.number()).collect();
    /// assert_eq!(ray, [41, 37, 32, 28, 23, 19, 14, 10, 5]);
    /// ```
    #[inline(always)]
    pub const fn ray(&self, direction: Direction) -> Ray {
        Ray {
            next: self.neighbor(direction),
            direction,
        }
    }

    /// Returns the square `n` rows straight ahead of this one, from `color`'s point of view.
    ///
    /// Only even `n` lands on a playable square.
    #[inline(always)]
    pub const fn ahead(&self, color: Color, n: i8) -> Option<Self> {
        let row = self.row() as i8;
        let row = match color {
            Color::White => row - n,
            Color::Black => row + n,
        };
        Self::from_coords(row, self.col() as i8)
    }

    /// Returns `true` if this square is on the row where `color`'s men promote.
    #[inline(always)]
    pub const fn is_promotion_row(&self, color: Color) -> bool {
        self.row() == color.promotion_row()
    }

    /// Returns `true` if this square lies on any edge of the board.
    #[inline(always)]
    pub const fn is_edge(&self) -> bool {
        let row = self.row();
        let col = self.col();
        row == 0 || row == BOARD_SIZE - 1 || col == 0 || col == BOARD_SIZE - 1
    }

    /// An iterator over all squares, in ascending order.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Parses a [`Square`] from its standard number.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::Square;
    /// assert_eq!(Square::from_notation("32").unwrap().number(), 32);
    /// assert!(Square::from_notation("0").is_err());
    /// assert!(Square::from_notation("a4").is_err());
    /// ```
    pub fn from_notation(s: &str) -> Result<Self> {
        let number = s
            .trim()
            .parse::<u8>()
            .with_context(|| format!("Invalid square {s:?}: expected a number in 1..=50"))?;

        let Some(square) = Self::new(number) else {
            bail!("Invalid square {s:?}: must be in 1..=50");
        };

        Ok(square)
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_notation(s)
    }
}

impl fmt::Display for Square {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.number().fmt(f)
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.number(), self.row(), self.col())
    }
}

impl<T> Index<Square> for [T; Square::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Square> for [T; Square::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

/// An iterator over the squares along a diagonal.
///
/// See [`Square::ray`].
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    next: Option<Square>,
    direction: Direction,
}

impl Iterator for Ray {
    type Item = Square;
    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.neighbor(self.direction);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coords_round_trip() {
        for square in Square::iter() {
            let back = Square::from_coords(square.row() as i8, square.col() as i8);
            assert_eq!(back, Some(square), "{square:?} did not survive coordinates");
        }
    }

    #[test]
    fn test_edges() {
        let edges = Square::iter()
            .filter(Square::is_edge)
            .map(|sq| sq.number())
            .collect::<Vec<_>>();

        assert_eq!(
            edges,
            [1, 2, 3, 4, 5, 6, 15, 16, 25, 26, 35, 36, 45, 46, 47, 48, 49, 50]
        );
    }

    #[test]
    fn test_neighbors() {
        let sq = |n| Square::new(n).unwrap();

        assert_eq!(sq(28).neighbor(Direction::NorthWest), Some(sq(22)));
        assert_eq!(sq(28).neighbor(Direction::NorthEast), Some(sq(23)));
        assert_eq!(sq(28).neighbor(Direction::SouthWest), Some(sq(32)));
        assert_eq!(sq(28).neighbor(Direction::SouthEast), Some(sq(33)));

        // Corners and edges
        assert_eq!(sq(46).neighbor(Direction::SouthWest), None);
        assert_eq!(sq(46).neighbor(Direction::NorthWest), None);
        assert_eq!(sq(5).neighbor(Direction::NorthEast), None);
        assert_eq!(sq(6).neighbor(Direction::NorthEast), Some(sq(1)));
        assert_eq!(sq(15).neighbor(Direction::SouthEast), None);
    }

    #[test]
    fn test_ahead() {
        let sq = |n| Square::new(n).unwrap();

        assert_eq!(sq(33).ahead(Color::White, 2), Some(sq(23)));
        assert_eq!(sq(33).ahead(Color::Black, 2), Some(sq(43)));
        assert_eq!(sq(8).ahead(Color::White, 2), None);
    }
}
