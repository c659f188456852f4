/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Not};

use super::{Color, Square};

/// A [`Bitboard`] represents a set of playable squares as the low 50 bits of a `u64`.
///
/// Bit index `i` corresponds to square number `i + 1`, so square 1 is the least-significant bit
/// and square 50 is bit 49. The upper 14 bits are always zero.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Bitboard(pub(crate) u64);

impl Bitboard {
    pub const EMPTY_BOARD: Self = Self(0);
    pub const FULL_BOARD: Self = Self((1 << Square::COUNT) - 1);

    /// Squares 1-5.
    pub const ROW_0: Self = Self(0b11111);
    /// Squares 46-50.
    pub const ROW_9: Self = Self(0b11111 << 45);

    /// Constructs a new [`Bitboard`] from the provided bit pattern, discarding bits above square 50.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::Bitboard;
    /// assert_eq!(Bitboard::new(u64::MAX), Bitboard::FULL_BOARD);
    /// assert_eq!(Bitboard::new(0b101).population(), 2);
    /// ```
    #[inline(always)]
    pub const fn new(bits: u64) -> Self {
        Self(bits & Self::FULL_BOARD.0)
    }

    /// Constructs a new [`Bitboard`] with only `square` set.
    #[inline(always)]
    pub const fn from_square(square: Square) -> Self {
        Self(1 << square.index())
    }

    /// Returns the squares of the row that `color`'s pieces start closest to.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::{Bitboard, Color, Square};
    /// let back = Bitboard::back_row(Color::White);
    /// assert!(back.contains(Square::new(46).unwrap()));
    /// assert!(back.contains(Square::new(50).unwrap()));
    /// assert!(!back.contains(Square::new(45).unwrap()));
    /// ```
    #[inline(always)]
    pub const fn back_row(color: Color) -> Self {
        match color {
            Color::White => Self::ROW_9,
            Color::Black => Self::ROW_0,
        }
    }

    /// Returns the squares on which `color`'s men are promoted.
    #[inline(always)]
    pub const fn promotion_row(color: Color) -> Self {
        Self::back_row(color.opponent())
    }

    /// Builds a [`Bitboard`] from the inclusive range of square numbers `first..=last`.
    ///
    /// Numbers outside of `1..=50` are ignored.
    pub fn from_numbers(first: u8, last: u8) -> Self {
        (first..=last).filter_map(Square::new).collect()
    }

    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Returns `true` if `square` is a member of this set.
    #[inline(always)]
    pub const fn contains(&self, square: Square) -> bool {
        self.0 & (1 << square.index()) != 0
    }

    /// Returns `true` if `self` and `other` share at least one square.
    #[inline(always)]
    pub fn intersects(&self, other: impl Into<Self>) -> bool {
        self.0 & other.into().0 != 0
    }

    /// Adds every square in `other` to `self`.
    #[inline(always)]
    pub fn set(&mut self, other: impl Into<Self>) {
        self.0 |= other.into().0;
    }

    /// Removes every square in `other` from `self`.
    #[inline(always)]
    pub fn clear(&mut self, other: impl Into<Self>) {
        self.0 &= !other.into().0;
    }

    /// Lowest-numbered square in the set, if any.
    #[inline(always)]
    pub const fn lsb(&self) -> Option<Square> {
        if self.is_empty() {
            None
        } else {
            Some(Square::from_index_unchecked(self.0.trailing_zeros() as usize))
        }
    }

    /// Removes and returns the lowest-numbered square in the set.
    #[inline(always)]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let lsb = self.lsb()?;
        self.0 &= self.0 - 1;
        Some(lsb)
    }

    /// Number of squares in this set.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::Bitboard;
    /// assert_eq!(Bitboard::FULL_BOARD.population(), 50);
    /// assert_eq!(Bitboard::EMPTY_BOARD.population(), 0);
    /// ```
    #[inline(always)]
    pub const fn population(&self) -> u8 {
        self.0.count_ones() as u8
    }

    /// An iterator over the squares of this set, in ascending order.
    #[inline(always)]
    pub const fn iter(&self) -> BitboardIter {
        BitboardIter { bitboard: *self }
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::EMPTY_BOARD, |bb, sq| bb | Self::from_square(sq))
    }
}

macro_rules! impl_bitwise_op {
    ($op:tt, $op_assign:tt, $func:ident, $func_assign:ident) => {
        impl<T> std::ops::$op<T> for Bitboard
        where
            Self: From<T>,
        {
            type Output = Self;
            #[inline(always)]
            fn $func(self, rhs: T) -> Self::Output {
                Self(self.0.$func(Self::from(rhs).0))
            }
        }

        impl<T> std::ops::$op_assign<T> for Bitboard
        where
            Self: From<T>,
        {
            #[inline(always)]
            fn $func_assign(&mut self, rhs: T) {
                self.0.$func_assign(Self::from(rhs).0);
            }
        }
    };
}

impl_bitwise_op!(BitAnd, BitAndAssign, bitand, bitand_assign);
impl_bitwise_op!(BitOr, BitOrAssign, bitor, bitor_assign);
impl_bitwise_op!(BitXor, BitXorAssign, bitxor, bitxor_assign);

impl Not for Bitboard {
    type Output = Self;
    /// Complement within the 50 playable squares.
    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0 & Self::FULL_BOARD.0)
    }
}

impl From<Square> for Bitboard {
    #[inline(always)]
    fn from(value: Square) -> Self {
        Self::from_square(value)
    }
}

impl<T> From<Option<T>> for Bitboard
where
    Self: From<T>,
{
    #[inline(always)]
    fn from(value: Option<T>) -> Self {
        value.map(Self::from).unwrap_or_default()
    }
}

impl From<u64> for Bitboard {
    #[inline(always)]
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Bitboard {
    /// Draws the set as a `10x10` grid, with `X` on member squares and `.` elsewhere.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..10 {
            for col in 0..10 {
                let cell = match Square::from_coords(row, col) {
                    Some(sq) if self.contains(sq) => 'X',
                    Some(_) => '.',
                    None => ' ',
                };
                write!(f, "{cell}")?;
                if col < 9 {
                    write!(f, " ")?;
                }
            }
            if row < 9 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// An iterator over the squares of a [`Bitboard`], lowest first.
pub struct BitboardIter {
    bitboard: Bitboard,
}

impl Iterator for BitboardIter {
    type Item = Square;
    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.bitboard.pop_lsb()
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.bitboard.population() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
