/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

/// A heuristic value of a position, from the point of view of the side the engine plays.
///
/// Positive values favour the engine. The heuristic is measured in weighted piece units,
/// so realistic values stay far away from [`Self::INF`].
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Score(pub i32);

impl Score {
    /// Largest possible score ever achievable.
    pub const INF: Self = Self(i16::MAX as i32);

    /// Initial value of alpha at the root: below every reachable score.
    pub const MIN: Self = Self(-Self::INF.0);

    /// Initial value of beta at the root: above every reachable score.
    pub const MAX: Self = Self::INF;

    /// Score of a balanced position.
    pub const DRAW: Self = Self(0);

    /// Constructs a new [`Score`] instance.
    #[inline(always)]
    pub const fn new(score: i32) -> Self {
        Self(score)
    }

    /// Returns `true` if this score is one of the window sentinels rather than a real evaluation.
    #[inline(always)]
    pub const fn is_infinite(&self) -> bool {
        self.0.abs() >= Self::INF.0
    }

    #[inline(always)]
    pub const fn inner(&self) -> i32 {
        self.0
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<i32> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: i32) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }

        impl std::ops::$trait<i32> for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: i32) {
                self.0.$fn(rhs);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(self.0.neg())
    }
}

impl std::iter::Sum for Score {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::DRAW, |acc, score| acc + score)
    }
}

impl PartialEq<i32> for Score {
    fn eq(&self, other: &i32) -> bool {
        self.0.eq(other)
    }
}

impl PartialOrd<i32> for Score {
    fn partial_cmp(&self, other: &i32) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl fmt::Display for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self >= Self::MAX {
            write!(f, "+inf")
        } else if *self <= Self::MIN {
            write!(f, "-inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_sentinels() {
        assert!(Score::MIN < Score::DRAW);
        assert!(Score::MAX > Score::DRAW);
        assert_eq!(-Score::MAX, Score::MIN);
        assert!(Score::MIN.is_infinite());
        assert!(!Score(500).is_infinite());
    }

    #[test]
    fn test_arithmetic() {
        let mut score = Score(3) + Score(4) - 2;
        score += 10;
        assert_eq!(score, 15);
        assert_eq!([Score(1), Score(-3), Score(5)].into_iter().sum::<Score>(), 3);
        assert_eq!(format!("{:?}", Score::MAX), "+inf");
    }
}
