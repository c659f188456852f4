/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// A pseudo-random number generator using the "xoshiro256**" algorithm.
///
/// Source code adapted from <https://prng.di.unimi.it/xoshiro256starstar.c>
#[derive(Clone, Debug)]
pub struct XoShiRo([u64; 4]);

impl XoShiRo {
    /// Construct a new generator whose whole state is derived from a single `seed`.
    ///
    /// The state words are drawn from a splitmix64 sequence, so nearby seeds still produce unrelated streams.
    #[inline(always)]
    pub const fn new(seed: u64) -> Self {
        let (a, seed) = splitmix64(seed);
        let (b, seed) = splitmix64(seed);
        let (c, seed) = splitmix64(seed);
        let (d, _) = splitmix64(seed);
        Self::from_seeds([a, b, c, d])
    }

    /// Construct a new pseudo-random number generator from your own seeds.
    ///
    /// The seeds must not all be zero.
    #[inline(always)]
    pub const fn from_seeds(seeds: [u64; 4]) -> Self {
        Self(seeds)
    }

    /// Returns the next pseudo-random number in the sequence.
    #[inline(always)]
    pub fn get_next(&mut self) -> u64 {
        let (result, s) = Self::xoshiro(self.0);
        self.0 = s;
        result
    }

    /// Inner function for computing the next pseudo-random number in the sequence.
    const fn xoshiro(mut s: [u64; 4]) -> (u64, [u64; 4]) {
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);

        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];

        s[2] ^= t;

        s[3] = s[3].rotate_left(45);
        (result, s)
    }
}

impl Iterator for XoShiRo {
    type Item = u64;
    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        Some(self.get_next())
    }
}

/// One step of splitmix64, returning `(output, next_state)`.
///
/// See <https://prng.di.unimi.it/splitmix64.c>
const fn splitmix64(state: u64) -> (u64, u64) {
    let state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    (z ^ (z >> 31), state)
}
