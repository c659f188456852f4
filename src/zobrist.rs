/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{GameState, Piece, Square, XoShiRo};

/// Represents a key generated from a Zobrist Hash
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Return the inner `u64` of this key.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::*;
    /// let zero = ZobristKey::default();
    /// assert_eq!(zero.inner(), 0);
    /// ```
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Adds/removes `hash_key` to this [`ZobristKey`].
    ///
    /// This is done internally with the XOR operator.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::*;
    /// let mut zero = ZobristKey::default();
    /// zero.hash(42);
    /// assert_ne!(zero.inner(), 0);
    ///
    /// // Calling again un-hashes it
    /// zero.hash(42);
    /// assert_eq!(zero.inner(), 0);
    /// ```
    #[inline(always)]
    pub fn hash(&mut self, hash_key: u64) {
        self.0 ^= hash_key;
    }
}

impl fmt::Display for ZobristKey {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A position fingerprint: the Zobrist key plus an independently drawn lock.
///
/// Two different positions sharing a key are told apart by their locks.
#[derive(Default, PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct Fingerprint {
    pub key: ZobristKey,
    pub lock: u64,
}

/// Random tables for Zobrist hashing, one value per `(square, piece)` pair.
///
/// Only occupancy is hashed into the key. The side to move goes into the lock, so a key
/// shared by both sides of the same board reads as a collision rather than a hit.
/// Tables are drawn once from a seed and live as long as the engine that owns them.
pub struct Zobrist {
    seed: u64,
    piece_keys: [[u64; Piece::COUNT]; Square::COUNT],
    piece_locks: [[u64; Piece::COUNT]; Square::COUNT],
    black_lock: u64,
}

impl Zobrist {
    /// Generates the key and lock tables from `seed`.
    ///
    /// The same seed always produces the same tables.
    pub fn new(seed: u64) -> Self {
        let mut prng = XoShiRo::new(seed);

        let mut piece_keys = [[0; Piece::COUNT]; Square::COUNT];
        for keys in piece_keys.iter_mut() {
            keys.fill_with(|| prng.get_next());
        }

        let mut piece_locks = [[0; Piece::COUNT]; Square::COUNT];
        for locks in piece_locks.iter_mut() {
            locks.fill_with(|| prng.get_next());
        }

        let black_lock = prng.get_next();

        Self {
            seed,
            piece_keys,
            piece_locks,
            black_lock,
        }
    }

    /// Seed these tables were generated from.
    #[inline(always)]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Hash value of `piece` standing on `square`.
    #[inline(always)]
    pub fn piece_key(&self, square: Square, piece: Piece) -> u64 {
        self.piece_keys[square][piece.index()]
    }

    /// Computes the [`ZobristKey`] of `state` from scratch.
    ///
    /// # Example
    /// ```
    /// # use draughtsman::*;
    /// let zobrist = Zobrist::new(7);
    /// let white = Position::from_fen("W:W31-50:B1-20").unwrap();
    /// let black = Position::from_fen("B:W31-50:B1-20").unwrap();
    ///
    /// // Side to move does not affect the key, only the lock
    /// assert_eq!(zobrist.hash(&white), zobrist.hash(&black));
    /// assert_ne!(zobrist.fingerprint(&white), zobrist.fingerprint(&black));
    /// assert_ne!(zobrist.hash(&white), zobrist.hash(&Position::new()));
    /// ```
    pub fn hash<S: GameState>(&self, state: &S) -> ZobristKey {
        self.fingerprint(state).key
    }

    /// Computes the key and the lock of `state` in a single pass over the board.
    pub fn fingerprint<S: GameState>(&self, state: &S) -> Fingerprint {
        let mut key = ZobristKey::default();
        let mut lock = 0;

        for square in Square::iter() {
            if let Some(piece) = state.piece_at(square) {
                key.hash(self.piece_keys[square][piece.index()]);
                lock ^= self.piece_locks[square][piece.index()];
            }
        }

        if state.side_to_move().is_black() {
            lock ^= self.black_lock;
        }

        Fingerprint { key, lock }
    }
}

impl fmt::Debug for Zobrist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zobrist").field("seed", &self.seed).finish()
    }
}
