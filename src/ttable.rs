/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::HashMap;

use crate::{Fingerprint, GameMove, Score, SearchBounds, ZobristKey};

/// Type of node encountered during search.
///
/// See [CPW](https://www.chessprogramming.org/Node_Types) for more.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum NodeType {
    /// The score is exact.
    Pv,

    /// The score is less than or equal to alpha (upper bound).
    All,

    /// The score is greater than or equal to beta (lower bound).
    Cut,
}

impl NodeType {
    /// Creates a new [`NodeType`] from a node's result and the window it was searched with:
    ///
    /// ```text
    /// if score <= alpha:
    ///     UPPERBOUND
    /// else if score >= beta:
    ///     LOWERBOUND
    /// else:
    ///     EXACT
    /// ```
    #[inline(always)]
    pub fn new(score: Score, bounds: SearchBounds) -> Self {
        if score <= bounds.alpha {
            Self::All
        } else if score >= bounds.beta {
            Self::Cut
        } else {
            Self::Pv
        }
    }

    /// Short name used in diagnostics.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pv => "exact",
            Self::All => "upper",
            Self::Cut => "lower",
        }
    }
}

/// An entry into a hash table
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct TTableEntry<M> {
    /// Key of the node this entry represents.
    pub key: ZobristKey,

    /// Independent hash of the same node, used to detect key collisions.
    pub lock: u64,

    /// Remaining depth at which the data for this entry was found.
    pub depth: u8,

    /// Best move found for this position, if any move improved on the window.
    pub bestmove: Option<M>,

    /// Best score found for this position.
    pub score: Score,

    /// Node type of this entry.
    pub node_type: NodeType,
}

impl<M: GameMove> TTableEntry<M> {
    /// Creates a new [`TTableEntry`], classifying `score` against the window `bounds` the node was entered with.
    #[inline(always)]
    pub fn new(
        fingerprint: Fingerprint,
        bestmove: Option<M>,
        score: Score,
        bounds: SearchBounds,
        depth: u8,
    ) -> Self {
        Self {
            key: fingerprint.key,
            lock: fingerprint.lock,
            bestmove,
            score,
            depth,
            node_type: NodeType::new(score, bounds),
        }
    }

    /// Determine whether the score in this entry can be used and, if so, return it.
    ///
    /// An entry's score can be used if and only if:
    ///     1. The entry is exact ([`NodeType::Pv`]).
    ///     2. The entry is an upper bound ([`NodeType::All`]) and its score is `<= alpha`.
    ///     3. The entry is a lower bound ([`NodeType::Cut`]) and its score is `>= beta`.
    #[inline(always)]
    pub fn try_score(&self, bounds: SearchBounds) -> Option<Score> {
        let score = self.score;

        (self.node_type == NodeType::Pv
            || (self.node_type == NodeType::All && score <= bounds.alpha)
            || (self.node_type == NodeType::Cut && score >= bounds.beta))
            .then_some(score)
    }
}

/// Transposition Table.
///
/// Used during a search to keep track of previous search results on positions,
/// avoiding unnecessary re-computations.
///
/// The table is unbounded: an entry is never evicted, only overwritten by a later result for the same key.
#[derive(Debug)]
pub struct TTable<M> {
    /// Internal cache of the TTable.
    cache: HashMap<ZobristKey, TTableEntry<M>>,

    /// Number of collisions that have occurred since last clearing.
    pub(crate) collisions: usize,

    /// Number of accesses that have occurred since last clearing.
    pub(crate) accesses: usize,

    /// Number of hits that have occurred since last clearing.
    pub(crate) hits: usize,
}

impl<M: GameMove> TTable<M> {
    /// Create a new, empty [`TTable`].
    #[inline(always)]
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
            collisions: 0,
            accesses: 0,
            hits: 0,
        }
    }

    /// Clears the entries and the statistics of this [`TTable`].
    #[inline(always)]
    pub fn clear(&mut self) {
        self.cache.clear();
        self.collisions = 0;
        self.accesses = 0;
        self.hits = 0;
    }

    /// Returns the number of entries in this [`TTable`].
    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.cache.len()
    }

    #[inline(always)]
    pub const fn hits(&self) -> usize {
        self.hits
    }

    #[inline(always)]
    pub const fn accesses(&self) -> usize {
        self.accesses
    }

    #[inline(always)]
    pub const fn collisions(&self) -> usize {
        self.collisions
    }

    /// Percentage of accesses that found a matching entry.
    #[inline(always)]
    pub fn hit_rate(&self) -> f32 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f32 / self.accesses as f32 * 100.0
        }
    }

    /// Get the entry if and only if it matches the provided key, without touching the statistics.
    #[inline(always)]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&TTableEntry<M>> {
        self.cache
            .get(&fingerprint.key)
            .filter(|e| e.lock == fingerprint.lock)
    }

    /// Looks up `fingerprint`, recording the access in this table's statistics.
    ///
    /// An entry stored under the same key but with a different lock is a collision, and is treated as a miss.
    #[inline(always)]
    pub fn probe(&mut self, fingerprint: &Fingerprint) -> Option<&TTableEntry<M>> {
        self.accesses += 1;

        let entry = self.cache.get(&fingerprint.key)?;
        if entry.lock != fingerprint.lock {
            self.collisions += 1;
            return None;
        }

        self.hits += 1;
        Some(entry)
    }

    /// Store `entry` in the table at `entry.key`, overriding and returning whatever was there.
    #[inline(always)]
    pub fn store(&mut self, entry: TTableEntry<M>) -> Option<TTableEntry<M>> {
        self.cache.insert(entry.key, entry)
    }
}

impl<M: GameMove> Default for TTable<M> {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn entry(fingerprint: Fingerprint, score: i32, node_type: NodeType) -> TTableEntry<Move> {
        TTableEntry {
            key: fingerprint.key,
            lock: fingerprint.lock,
            depth: 3,
            bestmove: None,
            score: Score(score),
            node_type,
        }
    }

    #[test]
    fn test_ttable() {
        let zobrist = Zobrist::new(0);
        let pos1 = Position::default();
        let pos2 = Position::from_fen("W:W31-45:B1-15").unwrap();

        let fp1 = zobrist.fingerprint(&pos1);
        let fp2 = zobrist.fingerprint(&pos2);

        let entry1 = entry(fp1, 0, NodeType::Pv);
        let entry2 = entry(fp2, 10, NodeType::Cut);

        let mut tt = TTable::new();
        assert_eq!(tt.num_entries(), 0, "TTable should initialize to being empty");
        assert!(tt.probe(&fp1).is_none());

        tt.store(entry1.clone());
        tt.store(entry2.clone());
        assert_eq!(tt.num_entries(), 2);
        assert_eq!(tt.probe(&fp1), Some(&entry1));
        assert_eq!(tt.get(&fp2), Some(&entry2));

        // Storing again under the same key overwrites
        let newer = entry(fp1, -5, NodeType::All);
        assert_eq!(tt.store(newer.clone()), Some(entry1));
        assert_eq!(tt.num_entries(), 2);
        assert_eq!(tt.get(&fp1), Some(&newer));

        assert_eq!(tt.accesses(), 2);
        assert_eq!(tt.hits(), 1);
        assert_eq!(tt.collisions(), 0);
    }

    #[test]
    fn test_lock_mismatch_is_a_collision() {
        let zobrist = Zobrist::new(0);
        let fp = zobrist.fingerprint(&Position::default());

        let mut tt = TTable::new();
        tt.store(entry(fp, 0, NodeType::Pv));

        let forged = Fingerprint {
            key: fp.key,
            lock: fp.lock ^ 1,
        };
        assert!(tt.probe(&forged).is_none());
        assert!(tt.get(&forged).is_none());
        assert_eq!(tt.collisions(), 1);
        assert_eq!(tt.hits(), 0);

        tt.clear();
        assert_eq!(tt.num_entries(), 0);
        assert_eq!(tt.collisions(), 0);
    }

    #[test]
    fn test_node_type_and_try_score() {
        let bounds = SearchBounds::new(Score(-10), Score(10));

        assert_eq!(NodeType::new(Score(-10), bounds), NodeType::All);
        assert_eq!(NodeType::new(Score(10), bounds), NodeType::Cut);
        assert_eq!(NodeType::new(Score(3), bounds), NodeType::Pv);

        let fp = Fingerprint::default();
        assert_eq!(entry(fp, 3, NodeType::Pv).try_score(bounds), Some(Score(3)));
        assert_eq!(entry(fp, 12, NodeType::Cut).try_score(bounds), Some(Score(12)));
        assert_eq!(entry(fp, 5, NodeType::Cut).try_score(bounds), None);
        assert_eq!(entry(fp, -12, NodeType::All).try_score(bounds), Some(Score(-12)));
        assert_eq!(entry(fp, -5, NodeType::All).try_score(bounds), None);
    }
}
