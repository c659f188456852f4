/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use crate::{Color, Evaluator, GameMove, GameState, MoveList, Score, MAX_NUM_MOVES};

/// Yields moves best-first according to a score assigned to each move up front.
///
/// Selection is lazy: each call to `next` finds the best remaining move, so a cutoff after the
/// first few moves skips most of the sorting work. Among equal scores the earlier move is yielded first.
pub struct MovePicker<M> {
    moves: MoveList<M>,
    scores: ArrayVec<Score, MAX_NUM_MOVES>,
    current: usize,
    /// Yield the negation of the stored sort keys.
    negated: bool,
}

impl<M: GameMove> MovePicker<M> {
    /// Scores every move with `score_fn`. Higher scores are yielded first.
    pub fn new(moves: MoveList<M>, mut score_fn: impl FnMut(M) -> Score) -> Self {
        let mut scores = ArrayVec::default();

        for &mv in moves.iter() {
            scores.push(score_fn(mv));
        }

        Self {
            moves,
            scores,
            current: 0,
            negated: false,
        }
    }

    /// Orders `moves` by a one-ply look-ahead: each move is applied to `state`, the result is
    /// evaluated for `color`, and the move is taken back.
    ///
    /// The maximizing side gets the highest evaluations first, the minimizing side the lowest.
    /// Returned scores are always the raw evaluations, not the sort keys.
    pub fn one_ply<S: GameState<Move = M>>(
        state: &mut S,
        moves: MoveList<M>,
        color: Color,
        maximizing: bool,
    ) -> Self {
        let mut picker = Self::new(moves, |mv| {
            state.make_move(mv);
            let score = Evaluator::new(state, color).eval();
            state.unmake_move(mv);

            if maximizing {
                score
            } else {
                -score
            }
        });
        picker.negated = !maximizing;

        picker
    }

    /// Number of moves not yet yielded.
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.moves.len() - self.current
    }
}

impl<M: GameMove> Iterator for MovePicker<M> {
    type Item = (M, Score);

    fn next(&mut self) -> Option<Self::Item> {
        // No more moves left
        if self.current >= self.moves.len() {
            return None;
        }

        // Find the index of the next best score; ties keep the earlier move
        let mut best_index = self.current;
        let mut best_score = self.scores[best_index];
        for i in (self.current + 1)..self.moves.len() {
            if self.scores[i] > best_score {
                best_index = i;
                best_score = self.scores[i];
            }
        }

        // Rotate rather than swap, so the moves that were skipped keep their relative order
        if best_index != self.current {
            self.moves[self.current..=best_index].rotate_right(1);
            self.scores[self.current..=best_index].rotate_right(1);
        }

        let mv = self.moves[self.current];
        let score = if self.negated {
            -self.scores[self.current]
        } else {
            self.scores[self.current]
        };

        self.current += 1;

        Some((mv, score))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Move, Position};

    #[test]
    fn test_picker_is_stable_on_ties() {
        let position = Position::default();
        let moves = position.legal_moves();
        let expected = moves.iter().copied().collect::<Vec<Move>>();

        // Every move scores the same, so generation order must be kept
        let picked = MovePicker::new(moves, |_| Score(7))
            .map(|(mv, _)| mv)
            .collect::<Vec<_>>();
        assert_eq!(picked, expected);
    }

    #[test]
    fn test_picker_orders_by_score() {
        let position = Position::default();
        let moves = position.legal_moves();

        let picked = MovePicker::new(moves, |mv| Score(mv.to().number() as i32))
            .map(|(_, score)| score.inner())
            .collect::<Vec<_>>();
        assert_eq!(picked, [30, 30, 29, 29, 28, 28, 27, 27, 26]);
    }

    #[test]
    fn test_one_ply_ordering() {
        let mut position = Position::default();
        let before = position;
        let moves = position.legal_moves();

        let max = MovePicker::one_ply(&mut position, moves.clone(), Color::White, true)
            .collect::<Vec<_>>();
        assert_eq!(position, before, "ordering must leave the position untouched");
        assert!(max.windows(2).all(|w| w[0].1 >= w[1].1));

        let min = MovePicker::one_ply(&mut position, moves, Color::White, false)
            .collect::<Vec<_>>();
        assert!(min.windows(2).all(|w| w[0].1 <= w[1].1));
        assert_eq!(position, before);
    }
}
