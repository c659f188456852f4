/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{
    Color, GameMove, GameState, LogLevel, LogNone, Score, Search, SearchConfig, SearchResult,
    StopHandle, TTable, Zobrist, DEFAULT_DEPTH, DEFAULT_SEED,
};

/// One engine seat at the board.
///
/// A player owns everything that outlives a single search: the transposition table,
/// the Zobrist tables and the stop flag. Two players never share any of it.
///
/// Table scores are stored from the searching side's perspective, so the table is
/// emptied whenever the player starts searching for the other color.
#[derive(Debug)]
pub struct Player<M> {
    ttable: TTable<M>,
    zobrist: Zobrist,
    stop: StopHandle,
    last_score: Score,
    depth: u8,
    color: Option<Color>,
}

impl<M: GameMove> Player<M> {
    /// Creates a player whose Zobrist tables are drawn from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            ttable: TTable::new(),
            zobrist: Zobrist::new(seed),
            stop: StopHandle::new(),
            last_score: Score::DRAW,
            depth: DEFAULT_DEPTH,
            color: None,
        }
    }

    /// Depth searched by [`Self::request_move`].
    #[inline(always)]
    pub const fn depth(&self) -> u8 {
        self.depth
    }

    #[inline(always)]
    pub fn set_depth(&mut self, depth: u8) {
        self.depth = depth.max(1);
    }

    #[inline(always)]
    pub const fn seed(&self) -> u64 {
        self.zobrist.seed()
    }

    /// Picks a move for the side to move in `state`.
    ///
    /// Returns `None` only if there are no legal moves. If the search is stopped before any depth
    /// completes, a legal move is still returned.
    pub fn request_move<S: GameState<Move = M>>(&mut self, state: &mut S) -> Option<M> {
        let config = SearchConfig::with_depth(self.depth);
        self.search::<LogNone, S>(state, config).bestmove
    }

    /// Runs a search on `state` under `config`, printing output according to `Log`.
    pub fn search<Log: LogLevel, S: GameState<Move = M>>(
        &mut self,
        state: &mut S,
        config: SearchConfig,
    ) -> SearchResult<M> {
        let color = state.side_to_move();
        if self.color.replace(color).is_some_and(|prev| prev != color) {
            self.ttable.clear();
        }

        let res = Search::<Log, S>::new(self.stop.clone(), config, &mut self.ttable, &self.zobrist)
            .start(state);

        self.last_score = res.score;
        res
    }

    /// Score of the most recent search, from the perspective of the side that searched.
    #[inline(always)]
    pub const fn last_score(&self) -> Score {
        self.last_score
    }

    /// Cancels the running search, or the next one if none is running.
    #[inline(always)]
    pub fn request_stop(&self) {
        self.stop.stop();
    }

    /// A handle that can stop this player's searches from another thread.
    #[inline(always)]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Forgets everything learned so far, ready for a new game.
    pub fn new_game(&mut self) {
        self.ttable.clear();
        self.last_score = Score::DRAW;
        self.color = None;
        // A stop aimed at a search that already finished must not leak into the new game
        self.stop.take();
    }

    #[inline(always)]
    pub fn ttable(&self) -> &TTable<M> {
        &self.ttable
    }

    #[inline(always)]
    pub fn zobrist(&self) -> &Zobrist {
        &self.zobrist
    }
}

impl<M: GameMove> Default for Player<M> {
    #[inline(always)]
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    #[test]
    fn test_request_move_is_legal() {
        let mut player = Player::default();
        player.set_depth(3);

        let mut position = Position::default();
        let mv = player.request_move(&mut position).unwrap();
        assert!(position.legal_moves().contains(&mv));
        assert_eq!(position, Position::default());
        assert!(player.ttable().num_entries() > 0);
    }

    #[test]
    fn test_request_move_without_moves() {
        let mut player = Player::default();
        // White is blocked in the corner
        let mut position = Position::from_fen("W:W46:B41,37").unwrap();
        assert_eq!(player.request_move(&mut position), None);
    }

    #[test]
    fn test_stop_before_search_still_moves() {
        let mut player = Player::default();
        player.request_stop();

        let mut position = Position::default();
        let mv = player.request_move(&mut position);
        assert_eq!(mv, position.legal_moves().first().copied());
    }

    #[test]
    fn test_new_game_clears_table() {
        let mut player = Player::default();
        player.set_depth(2);

        let mut position = Position::default();
        player.request_move(&mut position);
        assert!(player.ttable().num_entries() > 0);

        player.new_game();
        assert_eq!(player.ttable().num_entries(), 0);
        assert_eq!(player.last_score(), Score::DRAW);
    }

    #[test]
    fn test_other_color_clears_table() {
        let mut player = Player::default();
        player.set_depth(2);

        let mut white = Position::from_fen("W:W31-50:B1-20").unwrap();
        player.request_move(&mut white);
        let entries = player.ttable().num_entries();
        assert!(entries > 0);

        // Same color again keeps what was learned
        player.request_move(&mut white);
        assert_eq!(player.ttable().num_entries(), entries);

        let mut black = Position::from_fen("B:W31-50:B1-20").unwrap();
        player.request_move(&mut black);
        let mut fresh = Player::default();
        fresh.set_depth(2);
        fresh.request_move(&mut black);
        assert_eq!(player.ttable().num_entries(), fresh.ttable().num_entries());
    }

    #[test]
    fn test_last_score_matches_result() {
        let mut player = Player::default();
        let mut position = Position::default();

        let res = player.search::<LogNone, _>(&mut position, SearchConfig::with_depth(2));
        assert_eq!(player.last_score(), res.score);
        assert_eq!(player.seed(), DEFAULT_SEED);
    }
}
