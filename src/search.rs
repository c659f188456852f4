/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use anyhow::{bail, Result};

use crate::{
    utils, Color, Evaluator, Fingerprint, GameState, LogLevel, MovePicker, Score, TTable,
    TTableEntry, Zobrist,
};

/// Maximum depth that can be searched
pub const MAX_DEPTH: u8 = u8::MAX / 2;

/// Bounds within an alpha-beta search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    /// Lower bound.
    ///
    /// The maximizing side is guaranteed a score that is AT LEAST `alpha`.
    pub alpha: Score,

    /// Upper bound.
    ///
    /// The minimizing side is guaranteed a score that is AT MOST `beta`.
    pub beta: Score,
}

impl SearchBounds {
    /// Create a new [`SearchBounds`] from the provided `alpha` and `beta` values.
    #[inline(always)]
    pub const fn new(alpha: Score, beta: Score) -> Self {
        Self { alpha, beta }
    }

    /// Returns `true` if the window has closed, meaning the rest of the node can be pruned.
    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        self.alpha >= self.beta
    }
}

impl Default for SearchBounds {
    /// Default [`SearchBounds`] are `(Score::MIN, Score::MAX)`.
    #[inline(always)]
    fn default() -> Self {
        Self::new(Score::MIN, Score::MAX)
    }
}

/// A cloneable handle that cancels the search it belongs to.
///
/// Firing the handle sets a flag that the search consumes at its next node, so one request
/// cancels exactly one running search.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// A handle with no stop requested.
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that the running search stops as soon as possible.
    #[inline(always)]
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` if a stop has been requested and not yet consumed.
    #[inline(always)]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Consumes a pending stop request, returning whether there was one.
    #[inline(always)]
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

/// The result of a search, containing the best move found, score, and total nodes searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult<M> {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Number of times a node's moves were ordered.
    pub orderings: u64,

    /// Best move found during the search.
    pub bestmove: Option<M>,

    /// Score of `bestmove`, from the perspective of the side to move at the root.
    pub score: Score,

    /// The depth of the deepest completed iteration.
    ///
    /// Zero if no iteration completed.
    pub depth: u8,

    /// Principal variation of the deepest completed iteration.
    pub pv: Vec<M>,
}

impl<M> Default for SearchResult<M> {
    /// A default search result initializes to a *very bad* value, since there isn't a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            orderings: 0,
            bestmove: None,
            score: Score::MIN,
            depth: 0,
            pv: Vec::new(),
        }
    }
}

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Maximum depth to execute the search.
    pub max_depth: u8,

    /// Node allowance.
    ///
    /// If the search exceeds this many nodes, it will exit as quickly as possible.
    pub max_nodes: u64,

    /// Start time of the search.
    pub starttime: Instant,

    /// Soft limit on search time.
    ///
    /// During iterative deepening, if an iteration concludes and this timeout is exceeded,
    /// no deeper iteration is started.
    pub soft_timeout: Duration,

    /// Hard limit on search time.
    ///
    /// During *any* point in the search, if this limit is exceeded, the search will cancel.
    pub hard_timeout: Duration,
}

impl SearchConfig {
    /// Constructs a [`SearchConfig`] from the limits of a `go` command.
    ///
    /// `movetime` fixes both timeouts. Otherwise, if the remaining `time` of the side to move
    /// is known, the timeouts are a fraction of it plus part of the increment.
    pub fn from_go(
        depth: Option<u8>,
        nodes: Option<u64>,
        movetime: Option<Duration>,
        time: Option<Duration>,
        inc: Option<Duration>,
    ) -> Self {
        let mut config = Self::default();

        if let Some(depth) = depth {
            config.max_depth = depth.min(MAX_DEPTH);
        }

        if let Some(nodes) = nodes {
            config.max_nodes = nodes;
        }

        if let Some(movetime) = movetime {
            config.soft_timeout = movetime;
            config.hard_timeout = movetime;
        } else if let Some(time) = time {
            let inc = inc.unwrap_or(Duration::ZERO) / utils::time_inc_divisor!();

            config.soft_timeout = time / utils::soft_timeout_divisor!() + inc;
            config.hard_timeout = time / utils::hard_timeout_divisor!() + inc;
        }

        config
    }

    /// A config that only limits the depth.
    #[inline(always)]
    pub fn with_depth(depth: u8) -> Self {
        Self {
            max_depth: depth.min(MAX_DEPTH),
            ..Default::default()
        }
    }
}

impl Default for SearchConfig {
    /// A default [`SearchConfig`] will permit an "infinite" search.
    ///
    /// The word "infinite" is quoted here because the actual defaults are the `::MAX` values for each field.
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_nodes: u64::MAX,
            starttime: Instant::now(),
            soft_timeout: Duration::MAX,
            hard_timeout: Duration::MAX,
        }
    }
}

/// Executes an alpha-beta search on a [`GameState`].
///
/// The side to move at the root maximizes, its opponent minimizes, and every score is given
/// from the root side's perspective.
pub struct Search<'a, Log, S: GameState> {
    /// Number of nodes searched.
    nodes: u64,

    /// Number of move orderings performed.
    orderings: u64,

    /// Consumed at every node; a pending request cancels the search.
    stop: StopHandle,

    /// Configuration variables for this instance of the search.
    config: SearchConfig,

    /// Color the evaluator scores for. Set when the search starts.
    color: Color,

    /// Transposition table used to cache information during search.
    ttable: &'a mut TTable<S::Move>,

    /// Random tables used to fingerprint positions for `ttable`.
    zobrist: &'a Zobrist,

    /// Marker for the level of logging to print.
    log: PhantomData<&'a Log>,
}

impl<'a, Log: LogLevel, S: GameState> Search<'a, Log, S> {
    /// Construct a new [`Search`] instance to execute.
    #[inline(always)]
    pub fn new(
        stop: StopHandle,
        config: SearchConfig,
        ttable: &'a mut TTable<S::Move>,
        zobrist: &'a Zobrist,
    ) -> Self {
        Self {
            nodes: 0,
            orderings: 0,
            stop,
            config,
            color: Color::White,
            ttable,
            zobrist,
            log: PhantomData,
        }
    }

    /// Start the search on `state`, returning a [`SearchResult`].
    ///
    /// This is the entrypoint of the search. It prints diagnostics before starting iterative deepening,
    /// and concludes by sending the `bestmove` message.
    ///
    /// `state` is borrowed mutably for make/unmake, and is left exactly as it was given.
    pub fn start(mut self, state: &mut S) -> SearchResult<S::Move> {
        self.color = state.side_to_move();

        if Log::DEBUG {
            self.send_string(format!("Starting search for {}", self.color.name()));

            let soft = self.config.soft_timeout.as_millis();
            let hard = self.config.hard_timeout.as_millis();
            let nodes = self.config.max_nodes;
            let depth = self.config.max_depth;

            if soft < Duration::MAX.as_millis() {
                self.send_string(format!("Soft timeout := {soft}ms"));
            }
            if hard < Duration::MAX.as_millis() {
                self.send_string(format!("Hard timeout := {hard}ms"));
            }
            if nodes < u64::MAX {
                self.send_string(format!("Max nodes := {nodes} nodes"));
            }
            if depth < MAX_DEPTH {
                self.send_string(format!("Max depth := {depth}"));
            }
        }

        let res = self.iterative_deepening(state);

        if Log::DEBUG {
            let hits = self.ttable.hits();
            let accesses = self.ttable.accesses();
            let hit_rate = self.ttable.hit_rate();
            let collisions = self.ttable.collisions();
            let entries = self.ttable.num_entries();
            self.send_string(format!("TT stats: {hits} hits / {accesses} accesses ({hit_rate:.2}% hit rate), {collisions} collisions, {entries} entries"));

            if let Some(entry) = self.ttable.get(&self.zobrist.fingerprint(state)) {
                let (depth, score, bound) = (entry.depth, entry.score, entry.node_type.name());
                self.send_string(format!("Root entry: depth {depth}, score {score} ({bound})"));
            }
        }

        if Log::INFO {
            match res.bestmove {
                Some(mv) => println!("bestmove {mv}"),
                None => println!("bestmove (none)"),
            }
        }

        res
    }

    /// Sends info about a completed iteration to `stdout`.
    #[inline(always)]
    fn send_iteration_info(&self, result: &SearchResult<S::Move>) {
        let elapsed = self.config.starttime.elapsed();
        let nps = (self.nodes as f32 / elapsed.as_secs_f32()).trunc();
        let pv = result
            .pv
            .iter()
            .map(|mv| mv.to_string())
            .collect::<Vec<_>>()
            .join(" ");

        println!(
            "info depth {} score {} nodes {} nps {nps} time {} pv {pv}",
            result.depth,
            result.score,
            self.nodes,
            elapsed.as_millis(),
        );
    }

    /// Helper to send an `info string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(&self, string: T) {
        println!("info string {string}");
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening) (ID) on `state`.
    ///
    /// Each iteration searches the root with the full window, one ply deeper than the last.
    /// After each iteration, we check if we've exceeded our `soft_timeout` and, if we haven't, we run a search at a greater depth.
    /// A cancelled iteration is thrown away entirely.
    fn iterative_deepening(&mut self, state: &mut S) -> SearchResult<S::Move> {
        let moves = state.legal_moves();
        let mut result = SearchResult::default();

        // Nothing to search
        if moves.is_empty() {
            return result;
        }

        // A forced move needs no search; score the position it leads to.
        if moves.len() == 1 {
            let mv = moves[0];
            state.make_move(mv);
            result.score = Evaluator::new(state, self.color).eval();
            state.unmake_move(mv);

            self.nodes += 1;
            result.bestmove = Some(mv);
            result.depth = 1;
            result.pv.push(mv);
            result.nodes = self.nodes;

            if Log::INFO {
                self.send_iteration_info(&result);
            }

            return result;
        }

        let mut depth = 1;
        while depth <= self.config.max_depth
            && self.config.starttime.elapsed() < self.config.soft_timeout
        {
            let mut bestmove = None;

            let score = match self.search_max(state, SearchBounds::default(), depth, &mut bestmove)
            {
                Ok(score) => score,
                Err(e) => {
                    if Log::DEBUG {
                        self.send_string(format!("Search cancelled during depth {depth}: {e}"));

                        match result.bestmove {
                            Some(mv) => self.send_string(format!(
                                "Falling back to result from depth {}: {mv} with score {}",
                                result.depth, result.score
                            )),
                            None => self.send_string("No depth completed"),
                        }
                    }
                    break;
                }
            };

            result.score = score;
            result.depth = depth;
            // A table hit at the root may hand back a move from a different side to move,
            // and if every root move loses no move raised alpha
            result.bestmove = bestmove
                .filter(|mv| moves.contains(mv))
                .or(result.bestmove)
                .or(moves.first().copied());
            result.pv = self.principal_variation(state, result.bestmove, depth);
            result.nodes = self.nodes;
            result.orderings = self.orderings;

            if Log::INFO {
                self.send_iteration_info(&result);
            }

            depth += 1;
        }

        // Nothing completed, so play the first legal move
        if result.bestmove.is_none() {
            result.bestmove = moves.first().copied();
        }

        result.nodes = self.nodes;
        result.orderings = self.orderings;
        result
    }

    /// Follows the best moves stored in the transposition table from the root, starting with `bestmove`.
    fn principal_variation(
        &self,
        state: &mut S,
        bestmove: Option<S::Move>,
        depth: u8,
    ) -> Vec<S::Move> {
        let mut pv = Vec::with_capacity(depth as usize);

        let mut next = bestmove;
        while let Some(mv) = next {
            // Stored moves may come from a colliding position
            if pv.len() >= depth as usize || !state.legal_moves().contains(&mv) {
                break;
            }

            state.make_move(mv);
            pv.push(mv);

            next = self
                .ttable
                .get(&self.zobrist.fingerprint(state))
                .and_then(|entry| entry.bestmove);
        }

        for &mv in pv.iter().rev() {
            state.unmake_move(mv);
        }

        pv
    }

    /// Returns an error if the search must stop.
    ///
    /// A pending stop request is consumed here.
    #[inline(always)]
    fn search_cancelled(&self) -> Result<()> {
        // Condition 1: The search was stopped by an external factor, like the `stop` command
        if self.stop.take() {
            bail!("cancelled by external command");
        }

        // Condition 2: We've exceeded the hard limit of our allotted search time
        if self.config.starttime.elapsed() >= self.config.hard_timeout {
            let ms = self.config.hard_timeout.as_millis();
            bail!("exceeded hard timeout of {ms}ms");
        }

        // Condition 3: We've exceeded the maximum amount of nodes we're allowed to search
        if self.nodes >= self.config.max_nodes {
            let nodes = self.config.max_nodes;
            bail!("exceeded node allowance of {nodes} nodes");
        }

        Ok(())
    }

    /// Looks `fingerprint` up in the transposition table.
    ///
    /// A hit is usable if it was searched at least `depth` plies deep and its bound applies to `bounds`.
    /// On a usable hit, the stored move is written into `best`.
    #[inline(always)]
    fn probe_tt(
        &mut self,
        fingerprint: &Fingerprint,
        depth: u8,
        bounds: SearchBounds,
        best: &mut Option<S::Move>,
    ) -> Option<Score> {
        let entry = self.ttable.probe(fingerprint)?;

        if entry.depth < depth {
            return None;
        }

        let score = entry.try_score(bounds)?;
        *best = entry.bestmove;
        Some(score)
    }

    /// Searches a node where the root side is to move.
    ///
    /// Fail-hard: the returned score always lies within `bounds`.
    /// The move that raised alpha is written into `best`.
    fn search_max(
        &mut self,
        state: &mut S,
        mut bounds: SearchBounds,
        depth: u8,
        best: &mut Option<S::Move>,
    ) -> Result<Score> {
        self.search_cancelled()?;
        self.nodes += 1;

        if depth == 0 {
            return Ok(Evaluator::new(state, self.color).eval());
        }

        let fingerprint = self.zobrist.fingerprint(state);
        if let Some(score) = self.probe_tt(&fingerprint, depth, bounds, best) {
            return Ok(score);
        }

        let original = bounds;
        let moves = state.legal_moves();
        self.orderings += 1;
        let picker = MovePicker::one_ply(state, moves, self.color, true);

        let mut bestmove = None;
        for (mv, _) in picker {
            state.make_move(mv);
            let score = self.search_min(state, bounds, depth - 1, &mut None);
            state.unmake_move(mv);
            let score = score?;

            if score > bounds.alpha {
                bounds.alpha = score;
                bestmove = Some(mv);
            }

            // Fail high
            if bounds.is_closed() {
                *best = bestmove;
                self.ttable.store(TTableEntry::new(
                    fingerprint,
                    bestmove,
                    bounds.beta,
                    original,
                    depth,
                ));
                return Ok(bounds.beta);
            }
        }

        *best = bestmove;
        self.ttable.store(TTableEntry::new(
            fingerprint,
            bestmove,
            bounds.alpha,
            original,
            depth,
        ));

        Ok(bounds.alpha)
    }

    /// Searches a node where the root side's opponent is to move.
    ///
    /// Mirror image of [`Self::search_max`]: lowers beta, and fails low with alpha.
    fn search_min(
        &mut self,
        state: &mut S,
        mut bounds: SearchBounds,
        depth: u8,
        best: &mut Option<S::Move>,
    ) -> Result<Score> {
        self.search_cancelled()?;
        self.nodes += 1;

        if depth == 0 {
            return Ok(Evaluator::new(state, self.color).eval());
        }

        let fingerprint = self.zobrist.fingerprint(state);
        if let Some(score) = self.probe_tt(&fingerprint, depth, bounds, best) {
            return Ok(score);
        }

        let original = bounds;
        let moves = state.legal_moves();
        self.orderings += 1;
        let picker = MovePicker::one_ply(state, moves, self.color, false);

        let mut bestmove = None;
        for (mv, _) in picker {
            state.make_move(mv);
            let score = self.search_max(state, bounds, depth - 1, &mut None);
            state.unmake_move(mv);
            let score = score?;

            if score < bounds.beta {
                bounds.beta = score;
                bestmove = Some(mv);
            }

            // Fail low
            if bounds.is_closed() {
                *best = bestmove;
                self.ttable.store(TTableEntry::new(
                    fingerprint,
                    bestmove,
                    bounds.alpha,
                    original,
                    depth,
                ));
                return Ok(bounds.alpha);
            }
        }

        *best = bestmove;
        self.ttable.store(TTableEntry::new(
            fingerprint,
            bestmove,
            bounds.beta,
            original,
            depth,
        ));

        Ok(bounds.beta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn run_search(fen: &str, config: SearchConfig) -> SearchResult<Move> {
        let mut position = Position::from_fen(fen).unwrap();
        let before = position;

        let mut ttable = TTable::new();
        let zobrist = Zobrist::new(DEFAULT_SEED);
        let res = Search::<LogNone, _>::new(StopHandle::new(), config, &mut ttable, &zobrist)
            .start(&mut position);

        assert_eq!(position, before, "search must leave the position untouched");
        res
    }

    #[test]
    fn test_no_moves() {
        // White is blocked in the corner
        let res = run_search("W:W46:B41,37", SearchConfig::with_depth(3));
        assert!(res.bestmove.is_none());
        assert_eq!(res.depth, 0);
    }

    #[test]
    fn test_forced_capture() {
        let res = run_search("W:W28:B23,22,12", SearchConfig::with_depth(4));
        assert_eq!(res.bestmove.unwrap().to_string(), "28x8");
        assert_eq!(res.pv.len(), 1);
    }

    #[test]
    fn test_search_completes_requested_depth() {
        let res = run_search(FEN_STARTPOS, SearchConfig::with_depth(4));
        assert_eq!(res.depth, 4);
        assert!(res.bestmove.is_some());
        assert!(res.nodes > 0);
        assert!(res.orderings > 0);
        assert!(!res.pv.is_empty() && res.pv.len() <= 4);
        assert_eq!(res.pv[0], res.bestmove.unwrap());
    }

    #[test]
    fn test_node_allowance_falls_back() {
        let config = SearchConfig {
            max_nodes: 1,
            ..Default::default()
        };

        // The first node uses up the allowance, so no depth completes
        let res = run_search(FEN_STARTPOS, config);
        assert_eq!(res.depth, 0);
        assert_eq!(res.bestmove.unwrap().to_string(), "31-26");
    }

    #[test]
    fn test_stop_handle_is_consumed() {
        let stop = StopHandle::new();
        let clone = stop.clone();
        assert!(!stop.is_requested());

        clone.stop();
        assert!(stop.is_requested());
        assert!(stop.take());
        assert!(!stop.take());
        assert!(!clone.is_requested());
    }

    #[test]
    fn test_pending_stop_cancels_one_search() {
        let mut position = Position::default();
        let mut ttable = TTable::new();
        let zobrist = Zobrist::new(DEFAULT_SEED);
        let stop = StopHandle::new();
        stop.stop();

        let config = SearchConfig::with_depth(2);
        let res = Search::<LogNone, _>::new(stop.clone(), config, &mut ttable, &zobrist)
            .start(&mut position);
        assert_eq!(res.depth, 0);
        assert_eq!(res.bestmove, position.legal_moves().first().copied());

        // The request was used up by the first search
        let res = Search::<LogNone, _>::new(stop, config, &mut ttable, &zobrist)
            .start(&mut position);
        assert_eq!(res.depth, 2);
    }

    #[test]
    fn test_config_from_go() {
        let ms = Duration::from_millis;

        let config = SearchConfig::from_go(Some(3), Some(1000), Some(ms(500)), Some(ms(60_000)), None);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.max_nodes, 1000);
        assert_eq!(config.soft_timeout, ms(500));
        assert_eq!(config.hard_timeout, ms(500));

        let config = SearchConfig::from_go(None, None, None, Some(ms(60_000)), Some(ms(1000)));
        assert_eq!(config.max_depth, MAX_DEPTH);
        assert_eq!(config.soft_timeout, ms(3_500));
        assert_eq!(config.hard_timeout, ms(12_500));

        let config = SearchConfig::from_go(None, None, None, None, Some(ms(1000)));
        assert_eq!(config.soft_timeout, Duration::MAX);
        assert_eq!(config.hard_timeout, Duration::MAX);
    }

    #[test]
    fn test_bounds() {
        let bounds = SearchBounds::default();
        assert_eq!(bounds.alpha, Score::MIN);
        assert_eq!(bounds.beta, Score::MAX);
        assert!(!bounds.is_closed());
        assert!(SearchBounds::new(Score::new(3), Score::new(3)).is_closed());
    }
}
