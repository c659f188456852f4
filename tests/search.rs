/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{thread, time::Duration};

use draughtsman::*;

/// Plain minimax without pruning or caching, scored for `color`.
fn minimax(position: &mut Position, depth: u8, color: Color, maximizing: bool) -> Score {
    if depth == 0 {
        return Evaluator::new(position, color).eval();
    }

    let moves = position.legal_moves();
    if moves.is_empty() {
        return if maximizing { Score::MIN } else { Score::MAX };
    }

    let mut best = if maximizing { Score::MIN } else { Score::MAX };
    for mv in moves {
        position.make_move(mv);
        let score = minimax(position, depth - 1, color, !maximizing);
        position.unmake_move(mv);

        best = if maximizing {
            best.max(score)
        } else {
            best.min(score)
        };
    }

    best
}

fn search(fen: &str, config: SearchConfig) -> SearchResult<Move> {
    let mut position = Position::from_fen(fen).unwrap();
    let before = position;

    let res = Player::default().search::<LogNone, _>(&mut position, config);
    assert_eq!(position, before, "search on {fen} must leave the position untouched");

    res
}

const MEN_ONLY_FENS: [&str; 4] = [
    FEN_STARTPOS,
    "W:W26,27,36,37,38,41,47:B4,9,14,15,19,20,24",
    "B:W28,32,33,34,37,38,42,43,44,47,48,49:B3,7,8,9,12,13,14,17,18,19,22,23",
    "W:W31,32,33,36,38,41:B10,12,15,17,20",
];

#[test]
fn test_search_is_deterministic() {
    for fen in MEN_ONLY_FENS {
        let a = search(fen, SearchConfig::with_depth(4));
        let b = search(fen, SearchConfig::with_depth(4));

        assert_eq!(a.bestmove, b.bestmove, "{fen}");
        assert_eq!(a.score, b.score, "{fen}");
        assert_eq!(a.nodes, b.nodes, "{fen}");
        assert_eq!(a.pv, b.pv, "{fen}");
    }
}

#[test]
fn test_alpha_beta_matches_minimax() {
    for fen in MEN_ONLY_FENS {
        let mut position = Position::from_fen(fen).unwrap();
        let color = position.side_to_move();
        let moves = position.legal_moves();

        for depth in 1..=4 {
            let res = search(fen, SearchConfig::with_depth(depth));

            // A forced move is scored without searching
            let expected = if moves.len() == 1 {
                Evaluator::new(&position.with_move_made(moves[0]), color).eval()
            } else {
                minimax(&mut position, depth, color, true)
            };

            assert_eq!(res.score, expected, "depth {depth} on {fen}");
            assert!(moves.contains(&res.bestmove.unwrap()));
        }
    }
}

/// Kings can reach one position at different plies, and a deeper table entry may then stand
/// in for a shallower search. That cannot happen before depth 5, so up to depth 4 the
/// result still equals minimax.
#[test]
fn test_alpha_beta_matches_minimax_with_kings() {
    for fen in ["W:WK46,K50:BK5,K1", "W:WK33:BK18", "B:WK33,28:BK18,12"] {
        let mut position = Position::from_fen(fen).unwrap();
        let color = position.side_to_move();
        let moves = position.legal_moves();

        for depth in 1..=4 {
            let res = search(fen, SearchConfig::with_depth(depth));

            let expected = if moves.len() == 1 {
                Evaluator::new(&position.with_move_made(moves[0]), color).eval()
            } else {
                minimax(&mut position, depth, color, true)
            };

            assert_eq!(res.score, expected, "depth {depth} on {fen}");
        }
    }
}

#[test]
fn test_node_allowance_keeps_previous_depth() {
    let fen = MEN_ONLY_FENS[1];
    let completed = search(fen, SearchConfig::with_depth(3));
    assert_eq!(completed.depth, 3);

    // Enough nodes to finish depth 3, and to enter the root of depth 4
    let config = SearchConfig {
        max_nodes: completed.nodes + 1,
        ..Default::default()
    };
    let cancelled = search(fen, config);

    assert_eq!(cancelled.depth, 3);
    assert_eq!(cancelled.bestmove, completed.bestmove);
    assert_eq!(cancelled.score, completed.score);
}

#[test]
fn test_stop_keeps_last_completed_depth() {
    let mut player = Player::default();
    let stop = player.stop_handle();

    let handle = thread::spawn(move || {
        let mut position = Position::default();
        player.search::<LogNone, _>(&mut position, SearchConfig::default())
    });

    thread::sleep(Duration::from_millis(100));
    stop.stop();

    let res = handle.join().unwrap();
    assert!(res.depth >= 1, "depth 1 should complete well within the delay");

    // The stopped search answers exactly like a search to its last completed depth
    let completed = search(FEN_STARTPOS, SearchConfig::with_depth(res.depth));
    assert_eq!(res.bestmove, completed.bestmove);
    assert_eq!(res.score, completed.score);
}

#[test]
fn test_single_legal_move() {
    let fen = "W:W28:B23,22,12";
    let position = Position::from_fen(fen).unwrap();
    let moves = position.legal_moves();
    assert_eq!(moves.len(), 1);

    let expected = Evaluator::new(&position.with_move_made(moves[0]), Color::White).eval();

    for depth in [1, 3, 6] {
        let res = search(fen, SearchConfig::with_depth(depth));
        assert_eq!(res.bestmove, Some(moves[0]));
        assert_eq!(res.score, expected);
    }
}

#[test]
fn test_table_hit_short_circuits() {
    let mut position = Position::default();
    let zobrist = Zobrist::new(DEFAULT_SEED);
    let mut ttable = TTable::new();

    // Pretend a deep search already happened here
    let stored = position.legal_moves()[4];
    ttable.store(TTableEntry::new(
        zobrist.fingerprint(&position),
        Some(stored),
        Score::new(42),
        SearchBounds::default(),
        10,
    ));

    let res = Search::<LogNone, _>::new(
        StopHandle::new(),
        SearchConfig::with_depth(3),
        &mut ttable,
        &zobrist,
    )
    .start(&mut position);

    assert_eq!(res.depth, 3);
    assert_eq!(res.bestmove, Some(stored));
    assert_eq!(res.score, Score::new(42));
    // One node per iteration, and nothing was ever ordered
    assert_eq!(res.nodes, 3);
    assert_eq!(res.orderings, 0);
}

#[test]
fn test_shallow_table_entry_is_ignored() {
    let mut position = Position::default();
    let zobrist = Zobrist::new(DEFAULT_SEED);
    let mut ttable = TTable::new();

    let stored = position.legal_moves()[4];
    ttable.store(TTableEntry::new(
        zobrist.fingerprint(&position),
        Some(stored),
        Score::new(42),
        SearchBounds::default(),
        1,
    ));

    let res = Search::<LogNone, _>::new(
        StopHandle::new(),
        SearchConfig::with_depth(2),
        &mut ttable,
        &zobrist,
    )
    .start(&mut position);

    // Depth 1 trusts the entry, depth 2 must search
    assert!(res.orderings > 0);
    assert_eq!(res.score, minimax(&mut position, 2, Color::White, true));
}

#[test]
fn test_runaway_beats_boxed_in_man() {
    let clear = Position::from_fen("W:W33:B1").unwrap();
    let boxed = Position::from_fen("W:W33:B1,23,28,29").unwrap();

    let clear = Evaluator::new(&clear, Color::White).evaluation();
    let boxed = Evaluator::new(&boxed, Color::White).evaluation();

    assert!(clear.runaways > boxed.runaways);
    assert_eq!(clear.runaways, 1);
    assert_eq!(boxed.runaways, 0);
}

#[test]
fn test_one_player_searches_both_colors() {
    let board = ":W26,27,36,37,38,41,47:B4,9,14,15,19,20,24";
    let mut white = Position::from_fen(&format!("W{board}")).unwrap();
    let mut black = Position::from_fen(&format!("B{board}")).unwrap();

    let expected = Player::default().search::<LogNone, _>(&mut black, SearchConfig::with_depth(4));

    let mut player = Player::default();
    player.search::<LogNone, _>(&mut white, SearchConfig::with_depth(4));
    let res = player.search::<LogNone, _>(&mut black, SearchConfig::with_depth(4));

    assert_eq!(res.bestmove, expected.bestmove);
    assert_eq!(res.score, expected.score);
    assert_eq!(res.nodes, expected.nodes);
    assert_eq!(res.pv, expected.pv);
    assert_eq!(player.last_score(), expected.score);
    assert!(res.orderings > 0);
}

#[test]
fn test_players_are_independent() {
    let mut a = Player::default();
    let mut b = Player::default();
    a.set_depth(3);
    b.set_depth(3);

    let mut position = Position::default();
    a.request_move(&mut position);
    assert!(a.ttable().num_entries() > 0);
    assert_eq!(b.ttable().num_entries(), 0);

    // A stop on one player does not touch the other
    a.request_stop();
    let mv = b.request_move(&mut position);
    assert!(mv.is_some());
    assert!(b.ttable().num_entries() > 0);
}
