/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// FEN of the standard starting position.
pub const FEN_STARTPOS: &str = "W:W31-50:B1-20";

/// Positions searched by the `bench` command.
pub const BENCHMARK_FENS: [&str; 8] = [
    FEN_STARTPOS,
    "B:W31-50:B1-20",
    "W:W27,31-33,35-44,46-50:B1-13,15-19,24",
    "B:W28,32,33,34,37,38,42,43,44,47,48,49:B3,7,8,9,12,13,14,17,18,19,22,23",
    "W:W26,27,36,37,38,41,47:B4,9,14,15,19,20,24",
    "W:W33,34,K46:B12,13,18,K5",
    "B:W23,28,39,40:B6,11,16,17",
    "W:WK50,28:B23,2,3",
];

/// Search depth used by `go` when no other limit is given.
pub const DEFAULT_DEPTH: u8 = 6;

/// Seed of the Zobrist tables unless another one is requested.
pub const DEFAULT_SEED: u64 = 0x5DEE_CE66_D1CE_D00D;

/// Divisor for computing the soft timeout of a search from the remaining time.
macro_rules! soft_timeout_divisor {
    () => {
        20
    };
}
pub(crate) use soft_timeout_divisor;

/// Divisor for computing the hard timeout of a search from the remaining time.
macro_rules! hard_timeout_divisor {
    () => {
        5
    };
}
pub(crate) use hard_timeout_divisor;

/// Divisor for computing how much of the time increment to use.
macro_rules! time_inc_divisor {
    () => {
        2
    };
}
pub(crate) use time_inc_divisor;

/// Compile-time verbosity of a [`crate::Search`].
///
/// Each level is a zero-sized marker type, so disabled output costs nothing at runtime.
pub trait LogLevel {
    /// Print `info` lines and the final `bestmove`.
    const INFO: bool;

    /// Print `info string` diagnostics as well.
    const DEBUG: bool;
}

/// Print nothing.
pub struct LogNone;
impl LogLevel for LogNone {
    const INFO: bool = false;
    const DEBUG: bool = false;
}

/// Print search progress.
pub struct LogInfo;
impl LogLevel for LogInfo {
    const INFO: bool = true;
    const DEBUG: bool = false;
}

/// Print search progress and diagnostics.
pub struct LogDebug;
impl LogLevel for LogDebug {
    const INFO: bool = true;
    const DEBUG: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn test_benchmark_fens_parse() {
        for fen in BENCHMARK_FENS {
            let position = Position::from_fen(fen);
            assert!(position.is_ok(), "{fen:?}: {position:?}");
        }
    }

    #[test]
    fn test_startpos_is_default() {
        assert_eq!(Position::from_fen(FEN_STARTPOS).unwrap(), Position::default());
    }
}
