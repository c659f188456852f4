/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use anyhow::{bail, Result};
use clap::Parser;

use crate::{Piece, Square};

/// A command to be sent to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<ENGINE COMMAND>")
)]
pub enum EngineCommand {
    /// Run a benchmark with the provided parameters.
    Bench {
        /// If set, the benchmarking results will be printed in a well-formatted table.
        #[arg(short, long, default_value = "false")]
        pretty: bool,

        /// Override the default benchmark depth.
        #[arg(short, long, required = false)]
        depth: Option<u8>,
    },

    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Print an evaluation of the current position, from the side to move's perspective.
    Eval {
        /// If set, the value of every piece and each evaluation term will be printed.
        #[arg(short, long, default_value = "false")]
        pretty: bool,
    },

    /// Quit the engine.
    #[command(alias = "quit")]
    Exit {
        /// If set, the engine will await the completion of any search threads before exiting.
        #[arg(short, long, default_value = "false")]
        cleanup: bool,
    },

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Flips the side-to-move. Equivalent to passing a turn.
    Flip,

    /// Search the current position on a separate thread.
    ///
    /// Without any limit, the search runs to the engine's configured depth.
    Go {
        /// Maximum depth to search.
        #[arg(short, long)]
        depth: Option<u8>,

        /// Maximum number of nodes to search.
        #[arg(short, long)]
        nodes: Option<u64>,

        /// Search for exactly this many milliseconds.
        #[arg(short, long)]
        movetime: Option<u64>,

        /// Milliseconds remaining on the clock of the side to move.
        #[arg(short, long)]
        time: Option<u64>,

        /// Increment in milliseconds per move.
        #[arg(short, long)]
        inc: Option<u64>,

        /// Search until stopped.
        #[arg(long, default_value = "false")]
        infinite: bool,
    },

    /// Display information about the current hash table.
    #[command(aliases = ["tt", "ttable"])]
    HashInfo,

    /// Apply the provided move to the game, if it is legal.
    #[command(alias = "move")]
    MakeMove { mv_string: String },

    /// Shows all legal moves in the current position, or for a specific piece.
    Moves {
        square: Option<Square>,

        /// If set, moves will be sorted by their notation.
        ///
        /// By default, moves are listed in generation order.
        #[arg(short, long, default_value = "false")]
        sort: bool,
    },

    /// Start a new game from the initial position, clearing the hash table.
    #[command(alias = "ucinewgame")]
    NewGame,

    /// Display the current value of the specified option.
    Option { name: String },

    /// Performs a perft on the current position at the supplied depth, printing total node count.
    Perft { depth: usize },

    /// Place a piece on the provided square.
    Place { piece: Piece, square: Square },

    /// Set the current position: `position [startpos | fen <FEN>] [moves <MOVE>...]`.
    Position {
        #[arg(
            required = true,
            num_args = 1..,
            trailing_var_arg = true,
            allow_hyphen_values = true
        )]
        args: Vec<String>,
    },

    /// Set the option `name` to `value`.
    SetOption { name: String, value: String },

    /// Performs a split perft on the current position at the supplied depth.
    #[command(alias = "sperft")]
    Splitperft { depth: usize },

    /// Stop the current search, if one is running.
    Stop,

    /// Remove the piece at the provided square.
    Take { square: Square },

    /// Await the current search, blocking until it completes.
    ///
    /// This is primarily used when executing searches on startup,
    /// to await their results before doing something else.
    Wait,
}

impl FromStr for EngineCommand {
    type Err = clap::Error;
    /// Attempt to parse an [`EngineCommand`] from a line of input.
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_parse_from(s.split_ascii_whitespace())
    }
}

/// Arguments of the `position` command, split into a FEN and a list of moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionArgs {
    /// `None` means the starting position.
    pub fen: Option<String>,
    pub moves: Vec<String>,
}

impl PositionArgs {
    /// Splits `startpos | fen <FEN> [moves ...]` into its parts.
    pub fn parse<T: AsRef<str>>(args: &[T]) -> Result<Self> {
        let mut args = args.iter().map(AsRef::as_ref);

        let fen = match args.next() {
            Some("startpos") => None,
            Some("fen") => {
                let Some(fen) = args.next() else {
                    bail!("usage: position fen <FEN> [moves <MOVE>...]");
                };
                Some(fen.to_string())
            }
            Some(other) => bail!("expected `startpos` or `fen`. got {other:?}"),
            None => bail!("usage: position [startpos | fen <FEN>] [moves <MOVE>...]"),
        };

        let moves = match args.next() {
            Some("moves") => args.map(String::from).collect(),
            Some(other) => bail!("expected `moves`. got {other:?}"),
            None => Vec::new(),
        };

        Ok(Self { fen, moves })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!("d".parse::<EngineCommand>().unwrap(), EngineCommand::Display);
        assert_eq!("quit".parse::<EngineCommand>().unwrap(), EngineCommand::Exit { cleanup: false });
        assert_eq!(
            "go --depth 4".parse::<EngineCommand>().unwrap(),
            EngineCommand::Go {
                depth: Some(4),
                nodes: None,
                movetime: None,
                time: None,
                inc: None,
                infinite: false,
            }
        );
        assert_eq!(
            "perft 3".parse::<EngineCommand>().unwrap(),
            EngineCommand::Perft { depth: 3 }
        );
        assert!("castle".parse::<EngineCommand>().is_err());
    }

    #[test]
    fn test_parse_position() {
        let EngineCommand::Position { args } = "position startpos moves 32-28 19-23"
            .parse::<EngineCommand>()
            .unwrap()
        else {
            panic!("expected a position command");
        };

        let args = PositionArgs::parse(&args).unwrap();
        assert_eq!(args.fen, None);
        assert_eq!(args.moves, ["32-28", "19-23"]);

        let args = PositionArgs::parse(&["fen", "W:W28:B23"]).unwrap();
        assert_eq!(args.fen.as_deref(), Some("W:W28:B23"));
        assert!(args.moves.is_empty());

        assert!(PositionArgs::parse(&["fen"]).is_err());
        assert!(PositionArgs::parse(&["startpos", "32-28"]).is_err());
        assert!(PositionArgs::parse::<&str>(&[]).is_err());
    }
}
