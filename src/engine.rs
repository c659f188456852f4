/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex, MutexGuard, TryLockError,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};

use crate::{
    perft, splitperft, EngineCommand, Evaluator, LogDebug, LogInfo, LogLevel, LogNone, Move,
    Player, Position, PositionArgs, SearchConfig, SearchResult, Square, StopHandle,
    BENCHMARK_FENS, DEFAULT_SEED, MAX_DEPTH,
};

/// Default depth at which to run the benchmark searches.
const BENCH_DEPTH: u8 = 6;

/// The draughtsman engine.
#[derive(Debug)]
pub struct Engine {
    /// The current state of the board, as known to the engine.
    ///
    /// This is modified whenever moves are played or new positions are given,
    /// and is reset whenever the engine is told to start a new game.
    position: Position,

    /// One half of a channel, responsible for sending commands to the engine to execute.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands for the engine to execute.
    receiver: Receiver<EngineCommand>,

    /// The searching player. Locked by the search thread for as long as a search runs.
    player: Arc<Mutex<Player<Move>>>,

    /// Stops the search of `player`.
    stop: StopHandle,

    /// Atomic flag to determine whether a search is currently running
    is_searching: Arc<AtomicBool>,

    /// Handle to the currently-running search thread, if one exists.
    search_thread: Option<JoinHandle<SearchResult<Move>>>,

    /// Whether to display extra information during execution.
    debug: bool,
}

impl Engine {
    /// Constructs a new [`Engine`] instance to be executed with [`Engine::run`].
    pub fn new() -> Self {
        // Construct a channel for communication
        let (sender, receiver) = channel();
        let player = Player::new(DEFAULT_SEED);
        let stop = player.stop_handle();

        Self {
            position: Position::default(),
            sender,
            receiver,
            player: Arc::new(Mutex::new(player)),
            stop,
            is_searching: Arc::default(),
            search_thread: None,
            debug: false,
        }
    }

    /// Returns a string of the engine's name and current version.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Returns a string of all authors of this engine.
    #[inline(always)]
    pub fn authors(&self) -> String {
        // Split multiple authors by comma-space
        env!("CARGO_PKG_AUTHORS").replace(':', ", ").to_string()
    }

    /// Sends an [`EngineCommand`] to the engine to be executed.
    #[inline(always)]
    pub fn send_command(&self, command: EngineCommand) -> Result<()> {
        self.sender
            .send(command)
            .context("Failed to send a command to the engine")
    }

    /// Entrypoint of the engine.
    ///
    /// This function first spawns a new thread that handles user input from `stdin`.
    /// It then loops on commands received by the engine, executing them in the order received.
    /// A command that fails prints its error and the loop carries on.
    pub fn run(&mut self) -> Result<()> {
        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                eprintln!("Input handler thread stopping after fatal error: {err:#}");
            }
        });

        // Execute commands as they are received
        while let Ok(cmd) = self.receiver.recv() {
            if self.debug {
                Self::send_string(format!("Received command {cmd:?}"));
            }

            // Exit the loop so the engine can quit
            if let EngineCommand::Exit { cleanup } = cmd {
                // If requested, await the completion of any ongoing search threads
                if cleanup {
                    self.stop_search();
                }
                break;
            }

            if let Err(e) = self.handle_command(cmd) {
                eprintln!("Error: {e:#}");
            }
        }

        Ok(())
    }

    /// Handle the execution of a single [`EngineCommand`].
    fn handle_command(&mut self, cmd: EngineCommand) -> Result<()> {
        match cmd {
            EngineCommand::Bench { depth, pretty } => self.bench(depth, pretty)?,

            EngineCommand::Display => println!("{:?}", self.position),

            EngineCommand::Eval { pretty } => self.eval(pretty),

            // Handled by the event loop
            EngineCommand::Exit { .. } => {}

            EngineCommand::Fen => println!("{}", self.position.to_fen()),

            EngineCommand::Flip => self.position.toggle_side_to_move(),

            EngineCommand::Go {
                depth,
                nodes,
                movetime,
                time,
                inc,
                infinite,
            } => {
                let config = if infinite {
                    SearchConfig::default()
                } else if depth.is_none()
                    && nodes.is_none()
                    && movetime.is_none()
                    && time.is_none()
                {
                    SearchConfig::with_depth(self.try_player()?.depth())
                } else {
                    SearchConfig::from_go(
                        depth,
                        nodes,
                        movetime.map(Duration::from_millis),
                        time.map(Duration::from_millis),
                        inc.map(Duration::from_millis),
                    )
                };

                if self.debug {
                    self.start_search::<LogDebug>(config)
                } else {
                    self.start_search::<LogInfo>(config)
                }
            }

            EngineCommand::HashInfo => self.hash_info(),

            EngineCommand::MakeMove { mv_string } => {
                let mv = Move::from_text(&self.position, &mv_string)?;
                self.position.make_move(mv);
            }

            EngineCommand::Moves { square, sort } => self.moves(square, sort),

            EngineCommand::NewGame => self.new_game()?,

            EngineCommand::Option { name } => {
                if let Some(value) = self.get_option(&name) {
                    println!("Option {name:?} := {value}");
                } else {
                    println!("{} has no option {name:?}", self.name());
                }
            }

            EngineCommand::Perft { depth } => println!("{}", perft(&self.position, depth)),

            EngineCommand::Place { piece, square } => {
                self.position.place(piece, square);
                if self.debug {
                    Self::send_string(format!("Placed {piece} at {square}"));
                }
            }

            EngineCommand::Position { args } => {
                let args = PositionArgs::parse(&args)?;
                self.position = Self::position(args)?;
            }

            EngineCommand::SetOption { name, value } => self.set_option(&name, &value)?,

            EngineCommand::Splitperft { depth } => {
                println!("{}", splitperft(&self.position, depth))
            }

            EngineCommand::Stop => {
                // A stop with no search running would cancel the next one instead
                if self.is_searching() {
                    self.stop.stop();
                }
            }

            EngineCommand::Take { square } => {
                if let Some(piece) = self.position.take(square) {
                    if self.debug {
                        Self::send_string(format!("Removed {piece} at {square}"));
                    }
                }
            }

            EngineCommand::Wait => _ = self.stop_search(),
        }

        Ok(())
    }

    /// Execute the `bench` command, running a benchmark of a fixed search on a series of positions and displaying the results.
    fn bench(&mut self, depth: Option<u8>, pretty: bool) -> Result<()> {
        self.cancel_search();

        // Set up the benchmarking config
        let config = SearchConfig::with_depth(depth.unwrap_or(BENCH_DEPTH));

        let benches = BENCHMARK_FENS;
        let mut nodes = 0;

        // Padding for printing FENs
        let width = benches.iter().map(|fen| fen.len()).max().unwrap_or_default();

        println!(
            "Running fixed-depth search (d={}) on {} positions",
            config.max_depth,
            benches.len()
        );

        // Run a fixed search on each position
        for (i, fen) in benches.into_iter().enumerate() {
            print!("{:>2}/{:>2}: {fen:<width$} := ", i + 1, benches.len());
            // flush stdout so the node count will appear on the same line after search concludes
            io::stdout().lock().flush()?;

            let mut position = Position::from_fen(fen)?;

            // Each bench is essentially a new game
            let mut player = self.player()?;
            player.new_game();
            let res = player.search::<LogNone, _>(&mut position, config);

            nodes += res.nodes;
            println!("{}", res.nodes);
        }

        // Compute results
        let elapsed = config.starttime.elapsed();
        let nps = (nodes as f32 / elapsed.as_secs_f32()) as u64;
        let m_nps = nodes as f32 / elapsed.as_secs_f32() / 1_000_000.0;
        let ms = elapsed.as_millis();

        if pretty {
            // Display the results in a nice table
            println!();
            println!("+-- Benchmark Complete --+");
            println!("| time (ms)  {ms:<12}|");
            println!("|     nodes  {nodes:<12}|");
            println!("|       nps  {nps:<12}|");
            println!("|      Mnps  {m_nps:<12.2}|");
            println!("+------------------------+");
        } else {
            println!("{nodes} nodes / {elapsed:?} := {nps} nps");
        }

        // Leave the engine as fresh as the benchmarks found it
        self.player()?.new_game();

        Ok(())
    }

    /// Executes the `eval` command, printing an evaluation of the current position.
    fn eval(&self, pretty: bool) {
        let evaluator = Evaluator::new(&self.position, self.position.side_to_move());

        if pretty {
            println!("{evaluator}");
            println!("Score: {}", evaluator.eval());
        } else {
            println!("{}", evaluator.eval());
        }
    }

    /// Display info about the transposition table.
    fn hash_info(&self) {
        // The search thread holds the player until it is done
        let Ok(player) = self.player.try_lock() else {
            println!("TT info unavailable while a search is running");
            return;
        };

        let tt = player.ttable();
        println!(
            "TT info: {} entries, {} hits / {} accesses ({:.2}% hit rate), {} collisions",
            tt.num_entries(),
            tt.hits(),
            tt.accesses(),
            tt.hit_rate(),
            tt.collisions()
        );
        println!("Zobrist seed: {:#x}", player.seed());
    }

    /// Executes the `moves` command, displaying all available moves on the board, or for the given square.
    fn moves(&self, square: Option<Square>, sort: bool) {
        let mut moves = self
            .position
            .legal_moves()
            .into_iter()
            .filter(|mv| square.map_or(true, |sq| mv.from() == sq))
            .map(|mv| mv.to_string())
            .collect::<Vec<_>>();

        // If there are none, print "(none)"
        if moves.is_empty() {
            println!("(none)");
            return;
        }

        if sort {
            moves.sort();
        }

        println!("{}", moves.join(", "));
    }

    /// Resets the engine's internal game state.
    ///
    /// Any running search is cancelled and its result ignored. The hash table is cleared.
    fn new_game(&mut self) -> Result<()> {
        self.cancel_search();
        self.position = Position::default();
        self.player()?.new_game();
        Ok(())
    }

    /// Builds the position described by `args`: the FEN (or the starting position) with every move applied.
    fn position(args: PositionArgs) -> Result<Position> {
        // Set the new position
        let mut position = match args.fen {
            Some(fen) => fen.parse()?,
            None => Position::default(),
        };

        // Apply the provided moves
        for mv_str in args.moves {
            let mv = Move::from_text(&position, &mv_str)?;
            position.make_move(mv);
        }

        Ok(position)
    }

    /// Returns `true` if the engine is currently executing a search.
    #[inline(always)]
    fn is_searching(&self) -> bool {
        self.is_searching.load(Ordering::Relaxed)
    }

    /// Starts a search on the current position on a new thread, given the parameters in `config`.
    fn start_search<Log: LogLevel + 'static>(&mut self, config: SearchConfig) {
        // Cannot start a search if one is already running
        if self.is_searching() {
            Self::send_string("A search is already running");
            return;
        }
        // Reap the previous thread, which has already finished
        _ = self.stop_search();

        // No search is running, so any pending stop request is stale
        self.stop.take();
        self.is_searching.store(true, Ordering::Relaxed);

        // Clone the parameters that will be sent into the thread
        let mut position = self.position;
        let player = Arc::clone(&self.player);
        let is_searching = Arc::clone(&self.is_searching);

        // Spawn a thread to conduct the search
        let handle = thread::spawn(move || {
            // Lock the player for the whole search so only this thread touches its hash table
            let res = match player.lock() {
                Ok(mut player) => player.search::<Log, _>(&mut position, config),
                Err(_) => {
                    eprintln!("A thread holding the player panicked");
                    SearchResult::default()
                }
            };

            // Search has concluded, alert other thread(s) that we are no longer searching
            is_searching.store(false, Ordering::Relaxed);
            res
        });

        self.search_thread = Some(handle);
    }

    /// Awaits the current search thread, blocking until it finishes and returning its result.
    fn stop_search(&mut self) -> Option<SearchResult<Move>> {
        // Can't stop a search if there aren't any threads searching!
        let handle = self.search_thread.take()?;

        // Attempt to join the thread handle to retrieve the result
        let id = handle.thread().id();
        let Ok(res) = handle.join() else {
            Self::send_string(format!("Failed to join on thread {id:?}"));
            return None;
        };

        Some(res)
    }

    /// Stops the current search, if any, and waits for it to wind down.
    fn cancel_search(&mut self) {
        if self.is_searching() {
            self.stop.stop();
        }
        _ = self.stop_search();
    }

    /// Handles the `setoption` command, setting option `name` to `value`.
    ///
    /// Will return an error if `name` isn't a valid option or `value` is not a valid value for that option.
    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        match name.to_ascii_lowercase().as_str() {
            "depth" => {
                let Ok(depth) = value.parse::<u8>() else {
                    bail!("expected integer. got {value:?}");
                };

                if depth == 0 || depth > MAX_DEPTH {
                    bail!("Depth must be within 1..={MAX_DEPTH}");
                }

                self.try_player()?.set_depth(depth);
            }

            // A new seed means new Zobrist tables, so the old hash table is useless
            "seed" => {
                let seed = parse_seed(value)?;

                self.cancel_search();
                let mut player = Player::new(seed);
                player.set_depth(self.player()?.depth());
                self.stop = player.stop_handle();
                *self.player()? = player;
            }

            "debug" => {
                let Ok(enabled) = value.parse() else {
                    bail!("expected bool. got {value:?}");
                };

                self.debug = enabled;
            }

            _ => bail!("Unrecognized option {name:?} with value {value:?}"),
        }

        if self.debug {
            Self::send_string(format!("Option {name} set to {value}"));
        }

        Ok(())
    }

    /// Returns the current value of the option `name`, if it exists on this engine.
    fn get_option(&self, name: &str) -> Option<String> {
        let value = match name.to_ascii_lowercase().as_str() {
            "depth" => match self.player.try_lock() {
                Ok(player) => player.depth().to_string(),
                Err(_) => String::from("(searching)"),
            },

            "seed" => match self.player.try_lock() {
                Ok(player) => format!("{:#x}", player.seed()),
                Err(_) => String::from("(searching)"),
            },

            "debug" => self.debug.to_string(),

            _ => return None,
        };

        Some(value)
    }

    /// Helper to send an `info string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(info: T) {
        println!("info string {info}");
    }

    /// Helper function to fetch the player, blocking while a search holds it.
    #[inline(always)]
    fn player(&self) -> Result<MutexGuard<'_, Player<Move>>> {
        self.player
            .lock()
            .map_err(|_| anyhow!("A thread holding the player panicked"))
    }

    /// Like [`Self::player`], but fails instead of waiting on a running search.
    fn try_player(&self) -> Result<MutexGuard<'_, Player<Move>>> {
        match self.player.try_lock() {
            Ok(player) => Ok(player),
            Err(TryLockError::WouldBlock) => bail!("A search is already running"),
            Err(TryLockError::Poisoned(_)) => bail!("A thread holding the player panicked"),
        }
    }
}

impl Default for Engine {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a seed given in decimal or, with a `0x` prefix, in hexadecimal.
fn parse_seed(value: &str) -> Result<u64> {
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse(),
    };

    parsed.with_context(|| format!("expected integer seed. got {value:?}"))
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        // Clear the buffer, read input, and trim the trailing newline
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing commands")?;

        // For ctrl + d
        if 0 == bytes {
            // Send the Quit command and exit this function
            sender
                .send(EngineCommand::Exit { cleanup: false })
                .context("Failed to send 'quit' command after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        // Trim any leading/trailing whitespace
        let buf = buffer.trim();

        // Ignore empty lines
        if buf.is_empty() {
            continue;
        }

        match buf.parse() {
            Ok(cmd) => sender
                .send(cmd)
                .context("Failed to send command to engine")?,

            // Usage errors and `--help` are printed, and the loop carries on
            Err(err) => err.print()?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_with_moves() {
        let args = PositionArgs::parse(&["startpos", "moves", "32-28", "19-23"]).unwrap();
        let position = Engine::position(args).unwrap();
        assert_eq!(
            position,
            Position::from_fen("W:W28,31,33-50:B1-18,20,23").unwrap()
        );

        let args = PositionArgs::parse(&["startpos", "moves", "32-27", "32-28"]).unwrap();
        assert!(Engine::position(args).is_err());
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("42").unwrap(), 42);
        assert_eq!(parse_seed("0xff").unwrap(), 255);
        assert!(parse_seed("seed").is_err());
    }

    #[test]
    fn test_options() {
        let mut engine = Engine::new();
        assert_eq!(engine.get_option("Depth").as_deref(), Some("6"));

        engine.set_option("Depth", "3").unwrap();
        assert_eq!(engine.get_option("depth").as_deref(), Some("3"));
        assert_eq!(engine.player().unwrap().depth(), 3);
        assert!(engine.set_option("Depth", "0").is_err());

        // A new seed replaces the player but keeps its depth
        engine.set_option("Seed", "0x10").unwrap();
        assert_eq!(engine.get_option("Seed").as_deref(), Some("0x10"));
        assert_eq!(engine.player().unwrap().depth(), 3);

        assert!(engine.set_option("Hash", "16").is_err());
        assert!(engine.get_option("Hash").is_none());
    }
}
