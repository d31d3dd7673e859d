//! UCI protocol front-end and command loop.
//!
//! Parses UCI commands, maintains the current position, routes `go` requests
//! into the searcher, and emits protocol-compliant output. Malformed lines
//! and unknown commands are ignored; diagnostics go to the logger so the
//! protocol stream stays clean.

use std::io::{self, BufRead, Write};

use log::warn;

use crate::errors::{ChessError, ChessResult};
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_apply::make_move_in_place;
use crate::move_generation::legal_move_generator::generate_legal_moves;
use crate::search::board_scoring::StandardScorer;
use crate::search::iterative_deepening::{SearchLimits, Searcher};
use crate::search::time_management::{resolve_move_time, GoParams};
use crate::tables::opening_book::OpeningBook;
use crate::utils::uci_moves::{move_to_uci, parse_uci_move};

const UCI_ENGINE_NAME: &str = "Garnet Chess 1.0";
const UCI_ENGINE_AUTHOR: &str = "the garnet_chess developers";
const DEFAULT_BOOK_FILE: &str = "book.bin";
const DEFAULT_MAX_DEPTH: u8 = 20;
const MAX_DEPTH_LIMIT: u8 = 30;

pub fn run_stdio_loop() -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut uci = UciState::new();

    for line in stdin.lock().lines() {
        let line = line?;
        let should_quit = uci.handle_command(&line, &mut stdout)?;
        stdout.flush()?;
        if should_quit {
            break;
        }
    }

    Ok(())
}

pub struct UciState {
    game_state: GameState,
    searcher: Searcher<StandardScorer>,
    book: OpeningBook,
    book_path: String,
    max_depth: u8,
}

impl UciState {
    pub fn new() -> Self {
        Self {
            game_state: GameState::new_game(),
            searcher: Searcher::new(StandardScorer),
            book: OpeningBook::new(),
            book_path: DEFAULT_BOOK_FILE.to_owned(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Handle one line; returns true when the loop should terminate.
    pub fn handle_command(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        let mut parts = trimmed.split_whitespace();
        match parts.next().unwrap_or_default() {
            "uci" => {
                writeln!(out, "id name {UCI_ENGINE_NAME}")?;
                writeln!(out, "id author {UCI_ENGINE_AUTHOR}")?;
                writeln!(
                    out,
                    "option name BookFile type string default {DEFAULT_BOOK_FILE}"
                )?;
                writeln!(
                    out,
                    "option name MaxDepth type spin default {DEFAULT_MAX_DEPTH} min 1 max {MAX_DEPTH_LIMIT}"
                )?;
                writeln!(out, "uciok")?;
            }
            "isready" => {
                writeln!(out, "readyok")?;
            }
            "ucinewgame" => {
                self.game_state = GameState::new_game();
                self.reload_book(out)?;
            }
            "position" => {
                if let Err(err) = self.handle_position(trimmed) {
                    // Malformed position lines are dropped without a reply.
                    warn!("position command rejected: {err}");
                }
            }
            "go" => {
                self.handle_go(trimmed, out)?;
            }
            "setoption" => {
                self.handle_setoption(trimmed, out)?;
            }
            "stop" | "ponderhit" | "debug" | "register" => {
                // Search runs synchronously on this thread; nothing to do.
            }
            "quit" => {
                return Ok(true);
            }
            _ => {
                // Unknown commands are ignored for UCI compatibility.
            }
        }

        Ok(false)
    }

    fn handle_position(&mut self, line: &str) -> ChessResult<()> {
        let mut tokens = line.split_whitespace().peekable();
        let _ = tokens.next(); // "position"

        let mut game_state = match tokens.next() {
            Some("startpos") => GameState::new_game(),
            Some("fen") => {
                let mut fen_parts = Vec::<&str>::new();
                while let Some(&tok) = tokens.peek() {
                    if tok == "moves" {
                        break;
                    }
                    fen_parts.push(tok);
                    let _ = tokens.next();
                }
                GameState::from_fen(&fen_parts.join(" "))?
            }
            _ => {
                return Err(ChessError::InvalidFen(
                    "position requires startpos or fen".to_owned(),
                ))
            }
        };

        if tokens.next() == Some("moves") {
            for tok in tokens {
                match parse_uci_move(&mut game_state, tok) {
                    Ok(mv) => make_move_in_place(&mut game_state, mv)?,
                    // Illegal moves are skipped; later moves still apply to
                    // the unchanged position.
                    Err(_) => {}
                }
            }
        }

        game_state.undo_stack.clear();
        self.game_state = game_state;
        Ok(())
    }

    fn handle_go(&mut self, line: &str, out: &mut impl Write) -> io::Result<()> {
        let params = parse_go_params(line);
        let movetime_ms = resolve_move_time(&self.game_state, &params);

        let budget_from_clock = params.movetime_ms.is_none()
            && !params.infinite
            && (params.wtime_ms.is_some() || params.btime_ms.is_some());
        if budget_from_clock {
            if let Some(budget) = movetime_ms {
                writeln!(out, "info string allocated {budget}ms for this move")?;
            }
        }

        match self.book.probe(&mut self.game_state) {
            Ok(Some(book_move)) => {
                writeln!(out, "bestmove {}", move_to_uci(book_move))?;
                return Ok(());
            }
            Ok(None) => {}
            Err(err) => warn!("book probe failed: {err}"),
        }

        let limits = SearchLimits {
            max_depth: params.depth.unwrap_or(self.max_depth).clamp(1, MAX_DEPTH_LIMIT),
            movetime_ms,
        };

        let best_move = match self.searcher.iterative_deepening(&mut self.game_state, &limits) {
            Ok(result) => result.best_move,
            Err(err) => {
                warn!("search failed: {err}");
                None
            }
        };

        // Keep the first legal move as a fallback when no depth completed.
        let best_move = best_move.or_else(|| {
            generate_legal_moves(&mut self.game_state)
                .ok()
                .and_then(|moves| moves.first().copied())
        });

        match best_move {
            Some(mv) => writeln!(out, "bestmove {}", move_to_uci(mv))?,
            None => writeln!(out, "bestmove 0000")?,
        }
        Ok(())
    }

    fn handle_setoption(&mut self, line: &str, out: &mut impl Write) -> io::Result<()> {
        let mut name_tokens = Vec::<&str>::new();
        let mut value_tokens = Vec::<&str>::new();
        let mut mode = "";

        for tok in line.split_whitespace().skip(1) {
            match tok {
                "name" => mode = "name",
                "value" => mode = "value",
                _ if mode == "name" => name_tokens.push(tok),
                _ if mode == "value" => value_tokens.push(tok),
                _ => {}
            }
        }

        let name = name_tokens.join(" ");
        let value = value_tokens.join(" ");

        if name.eq_ignore_ascii_case("BookFile") {
            self.book_path = value.clone();
            if let Err(err) = self.book.load(&value) {
                writeln!(out, "info string opening book unavailable: {err}")?;
            }
        } else if name.eq_ignore_ascii_case("MaxDepth") {
            match value.parse::<u8>() {
                Ok(depth) if (1..=MAX_DEPTH_LIMIT).contains(&depth) => self.max_depth = depth,
                _ => warn!(
                    "{}",
                    ChessError::InvalidOptionValue {
                        name,
                        value,
                    }
                ),
            }
        }
        // Unrecognized options are ignored.

        Ok(())
    }

    fn reload_book(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.book.is_loaded() {
            return Ok(());
        }
        if let Err(err) = self.book.load(&self.book_path) {
            writeln!(out, "info string opening book unavailable: {err}")?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn game_state(&self) -> &GameState {
        &self.game_state
    }
}

impl Default for UciState {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_go_params(line: &str) -> GoParams {
    let mut params = GoParams::default();
    let mut tokens = line.split_whitespace();
    let _ = tokens.next(); // "go"

    while let Some(tok) = tokens.next() {
        match tok {
            "depth" => params.depth = next_number(&mut tokens),
            "movetime" => params.movetime_ms = next_number(&mut tokens),
            "infinite" => params.infinite = true,
            "wtime" => params.wtime_ms = next_number(&mut tokens),
            "btime" => params.btime_ms = next_number(&mut tokens),
            "winc" => params.winc_ms = next_number(&mut tokens),
            "binc" => params.binc_ms = next_number(&mut tokens),
            "movestogo" => params.movestogo = next_number(&mut tokens),
            _ => {}
        }
    }

    params
}

fn next_number<'a, T, I>(tokens: &mut I) -> Option<T>
where
    T: std::str::FromStr,
    I: Iterator<Item = &'a str>,
{
    tokens.next().and_then(|tok| tok.parse().ok())
}
