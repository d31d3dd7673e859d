//! Iterative-deepening negamax search.
//!
//! Alpha-beta with quiescence, a transposition table, null-move pruning, a
//! check extension, late-move reductions with re-search, aspiration windows,
//! and MVV-LVA / TT-move / killer / history move ordering. One info line is
//! printed per completed depth.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::ChessResult;
use crate::game_state::chess_types::Move;
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_apply::{
    make_move_in_place, make_null_move, unmake_move_in_place, unmake_null_move,
};
use crate::move_generation::legal_move_checks::{
    has_non_pawn_material, is_checkmate, is_insufficient_material, is_king_in_check,
};
use crate::move_generation::legal_move_generator::{generate_captures, generate_legal_moves};
use crate::moves::move_descriptions::{
    is_capture, is_promotion, move_captured_piece, move_from, move_moved_piece_code,
    move_promotion_piece, move_to, piece_kind_from_code, MOVE_NONE,
};
use crate::search::board_scoring::{piece_value, BoardScorer, MATE_SCORE};
use crate::search::transposition_table::{Bound, TranspositionTable};
use crate::utils::uci_moves::move_to_uci;

pub const MAX_KILLER_PLY: usize = 30;
const MAX_QUIESCENCE_PLY: u8 = 30;
const ASPIRATION_WINDOW: i32 = 50;
const ASPIRATION_MIN_DEPTH: u8 = 5;
const TIME_CHECK_MASK: u64 = 2047;

const CHECKMATE_ORDER_SCORE: i32 = 300_000;
const TT_MOVE_ORDER_SCORE: i32 = 200_000;
const CAPTURE_ORDER_SCORE: i32 = 100_000;
const PROMOTION_ORDER_SCORE: i32 = 90_000;
const KILLER_PRIMARY_ORDER_SCORE: i32 = 50_000;
const KILLER_SECONDARY_ORDER_SCORE: i32 = 40_000;

#[derive(Debug, Clone, Copy)]
pub struct SearchLimits {
    pub max_depth: u8,
    pub movetime_ms: Option<u64>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 4,
            movetime_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub best_score: i32,
    pub reached_depth: u8,
    pub nodes: u64,
    pub elapsed_ms: u64,
    pub nps: u64,
}

pub struct Searcher<S: BoardScorer> {
    scorer: S,
    tt: TranspositionTable,
    killers: [[Move; 2]; MAX_KILLER_PLY],
    history: Box<[[i32; 64]; 64]>,

    nodes: u64,
    qnodes: u64,
    seldepth: u8,
    started_at: Instant,
    deadline: Option<Instant>,
    stop_flag: Arc<AtomicBool>,
}

impl<S: BoardScorer> Searcher<S> {
    pub fn new(scorer: S) -> Self {
        Self::with_tt(scorer, TranspositionTable::new())
    }

    pub fn with_tt_capacity(scorer: S, tt_entries: usize) -> Self {
        Self::with_tt(scorer, TranspositionTable::with_capacity(tt_entries))
    }

    fn with_tt(scorer: S, tt: TranspositionTable) -> Self {
        Self {
            scorer,
            tt,
            killers: [[MOVE_NONE; 2]; MAX_KILLER_PLY],
            history: Box::new([[0; 64]; 64]),
            nodes: 0,
            qnodes: 0,
            seldepth: 0,
            started_at: Instant::now(),
            deadline: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared stop flag; setting it from another thread aborts the search at
    /// the next poll point.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    pub fn iterative_deepening(
        &mut self,
        game_state: &mut GameState,
        limits: &SearchLimits,
    ) -> ChessResult<SearchResult> {
        self.tt.clear();
        self.killers = [[MOVE_NONE; 2]; MAX_KILLER_PLY];
        for row in self.history.iter_mut() {
            row.fill(0);
        }
        self.nodes = 0;
        self.qnodes = 0;
        self.started_at = Instant::now();
        self.deadline = limits
            .movetime_ms
            .map(|ms| self.started_at + Duration::from_millis(ms.max(1)));
        self.stop_flag.store(false, Ordering::Relaxed);

        let mut best_move = None;
        let mut best_score = 0i32;
        let mut reached_depth = 0u8;
        let mut previous_score = 0i32;

        for depth in 1..=limits.max_depth.max(1) {
            self.seldepth = 0;

            let (alpha, beta) = if depth >= ASPIRATION_MIN_DEPTH {
                (
                    previous_score - ASPIRATION_WINDOW,
                    previous_score + ASPIRATION_WINDOW,
                )
            } else {
                (-MATE_SCORE, MATE_SCORE)
            };

            let Some((mut score, mut mv)) = self.negamax(game_state, depth, alpha, beta, 0)?
            else {
                break;
            };

            // Fell out of the aspiration window: redo the depth full-width.
            if depth >= ASPIRATION_MIN_DEPTH && (score <= alpha || score >= beta) {
                let Some((full_score, full_move)) =
                    self.negamax(game_state, depth, -MATE_SCORE, MATE_SCORE, 0)?
                else {
                    break;
                };
                score = full_score;
                mv = full_move;
            }

            previous_score = score;
            best_score = score;
            if mv != MOVE_NONE {
                best_move = Some(mv);
            }
            reached_depth = depth;

            self.emit_info(depth, score, best_move);

            if self.deadline_passed() {
                break;
            }
        }

        let elapsed_ms = self.started_at.elapsed().as_millis() as u64;
        let nodes = self.nodes + self.qnodes;
        Ok(SearchResult {
            best_move,
            best_score,
            reached_depth,
            nodes,
            elapsed_ms,
            nps: nodes.saturating_mul(1000) / elapsed_ms.max(1),
        })
    }

    fn negamax(
        &mut self,
        game_state: &mut GameState,
        depth: u8,
        mut alpha: i32,
        beta: i32,
        ply: u8,
    ) -> ChessResult<Option<(i32, Move)>> {
        self.nodes += 1;
        self.seldepth = self.seldepth.max(ply);
        if self.check_time() {
            return Ok(None);
        }

        if depth == 0 {
            return Ok(self
                .quiescence(game_state, alpha, beta, ply)?
                .map(|score| (score, MOVE_NONE)));
        }

        let mut depth = depth;
        let in_check = is_king_in_check(game_state, game_state.side_to_move);
        if in_check {
            depth += 1; // check extension
        }

        let key = game_state.zobrist_key;

        // The root never takes a TT cutoff so the returned move always comes
        // from its own legal move list.
        if ply > 0 {
            if let Some(entry) = self.tt.probe(key) {
                if entry.depth >= depth {
                    match entry.bound {
                        Bound::Exact => return Ok(Some((entry.score, entry.best_move))),
                        Bound::Lower if entry.score >= beta => {
                            return Ok(Some((beta, entry.best_move)))
                        }
                        Bound::Upper if entry.score <= alpha => {
                            return Ok(Some((alpha, entry.best_move)))
                        }
                        _ => {}
                    }
                }
            }
        }

        // Null-move pruning: if passing the turn still refutes beta, prune.
        if depth >= 3 && !in_check && has_non_pawn_material(game_state, game_state.side_to_move) {
            make_null_move(game_state);
            let reply = self.negamax(game_state, depth - 3, -beta, -beta + 1, ply + 1)?;
            unmake_null_move(game_state)?;
            match reply {
                None => return Ok(None),
                Some((reply_score, _)) => {
                    if -reply_score >= beta {
                        return Ok(Some((beta, MOVE_NONE)));
                    }
                }
            }
        }

        if is_insufficient_material(game_state) {
            return Ok(Some((0, MOVE_NONE)));
        }

        let mut moves = generate_legal_moves(game_state)?;
        if moves.is_empty() {
            let score = if in_check {
                -MATE_SCORE + i32::from(ply)
            } else {
                0
            };
            return Ok(Some((score, MOVE_NONE)));
        }

        self.order_moves(game_state, &mut moves, ply, key)?;

        let alpha_original = alpha;
        let mut best_score = -MATE_SCORE;
        let mut best_move = MOVE_NONE;

        for (move_index, &mv) in moves.iter().enumerate() {
            let tactical = is_capture(mv) || is_promotion(mv);
            let reduce = depth >= 3 && move_index >= 3 && !tactical && !in_check;

            make_move_in_place(game_state, mv)?;

            let score = if reduce {
                // Late-move reduction with full-depth re-search on improvement.
                let Some((reduced_score, _)) =
                    self.negamax(game_state, depth - 2, -beta, -alpha, ply + 1)?
                else {
                    unmake_move_in_place(game_state)?;
                    return Ok(None);
                };
                let mut score = -reduced_score;
                if score > alpha {
                    let Some((full_score, _)) =
                        self.negamax(game_state, depth - 1, -beta, -alpha, ply + 1)?
                    else {
                        unmake_move_in_place(game_state)?;
                        return Ok(None);
                    };
                    score = -full_score;
                }
                score
            } else {
                let Some((child_score, _)) =
                    self.negamax(game_state, depth - 1, -beta, -alpha, ply + 1)?
                else {
                    unmake_move_in_place(game_state)?;
                    return Ok(None);
                };
                -child_score
            };

            unmake_move_in_place(game_state)?;

            if score > best_score {
                best_score = score;
                best_move = mv;
            }

            if score > alpha {
                alpha = score;
                if !tactical && (ply as usize) < MAX_KILLER_PLY {
                    let slot = &mut self.killers[ply as usize];
                    if slot[0] != mv {
                        slot[1] = slot[0];
                        slot[0] = mv;
                    }
                }
            }

            if alpha >= beta {
                if !tactical {
                    self.history[move_from(mv) as usize][move_to(mv) as usize] +=
                        i32::from(depth) * i32::from(depth);
                }
                break;
            }
        }

        let bound = if best_score <= alpha_original {
            Bound::Upper
        } else if best_score >= beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt.store(key, best_move, best_score, depth, bound);

        Ok(Some((best_score, best_move)))
    }

    fn quiescence(
        &mut self,
        game_state: &mut GameState,
        mut alpha: i32,
        beta: i32,
        ply: u8,
    ) -> ChessResult<Option<i32>> {
        self.qnodes += 1;
        self.seldepth = self.seldepth.max(ply);
        if self.check_time() {
            return Ok(None);
        }

        let in_check = is_king_in_check(game_state, game_state.side_to_move);
        let stand_pat = self.scorer.score(game_state);

        if !in_check {
            if stand_pat >= beta {
                return Ok(Some(beta));
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
        }

        if ply >= MAX_QUIESCENCE_PLY {
            return Ok(Some(alpha));
        }

        let key = game_state.zobrist_key;
        let mut moves = if in_check {
            generate_legal_moves(game_state)?
        } else {
            generate_captures(game_state)?
        };
        if moves.is_empty() {
            let score = if in_check {
                -MATE_SCORE + i32::from(ply)
            } else {
                alpha
            };
            return Ok(Some(score));
        }

        self.order_moves(game_state, &mut moves, ply, key)?;

        for &mv in &moves {
            make_move_in_place(game_state, mv)?;
            let reply = self.quiescence(game_state, -beta, -alpha, ply + 1)?;
            unmake_move_in_place(game_state)?;

            let Some(reply_score) = reply else {
                return Ok(None);
            };
            let score = -reply_score;

            if score >= beta {
                return Ok(Some(beta));
            }
            if score > alpha {
                alpha = score;
            }
        }

        Ok(Some(alpha))
    }

    fn order_moves(
        &mut self,
        game_state: &mut GameState,
        moves: &mut [Move],
        ply: u8,
        key: u64,
    ) -> ChessResult<()> {
        let tt_move = self
            .tt
            .probe(key)
            .map(|entry| entry.best_move)
            .filter(|&mv| mv != MOVE_NONE);

        let mut scored = Vec::with_capacity(moves.len());
        for &mv in moves.iter() {
            scored.push((self.score_move(game_state, mv, ply, tt_move)?, mv));
        }
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        for (slot, (_, mv)) in moves.iter_mut().zip(scored) {
            *slot = mv;
        }
        Ok(())
    }

    fn score_move(
        &mut self,
        game_state: &mut GameState,
        mv: Move,
        ply: u8,
        tt_move: Option<Move>,
    ) -> ChessResult<i32> {
        if self.gives_checkmate(game_state, mv)? {
            return Ok(CHECKMATE_ORDER_SCORE);
        }

        if tt_move == Some(mv) {
            return Ok(TT_MOVE_ORDER_SCORE);
        }

        if is_capture(mv) {
            if let (Some(victim), Some(aggressor)) = (
                move_captured_piece(mv),
                piece_kind_from_code(move_moved_piece_code(mv)),
            ) {
                // MVV-LVA: most valuable victim first, cheapest aggressor first.
                return Ok(CAPTURE_ORDER_SCORE + 10 * piece_value(victim) - piece_value(aggressor));
            }
        }

        if let Some(promo) = move_promotion_piece(mv) {
            return Ok(PROMOTION_ORDER_SCORE + piece_value(promo));
        }

        if (ply as usize) < MAX_KILLER_PLY {
            if self.killers[ply as usize][0] == mv {
                return Ok(KILLER_PRIMARY_ORDER_SCORE);
            }
            if self.killers[ply as usize][1] == mv {
                return Ok(KILLER_SECONDARY_ORDER_SCORE);
            }
        }

        Ok(self.history[move_from(mv) as usize][move_to(mv) as usize])
    }

    fn gives_checkmate(&mut self, game_state: &mut GameState, mv: Move) -> ChessResult<bool> {
        make_move_in_place(game_state, mv)?;
        let mate = is_checkmate(game_state)?;
        unmake_move_in_place(game_state)?;
        Ok(mate)
    }

    /// Fast-path poll: the wall clock is only consulted every 2048 nodes, but
    /// a latched stop is honored immediately.
    fn check_time(&mut self) -> bool {
        if self.stop_flag.load(Ordering::Relaxed) {
            return true;
        }
        let Some(deadline) = self.deadline else {
            return false;
        };
        if (self.nodes + self.qnodes) & TIME_CHECK_MASK != 0 {
            return false;
        }
        if Instant::now() >= deadline {
            self.stop_flag.store(true, Ordering::Relaxed);
            return true;
        }
        false
    }

    fn deadline_passed(&self) -> bool {
        if self.stop_flag.load(Ordering::Relaxed) {
            return true;
        }
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }

    fn emit_info(&self, depth: u8, score: i32, best_move: Option<Move>) {
        let elapsed_ms = self.started_at.elapsed().as_millis() as u64;
        let nodes = self.nodes + self.qnodes;
        let nps = nodes.saturating_mul(1000) / elapsed_ms.max(1);
        let pv = best_move.map(move_to_uci).unwrap_or_else(|| "0000".to_owned());
        println!(
            "{}",
            format_info_line(
                depth,
                self.seldepth,
                score,
                nodes,
                nps,
                elapsed_ms,
                self.tt.hashfull(),
                &pv,
            )
        );
        let _ = io::stdout().flush();
    }
}

/// One engine-to-GUI line per completed depth; field order is part of the
/// protocol contract.
#[allow(clippy::too_many_arguments)]
fn format_info_line(
    depth: u8,
    seldepth: u8,
    score: i32,
    nodes: u64,
    nps: u64,
    elapsed_ms: u64,
    hashfull: u32,
    pv: &str,
) -> String {
    format!(
        "info depth {depth} seldepth {seldepth} score cp {score} nodes {nodes} nps {nps} \
         time {elapsed_ms} hashfull {hashfull} pv {pv}"
    )
}
