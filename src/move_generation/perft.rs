//! Perft validation counters.
//!
//! Recursively explores the legal move tree to verify generator correctness,
//! tallying tactical events (captures, en-passants, castles, promotions,
//! checks) at the leaves alongside the node count.

use crate::errors::ChessResult;
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_apply::{make_move_in_place, unmake_move_in_place};
use crate::move_generation::legal_move_checks::is_king_in_check;
use crate::move_generation::legal_move_generator::generate_legal_moves;
use crate::moves::move_descriptions::{
    is_capture, is_promotion, FLAG_CASTLING, FLAG_EN_PASSANT,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
}

impl PerftCounts {
    fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
    }
}

pub fn perft(game_state: &mut GameState, depth: u8) -> ChessResult<PerftCounts> {
    let mut counts = PerftCounts::default();
    if depth == 0 {
        counts.nodes = 1;
        return Ok(counts);
    }

    let moves = generate_legal_moves(game_state)?;
    for mv in moves {
        if depth == 1 {
            counts.nodes += 1;
            if is_capture(mv) {
                counts.captures += 1;
            }
            if (mv & FLAG_EN_PASSANT) != 0 {
                counts.en_passant += 1;
            }
            if (mv & FLAG_CASTLING) != 0 {
                counts.castles += 1;
            }
            if is_promotion(mv) {
                counts.promotions += 1;
            }

            make_move_in_place(game_state, mv)?;
            if is_king_in_check(game_state, game_state.side_to_move) {
                counts.checks += 1;
            }
            unmake_move_in_place(game_state)?;
        } else {
            make_move_in_place(game_state, mv)?;
            let sub = perft(game_state, depth - 1)?;
            unmake_move_in_place(game_state)?;
            counts.merge(sub);
        }
    }

    Ok(counts)
}
