//! Snapshot frames for `make_move` / `unmake_move`.
//!
//! Each make pushes a full copy of the board state so that unmake restores
//! every field exactly, including the position key. Null moves push the same
//! frame.

use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;

#[derive(Debug, Clone)]
pub struct UndoState {
    pub pieces: [[u64; 6]; 2],
    pub occupancy_by_color: [u64; 2],
    pub occupancy_all: u64,

    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,

    pub halfmove_clock: u16,
    pub fullmove_number: u16,
    pub ply: u16,

    pub zobrist_key: u64,
}

impl UndoState {
    pub fn capture(game_state: &GameState) -> Self {
        Self {
            pieces: game_state.pieces,
            occupancy_by_color: game_state.occupancy_by_color,
            occupancy_all: game_state.occupancy_all,
            side_to_move: game_state.side_to_move,
            castling_rights: game_state.castling_rights,
            en_passant_square: game_state.en_passant_square,
            halfmove_clock: game_state.halfmove_clock,
            fullmove_number: game_state.fullmove_number,
            ply: game_state.ply,
            zobrist_key: game_state.zobrist_key,
        }
    }

    pub fn restore(self, game_state: &mut GameState) {
        game_state.pieces = self.pieces;
        game_state.occupancy_by_color = self.occupancy_by_color;
        game_state.occupancy_all = self.occupancy_all;
        game_state.side_to_move = self.side_to_move;
        game_state.castling_rights = self.castling_rights;
        game_state.en_passant_square = self.en_passant_square;
        game_state.halfmove_clock = self.halfmove_clock;
        game_state.fullmove_number = self.fullmove_number;
        game_state.ply = self.ply;
        game_state.zobrist_key = self.zobrist_key;
    }
}
