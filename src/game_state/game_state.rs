//! Core board state representation.
//!
//! `GameState` is the central model for the engine. It stores piece bitboards,
//! occupancy caches, turn/state flags, clocks, the position key, and the undo
//! stack used by make/unmake workflows.

use crate::errors::ChessResult;
use crate::game_state::chess_rules::STARTING_POSITION_FEN;
use crate::game_state::chess_types::*;
use crate::game_state::undo_state::UndoState;
use crate::utils::fen_generator::generate_fen;
use crate::utils::fen_parser::parse_fen;

#[derive(Debug, Clone)]
pub struct GameState {
    // Piece bitboards, indexed [color][kind].
    pub pieces: [[u64; 6]; 2],

    // Occupancy caches, kept consistent with `pieces` after every mutation.
    pub occupancy_by_color: [u64; 2],
    pub occupancy_all: u64,

    pub side_to_move: Color,
    pub castling_rights: CastlingRights,
    pub en_passant_square: Option<Square>,

    pub halfmove_clock: u16,
    pub fullmove_number: u16,

    // Plies played since game start; gates opening-book probes.
    pub ply: u16,

    pub zobrist_key: u64,

    pub undo_stack: Vec<UndoState>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,

            side_to_move: Color::White,
            castling_rights: 0,
            en_passant_square: None,

            halfmove_clock: 0,
            fullmove_number: 1,
            ply: 0,

            zobrist_key: 0,

            undo_stack: Vec::new(),
        }
    }
}

impl GameState {
    #[inline]
    pub fn new_empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn new_game() -> Self {
        parse_fen(STARTING_POSITION_FEN).expect("starting FEN should always parse")
    }

    #[inline]
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        parse_fen(fen)
    }

    #[inline]
    pub fn to_fen(&self) -> String {
        generate_fen(self)
    }

    /// Linear scan across the twelve bitboards.
    pub fn piece_on_square(&self, square: Square) -> Option<(Color, PieceKind)> {
        let mask = 1u64 << square;
        for color in [Color::White, Color::Black] {
            for piece in PieceKind::ALL {
                if (self.pieces[color.index()][piece.index()] & mask) != 0 {
                    return Some((color, piece));
                }
            }
        }
        None
    }

    /// Rebuild the occupancy caches from the piece bitboards.
    pub fn recalc_occupancy(&mut self) {
        for color in [Color::White, Color::Black] {
            self.occupancy_by_color[color.index()] = self.pieces[color.index()]
                .iter()
                .fold(0u64, |acc, bb| acc | bb);
        }
        self.occupancy_all =
            self.occupancy_by_color[Color::White.index()] | self.occupancy_by_color[Color::Black.index()];
    }

    pub fn push_undo(&mut self) {
        self.undo_stack.push(UndoState::capture(self));
    }

    pub fn pop_undo(&mut self) -> Option<()> {
        let frame = self.undo_stack.pop()?;
        frame.restore(self);
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::GameState;
    use crate::game_state::chess_types::{Color, PieceKind, CASTLE_ALL};

    #[test]
    fn new_game_has_consistent_occupancy() {
        let game = GameState::new_game();

        let mut union = 0u64;
        for color_bbs in &game.pieces {
            for bb in color_bbs {
                union |= bb;
            }
        }
        assert_eq!(union, game.occupancy_all);
        assert_eq!(
            game.occupancy_by_color[0] | game.occupancy_by_color[1],
            game.occupancy_all
        );
        assert_eq!(game.occupancy_by_color[0] & game.occupancy_by_color[1], 0);
        assert_eq!(game.occupancy_all.count_ones(), 32);
    }

    #[test]
    fn new_game_has_standard_flags() {
        let game = GameState::new_game();
        assert_eq!(game.side_to_move, Color::White);
        assert_eq!(game.castling_rights, CASTLE_ALL);
        assert_eq!(game.en_passant_square, None);
        assert_eq!(game.halfmove_clock, 0);
        assert_eq!(game.fullmove_number, 1);
        assert!(game.undo_stack.is_empty());
    }

    #[test]
    fn piece_on_square_reads_the_board() {
        let game = GameState::new_game();
        assert_eq!(game.piece_on_square(4), Some((Color::White, PieceKind::King)));
        assert_eq!(game.piece_on_square(60), Some((Color::Black, PieceKind::King)));
        assert_eq!(game.piece_on_square(12), Some((Color::White, PieceKind::Pawn)));
        assert_eq!(game.piece_on_square(27), None);
    }
}
