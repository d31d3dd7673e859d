//! In-place make/unmake of packed moves.
//!
//! `make_move_in_place` pushes a full snapshot frame before mutating, so
//! `unmake_move_in_place` restores every field exactly. Null moves share the
//! same frame type.

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;
use crate::moves::move_descriptions::{
    move_captured_piece, move_from, move_moved_piece_code, move_promotion_piece, move_to,
    pack_move, piece_kind_from_code, FLAG_CAPTURE, FLAG_CASTLING, FLAG_DOUBLE_PAWN_PUSH,
    FLAG_EN_PASSANT,
};
use crate::search::zobrist;

#[inline]
pub fn build_move(
    from: Square,
    to: Square,
    moved_piece: PieceKind,
    captured_piece: Option<PieceKind>,
    promotion_piece: Option<PieceKind>,
    flags: u64,
) -> Move {
    pack_move(from, to, moved_piece, captured_piece, promotion_piece, flags)
}

pub fn make_move_in_place(game_state: &mut GameState, mv: Move) -> ChessResult<()> {
    game_state.push_undo();

    let from = move_from(mv);
    let to = move_to(mv);
    let from_mask = 1u64 << from;
    let to_mask = 1u64 << to;

    let us = game_state.side_to_move;
    let them = us.opposite();

    let moved = piece_kind_from_code(move_moved_piece_code(mv))
        .ok_or(ChessError::CorruptMoveDescription(mv))?;

    // Lift the moved piece off its origin.
    game_state.pieces[us.index()][moved.index()] &= !from_mask;

    // Remove whatever is captured.
    if (mv & FLAG_EN_PASSANT) != 0 {
        let capture_sq = if us == Color::White {
            to.checked_sub(8)
        } else {
            to.checked_add(8)
        }
        .ok_or(ChessError::CorruptMoveDescription(mv))?;
        game_state.pieces[them.index()][PieceKind::Pawn.index()] &= !(1u64 << capture_sq);
    } else if (mv & FLAG_CAPTURE) != 0 {
        let captured = move_captured_piece(mv).ok_or(ChessError::CorruptMoveDescription(mv))?;
        game_state.pieces[them.index()][captured.index()] &= !to_mask;
    }

    // Land the moved (or promoted) piece.
    if let Some(promo) = move_promotion_piece(mv) {
        game_state.pieces[us.index()][promo.index()] |= to_mask;
    } else {
        game_state.pieces[us.index()][moved.index()] |= to_mask;
    }

    // Castle rook relocation: corner rook to the square the king crossed.
    if (mv & FLAG_CASTLING) != 0 && moved == PieceKind::King {
        match (us, from, to) {
            (Color::White, 4, 6) => move_rook(game_state, us, 7, 5),
            (Color::White, 4, 2) => move_rook(game_state, us, 0, 3),
            (Color::Black, 60, 62) => move_rook(game_state, us, 63, 61),
            (Color::Black, 60, 58) => move_rook(game_state, us, 56, 59),
            _ => {}
        }
    }

    update_castling_rights(game_state, us, from, to, moved);

    game_state.en_passant_square = if (mv & FLAG_DOUBLE_PAWN_PUSH) != 0 {
        Some((from + to) / 2)
    } else {
        None
    };

    if moved == PieceKind::Pawn || (mv & FLAG_CAPTURE) != 0 {
        game_state.halfmove_clock = 0;
    } else {
        game_state.halfmove_clock = game_state.halfmove_clock.saturating_add(1);
    }
    if us == Color::Black {
        game_state.fullmove_number = game_state.fullmove_number.saturating_add(1);
    }

    game_state.side_to_move = them;
    game_state.ply = game_state.ply.saturating_add(1);

    game_state.recalc_occupancy();
    game_state.zobrist_key = zobrist::compute_key(game_state);

    Ok(())
}

pub fn unmake_move_in_place(game_state: &mut GameState) -> ChessResult<()> {
    game_state.pop_undo().ok_or(ChessError::EmptyUndoStack)
}

/// Pass the turn: flip side to move and clear the en-passant target.
pub fn make_null_move(game_state: &mut GameState) {
    game_state.push_undo();

    game_state.en_passant_square = None;
    game_state.halfmove_clock = game_state.halfmove_clock.saturating_add(1);
    game_state.side_to_move = game_state.side_to_move.opposite();
    game_state.zobrist_key = zobrist::compute_key(game_state);
}

pub fn unmake_null_move(game_state: &mut GameState) -> ChessResult<()> {
    game_state.pop_undo().ok_or(ChessError::EmptyUndoStack)
}

fn move_rook(game_state: &mut GameState, color: Color, from: Square, to: Square) {
    game_state.pieces[color.index()][PieceKind::Rook.index()] &= !(1u64 << from);
    game_state.pieces[color.index()][PieceKind::Rook.index()] |= 1u64 << to;
}

fn update_castling_rights(
    game_state: &mut GameState,
    moving_color: Color,
    from: Square,
    to: Square,
    moved_piece: PieceKind,
) {
    if moved_piece == PieceKind::King {
        if moving_color == Color::White {
            game_state.castling_rights &= !(CASTLE_WHITE_KINGSIDE | CASTLE_WHITE_QUEENSIDE);
        } else {
            game_state.castling_rights &= !(CASTLE_BLACK_KINGSIDE | CASTLE_BLACK_QUEENSIDE);
        }
    }

    if moved_piece == PieceKind::Rook {
        match from {
            0 => game_state.castling_rights &= !CASTLE_WHITE_QUEENSIDE,
            7 => game_state.castling_rights &= !CASTLE_WHITE_KINGSIDE,
            56 => game_state.castling_rights &= !CASTLE_BLACK_QUEENSIDE,
            63 => game_state.castling_rights &= !CASTLE_BLACK_KINGSIDE,
            _ => {}
        }
    }

    // Capturing a rook on its original square also removes that right.
    match to {
        0 => game_state.castling_rights &= !CASTLE_WHITE_QUEENSIDE,
        7 => game_state.castling_rights &= !CASTLE_WHITE_KINGSIDE,
        56 => game_state.castling_rights &= !CASTLE_BLACK_QUEENSIDE,
        63 => game_state.castling_rights &= !CASTLE_BLACK_KINGSIDE,
        _ => {}
    }
}
