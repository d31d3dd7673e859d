//! UCI long-algebraic move strings.
//!
//! Formatting reads everything from the packed move. Parsing goes the other
//! way: a string is only accepted if it names a move that is legal in the
//! given position, and the matching generated move (with its flags and
//! capture fields) is returned.

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::{Move, PieceKind};
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_generator::generate_legal_moves;
use crate::moves::move_descriptions::{
    move_from, move_promotion_piece, move_to, MOVE_NONE,
};
use crate::utils::algebraic::{algebraic_to_square, square_to_algebraic};

pub fn move_to_uci(mv: Move) -> String {
    if mv == MOVE_NONE {
        return "0000".to_owned();
    }

    let mut out = String::with_capacity(5);
    out.push_str(&square_to_algebraic(move_from(mv)));
    out.push_str(&square_to_algebraic(move_to(mv)));
    if let Some(promo) = move_promotion_piece(mv) {
        out.push(promotion_char(promo));
    }
    out
}

/// Resolve a UCI move string against the position's legal moves.
pub fn parse_uci_move(game_state: &mut GameState, text: &str) -> ChessResult<Move> {
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(ChessError::InvalidMoveString(text.to_owned()));
    }

    let from = algebraic_to_square(&text[0..2])?;
    let to = algebraic_to_square(&text[2..4])?;
    let promotion = match text.as_bytes().get(4) {
        None => None,
        Some(b'n') => Some(PieceKind::Knight),
        Some(b'b') => Some(PieceKind::Bishop),
        Some(b'r') => Some(PieceKind::Rook),
        Some(b'q') => Some(PieceKind::Queen),
        Some(_) => return Err(ChessError::InvalidMoveString(text.to_owned())),
    };

    generate_legal_moves(game_state)?
        .into_iter()
        .find(|&mv| {
            move_from(mv) == from && move_to(mv) == to && move_promotion_piece(mv) == promotion
        })
        .ok_or_else(|| ChessError::IllegalMove(text.to_owned()))
}

fn promotion_char(piece: PieceKind) -> char {
    match piece {
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        _ => 'q',
    }
}
