//! Square name conversions ("e4" <-> 28).

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::Square;

pub fn algebraic_to_square(name: &str) -> ChessResult<Square> {
    let bytes = name.as_bytes();
    if bytes.len() != 2 {
        return Err(ChessError::InvalidSquareName(name.to_owned()));
    }

    let file = bytes[0].wrapping_sub(b'a');
    let rank = bytes[1].wrapping_sub(b'1');
    if file > 7 || rank > 7 {
        return Err(ChessError::InvalidSquareName(name.to_owned()));
    }

    Ok(rank * 8 + file)
}

pub fn square_to_algebraic(square: Square) -> String {
    let file = (b'a' + square % 8) as char;
    let rank = (b'1' + square / 8) as char;
    format!("{file}{rank}")
}
