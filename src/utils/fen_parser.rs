//! FEN-to-GameState parser.
//!
//! Accepts the full 6-field form and the 4-field form without clocks. The
//! parsed state has its occupancy caches, ply counter, and position key fully
//! populated.

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;
use crate::search::zobrist;
use crate::utils::algebraic::algebraic_to_square;

pub fn parse_fen(fen: &str) -> ChessResult<GameState> {
    let mut parts = fen.split_whitespace();

    let board_part = parts
        .next()
        .ok_or_else(|| ChessError::InvalidFen("missing board layout".to_owned()))?;
    let side_part = parts
        .next()
        .ok_or_else(|| ChessError::InvalidFen("missing side to move".to_owned()))?;
    let castling_part = parts
        .next()
        .ok_or_else(|| ChessError::InvalidFen("missing castling rights".to_owned()))?;
    let en_passant_part = parts
        .next()
        .ok_or_else(|| ChessError::InvalidFen("missing en-passant square".to_owned()))?;

    // The clock fields are optional; a 4-field FEN defaults to 0 and 1.
    let halfmove_part = parts.next();
    let fullmove_part = parts.next();
    if parts.next().is_some() {
        return Err(ChessError::InvalidFen("extra trailing fields".to_owned()));
    }

    let mut game_state = GameState::new_empty();

    parse_board(board_part, &mut game_state)?;
    game_state.side_to_move = parse_side_to_move(side_part)?;
    game_state.castling_rights = parse_castling_rights(castling_part)?;
    game_state.en_passant_square = parse_en_passant_square(en_passant_part)?;

    game_state.halfmove_clock = match halfmove_part {
        None => 0,
        Some(text) => text
            .parse::<u16>()
            .map_err(|_| ChessError::InvalidFen(format!("invalid halfmove clock: {text}")))?,
    };
    game_state.fullmove_number = match fullmove_part {
        None => 1,
        Some(text) => text
            .parse::<u16>()
            .map_err(|_| ChessError::InvalidFen(format!("invalid fullmove number: {text}")))?,
    };

    game_state.ply = (game_state.fullmove_number.max(1) - 1) * 2
        + u16::from(game_state.side_to_move == Color::Black);

    game_state.recalc_occupancy();
    game_state.zobrist_key = zobrist::compute_key(&game_state);

    Ok(game_state)
}

fn parse_board(board_part: &str, game_state: &mut GameState) -> ChessResult<()> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(ChessError::InvalidFen(
            "board layout must contain 8 ranks".to_owned(),
        ));
    }

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let board_rank = 7 - fen_rank_idx;
        let mut file = 0usize;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(ChessError::InvalidFen(format!(
                        "invalid empty-square count '{ch}'"
                    )));
                }
                file += empty_count as usize;
                continue;
            }

            let (color, piece) = piece_from_fen_char(ch).ok_or_else(|| {
                ChessError::InvalidFen(format!("invalid piece character '{ch}'"))
            })?;

            if file >= 8 {
                return Err(ChessError::InvalidFen("rank has too many files".to_owned()));
            }

            let sq = board_rank * 8 + file;
            game_state.pieces[color.index()][piece.index()] |= 1u64 << sq;
            file += 1;
        }

        if file != 8 {
            return Err(ChessError::InvalidFen(
                "rank does not sum to 8 files".to_owned(),
            ));
        }
    }

    Ok(())
}

fn parse_side_to_move(side_part: &str) -> ChessResult<Color> {
    match side_part {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        _ => Err(ChessError::InvalidFen(format!(
            "invalid side-to-move field: {side_part}"
        ))),
    }
}

fn parse_castling_rights(castling_part: &str) -> ChessResult<CastlingRights> {
    if castling_part == "-" {
        return Ok(0);
    }

    let mut rights: CastlingRights = 0;
    for ch in castling_part.chars() {
        match ch {
            'K' => rights |= CASTLE_WHITE_KINGSIDE,
            'Q' => rights |= CASTLE_WHITE_QUEENSIDE,
            'k' => rights |= CASTLE_BLACK_KINGSIDE,
            'q' => rights |= CASTLE_BLACK_QUEENSIDE,
            _ => {
                return Err(ChessError::InvalidFen(format!(
                    "invalid castling rights character: {ch}"
                )))
            }
        }
    }
    Ok(rights)
}

fn parse_en_passant_square(en_passant_part: &str) -> ChessResult<Option<Square>> {
    if en_passant_part == "-" {
        return Ok(None);
    }
    Ok(Some(algebraic_to_square(en_passant_part)?))
}

fn piece_from_fen_char(ch: char) -> Option<(Color, PieceKind)> {
    let color = if ch.is_ascii_uppercase() {
        Color::White
    } else if ch.is_ascii_lowercase() {
        Color::Black
    } else {
        return None;
    };

    let piece = match ch.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };

    Some((color, piece))
}

#[cfg(test)]
mod tests {
    use super::parse_fen;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::game_state::chess_types::{Color, CASTLE_ALL, CASTLE_WHITE_KINGSIDE};

    #[test]
    fn the_starting_fen_parses() {
        let game = parse_fen(STARTING_POSITION_FEN).expect("starting FEN should parse");
        assert_eq!(game.side_to_move, Color::White);
        assert_eq!(game.castling_rights, CASTLE_ALL);
        assert_eq!(game.en_passant_square, None);
        assert_eq!(game.halfmove_clock, 0);
        assert_eq!(game.fullmove_number, 1);
        assert_eq!(game.ply, 0);
        assert_ne!(game.zobrist_key, 0);
    }

    #[test]
    fn four_field_fens_default_their_clocks() {
        let game = parse_fen("4k3/8/8/8/8/8/8/4K3 b K e3").expect("4-field FEN should parse");
        assert_eq!(game.halfmove_clock, 0);
        assert_eq!(game.fullmove_number, 1);
        assert_eq!(game.castling_rights, CASTLE_WHITE_KINGSIDE);
        assert_eq!(game.en_passant_square, Some(20));
        assert_eq!(game.ply, 1);
    }

    #[test]
    fn ply_is_derived_from_the_clocks() {
        let game = parse_fen("4k3/8/8/8/8/8/8/4K3 b - - 3 12").expect("FEN should parse");
        assert_eq!(game.ply, 23);

        let game = parse_fen("4k3/8/8/8/8/8/8/4K3 w - - 3 12").expect("FEN should parse");
        assert_eq!(game.ply, 22);
    }

    #[test]
    fn bad_fens_are_rejected() {
        for bad in [
            "",
            "4k3/8/8/8/8/8/8 w - -",
            "9k3/8/8/8/8/8/8/4K3 w - -",
            "4k3/8/8/8/8/8/8/4K3 x - -",
            "4k3/8/8/8/8/8/8/4K3 w X -",
            "4k3/8/8/8/8/8/8/4K3 w - e9",
            "4k3/8/8/8/8/8/8/4K3 w - - x 1",
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1 extra",
        ] {
            assert!(parse_fen(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
