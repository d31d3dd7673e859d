//! GameState-to-FEN serialization, the inverse of the parser.

use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;
use crate::utils::algebraic::square_to_algebraic;

pub fn generate_fen(game_state: &GameState) -> String {
    let mut out = String::with_capacity(90);

    for rank in (0..8u8).rev() {
        let mut empty_run = 0u8;
        for file in 0..8u8 {
            match game_state.piece_on_square(rank * 8 + file) {
                None => empty_run += 1,
                Some((color, piece)) => {
                    if empty_run > 0 {
                        out.push((b'0' + empty_run) as char);
                        empty_run = 0;
                    }
                    out.push(fen_char(color, piece));
                }
            }
        }
        if empty_run > 0 {
            out.push((b'0' + empty_run) as char);
        }
        if rank > 0 {
            out.push('/');
        }
    }

    out.push(' ');
    out.push(match game_state.side_to_move {
        Color::White => 'w',
        Color::Black => 'b',
    });

    out.push(' ');
    if game_state.castling_rights == 0 {
        out.push('-');
    } else {
        if game_state.castling_rights & CASTLE_WHITE_KINGSIDE != 0 {
            out.push('K');
        }
        if game_state.castling_rights & CASTLE_WHITE_QUEENSIDE != 0 {
            out.push('Q');
        }
        if game_state.castling_rights & CASTLE_BLACK_KINGSIDE != 0 {
            out.push('k');
        }
        if game_state.castling_rights & CASTLE_BLACK_QUEENSIDE != 0 {
            out.push('q');
        }
    }

    out.push(' ');
    match game_state.en_passant_square {
        None => out.push('-'),
        Some(sq) => out.push_str(&square_to_algebraic(sq)),
    }

    out.push(' ');
    out.push_str(&game_state.halfmove_clock.to_string());
    out.push(' ');
    out.push_str(&game_state.fullmove_number.to_string());

    out
}

fn fen_char(color: Color, piece: PieceKind) -> char {
    let lower = match piece {
        PieceKind::Pawn => 'p',
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        PieceKind::King => 'k',
    };
    match color {
        Color::White => lower.to_ascii_uppercase(),
        Color::Black => lower,
    }
}

#[cfg(test)]
mod tests {
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;
    use crate::game_state::game_state::GameState;

    #[test]
    fn fens_round_trip_through_parse_and_generate() {
        let fens = [
            STARTING_POSITION_FEN,
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 b - - 11 40",
        ];
        for fen in fens {
            let game = GameState::from_fen(fen).expect("FEN should parse");
            assert_eq!(game.to_fen(), fen);
        }
    }
}
