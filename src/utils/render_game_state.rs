//! ASCII board rendering for logs and test output.

use crate::game_state::chess_types::{Color, PieceKind};
use crate::game_state::game_state::GameState;

pub fn render_game_state(game_state: &GameState) -> String {
    let mut out = String::new();

    for rank in (0..8u8).rev() {
        out.push((b'1' + rank) as char);
        out.push(' ');
        for file in 0..8u8 {
            let glyph = match game_state.piece_on_square(rank * 8 + file) {
                None => '.',
                Some((color, piece)) => piece_glyph(color, piece),
            };
            out.push(glyph);
            out.push(' ');
        }
        out.push('\n');
    }
    out.push_str("  a b c d e f g h\n");

    out.push_str(match game_state.side_to_move {
        Color::White => "white to move",
        Color::Black => "black to move",
    });
    out.push('\n');

    out
}

fn piece_glyph(color: Color, piece: PieceKind) -> char {
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
