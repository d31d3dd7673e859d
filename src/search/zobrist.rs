//! Zobrist position keys.
//!
//! The key material is built at compile time from a fixed xorshift64* stream,
//! like the knight and king attack tables, so hashes are deterministic across
//! runs and builds. That keeps tests and transposition-table behavior
//! reproducible.

use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;

const KEY_STREAM_SEED: u64 = 0xC3A5_C85C_97CB_3127;
const PIECE_SQUARE_KEYS: usize = 2 * 6 * 64;

struct ZobristKeys {
    // Flat, indexed (color * 6 + kind) * 64 + square.
    piece_square: [u64; PIECE_SQUARE_KEYS],
    side_to_move: u64,
    castling: [u64; 16],
    en_passant_file: [u64; 8],
}

static KEYS: ZobristKeys = generate_keys();

const fn generate_keys() -> ZobristKeys {
    let mut state = KEY_STREAM_SEED;

    let mut piece_square = [0u64; PIECE_SQUARE_KEYS];
    let mut i = 0;
    while i < PIECE_SQUARE_KEYS {
        state = advance(state);
        piece_square[i] = scramble(state);
        i += 1;
    }

    state = advance(state);
    let side_to_move = scramble(state);

    let mut castling = [0u64; 16];
    let mut i = 0;
    while i < 16 {
        state = advance(state);
        castling[i] = scramble(state);
        i += 1;
    }

    let mut en_passant_file = [0u64; 8];
    let mut i = 0;
    while i < 8 {
        state = advance(state);
        en_passant_file[i] = scramble(state);
        i += 1;
    }

    ZobristKeys {
        piece_square,
        side_to_move,
        castling,
        en_passant_file,
    }
}

const fn advance(mut state: u64) -> u64 {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}

const fn scramble(state: u64) -> u64 {
    state.wrapping_mul(0x2545_F491_4F6C_DD1D)
}

#[inline]
fn piece_square_key(color: Color, piece: PieceKind, square: usize) -> u64 {
    KEYS.piece_square[(color.index() * 6 + piece.index()) * 64 + square]
}

/// Full key for the position: piece placement, side to move, castling rights,
/// and en-passant file. Equal positions always produce equal keys.
pub fn compute_key(game_state: &GameState) -> u64 {
    let mut key = 0u64;

    for color in [Color::White, Color::Black] {
        for piece in PieceKind::ALL {
            let mut bb = game_state.pieces[color.index()][piece.index()];
            while bb != 0 {
                let sq = bb.trailing_zeros() as usize;
                bb &= bb - 1;
                key ^= piece_square_key(color, piece, sq);
            }
        }
    }

    if game_state.side_to_move == Color::Black {
        key ^= KEYS.side_to_move;
    }

    key ^= KEYS.castling[(game_state.castling_rights & 0x0F) as usize];

    if let Some(ep) = game_state.en_passant_square {
        key ^= KEYS.en_passant_file[(ep % 8) as usize];
    }

    key
}

#[cfg(test)]
mod tests {
    use super::{compute_key, KEYS, PIECE_SQUARE_KEYS};
    use crate::game_state::game_state::GameState;

    #[test]
    fn the_key_stream_never_degenerates_to_zero() {
        assert!(KEYS.piece_square.iter().all(|&key| key != 0));
        assert!(KEYS.castling.iter().all(|&key| key != 0));
        assert!(KEYS.en_passant_file.iter().all(|&key| key != 0));
        assert_ne!(KEYS.side_to_move, 0);

        // A quick duplicate probe over the largest table.
        let mut sorted: Vec<u64> = KEYS.piece_square.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), PIECE_SQUARE_KEYS);
    }

    #[test]
    fn equal_positions_have_equal_keys() {
        let a = GameState::new_game();
        let b = GameState::new_game();
        assert_eq!(compute_key(&a), compute_key(&b));
        assert_ne!(compute_key(&a), 0);
    }

    #[test]
    fn side_to_move_changes_the_key() {
        let white = GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1")
            .expect("FEN should parse");
        let black = GameState::from_fen("4k3/8/8/8/8/8/8/4K3 b - - 0 1")
            .expect("FEN should parse");
        assert_ne!(compute_key(&white), compute_key(&black));
    }

    #[test]
    fn castling_rights_and_en_passant_change_the_key() {
        let all_rights = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1")
            .expect("FEN should parse");
        let no_rights = GameState::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1")
            .expect("FEN should parse");
        assert_ne!(compute_key(&all_rights), compute_key(&no_rights));

        let with_ep = GameState::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2")
            .expect("FEN should parse");
        let without_ep = GameState::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 2")
            .expect("FEN should parse");
        assert_ne!(compute_key(&with_ep), compute_key(&without_ep));
    }

    #[test]
    fn key_tracks_make_and_unmake() {
        use crate::move_generation::legal_move_apply::{make_move_in_place, unmake_move_in_place};
        use crate::move_generation::legal_move_generator::generate_legal_moves;

        let mut game = GameState::new_game();
        let initial = game.zobrist_key;
        assert_eq!(initial, compute_key(&game));

        let mv = generate_legal_moves(&mut game).expect("movegen should succeed")[0];
        make_move_in_place(&mut game, mv).expect("make should succeed");
        assert_eq!(game.zobrist_key, compute_key(&game));
        assert_ne!(game.zobrist_key, initial);

        unmake_move_in_place(&mut game).expect("unmake should succeed");
        assert_eq!(game.zobrist_key, initial);
    }
}
