//! Polyglot-format opening book.
//!
//! The file is a concatenation of fixed-width 16-byte entries: key (u64),
//! move (u16), weight (u16), learn (u32), all big-endian. Lookup gathers the
//! entries matching the position key and picks one at random weighted by
//! `weight`. A book move is only returned when it matches a currently legal
//! move, so a key collision or a mismatched encoding convention can never
//! inject an illegal move.

use std::fs;

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_rules::BOOK_PLY_LIMIT;
use crate::game_state::chess_types::{Move, PieceKind, Square};
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_generator::generate_legal_moves;
use crate::moves::move_descriptions::{move_from, move_promotion_piece, move_to};

const ENTRY_SIZE: usize = 16;

/// Rank-flip convention applied to the packed from/to squares. Book files
/// must be generated with the matching convention.
const SQUARE_FLIP: u16 = 0x38;

#[derive(Debug, Clone, Copy)]
pub struct BookEntry {
    pub key: u64,
    pub raw_move: u16,
    pub weight: u16,
    pub learn: u32,
}

#[derive(Debug)]
pub struct OpeningBook {
    entries: Vec<BookEntry>,
    rng: StdRng,
}

impl OpeningBook {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed-seed constructor for reproducible selection in tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            entries: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replace the current entries with the contents of `path`. Returns the
    /// number of entries loaded.
    pub fn load(&mut self, path: &str) -> ChessResult<usize> {
        let bytes = fs::read(path).map_err(|source| ChessError::BookIo {
            path: path.to_owned(),
            source,
        })?;
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(ChessError::BookTruncated {
                path: path.to_owned(),
            });
        }

        self.entries = bytes.chunks_exact(ENTRY_SIZE).map(parse_entry).collect();
        info!("opening book loaded from {path}: {} entries", self.entries.len());
        Ok(self.entries.len())
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Weighted-random book move for the current position, or `None` when the
    /// position is out of book.
    pub fn probe(&mut self, game_state: &mut GameState) -> ChessResult<Option<Move>> {
        if game_state.ply >= BOOK_PLY_LIMIT || self.entries.is_empty() {
            return Ok(None);
        }

        let key = game_state.zobrist_key;
        let matches: Vec<BookEntry> = self
            .entries
            .iter()
            .copied()
            .filter(|entry| entry.key == key)
            .collect();
        if matches.is_empty() {
            return Ok(None);
        }

        let total_weight: u32 = matches.iter().map(|entry| u32::from(entry.weight)).sum();
        let chosen = if total_weight == 0 {
            matches[self.rng.gen_range(0..matches.len())]
        } else {
            let mut roll = self.rng.gen_range(0..total_weight);
            let mut picked = matches[matches.len() - 1];
            for entry in &matches {
                if roll < u32::from(entry.weight) {
                    picked = *entry;
                    break;
                }
                roll -= u32::from(entry.weight);
            }
            picked
        };

        let (from, to, promotion) = decode_raw_move(chosen.raw_move);

        // Only a currently legal move may leave the book.
        let legal = generate_legal_moves(game_state)?;
        Ok(legal.into_iter().find(|&mv| {
            move_from(mv) == from && move_to(mv) == to && move_promotion_piece(mv) == promotion
        }))
    }
}

impl Default for OpeningBook {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_entry(chunk: &[u8]) -> BookEntry {
    let mut key = [0u8; 8];
    key.copy_from_slice(&chunk[0..8]);
    let mut raw_move = [0u8; 2];
    raw_move.copy_from_slice(&chunk[8..10]);
    let mut weight = [0u8; 2];
    weight.copy_from_slice(&chunk[10..12]);
    let mut learn = [0u8; 4];
    learn.copy_from_slice(&chunk[12..16]);

    BookEntry {
        key: u64::from_be_bytes(key),
        raw_move: u16::from_be_bytes(raw_move),
        weight: u16::from_be_bytes(weight),
        learn: u32::from_be_bytes(learn),
    }
}

fn decode_raw_move(raw: u16) -> (Square, Square, Option<PieceKind>) {
    let from = (((raw >> 6) & 0x3F) ^ SQUARE_FLIP) as Square;
    let to = ((raw & 0x3F) ^ SQUARE_FLIP) as Square;
    let promotion = match (raw >> 12) & 0x7 {
        1 => Some(PieceKind::Knight),
        2 => Some(PieceKind::Bishop),
        3 => Some(PieceKind::Rook),
        4 => Some(PieceKind::Queen),
        _ => None,
    };
    (from, to, promotion)
}

#[cfg(test)]
mod tests {
    use super::{decode_raw_move, OpeningBook};
    use crate::game_state::game_state::GameState;
    use crate::moves::move_descriptions::{move_from, move_to};
    use crate::utils::uci_moves::move_to_uci;

    /// Encode from/to with the reader's flip convention pre-applied, so the
    /// decode lands on the given squares.
    fn encode_entry(key: u64, from: u8, to: u8, weight: u16) -> [u8; 16] {
        let raw: u16 = ((u16::from(from) ^ 0x38) << 6) | (u16::from(to) ^ 0x38);
        let mut out = [0u8; 16];
        out[0..8].copy_from_slice(&key.to_be_bytes());
        out[8..10].copy_from_slice(&raw.to_be_bytes());
        out[10..12].copy_from_slice(&weight.to_be_bytes());
        out
    }

    fn book_from_bytes(bytes: &[u8], seed: u64) -> OpeningBook {
        let dir = std::env::temp_dir().join(format!("garnet_book_test_{seed}_{}", bytes.len()));
        std::fs::write(&dir, bytes).expect("book fixture should be writable");
        let mut book = OpeningBook::with_seed(seed);
        book.load(dir.to_str().expect("temp path should be unicode"))
            .expect("book fixture should load");
        std::fs::remove_file(&dir).ok();
        book
    }

    #[test]
    fn decode_applies_the_rank_flip() {
        // e2 = 12, e4 = 28 under the flip convention.
        let raw: u16 = ((12u16 ^ 0x38) << 6) | (28u16 ^ 0x38);
        let (from, to, promo) = decode_raw_move(raw);
        assert_eq!(from, 12);
        assert_eq!(to, 28);
        assert_eq!(promo, None);
    }

    #[test]
    fn probe_returns_a_legal_matching_move() {
        let mut game = GameState::new_game();
        let key = game.zobrist_key;
        let bytes = encode_entry(key, 12, 28, 100);
        let mut book = book_from_bytes(&bytes, 7);

        let mv = book
            .probe(&mut game)
            .expect("probe should succeed")
            .expect("book should hit the start position");
        assert_eq!(move_to_uci(mv), "e2e4");
    }

    #[test]
    fn probe_misses_on_unknown_keys_and_illegal_entries() {
        let mut game = GameState::new_game();

        let miss = encode_entry(0x1234_5678, 12, 28, 100);
        let mut book = book_from_bytes(&miss, 8);
        assert!(book.probe(&mut game).expect("probe should succeed").is_none());

        // Right key, but e2e5 is not a legal move: the entry is rejected.
        let illegal = encode_entry(game.zobrist_key, 12, 36, 100);
        let mut book = book_from_bytes(&illegal, 9);
        assert!(book.probe(&mut game).expect("probe should succeed").is_none());
    }

    #[test]
    fn weighted_selection_respects_the_entries() {
        let mut game = GameState::new_game();
        let key = game.zobrist_key;

        // Two candidate moves; one carries all of the weight.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&encode_entry(key, 12, 28, 0)); // e2e4, weight 0
        bytes.extend_from_slice(&encode_entry(key, 11, 27, 1000)); // d2d4
        let mut book = book_from_bytes(&bytes, 10);

        for _ in 0..8 {
            let mv = book
                .probe(&mut game)
                .expect("probe should succeed")
                .expect("book should hit");
            assert_eq!((move_from(mv), move_to(mv)), (11, 27));
        }
    }

    #[test]
    fn book_is_skipped_after_the_opening() {
        let mut game = GameState::new_game();
        let bytes = encode_entry(game.zobrist_key, 12, 28, 100);
        let mut book = book_from_bytes(&bytes, 11);

        game.ply = 20;
        assert!(book.probe(&mut game).expect("probe should succeed").is_none());
    }

    #[test]
    fn truncated_files_are_rejected() {
        let path = std::env::temp_dir().join("garnet_book_truncated_test");
        std::fs::write(&path, [0u8; 17]).expect("fixture should be writable");
        let mut book = OpeningBook::with_seed(1);
        assert!(book
            .load(path.to_str().expect("temp path should be unicode"))
            .is_err());
        std::fs::remove_file(&path).ok();
    }
}
