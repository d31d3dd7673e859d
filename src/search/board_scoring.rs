//! Static position evaluation.
//!
//! Search delegates leaf scoring to the `BoardScorer` trait so the heuristic
//! can be swapped without touching search code. `StandardScorer` combines
//! material, central occupancy, a pawn piece-square table, pawn structure,
//! rook placement, the bishop pair, king safety, and mobility.

use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_checks::king_square;
use crate::moves::bishop_moves::bishop_attacks;
use crate::moves::king_moves::king_attacks;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::pawn_moves::FILE_A;
use crate::moves::queen_moves::queen_attacks;
use crate::moves::rook_moves::rook_attacks;

pub const MATE_SCORE: i32 = 30_000;

pub trait BoardScorer: Send + Sync {
    /// Score from the perspective of the side to move.
    fn score(&self, game_state: &GameState) -> i32;
}

#[inline]
pub const fn piece_value(piece: PieceKind) -> i32 {
    match piece {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 20_000,
    }
}

const CENTER_MASK: u64 = (1 << 27) | (1 << 28) | (1 << 35) | (1 << 36); // d4 e4 d5 e5
const CENTER_BONUS: i32 = 20;
const BISHOP_PAIR_BONUS: i32 = 30;
const ROOK_OPEN_FILE_BONUS: i32 = 25;
const DOUBLED_PAWN_PENALTY: i32 = 15;
const ISOLATED_PAWN_PENALTY: i32 = 20;
const PASSED_PAWN_STEP_BONUS: i32 = 20;
const KING_SHIELD_BONUS: i32 = 20;
const KING_ZONE_PAWN_PENALTY: i32 = 15;
const MOBILITY_DIVISOR: i32 = 4;

// Indexed from White's viewpoint, A1 = 0. Black pawns read the vertically
// mirrored entry.
#[rustfmt::skip]
const PAWN_TABLE: [i32; 64] = [
     0,  0,  0,   0,   0,  0,  0,  0,
     5,  5,  5,   5,   5,  5,  5,  5,
     2,  2,  3,   3,   3,  3,  2,  2,
     0,  0,  0,   5,   5,  0,  0,  0,
     0,  0,  0,  -5,  -5,  0,  0,  0,
    -2, -2, -3, -10, -10, -3, -2, -2,
    -5, -5, -5, -15, -15, -5, -5, -5,
     0,  0,  0,   0,   0,  0,  0,  0,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScorer;

impl BoardScorer for StandardScorer {
    fn score(&self, game_state: &GameState) -> i32 {
        let mut score = 0i32;

        for color in [Color::White, Color::Black] {
            let sign = if color == Color::White { 1 } else { -1 };
            let own_pawns = game_state.pieces[color.index()][PieceKind::Pawn.index()];

            let bishops = game_state.pieces[color.index()][PieceKind::Bishop.index()];
            if bishops.count_ones() >= 2 {
                score += sign * BISHOP_PAIR_BONUS;
            }

            for piece in PieceKind::ALL {
                let mut bb = game_state.pieces[color.index()][piece.index()];
                while bb != 0 {
                    let sq = bb.trailing_zeros() as Square;
                    bb &= bb - 1;

                    let mut value = piece_value(piece);

                    if CENTER_MASK & (1u64 << sq) != 0 {
                        value += CENTER_BONUS;
                    }

                    match piece {
                        PieceKind::Pawn => {
                            value += pawn_structure_term(game_state, color, sq, own_pawns);
                        }
                        PieceKind::Rook => {
                            if own_pawns & file_mask(sq % 8) == 0 {
                                value += ROOK_OPEN_FILE_BONUS;
                            }
                        }
                        _ => {}
                    }

                    score += sign * value;
                }
            }

            let positional = king_safety(game_state, color)
                + mobility(game_state, color) / MOBILITY_DIVISOR;
            score += sign * positional;
        }

        match game_state.side_to_move {
            Color::White => score,
            Color::Black => -score,
        }
    }
}

fn pawn_structure_term(
    game_state: &GameState,
    color: Color,
    sq: Square,
    own_pawns: u64,
) -> i32 {
    let file = sq % 8;
    let rank = sq / 8;
    let mut term = match color {
        Color::White => PAWN_TABLE[sq as usize],
        Color::Black => PAWN_TABLE[63 - sq as usize],
    };

    let enemy_pawns = game_state.pieces[color.opposite().index()][PieceKind::Pawn.index()];
    if enemy_pawns & forward_span(color, sq) == 0 {
        let steps = match color {
            Color::White => i32::from(rank) - 1,
            Color::Black => 6 - i32::from(rank),
        };
        term += steps * PASSED_PAWN_STEP_BONUS;
    }

    if (own_pawns & file_mask(file)).count_ones() > 1 {
        term -= DOUBLED_PAWN_PENALTY;
    }

    if own_pawns & adjacent_files_mask(file) == 0 {
        term -= ISOLATED_PAWN_PENALTY;
    }

    term
}

fn king_safety(game_state: &GameState, color: Color) -> i32 {
    let Some(king_sq) = king_square(game_state, color) else {
        return 0;
    };
    let file = king_sq % 8;
    let rank = king_sq / 8;

    let own_pawns = game_state.pieces[color.index()][PieceKind::Pawn.index()];
    let enemy_pawns = game_state.pieces[color.opposite().index()][PieceKind::Pawn.index()];

    // The three squares directly in front of the king; none exist on the last
    // rank.
    let mut shield = 0u64;
    let shield_rank = match color {
        Color::White if rank < 7 => Some(rank + 1),
        Color::Black if rank > 0 => Some(rank - 1),
        _ => None,
    };
    if let Some(shield_rank) = shield_rank {
        for f in file.saturating_sub(1)..=(file + 1).min(7) {
            shield |= 1u64 << (shield_rank * 8 + f);
        }
    }

    let mut safety = (own_pawns & shield).count_ones() as i32 * KING_SHIELD_BONUS;
    safety -= (king_attacks(king_sq) & enemy_pawns).count_ones() as i32 * KING_ZONE_PAWN_PENALTY;
    safety
}

/// Empty squares attacked by the side's knights, bishops, rooks, and queens.
fn mobility(game_state: &GameState, color: Color) -> i32 {
    let occupancy = game_state.occupancy_all;
    let free = !occupancy;
    let mut count = 0i32;

    let mut knights = game_state.pieces[color.index()][PieceKind::Knight.index()];
    while knights != 0 {
        let sq = knights.trailing_zeros() as Square;
        knights &= knights - 1;
        count += (knight_attacks(sq) & free).count_ones() as i32;
    }

    for (piece, attacks_fn) in [
        (PieceKind::Bishop, bishop_attacks as fn(u8, u64) -> u64),
        (PieceKind::Rook, rook_attacks as fn(u8, u64) -> u64),
        (PieceKind::Queen, queen_attacks as fn(u8, u64) -> u64),
    ] {
        let mut bb = game_state.pieces[color.index()][piece.index()];
        while bb != 0 {
            let sq = bb.trailing_zeros() as Square;
            bb &= bb - 1;
            count += (attacks_fn(sq, occupancy) & free).count_ones() as i32;
        }
    }

    count
}

#[inline]
const fn file_mask(file: u8) -> u64 {
    FILE_A << file
}

fn adjacent_files_mask(file: u8) -> u64 {
    let mut mask = 0u64;
    if file > 0 {
        mask |= file_mask(file - 1);
    }
    if file < 7 {
        mask |= file_mask(file + 1);
    }
    mask
}

/// Same and adjacent files, ranks strictly ahead of `sq` for `color`.
fn forward_span(color: Color, sq: Square) -> u64 {
    let file = sq % 8;
    let rank = sq / 8;
    let lanes = file_mask(file) | adjacent_files_mask(file);

    match color {
        Color::White => {
            let mut span = 0u64;
            for r in (rank + 1)..8 {
                span |= 0xFFu64 << (r * 8);
            }
            span & lanes
        }
        Color::Black => {
            let mut span = 0u64;
            for r in 0..rank {
                span |= 0xFFu64 << (r * 8);
            }
            span & lanes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardScorer, StandardScorer};
    use crate::game_state::game_state::GameState;

    fn score(fen: &str) -> i32 {
        let game = GameState::from_fen(fen).expect("FEN should parse");
        StandardScorer.score(&game)
    }

    #[test]
    fn the_starting_position_is_balanced() {
        assert_eq!(score("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), 0);
    }

    #[test]
    fn mirrored_positions_evaluate_identically() {
        let cases = [
            (
                "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
                "rnbqkbnr/pppp1ppp/8/4p3/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            ),
            (
                "r3k3/1pp5/8/8/8/8/5PP1/3K2R1 w q - 0 1",
                "3k2r1/5pp1/8/8/8/8/1PP5/R3K3 b Q - 0 1",
            ),
            (
                "4k3/8/8/3NB3/8/8/2q5/4K3 w - - 0 1",
                "4k3/2Q5/8/8/3nb3/8/8/4K3 b - - 0 1",
            ),
        ];
        for (fen, mirrored) in cases {
            assert_eq!(score(fen), score(mirrored), "mirror pair {fen}");
        }
    }

    #[test]
    fn material_advantage_dominates() {
        // White is a queen up.
        assert!(score("4k3/8/8/8/8/8/8/3QK3 w - - 0 1") > 800);
        // Same position from Black's perspective is just as bad.
        assert!(score("4k3/8/8/8/8/8/8/3QK3 b - - 0 1") < -800);
    }

    #[test]
    fn a_further_advanced_passed_pawn_is_worth_more() {
        let e4 = score("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1");
        let e5 = score("4k3/8/8/4P3/8/8/8/4K3 w - - 0 1");
        assert!(e5 > e4);
        assert!(e4 > 0);
    }

    #[test]
    fn a_blocked_pawn_is_not_passed() {
        let passed = score("4k3/8/8/8/4P3/8/8/4K3 w - - 0 1");
        let blocked = score("4k3/4p3/8/8/4P3/8/8/4K3 w - - 0 1");
        assert!(passed > blocked);
    }

    #[test]
    fn doubled_and_isolated_pawns_are_penalized() {
        let healthy = score("4k3/8/8/8/8/8/3PP3/4K3 w - - 0 1");
        let doubled = score("4k3/8/8/8/3P4/3P4/8/4K3 w - - 0 1");
        assert!(healthy > doubled);
    }

    #[test]
    fn rook_prefers_the_open_file() {
        let open = score("4k3/8/8/8/8/8/4P3/R3K3 w - - 0 1");
        let closed = score("4k3/8/8/8/8/8/P7/R3K3 w - - 0 1");
        assert!(open > closed);
    }

    #[test]
    fn the_bishop_pair_earns_its_bonus() {
        let pair = score("4k3/8/8/8/8/8/8/2BBK3 w - - 0 1");
        let bishop_knight = score("4k3/8/8/8/8/8/8/2BNK3 w - - 0 1");
        assert!(pair > bishop_knight);
    }

    #[test]
    fn a_pawn_shield_helps_the_king() {
        let sheltered = score("4k3/8/8/8/8/8/5PPP/6K1 w - - 0 1");
        let bare = score("4k3/8/8/8/8/5PPP/8/6K1 w - - 0 1");
        assert!(sheltered > bare);
    }
}
