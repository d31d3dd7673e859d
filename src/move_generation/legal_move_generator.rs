//! Legal move generation.
//!
//! Two phases: piece-wise pseudo-legal generation, then a legality filter that
//! makes each candidate, rejects those leaving the mover's king in check, and
//! unmakes.

use crate::errors::ChessResult;
use crate::game_state::chess_types::*;
use crate::game_state::game_state::GameState;
use crate::move_generation::legal_move_apply::{
    build_move, make_move_in_place, unmake_move_in_place,
};
use crate::move_generation::legal_move_checks::{is_king_in_check, is_square_attacked};
use crate::moves::bishop_moves::bishop_attacks;
use crate::moves::king_moves::king_attacks;
use crate::moves::knight_moves::knight_attacks;
use crate::moves::move_descriptions::{
    is_capture, FLAG_CAPTURE, FLAG_CASTLING, FLAG_DOUBLE_PAWN_PUSH, FLAG_EN_PASSANT,
};
use crate::moves::queen_moves::queen_attacks;
use crate::moves::rook_moves::rook_attacks;

pub fn generate_legal_moves(game_state: &mut GameState) -> ChessResult<Vec<Move>> {
    let mut pseudo = Vec::<Move>::with_capacity(128);

    generate_pawn_moves(game_state, &mut pseudo);
    generate_knight_moves(game_state, &mut pseudo);
    generate_slider_moves(game_state, &mut pseudo);
    generate_king_moves(game_state, &mut pseudo);

    let us = game_state.side_to_move;
    let mut legal = Vec::<Move>::with_capacity(pseudo.len());
    for mv in pseudo {
        make_move_in_place(game_state, mv)?;
        let keeps_king_safe = !is_king_in_check(game_state, us);
        unmake_move_in_place(game_state)?;
        if keeps_king_safe {
            legal.push(mv);
        }
    }

    Ok(legal)
}

/// The capturing subset of the legal moves; en-passant captures included.
pub fn generate_captures(game_state: &mut GameState) -> ChessResult<Vec<Move>> {
    let mut moves = generate_legal_moves(game_state)?;
    moves.retain(|&mv| is_capture(mv));
    Ok(moves)
}

fn generate_pawn_moves(game_state: &GameState, out: &mut Vec<Move>) {
    let side = game_state.side_to_move;
    let enemy_occ = game_state.occupancy_by_color[side.opposite().index()];
    let empty = !game_state.occupancy_all;

    let (push_offset, start_rank, promotion_rank) = match side {
        Color::White => (8i16, 1u8, 7u8),
        Color::Black => (-8i16, 6u8, 0u8),
    };

    let mut pawns = game_state.pieces[side.index()][PieceKind::Pawn.index()];
    while pawns != 0 {
        let from = pawns.trailing_zeros() as Square;
        pawns &= pawns - 1;
        let file = from % 8;
        let rank = from / 8;

        // Pushes.
        let one_step = from as i16 + push_offset;
        if (0..64).contains(&one_step) {
            let to = one_step as Square;
            if (1u64 << to) & empty != 0 {
                if to / 8 == promotion_rank {
                    for promo in PieceKind::PROMOTIONS {
                        out.push(build_move(from, to, PieceKind::Pawn, None, Some(promo), 0));
                    }
                } else {
                    out.push(build_move(from, to, PieceKind::Pawn, None, None, 0));

                    if rank == start_rank {
                        let two_step = (from as i16 + 2 * push_offset) as Square;
                        if (1u64 << two_step) & empty != 0 {
                            out.push(build_move(
                                from,
                                two_step,
                                PieceKind::Pawn,
                                None,
                                None,
                                FLAG_DOUBLE_PAWN_PUSH,
                            ));
                        }
                    }
                }
            }
        }

        // Diagonal captures, including onto the en-passant target.
        for file_delta in [-1i16, 1i16] {
            if (file as i16 + file_delta) < 0 || (file as i16 + file_delta) > 7 {
                continue;
            }
            let target = from as i16 + push_offset + file_delta;
            if !(0..64).contains(&target) {
                continue;
            }
            let to = target as Square;
            let to_mask = 1u64 << to;

            if to_mask & enemy_occ != 0 {
                let captured = enemy_piece_on(game_state, to);
                if to / 8 == promotion_rank {
                    for promo in PieceKind::PROMOTIONS {
                        out.push(build_move(
                            from,
                            to,
                            PieceKind::Pawn,
                            captured,
                            Some(promo),
                            FLAG_CAPTURE,
                        ));
                    }
                } else {
                    out.push(build_move(from, to, PieceKind::Pawn, captured, None, FLAG_CAPTURE));
                }
            } else if game_state.en_passant_square == Some(to) {
                out.push(build_move(
                    from,
                    to,
                    PieceKind::Pawn,
                    Some(PieceKind::Pawn),
                    None,
                    FLAG_CAPTURE | FLAG_EN_PASSANT,
                ));
            }
        }
    }
}

fn generate_knight_moves(game_state: &GameState, out: &mut Vec<Move>) {
    let side = game_state.side_to_move;
    let own_occ = game_state.occupancy_by_color[side.index()];

    let mut knights = game_state.pieces[side.index()][PieceKind::Knight.index()];
    while knights != 0 {
        let from = knights.trailing_zeros() as Square;
        knights &= knights - 1;
        push_piece_moves(game_state, out, from, PieceKind::Knight, knight_attacks(from) & !own_occ);
    }
}

fn generate_slider_moves(game_state: &GameState, out: &mut Vec<Move>) {
    let side = game_state.side_to_move;
    let own_occ = game_state.occupancy_by_color[side.index()];
    let occupancy = game_state.occupancy_all;

    for (piece, attacks_fn) in [
        (PieceKind::Bishop, bishop_attacks as fn(u8, u64) -> u64),
        (PieceKind::Rook, rook_attacks as fn(u8, u64) -> u64),
        (PieceKind::Queen, queen_attacks as fn(u8, u64) -> u64),
    ] {
        let mut sliders = game_state.pieces[side.index()][piece.index()];
        while sliders != 0 {
            let from = sliders.trailing_zeros() as Square;
            sliders &= sliders - 1;
            push_piece_moves(game_state, out, from, piece, attacks_fn(from, occupancy) & !own_occ);
        }
    }
}

fn generate_king_moves(game_state: &GameState, out: &mut Vec<Move>) {
    let side = game_state.side_to_move;
    let own_occ = game_state.occupancy_by_color[side.index()];
    let king_bb = game_state.pieces[side.index()][PieceKind::King.index()];
    if king_bb == 0 {
        return;
    }

    let from = king_bb.trailing_zeros() as Square;
    push_piece_moves(game_state, out, from, PieceKind::King, king_attacks(from) & !own_occ);

    generate_castling_moves(game_state, out, from);
}

fn generate_castling_moves(game_state: &GameState, out: &mut Vec<Move>, king_from: Square) {
    let side = game_state.side_to_move;
    let enemy = side.opposite();

    // Cannot castle out of check.
    if is_square_attacked(game_state, king_from, enemy) {
        return;
    }

    let (home, kingside_right, queenside_right) = match side {
        Color::White => (4u8, CASTLE_WHITE_KINGSIDE, CASTLE_WHITE_QUEENSIDE),
        Color::Black => (60u8, CASTLE_BLACK_KINGSIDE, CASTLE_BLACK_QUEENSIDE),
    };
    if king_from != home {
        return;
    }

    if (game_state.castling_rights & kingside_right) != 0 {
        let between = (1u64 << (home + 1)) | (1u64 << (home + 2));
        if (game_state.occupancy_all & between) == 0
            && !is_square_attacked(game_state, home + 1, enemy)
            && !is_square_attacked(game_state, home + 2, enemy)
        {
            out.push(build_move(home, home + 2, PieceKind::King, None, None, FLAG_CASTLING));
        }
    }

    if (game_state.castling_rights & queenside_right) != 0 {
        // The B-file square must be empty but need not be safe.
        let between = (1u64 << (home - 1)) | (1u64 << (home - 2)) | (1u64 << (home - 3));
        if (game_state.occupancy_all & between) == 0
            && !is_square_attacked(game_state, home - 1, enemy)
            && !is_square_attacked(game_state, home - 2, enemy)
        {
            out.push(build_move(home, home - 2, PieceKind::King, None, None, FLAG_CASTLING));
        }
    }
}

fn push_piece_moves(
    game_state: &GameState,
    out: &mut Vec<Move>,
    from: Square,
    piece: PieceKind,
    mut attacks: u64,
) {
    let enemy_occ = game_state.occupancy_by_color[game_state.side_to_move.opposite().index()];

    while attacks != 0 {
        let to = attacks.trailing_zeros() as Square;
        attacks &= attacks - 1;

        if (1u64 << to) & enemy_occ != 0 {
            let captured = enemy_piece_on(game_state, to);
            out.push(build_move(from, to, piece, captured, None, FLAG_CAPTURE));
        } else {
            out.push(build_move(from, to, piece, None, None, 0));
        }
    }
}

fn enemy_piece_on(game_state: &GameState, square: Square) -> Option<PieceKind> {
    let enemy = game_state.side_to_move.opposite();
    let mask = 1u64 << square;
    PieceKind::ALL
        .into_iter()
        .find(|piece| (game_state.pieces[enemy.index()][piece.index()] & mask) != 0)
}
