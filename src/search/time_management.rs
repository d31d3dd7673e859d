//! Per-move time budgeting.
//!
//! The UCI layer passes raw clock data through `GoParams`; this module turns
//! it into a single wall-clock budget for the searcher.

use crate::game_state::chess_types::Color;
use crate::game_state::game_state::GameState;

/// Parsed `go` arguments.
#[derive(Debug, Clone, Default)]
pub struct GoParams {
    pub depth: Option<u8>,
    pub movetime_ms: Option<u64>,
    pub infinite: bool,
    pub wtime_ms: Option<u64>,
    pub btime_ms: Option<u64>,
    pub winc_ms: Option<u64>,
    pub binc_ms: Option<u64>,
    pub movestogo: Option<u16>,
}

const MIN_BUDGET_MS: u64 = 100;
const MAX_BUDGET_MS: u64 = 600_000;
const DEFAULT_BUDGET_MS: u64 = 300_000;

/// Resolve the wall-clock budget for one move. `None` means search without a
/// deadline (`go infinite`).
pub fn resolve_move_time(game_state: &GameState, params: &GoParams) -> Option<u64> {
    if let Some(movetime) = params.movetime_ms {
        return Some(movetime);
    }
    if params.infinite {
        return None;
    }

    let (remaining, increment) = match game_state.side_to_move {
        Color::White => (params.wtime_ms, params.winc_ms),
        Color::Black => (params.btime_ms, params.binc_ms),
    };

    let Some(remaining) = remaining.filter(|&ms| ms > 0) else {
        return Some(DEFAULT_BUDGET_MS);
    };

    let moves_remaining = match params.movestogo {
        Some(mtg) => u64::from(mtg.max(1)),
        None => {
            if game_state.occupancy_all.count_ones() > 20 {
                30
            } else {
                10
            }
        }
    };

    let base = remaining / moves_remaining * 12 / 10;
    let increment_bonus = increment.unwrap_or(0) * 3 / 4;
    let cap = remaining * 10 / 11;

    Some(cap.min(base + increment_bonus).clamp(MIN_BUDGET_MS, MAX_BUDGET_MS))
}

#[cfg(test)]
mod tests {
    use super::{resolve_move_time, GoParams};
    use crate::game_state::game_state::GameState;

    #[test]
    fn movetime_passes_straight_through() {
        let game = GameState::new_game();
        let params = GoParams {
            movetime_ms: Some(1234),
            ..GoParams::default()
        };
        assert_eq!(resolve_move_time(&game, &params), Some(1234));
    }

    #[test]
    fn infinite_means_no_deadline() {
        let game = GameState::new_game();
        let params = GoParams {
            infinite: true,
            ..GoParams::default()
        };
        assert_eq!(resolve_move_time(&game, &params), None);
    }

    #[test]
    fn no_clock_data_gets_the_default_budget() {
        let game = GameState::new_game();
        assert_eq!(resolve_move_time(&game, &GoParams::default()), Some(300_000));
    }

    #[test]
    fn opening_clock_split_uses_thirty_moves() {
        // 32 pieces on the board, 60s on the clock: 60_000 / 30 * 1.2 = 2400ms.
        let game = GameState::new_game();
        let params = GoParams {
            wtime_ms: Some(60_000),
            ..GoParams::default()
        };
        assert_eq!(resolve_move_time(&game, &params), Some(2_400));
    }

    #[test]
    fn endgame_clock_split_uses_ten_moves() {
        let game = GameState::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1")
            .expect("FEN should parse");
        let params = GoParams {
            wtime_ms: Some(10_000),
            ..GoParams::default()
        };
        // 10_000 / 10 * 1.2 = 1200ms.
        assert_eq!(resolve_move_time(&game, &params), Some(1_200));
    }

    #[test]
    fn movestogo_overrides_the_heuristic_split() {
        let game = GameState::new_game();
        let params = GoParams {
            wtime_ms: Some(40_000),
            movestogo: Some(40),
            ..GoParams::default()
        };
        // 40_000 / 40 * 1.2 = 1200ms.
        assert_eq!(resolve_move_time(&game, &params), Some(1_200));
    }

    #[test]
    fn increment_adds_three_quarters() {
        let game = GameState::new_game();
        let params = GoParams {
            wtime_ms: Some(60_000),
            winc_ms: Some(1_000),
            ..GoParams::default()
        };
        assert_eq!(resolve_move_time(&game, &params), Some(2_400 + 750));
    }

    #[test]
    fn budget_is_clamped_and_capped() {
        let game = GameState::new_game();

        // Tiny clock: floor at 100ms even though the cap is lower than base.
        let params = GoParams {
            wtime_ms: Some(90),
            ..GoParams::default()
        };
        assert_eq!(resolve_move_time(&game, &params), Some(100));

        // Huge increment cannot push past remaining / 1.1.
        let params = GoParams {
            wtime_ms: Some(1_000),
            winc_ms: Some(60_000),
            ..GoParams::default()
        };
        assert_eq!(resolve_move_time(&game, &params), Some(909));
    }

    #[test]
    fn black_reads_its_own_clock() {
        let game = GameState::from_fen(
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1",
        )
        .expect("FEN should parse");
        let params = GoParams {
            wtime_ms: Some(1),
            btime_ms: Some(60_000),
            ..GoParams::default()
        };
        assert_eq!(resolve_move_time(&game, &params), Some(2_400));
    }
}
