//! Turn counter advancement.

use serde::{Deserialize, Serialize};

use crate::context::EngineContext;

/// Result of a turn advance.
///
/// `current_player_index` and `round` are `None` when no turn order is
/// enforced; only the turn counter moves then.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnAdvance {
    pub turn: u64,
    pub current_player_index: Option<usize>,
    pub round: Option<u64>,
}

/// Computes the next turn counter, player index, and round increment.
///
/// Pure function of the context; hook sequencing is the caller's job.
/// Wrapping the player index back to 0 increments the round.
pub fn compute_next_turn(ctx: &EngineContext) -> TurnAdvance {
    if ctx.turn_order.is_empty() {
        return TurnAdvance {
            turn: ctx.turn + 1,
            current_player_index: None,
            round: None,
        };
    }

    let next = (ctx.current_player_index + 1) % ctx.turn_order.len();
    TurnAdvance {
        turn: ctx.turn + 1,
        current_player_index: Some(next),
        round: (next == 0).then_some(ctx.round + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PlayerId;

    fn ctx_with_order(players: &[&str], index: usize) -> EngineContext {
        let mut ctx = EngineContext::new();
        ctx.turn_order = players.iter().map(|p| PlayerId::from(*p)).collect();
        ctx.current_player_index = index;
        ctx.turn = 1;
        ctx.round = 1;
        ctx
    }

    #[test]
    fn empty_turn_order_only_bumps_turn() {
        let mut ctx = EngineContext::new();
        ctx.turn = 7;
        let advance = compute_next_turn(&ctx);
        assert_eq!(advance.turn, 8);
        assert_eq!(advance.current_player_index, None);
        assert_eq!(advance.round, None);
    }

    #[test]
    fn full_pass_of_turn_order_increments_round_once() {
        let mut ctx = ctx_with_order(&["p1", "p2", "p3"], 0);
        let mut round_bumps = 0;
        for _ in 0..3 {
            let advance = compute_next_turn(&ctx);
            ctx.turn = advance.turn;
            ctx.current_player_index = advance.current_player_index.unwrap();
            if let Some(round) = advance.round {
                ctx.round = round;
                round_bumps += 1;
            }
        }
        assert_eq!(ctx.current_player_index, 0);
        assert_eq!(round_bumps, 1);
        assert_eq!(ctx.round, 2);
    }

    #[test]
    fn last_player_wraps_to_first_and_bumps_round() {
        let mut ctx = ctx_with_order(&["p1", "p2", "p3"], 2);
        ctx.turn = 5;
        let advance = compute_next_turn(&ctx);
        assert_eq!(advance.turn, 6);
        assert_eq!(advance.current_player_index, Some(0));
        assert_eq!(advance.round, Some(2));
    }

    #[test]
    fn single_player_order_wraps_every_turn() {
        let ctx = ctx_with_order(&["solo"], 0);
        let advance = compute_next_turn(&ctx);
        assert_eq!(advance.current_player_index, Some(0));
        assert_eq!(advance.round, Some(2));
    }
}
