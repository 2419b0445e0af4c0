use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use parlor_core::{
    ActionId, ConfigError, Engine, GameConfig, GameStatus, HookPoint, MoveError, PendingAction,
    PhaseConfig, PlayerId, RejectReason,
};

#[derive(Clone, Debug, Default, PartialEq)]
struct Tally {
    score: i64,
    log: Vec<String>,
}

fn action(id: &str, kind: &str, payload: Value, submitter: &str, at: i64) -> PendingAction {
    PendingAction {
        id: ActionId::from(id),
        kind: kind.to_owned(),
        payload,
        submitter: PlayerId::from(submitter),
        created_at: DateTime::<Utc>::from_timestamp(at, 0).unwrap(),
    }
}

fn players(names: &[&str]) -> Vec<PlayerId> {
    names.iter().map(|n| PlayerId::from(*n)).collect()
}

/// Poker-style four-phase cycle with an `increment` move in `play`.
fn counting_engine() -> Engine<Tally> {
    let config = GameConfig::builder()
        .phase(
            PhaseConfig::new("play")
                .start()
                .next("score")
                .on_move("increment", |state: &Tally, _mctx, payload| {
                    let amount = payload["amount"].as_i64().unwrap_or(0);
                    let mut next = state.clone();
                    next.score += amount;
                    Ok(next)
                }),
        )
        .phase(PhaseConfig::new("score").next("play"))
        .build()
        .unwrap();
    Engine::new(config)
}

#[test]
fn end_turn_wraps_player_index_and_bumps_round() {
    let engine = counting_engine();
    let mut ctx = engine.waiting_context();
    ctx.set_status(GameStatus::Active);
    ctx.turn_order = players(&["p1", "p2", "p3"]);
    ctx.current_player_index = 2;
    ctx.turn = 5;
    ctx.round = 1;

    let transition = engine.end_turn(&Tally::default(), &ctx);
    assert_eq!(transition.context.current_player_index, 0);
    assert_eq!(transition.context.turn, 6);
    assert_eq!(transition.context.round, 2);
    assert!(transition.faults.is_empty());
}

#[test]
fn end_phase_wraps_cycle_and_bumps_round() {
    let config = GameConfig::<Tally>::builder()
        .phase(PhaseConfig::new("bet").start().next("deal"))
        .phase(PhaseConfig::new("deal").next("act"))
        .phase(PhaseConfig::new("act").next("resolve"))
        .phase(PhaseConfig::new("resolve").next("bet"))
        .build()
        .unwrap();
    let engine = Engine::new(config);

    let mut ctx = engine.waiting_context();
    ctx.phase = "resolve".to_owned();
    ctx.round = 1;

    let transition = engine.end_phase(&Tally::default(), &ctx, None).unwrap();
    assert_eq!(transition.context.phase, "bet");
    assert_eq!(transition.context.round, 2);
}

#[test]
fn full_pass_of_phase_order_bumps_round_exactly_once() {
    let engine = counting_engine();
    let mut ctx = engine.waiting_context();
    ctx.round = 1;
    assert_eq!(ctx.phase, "play");

    let state = Tally::default();
    for _ in 0..2 {
        let transition = engine.end_phase(&state, &ctx, None).unwrap();
        ctx = transition.context;
    }
    assert_eq!(ctx.phase, "play");
    assert_eq!(ctx.round, 2);
}

#[test]
fn increment_move_is_applied_and_consumed() {
    let engine = counting_engine();
    let ctx = engine.waiting_context();

    let queue = vec![action("a1", "increment", json!({"amount": 2}), "p1", 1)];
    let outcome = engine.process_actions(&Tally::default(), &ctx, &queue);

    assert_eq!(outcome.state.score, 2);
    assert_eq!(outcome.consumed, vec![ActionId::from("a1")]);
    assert!(outcome.rejections.is_empty());
}

#[test]
fn unknown_move_is_never_consumed() {
    let engine = counting_engine();
    let ctx = engine.waiting_context();

    let queue = vec![action("a1", "unknownMove", json!({}), "p1", 1)];
    let outcome = engine.process_actions(&Tally::default(), &ctx, &queue);

    assert_eq!(outcome.state, Tally::default());
    assert!(outcome.consumed.is_empty());
    assert_eq!(outcome.rejections.len(), 1);
    assert!(matches!(
        outcome.rejections[0].reason,
        RejectReason::NotAllowed { .. }
    ));
}

#[test]
fn empty_batch_is_a_noop() {
    let engine = counting_engine();
    let ctx = engine.waiting_context();
    let state = Tally {
        score: 9,
        log: vec!["seed".to_owned()],
    };

    let outcome = engine.process_actions(&state, &ctx, &[]);
    assert_eq!(outcome.state, state);
    assert!(outcome.consumed.is_empty());
    assert!(outcome.rejections.is_empty());
}

#[test]
fn batch_applies_actions_in_queue_order() {
    let config = GameConfig::builder()
        .on_move("append", |state: &Tally, _mctx, payload| {
            let mut next = state.clone();
            next.log.push(payload.as_str().unwrap_or("?").to_owned());
            Ok(next)
        })
        .on_move("overwrite", |state: &Tally, _mctx, payload| {
            let mut next = state.clone();
            next.log = vec![payload.as_str().unwrap_or("?").to_owned()];
            Ok(next)
        })
        .build()
        .unwrap();
    let engine = Engine::new(config);
    let ctx = engine.waiting_context();

    let queue = vec![
        action("older", "append", json!("a"), "p1", 1),
        action("newer", "overwrite", json!("b"), "p2", 2),
    ];
    let outcome = engine.process_actions(&Tally::default(), &ctx, &queue);

    // Applying the overwrite first would leave ["b", "a"].
    assert_eq!(outcome.state.log, vec!["b".to_owned()]);
    assert_eq!(
        outcome.consumed,
        vec![ActionId::from("older"), ActionId::from("newer")]
    );
}

#[test]
fn rejected_action_does_not_block_later_ones() {
    let engine = counting_engine();
    let ctx = engine.waiting_context();

    let queue = vec![
        action("bad", "unknownMove", json!({}), "p1", 1),
        action("good", "increment", json!({"amount": 3}), "p1", 2),
    ];
    let outcome = engine.process_actions(&Tally::default(), &ctx, &queue);

    assert_eq!(outcome.state.score, 3);
    assert_eq!(outcome.consumed, vec![ActionId::from("good")]);
    assert_eq!(outcome.rejections.len(), 1);
}

#[test]
fn faulting_reducer_leaves_action_queued_and_state_unchanged() {
    let config = GameConfig::builder()
        .on_move("explode", |_state: &Tally, _mctx, _payload| {
            panic!("boom")
        })
        .on_move("refuse", |_state: &Tally, _mctx, _payload| {
            Err(MoveError::new("not now"))
        })
        .build()
        .unwrap();
    let engine = Engine::new(config);
    let ctx = engine.waiting_context();
    let state = Tally {
        score: 4,
        log: vec![],
    };

    let queue = vec![
        action("a1", "explode", json!({}), "p1", 1),
        action("a2", "refuse", json!({}), "p1", 2),
    ];
    let outcome = engine.process_actions(&state, &ctx, &queue);

    assert_eq!(outcome.state, state);
    assert!(outcome.consumed.is_empty());
    assert_eq!(outcome.rejections.len(), 2);
    assert!(matches!(outcome.rejections[0].reason, RejectReason::Fault(_)));
    assert!(matches!(outcome.rejections[1].reason, RejectReason::Fault(_)));
}

#[test]
fn global_move_is_allowed_in_every_phase_and_shadows_phase_moves() {
    let config = GameConfig::builder()
        .on_move("concede", |state: &Tally, _mctx, _payload| {
            let mut next = state.clone();
            next.log.push("global concede".to_owned());
            Ok(next)
        })
        .phase(
            PhaseConfig::new("play")
                .start()
                .on_move("concede", |state: &Tally, _mctx, _payload| {
                    let mut next = state.clone();
                    next.log.push("phase concede".to_owned());
                    Ok(next)
                }),
        )
        .phase(PhaseConfig::new("score"))
        .build()
        .unwrap();
    let engine = Engine::new(config);

    let mut ctx = engine.waiting_context();
    let outcome = engine.process_actions(
        &Tally::default(),
        &ctx,
        &[action("a1", "concede", json!({}), "p1", 1)],
    );
    assert_eq!(outcome.state.log, vec!["global concede".to_owned()]);

    ctx.phase = "score".to_owned();
    let outcome = engine.process_actions(
        &Tally::default(),
        &ctx,
        &[action("a2", "concede", json!({}), "p1", 1)],
    );
    assert_eq!(outcome.consumed, vec![ActionId::from("a2")]);
}

#[test]
fn turn_hooks_see_outgoing_then_incoming_context() {
    let config = GameConfig::builder()
        .on_turn_end(|state: &Tally, ctx| {
            let mut next = state.clone();
            next.log.push(format!("end turn {}", ctx.turn));
            Ok(next)
        })
        .on_turn_begin(|state: &Tally, ctx| {
            let mut next = state.clone();
            next.log.push(format!("begin turn {}", ctx.turn));
            Ok(next)
        })
        .build()
        .unwrap();
    let engine = Engine::new(config);

    let mut ctx = engine.waiting_context();
    ctx.turn = 5;

    let transition = engine.end_turn(&Tally::default(), &ctx);
    assert_eq!(
        transition.state.log,
        vec!["end turn 5".to_owned(), "begin turn 6".to_owned()]
    );
}

#[test]
fn phase_hooks_see_leaving_then_entering_phase() {
    let config = GameConfig::builder()
        .phase(
            PhaseConfig::new("bet")
                .start()
                .next("deal")
                .on_end(|state: &Tally, ctx| {
                    let mut next = state.clone();
                    next.log.push(format!("leaving {}", ctx.phase));
                    Ok(next)
                }),
        )
        .phase(PhaseConfig::new("deal").next("bet").on_begin(
            |state: &Tally, ctx| {
                let mut next = state.clone();
                next.log.push(format!("entering {}", ctx.phase));
                Ok(next)
            },
        ))
        .build()
        .unwrap();
    let engine = Engine::new(config);
    let ctx = engine.waiting_context();

    let transition = engine.end_phase(&Tally::default(), &ctx, None).unwrap();
    assert_eq!(
        transition.state.log,
        vec!["leaving bet".to_owned(), "entering deal".to_owned()]
    );
    assert_eq!(transition.context.phase, "deal");
}

#[test]
fn faulting_hook_still_advances_counters() {
    let config = GameConfig::builder()
        .on_turn_end(|state: &Tally, _ctx| {
            let mut next = state.clone();
            next.log.push("on_end ran".to_owned());
            Ok(next)
        })
        .on_turn_begin(|_state: &Tally, _ctx| Err(MoveError::new("broken hook")))
        .build()
        .unwrap();
    let engine = Engine::new(config);

    let mut ctx = engine.waiting_context();
    ctx.turn = 3;

    let transition = engine.end_turn(&Tally::default(), &ctx);
    assert_eq!(transition.context.turn, 4);
    assert_eq!(transition.state.log, vec!["on_end ran".to_owned()]);
    assert_eq!(transition.faults.len(), 1);
    assert_eq!(transition.faults[0].hook, HookPoint::TurnBegin);
}

#[test]
fn end_phase_without_phases_or_target_is_a_noop() {
    let engine = Engine::new(GameConfig::<Tally>::builder().build().unwrap());
    let ctx = engine.waiting_context();
    assert!(engine.end_phase(&Tally::default(), &ctx, None).is_none());
}

#[test]
fn end_phase_with_explicit_target_jumps_without_round_bump() {
    let engine = counting_engine();
    let mut ctx = engine.waiting_context();
    ctx.round = 7;

    let transition = engine
        .end_phase(&Tally::default(), &ctx, Some("score"))
        .unwrap();
    assert_eq!(transition.context.phase, "score");
    assert_eq!(transition.context.round, 7);
}

#[test]
fn start_runs_setup_then_phase_begin_then_turn_begin() {
    let config = GameConfig::builder()
        .setup(|sctx| Tally {
            score: sctx.players.len() as i64,
            log: vec!["setup".to_owned()],
        })
        .on_turn_begin(|state: &Tally, _ctx| {
            let mut next = state.clone();
            next.log.push("turn begin".to_owned());
            Ok(next)
        })
        .phase(PhaseConfig::new("play").start().on_begin(
            |state: &Tally, ctx| {
                let mut next = state.clone();
                next.log.push(format!("phase begin {}", ctx.phase));
                Ok(next)
            },
        ))
        .build()
        .unwrap();
    let engine = Engine::new(config);

    let transition = engine.start(&players(&["p1", "p2"]));
    assert_eq!(transition.context.status, GameStatus::Active);
    assert_eq!(transition.context.turn, 1);
    assert_eq!(transition.context.round, 1);
    assert_eq!(transition.context.current_player_index, 0);
    assert_eq!(transition.context.phase, "play");
    assert_eq!(transition.state.score, 2);
    assert_eq!(
        transition.state.log,
        vec![
            "setup".to_owned(),
            "phase begin play".to_owned(),
            "turn begin".to_owned()
        ]
    );
}

#[test]
fn panicking_setup_falls_back_to_default_state() {
    let config = GameConfig::builder()
        .setup(|_sctx| -> Tally { panic!("bad setup") })
        .build()
        .unwrap();
    let engine = Engine::new(config);

    let transition = engine.start(&players(&["p1"]));
    assert_eq!(transition.state, Tally::default());
    assert_eq!(transition.faults.len(), 1);
    assert_eq!(transition.faults[0].hook, HookPoint::Setup);
}

#[test]
fn finish_marks_the_game_ended() {
    let engine = counting_engine();
    let mut ctx = engine.waiting_context();
    ctx.set_status(GameStatus::Active);

    let ended = engine.finish(&ctx);
    assert_eq!(ended.status, GameStatus::Ended);
    assert_eq!(ended.phase, ctx.phase);
}

#[test]
fn builder_rejects_two_start_phases() {
    let result = GameConfig::<Tally>::builder()
        .phase(PhaseConfig::new("bet").start())
        .phase(PhaseConfig::new("deal").start())
        .build();
    assert!(matches!(
        result,
        Err(ConfigError::MultipleStartPhases { ref first, ref second })
            if first == "bet" && second == "deal"
    ));
}

#[test]
fn builder_rejects_duplicate_phase_names() {
    let result = GameConfig::<Tally>::builder()
        .phase(PhaseConfig::new("bet"))
        .phase(PhaseConfig::new("bet"))
        .build();
    assert!(matches!(result, Err(ConfigError::DuplicatePhase(_))));
}
