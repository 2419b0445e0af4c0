//! Phase graph derivation and phase advancement.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::context::EngineContext;

/// Initial phase and linear phase order, derived once per configuration.
///
/// The walk follows `next` pointers from the initial phase and stops on a
/// missing pointer, a target that is not declared, or a revisit. Cycles and
/// dangling pointers therefore truncate the order silently instead of
/// erroring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhasePlan {
    initial: Option<String>,
    order: Vec<String>,
}

impl PhasePlan {
    pub fn from_config<S>(config: &GameConfig<S>) -> Self {
        let initial = config
            .phases()
            .iter()
            .find(|p| p.is_start())
            .or_else(|| config.phases().first())
            .map(|p| p.name().to_owned());

        let mut order = Vec::new();
        if let Some(start) = initial.as_deref() {
            let mut name = start;
            loop {
                order.push(name.to_owned());
                let Some(next) = config.phase(name).and_then(|p| p.next_phase()) else {
                    break;
                };
                if config.phase(next).is_none() || order.iter().any(|seen| seen == next) {
                    break;
                }
                name = next;
            }
        }

        Self { initial, order }
    }

    /// `None` only when no phases are configured.
    pub fn initial_phase(&self) -> Option<&str> {
        self.initial.as_deref()
    }

    pub fn ordered(&self) -> &[String] {
        &self.order
    }
}

/// Result of a phase advance: the phase to enter and, on a wrap of the
/// derived order, the incremented round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseAdvance {
    pub phase: String,
    pub round: Option<u64>,
}

/// Computes the next phase from the context's stored phase order.
///
/// An explicit non-empty `target` wins and implies no round logic (jumping
/// to an arbitrary phase is not a wrap). Otherwise the next entry of the
/// derived order is taken, treating an unknown current phase as index 0;
/// wrapping back to the first entry increments the round. With no order and
/// no target the advance is a no-op and `None` is returned.
pub fn compute_next_phase(ctx: &EngineContext, target: Option<&str>) -> Option<PhaseAdvance> {
    if let Some(target) = target.filter(|t| !t.is_empty()) {
        return Some(PhaseAdvance {
            phase: target.to_owned(),
            round: None,
        });
    }

    if ctx.phases.is_empty() {
        return None;
    }

    let index = ctx.phases.iter().position(|p| *p == ctx.phase).unwrap_or(0);
    let next = (index + 1) % ctx.phases.len();
    Some(PhaseAdvance {
        phase: ctx.phases[next].clone(),
        round: (next == 0).then_some(ctx.round + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhaseConfig;

    type Unit = ();

    fn chain(names: &[(&str, Option<&str>)], start: Option<&str>) -> GameConfig<Unit> {
        let mut builder = GameConfig::builder();
        for (name, next) in names {
            let mut phase = PhaseConfig::new(*name);
            if let Some(next) = next {
                phase = phase.next(*next);
            }
            if start == Some(*name) {
                phase = phase.start();
            }
            builder = builder.phase(phase);
        }
        builder.build().unwrap()
    }

    #[test]
    fn start_flag_wins_over_declaration_order() {
        let config = chain(
            &[("deal", Some("act")), ("act", None), ("bet", Some("deal"))],
            Some("bet"),
        );
        let plan = PhasePlan::from_config(&config);
        assert_eq!(plan.initial_phase(), Some("bet"));
        assert_eq!(plan.ordered().to_vec(), ["bet", "deal", "act"]);
    }

    #[test]
    fn first_declared_phase_is_default_initial() {
        let config = chain(&[("draw", Some("discard")), ("discard", None)], None);
        let plan = PhasePlan::from_config(&config);
        assert_eq!(plan.initial_phase(), Some("draw"));
        assert_eq!(plan.ordered().to_vec(), ["draw", "discard"]);
    }

    #[test]
    fn cycle_truncates_instead_of_erroring() {
        let config = chain(
            &[
                ("bet", Some("deal")),
                ("deal", Some("act")),
                ("act", Some("bet")),
            ],
            Some("bet"),
        );
        let plan = PhasePlan::from_config(&config);
        assert_eq!(plan.ordered().to_vec(), ["bet", "deal", "act"]);
    }

    #[test]
    fn dangling_next_truncates() {
        let config = chain(&[("bet", Some("nowhere")), ("act", None)], Some("bet"));
        let plan = PhasePlan::from_config(&config);
        assert_eq!(plan.ordered().to_vec(), ["bet"]);
    }

    #[test]
    fn no_phases_means_no_plan() {
        let config = GameConfig::<Unit>::builder().build().unwrap();
        let plan = PhasePlan::from_config(&config);
        assert_eq!(plan.initial_phase(), None);
        assert!(plan.ordered().is_empty());
    }

    #[test]
    fn explicit_target_skips_round_logic() {
        let mut ctx = EngineContext::new();
        ctx.phases = vec!["bet".into(), "deal".into()];
        ctx.phase = "deal".into();
        ctx.round = 3;

        let advance = compute_next_phase(&ctx, Some("act")).unwrap();
        assert_eq!(advance.phase, "act");
        assert_eq!(advance.round, None);
    }

    #[test]
    fn wrap_to_first_phase_increments_round() {
        let mut ctx = EngineContext::new();
        ctx.phases = vec!["bet".into(), "deal".into(), "act".into(), "resolve".into()];
        ctx.phase = "resolve".into();
        ctx.round = 1;

        let advance = compute_next_phase(&ctx, None).unwrap();
        assert_eq!(advance.phase, "bet");
        assert_eq!(advance.round, Some(2));
    }

    #[test]
    fn unknown_current_phase_is_treated_as_first() {
        let mut ctx = EngineContext::new();
        ctx.phases = vec!["bet".into(), "deal".into()];
        ctx.phase = "limbo".into();

        let advance = compute_next_phase(&ctx, None).unwrap();
        assert_eq!(advance.phase, "deal");
        assert_eq!(advance.round, None);
    }

    #[test]
    fn no_order_and_no_target_is_a_noop() {
        let ctx = EngineContext::new();
        assert_eq!(compute_next_phase(&ctx, None), None);
    }
}
