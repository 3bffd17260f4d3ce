//! Cycle recipe generation
//!
//! Compiles [`WashParams`] into a flat list of operations. Rinse iterations
//! are unrolled so the sequencer only has to walk the list front to back.

use heapless::Vec;

use super::params::{ParamError, WashParams, WashStep, WaterLevel};
use crate::actuators::Valve;
use crate::config::CycleTiming;

/// Upper bound on operations in one recipe
pub const MAX_RECIPE_OPS: usize = 64;

/// One recipe operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Op {
    /// Publish a step change
    EnterStep(WashStep),
    OpenValve(Valve),
    CloseValve(Valve),
    /// Block until the water reaches the level
    WaitFill(WaterLevel),
    /// Alternate the drum for `duration_ms`, one CW and one CCW pulse per period
    Shake { duration_ms: u32, period_ms: u32 },
    /// Idle soak
    Delay { duration_ms: u32 },
    /// Run the drain pump for the configured dump time
    Dump,
    /// Pump soak, then spin CW, optionally pulsing the bleach valve
    Spin { duration_ms: u32, spray: bool },
}

pub type Recipe = Vec<Op, MAX_RECIPE_OPS>;

fn secs(s: u16) -> u32 {
    u32::from(s) * 1000
}

fn push(recipe: &mut Recipe, op: Op) {
    // Capacity covers MAX_RINSE_COUNT unrolled iterations
    let _ = recipe.push(op);
}

fn fill(recipe: &mut Recipe, valve: Valve, level: WaterLevel) {
    push(recipe, Op::OpenValve(valve));
    push(recipe, Op::WaitFill(level));
    push(recipe, Op::CloseValve(valve));
}

/// Build the operation list for a cycle
pub fn build_recipe(params: &WashParams, timing: &CycleTiming) -> Result<Recipe, ParamError> {
    params.validate()?;

    let mut recipe = Recipe::new();
    let level = params.water_level;
    let runs = |step: WashStep| step >= params.first_step;

    if runs(WashStep::Prewash) && params.prewash_s > 0 {
        fill(&mut recipe, Valve::Bleach, level);
        push(
            &mut recipe,
            Op::Shake {
                duration_ms: secs(params.prewash_s),
                period_ms: u32::from(params.prewash_shake_period_ms),
            },
        );
        if params.prewash_break_s > 0 {
            push(
                &mut recipe,
                Op::Delay {
                    duration_ms: secs(params.prewash_break_s),
                },
            );
        }
        push(&mut recipe, Op::Dump);
    }

    if runs(WashStep::Break) {
        push(&mut recipe, Op::EnterStep(WashStep::Break));
        fill(&mut recipe, Valve::Soap, level);
        if params.break_s > 0 {
            push(
                &mut recipe,
                Op::Delay {
                    duration_ms: secs(params.break_s),
                },
            );
        }
    }

    if runs(WashStep::Wash) {
        push(&mut recipe, Op::EnterStep(WashStep::Wash));
        push(
            &mut recipe,
            Op::Shake {
                duration_ms: secs(params.wash_s),
                period_ms: u32::from(params.wash_shake_period_ms),
            },
        );
        push(&mut recipe, Op::Dump);
    }

    if runs(WashStep::Rinse) {
        push(&mut recipe, Op::EnterStep(WashStep::Rinse));
        for i in 0..params.rinse_count {
            let valve = if i + 1 < params.rinse_count {
                Valve::Soap
            } else {
                Valve::Softener
            };
            fill(&mut recipe, valve, level);
            push(&mut recipe, Op::Dump);
            push(
                &mut recipe,
                Op::Spin {
                    duration_ms: secs(timing.rinse_spin_s),
                    spray: true,
                },
            );
        }
    }

    push(&mut recipe, Op::EnterStep(WashStep::Centrifuge));
    push(
        &mut recipe,
        Op::Spin {
            duration_ms: secs(params.centrifuge_s),
            spray: false,
        },
    );

    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::params::MAX_RINSE_COUNT;

    fn steps(recipe: &Recipe) -> heapless::Vec<WashStep, 8> {
        recipe
            .iter()
            .filter_map(|op| match op {
                Op::EnterStep(step) => Some(*step),
                _ => None,
            })
            .collect()
    }

    fn opened_valves(recipe: &Recipe) -> heapless::Vec<Valve, 16> {
        recipe
            .iter()
            .filter_map(|op| match op {
                Op::OpenValve(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_full_recipe_shape() {
        let params = WashParams::default();
        let recipe = build_recipe(&params, &CycleTiming::default()).unwrap();

        assert_eq!(
            steps(&recipe).as_slice(),
            &[
                WashStep::Break,
                WashStep::Wash,
                WashStep::Rinse,
                WashStep::Centrifuge
            ]
        );
        assert_eq!(recipe[0], Op::OpenValve(Valve::Bleach));
        assert_eq!(recipe[1], Op::WaitFill(WaterLevel::Low));
        assert_eq!(recipe[2], Op::CloseValve(Valve::Bleach));
        assert_eq!(
            recipe[3],
            Op::Shake {
                duration_ms: 240_000,
                period_ms: 882
            }
        );
        assert_eq!(
            recipe[4],
            Op::Delay {
                duration_ms: 900_000
            }
        );
        assert_eq!(recipe[5], Op::Dump);
        assert_eq!(
            *recipe.last().unwrap(),
            Op::Spin {
                duration_ms: 240_000,
                spray: false
            }
        );
    }

    #[test]
    fn test_rinse_valves() {
        let mut params = WashParams::default();
        params.rinse_count = 3;
        params.first_step = WashStep::Rinse;
        let recipe = build_recipe(&params, &CycleTiming::default()).unwrap();
        assert_eq!(
            opened_valves(&recipe).as_slice(),
            &[Valve::Soap, Valve::Soap, Valve::Softener]
        );
        let sprays = recipe
            .iter()
            .filter(|op| matches!(op, Op::Spin { spray: true, .. }))
            .count();
        assert_eq!(sprays, 3);
    }

    #[test]
    fn test_single_rinse_uses_softener() {
        let mut params = WashParams::default();
        params.rinse_count = 1;
        params.first_step = WashStep::Rinse;
        let recipe = build_recipe(&params, &CycleTiming::default()).unwrap();
        assert_eq!(opened_valves(&recipe).as_slice(), &[Valve::Softener]);
    }

    #[test]
    fn test_zero_prewash_starts_at_break() {
        let mut params = WashParams::default();
        params.prewash_s = 0;
        let recipe = build_recipe(&params, &CycleTiming::default()).unwrap();
        assert_eq!(recipe[0], Op::EnterStep(WashStep::Break));
        assert!(!opened_valves(&recipe).contains(&Valve::Bleach));
    }

    #[test]
    fn test_zero_breaks_skip_delays() {
        let mut params = WashParams::default();
        params.prewash_break_s = 0;
        params.break_s = 0;
        let recipe = build_recipe(&params, &CycleTiming::default()).unwrap();
        assert!(!recipe.iter().any(|op| matches!(op, Op::Delay { .. })));
    }

    #[test]
    fn test_first_step_skips_earlier_steps() {
        let mut params = WashParams::default();
        params.first_step = WashStep::Centrifuge;
        let recipe = build_recipe(&params, &CycleTiming::default()).unwrap();
        assert_eq!(recipe.len(), 2);
        assert_eq!(recipe[0], Op::EnterStep(WashStep::Centrifuge));
    }

    #[test]
    fn test_max_rinses_fit() {
        let mut params = WashParams::default();
        params.rinse_count = MAX_RINSE_COUNT;
        let recipe = build_recipe(&params, &CycleTiming::default()).unwrap();
        let spins = recipe
            .iter()
            .filter(|op| matches!(op, Op::Spin { .. }))
            .count();
        assert_eq!(spins, usize::from(MAX_RINSE_COUNT) + 1);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut params = WashParams::default();
        params.rinse_count = MAX_RINSE_COUNT + 1;
        assert_eq!(
            build_recipe(&params, &CycleTiming::default()),
            Err(ParamError::TooManyRinses)
        );
    }
}
