//! Production rate calculation.
//!
//! This module turns a game state into cookies per second. Every owned
//! modifier contributes its effects to the producer, global (`all`) or
//! mouse targets, grouped by precedence:
//!
//! 1. additive terms are summed onto the base value,
//! 2. percentage boosts are summed and applied once,
//! 3. multipliers (flat and synergy) scale the result.
//!
//! Nothing is cached here; synergies always read live producer counts.

use crate::bonus::LEVEL_BONUS;
use crate::catalog::Catalog;
use crate::models::{Effect, Precedence, ProducerId, Target};
use crate::state::GameState;

/// Value of a single click before any mouse effect.
pub const BASE_CLICK_VALUE: f64 = 1.0;

/// What one effect adds to its target for a given state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contribution {
    Add(f64),
    Percent(f64),
    Factor(f64),
}

/// Evaluates one effect against the current state.
///
/// # Arguments
///
/// * `effect` - The effect to evaluate
/// * `state` - Live producer counts are read from here
/// * `building_rate` - Summed producer rate, only read by [`Effect::RateShare`]
///
/// # Returns
///
/// The contribution, tagged with how it combines with the others.
pub fn contribution(effect: &Effect, state: &GameState, building_rate: f64) -> Contribution {
    match *effect {
        Effect::Add(amount) => Contribution::Add(amount),
        Effect::PerBuilding { amount, excluding } => {
            let excluded = excluding.map_or(0, |id| state.count(id) as u64);
            let counted = state.total_producers().saturating_sub(excluded);
            Contribution::Add(amount * counted as f64)
        }
        Effect::RateShare(share) => Contribution::Add(share * building_rate),
        Effect::Percent(percent) => Contribution::Percent(percent),
        Effect::Multiply(factor) => Contribution::Factor(factor),
        Effect::Synergy {
            source,
            per,
            percent,
        } => {
            let steps = (state.count(source) / per.max(1)) as f64;
            Contribution::Factor(1.0 + percent / 100.0 * steps)
        }
    }
}

/// Running totals of the contributions aimed at one target.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    additive: f64,
    percent: f64,
    factor: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Accumulator {
            additive: 0.0,
            percent: 0.0,
            factor: 1.0,
        }
    }
}

impl Accumulator {
    fn push(&mut self, contribution: Contribution) {
        match contribution {
            Contribution::Add(v) => self.additive += v,
            Contribution::Percent(v) => self.percent += v,
            Contribution::Factor(v) => self.factor *= v,
        }
    }

    fn apply(&self, base: f64) -> f64 {
        (base + self.additive) * (1.0 + self.percent / 100.0) * self.factor
    }
}

/// Rates of a state, split by source.
#[derive(Debug, Clone, PartialEq)]
pub struct RateBreakdown {
    /// Total rate of each producer type (count included), by producer id
    pub per_producer: Vec<f64>,
    /// Sum of all producers after global effects
    pub buildings: f64,
    /// Cookies earned by one click
    pub per_click: f64,
    /// Cookies per second from clicking
    pub baseline: f64,
}

impl RateBreakdown {
    pub fn total(&self) -> f64 {
        self.buildings + self.baseline
    }
}

/// Computes the full rate breakdown of a state.
///
/// # Arguments
///
/// * `state` - Owned producers, modifiers and lump levels
/// * `catalog` - Version data the ids in `state` refer to
/// * `click_rate` - Clicks per second on the big cookie
pub fn compute_breakdown(state: &GameState, catalog: &Catalog, click_rate: f64) -> RateBreakdown {
    let producer_count = catalog.producers().len();
    let mut per_unit = vec![Accumulator::default(); producer_count];
    let mut global = Accumulator::default();
    let mut mouse = Accumulator::default();

    // Owned modifiers iterate in catalog order, which fixes the multiplier order
    for &id in &state.modifiers {
        for (target, effect) in &catalog.modifier(id).effects {
            match target {
                Target::Producer(p) => {
                    if let Some(acc) = per_unit.get_mut(p.0) {
                        acc.push(contribution(effect, state, 0.0));
                    }
                }
                Target::All => global.push(contribution(effect, state, 0.0)),
                // Mouse effects may read the building rate; handled below
                Target::Mouse => {}
            }
        }
    }

    let mut per_producer = vec![0.0; producer_count];
    for id in catalog.producer_ids() {
        let count = state.count(id);
        if count == 0 {
            continue;
        }
        let base = catalog.base_rate_of(id);
        let mut acc = per_unit[id.0];
        acc.push(Contribution::Add(level_bonus(catalog, state, id)));
        per_producer[id.0] = acc.apply(base) * count as f64;
    }

    let summed: f64 = per_producer.iter().sum();
    let buildings = global.apply(summed).max(0.0);

    for &id in &state.modifiers {
        for (target, effect) in &catalog.modifier(id).effects {
            if *target == Target::Mouse {
                mouse.push(contribution(effect, state, buildings));
            }
        }
    }
    let per_click = mouse.apply(BASE_CLICK_VALUE).max(0.0);

    RateBreakdown {
        per_producer,
        buildings,
        per_click,
        baseline: per_click * click_rate.max(0.0),
    }
}

/// Cookies per second of a state, producers and clicking together.
///
/// # Example
///
/// ```
/// use cookie_router::catalog::Catalog;
/// use cookie_router::effects::compute_rate;
/// use cookie_router::state::GameState;
///
/// let mut builder = Catalog::builder("demo");
/// let cursor = builder.add_producer("Cursor", 15.0, 0.1).unwrap();
/// let catalog = builder.build();
///
/// let mut state = GameState::new(&catalog, 2.0, false);
/// state.owned[cursor.0] = 10;
///
/// // 10 cursors at 0.1 plus two clicks a second
/// assert!((compute_rate(&state, &catalog, 2.0) - 3.0).abs() < 1e-9);
/// ```
pub fn compute_rate(state: &GameState, catalog: &Catalog, click_rate: f64) -> f64 {
    compute_breakdown(state, catalog, click_rate).total()
}

/// Additive per-unit bonus granted by lump levels.
fn level_bonus(catalog: &Catalog, state: &GameState, id: ProducerId) -> f64 {
    catalog.base_rate_of(id) * LEVEL_BONUS * state.level(id) as f64
}

/// Precedence class a contribution was evaluated in.
pub fn precedence_of(contribution: &Contribution) -> Precedence {
    match contribution {
        Contribution::Add(_) => Precedence::Additive,
        Contribution::Percent(_) => Precedence::Percentage,
        Contribution::Factor(_) => Precedence::Multiplicative,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Requirements;

    fn two_producer_catalog() -> Catalog {
        let mut builder = Catalog::builder("test");
        let cursor = builder.add_producer("Cursor", 15.0, 0.1).unwrap();
        let grandma = builder.add_producer("Grandma", 100.0, 1.0).unwrap();
        builder
            .add_modifier(
                "Forwards from grandma",
                1_000.0,
                Requirements::none(),
                vec![(Target::Producer(grandma), Effect::Multiply(2.0))],
                true,
            )
            .unwrap();
        builder
            .add_modifier(
                "Grandma cursors",
                5_000.0,
                Requirements::none(),
                vec![(
                    Target::Producer(cursor),
                    Effect::Synergy {
                        source: grandma,
                        per: 2,
                        percent: 10.0,
                    },
                )],
                true,
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn zero_count_producer_adds_nothing() {
        let catalog = two_producer_catalog();
        let mut state = GameState::new(&catalog, 0.0, false);
        state.modifiers.insert(crate::models::ModifierId(0));
        state.owned[0] = 4;

        let breakdown = compute_breakdown(&state, &catalog, 0.0);
        assert_eq!(breakdown.per_producer[1], 0.0);
        assert!((breakdown.buildings - 0.4).abs() < 1e-12);
    }

    #[test]
    fn synergy_reads_live_counts() {
        let catalog = two_producer_catalog();
        let mut state = GameState::new(&catalog, 0.0, false);
        state.modifiers.insert(crate::models::ModifierId(1));
        state.owned[0] = 10;

        let before = compute_breakdown(&state, &catalog, 0.0).per_producer[0];
        state.owned[1] = 5;
        let after = compute_breakdown(&state, &catalog, 0.0).per_producer[0];

        assert!((before - 1.0).abs() < 1e-12);
        // floor(5 / 2) = 2 steps of 10%
        assert!((after - 1.2).abs() < 1e-12);
    }

    #[test]
    fn contribution_classes_follow_effect_precedence() {
        let catalog = two_producer_catalog();
        let state = GameState::new(&catalog, 0.0, false);
        for effect in [
            Effect::Add(1.0),
            Effect::Percent(5.0),
            Effect::Multiply(2.0),
            Effect::RateShare(0.01),
        ] {
            let c = contribution(&effect, &state, 10.0);
            assert_eq!(precedence_of(&c), effect.precedence());
        }
    }
}
