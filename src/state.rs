//! Mutable simulation state of a single planning run.

use std::collections::BTreeSet;

use crate::bonus::BonusState;
use crate::catalog::Catalog;
use crate::effects::{compute_breakdown, RateBreakdown};
use crate::error::PlanError;
use crate::models::{MilestoneId, ModifierId, PlanOptions, ProducerId, StartingState};

/// Everything that changes while a route is simulated.
///
/// The production rate is cached: it is a pure function of the owned
/// producers, owned modifiers, lump levels and the click rate, and is
/// refreshed with [`GameState::refresh_rate`] after every change.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Owned units, indexed by producer id
    pub owned: Vec<u32>,
    pub modifiers: BTreeSet<ModifierId>,
    /// Cookies in the bank
    pub total_resource: f64,
    /// Cookies baked all time
    pub lifetime_resource: f64,
    pub elapsed_time: f64,
    pub milestones: BTreeSet<MilestoneId>,
    /// `None` when the sugar lump subsystem is disabled
    pub bonus: Option<BonusState>,
    click_rate: f64,
    current_rate: f64,
    building_rate: f64,
}

impl GameState {
    /// A fresh game: nothing owned, nothing baked.
    pub fn new(catalog: &Catalog, click_rate: f64, bonus_enabled: bool) -> Self {
        let producers = catalog.producers().len();
        let mut state = GameState {
            owned: vec![0; producers],
            modifiers: BTreeSet::new(),
            total_resource: 0.0,
            lifetime_resource: 0.0,
            elapsed_time: 0.0,
            milestones: BTreeSet::new(),
            bonus: bonus_enabled.then(|| BonusState::new(producers)),
            click_rate,
            current_rate: 0.0,
            building_rate: 0.0,
        };
        state.refresh_rate(catalog);
        state
    }

    /// Validates caller-supplied values and turns them into a state.
    ///
    /// Negative counts, resources or times are rejected, as are names that
    /// the catalog does not know.
    pub fn from_start(
        catalog: &Catalog,
        start: &StartingState,
        options: &PlanOptions,
    ) -> Result<Self, PlanError> {
        let mut state = GameState::new(catalog, options.click_rate, options.bonus.enabled);

        for (name, &count) in &start.producers {
            let id = catalog.producer_id(name)?;
            state.owned[id.0] = non_negative_count(name, count)?;
        }
        for name in &start.modifiers {
            let id = catalog.modifier_id(name)?;
            state.modifiers.insert(id);
        }

        if !(start.resource.is_finite() && start.resource >= 0.0) {
            return Err(PlanError::InvalidStartingState(format!(
                "resource total {} is below zero",
                start.resource
            )));
        }
        let lifetime = start.lifetime_resource.unwrap_or(start.resource);
        if !(lifetime.is_finite() && lifetime >= start.resource) {
            return Err(PlanError::InvalidStartingState(format!(
                "lifetime total {} is below the bank {}",
                lifetime, start.resource
            )));
        }
        if !(start.elapsed_time.is_finite() && start.elapsed_time >= 0.0) {
            return Err(PlanError::InvalidStartingState(format!(
                "elapsed time {} is below zero",
                start.elapsed_time
            )));
        }
        state.total_resource = start.resource;
        state.lifetime_resource = lifetime;
        state.elapsed_time = start.elapsed_time;

        for (name, &level) in &start.bonus_levels {
            let id = catalog.producer_id(name)?;
            let level = non_negative_count(name, level)?;
            if let Some(bonus) = state.bonus.as_mut() {
                bonus.levels[id.0] = level;
            }
        }

        state.refresh_rate(catalog);
        Ok(state)
    }

    pub fn count(&self, id: ProducerId) -> u32 {
        self.owned.get(id.0).copied().unwrap_or(0)
    }

    pub fn total_producers(&self) -> u64 {
        self.owned.iter().map(|&c| c as u64).sum()
    }

    pub fn owns(&self, id: ModifierId) -> bool {
        self.modifiers.contains(&id)
    }

    /// Lump level of a producer (0 while the subsystem is disabled).
    pub fn level(&self, id: ProducerId) -> u32 {
        self.bonus.as_ref().map_or(0, |b| b.level(id))
    }

    pub fn click_rate(&self) -> f64 {
        self.click_rate
    }

    /// Cookies per second, producers and clicking together.
    pub fn rate(&self) -> f64 {
        self.current_rate
    }

    /// Cookies per second from producers alone.
    pub fn building_rate(&self) -> f64 {
        self.building_rate
    }

    /// Recomputes the cached rates and returns the full breakdown.
    pub fn refresh_rate(&mut self, catalog: &Catalog) -> RateBreakdown {
        let breakdown = compute_breakdown(self, catalog, self.click_rate);
        self.current_rate = breakdown.total();
        self.building_rate = breakdown.buildings;
        breakdown
    }

    /// Lets `dt` seconds pass during which `gained` cookies were baked.
    pub fn advance(&mut self, dt: f64, gained: f64) {
        self.elapsed_time += dt.max(0.0);
        self.total_resource += gained.max(0.0);
        self.lifetime_resource += gained.max(0.0);
    }

    /// Lets `dt` seconds pass at the current full rate.
    pub fn advance_at_rate(&mut self, dt: f64) {
        let gained = self.current_rate * dt.max(0.0);
        self.advance(dt, gained);
    }

    /// Lets `dt` seconds pass while the bank fills up to `bank`.
    pub fn advance_to_bank(&mut self, dt: f64, bank: f64) {
        let gained = (bank - self.total_resource).max(0.0);
        self.advance(dt, gained);
        if gained > 0.0 {
            self.total_resource = bank;
        }
    }

    /// Takes a producer: pays its current price and adds one unit.
    pub fn buy_producer(&mut self, catalog: &Catalog, id: ProducerId) -> f64 {
        let price = catalog.price_of(id, self.count(id));
        self.pay(price);
        self.owned[id.0] += 1;
        self.refresh_rate(catalog);
        price
    }

    /// Takes a modifier: pays its price and applies its effects.
    pub fn buy_modifier(&mut self, catalog: &Catalog, id: ModifierId) -> f64 {
        let price = catalog.modifier(id).price;
        self.pay(price);
        self.modifiers.insert(id);
        self.refresh_rate(catalog);
        price
    }

    fn pay(&mut self, price: f64) {
        // Rounding in long waits can leave the bank a hair short of the price.
        self.total_resource = (self.total_resource - price).max(0.0);
    }
}

fn non_negative_count(name: &str, count: i64) -> Result<u32, PlanError> {
    u32::try_from(count).map_err(|_| {
        PlanError::InvalidStartingState(format!("count {} for '{}' is out of range", count, name))
    })
}
