//! Sugar lumps: the secondary currency of the game.
//!
//! The subsystem stays locked until the bank first reaches a threshold. The
//! first lump is ripe at the unlock instant and one more ripens every
//! interval after it.
//! Lumps are spent on permanent producer levels; reaching level N costs N
//! lumps and every level adds 1% of the producer's base rate to each unit.

use serde::Serialize;

use crate::models::{BonusConfig, ProducerId};

/// Share of a producer's base rate added per level.
pub const LEVEL_BONUS: f64 = 0.01;

/// Slack used when comparing harvest instants.
const TIME_EPSILON: f64 = 1e-9;

/// Lump bookkeeping of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusState {
    pub unlocked: bool,
    pub unlock_time: Option<f64>,
    /// Lumps harvested and not spent yet
    pub available: u64,
    pub spent: u64,
    /// Lumps harvested since unlock
    pub harvested: u64,
    /// Level per producer, indexed by producer id
    pub levels: Vec<u32>,
}

impl BonusState {
    /// A locked subsystem with every producer at level 0.
    pub fn new(producer_count: usize) -> Self {
        BonusState {
            unlocked: false,
            unlock_time: None,
            available: 0,
            spent: 0,
            harvested: 0,
            levels: vec![0; producer_count],
        }
    }

    pub fn level(&self, id: ProducerId) -> u32 {
        self.levels.get(id.0).copied().unwrap_or(0)
    }

    /// Lumps needed for the next level of a producer.
    pub fn level_cost(&self, id: ProducerId) -> u64 {
        self.level(id) as u64 + 1
    }

    pub fn can_level_up(&self, id: ProducerId) -> bool {
        self.unlocked && self.available >= self.level_cost(id)
    }

    /// Instant at which the bank reaches the threshold, if it ever does.
    ///
    /// Returns `now` when the threshold is already met.
    pub fn unlock_eta(&self, config: &BonusConfig, now: f64, bank: f64, rate: f64) -> Option<f64> {
        if self.unlocked {
            return None;
        }
        if bank >= config.threshold {
            Some(now)
        } else if rate > 0.0 {
            Some(now + (config.threshold - bank) / rate)
        } else {
            None
        }
    }

    /// Locked → Unlocked. Has no effect once unlocked.
    pub fn unlock(&mut self, time: f64) -> bool {
        if self.unlocked {
            return false;
        }
        self.unlocked = true;
        self.unlock_time = Some(time);
        true
    }

    /// Instant at which the next lump ripens.
    ///
    /// Lump `k` (counting from 0) ripens `k` intervals after the unlock.
    pub fn next_harvest_time(&self, config: &BonusConfig) -> Option<f64> {
        self.unlock_time
            .map(|start| start + self.harvested as f64 * config.interval)
    }

    /// Lumps ripened by `time` but not harvested yet.
    pub fn due_units(&self, config: &BonusConfig, time: f64) -> u64 {
        match self.unlock_time {
            Some(start) if time >= start => {
                let ripened =
                    ((time - start) / config.interval + TIME_EPSILON).floor() as u64 + 1;
                ripened.saturating_sub(self.harvested)
            }
            _ => 0,
        }
    }

    /// Collects every lump due at `time`; more than one after a long wait.
    pub fn harvest(&mut self, config: &BonusConfig, time: f64) -> u64 {
        let units = self.due_units(config, time);
        self.harvested += units;
        self.available += units;
        units
    }

    /// Spends lumps on the next level of a producer and returns that level.
    pub fn level_up(&mut self, id: ProducerId) -> Option<u32> {
        if !self.can_level_up(id) {
            return None;
        }
        let cost = self.level_cost(id);
        self.available -= cost;
        self.spent += cost;
        let level = self.levels.get_mut(id.0)?;
        *level += 1;
        Some(*level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BonusConfig {
        BonusConfig {
            enabled: true,
            threshold: 1e9,
            interval: 86_400.0,
        }
    }

    #[test]
    fn unlock_happens_once() {
        let mut bonus = BonusState::new(2);
        assert!(bonus.unlock(10.0));
        assert!(!bonus.unlock(20.0));
        assert_eq!(bonus.unlock_time, Some(10.0));
    }

    #[test]
    fn unlock_eta_waits_for_threshold() {
        let bonus = BonusState::new(1);
        assert_eq!(bonus.unlock_eta(&config(), 5.0, 0.5e9, 1e6), Some(505.0));
        assert_eq!(bonus.unlock_eta(&config(), 5.0, 2e9, 0.0), Some(5.0));
        assert_eq!(bonus.unlock_eta(&config(), 5.0, 0.0, 0.0), None);
    }

    #[test]
    fn first_unit_is_ripe_at_unlock() {
        let cfg = config();
        let mut bonus = BonusState::new(1);
        assert_eq!(bonus.next_harvest_time(&cfg), None);
        bonus.unlock(100.0);
        assert_eq!(bonus.next_harvest_time(&cfg), Some(100.0));
        assert_eq!(bonus.due_units(&cfg, 100.0), 1);
        assert_eq!(bonus.harvest(&cfg, 100.0), 1);
        assert_eq!(bonus.due_units(&cfg, 100.0 + 86_399.0), 0);
        assert_eq!(bonus.next_harvest_time(&cfg), Some(100.0 + 86_400.0));
    }

    #[test]
    fn long_wait_harvests_several_units() {
        let cfg = config();
        let mut bonus = BonusState::new(1);
        bonus.unlock(100.0);
        assert_eq!(bonus.harvest(&cfg, 100.0 + 3.5 * 86_400.0), 4);
        assert_eq!(bonus.available, 4);
        assert_eq!(bonus.next_harvest_time(&cfg), Some(100.0 + 4.0 * 86_400.0));
    }

    #[test]
    fn level_n_costs_n_units() {
        let cfg = config();
        let mut bonus = BonusState::new(2);
        bonus.unlock(0.0);
        assert_eq!(bonus.harvest(&cfg, 2.0 * 86_400.0), 3);

        assert_eq!(bonus.level_up(ProducerId(0)), Some(1));
        assert_eq!(bonus.level_up(ProducerId(0)), Some(2));
        assert_eq!(bonus.available, 0);
        assert_eq!(bonus.spent, 3);
        assert_eq!(bonus.level_up(ProducerId(1)), None);
    }

    #[test]
    fn locked_subsystem_cannot_level() {
        let mut bonus = BonusState::new(1);
        bonus.available = 5;
        assert_eq!(bonus.level_up(ProducerId(0)), None);
    }
}
