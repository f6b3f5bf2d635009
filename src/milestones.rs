//! Achievement tracking.
//!
//! The tracker only answers questions; the optimizer owns the unlocked set
//! in [`GameState::milestones`] and inserts whatever [`MilestoneTracker::evaluate`]
//! reports, so a milestone is never reported twice within a route.

use log::debug;

use crate::catalog::Catalog;
use crate::models::{Milestone, MilestoneId, Requirement};
use crate::state::GameState;

/// Milestone evaluation bound to one catalog.
#[derive(Debug, Clone)]
pub struct MilestoneTracker<'a> {
    catalog: &'a Catalog,
    routable: Vec<bool>,
}

impl<'a> MilestoneTracker<'a> {
    /// Creates a tracker and classifies every milestone once.
    pub fn new(catalog: &'a Catalog) -> Self {
        let routable: Vec<bool> = catalog
            .milestones()
            .iter()
            .map(|m| match &m.requirement {
                Requirement::NotRoutable(_) => false,
                Requirement::ModifierCount(n) => *n as usize <= catalog.modifiers().len(),
                Requirement::ProducerCount { producer, .. }
                | Requirement::ProducerLevel { producer, .. } => {
                    producer.0 < catalog.producers().len()
                }
                _ => true,
            })
            .collect();

        debug!(
            "milestone tracker: {} of {} milestones routable",
            routable.iter().filter(|&&r| r).count(),
            routable.len()
        );

        MilestoneTracker { catalog, routable }
    }

    /// Whether purchases and waiting can ever satisfy this milestone.
    pub fn is_routable(&self, id: MilestoneId) -> bool {
        self.routable.get(id.0).copied().unwrap_or(false)
    }

    /// Checks a milestone's requirement against a state.
    pub fn is_satisfied(&self, milestone: &Milestone, state: &GameState) -> bool {
        match &milestone.requirement {
            Requirement::ProducerCount { producer, count } => state.count(*producer) >= *count,
            Requirement::Rate(rate) => state.rate() >= *rate,
            Requirement::Lifetime(total) => state.lifetime_resource >= *total,
            Requirement::ModifierCount(n) => state.modifiers.len() >= *n as usize,
            Requirement::TotalProducers(n) => state.total_producers() >= *n as u64,
            Requirement::MinPerType(n) => self
                .catalog
                .producer_ids()
                .all(|id| state.count(id) >= *n),
            Requirement::ProducerLevel { producer, level } => state.level(*producer) >= *level,
            Requirement::NotRoutable(_) => false,
        }
    }

    /// Milestones satisfied by `state` that are not unlocked yet, in catalog order.
    ///
    /// Pure: calling it twice on the same state gives the same answer.
    pub fn evaluate(&self, state: &GameState) -> Vec<MilestoneId> {
        self.catalog
            .milestones()
            .iter()
            .filter(|m| !state.milestones.contains(&m.id) && self.is_satisfied(m, state))
            .map(|m| m.id)
            .collect()
    }
}
