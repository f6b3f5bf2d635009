//! Purchase-order optimization.
//!
//! This module contains the route planner. Starting from a game state it
//! repeatedly picks the purchase that brings the goal closest, simulating up
//! to `lookahead` purchases ahead, until the goal is met. Sugar lump events
//! (unlock, harvests, level-ups) are interleaved with the purchases in time
//! order and recorded as their own steps.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};

use crate::catalog::Catalog;
use crate::effects::compute_breakdown;
use crate::error::PlanError;
use crate::milestones::MilestoneTracker;
use crate::models::{
    BonusEvent, Goal, MilestoneId, ModifierId, PlanOptions, ProducerId, Requirement, Route,
    RouteStep, StartingState,
};
use crate::state::GameState;

/// Relative tolerance under which two scores count as equal.
const SCORE_EPSILON: f64 = 1e-9;

/// Deepest lookahead planned without a warning; the search is exponential in it.
pub const MAX_LOOKAHEAD: u32 = 4;

/// Something that can be bought in the store.
///
/// The derived ordering is the tie-break order: producers by catalog index,
/// then modifiers by catalog index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Candidate {
    Producer(ProducerId),
    Modifier(ModifierId),
}

impl Candidate {
    pub fn name<'c>(&self, catalog: &'c Catalog) -> &'c str {
        match *self {
            Candidate::Producer(id) => &catalog.producer(id).name,
            Candidate::Modifier(id) => &catalog.modifier(id).name,
        }
    }

    /// Current store price for the given state.
    pub fn price(&self, catalog: &Catalog, state: &GameState) -> f64 {
        match *self {
            Candidate::Producer(id) => catalog.price_of(id, state.count(id)),
            Candidate::Modifier(id) => catalog.modifier(id).price,
        }
    }
}

/// Goal with every name resolved against the catalog.
#[derive(Debug, Clone)]
enum ResolvedGoal {
    Resource(f64),
    Milestones(Vec<MilestoneId>),
}

/// The best purchase found by a selection round.
#[derive(Debug, Clone, Copy)]
struct Choice {
    candidate: Candidate,
    price: f64,
    score: f64,
}

/// What the planner does next, before sugar lump events are considered.
#[derive(Debug, Clone, Copy)]
enum Action {
    Buy(Choice, f64),
    /// Let time pass until the goal completes by itself.
    Finish(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BonusTrigger {
    Unlock,
    Harvest,
}

/// Plans purchase routes over one catalog.
///
/// # Example
///
/// ```
/// use cookie_router::catalog::Catalog;
/// use cookie_router::models::{Goal, PlanOptions, StartingState};
/// use cookie_router::optimizer::Planner;
///
/// let mut builder = Catalog::builder("demo");
/// builder.add_producer("Cursor", 15.0, 0.1).unwrap();
/// let catalog = builder.build();
///
/// let options = PlanOptions { click_rate: 1.0, ..PlanOptions::default() };
/// let mut planner = Planner::new(&catalog, options);
/// let route = planner
///     .plan(&StartingState::default(), &Goal::Resource(1000.0))
///     .unwrap();
///
/// assert!(route.final_resource >= 1000.0);
/// assert!(route.total_time <= 1000.0);
/// ```
pub struct Planner<'a> {
    catalog: &'a Catalog,
    options: PlanOptions,
    tracker: MilestoneTracker<'a>,
    progress: Option<Box<dyn FnMut(usize) + 'a>>,
    cancel: Option<&'a AtomicBool>,
    partial: Vec<RouteStep>,
    pending_milestones: Vec<String>,
}

impl<'a> Planner<'a> {
    pub fn new(catalog: &'a Catalog, options: PlanOptions) -> Self {
        Planner {
            catalog,
            options,
            tracker: MilestoneTracker::new(catalog),
            progress: None,
            cancel: None,
            partial: Vec::new(),
            pending_milestones: Vec::new(),
        }
    }

    /// Registers a callback invoked with the step count after every step.
    pub fn with_progress(mut self, callback: impl FnMut(usize) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Registers a flag polled after every step; raising it cancels the run.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &PlanOptions {
        &self.options
    }

    /// Steps produced by the last run before it failed.
    ///
    /// Only meant for diagnostics; empty after a successful run.
    pub fn partial_route(&self) -> &[RouteStep] {
        &self.partial
    }

    /// Plans a route from `start` until `goal` is met.
    ///
    /// # Arguments
    ///
    /// * `start` - Game values the route starts from
    /// * `goal` - A cookie amount or a set of milestones to unlock
    ///
    /// # Returns
    ///
    /// The finished [`Route`], or the first [`PlanError`] encountered. Options,
    /// goal and starting state are all validated before the first step.
    pub fn plan(&mut self, start: &StartingState, goal: &Goal) -> Result<Route, PlanError> {
        self.partial.clear();
        self.pending_milestones.clear();

        self.validate_options()?;
        let goal = self.resolve_goal(goal)?;
        let mut state = GameState::from_start(self.catalog, start, &self.options)?;
        let prelude = self.resolve_prelude(&start.prelude)?;

        info!(
            "planning on catalog {} ({} producers, {} modifiers), lookahead {}",
            self.catalog.version(),
            self.catalog.producers().len(),
            self.catalog.modifiers().len(),
            self.options.lookahead
        );

        // Milestones already met at the start go to the first step
        self.pending_milestones = self.unlock_milestones(&mut state);

        for candidate in prelude {
            self.run_prelude_purchase(&mut state, candidate)?;
        }

        let mut at_finish = Vec::new();
        loop {
            if self.goal_met(&state, &goal) {
                break;
            }

            let action = self.next_action(&state, &goal);
            let horizon = match action {
                Some(Action::Buy(_, wait)) | Some(Action::Finish(wait)) => {
                    state.elapsed_time + wait
                }
                None => f64::INFINITY,
            };

            if let Some((time, trigger)) = self.next_bonus_event(&state) {
                if time <= horizon {
                    self.handle_bonus_event(&mut state, &goal, time, trigger)?;
                    continue;
                }
            }

            match action {
                Some(Action::Buy(choice, _)) => {
                    self.check_step_limit()?;
                    self.buy(&mut state, choice)?;
                }
                Some(Action::Finish(wait)) if wait.is_finite() => {
                    self.finish_by_waiting(&mut state, &goal, wait);
                    at_finish = self.unlock_milestones(&mut state);
                }
                _ => {
                    warn!(
                        "stuck at {:.1}s: rate {}, bank {}",
                        state.elapsed_time,
                        state.rate(),
                        state.total_resource
                    );
                    return Err(PlanError::UnreachableGoal(format!(
                        "no purchase or event can make progress after {} steps",
                        self.partial.len()
                    )));
                }
            }
        }

        // Nothing was bought, so milestones met at the start have no step to live on
        if self.partial.is_empty() {
            let mut initial = std::mem::take(&mut self.pending_milestones);
            initial.append(&mut at_finish);
            at_finish = initial;
        }

        let route = Route {
            steps: std::mem::take(&mut self.partial),
            total_time: state.elapsed_time,
            final_rate: state.rate(),
            final_resource: state.total_resource,
            unlocked_milestones: state
                .milestones
                .iter()
                .map(|&id| self.catalog.milestone(id).name.clone())
                .collect(),
            unlocked_at_finish: at_finish,
            bonus: state.bonus.clone().filter(|b| b.unlocked),
        };

        info!(
            "route complete: {} steps, {:.1}s, final rate {:.3}",
            route.steps.len(),
            route.total_time,
            route.final_rate
        );
        Ok(route)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    fn validate_options(&self) -> Result<(), PlanError> {
        let o = &self.options;
        if o.lookahead == 0 {
            return Err(PlanError::ConfigurationError(
                "lookahead must be at least 1".to_string(),
            ));
        }
        if o.lookahead > MAX_LOOKAHEAD {
            warn!(
                "lookahead {} is above {}; planning may take very long",
                o.lookahead, MAX_LOOKAHEAD
            );
        }
        if !(o.click_rate.is_finite() && o.click_rate >= 0.0) {
            return Err(PlanError::ConfigurationError(format!(
                "click rate {} is not a rate",
                o.click_rate
            )));
        }
        if !(o.purchase_delay.is_finite() && o.purchase_delay >= 0.0) {
            return Err(PlanError::ConfigurationError(format!(
                "purchase delay {} is not a duration",
                o.purchase_delay
            )));
        }
        if o.bonus.enabled {
            if !(o.bonus.threshold.is_finite() && o.bonus.threshold >= 0.0) {
                return Err(PlanError::ConfigurationError(format!(
                    "bonus threshold {} is invalid",
                    o.bonus.threshold
                )));
            }
            if !(o.bonus.interval.is_finite() && o.bonus.interval > 0.0) {
                return Err(PlanError::ConfigurationError(format!(
                    "bonus interval {} must be positive",
                    o.bonus.interval
                )));
            }
        }
        if o.max_steps == 0 {
            return Err(PlanError::ConfigurationError(
                "max_steps must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn resolve_goal(&self, goal: &Goal) -> Result<ResolvedGoal, PlanError> {
        match goal {
            Goal::Resource(target) => {
                if !(target.is_finite() && *target > 0.0) {
                    return Err(PlanError::ConfigurationError(format!(
                        "resource target {} must be positive",
                        target
                    )));
                }
                Ok(ResolvedGoal::Resource(*target))
            }
            Goal::Milestones(names) => {
                if names.is_empty() {
                    return Err(PlanError::ConfigurationError(
                        "milestone goal names no milestone".to_string(),
                    ));
                }
                let mut ids = Vec::with_capacity(names.len());
                for name in names {
                    let id = self.catalog.milestone_id(name)?;
                    self.check_reachable(id)?;
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                Ok(ResolvedGoal::Milestones(ids))
            }
        }
    }

    fn check_reachable(&self, id: MilestoneId) -> Result<(), PlanError> {
        let milestone = self.catalog.milestone(id);
        let reason = match &milestone.requirement {
            _ if !self.tracker.is_routable(id) => Some("it cannot be reached by purchases"),
            Requirement::ProducerLevel { .. } if !self.options.bonus.enabled => {
                Some("sugar lumps are disabled")
            }
            Requirement::ModifierCount(n)
                if *n as usize > self.catalog.purchasable_modifier_count(self.options.hardcore) =>
            {
                Some("not enough modifiers can be bought")
            }
            _ => None,
        };
        match reason {
            Some(reason) => {
                warn!("milestone '{}' rejected: {}", milestone.name, reason);
                Err(PlanError::UnreachableGoal(format!(
                    "milestone '{}': {}",
                    milestone.name, reason
                )))
            }
            None => Ok(()),
        }
    }

    fn resolve_prelude(&self, names: &[String]) -> Result<Vec<Candidate>, PlanError> {
        names
            .iter()
            .map(|name| {
                self.catalog
                    .producer_id(name)
                    .map(Candidate::Producer)
                    .or_else(|_| self.catalog.modifier_id(name).map(Candidate::Modifier))
            })
            .collect()
    }

    fn run_prelude_purchase(
        &mut self,
        state: &mut GameState,
        candidate: Candidate,
    ) -> Result<(), PlanError> {
        if let Candidate::Modifier(id) = candidate {
            let modifier = self.catalog.modifier(id);
            let available = self
                .catalog
                .modifiers_unlocked_by(state, self.options.hardcore)
                .any(|m| m.id == id);
            if !available {
                return Err(PlanError::InvalidStartingState(format!(
                    "prelude modifier '{}' is not available at that point",
                    modifier.name
                )));
            }
        }
        self.check_step_limit()?;
        let price = candidate.price(self.catalog, state);
        self.buy(
            state,
            Choice {
                candidate,
                price,
                score: f64::NAN,
            },
        )
    }

    // ========================================================================
    // Selection
    // ========================================================================

    fn goal_met(&self, state: &GameState, goal: &ResolvedGoal) -> bool {
        match goal {
            ResolvedGoal::Resource(target) => state.total_resource >= *target,
            ResolvedGoal::Milestones(ids) => ids.iter().all(|id| state.milestones.contains(id)),
        }
    }

    /// Every producer plus every available modifier, in tie-break order.
    fn candidates(&self, state: &GameState) -> Vec<Candidate> {
        self.catalog
            .producer_ids()
            .map(Candidate::Producer)
            .chain(
                self.catalog
                    .modifiers_unlocked_by(state, self.options.hardcore)
                    .map(|m| Candidate::Modifier(m.id)),
            )
            .collect()
    }

    /// Seconds until `price` cookies are in the bank.
    ///
    /// The player stops clicking for `purchase_delay` seconds per purchase,
    /// so only producers bake during that window. Returns `None` when the
    /// price can never be reached.
    fn time_to_afford(&self, state: &GameState, price: f64) -> Option<f64> {
        let need = price - state.total_resource;
        if need <= 0.0 {
            return Some(0.0);
        }
        let buildings = state.building_rate();
        let delay = self.options.purchase_delay;
        if buildings > 0.0 && need / buildings <= delay {
            return Some(need / buildings);
        }
        let rate = state.rate();
        if rate <= 0.0 {
            return None;
        }
        Some((need - delay * buildings) / rate + delay)
    }

    /// Waits for and buys `candidate`, returning the wait.
    fn simulate_purchase(&self, state: &mut GameState, candidate: Candidate) -> Option<f64> {
        let price = candidate.price(self.catalog, state);
        let wait = self.time_to_afford(state, price)?;
        if wait > 0.0 {
            state.advance_to_bank(wait, price);
        }
        match candidate {
            Candidate::Producer(id) => state.buy_producer(self.catalog, id),
            Candidate::Modifier(id) => state.buy_modifier(self.catalog, id),
        };
        Some(wait)
    }

    /// Best reachable completion estimate within `depth` more purchases.
    ///
    /// Buying nothing more is always one of the options.
    fn score(&self, state: &GameState, goal: &ResolvedGoal, depth: u32) -> f64 {
        let mut best = self.estimate(state, goal);
        if depth == 0 {
            return best;
        }
        for candidate in self.candidates(state) {
            let mut next = state.clone();
            if self.simulate_purchase(&mut next, candidate).is_none() {
                continue;
            }
            // Every estimate is at least the elapsed time
            if next.elapsed_time >= best {
                continue;
            }
            let s = self.score(&next, goal, depth - 1);
            if s < best {
                best = s;
            }
        }
        best
    }

    fn select(&self, state: &GameState, goal: &ResolvedGoal) -> Option<(Choice, f64)> {
        let mut best: Option<(Choice, f64)> = None;
        for candidate in self.candidates(state) {
            let price = candidate.price(self.catalog, state);
            let mut next = state.clone();
            let Some(wait) = self.simulate_purchase(&mut next, candidate) else {
                continue;
            };
            let score = self.score(&next, goal, self.options.lookahead - 1);
            if !score.is_finite() {
                continue;
            }
            let choice = Choice {
                candidate,
                price,
                score,
            };
            let replace = match &best {
                None => true,
                Some((current, _)) => beats(&choice, current),
            };
            if replace {
                best = Some((choice, wait));
            }
        }
        best
    }

    fn next_action(&self, state: &GameState, goal: &ResolvedGoal) -> Option<Action> {
        let best = self.select(state, goal);
        let finish = self.finish_wait(state, goal);

        match (best, finish) {
            (Some((choice, wait)), Some(finish_wait)) => {
                let waiting = state.elapsed_time + finish_wait;
                let idle = self.estimate(state, goal).min(waiting);
                if idle <= choice.score || nearly_equal(idle, choice.score) {
                    Some(Action::Finish(finish_wait))
                } else {
                    Some(Action::Buy(choice, wait))
                }
            }
            (Some((choice, wait)), None) => Some(Action::Buy(choice, wait)),
            (None, Some(finish_wait)) => Some(Action::Finish(finish_wait)),
            (None, None) => None,
        }
    }

    /// Seconds of idling that would complete the goal, if idling can.
    ///
    /// Infinite when only sugar lump events can finish the job.
    fn finish_wait(&self, state: &GameState, goal: &ResolvedGoal) -> Option<f64> {
        let rate = state.rate();
        match goal {
            ResolvedGoal::Resource(target) => {
                let need = target - state.total_resource;
                if need <= 0.0 {
                    Some(0.0)
                } else if rate > 0.0 {
                    Some(need / rate)
                } else {
                    None
                }
            }
            ResolvedGoal::Milestones(ids) => {
                let mut wait: f64 = 0.0;
                for &id in ids {
                    let milestone = self.catalog.milestone(id);
                    if state.milestones.contains(&id) || self.tracker.is_satisfied(milestone, state)
                    {
                        continue;
                    }
                    if !milestone.requirement.met_by_waiting() {
                        return None;
                    }
                    match milestone.requirement {
                        Requirement::Lifetime(total) if rate > 0.0 => {
                            wait = wait.max((total - state.lifetime_resource) / rate);
                        }
                        Requirement::Lifetime(_) => return None,
                        // Only lump harvests can finish it
                        _ => wait = f64::INFINITY,
                    }
                }
                Some(wait)
            }
        }
    }

    // ========================================================================
    // Estimates
    // ========================================================================

    /// Estimated completion time of the goal if nothing else is bought.
    fn estimate(&self, state: &GameState, goal: &ResolvedGoal) -> f64 {
        match goal {
            ResolvedGoal::Resource(target) => {
                let need = target - state.total_resource;
                if need <= 0.0 {
                    state.elapsed_time
                } else if state.rate() > 0.0 {
                    state.elapsed_time + need / state.rate()
                } else {
                    f64::INFINITY
                }
            }
            ResolvedGoal::Milestones(ids) => {
                let mut remaining = 0.0;
                for &id in ids {
                    let milestone = self.catalog.milestone(id);
                    if state.milestones.contains(&id) || self.tracker.is_satisfied(milestone, state)
                    {
                        continue;
                    }
                    remaining += self.milestone_cost(&milestone.requirement, state);
                }
                state.elapsed_time + remaining
            }
        }
    }

    /// Rough seconds still needed to meet one requirement.
    fn milestone_cost(&self, requirement: &Requirement, state: &GameState) -> f64 {
        if let Requirement::ProducerLevel { producer, level } = requirement {
            return self.level_cost(state, *producer, *level);
        }

        let rate = state.rate();
        if rate <= 0.0 {
            return f64::INFINITY;
        }
        let catalog = self.catalog;
        let cookies = match *requirement {
            Requirement::ProducerCount { producer, count } => {
                catalog.cumulative_price(producer, state.count(producer), count)
            }
            Requirement::Lifetime(total) => (total - state.lifetime_resource).max(0.0),
            Requirement::Rate(target) => (target - rate).max(0.0) * self.best_price_per_rate(state),
            Requirement::ModifierCount(n) => {
                let missing = (n as usize).saturating_sub(state.modifiers.len()) as f64;
                let cheapest = catalog
                    .modifiers_unlocked_by(state, self.options.hardcore)
                    .map(|m| m.price)
                    .fold(f64::INFINITY, f64::min);
                let cheapest = if cheapest.is_finite() {
                    cheapest
                } else {
                    self.cheapest_producer_price(state)
                };
                missing * cheapest
            }
            Requirement::TotalProducers(n) => {
                let missing = (n as u64).saturating_sub(state.total_producers()) as f64;
                missing * self.cheapest_producer_price(state)
            }
            Requirement::MinPerType(n) => catalog
                .producer_ids()
                .map(|id| catalog.cumulative_price(id, state.count(id), n))
                .sum(),
            Requirement::ProducerLevel { .. } | Requirement::NotRoutable(_) => f64::INFINITY,
        };
        cookies / rate
    }

    /// Seconds until a producer can reach `level`, counting unlock and harvests.
    fn level_cost(&self, state: &GameState, producer: ProducerId, level: u32) -> f64 {
        let Some(bonus) = state.bonus.as_ref() else {
            return f64::INFINITY;
        };
        let config = &self.options.bonus;
        let current = bonus.level(producer);
        let needed: u64 = (current + 1..=level).map(|l| l as u64).sum();
        let missing = needed.saturating_sub(bonus.available);
        if missing == 0 {
            return 0.0;
        }

        if bonus.unlocked {
            let next = bonus
                .next_harvest_time(config)
                .map_or(0.0, |t| (t - state.elapsed_time).max(0.0));
            next + (missing - 1) as f64 * config.interval
        } else {
            // The first lump is ripe at the unlock instant
            let unlock = bonus
                .unlock_eta(config, state.elapsed_time, state.total_resource, state.rate())
                .map_or(f64::INFINITY, |t| t - state.elapsed_time);
            unlock + (missing - 1) as f64 * config.interval
        }
    }

    fn cheapest_producer_price(&self, state: &GameState) -> f64 {
        self.catalog
            .producer_ids()
            .map(|id| self.catalog.price_of(id, state.count(id)))
            .fold(f64::INFINITY, f64::min)
    }

    /// Cookies needed per unit of rate by the best-value producer.
    fn best_price_per_rate(&self, state: &GameState) -> f64 {
        let breakdown = compute_breakdown(state, self.catalog, state.click_rate());
        self.catalog
            .producer_ids()
            .filter_map(|id| {
                let count = state.count(id);
                let unit_rate = if count > 0 {
                    breakdown.per_producer[id.0] / count as f64
                } else {
                    self.catalog.base_rate_of(id)
                };
                (unit_rate > 0.0).then(|| self.catalog.price_of(id, count) / unit_rate)
            })
            .fold(f64::INFINITY, f64::min)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn check_step_limit(&self) -> Result<(), PlanError> {
        if self.partial.len() >= self.options.max_steps {
            warn!("step limit of {} reached", self.options.max_steps);
            return Err(PlanError::UnreachableGoal(format!(
                "step limit of {} reached",
                self.options.max_steps
            )));
        }
        Ok(())
    }

    fn buy(&mut self, state: &mut GameState, choice: Choice) -> Result<(), PlanError> {
        let catalog = self.catalog;
        let before_time = state.elapsed_time;
        let before_rate = state.rate();

        if self.simulate_purchase(state, choice.candidate).is_none() {
            return Err(PlanError::UnreachableGoal(format!(
                "'{}' can never be afforded",
                choice.candidate.name(catalog)
            )));
        }

        let (is_producer, owned_after) = match choice.candidate {
            Candidate::Producer(id) => (true, Some(state.count(id))),
            Candidate::Modifier(_) => (false, None),
        };
        let step = RouteStep {
            order: 0,
            target_name: choice.candidate.name(catalog).to_string(),
            is_producer,
            owned_after,
            resource_cost: choice.price,
            resource_after: state.total_resource,
            rate_after: state.rate(),
            rate_delta: state.rate() - before_rate,
            time_after: state.elapsed_time,
            time_since_last_step: state.elapsed_time - before_time,
            newly_unlocked_milestones: Vec::new(),
            bonus: None,
        };
        self.record(state, step)
    }

    fn finish_by_waiting(&self, state: &mut GameState, goal: &ResolvedGoal, wait: f64) {
        match goal {
            ResolvedGoal::Resource(target) => state.advance_to_bank(wait, *target),
            ResolvedGoal::Milestones(ids) => {
                state.advance_at_rate(wait);
                // Clamp rounding so a lifetime milestone is not missed by a hair
                for &id in ids {
                    if let Requirement::Lifetime(total) = self.catalog.milestone(id).requirement {
                        state.lifetime_resource = state.lifetime_resource.max(total);
                    }
                }
            }
        }
        debug!("waited {:.1}s to finish at {:.1}s", wait, state.elapsed_time);
    }

    /// Appends a step, attaching the milestones it unlocked.
    fn record(&mut self, state: &mut GameState, mut step: RouteStep) -> Result<(), PlanError> {
        step.order = self.partial.len() + 1;
        let mut unlocked = std::mem::take(&mut self.pending_milestones);
        unlocked.extend(self.unlock_milestones(state));
        step.newly_unlocked_milestones = unlocked;

        debug!(
            "step {}: {} at {:.1}s, rate {:.3} ({:+.3})",
            step.order, step.target_name, step.time_after, step.rate_after, step.rate_delta
        );
        self.partial.push(step);

        let count = self.partial.len();
        if let Some(callback) = self.progress.as_mut() {
            callback(count);
        }
        if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            info!("planning cancelled after {} steps", count);
            return Err(PlanError::Cancelled {
                steps_completed: count,
            });
        }
        Ok(())
    }

    fn unlock_milestones(&self, state: &mut GameState) -> Vec<String> {
        let ids = self.tracker.evaluate(state);
        ids.into_iter()
            .map(|id| {
                state.milestones.insert(id);
                self.catalog.milestone(id).name.clone()
            })
            .collect()
    }

    // ========================================================================
    // Sugar lumps
    // ========================================================================

    fn next_bonus_event(&self, state: &GameState) -> Option<(f64, BonusTrigger)> {
        let config = &self.options.bonus;
        if !config.enabled {
            return None;
        }
        let bonus = state.bonus.as_ref()?;
        if bonus.unlocked {
            bonus
                .next_harvest_time(config)
                .map(|t| (t, BonusTrigger::Harvest))
        } else {
            bonus
                .unlock_eta(config, state.elapsed_time, state.total_resource, state.rate())
                .map(|t| (t, BonusTrigger::Unlock))
        }
    }

    fn handle_bonus_event(
        &mut self,
        state: &mut GameState,
        goal: &ResolvedGoal,
        time: f64,
        trigger: BonusTrigger,
    ) -> Result<(), PlanError> {
        self.check_step_limit()?;
        let before_time = state.elapsed_time;
        let dt = (time - state.elapsed_time).max(0.0);
        let config = self.options.bonus.clone();

        let event = match trigger {
            BonusTrigger::Unlock => {
                if state.total_resource < config.threshold {
                    state.advance_to_bank(dt, config.threshold);
                } else {
                    state.advance_at_rate(dt);
                }
                let elapsed = state.elapsed_time;
                match state.bonus.as_mut().map(|bonus| bonus.unlock(elapsed)) {
                    Some(true) => BonusEvent::Unlocked,
                    _ => return Ok(()),
                }
            }
            BonusTrigger::Harvest => {
                state.advance_at_rate(dt);
                let harvest_time = time.max(state.elapsed_time);
                let Some(bonus) = state.bonus.as_mut() else {
                    return Ok(());
                };
                let units = bonus.harvest(&config, harvest_time);
                BonusEvent::Harvested {
                    units,
                    available: bonus.available,
                }
            }
        };

        let step = RouteStep {
            order: 0,
            target_name: "Sugar lump".to_string(),
            is_producer: false,
            owned_after: None,
            resource_cost: 0.0,
            resource_after: state.total_resource,
            rate_after: state.rate(),
            rate_delta: 0.0,
            time_after: state.elapsed_time,
            time_since_last_step: state.elapsed_time - before_time,
            newly_unlocked_milestones: Vec::new(),
            bonus: Some(event),
        };
        self.record(state, step)?;

        if trigger == BonusTrigger::Harvest {
            self.spend_bonus(state, goal)?;
        }
        Ok(())
    }

    /// Spends available lumps one level at a time.
    fn spend_bonus(&mut self, state: &mut GameState, goal: &ResolvedGoal) -> Result<(), PlanError> {
        while let Some(producer) = self.pick_level_target(state, goal) {
            self.check_step_limit()?;
            let before_rate = state.rate();
            let Some(bonus) = state.bonus.as_mut() else {
                break;
            };
            let cost = bonus.level_cost(producer);
            let Some(level) = bonus.level_up(producer) else {
                break;
            };
            let available = bonus.available;
            state.refresh_rate(self.catalog);

            let step = RouteStep {
                order: 0,
                target_name: self.catalog.producer(producer).name.clone(),
                is_producer: false,
                owned_after: None,
                resource_cost: 0.0,
                resource_after: state.total_resource,
                rate_after: state.rate(),
                rate_delta: state.rate() - before_rate,
                time_after: state.elapsed_time,
                time_since_last_step: 0.0,
                newly_unlocked_milestones: Vec::new(),
                bonus: Some(BonusEvent::LevelUp {
                    producer: self.catalog.producer(producer).name.clone(),
                    level,
                    cost,
                    available,
                }),
            };
            self.record(state, step)?;
        }
        Ok(())
    }

    /// Goal levels first, then the affordable level with the largest rate gain.
    ///
    /// While a goal level is still missing, lumps are saved for it.
    fn pick_level_target(&self, state: &GameState, goal: &ResolvedGoal) -> Option<ProducerId> {
        let bonus = state.bonus.as_ref()?;

        if let ResolvedGoal::Milestones(ids) = goal {
            let mut saving = false;
            for &id in ids {
                if let Requirement::ProducerLevel { producer, level } =
                    self.catalog.milestone(id).requirement
                {
                    if bonus.level(producer) >= level {
                        continue;
                    }
                    if bonus.can_level_up(producer) {
                        return Some(producer);
                    }
                    saving = true;
                }
            }
            if saving {
                return None;
            }
        }

        let mut best: Option<(ProducerId, f64)> = None;
        for id in self.catalog.producer_ids() {
            if !bonus.can_level_up(id) {
                continue;
            }
            let mut trial = state.clone();
            if let Some(b) = trial.bonus.as_mut() {
                b.level_up(id);
            }
            trial.refresh_rate(self.catalog);
            let gain = trial.rate() - state.rate();
            if gain > 0.0 && best.map_or(true, |(_, g)| gain > g) {
                best = Some((id, gain));
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Plans a route with a fresh [`Planner`].
///
/// # Example
///
/// ```
/// use cookie_router::data::builtin_catalog;
/// use cookie_router::models::{Goal, PlanOptions, StartingState};
/// use cookie_router::optimizer::plan;
///
/// let catalog = builtin_catalog("v2031").unwrap();
/// let options = PlanOptions { click_rate: 8.0, ..PlanOptions::default() };
/// let start = StartingState::default();
/// let route = plan(&catalog, &start, &Goal::Resource(1000.0), &options).unwrap();
/// assert!(!route.steps.is_empty());
/// ```
pub fn plan(
    catalog: &Catalog,
    start: &StartingState,
    goal: &Goal,
    options: &PlanOptions,
) -> Result<Route, PlanError> {
    Planner::new(catalog, options.clone()).plan(start, goal)
}

fn nearly_equal(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= SCORE_EPSILON * a.abs().max(b.abs())
}

/// Whether `a` should be preferred over `b`.
fn beats(a: &Choice, b: &Choice) -> bool {
    if !nearly_equal(a.score, b.score) {
        return a.score < b.score;
    }
    if a.price != b.price {
        return a.price < b.price;
    }
    a.candidate < b.candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(candidate: Candidate, price: f64, score: f64) -> Choice {
        Choice {
            candidate,
            price,
            score,
        }
    }

    #[test]
    fn near_equal_scores_fall_back_to_price() {
        let a = choice(Candidate::Modifier(ModifierId(3)), 10.0, 100.0);
        let b = choice(Candidate::Producer(ProducerId(0)), 20.0, 100.0 + 1e-8);
        assert!(beats(&a, &b));
        assert!(!beats(&b, &a));
    }

    #[test]
    fn equal_price_falls_back_to_catalog_order() {
        let producer = choice(Candidate::Producer(ProducerId(5)), 10.0, 50.0);
        let modifier = choice(Candidate::Modifier(ModifierId(0)), 10.0, 50.0);
        assert!(beats(&producer, &modifier));
    }

    #[test]
    fn clear_score_difference_wins() {
        let a = choice(Candidate::Producer(ProducerId(1)), 1_000.0, 90.0);
        let b = choice(Candidate::Producer(ProducerId(0)), 1.0, 100.0);
        assert!(beats(&a, &b));
    }

    #[test]
    fn purchase_delay_only_counts_producers() {
        let mut builder = Catalog::builder("test");
        let cursor = builder.add_producer("Cursor", 15.0, 0.1).unwrap();
        let catalog = builder.build();
        let options = PlanOptions {
            click_rate: 10.0,
            purchase_delay: 2.0,
            bonus: crate::models::BonusConfig {
                enabled: false,
                ..Default::default()
            },
            ..PlanOptions::default()
        };
        let planner = Planner::new(&catalog, options);
        let mut state = GameState::new(&catalog, 10.0, false);
        state.owned[cursor.0] = 10;
        state.refresh_rate(&catalog);

        // rate 11/s, producers 1/s: (100 - 2 * 1) / 11 + 2
        let wait = planner.time_to_afford(&state, 100.0).unwrap();
        assert!((wait - (98.0 / 11.0 + 2.0)).abs() < 1e-9);
        // producers alone cover 1.5 cookies inside the delay window
        let quick = planner.time_to_afford(&state, 1.5).unwrap();
        assert!((quick - 1.5).abs() < 1e-9);
    }
}
