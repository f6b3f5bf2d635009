//! Data models and structures for the cookie route planner.
//!
//! This module contains the catalog vocabulary (producers, modifiers, effects,
//! milestones), the planning inputs (goal, options, starting state) and the
//! route records handed to display and storage code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bonus::BonusState;

/// Position of a producer type in its catalog (also its display order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProducerId(pub usize);

/// Position of a modifier in its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModifierId(pub usize);

/// Position of a milestone in its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MilestoneId(pub usize);

/// A purchasable building that bakes cookies on its own.
///
/// # Example
///
/// ```
/// use cookie_router::models::ProducerType;
///
/// let cursor = ProducerType {
///     name: "Cursor".to_string(),
///     base_price: 15.0,
///     base_rate: 0.1,
/// };
/// assert_eq!(cursor.name, "Cursor");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerType {
    /// Display name, unique within a catalog (e.g. "Grandma")
    pub name: String,
    /// Price of the first unit
    pub base_price: f64,
    /// Cookies per second of a single unit before any effect
    pub base_rate: f64,
}

/// What an effect applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The per-unit rate of one producer type.
    Producer(ProducerId),
    /// The player's own clicking (the `mouse` sentinel in version data).
    Mouse,
    /// The summed rate of every producer (the `all` sentinel in version data).
    All,
}

/// Evaluation order of effects on a single target.
///
/// Additive terms are summed first, percentages are summed and applied once,
/// multipliers come last so they scale the fully adjusted rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Additive = 0,
    Percentage = 1,
    Multiplicative = 2,
}

/// A single rate effect carried by a modifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Flat amount added to the per-unit rate (per click for the mouse).
    Add(f64),
    /// Amount added per owned producer, optionally not counting one type.
    PerBuilding {
        amount: f64,
        excluding: Option<ProducerId>,
    },
    /// Share of the summed producer rate added to each click.
    RateShare(f64),
    /// Percentage boost; boosts on the same target are summed.
    Percent(f64),
    /// Flat multiplier.
    Multiply(f64),
    /// `1 + percent% * floor(count(source) / per)`, read from live counts.
    Synergy {
        source: ProducerId,
        per: u32,
        percent: f64,
    },
}

impl Effect {
    /// Returns the precedence class this effect is evaluated in.
    pub fn precedence(&self) -> Precedence {
        match self {
            Effect::Add(_) | Effect::PerBuilding { .. } | Effect::RateShare(_) => {
                Precedence::Additive
            }
            Effect::Percent(_) => Precedence::Percentage,
            Effect::Multiply(_) | Effect::Synergy { .. } => Precedence::Multiplicative,
        }
    }
}

/// Conditions that make a modifier appear in the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Requirements {
    /// Minimum owned count per producer type
    pub producers: Vec<(ProducerId, u32)>,
    /// Minimum number of unlocked milestones
    pub min_milestones: u32,
}

impl Requirements {
    /// No requirement at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// A single producer-count requirement.
    pub fn producer(id: ProducerId, count: u32) -> Self {
        Self {
            producers: vec![(id, count)],
            min_milestones: 0,
        }
    }
}

/// A one-time purchase that changes production ("upgrade").
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    /// Stable identifier (catalog position)
    pub id: ModifierId,
    /// Display name, unique within a catalog
    pub name: String,
    /// Price in cookies
    pub price: f64,
    /// Store availability conditions
    pub requirements: Requirements,
    /// Effects in declaration order
    pub effects: Vec<(Target, Effect)>,
    /// Whether hardcore runs forbid this modifier
    pub hardcore_disabled: bool,
}

/// Condition of an achievement-style milestone.
#[derive(Debug, Clone, PartialEq)]
pub enum Requirement {
    ProducerCount { producer: ProducerId, count: u32 },
    Rate(f64),
    Lifetime(f64),
    ModifierCount(u32),
    TotalProducers(u32),
    MinPerType(u32),
    ProducerLevel { producer: ProducerId, level: u32 },
    /// Depends on something purchases cannot produce.
    NotRoutable(String),
}

impl Requirement {
    /// Whether simply letting time pass can satisfy this requirement.
    pub fn met_by_waiting(&self) -> bool {
        matches!(
            self,
            Requirement::Lifetime(_) | Requirement::ProducerLevel { .. }
        )
    }
}

/// A named achievement.
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    pub id: MilestoneId,
    pub name: String,
    pub requirement: Requirement,
}

// ============================================================================
// Planning inputs
// ============================================================================

/// What a route must achieve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Cookies in the bank.
    Resource(f64),
    /// Every named milestone unlocked.
    Milestones(Vec<String>),
}

/// Settings of the sugar lump subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusConfig {
    pub enabled: bool,
    /// Bank total that unlocks the subsystem
    pub threshold: f64,
    /// Simulated seconds between two harvested units
    pub interval: f64,
}

impl Default for BonusConfig {
    fn default() -> Self {
        BonusConfig {
            enabled: true,
            threshold: 1e9,
            interval: 86_400.0,
        }
    }
}

/// Tuning knobs of a planning run.
///
/// Every field has a default so partial JSON input is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    /// Purchases simulated ahead when scoring a candidate (>= 1)
    pub lookahead: u32,
    /// Clicks per second on the big cookie
    pub click_rate: f64,
    /// Seconds the player stops clicking to make a purchase
    pub purchase_delay: f64,
    /// Forbid modifiers flagged as hardcore-disabled
    pub hardcore: bool,
    pub bonus: BonusConfig,
    /// Upper bound on appended steps before the run is declared stuck
    pub max_steps: usize,
}

impl Default for PlanOptions {
    fn default() -> Self {
        PlanOptions {
            lookahead: 1,
            click_rate: 0.0,
            purchase_delay: 0.0,
            hardcore: false,
            bonus: BonusConfig::default(),
            max_steps: 50_000,
        }
    }
}

/// Game values a route starts from, as supplied by the caller.
///
/// Counts are signed so that bad imports can be reported instead of wrapped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartingState {
    pub producers: BTreeMap<String, i64>,
    pub modifiers: Vec<String>,
    /// Cookies in the bank
    pub resource: f64,
    /// Cookies baked all time; defaults to `resource`
    pub lifetime_resource: Option<f64>,
    pub elapsed_time: f64,
    pub bonus_levels: BTreeMap<String, i64>,
    /// Purchases made in this order before the search starts
    pub prelude: Vec<String>,
}

// ============================================================================
// Route output
// ============================================================================

/// Sugar lump annotation of a route step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BonusEvent {
    Unlocked,
    Harvested {
        units: u64,
        available: u64,
    },
    LevelUp {
        producer: String,
        level: u32,
        cost: u64,
        available: u64,
    },
}

/// One entry of a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    /// 1-based position, contiguous within a route
    pub order: usize,
    pub target_name: String,
    pub is_producer: bool,
    /// Units of the producer owned after the purchase
    pub owned_after: Option<u32>,
    pub resource_cost: f64,
    /// Bank right after the step
    pub resource_after: f64,
    pub rate_after: f64,
    pub rate_delta: f64,
    pub time_after: f64,
    pub time_since_last_step: f64,
    pub newly_unlocked_milestones: Vec<String>,
    pub bonus: Option<BonusEvent>,
}

/// A finished plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub steps: Vec<RouteStep>,
    pub total_time: f64,
    pub final_rate: f64,
    pub final_resource: f64,
    /// Every milestone unlocked at the end, in catalog order
    pub unlocked_milestones: Vec<String>,
    /// Milestones reached while waiting after the last step
    pub unlocked_at_finish: Vec<String>,
    pub bonus: Option<BonusState>,
}

// ============================================================================
// CSV Row Structures
// ============================================================================

/// CSV row structure for `producers.csv`.
#[derive(Debug, Deserialize)]
pub struct ProducerRow {
    pub name: String,
    pub base_price: f64,
    pub base_rate: f64,
}

/// CSV row structure for `modifiers.csv`.
#[derive(Debug, Deserialize)]
pub struct ModifierRow {
    pub name: String,
    pub price: f64,
    /// `Producer:count` pairs separated by `;` (may be empty)
    pub requirements: Option<String>,
    /// `target=kind:params` entries separated by `;`
    pub effects: String,
    #[serde(default)]
    pub min_milestones: u32,
    #[serde(default)]
    pub hardcore_disabled: bool,
}

/// CSV row structure for `milestones.csv`.
#[derive(Debug, Deserialize)]
pub struct MilestoneRow {
    pub name: String,
    pub kind: String,
    pub params: Option<String>,
}
