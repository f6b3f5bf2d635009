//! The per-version catalog of producers, modifiers and milestones.
//!
//! A [`Catalog`] is built once through a [`CatalogBuilder`] and is read-only
//! afterwards, so a single instance can be shared by any number of planning
//! runs.

use std::collections::HashMap;

use crate::error::{CatalogError, PlanError};
use crate::models::{
    Effect, Milestone, MilestoneId, Modifier, ModifierId, ProducerId, ProducerType, Requirement,
    Requirements, Target,
};
use crate::state::GameState;

/// Growth factor of producer prices per unit owned.
pub const PRICE_RATE: f64 = 1.15;

/// Immutable description of one game version.
#[derive(Debug, Clone)]
pub struct Catalog {
    version: String,
    producers: Vec<ProducerType>,
    modifiers: Vec<Modifier>,
    milestones: Vec<Milestone>,
    producer_names: HashMap<String, ProducerId>,
    modifier_names: HashMap<String, ModifierId>,
    milestone_names: HashMap<String, MilestoneId>,
}

impl Catalog {
    /// Starts a new catalog for the given version label.
    pub fn builder(version: &str) -> CatalogBuilder {
        CatalogBuilder::new(version)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn producers(&self) -> &[ProducerType] {
        &self.producers
    }

    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    pub fn producer(&self, id: ProducerId) -> &ProducerType {
        &self.producers[id.0]
    }

    pub fn modifier(&self, id: ModifierId) -> &Modifier {
        &self.modifiers[id.0]
    }

    pub fn milestone(&self, id: MilestoneId) -> &Milestone {
        &self.milestones[id.0]
    }

    /// Iterates producer ids in display order.
    pub fn producer_ids(&self) -> impl Iterator<Item = ProducerId> {
        (0..self.producers.len()).map(ProducerId)
    }

    pub fn producer_id(&self, name: &str) -> Result<ProducerId, PlanError> {
        self.producer_names
            .get(name)
            .copied()
            .ok_or_else(|| PlanError::UnknownCatalogEntry(name.to_string()))
    }

    pub fn modifier_id(&self, name: &str) -> Result<ModifierId, PlanError> {
        self.modifier_names
            .get(name)
            .copied()
            .ok_or_else(|| PlanError::UnknownCatalogEntry(name.to_string()))
    }

    pub fn milestone_id(&self, name: &str) -> Result<MilestoneId, PlanError> {
        self.milestone_names
            .get(name)
            .copied()
            .ok_or_else(|| PlanError::UnknownCatalogEntry(name.to_string()))
    }

    /// Price of the next unit of a producer when `owned` units are held.
    ///
    /// # Example
    ///
    /// ```
    /// use cookie_router::catalog::Catalog;
    ///
    /// let mut builder = Catalog::builder("test");
    /// let cursor = builder.add_producer("Cursor", 15.0, 0.1).unwrap();
    /// let catalog = builder.build();
    ///
    /// assert_eq!(catalog.price_of(cursor, 0), 15.0);
    /// assert!((catalog.price_of(cursor, 1) - 17.25).abs() < 1e-9);
    /// ```
    pub fn price_of(&self, id: ProducerId, owned: u32) -> f64 {
        self.producer(id).base_price * PRICE_RATE.powi(owned as i32)
    }

    /// Total price of raising a producer from `from` to `to` units.
    pub fn cumulative_price(&self, id: ProducerId, from: u32, to: u32) -> f64 {
        if to <= from {
            return 0.0;
        }
        let first = self.price_of(id, from);
        first * (PRICE_RATE.powi((to - from) as i32) - 1.0) / (PRICE_RATE - 1.0)
    }

    pub fn base_rate_of(&self, id: ProducerId) -> f64 {
        self.producer(id).base_rate
    }

    /// Whether the store would show this modifier for the given state.
    pub fn is_unlocked(&self, modifier: &Modifier, state: &GameState) -> bool {
        modifier
            .requirements
            .producers
            .iter()
            .all(|&(id, count)| state.count(id) >= count)
            && state.milestones.len() as u32 >= modifier.requirements.min_milestones
    }

    /// Modifiers whose requirements hold and that are not owned yet, in catalog order.
    ///
    /// Hardcore runs skip every modifier flagged as hardcore-disabled.
    pub fn modifiers_unlocked_by<'a>(
        &'a self,
        state: &'a GameState,
        hardcore: bool,
    ) -> impl Iterator<Item = &'a Modifier> + 'a {
        self.modifiers.iter().filter(move |m| {
            !state.owns(m.id) && !(hardcore && m.hardcore_disabled) && self.is_unlocked(m, state)
        })
    }

    /// Number of modifiers a run could ever buy.
    pub fn purchasable_modifier_count(&self, hardcore: bool) -> usize {
        self.modifiers
            .iter()
            .filter(|m| !(hardcore && m.hardcore_disabled))
            .count()
    }
}

/// Builder for constructing an immutable [`Catalog`].
///
/// Names are checked for uniqueness as they are added; effects and
/// requirements can only reference producers that were added earlier.
#[derive(Debug)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    pub fn new(version: &str) -> Self {
        CatalogBuilder {
            catalog: Catalog {
                version: version.to_string(),
                producers: Vec::new(),
                modifiers: Vec::new(),
                milestones: Vec::new(),
                producer_names: HashMap::new(),
                modifier_names: HashMap::new(),
                milestone_names: HashMap::new(),
            },
        }
    }

    /// Looks up a producer added earlier.
    pub fn producer_id(&self, name: &str) -> Option<ProducerId> {
        self.catalog.producer_names.get(name).copied()
    }

    pub fn add_producer(
        &mut self,
        name: &str,
        base_price: f64,
        base_rate: f64,
    ) -> Result<ProducerId, CatalogError> {
        if self.catalog.producer_names.contains_key(name) {
            return Err(CatalogError::Duplicate {
                kind: "producer",
                name: name.to_string(),
            });
        }
        if !(base_price.is_finite() && base_price > 0.0) {
            return Err(invalid(
                name,
                "base_price",
                format!("{} is not a positive price", base_price),
            ));
        }
        if !(base_rate.is_finite() && base_rate >= 0.0) {
            return Err(invalid(name, "base_rate", format!("{} is not a rate", base_rate)));
        }

        let id = ProducerId(self.catalog.producers.len());
        self.catalog.producers.push(ProducerType {
            name: name.to_string(),
            base_price,
            base_rate,
        });
        self.catalog.producer_names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn add_modifier(
        &mut self,
        name: &str,
        price: f64,
        requirements: Requirements,
        effects: Vec<(Target, Effect)>,
        hardcore_disabled: bool,
    ) -> Result<ModifierId, CatalogError> {
        if self.catalog.modifier_names.contains_key(name) {
            return Err(CatalogError::Duplicate {
                kind: "modifier",
                name: name.to_string(),
            });
        }
        if !(price.is_finite() && price >= 0.0) {
            return Err(invalid(name, "price", format!("{} is not a price", price)));
        }
        for &(id, _) in &requirements.producers {
            self.check_producer(name, id)?;
        }
        for (target, effect) in &effects {
            if let Target::Producer(id) = target {
                self.check_producer(name, *id)?;
            }
            match effect {
                Effect::RateShare(_) if *target != Target::Mouse => {
                    return Err(invalid(
                        name,
                        "effects",
                        "rate_share only applies to mouse".to_string(),
                    ));
                }
                Effect::Synergy { source, per, .. } => {
                    self.check_producer(name, *source)?;
                    if *per == 0 {
                        return Err(invalid(name, "effects", "synergy divisor is zero".to_string()));
                    }
                }
                Effect::PerBuilding {
                    excluding: Some(id),
                    ..
                } => self.check_producer(name, *id)?,
                _ => {}
            }
        }

        let id = ModifierId(self.catalog.modifiers.len());
        self.catalog.modifiers.push(Modifier {
            id,
            name: name.to_string(),
            price,
            requirements,
            effects,
            hardcore_disabled,
        });
        self.catalog.modifier_names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn add_milestone(
        &mut self,
        name: &str,
        requirement: Requirement,
    ) -> Result<MilestoneId, CatalogError> {
        if self.catalog.milestone_names.contains_key(name) {
            return Err(CatalogError::Duplicate {
                kind: "milestone",
                name: name.to_string(),
            });
        }
        match &requirement {
            Requirement::ProducerCount { producer, .. }
            | Requirement::ProducerLevel { producer, .. } => {
                self.check_producer(name, *producer)?
            }
            _ => {}
        }

        let id = MilestoneId(self.catalog.milestones.len());
        self.catalog.milestones.push(Milestone {
            id,
            name: name.to_string(),
            requirement,
        });
        self.catalog.milestone_names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn build(self) -> Catalog {
        self.catalog
    }

    fn check_producer(&self, owner: &str, id: ProducerId) -> Result<(), CatalogError> {
        if id.0 < self.catalog.producers.len() {
            Ok(())
        } else {
            Err(CatalogError::UnknownProducer(format!("#{} (in '{}')", id.0, owner)))
        }
    }
}

fn invalid(name: &str, field: &'static str, reason: String) -> CatalogError {
    CatalogError::InvalidValue {
        name: name.to_string(),
        field,
        reason,
    }
}
