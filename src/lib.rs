//! # Cookie Router
//!
//! A command-line tool and library for planning purchase orders in Cookie Clicker.
//!
//! Given a game version, a starting state and a goal, the planner finds an
//! order of purchases that reaches the goal quickly, taking into account:
//!
//! - Producer prices growing by 15% per unit owned
//! - Upgrade effects (flat, percentage, multiplier and synergy boosts)
//! - Clicking, and the time lost walking to the store
//! - Achievements unlocked along the way
//! - Sugar lumps and the producer levels they buy
//!
//! ## Modules
//!
//! - [`models`] - Core data structures for catalogs, goals, options and routes
//! - [`catalog`] - The immutable per-version catalog and its builder
//! - [`data`] - CSV data loading and the embedded versions
//! - [`effects`] - Production rate calculation
//! - [`state`] - Mutable game state of a planning run
//! - [`milestones`] - Achievement tracking
//! - [`bonus`] - Sugar lump bookkeeping
//! - [`optimizer`] - The route planner
//! - [`categories`] - Predefined speedrun categories
//! - [`display`] - Output formatting and display utilities
//! - [`wasm`] - JSON bindings for the browser
//!
//! ## Example Usage
//!
//! ```no_run
//! use cookie_router::{
//!     data::builtin_catalog,
//!     display::display_route,
//!     models::{Goal, PlanOptions, StartingState},
//!     optimizer::Planner,
//! };
//!
//! // Load one of the embedded versions
//! let catalog = builtin_catalog("v2048").unwrap();
//!
//! // Eight clicks a second, one second lost per purchase
//! let options = PlanOptions {
//!     click_rate: 8.0,
//!     purchase_delay: 1.0,
//!     ..PlanOptions::default()
//! };
//!
//! // Plan the way to a million cookies
//! let mut planner = Planner::new(&catalog, options);
//! let route = planner
//!     .plan(&StartingState::default(), &Goal::Resource(1e6))
//!     .unwrap();
//! display_route(&route);
//! ```
//!
//! ## Goals
//!
//! The planner supports two kinds of goals:
//!
//! 1. **Cookies**: reach a bank total as fast as possible.
//!
//! 2. **Milestones**: unlock a set of named achievements. Achievements that
//!    purchases can never produce are rejected before planning starts.

pub mod bonus;
pub mod catalog;
pub mod categories;
pub mod data;
pub mod display;
pub mod effects;
pub mod error;
pub mod milestones;
pub mod models;
pub mod optimizer;
pub mod state;
pub mod wasm;

pub use catalog::Catalog;
pub use error::{CatalogError, PlanError};
pub use optimizer::{plan, Planner};
