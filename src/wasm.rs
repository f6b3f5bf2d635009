//! WebAssembly bindings for Cookie Router.
//!
//! This module provides JavaScript-accessible functions for the route planner.
//! Every entry point takes and returns JSON strings.

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::bonus::BonusState;
use crate::categories::Category;
use crate::data::{builtin_catalog, BUILTIN_VERSIONS, DEFAULT_VERSION};
use crate::display::format_time;
use crate::error::PlanError;
use crate::models::{Goal, PlanOptions, RouteStep, StartingState};
use crate::optimizer::Planner;

/// JavaScript-friendly input for planning.
///
/// A `category` fills in version, goal, options and starting state; any
/// field given explicitly replaces the preset value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsPlanInput {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub goal: Option<Goal>,
    #[serde(default)]
    pub options: Option<PlanOptions>,
    #[serde(default)]
    pub start: Option<StartingState>,
}

/// JavaScript-friendly planning result.
#[derive(Debug, Clone, Serialize)]
pub struct JsPlanResult {
    pub success: bool,
    pub error: Option<String>,
    /// Error class, e.g. `unreachable_goal`
    pub error_kind: Option<String>,
    pub version: String,
    pub steps: Vec<RouteStep>,
    pub total_time_seconds: f64,
    pub total_time_formatted: String,
    pub final_rate: f64,
    pub final_resource: f64,
    pub unlocked_milestones: Vec<String>,
    pub unlocked_at_finish: Vec<String>,
    pub bonus: Option<BonusState>,
}

impl JsPlanResult {
    fn failure(version: &str, error: String, kind: &str) -> Self {
        report_error(&error);
        JsPlanResult {
            success: false,
            error: Some(error),
            error_kind: Some(kind.to_string()),
            version: version.to_string(),
            steps: vec![],
            total_time_seconds: 0.0,
            total_time_formatted: "0s".to_string(),
            final_rate: 0.0,
            final_resource: 0.0,
            unlocked_milestones: vec![],
            unlocked_at_finish: vec![],
            bonus: None,
        }
    }
}

fn error_kind(error: &PlanError) -> &'static str {
    match error {
        PlanError::UnknownCatalogEntry(_) => "unknown_catalog_entry",
        PlanError::UnreachableGoal(_) => "unreachable_goal",
        PlanError::InvalidStartingState(_) => "invalid_starting_state",
        PlanError::ConfigurationError(_) => "configuration_error",
        PlanError::Cancelled { .. } => "cancelled",
    }
}

#[cfg(target_arch = "wasm32")]
fn report_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn report_error(message: &str) {
    log::error!("{}", message);
}

/// Plans a route from a JSON input; shared by the exported functions.
///
/// # Arguments
///
/// * `input_json` - A serialized [`JsPlanInput`]
/// * `progress` - Called with the step count after every step
///
/// # Example
///
/// ```
/// use cookie_router::wasm::run_plan;
///
/// let result = run_plan(r#"{"category": "short"}"#, None);
/// assert!(result.success);
/// assert_eq!(result.version, "v2031");
/// ```
pub fn run_plan(input_json: &str, progress: Option<&mut dyn FnMut(usize)>) -> JsPlanResult {
    let input: JsPlanInput = match serde_json::from_str(input_json) {
        Ok(i) => i,
        Err(e) => {
            return JsPlanResult::failure(
                DEFAULT_VERSION,
                format!("Invalid input: {}", e),
                "invalid_input",
            )
        }
    };

    let preset = input.category.map(|c| c.preset());
    let version = input
        .version
        .or_else(|| preset.as_ref().map(|p| p.version.to_string()))
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());

    let catalog = match builtin_catalog(&version) {
        Ok(c) => c,
        Err(e) => return JsPlanResult::failure(&version, e.to_string(), "catalog_error"),
    };

    let (preset_goal, preset_options, preset_start) = match preset {
        Some(p) => (Some(p.goal), p.options, p.start),
        None => (None, PlanOptions::default(), StartingState::default()),
    };
    let Some(goal) = input.goal.or(preset_goal) else {
        return JsPlanResult::failure(
            &version,
            "Either a goal or a category is required.".to_string(),
            "invalid_input",
        );
    };
    let options = input.options.unwrap_or(preset_options);
    let start = input.start.unwrap_or(preset_start);

    let mut planner = Planner::new(&catalog, options);
    if let Some(callback) = progress {
        planner = planner.with_progress(callback);
    }

    match planner.plan(&start, &goal) {
        Ok(route) => JsPlanResult {
            success: true,
            error: None,
            error_kind: None,
            version,
            total_time_seconds: route.total_time,
            total_time_formatted: format_time(route.total_time),
            final_rate: route.final_rate,
            final_resource: route.final_resource,
            unlocked_milestones: route.unlocked_milestones,
            unlocked_at_finish: route.unlocked_at_finish,
            bonus: route.bonus,
            steps: route.steps,
        },
        Err(e) => JsPlanResult::failure(&version, e.to_string(), error_kind(&e)),
    }
}

/// Plan a purchase route.
///
/// Takes a JSON string input and returns a JSON string result.
#[wasm_bindgen]
pub fn plan_route(input_json: &str) -> String {
    serde_json::to_string(&run_plan(input_json, None)).unwrap_or_default()
}

/// Plan a purchase route, calling `callback(steps)` after every step.
#[wasm_bindgen]
pub fn plan_route_with_progress(input_json: &str, callback: &js_sys::Function) -> String {
    let mut notify = |steps: usize| {
        let _ = callback.call1(&JsValue::NULL, &JsValue::from_f64(steps as f64));
    };
    serde_json::to_string(&run_plan(input_json, Some(&mut notify))).unwrap_or_default()
}

/// Get the built-in game versions as a JSON array.
#[wasm_bindgen]
pub fn available_versions() -> String {
    serde_json::to_string(BUILTIN_VERSIONS).unwrap_or_default()
}

/// Get the version of the planner.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
