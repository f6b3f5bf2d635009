//! Display and formatting utilities for cookie routes.
//!
//! This module provides functions for formatting output and displaying
//! planned routes and catalogs to the user in a readable format.

use crate::catalog::Catalog;
use crate::models::{BonusEvent, Requirement, Route, RouteStep};

/// Width of the step label column.
const LABEL_WIDTH: usize = 28;

/// Formats a duration in seconds to a human-readable string.
///
/// # Arguments
///
/// * `seconds` - Duration in seconds
///
/// # Returns
///
/// A formatted string like "2d 3h 0m 0s", "1h 30m 45s", "15m 30s", or "45s"
///
/// # Example
///
/// ```
/// use cookie_router::display::format_time;
///
/// assert_eq!(format_time(3665.0), "1h 1m 5s");
/// assert_eq!(format_time(125.0), "2m 5s");
/// assert_eq!(format_time(45.0), "45s");
/// assert_eq!(format_time(90_000.0), "1d 1h 0m 0s");
/// ```
pub fn format_time(seconds: f64) -> String {
    let days = (seconds / 86400.0).floor();
    let hours = ((seconds % 86400.0) / 3600.0).floor();
    let minutes = ((seconds % 3600.0) / 60.0).floor();
    let secs = seconds % 60.0;

    if days > 0.0 {
        format!("{}d {}h {}m {:.0}s", days, hours, minutes, secs)
    } else if hours > 0.0 {
        format!("{}h {}m {:.0}s", hours, minutes, secs)
    } else if minutes > 0.0 {
        format!("{}m {:.0}s", minutes, secs)
    } else {
        format!("{:.0}s", secs)
    }
}

/// Formats a cookie amount or rate.
///
/// Small values keep one decimal; from a million on, scientific notation is used.
///
/// # Example
///
/// ```
/// use cookie_router::display::format_number;
///
/// assert_eq!(format_number(15.0), "15.0");
/// assert_eq!(format_number(2.5e9), "2.50e9");
/// ```
pub fn format_number(value: f64) -> String {
    if value.abs() < 1e6 {
        format!("{:.1}", value)
    } else {
        format!("{:.2e}", value)
    }
}

/// Short description of what a step did.
///
/// Producers show the count owned after the purchase, e.g. `Cursor [3]`.
pub fn step_label(step: &RouteStep) -> String {
    match &step.bonus {
        Some(BonusEvent::Unlocked) => "Sugar lumps unlocked".to_string(),
        Some(BonusEvent::Harvested { units, .. }) => format!("Harvest {} sugar lump(s)", units),
        Some(BonusEvent::LevelUp {
            producer, level, ..
        }) => format!("{} level {}", producer, level),
        None => match step.owned_after {
            Some(count) if step.is_producer => format!("{} [{}]", step.target_name, count),
            _ => step.target_name.clone(),
        },
    }
}

/// One line per step: label, minutes elapsed, bank and rate.
pub fn format_step(step: &RouteStep) -> String {
    let mut label = step_label(step);
    if label.chars().count() > LABEL_WIDTH {
        label = label.chars().take(LABEL_WIDTH).collect();
    }
    format!(
        "{:>5}  {:<width$}  {:>10.2}  {:>10}  {:>10}",
        step.order,
        label,
        step.time_after / 60.0,
        format_number(step.resource_after),
        format_number(step.rate_after),
        width = LABEL_WIDTH
    )
}

/// Displays a planned route to stdout.
///
/// This function prints:
/// - Every step with its time, bank and rate
/// - Milestones unlocked along the way
/// - Summary statistics (time, rate, bank, sugar lumps)
///
/// # Arguments
///
/// * `route` - The planned route
pub fn display_route(route: &Route) {
    println!();
    println!("+================================================================+");
    println!("|                  COOKIE CLICKER PURCHASE ROUTE                 |");
    println!("+================================================================+");
    println!();

    println!("[STEPS]");
    println!("----------------------------------------------------------------");
    println!(
        "{:>5}  {:<width$}  {:>10}  {:>10}  {:>10}",
        "#",
        "Purchase",
        "Minutes",
        "Bank",
        "Rate",
        width = LABEL_WIDTH
    );
    println!("----------------------------------------------------------------");
    for step in &route.steps {
        println!("{}", format_step(step));
        for name in &step.newly_unlocked_milestones {
            println!("       * {}", name);
        }
    }

    println!();
    println!("[SUMMARY]");
    println!("----------------------------------------------------------------");
    println!("  Steps:            {}", route.steps.len());
    println!("  Total Time:       {}", format_time(route.total_time));
    println!("  Final Rate:       {}/s", format_number(route.final_rate));
    println!("  Final Bank:       {}", format_number(route.final_resource));
    println!("  Milestones:       {}", route.unlocked_milestones.len());
    if !route.unlocked_at_finish.is_empty() {
        println!("    - At finish:    {}", route.unlocked_at_finish.join(", "));
    }
    if let Some(bonus) = &route.bonus {
        println!();
        println!("  [SUGAR LUMPS]");
        if let Some(t) = bonus.unlock_time {
            println!("  Unlocked at:      {}", format_time(t));
        }
        println!("  Harvested:        {}", bonus.harvested);
        println!("  Spent:            {}", bonus.spent);
    }
    println!();
}

fn describe_requirement(catalog: &Catalog, requirement: &Requirement) -> String {
    match requirement {
        Requirement::ProducerCount { producer, count } => {
            format!("own {} {}", count, catalog.producer(*producer).name)
        }
        Requirement::Rate(rate) => format!("bake {}/s", format_number(*rate)),
        Requirement::Lifetime(total) => format!("bake {} in total", format_number(*total)),
        Requirement::ModifierCount(n) => format!("own {} upgrades", n),
        Requirement::TotalProducers(n) => format!("own {} buildings", n),
        Requirement::MinPerType(n) => format!("own {} of every building", n),
        Requirement::ProducerLevel { producer, level } => {
            format!("{} at level {}", catalog.producer(*producer).name, level)
        }
        Requirement::NotRoutable(reason) => format!("not routable: {}", reason),
    }
}

/// Displays the contents of a catalog.
///
/// # Arguments
///
/// * `catalog` - The catalog to list
pub fn display_catalog(catalog: &Catalog) {
    println!();
    println!("[CATALOG {}]", catalog.version());
    println!("----------------------------------------------------------------");
    println!("{:<24} {:>16} {:>16}", "Producer", "Base price", "Base rate");
    println!("----------------------------------------------------------------");
    for producer in catalog.producers() {
        println!(
            "{:<24} {:>16} {:>16}",
            producer.name,
            format_number(producer.base_price),
            format_number(producer.base_rate)
        );
    }

    println!();
    println!("  Modifiers:        {}", catalog.modifiers().len());
    println!(
        "    - Hardcore-safe: {}",
        catalog.purchasable_modifier_count(true)
    );

    println!();
    println!("[MILESTONES]");
    println!("----------------------------------------------------------------");
    for milestone in catalog.milestones() {
        println!(
            "  {:<32} {}",
            milestone.name,
            describe_requirement(catalog, &milestone.requirement)
        );
    }
    println!();
}
