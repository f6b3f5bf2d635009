//! Tests for the route planner.

use std::sync::atomic::AtomicBool;

use cookie_router::catalog::Catalog;
use cookie_router::categories::Category;
use cookie_router::data::builtin_catalog;
use cookie_router::error::PlanError;
use cookie_router::models::{
    BonusConfig, BonusEvent, Effect, Goal, PlanOptions, Requirement, Requirements, Route,
    StartingState, Target,
};
use cookie_router::optimizer::{plan, Planner};

// ============================================================================
// Fixtures
// ============================================================================

fn cursor_catalog() -> Catalog {
    let mut builder = Catalog::builder("cursor");
    let cursor = builder.add_producer("Cursor", 15.0, 0.1).unwrap();
    builder
        .add_milestone("Double-click", Requirement::ProducerCount { producer: cursor, count: 2 })
        .unwrap();
    builder
        .add_milestone("Mouse wheel", Requirement::ProducerCount { producer: cursor, count: 500 })
        .unwrap();
    builder.add_milestone("Wake and bake", Requirement::Lifetime(1.0)).unwrap();
    builder
        .add_milestone("Tabloid addiction", Requirement::NotRoutable("news ticker".to_string()))
        .unwrap();
    builder
        .add_milestone(
            "Dude, sugar lumps!",
            Requirement::ProducerLevel {
                producer: cursor,
                level: 1,
            },
        )
        .unwrap();
    builder.build()
}

fn farm_catalog() -> Catalog {
    let mut builder = Catalog::builder("farm");
    let cursor = builder.add_producer("Cursor", 15.0, 0.1).unwrap();
    builder.add_producer("Grandma", 100.0, 1.0).unwrap();
    builder
        .add_modifier(
            "Reinforced index finger",
            100.0,
            Requirements::none(),
            vec![
                (Target::Producer(cursor), Effect::Multiply(2.0)),
                (Target::Mouse, Effect::Multiply(2.0)),
            ],
            true,
        )
        .unwrap();
    builder.build()
}

fn clicking(rate: f64) -> PlanOptions {
    PlanOptions {
        click_rate: rate,
        ..PlanOptions::default()
    }
}

fn assert_well_formed(route: &Route) {
    for (i, step) in route.steps.iter().enumerate() {
        assert_eq!(step.order, i + 1);
        assert!(step.time_since_last_step >= 0.0);
    }
    for pair in route.steps.windows(2) {
        assert!(pair[1].time_after >= pair[0].time_after);
    }
    if let Some(last) = route.steps.last() {
        assert!(route.total_time >= last.time_after);
    }
}

// ============================================================================
// Resource goals
// ============================================================================

#[test]
fn test_single_producer_reaches_target() {
    let catalog = cursor_catalog();
    let route = plan(
        &catalog,
        &StartingState::default(),
        &Goal::Resource(1000.0),
        &clicking(1.0),
    )
    .unwrap();

    assert!(route.final_resource >= 1000.0);
    // Clicking alone takes 1000s; buying must not make it worse
    assert!(route.total_time <= 1000.0);
    assert!(!route.steps.is_empty());
    assert!(route.steps.iter().all(|s| s.target_name == "Cursor" && s.is_producer));
    assert_well_formed(&route);
}

#[test]
fn test_producer_prices_escalate_along_route() {
    let catalog = cursor_catalog();
    let route = plan(
        &catalog,
        &StartingState::default(),
        &Goal::Resource(5000.0),
        &clicking(1.0),
    )
    .unwrap();

    let costs: Vec<f64> = route.steps.iter().map(|s| s.resource_cost).collect();
    assert!(costs.len() >= 2);
    assert_eq!(costs[0], 15.0);
    for pair in costs.windows(2) {
        assert!((pair[1] / pair[0] - 1.15).abs() < 1e-9);
    }
}

#[test]
fn test_owned_after_counts_up() {
    let catalog = cursor_catalog();
    let route = plan(
        &catalog,
        &StartingState::default(),
        &Goal::Resource(5000.0),
        &clicking(1.0),
    )
    .unwrap();
    for (i, step) in route.steps.iter().enumerate() {
        assert_eq!(step.owned_after, Some(i as u32 + 1));
    }
}

#[test]
fn test_planning_is_deterministic() {
    let catalog = builtin_catalog("v2031").unwrap();
    let options = PlanOptions {
        click_rate: 8.0,
        purchase_delay: 1.0,
        ..PlanOptions::default()
    };
    let first = plan(&catalog, &StartingState::default(), &Goal::Resource(1e5), &options).unwrap();
    let second = plan(&catalog, &StartingState::default(), &Goal::Resource(1e5), &options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_deeper_lookahead_reaches_target() {
    let catalog = builtin_catalog("v2031").unwrap();
    let options = PlanOptions {
        lookahead: 2,
        click_rate: 8.0,
        ..PlanOptions::default()
    };
    let route = plan(&catalog, &StartingState::default(), &Goal::Resource(1e5), &options).unwrap();
    assert!(route.final_resource >= 1e5);
    assert_well_formed(&route);
}

#[test]
fn test_goal_already_met_gives_empty_route() {
    let catalog = cursor_catalog();
    let start = StartingState {
        resource: 2000.0,
        ..StartingState::default()
    };
    let route = plan(&catalog, &start, &Goal::Resource(1000.0), &clicking(1.0)).unwrap();
    assert!(route.steps.is_empty());
    assert_eq!(route.total_time, 0.0);
    assert_eq!(route.final_resource, 2000.0);
}

#[test]
fn test_prelude_purchases_come_first() {
    let catalog = cursor_catalog();
    let start = StartingState {
        prelude: vec!["Cursor".to_string(); 3],
        ..StartingState::default()
    };
    let route = plan(&catalog, &start, &Goal::Resource(1000.0), &clicking(1.0)).unwrap();

    assert!(route.steps.len() >= 3);
    for (i, step) in route.steps.iter().take(3).enumerate() {
        assert_eq!(step.target_name, "Cursor");
        assert_eq!(step.owned_after, Some(i as u32 + 1));
    }
}

#[test]
fn test_unknown_prelude_entry() {
    let catalog = cursor_catalog();
    let start = StartingState {
        prelude: vec!["Time machine".to_string()],
        ..StartingState::default()
    };
    let err = plan(&catalog, &start, &Goal::Resource(1000.0), &clicking(1.0)).unwrap_err();
    assert_eq!(err, PlanError::UnknownCatalogEntry("Time machine".to_string()));
}

#[test]
fn test_hardcore_skips_flagged_modifiers() {
    let catalog = farm_catalog();
    let goal = Goal::Resource(1e5);

    let normal = plan(&catalog, &StartingState::default(), &goal, &clicking(10.0)).unwrap();
    assert!(normal
        .steps
        .iter()
        .any(|s| s.target_name == "Reinforced index finger"));

    let options = PlanOptions {
        hardcore: true,
        ..clicking(10.0)
    };
    let hardcore = plan(&catalog, &StartingState::default(), &goal, &options).unwrap();
    assert!(hardcore.steps.iter().all(|s| s.is_producer));
    assert!(hardcore.final_resource >= 1e5);
}

#[test]
fn test_modifier_steps_report_rate_gain() {
    let catalog = farm_catalog();
    let route = plan(
        &catalog,
        &StartingState::default(),
        &Goal::Resource(1e5),
        &clicking(10.0),
    )
    .unwrap();
    let step = route
        .steps
        .iter()
        .find(|s| s.target_name == "Reinforced index finger")
        .unwrap();
    assert!(!step.is_producer);
    assert_eq!(step.owned_after, None);
    assert_eq!(step.resource_cost, 100.0);
    assert!(step.rate_delta > 0.0);
}

#[test]
fn test_category_short_plans() {
    let preset = Category::Short.preset();
    let catalog = builtin_catalog(preset.version).unwrap();
    let route = plan(&catalog, &preset.start, &preset.goal, &preset.options).unwrap();
    assert!(route.final_resource >= 1000.0);
    assert_well_formed(&route);
}

// ============================================================================
// Milestones
// ============================================================================

#[test]
fn test_milestone_goal_attaches_to_step() {
    let catalog = cursor_catalog();
    let goal = Goal::Milestones(vec!["Double-click".to_string()]);
    let route = plan(&catalog, &StartingState::default(), &goal, &clicking(1.0)).unwrap();

    assert_eq!(route.steps.len(), 2);
    assert!(route.steps[0].newly_unlocked_milestones.iter().all(|m| m != "Double-click"));
    assert!(route.steps[1]
        .newly_unlocked_milestones
        .contains(&"Double-click".to_string()));
    assert!(route.unlocked_milestones.contains(&"Double-click".to_string()));
}

#[test]
fn test_unmet_milestone_is_never_reported() {
    let catalog = cursor_catalog();
    let route = plan(
        &catalog,
        &StartingState::default(),
        &Goal::Resource(1000.0),
        &clicking(1.0),
    )
    .unwrap();

    assert!(!route.unlocked_milestones.contains(&"Mouse wheel".to_string()));
    let mut reported: Vec<String> = route
        .steps
        .iter()
        .flat_map(|s| s.newly_unlocked_milestones.iter().cloned())
        .chain(route.unlocked_at_finish.iter().cloned())
        .collect();
    reported.sort();
    let mut unlocked = route.unlocked_milestones.clone();
    unlocked.sort();
    // Each milestone is reported exactly once
    assert_eq!(reported, unlocked);
}

#[test]
fn test_lifetime_milestone_reached_by_waiting() {
    let catalog = cursor_catalog();
    let goal = Goal::Milestones(vec!["Wake and bake".to_string()]);
    let route = plan(&catalog, &StartingState::default(), &goal, &clicking(1.0)).unwrap();

    assert!(route.steps.is_empty());
    assert_eq!(route.unlocked_at_finish, vec!["Wake and bake".to_string()]);
    assert!((route.total_time - 1.0).abs() < 1e-9);
}

#[test]
fn test_not_routable_milestone_is_rejected() {
    let catalog = cursor_catalog();
    let goal = Goal::Milestones(vec!["Tabloid addiction".to_string()]);
    let err = plan(&catalog, &StartingState::default(), &goal, &clicking(1.0)).unwrap_err();
    assert!(matches!(err, PlanError::UnreachableGoal(_)));
}

#[test]
fn test_level_milestone_needs_bonus() {
    let catalog = cursor_catalog();
    let goal = Goal::Milestones(vec!["Dude, sugar lumps!".to_string()]);
    let options = PlanOptions {
        bonus: BonusConfig {
            enabled: false,
            ..BonusConfig::default()
        },
        ..clicking(1.0)
    };
    let err = plan(&catalog, &StartingState::default(), &goal, &options).unwrap_err();
    assert!(matches!(err, PlanError::UnreachableGoal(_)));
}

#[test]
fn test_unknown_milestone() {
    let catalog = cursor_catalog();
    let goal = Goal::Milestones(vec!["Golden cookie".to_string()]);
    let err = plan(&catalog, &StartingState::default(), &goal, &clicking(1.0)).unwrap_err();
    assert_eq!(err, PlanError::UnknownCatalogEntry("Golden cookie".to_string()));
}

// ============================================================================
// Sugar lumps
// ============================================================================

#[test]
fn test_bonus_unlocks_once_and_harvests() {
    let catalog = builtin_catalog("v2031").unwrap();
    let options = clicking(8.0);
    assert_eq!(options.bonus, BonusConfig::default());

    let start = StartingState::default();
    let route = plan(&catalog, &start, &Goal::Resource(2e9), &options).unwrap();
    assert_well_formed(&route);

    let unlocks: Vec<_> = route
        .steps
        .iter()
        .filter(|s| s.bonus == Some(BonusEvent::Unlocked))
        .collect();
    assert_eq!(unlocks.len(), 1);
    assert!(unlocks[0].resource_after >= 1e9);

    // The first lump is ripe as soon as the subsystem unlocks
    let harvest = route
        .steps
        .iter()
        .find(|s| matches!(s.bonus, Some(BonusEvent::Harvested { .. })))
        .unwrap();
    assert!((harvest.time_after - unlocks[0].time_after).abs() < 1e-6);
    assert!(matches!(
        harvest.bonus,
        Some(BonusEvent::Harvested { units, available }) if units > 0 && available > 0
    ));
    assert!(route
        .steps
        .iter()
        .any(|s| matches!(s.bonus, Some(BonusEvent::LevelUp { .. }))));

    let bonus = route.bonus.unwrap();
    assert!(bonus.unlocked);
    assert!(bonus.spent > 0);
    assert_eq!(bonus.harvested, bonus.available + bonus.spent);
}

#[test]
fn test_level_goal_spends_lumps_in_order() {
    let catalog = builtin_catalog("v2031").unwrap();
    let grandma = catalog.producer_id("Grandma").unwrap();
    let goal = Goal::Milestones(vec!["Grandmatriarch".to_string()]);

    let route = plan(&catalog, &StartingState::default(), &goal, &clicking(8.0)).unwrap();
    assert_well_formed(&route);

    let level_ups: Vec<(String, u32, u64)> = route
        .steps
        .iter()
        .filter_map(|s| match &s.bonus {
            Some(BonusEvent::LevelUp {
                producer,
                level,
                cost,
                ..
            }) => Some((producer.clone(), *level, *cost)),
            _ => None,
        })
        .collect();
    // Lumps are saved for the goal producer; level N costs N
    assert_eq!(
        level_ups,
        vec![
            ("Grandma".to_string(), 1, 1),
            ("Grandma".to_string(), 2, 2),
            ("Grandma".to_string(), 3, 3),
        ]
    );

    assert!(route
        .steps
        .iter()
        .flat_map(|s| s.newly_unlocked_milestones.iter())
        .any(|m| m == "Grandmatriarch"));

    let bonus = route.bonus.unwrap();
    assert_eq!(bonus.levels[grandma.0], 3);
    assert_eq!(bonus.spent, 6);
    assert_eq!(bonus.harvested, bonus.available + bonus.spent);
}

#[test]
fn test_bonus_stays_locked_below_threshold() {
    let catalog = cursor_catalog();
    let route = plan(
        &catalog,
        &StartingState::default(),
        &Goal::Resource(1000.0),
        &clicking(1.0),
    )
    .unwrap();
    assert!(route.bonus.is_none());
    assert!(route.steps.iter().all(|s| s.bonus.is_none()));
}

// ============================================================================
// Errors and control
// ============================================================================

#[test]
fn test_negative_count_is_invalid() {
    let catalog = cursor_catalog();
    let start = StartingState {
        producers: [("Cursor".to_string(), -1)].into_iter().collect(),
        ..StartingState::default()
    };
    let mut planner = Planner::new(&catalog, clicking(1.0));
    let err = planner.plan(&start, &Goal::Resource(1000.0)).unwrap_err();
    assert!(matches!(err, PlanError::InvalidStartingState(_)));
    assert!(planner.partial_route().is_empty());
}

#[test]
fn test_lifetime_below_bank_is_invalid() {
    let catalog = cursor_catalog();
    let start = StartingState {
        resource: 100.0,
        lifetime_resource: Some(50.0),
        ..StartingState::default()
    };
    let err = plan(&catalog, &start, &Goal::Resource(1000.0), &clicking(1.0)).unwrap_err();
    assert!(matches!(err, PlanError::InvalidStartingState(_)));
}

#[test]
fn test_invalid_options() {
    let catalog = cursor_catalog();
    let goal = Goal::Resource(1000.0);
    let start = StartingState::default();

    let no_lookahead = PlanOptions {
        lookahead: 0,
        ..clicking(1.0)
    };
    assert!(matches!(
        plan(&catalog, &start, &goal, &no_lookahead),
        Err(PlanError::ConfigurationError(_))
    ));

    assert!(matches!(
        plan(&catalog, &start, &goal, &clicking(-1.0)),
        Err(PlanError::ConfigurationError(_))
    ));

    assert!(matches!(
        plan(&catalog, &start, &Goal::Resource(-5.0), &clicking(1.0)),
        Err(PlanError::ConfigurationError(_))
    ));

    assert!(matches!(
        plan(&catalog, &start, &Goal::Milestones(vec![]), &clicking(1.0)),
        Err(PlanError::ConfigurationError(_))
    ));
}

#[test]
fn test_planner_keeps_options() {
    let catalog = cursor_catalog();
    let options = PlanOptions {
        lookahead: 3,
        ..clicking(2.5)
    };
    let planner = Planner::new(&catalog, options.clone());
    assert_eq!(planner.options(), &options);
}

#[test]
fn test_deep_lookahead_is_accepted() {
    let catalog = cursor_catalog();
    let options = PlanOptions {
        lookahead: 5,
        ..clicking(1.0)
    };
    let route = plan(&catalog, &StartingState::default(), &Goal::Resource(1000.0), &options);
    assert!(route.unwrap().final_resource >= 1000.0);
}

#[test]
fn test_no_income_is_unreachable() {
    let catalog = cursor_catalog();
    let err = plan(
        &catalog,
        &StartingState::default(),
        &Goal::Resource(1000.0),
        &clicking(0.0),
    )
    .unwrap_err();
    assert!(matches!(err, PlanError::UnreachableGoal(_)));
}

#[test]
fn test_step_limit() {
    let catalog = cursor_catalog();
    let options = PlanOptions {
        max_steps: 2,
        ..clicking(1.0)
    };
    let mut planner = Planner::new(&catalog, options);
    let err = planner
        .plan(&StartingState::default(), &Goal::Resource(1e6))
        .unwrap_err();
    assert!(matches!(err, PlanError::UnreachableGoal(_)));
    assert_eq!(planner.partial_route().len(), 2);
}

#[test]
fn test_cancel_flag_stops_after_first_step() {
    let catalog = cursor_catalog();
    let flag = AtomicBool::new(true);
    let mut planner = Planner::new(&catalog, clicking(1.0)).with_cancel_flag(&flag);

    let err = planner
        .plan(&StartingState::default(), &Goal::Resource(1000.0))
        .unwrap_err();
    assert_eq!(err, PlanError::Cancelled { steps_completed: 1 });
    assert_eq!(planner.partial_route().len(), 1);
}

#[test]
fn test_progress_reports_every_step() {
    let catalog = cursor_catalog();
    let mut seen = Vec::new();
    let steps = {
        let mut planner =
            Planner::new(&catalog, clicking(1.0)).with_progress(|count| seen.push(count));
        planner
            .plan(&StartingState::default(), &Goal::Resource(1000.0))
            .unwrap()
            .steps
            .len()
    };
    assert_eq!(seen, (1..=steps).collect::<Vec<_>>());
}
