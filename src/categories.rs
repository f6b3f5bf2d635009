//! Predefined speedrun categories.
//!
//! Each category bundles a game version, a goal, planner options and a
//! starting state, so a common run can be planned by name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Goal, PlanOptions, StartingState};

const MILLION: f64 = 1e6;
const BILLION: f64 = 1e9;

/// A named run category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// 1 000 cookies; a quick smoke run
    Short,
    /// 1 million cookies, opening with ten cursors
    Fledgling,
    /// 1 million cookies without clicking after the first cursor
    Neverclick,
    /// 1 billion cookies without upgrades
    Hardcore,
    /// 30 million cookies, enough for forty achievements
    Forty,
    /// 1 octillion cookies, the first long-term ascension
    Longhaul,
    /// 1 million cookies, no upgrades and almost no clicking
    Nevercore,
}

/// Everything needed to plan a category.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub version: &'static str,
    pub goal: Goal,
    pub options: PlanOptions,
    pub start: StartingState,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Short,
        Category::Fledgling,
        Category::Neverclick,
        Category::Hardcore,
        Category::Forty,
        Category::Longhaul,
        Category::Nevercore,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Short => "short",
            Category::Fledgling => "fledgling",
            Category::Neverclick => "neverclick",
            Category::Hardcore => "hardcore",
            Category::Forty => "forty",
            Category::Longhaul => "longhaul",
            Category::Nevercore => "nevercore",
        }
    }

    /// Builds the preset of this category.
    ///
    /// # Example
    ///
    /// ```
    /// use cookie_router::categories::Category;
    /// use cookie_router::models::Goal;
    ///
    /// let preset = Category::Fledgling.preset();
    /// assert_eq!(preset.version, "v2031");
    /// assert_eq!(preset.goal, Goal::Resource(1e6));
    /// assert_eq!(preset.start.prelude.len(), 10);
    /// ```
    pub fn preset(&self) -> Preset {
        let clicking = PlanOptions {
            click_rate: 8.0,
            purchase_delay: 1.0,
            ..PlanOptions::default()
        };
        let one_cursor = StartingState {
            prelude: vec!["Cursor".to_string()],
            ..StartingState::default()
        };

        match self {
            Category::Short => Preset {
                version: "v2031",
                goal: Goal::Resource(1000.0),
                options: clicking,
                start: StartingState::default(),
            },
            Category::Fledgling => Preset {
                version: "v2031",
                goal: Goal::Resource(MILLION),
                options: clicking,
                // Ten cursors unlock the mouse upgrades early
                start: StartingState {
                    prelude: vec!["Cursor".to_string(); 10],
                    ..StartingState::default()
                },
            },
            Category::Neverclick => Preset {
                version: "v2031",
                goal: Goal::Resource(MILLION),
                options: PlanOptions::default(),
                start: StartingState {
                    producers: [("Cursor".to_string(), 1)].into_iter().collect(),
                    lifetime_resource: Some(15.0),
                    elapsed_time: 1.2,
                    ..StartingState::default()
                },
            },
            Category::Hardcore => Preset {
                version: "v2048",
                goal: Goal::Resource(BILLION),
                options: PlanOptions {
                    hardcore: true,
                    ..clicking
                },
                start: StartingState::default(),
            },
            Category::Forty => Preset {
                version: "v10466",
                goal: Goal::Resource(30.0 * MILLION),
                options: clicking,
                start: one_cursor,
            },
            Category::Longhaul => Preset {
                version: "v2048",
                goal: Goal::Resource(1e27),
                options: clicking,
                start: one_cursor,
            },
            Category::Nevercore => Preset {
                version: "v2048",
                goal: Goal::Resource(MILLION),
                options: PlanOptions {
                    click_rate: 0.0001,
                    hardcore: true,
                    ..PlanOptions::default()
                },
                start: StartingState {
                    producers: [("Cursor".to_string(), 1)].into_iter().collect(),
                    ..StartingState::default()
                },
            },
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<&str> = Category::ALL.iter().map(|c| c.name()).collect();
                format!("unknown category '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}
