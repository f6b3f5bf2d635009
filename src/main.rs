//! Cookie Router - Command Line Interface
//!
//! This is the main entry point for the purchase route planner.
//! Run with `--help` to see all available options. Set `RUST_LOG=debug`
//! to follow the planner step by step.

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

use cookie_router::{
    categories::Category,
    data::{builtin_catalog, load_catalog, BUILTIN_VERSIONS, DEFAULT_VERSION},
    display::{display_catalog, display_route, format_number},
    models::{Goal, PlanOptions, StartingState},
    optimizer::Planner,
};

/// Command-line arguments for Cookie Router.
#[derive(Parser, Debug)]
#[command(name = "cookie-router")]
#[command(
    author,
    version,
    about = "Plan the fastest purchase order for Cookie Clicker runs",
    long_about = None
)]
struct Args {
    /// Game version to plan for (built-in: v2031, v2048, v10466)
    #[arg(long)]
    version_data: Option<String>,

    /// Directory holding producers.csv, modifiers.csv and milestones.csv
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Predefined run (short, fledgling, neverclick, hardcore, forty, longhaul, nevercore)
    #[arg(long)]
    category: Option<Category>,

    /// Cookies to have in the bank at the end
    #[arg(short, long)]
    target: Option<f64>,

    /// Milestone to unlock (repeatable); replaces the cookie target
    #[arg(short, long)]
    milestone: Vec<String>,

    // ========== Planner ==========
    /// Purchases simulated ahead when scoring a candidate (at least 1; above 4 is slow)
    #[arg(long)]
    lookahead: Option<u32>,

    /// Clicks per second on the big cookie
    #[arg(long)]
    click_rate: Option<f64>,

    /// Seconds spent away from the big cookie per purchase
    #[arg(long)]
    purchase_delay: Option<f64>,

    /// Forbid upgrades
    #[arg(long, default_value = "false")]
    hardcore: bool,

    /// Disable sugar lumps
    #[arg(long, default_value = "false")]
    no_bonus: bool,

    /// Upper bound on route steps
    #[arg(long)]
    max_steps: Option<usize>,

    // ========== Starting state ==========
    /// Owned producers at the start, as NAME=COUNT (repeatable)
    #[arg(long, value_parser = parse_own)]
    own: Vec<(String, i64)>,

    /// Cookies in the bank at the start
    #[arg(long)]
    start_cookies: Option<f64>,

    // ========== Output ==========
    /// Print the route as JSON
    #[arg(long, default_value = "false")]
    json: bool,

    /// List the catalog instead of planning
    #[arg(long, default_value = "false")]
    list: bool,
}

/// Parses a `NAME=COUNT` pair.
fn parse_own(s: &str) -> Result<(String, i64), String> {
    let (name, count) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=COUNT, got '{}'", s))?;
    let count = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid count in '{}'", s))?;
    Ok((name.trim().to_string(), count))
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let preset = args.category.map(|c| c.preset());
    let version = args
        .version_data
        .clone()
        .or_else(|| preset.as_ref().map(|p| p.version.to_string()))
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());

    let catalog = match &args.data_dir {
        Some(dir) => load_catalog(dir, &version)?,
        None => builtin_catalog(&version).map_err(|e| {
            format!("{} (built-in versions: {})", e, BUILTIN_VERSIONS.join(", "))
        })?,
    };

    if args.list {
        display_catalog(&catalog);
        return Ok(());
    }

    let (preset_goal, mut options, mut start) = match preset {
        Some(p) => (Some(p.goal), p.options, p.start),
        None => (None, PlanOptions::default(), StartingState::default()),
    };

    // Explicit flags override the category preset
    if let Some(lookahead) = args.lookahead {
        options.lookahead = lookahead;
    }
    if let Some(click_rate) = args.click_rate {
        options.click_rate = click_rate;
    }
    if let Some(delay) = args.purchase_delay {
        options.purchase_delay = delay;
    }
    if let Some(max_steps) = args.max_steps {
        options.max_steps = max_steps;
    }
    options.hardcore |= args.hardcore;
    if args.no_bonus {
        options.bonus.enabled = false;
    }
    for (name, count) in &args.own {
        start.producers.insert(name.clone(), *count);
    }
    if let Some(cookies) = args.start_cookies {
        start.resource = cookies;
    }

    let goal = if !args.milestone.is_empty() {
        Goal::Milestones(args.milestone.clone())
    } else if let Some(target) = args.target {
        Goal::Resource(target)
    } else if let Some(goal) = preset_goal {
        goal
    } else {
        return Err("one of --target, --milestone or --category is required".into());
    };

    let mut planner = Planner::new(&catalog, options);

    if !args.json {
        let options = planner.options();
        println!("Cookie Router - Purchase Order Planner");
        println!("================================================================");
        println!();
        println!("Configuration:");
        println!("  Version:         {}", catalog.version());
        match &goal {
            Goal::Resource(target) => {
                println!("  Target:          {} cookies", format_number(*target))
            }
            Goal::Milestones(names) => println!("  Milestones:      {}", names.join(", ")),
        }
        println!("  Click rate:      {}/s", options.click_rate);
        println!("  Purchase delay:  {}s", options.purchase_delay);
        println!("  Lookahead:       {}", options.lookahead);
        println!(
            "  Mode:            {}",
            if options.hardcore { "Hardcore" } else { "Normal" }
        );
        println!(
            "  Sugar lumps:     {}",
            if options.bonus.enabled { "on" } else { "off" }
        );
    }

    let route = match planner.plan(&start, &goal) {
        Ok(route) => route,
        Err(e) => {
            let done = planner.partial_route().len();
            if done > 0 {
                eprintln!("[WARNING] Planning stopped after {} steps.", done);
            }
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&route)?);
    } else {
        display_route(&route);
    }

    Ok(())
}
