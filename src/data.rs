//! Version data loading.
//!
//! A game version is described by three CSV files in one directory:
//! `producers.csv`, `modifiers.csv` and `milestones.csv`. The versions
//! shipped with the crate are embedded at compile time and available
//! through [`builtin_catalog`].

use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::catalog::{Catalog, CatalogBuilder};
use crate::error::CatalogError;
use crate::models::{
    Effect, MilestoneRow, ModifierRow, ProducerId, ProducerRow, Requirement, Requirements, Target,
};

/// Versions embedded in the binary, oldest first.
pub const BUILTIN_VERSIONS: &[&str] = &["v2031", "v2048", "v10466"];

/// Version used when the caller does not pick one.
pub const DEFAULT_VERSION: &str = "v2048";

struct EmbeddedVersion {
    name: &'static str,
    producers: &'static str,
    modifiers: &'static str,
    milestones: &'static str,
}

const EMBEDDED: &[EmbeddedVersion] = &[
    EmbeddedVersion {
        name: "v2031",
        producers: include_str!("../data/v2031/producers.csv"),
        modifiers: include_str!("../data/v2031/modifiers.csv"),
        milestones: include_str!("../data/v2031/milestones.csv"),
    },
    EmbeddedVersion {
        name: "v2048",
        producers: include_str!("../data/v2048/producers.csv"),
        modifiers: include_str!("../data/v2048/modifiers.csv"),
        milestones: include_str!("../data/v2048/milestones.csv"),
    },
    EmbeddedVersion {
        name: "v10466",
        producers: include_str!("../data/v10466/producers.csv"),
        modifiers: include_str!("../data/v10466/modifiers.csv"),
        milestones: include_str!("../data/v10466/milestones.csv"),
    },
];

fn parse_error(what: &'static str, input: &str) -> CatalogError {
    CatalogError::Parse {
        what,
        input: input.to_string(),
    }
}

fn lookup(builder: &CatalogBuilder, name: &str) -> Result<ProducerId, CatalogError> {
    builder
        .producer_id(name)
        .ok_or_else(|| CatalogError::UnknownProducer(name.to_string()))
}

/// Splits a `Name:value` pair on its last colon; names may contain spaces.
fn split_pair(s: &str) -> Option<(&str, &str)> {
    let (name, value) = s.rsplit_once(':')?;
    Some((name.trim(), value.trim()))
}

/// Parses a requirement string such as `Cursor:10;Grandma:1`.
///
/// An empty or missing string means no requirement.
pub fn parse_requirements(
    input: Option<&str>,
    min_milestones: u32,
    builder: &CatalogBuilder,
) -> Result<Requirements, CatalogError> {
    let mut requirements = Requirements {
        producers: Vec::new(),
        min_milestones,
    };
    let Some(input) = input else {
        return Ok(requirements);
    };

    for part in input.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, count) = split_pair(part).ok_or_else(|| parse_error("requirement", part))?;
        let count: u32 = count.parse().map_err(|_| parse_error("requirement", part))?;
        requirements.producers.push((lookup(builder, name)?, count));
    }
    Ok(requirements)
}

fn parse_target(name: &str, builder: &CatalogBuilder) -> Result<Target, CatalogError> {
    match name {
        "mouse" => Ok(Target::Mouse),
        "all" => Ok(Target::All),
        _ => Ok(Target::Producer(lookup(builder, name)?)),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, entry: &str) -> Result<T, CatalogError> {
    value.trim().parse().map_err(|_| parse_error("effect", entry))
}

/// Parses one `kind:params` effect body.
fn parse_effect(body: &str, entry: &str, builder: &CatalogBuilder) -> Result<Effect, CatalogError> {
    let mut parts = body.split(':');
    let kind = parts.next().unwrap_or_default().trim();
    let params: Vec<&str> = parts.collect();

    let effect = match (kind, params.as_slice()) {
        ("add", [amount]) => Effect::Add(parse_number(amount, entry)?),
        ("multiply", [factor]) => Effect::Multiply(parse_number(factor, entry)?),
        ("percent", [percent]) => Effect::Percent(parse_number(percent, entry)?),
        ("rate_share", [share]) => Effect::RateShare(parse_number(share, entry)?),
        ("per_building", [amount]) => Effect::PerBuilding {
            amount: parse_number(amount, entry)?,
            excluding: None,
        },
        ("per_building", [amount, excluding]) => Effect::PerBuilding {
            amount: parse_number(amount, entry)?,
            excluding: Some(lookup(builder, excluding.trim())?),
        },
        ("synergy", [source, per, percent]) => Effect::Synergy {
            source: lookup(builder, source.trim())?,
            per: parse_number(per, entry)?,
            percent: parse_number(percent, entry)?,
        },
        _ => return Err(parse_error("effect", entry)),
    };
    Ok(effect)
}

/// Parses an effect list such as `Cursor=multiply:2;mouse=add:1`.
///
/// Targets are producer names or the `mouse` and `all` sentinels.
///
/// # Effect kinds
///
/// - `add:A`, `multiply:F`, `percent:P`, `rate_share:S`
/// - `per_building:A[:Excluded]`
/// - `synergy:Source:Per:Percent`
pub fn parse_effects(
    input: &str,
    builder: &CatalogBuilder,
) -> Result<Vec<(Target, Effect)>, CatalogError> {
    let mut effects = Vec::new();
    for entry in input.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (target, body) = entry
            .split_once('=')
            .ok_or_else(|| parse_error("effect", entry))?;
        let target = parse_target(target.trim(), builder)?;
        effects.push((target, parse_effect(body, entry, builder)?));
    }
    Ok(effects)
}

/// Parses the `kind` and `params` columns of a milestone row.
pub fn parse_milestone(
    kind: &str,
    params: Option<&str>,
    builder: &CatalogBuilder,
) -> Result<Requirement, CatalogError> {
    let params = params.unwrap_or("").trim();
    let number = |what: &'static str| -> Result<f64, CatalogError> {
        params.parse().map_err(|_| parse_error(what, params))
    };
    let count = |what: &'static str| -> Result<u32, CatalogError> {
        params.parse().map_err(|_| parse_error(what, params))
    };
    let producer_pair = |what: &'static str| -> Result<(ProducerId, u32), CatalogError> {
        let (name, value) = split_pair(params).ok_or_else(|| parse_error(what, params))?;
        let value = value.parse().map_err(|_| parse_error(what, params))?;
        Ok((lookup(builder, name)?, value))
    };

    let requirement = match kind {
        "lifetime" => Requirement::Lifetime(number("lifetime milestone")?),
        "rate" => Requirement::Rate(number("rate milestone")?),
        "modifier_count" => Requirement::ModifierCount(count("modifier milestone")?),
        "total_producers" => Requirement::TotalProducers(count("producer milestone")?),
        "min_per_type" => Requirement::MinPerType(count("producer milestone")?),
        "producer_count" => {
            let (producer, count) = producer_pair("producer milestone")?;
            Requirement::ProducerCount { producer, count }
        }
        "producer_level" => {
            let (producer, level) = producer_pair("level milestone")?;
            Requirement::ProducerLevel { producer, level }
        }
        "not_routable" => Requirement::NotRoutable(params.to_string()),
        _ => return Err(parse_error("milestone kind", kind)),
    };
    Ok(requirement)
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    ReaderBuilder::new().trim(csv::Trim::All).from_reader(source)
}

/// Adds every producer of a `producers.csv` source to the builder.
///
/// # CSV Format
///
/// Expected columns: `name, base_price, base_rate`
pub fn load_producers<R: Read>(
    source: R,
    builder: &mut CatalogBuilder,
) -> Result<(), CatalogError> {
    let mut rdr = reader(source);
    for result in rdr.deserialize() {
        let row: ProducerRow = result?;
        builder.add_producer(&row.name, row.base_price, row.base_rate)?;
    }
    Ok(())
}

/// Adds every modifier of a `modifiers.csv` source to the builder.
///
/// Producers must be loaded first.
///
/// # CSV Format
///
/// Expected columns: `name, price, requirements, effects, min_milestones, hardcore_disabled`
pub fn load_modifiers<R: Read>(
    source: R,
    builder: &mut CatalogBuilder,
) -> Result<(), CatalogError> {
    let mut rdr = reader(source);
    for result in rdr.deserialize() {
        let row: ModifierRow = result?;
        let requirements =
            parse_requirements(row.requirements.as_deref(), row.min_milestones, builder)?;
        let effects = parse_effects(&row.effects, builder)?;
        builder.add_modifier(
            &row.name,
            row.price,
            requirements,
            effects,
            row.hardcore_disabled,
        )?;
    }
    Ok(())
}

/// Adds every milestone of a `milestones.csv` source to the builder.
///
/// # CSV Format
///
/// Expected columns: `name, kind, params`
pub fn load_milestones<R: Read>(
    source: R,
    builder: &mut CatalogBuilder,
) -> Result<(), CatalogError> {
    let mut rdr = reader(source);
    for result in rdr.deserialize() {
        let row: MilestoneRow = result?;
        let requirement = parse_milestone(&row.kind, row.params.as_deref(), builder)?;
        builder.add_milestone(&row.name, requirement)?;
    }
    Ok(())
}

/// Loads a catalog from a directory holding the three CSV files.
///
/// # Arguments
///
/// * `data_dir` - Directory with `producers.csv`, `modifiers.csv` and `milestones.csv`
/// * `version` - Label stored in the catalog
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use cookie_router::data::load_catalog;
///
/// let catalog = load_catalog(Path::new("data/v2048"), "v2048").unwrap();
/// println!("Loaded {} producers", catalog.producers().len());
/// ```
pub fn load_catalog(data_dir: &Path, version: &str) -> Result<Catalog, CatalogError> {
    let mut builder = Catalog::builder(version);
    load_producers(File::open(data_dir.join("producers.csv"))?, &mut builder)?;
    load_modifiers(File::open(data_dir.join("modifiers.csv"))?, &mut builder)?;
    load_milestones(File::open(data_dir.join("milestones.csv"))?, &mut builder)?;
    Ok(builder.build())
}

/// Builds one of the catalogs embedded in the crate.
///
/// # Example
///
/// ```
/// use cookie_router::data::builtin_catalog;
///
/// let catalog = builtin_catalog("v2031").unwrap();
/// assert_eq!(catalog.producers()[0].name, "Cursor");
/// assert!(builtin_catalog("v1").is_err());
/// ```
pub fn builtin_catalog(version: &str) -> Result<Catalog, CatalogError> {
    let embedded = EMBEDDED
        .iter()
        .find(|v| v.name == version)
        .ok_or_else(|| CatalogError::UnknownVersion(version.to_string()))?;

    let mut builder = Catalog::builder(embedded.name);
    load_producers(embedded.producers.as_bytes(), &mut builder)?;
    load_modifiers(embedded.modifiers.as_bytes(), &mut builder)?;
    load_milestones(embedded.milestones.as_bytes(), &mut builder)?;
    Ok(builder.build())
}
