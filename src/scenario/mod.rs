//! External input/output contracts: scenario files, the constants file,
//! and the assumptions file (§6). This is the "external collaborator"
//! boundary made concrete — the engine core never touches the filesystem
//! directly, mirroring the teacher's `assumptions::loader` /
//! `policy::loader` split between file I/O and in-memory model types.

pub mod constants;

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assumptions::{Assumptions, ScheduledField};
use crate::error::{EngineError, Result};

/// One liability cashflow configuration, before expansion into individual
/// `Liability` instances.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LiabilityConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub start_date: NaiveDate,
    pub amount_today: f64,
    #[serde(default)]
    pub duration_years: Option<u32>,
    #[serde(default)]
    pub inflation_rate: Option<f64>,
}

/// One contribution configuration: a recurring (monthly or annual)
/// stream, or a single one-time inflow/outflow.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContributionConfig {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: f64,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub month: Option<u32>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// A single scenario: a portfolio, its liabilities, and its contribution
/// schedule, ready to feed a `Model`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioInput {
    pub name: String,
    /// Not part of the documented contract; defaults to today, matching the
    /// original's `pd.Timestamp.today()`. A scenario file may set it
    /// explicitly to pin a run to a fixed "as of" date.
    #[serde(default = "today")]
    pub valuation_date: NaiveDate,
    pub assets_today: f64,
    #[serde(default)]
    pub liabilities: Vec<LiabilityConfig>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub contributions: Vec<ContributionConfig>,
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// The output payload for one scenario (§6).
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub assets_today: f64,
    pub surplus_at_maturity: f64,
    pub allocations: BTreeMap<String, f64>,
    pub net_contribution_today: f64,
    pub monthly_contribution: f64,
}

/// `number` or `{default, schedule: [{start, end, value}]}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum AssetSpec {
    Scalar(f64),
    Scheduled {
        default: f64,
        #[serde(default)]
        schedule: Vec<ScheduleEntry>,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct ScheduleEntry {
    start: NaiveDate,
    end: NaiveDate,
    value: f64,
}

impl AssetSpec {
    fn into_field(self) -> ScheduledField {
        match self {
            AssetSpec::Scalar(default) => ScheduledField::constant(default),
            AssetSpec::Scheduled { default, schedule } => ScheduledField::with_schedule(
                default,
                schedule.into_iter().map(|e| (e.start, e.end, e.value)).collect(),
            ),
        }
    }
}

/// `{inflation_cpi, discount_rate, assets: {name -> spec}}`.
#[derive(Debug, Clone, Deserialize)]
struct AssumptionsFileRaw {
    inflation_cpi: Option<AssetSpec>,
    discount_rate: Option<AssetSpec>,
    assets: Option<BTreeMap<String, AssetSpec>>,
}

/// Parse the assumptions file contract, failing with `ConfigInvalid` if a
/// required top-level key is missing (rather than a generic JSON error —
/// the contract, not the JSON syntax, is what's malformed).
pub fn parse_assumptions(raw: Value) -> Result<Assumptions> {
    let raw: AssumptionsFileRaw = serde_json::from_value(raw)?;

    let inflation = raw
        .inflation_cpi
        .ok_or_else(|| EngineError::ConfigInvalid("assumptions missing 'inflation_cpi'".into()))?
        .into_field();
    let discount_rate = raw
        .discount_rate
        .ok_or_else(|| EngineError::ConfigInvalid("assumptions missing 'discount_rate'".into()))?
        .into_field();
    let assets = raw
        .assets
        .ok_or_else(|| EngineError::ConfigInvalid("assumptions missing 'assets'".into()))?
        .into_iter()
        .map(|(name, spec)| (name, spec.into_field()))
        .collect();

    Ok(Assumptions::new(inflation, discount_rate, assets))
}

/// Parse a scenario, after constants have already been resolved.
pub fn parse_scenario(raw: Value) -> Result<ScenarioInput> {
    Ok(serde_json::from_value(raw)?)
}

pub fn load_json_file(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Load and fully resolve a scenario file against an optional constants
/// file, returning a ready-to-run `ScenarioInput`.
pub fn load_scenario(scenario_path: &Path, constants_path: Option<&Path>) -> Result<ScenarioInput> {
    let raw_scenario = load_json_file(scenario_path)?;

    let constants = match constants_path {
        Some(path) if path.exists() => match load_json_file(path)? {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        },
        _ => serde_json::Map::new(),
    };

    let resolved = constants::resolve(raw_scenario, &constants);
    parse_scenario(resolved)
}

/// Load assumptions from a JSON file at `path`.
pub fn load_assumptions(path: &Path) -> Result<Assumptions> {
    parse_assumptions(load_json_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_assumptions_flat_and_scheduled() {
        let raw = json!({
            "inflation_cpi": 0.02,
            "discount_rate": {
                "default": 0.0475,
                "schedule": [{"start": "2026-01-01", "end": "2026-12-01", "value": 0.06}]
            },
            "assets": {
                "us_equity_total_market": 0.08
            }
        });
        let assumptions = parse_assumptions(raw).unwrap();
        let d = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert_eq!(assumptions.discount_rate(d), 0.06);
    }

    #[test]
    fn parse_assumptions_missing_key_is_config_invalid() {
        let raw = json!({"inflation_cpi": 0.02, "assets": {}});
        let err = parse_assumptions(raw).unwrap_err();
        assert!(matches!(err, EngineError::ConfigInvalid(_)));
    }

    #[test]
    fn parse_scenario_round_trips_liabilities_and_contributions() {
        let raw = json!({
            "name": "Tuition",
            "valuation_date": "2026-01-01",
            "assets_today": 100000.0,
            "liabilities": [{
                "type": "recurring",
                "start_date": "2036-08-01",
                "amount_today": 10000.0,
                "duration_years": 4
            }],
            "contributions": [{
                "type": "recurring",
                "amount": 500.0,
                "frequency": "monthly"
            }]
        });
        let scenario = parse_scenario(raw).unwrap();
        assert_eq!(scenario.name, "Tuition");
        assert_eq!(scenario.liabilities.len(), 1);
        assert_eq!(scenario.liabilities[0].duration_years, Some(4));
        assert_eq!(scenario.contributions.len(), 1);
    }
}
