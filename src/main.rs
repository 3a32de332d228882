//! LDI Engine demo
//!
//! A small built-in scenario that exercises the full projection stack
//! without needing a scenario file on disk. For file-driven runs, see the
//! `run` binary.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ldi_engine::{Assumptions, FundedStatus, GlidePath, Model, ScenarioShape};

fn main() {
    env_logger::init();

    println!("LDI Engine v0.1.0");
    println!("=================\n");

    let assumptions = Assumptions::flat(
        0.025,
        0.0475,
        BTreeMap::from([
            ("us_equity_total_market".to_string(), 0.08),
            ("intl_equity_developed".to_string(), 0.07),
            ("us_nominal_treasury_long".to_string(), 0.04),
            ("us_tips_long".to_string(), 0.03),
        ]),
    );

    let shape = ScenarioShape {
        name: "demo-college-fund".to_string(),
        valuation_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        assets_today: 150_000.0,
        liabilities: vec![ldi_engine::scenario::LiabilityConfig {
            kind: "recurring".to_string(),
            start_date: NaiveDate::from_ymd_opt(2036, 8, 1).unwrap(),
            amount_today: 25_000.0,
            duration_years: Some(4),
            inflation_rate: None,
        }],
        end_date: None,
        contributions: vec![ldi_engine::scenario::ContributionConfig {
            kind: "recurring".to_string(),
            amount: 500.0,
            frequency: Some("monthly".to_string()),
            month: None,
            start_date: None,
            end_date: None,
            date: None,
        }],
        extra_monthly_contribution: 0.0,
    };

    let model = Model::new(shape, &assumptions, &GlidePath).expect("invalid scenario");
    let result = model.run().expect("projection failed");

    println!("Scenario: {}", result.name);
    println!("  Assets today: ${:.2}", result.assets_today);
    println!("  Funded status: {:?}", result.funded_status);
    println!("  Surplus at maturity: ${:.2}", result.surplus_at_maturity);
    println!();

    println!("Shortfall at maturity by liability:");
    for (name, shortfall) in &result.shortfalls_at_maturity {
        println!("  {name}: ${shortfall:.2}");
    }
    println!();

    println!("Current allocation:");
    for (asset, weight) in &result.current_allocations {
        println!("  {asset}: {:.1}%", weight * 100.0);
    }

    if result.funded_status == FundedStatus::Underfunded {
        println!("\nPlan is underfunded under current assumptions.");
    }
}
