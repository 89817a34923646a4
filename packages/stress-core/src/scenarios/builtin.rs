//! Built-in stress scenarios.

use crate::factors::{CREDIT, FOREIGN_EXCHANGE, INFLATION, INTEREST_RATE, MARKET, VOLATILITY};
use crate::types::{RiskFactorShift, RiskScenario};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Built-in scenarios keyed by lowercase id.
pub static BUILTIN_SCENARIOS: LazyLock<BTreeMap<String, RiskScenario>> = LazyLock::new(|| {
    let scenarios = [
        RiskScenario::new("global_financial_crisis", "Global Financial Crisis")
            .with_description("Lehman collapse: equity crash, credit spreads blow out, rates cut")
            .historical(NaiveDate::from_ymd_opt(2008, 9, 15))
            .with_factor(RiskFactorShift::percentage(MARKET, -0.40))
            .with_factor(RiskFactorShift::absolute(CREDIT, 350.0))
            .with_factor(RiskFactorShift::absolute(INTEREST_RATE, -150.0))
            .with_factor(RiskFactorShift::percentage(VOLATILITY, 0.25)),
        RiskScenario::new("covid_crash", "COVID-19 Crash")
            .with_description("Pandemic selloff with a volatility spike and emergency rate cuts")
            .historical(NaiveDate::from_ymd_opt(2020, 3, 16))
            .with_factor(RiskFactorShift::percentage(MARKET, -0.34))
            .with_factor(RiskFactorShift::percentage(VOLATILITY, 0.30))
            .with_factor(RiskFactorShift::absolute(INTEREST_RATE, -100.0))
            .with_factor(RiskFactorShift::absolute(CREDIT, 200.0)),
        RiskScenario::new("tech_bubble_burst", "Tech Bubble Burst")
            .with_description("Dot-com unwind led by high-beta growth names")
            .historical(NaiveDate::from_ymd_opt(2000, 3, 10))
            .with_factor(RiskFactorShift::percentage(MARKET, -0.45))
            .with_factor(RiskFactorShift::percentage(VOLATILITY, 0.15)),
        RiskScenario::new("european_debt_crisis", "European Debt Crisis")
            .with_description("Sovereign credit stress with a weaker euro")
            .historical(NaiveDate::from_ymd_opt(2011, 8, 8))
            .with_factor(RiskFactorShift::percentage(MARKET, -0.18))
            .with_factor(RiskFactorShift::absolute(CREDIT, 250.0))
            .with_factor(RiskFactorShift::percentage(FOREIGN_EXCHANGE, -0.08)),
        RiskScenario::new("black_monday", "Black Monday")
            .with_description("Single-day equity crash")
            .historical(NaiveDate::from_ymd_opt(1987, 10, 19))
            .with_factor(RiskFactorShift::percentage(MARKET, -0.22))
            .with_factor(RiskFactorShift::percentage(VOLATILITY, 0.40)),
        RiskScenario::new("rate_hike_shock", "Rate Hike Shock")
            .with_description("Unexpected 200bp rise in policy rates")
            .with_probability(0.15)
            .with_factor(RiskFactorShift::absolute(INTEREST_RATE, 200.0)),
        RiskScenario::new("inflation_surge", "Inflation Surge")
            .with_description("Inflation jumps 3 points and rates follow")
            .with_probability(0.10)
            .with_factor(RiskFactorShift::absolute(INFLATION, 3.0))
            .with_factor(RiskFactorShift::absolute(INTEREST_RATE, 100.0))
            .with_factor(RiskFactorShift::percentage(MARKET, -0.05)),
        RiskScenario::new("credit_crunch", "Credit Crunch")
            .with_description("Funding stress widens spreads 400bp")
            .with_probability(0.05)
            .with_factor(RiskFactorShift::absolute(CREDIT, 400.0))
            .with_factor(RiskFactorShift::percentage(MARKET, -0.15)),
        RiskScenario::new("economic_recovery", "Economic Recovery")
            .with_description("Broad rally with tighter spreads and calmer markets")
            .with_probability(0.25)
            .with_factor(RiskFactorShift::percentage(MARKET, 0.15))
            .with_factor(RiskFactorShift::absolute(CREDIT, -100.0))
            .with_factor(RiskFactorShift::percentage(VOLATILITY, -0.20)),
    ];

    scenarios
        .into_iter()
        .map(|scenario| (scenario.id.to_lowercase(), scenario))
        .collect()
});

/// List all built-in scenarios, ordered by id.
pub fn list_scenarios() -> Vec<RiskScenario> {
    BUILTIN_SCENARIOS.values().cloned().collect()
}

/// Get a built-in scenario by id (case-insensitive).
pub fn get_scenario(id: &str) -> Option<RiskScenario> {
    BUILTIN_SCENARIOS.get(&id.to_lowercase()).cloned()
}

/// Validate that a built-in scenario exists.
pub fn is_builtin_scenario(id: &str) -> bool {
    BUILTIN_SCENARIOS.contains_key(&id.to_lowercase())
}

/// Get all built-in scenario ids.
pub fn scenario_ids() -> Vec<String> {
    BUILTIN_SCENARIOS.keys().cloned().collect()
}
