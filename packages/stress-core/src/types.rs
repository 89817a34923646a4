//! Core data types for the stress-testing engine.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Asset class of a holding. Drives beta and correlation lookups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    Equity,
    FixedIncome,
    Commodity,
    Currency,
    Crypto,
    Option,
    Future,
    Etf,
    MutualFund,
    Other,
}

impl AssetClass {
    /// All asset classes in declaration order.
    pub const ALL: [AssetClass; 10] = [
        AssetClass::Equity,
        AssetClass::FixedIncome,
        AssetClass::Commodity,
        AssetClass::Currency,
        AssetClass::Crypto,
        AssetClass::Option,
        AssetClass::Future,
        AssetClass::Etf,
        AssetClass::MutualFund,
        AssetClass::Other,
    ];

    /// Wire name of the asset class (matches the serde representation).
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Equity => "equity",
            AssetClass::FixedIncome => "fixed_income",
            AssetClass::Commodity => "commodity",
            AssetClass::Currency => "currency",
            AssetClass::Crypto => "crypto",
            AssetClass::Option => "option",
            AssetClass::Future => "future",
            AssetClass::Etf => "etf",
            AssetClass::MutualFund => "mutual_fund",
            AssetClass::Other => "other",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single holding valued in the portfolio's base currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Instrument identifier, echoed verbatim in results
    pub symbol: String,
    /// Asset class of the instrument
    pub asset_class: AssetClass,
    /// Equity sector label, mainly for equities and ETFs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Current market value; negative for short positions
    pub value: f64,
}

impl Position {
    /// Create a new position without a sector.
    pub fn new(symbol: &str, asset_class: AssetClass, value: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            asset_class,
            sector: None,
            value,
        }
    }

    /// Attach a sector label.
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }
}

/// The portfolio being stressed.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Portfolio {
    /// Opaque identifier
    pub id: String,
    /// Cash balance; never shocked
    pub cash: f64,
    /// Holdings, in result order
    #[serde(default)]
    pub positions: Vec<Position>,
    /// Caller-supplied total (cash + position values), used verbatim as the "before" value
    pub total_value: f64,
}

impl Portfolio {
    /// Create an empty portfolio holding only cash.
    pub fn new(id: &str, cash: f64) -> Self {
        Self {
            id: id.to_string(),
            cash,
            positions: Vec::new(),
            total_value: cash,
        }
    }

    /// Append a position and keep `total_value` in step with it.
    pub fn add_position(&mut self, position: Position) {
        self.total_value += position.value;
        self.positions.push(position);
    }

    /// Builder form of [`Portfolio::add_position`].
    pub fn with_position(mut self, position: Position) -> Self {
        self.add_position(position);
        self
    }

    /// Cash plus the sum of all position values.
    pub fn computed_total_value(&self) -> f64 {
        self.cash + self.positions.iter().map(|p| p.value).sum::<f64>()
    }

    /// Get the number of positions.
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }
}

/// How a shift value is interpreted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    /// Already a decimal fraction (-0.05 is -5%)
    Percentage,
    /// Raw units (basis points, percentage points) converted per factor
    Absolute,
}

/// One shock applied to a named risk factor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskFactorShift {
    pub factor_id: String,
    pub shift_type: ShiftType,
    pub shift_value: f64,
}

impl RiskFactorShift {
    /// A shift already expressed as a decimal fraction.
    pub fn percentage(factor_id: &str, shift_value: f64) -> Self {
        Self {
            factor_id: factor_id.to_string(),
            shift_type: ShiftType::Percentage,
            shift_value,
        }
    }

    /// A shift in raw units that is converted per factor.
    pub fn absolute(factor_id: &str, shift_value: f64) -> Self {
        Self {
            factor_id: factor_id.to_string(),
            shift_type: ShiftType::Absolute,
            shift_value,
        }
    }
}

/// A named bundle of factor shocks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskScenario {
    /// Catalog key and identity of the scenario in results
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// What the scenario represents
    #[serde(default)]
    pub description: String,
    /// Whether the scenario replays a past market event
    #[serde(default)]
    pub is_historical: bool,
    /// Date of the historical event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Estimated likelihood in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    /// Shocks, applied together
    #[serde(default)]
    pub factors: Vec<RiskFactorShift>,
}

impl RiskScenario {
    /// Create a scenario with no factors.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            is_historical: false,
            date: None,
            probability: None,
            factors: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_factor(mut self, factor: RiskFactorShift) -> Self {
        self.factors.push(factor);
        self
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    /// Mark as a replay of a historical event.
    pub fn historical(mut self, date: Option<NaiveDate>) -> Self {
        self.is_historical = true;
        self.date = date;
        self
    }

    /// Descriptive fields echoed into results.
    pub fn metadata(&self) -> ScenarioMetadata {
        ScenarioMetadata {
            name: self.name.clone(),
            description: self.description.clone(),
            is_historical: self.is_historical,
            date: self.date,
            probability: self.probability,
        }
    }
}

/// Scenario description carried on a [`StressTestResult`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioMetadata {
    pub name: String,
    pub description: String,
    pub is_historical: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

/// Contribution of one factor shock to one position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FactorImpact {
    pub factor_id: String,
    /// Shock converted to a decimal fraction, before sensitivity
    pub shift_magnitude: f64,
    /// Beta or correlation applied to the shock
    pub sensitivity: f64,
    /// shift_magnitude * sensitivity
    pub impact: f64,
}

/// Stressed valuation of a single position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionStressResult {
    pub symbol: String,
    pub asset_class: AssetClass,
    pub value_before: f64,
    pub value_after: f64,
    pub absolute_change: f64,
    /// absolute_change / value_before; 0.0 when value_before is zero
    pub percentage_change: f64,
    /// Sum of all factor impacts
    pub total_impact: f64,
    /// Breakdown in scenario factor order
    pub factor_impacts: Vec<FactorImpact>,
}

/// Outcome of running one scenario against one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StressTestResult {
    pub scenario_id: String,
    pub scenario_name: String,
    pub portfolio_id: String,
    pub cash: f64,
    pub portfolio_value_before: f64,
    pub portfolio_value_after: f64,
    pub absolute_change: f64,
    pub percentage_change: f64,
    /// In portfolio order
    pub position_results: Vec<PositionStressResult>,
    pub timestamp: DateTime<Utc>,
    pub metadata: ScenarioMetadata,
}

impl StressTestResult {
    /// Position with the largest loss, if any position lost value.
    pub fn worst_position(&self) -> Option<&PositionStressResult> {
        self.position_results
            .iter()
            .filter(|r| r.absolute_change < 0.0)
            .min_by(|a, b| a.absolute_change.total_cmp(&b.absolute_change))
    }

    /// Absolute change summed per asset class, ordered by asset class.
    pub fn change_by_asset_class(&self) -> Vec<(AssetClass, f64)> {
        let mut buckets: BTreeMap<AssetClass, f64> = BTreeMap::new();
        for result in &self.position_results {
            *buckets.entry(result.asset_class).or_insert(0.0) += result.absolute_change;
        }
        buckets.into_iter().collect()
    }
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
