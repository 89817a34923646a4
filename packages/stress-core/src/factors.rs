//! Well-known risk factor identifiers.
//!
//! Factor ids are open-ended strings; these are the ones the registry seeds
//! coefficients for and the impact calculator has unit conversions for.

pub const MARKET: &str = "market";
pub const INTEREST_RATE: &str = "interest_rate";
pub const CREDIT: &str = "credit";
pub const INFLATION: &str = "inflation";
pub const VOLATILITY: &str = "volatility";
pub const FOREIGN_EXCHANGE: &str = "foreign_exchange";

/// Every well-known factor id.
pub const ALL: [&str; 6] = [
    MARKET,
    INTEREST_RATE,
    CREDIT,
    INFLATION,
    VOLATILITY,
    FOREIGN_EXCHANGE,
];
