//! Named stress scenarios.
//!
//! Provides the built-in historical and hypothetical events and a catalog
//! that layers user-defined scenarios over them.

mod builtin;
mod catalog;

pub use builtin::{
    get_scenario, is_builtin_scenario, list_scenarios, scenario_ids, BUILTIN_SCENARIOS,
};
pub use catalog::ScenarioCatalog;
