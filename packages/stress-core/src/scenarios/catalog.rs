//! User scenario catalog layered over the built-ins.

use super::builtin::BUILTIN_SCENARIOS;
use crate::stress::validate_scenario;
use crate::types::RiskScenario;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Named scenarios available for a run.
///
/// Lookups are case-insensitive. Entries loaded from a file replace built-ins
/// with the same id.
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: BTreeMap<String, RiskScenario>,
}

impl ScenarioCatalog {
    /// A catalog with no scenarios.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A catalog holding only the built-in scenarios.
    pub fn builtin() -> Self {
        Self {
            scenarios: BUILTIN_SCENARIOS.clone(),
        }
    }

    /// Get the default user catalog path.
    ///
    /// Default path: `~/.stress/scenarios.json`
    /// Can be overridden with `STRESS_SCENARIO_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("STRESS_SCENARIO_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".stress/scenarios.json"))
            .unwrap_or_else(|| PathBuf::from("scenarios.json"))
    }

    /// Built-ins plus the user catalog at the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Built-ins plus a JSON array of scenarios read from `path`.
    ///
    /// A missing file yields just the built-ins.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut catalog = Self::builtin();
        if !path.exists() {
            return Ok(catalog);
        }

        let content = fs::read_to_string(path)?;
        let scenarios: Vec<RiskScenario> = serde_json::from_str(&content)?;
        let count = scenarios.len();
        for scenario in scenarios {
            catalog.insert(scenario)?;
        }

        tracing::debug!(path = %path.display(), count, "Loaded scenario catalog");
        Ok(catalog)
    }

    /// Write every scenario in the catalog as a JSON array.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let scenarios: Vec<&RiskScenario> = self.scenarios.values().collect();
        let content = serde_json::to_string_pretty(&scenarios)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Add or replace a scenario. Returns the replaced entry, if any.
    pub fn insert(&mut self, scenario: RiskScenario) -> Result<Option<RiskScenario>> {
        validate_scenario(&scenario)?;
        Ok(self.scenarios.insert(scenario.id.to_lowercase(), scenario))
    }

    /// Look up a scenario by id.
    pub fn get(&self, id: &str) -> Result<&RiskScenario> {
        self.scenarios
            .get(&id.to_lowercase())
            .ok_or_else(|| Error::ScenarioNotFound(id.to_string()))
    }

    /// All scenarios, ordered by id.
    pub fn list(&self) -> Vec<&RiskScenario> {
        self.scenarios.values().collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.scenarios.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::MARKET;
    use crate::types::RiskFactorShift;
    use tempfile::tempdir;

    fn custom() -> RiskScenario {
        RiskScenario::new("Desk_Limit", "Desk limit breach")
            .with_factor(RiskFactorShift::percentage(MARKET, -0.07))
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = ScenarioCatalog::builtin();
        assert_eq!(catalog.len(), 9);
        assert_eq!(catalog.get("Black_Monday").unwrap().name, "Black Monday");
    }

    #[test]
    fn test_get_missing() {
        let catalog = ScenarioCatalog::empty();
        assert!(catalog.is_empty());
        assert!(matches!(
            catalog.get("anything"),
            Err(Error::ScenarioNotFound(_))
        ));
    }

    #[test]
    fn test_insert_validates() {
        let mut catalog = ScenarioCatalog::empty();
        assert!(catalog.insert(custom()).unwrap().is_none());
        assert_eq!(catalog.get("desk_limit").unwrap().id, "Desk_Limit");

        let broken = RiskScenario::new("", "Broken");
        assert!(matches!(
            catalog.insert(broken),
            Err(Error::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_file_overrides_builtin() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenarios.json");
        let override_crash = RiskScenario::new("black_monday", "Black Monday (severe)")
            .with_factor(RiskFactorShift::percentage(MARKET, -0.35));
        fs::write(
            &path,
            serde_json::to_string(&vec![custom(), override_crash]).unwrap(),
        )
        .unwrap();

        let catalog = ScenarioCatalog::load_from_path(&path).unwrap();

        assert_eq!(catalog.len(), 10);
        assert_eq!(
            catalog.get("black_monday").unwrap().name,
            "Black Monday (severe)"
        );
        assert!(catalog.get("desk_limit").is_ok());
    }

    #[test]
    fn test_missing_file_is_builtin() {
        let dir = tempdir().unwrap();
        let catalog = ScenarioCatalog::load_from_path(&dir.path().join("none.json")).unwrap();
        assert_eq!(catalog.len(), 9);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/scenarios.json");

        let mut catalog = ScenarioCatalog::empty();
        catalog.insert(custom()).unwrap();
        catalog.save_to_path(&path).unwrap();

        // Reloading layers the saved entries over the built-ins
        let reloaded = ScenarioCatalog::load_from_path(&path).unwrap();
        assert_eq!(reloaded.len(), 10);
        assert_eq!(reloaded.get("DESK_LIMIT").unwrap(), &custom());
    }
}
