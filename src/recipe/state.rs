// src/recipe/state.rs

//! Recipe lifecycle
//!
//! ```text
//! UNCONFIGURED -> SOURCED -> CONFIGURED -> BUILT -> PACKAGED
//! ```
//!
//! Transitions only move forward one stage at a time. `CONFIGURED` may be
//! re-entered, which does nothing. The state lives in the build folder so
//! that separate invocations (`source`, `build`, `package`) see the same
//! lifecycle, together with the configure plan it was configured with.

use crate::build::AutotoolsPlan;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the persisted state inside the build folder
pub const STATE_FILE: &str = ".recipe-state.json";

/// Lifecycle stage of one build folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Unconfigured,
    Sourced,
    Configured,
    Built,
    Packaged,
}

impl Stage {
    /// The only stage reachable from this one
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unconfigured => Some(Self::Sourced),
            Self::Sourced => Some(Self::Configured),
            Self::Configured => Some(Self::Built),
            Self::Built => Some(Self::Packaged),
            Self::Packaged => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "UNCONFIGURED",
            Self::Sourced => "SOURCED",
            Self::Configured => "CONFIGURED",
            Self::Built => "BUILT",
            Self::Packaged => "PACKAGED",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted lifecycle state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeState {
    pub stage: Stage,
    /// Plan the build folder was configured with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<AutotoolsPlan>,
}

impl RecipeState {
    /// Location of the state file for a build folder
    pub fn path(build_folder: &Path) -> PathBuf {
        build_folder.join(STATE_FILE)
    }

    /// Load the state of a build folder; a missing file means a fresh recipe
    pub fn load(build_folder: &Path) -> Result<Self> {
        let path = Self::path(build_folder);
        if !path.exists() {
            debug!("No lifecycle state at {}, starting fresh", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)?;
        let state: Self = serde_json::from_str(&content)?;
        debug!("Loaded lifecycle state {} from {}", state.stage, path.display());
        Ok(state)
    }

    /// Write the state into the build folder
    pub fn save(&self, build_folder: &Path) -> Result<()> {
        fs::create_dir_all(build_folder)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(Self::path(build_folder), content)?;
        Ok(())
    }

    /// Move to `to`
    ///
    /// Returns `false` when re-entering `CONFIGURED`, which leaves the state
    /// untouched. Any other transition that is not exactly one stage forward
    /// is an error.
    pub fn advance(&mut self, to: Stage) -> Result<bool> {
        if self.stage == Stage::Configured && to == Stage::Configured {
            return Ok(false);
        }
        if self.stage.next() != Some(to) {
            return Err(Error::Lifecycle {
                from: self.stage,
                to,
            });
        }
        debug!("Lifecycle {} -> {}", self.stage, to);
        self.stage = to;
        Ok(true)
    }

    /// Fail if the folder was configured with different arguments or flags
    ///
    /// The job count is not part of the comparison.
    pub fn check_plan(&self, plan: &AutotoolsPlan) -> Result<()> {
        match &self.plan {
            Some(stored)
                if stored.configure_args != plan.configure_args || stored.env != plan.env =>
            {
                Err(Error::PlanMismatch)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn plan(prefix: &str) -> AutotoolsPlan {
        AutotoolsPlan {
            configure_args: vec![format!("--prefix={}", prefix)],
            env: BTreeMap::new(),
            jobs: 4,
        }
    }

    #[test]
    fn test_full_lifecycle() {
        let mut state = RecipeState::default();
        for stage in [Stage::Sourced, Stage::Configured, Stage::Built, Stage::Packaged] {
            assert!(state.advance(stage).unwrap());
        }
        assert_eq!(state.stage, Stage::Packaged);
        assert!(state.stage.next().is_none());
    }

    #[test]
    fn test_skip_rejected() {
        let mut state = RecipeState::default();
        let err = state.advance(Stage::Configured).unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle {
                from: Stage::Unconfigured,
                to: Stage::Configured
            }
        ));
        assert_eq!(err.to_string(), "recipe is UNCONFIGURED, cannot advance to CONFIGURED");

        state.advance(Stage::Sourced).unwrap();
        assert!(state.advance(Stage::Built).is_err());
        assert!(state.advance(Stage::Packaged).is_err());
    }

    #[test]
    fn test_backwards_rejected() {
        let mut state = RecipeState {
            stage: Stage::Built,
            plan: None,
        };
        assert!(state.advance(Stage::Sourced).is_err());
        assert!(state.advance(Stage::Built).is_err());
        assert!(state.advance(Stage::Configured).is_err());
    }

    #[test]
    fn test_configured_reentry_is_noop() {
        let mut state = RecipeState {
            stage: Stage::Configured,
            plan: Some(plan("/p")),
        };
        assert!(!state.advance(Stage::Configured).unwrap());
        assert_eq!(state.stage, Stage::Configured);
        assert_eq!(state.plan, Some(plan("/p")));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        assert_eq!(RecipeState::load(dir.path()).unwrap(), RecipeState::default());

        let state = RecipeState {
            stage: Stage::Configured,
            plan: Some(plan("/p")),
        };
        state.save(dir.path()).unwrap();

        let raw = fs::read_to_string(dir.path().join(STATE_FILE)).unwrap();
        assert!(raw.contains("\"configured\""));
        assert_eq!(RecipeState::load(dir.path()).unwrap(), state);
    }

    #[test]
    fn test_plan_mismatch() {
        let state = RecipeState {
            stage: Stage::Configured,
            plan: Some(plan("/p")),
        };
        assert!(state.check_plan(&plan("/p")).is_ok());
        assert!(matches!(state.check_plan(&plan("/q")), Err(Error::PlanMismatch)));
        assert!(RecipeState::default().check_plan(&plan("/q")).is_ok());

        let mut more_jobs = plan("/p");
        more_jobs.jobs = 16;
        assert!(state.check_plan(&more_jobs).is_ok());
    }
}
