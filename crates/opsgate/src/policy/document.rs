//! Policy document types and JSON loading.
//!
//! The document is loaded once at startup and never mutated. A missing
//! or malformed file is a fatal [`ConfigError`], not a runtime error.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Immutable policy configuration: named modes plus global rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub policy_name: String,
    pub version: String,
    pub modes: HashMap<String, ModePolicy>,
    pub global_rules: GlobalRules,
}

/// Allow/block lists for one operational mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModePolicy {
    pub allowed_tools: HashSet<String>,
    pub blocked_tools: HashSet<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub service_restrictions: ServiceRestrictions,
}

/// Scope-restriction toggle for a mode. When enabled, state-mutating
/// tools in EMERGENCY mode may only target unhealthy services.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ServiceRestrictions {
    #[serde(default)]
    pub enabled: bool,
}

/// Rules that apply regardless of mode or grant state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalRules {
    pub always_blocked: HashSet<String>,
}

impl PolicyDocument {
    /// Load and validate a policy document from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let contents =
            std::fs::read_to_string(path).map_err(|error| ConfigError::Parse(error.to_string()))?;
        Self::from_json(&contents)
    }

    /// Parse and validate a policy document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let document: PolicyDocument =
            serde_json::from_str(json).map_err(|error| ConfigError::Parse(error.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    /// Look up the policy for a named mode.
    pub fn mode(&self, name: &str) -> Option<&ModePolicy> {
        self.modes.get(name)
    }

    /// Mode names in sorted order.
    pub fn mode_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modes.keys().cloned().collect();
        names.sort();
        names
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.modes.is_empty() {
            return Err(ConfigError::NoModes);
        }
        for (name, mode) in &self.modes {
            let mut overlap: Vec<String> = mode
                .allowed_tools
                .intersection(&mode.blocked_tools)
                .cloned()
                .collect();
            if !overlap.is_empty() {
                overlap.sort();
                return Err(ConfigError::OverlappingTools {
                    mode: name.clone(),
                    tools: overlap,
                });
            }
        }
        Ok(())
    }
}
