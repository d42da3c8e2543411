//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the
//! compensation policy from YAML files.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::models::PayMonth;

use super::snapshot::ConfigSnapshot;
use super::types::{PolicyConfig, PolicyMetadata};

/// Loads and provides access to the versioned compensation policy.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/policy/
/// ├── policy.yaml          # Policy metadata
/// └── versions/
///     └── 2025-01-01.yaml  # Full policy effective from this date
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
/// use payroll_engine::models::PayMonth;
///
/// let loader = ConfigLoader::load("./config/policy").unwrap();
/// let snapshot = loader.snapshot_for(PayMonth::new(2025, 3).unwrap()).unwrap();
/// println!("Social ceiling: {}", snapshot.insurance.social.ceiling);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    metadata: PolicyMetadata,
    /// Policy versions sorted oldest first.
    versions: Vec<PolicyConfig>,
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    policy: PolicyMetadata,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `policy.yaml` or the `versions` directory is missing
    /// - Any file contains invalid YAML
    /// - The `versions` directory holds no policy version
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<PolicyFile>(&path.join("policy.yaml"))?.policy;
        let versions = Self::load_versions(&path.join("versions"))?;

        debug!(
            policy = %metadata.code,
            versions = versions.len(),
            "Loaded compensation policy"
        );

        Ok(Self::new(metadata, versions))
    }

    /// Builds a loader from already parsed versions.
    pub fn new(metadata: PolicyMetadata, versions: Vec<PolicyConfig>) -> Self {
        let mut versions = versions;
        versions.sort_by(|a, b| a.effective_date.cmp(&b.effective_date));
        Self { metadata, versions }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads all policy versions from the versions directory.
    fn load_versions(versions_dir: &Path) -> EngineResult<Vec<PolicyConfig>> {
        let versions_dir_str = versions_dir.display().to_string();

        let entries = fs::read_dir(versions_dir).map_err(|_| EngineError::ConfigNotFound {
            path: versions_dir_str.clone(),
        })?;

        let mut versions = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: versions_dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                versions.push(Self::load_yaml::<PolicyConfig>(&path)?);
            }
        }

        if versions.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no policy versions found)", versions_dir_str),
            });
        }

        Ok(versions)
    }

    /// Returns the policy metadata.
    pub fn metadata(&self) -> &PolicyMetadata {
        &self.metadata
    }

    /// Returns all policy versions, oldest first.
    pub fn versions(&self) -> &[PolicyConfig] {
        &self.versions
    }

    /// Returns the latest version effective on the first day of the month.
    pub fn policy_for(&self, month: PayMonth) -> EngineResult<&PolicyConfig> {
        self.versions
            .iter()
            .rfind(|v| v.effective_date <= month.first_day())
            .ok_or(EngineError::PolicyVersionNotFound { month })
    }

    /// Captures an immutable snapshot of the policy in force for the month.
    pub fn snapshot_for(&self, month: PayMonth) -> EngineResult<ConfigSnapshot> {
        self.policy_for(month).map(ConfigSnapshot::capture)
    }
}
