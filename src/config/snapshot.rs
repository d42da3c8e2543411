//! Immutable policy snapshots attached to salary periods.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EngineError, EngineResult};

use super::types::{PolicyConfig, SalesTier, TaxBracket};

/// A frozen copy of a policy version.
///
/// Capturing clones the policy, so later edits to the loaded configuration
/// never reach a period that already holds a snapshot. The snapshot only
/// hands out shared references and is cheap to clone across threads.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::{ConfigLoader, ConfigSnapshot};
/// use payroll_engine::models::PayMonth;
///
/// let loader = ConfigLoader::load("./config/policy").unwrap();
/// let policy = loader.policy_for(PayMonth::new(2025, 3).unwrap()).unwrap();
/// let snapshot = ConfigSnapshot::capture(policy);
/// println!("Personal deduction: {}", snapshot.tax.personal_deduction);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot(Arc<PolicyConfig>);

impl ConfigSnapshot {
    /// Deep-copies a policy version into a new snapshot.
    pub fn capture(policy: &PolicyConfig) -> Self {
        Self(Arc::new(policy.clone()))
    }

    /// Returns the tax brackets, failing if the list is empty.
    pub fn tax_brackets(&self) -> EngineResult<&[TaxBracket]> {
        if self.0.tax.brackets.is_empty() {
            return Err(EngineError::MissingPolicySection {
                section: "tax.brackets".to_string(),
            });
        }
        Ok(&self.0.tax.brackets)
    }

    /// Returns the sales tiers, failing if the list is empty.
    pub fn sales_tiers(&self) -> EngineResult<&[SalesTier]> {
        if self.0.sales.tiers.is_empty() {
            return Err(EngineError::MissingPolicySection {
                section: "sales.tiers".to_string(),
            });
        }
        Ok(&self.0.sales.tiers)
    }

    /// Fails if the KPI tier map is empty.
    pub fn ensure_kpi_tiers(&self) -> EngineResult<()> {
        if self.0.kpi.tiers.is_empty() {
            return Err(EngineError::MissingPolicySection {
                section: "kpi.tiers".to_string(),
            });
        }
        Ok(())
    }
}

impl Deref for ConfigSnapshot {
    type Target = PolicyConfig;

    fn deref(&self) -> &PolicyConfig {
        &self.0
    }
}

impl Serialize for ConfigSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_ref().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConfigSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PolicyConfig::deserialize(deserializer).map(|policy| Self(Arc::new(policy)))
    }
}
