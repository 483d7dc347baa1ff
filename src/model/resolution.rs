use crate::model::{FeeRate, PolicyRule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Default,
    RuleMatch,
    TierCalculation,
    Conflict,
}

/// One entry of the resolution trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionStep {
    /// 1-based position in the trace.
    pub step: u32,
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_bps: Option<FeeRate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
}

/// Strategy used to pick a winner among tied rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Earliest rule in the policy's rule list wins.
    FirstMatch,
}

/// Rules tied at the winning specificity score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConflict {
    pub rules: Vec<PolicyRule>,
    pub message: String,
    pub resolution: ConflictResolution,
}

impl PolicyConflict {
    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.id.as_str()).collect()
    }
}

/// Identifies the exact policy document a resolution was computed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRef {
    pub tenant_id: String,
    pub version: u64,
    /// Lowercase hex SHA-256 of the canonical policy encoding.
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResolution {
    pub fee_bps: FeeRate,
    /// Minor units.
    pub fee_amount: u64,
    /// Transaction amount minus fee, floored at zero.
    pub net_amount: u64,
    pub trace: Vec<ResolutionStep>,
    /// `None` when the tenant's default fee applied.
    pub final_rule: Option<PolicyRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<PolicyConflict>,
    pub policy: PolicyRef,
}

impl PolicyResolution {
    pub fn used_default(&self) -> bool {
        self.final_rule.is_none()
    }

    pub fn final_rule_id(&self) -> Option<&str> {
        self.final_rule.as_ref().map(|rule| rule.id.as_str())
    }
}
