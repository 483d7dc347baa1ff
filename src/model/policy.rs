//! Tenant fee policies: default fees per payment type plus override rules.

use crate::error::{Error, Result};
use crate::model::{Currency, PaymentType, Scheme};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One band of a progressive fee schedule. `up_to: None` is the open "and above" band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountTier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_to: Option<u64>,
    pub fee_bps: u32,
}

impl AmountTier {
    pub fn up_to(up_to: u64, fee_bps: u32) -> Self {
        AmountTier {
            up_to: Some(up_to),
            fee_bps,
        }
    }

    pub fn open(fee_bps: u32) -> Self {
        AmountTier {
            up_to: None,
            fee_bps,
        }
    }
}

/// How a rule prices a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeSpec {
    Flat { fee_bps: u32 },
    Tiered { tiers: Vec<AmountTier> },
}

impl FeeSpec {
    /// Build from the document's optional fields. Non-empty tiers win over a flat fee.
    pub fn from_parts(
        rule_id: &str,
        fee_bps: Option<u32>,
        amount_tiers: Option<Vec<AmountTier>>,
    ) -> Result<Self> {
        match (fee_bps, amount_tiers) {
            (fee_bps, Some(tiers)) if !tiers.is_empty() => {
                if fee_bps.is_some() {
                    tracing::warn!(rule_id, "rule sets both feeBps and amountTiers; using tiers");
                }
                let spec = FeeSpec::Tiered { tiers };
                spec.check(rule_id)?;
                Ok(spec)
            }
            (Some(fee_bps), _) => Ok(FeeSpec::Flat { fee_bps }),
            (None, _) => Err(Error::MissingFeeSpec {
                rule_id: rule_id.to_string(),
            }),
        }
    }

    fn check(&self, rule_id: &str) -> Result<()> {
        if let FeeSpec::Tiered { tiers } = self {
            if tiers.is_empty() {
                return Err(Error::MissingFeeSpec {
                    rule_id: rule_id.to_string(),
                });
            }
            if tiers.iter().filter(|tier| tier.up_to.is_none()).count() > 1 {
                return Err(Error::MultipleOpenTiers {
                    rule_id: rule_id.to_string(),
                });
            }
        }
        Ok(())
    }

    fn into_parts(self) -> (Option<u32>, Option<Vec<AmountTier>>) {
        match self {
            FeeSpec::Flat { fee_bps } => (Some(fee_bps), None),
            FeeSpec::Tiered { tiers } => (None, Some(tiers)),
        }
    }
}

/// An override rule. Unset criteria are wildcards.
///
/// Serialized in the policy document shape (`feeBps` / `amountTiers` as
/// separate optional fields); a rule with neither fails to deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleDocument", into = "RuleDocument")]
pub struct PolicyRule {
    pub id: String,
    pub name: String,
    pub description: Option<String>,

    pub currency: Option<Currency>,
    pub payment_type: Option<PaymentType>,
    pub scheme: Option<Scheme>,
    pub merchant_id: Option<String>,

    pub fee: FeeSpec,

    /// Added to the specificity score.
    pub priority: Option<i64>,
    pub enabled: bool,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_to: Option<DateTime<Utc>>,
}

impl PolicyRule {
    /// Enabled catch-all rule charging a flat rate.
    pub fn flat(id: impl Into<String>, name: impl Into<String>, fee_bps: u32) -> Self {
        Self::with_fee(id, name, FeeSpec::Flat { fee_bps })
    }

    /// Enabled catch-all rule with progressive pricing.
    pub fn tiered(id: impl Into<String>, name: impl Into<String>, tiers: Vec<AmountTier>) -> Self {
        Self::with_fee(id, name, FeeSpec::Tiered { tiers })
    }

    fn with_fee(id: impl Into<String>, name: impl Into<String>, fee: FeeSpec) -> Self {
        PolicyRule {
            id: id.into(),
            name: name.into(),
            description: None,
            currency: None,
            payment_type: None,
            scheme: None,
            merchant_id: None,
            fee,
            priority: None,
            enabled: true,
            effective_from: None,
            effective_to: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn for_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn for_payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = Some(payment_type);
        self
    }

    pub fn for_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn for_merchant(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn effective_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.effective_from = from;
        self.effective_to = to;
        self
    }

    /// Configuration problems local to this rule.
    pub fn problems(&self) -> Vec<Error> {
        let mut problems = Vec::new();
        if let Err(e) = self.fee.check(&self.id) {
            problems.push(e);
        }
        if let (Some(from), Some(to)) = (self.effective_from, self.effective_to) {
            if from > to {
                problems.push(Error::InvalidWindow {
                    rule_id: self.id.clone(),
                });
            }
        }
        problems
    }
}

/// Wire shape of a [`PolicyRule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDocument {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_bps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_tiers: Option<Vec<AmountTier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<DateTime<Utc>>,
}

impl TryFrom<RuleDocument> for PolicyRule {
    type Error = Error;

    fn try_from(doc: RuleDocument) -> Result<Self> {
        let fee = FeeSpec::from_parts(&doc.id, doc.fee_bps, doc.amount_tiers)?;
        let rule = PolicyRule {
            id: doc.id,
            name: doc.name,
            description: doc.description,
            currency: doc.currency,
            payment_type: doc.payment_type,
            scheme: doc.scheme,
            merchant_id: doc.merchant_id,
            fee,
            priority: doc.priority,
            enabled: doc.enabled,
            effective_from: doc.effective_from,
            effective_to: doc.effective_to,
        };
        match rule.problems().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(rule),
        }
    }
}

impl From<PolicyRule> for RuleDocument {
    fn from(rule: PolicyRule) -> Self {
        let (fee_bps, amount_tiers) = rule.fee.into_parts();
        RuleDocument {
            id: rule.id,
            name: rule.name,
            description: rule.description,
            currency: rule.currency,
            payment_type: rule.payment_type,
            scheme: rule.scheme,
            merchant_id: rule.merchant_id,
            fee_bps,
            amount_tiers,
            priority: rule.priority,
            enabled: rule.enabled,
            effective_from: rule.effective_from,
            effective_to: rule.effective_to,
        }
    }
}

/// A tenant's complete fee policy. Treated as an immutable snapshot: callers
/// replace the whole document rather than editing rules in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantPolicy {
    pub tenant_id: String,
    pub tenant_name: String,
    /// Incremented on every policy change; recorded for audit only.
    pub version: u64,
    pub default_fees: BTreeMap<PaymentType, u32>,
    /// Override rules in authoring order. Order breaks specificity ties.
    pub rules: Vec<PolicyRule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire shape of a [`TenantPolicy`] with its rules still unchecked.
///
/// Parsing into this first and converting afterwards keeps a bad rule's
/// typed error instead of folding it into a JSON parse failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    pub tenant_id: String,
    pub tenant_name: String,
    pub version: u64,
    pub default_fees: BTreeMap<PaymentType, u32>,
    pub rules: Vec<RuleDocument>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PolicyDocument> for TenantPolicy {
    type Error = Error;

    fn try_from(doc: PolicyDocument) -> Result<Self> {
        let rules = doc
            .rules
            .into_iter()
            .map(PolicyRule::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(TenantPolicy {
            tenant_id: doc.tenant_id,
            tenant_name: doc.tenant_name,
            version: doc.version,
            default_fees: doc.default_fees,
            rules,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}

impl TenantPolicy {
    pub fn default_fee(&self, payment_type: PaymentType) -> Result<u32> {
        self.default_fees
            .get(&payment_type)
            .copied()
            .ok_or(Error::MissingDefaultFee { payment_type })
    }

    pub fn rule(&self, rule_id: &str) -> Option<&PolicyRule> {
        self.rules.iter().find(|rule| rule.id == rule_id)
    }

    /// Every configuration problem in the document, in a stable order.
    pub fn problems(&self) -> Vec<Error> {
        let mut problems = Vec::new();

        for payment_type in PaymentType::ALL {
            if !self.default_fees.contains_key(&payment_type) {
                problems.push(Error::MissingDefaultFee { payment_type });
            }
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.id.as_str()) {
                problems.push(Error::DuplicateRuleId {
                    rule_id: rule.id.clone(),
                });
            }
            problems.extend(rule.problems());
        }

        problems
    }

    /// Write-time validation: fails on the first configuration problem.
    pub fn validate(&self) -> Result<()> {
        match self.review().into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }

    /// Like [`problems`](Self::problems), also logging warnings about
    /// rules that are valid but probably not what the author meant.
    pub fn review(&self) -> Vec<Error> {
        for rule in &self.rules {
            if let FeeSpec::Tiered { tiers } = &rule.fee {
                if tiers.iter().all(|tier| tier.up_to.is_some()) {
                    tracing::warn!(
                        tenant_id = %self.tenant_id,
                        rule_id = %rule.id,
                        "tiered rule has no open-ended tier; amounts above the last band carry no fee"
                    );
                }
            }
        }
        self.problems()
    }
}
