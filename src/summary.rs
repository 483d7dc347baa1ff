//! Batch resolution and fee aggregation.
//!
//! Resolves many transactions against one policy snapshot and groups the
//! results by currency, payment type and scheme.

use crate::error::Result;
use crate::fingerprint::policy_ref;
use crate::model::{Currency, PaymentType, PolicyResolution, TenantPolicy, Transaction};
use crate::resolver::Resolver;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Grouping key used for transactions without a card scheme.
pub const NO_SCHEME: &str = "none";

/// A transaction plus the merchant it was taken for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<String>,
}

impl BatchEntry {
    pub fn new(transaction: Transaction, merchant_id: Option<String>) -> Self {
        BatchEntry {
            transaction,
            merchant_id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTotals {
    pub count: u64,
    pub total_amount: u64,
    pub total_fee: u64,
    pub total_net: u64,
}

impl GroupTotals {
    fn add(&mut self, amount: u64, resolution: &PolicyResolution) {
        self.count += 1;
        self.total_amount = self.total_amount.saturating_add(amount);
        self.total_fee = self.total_fee.saturating_add(resolution.fee_amount);
        self.total_net = self.total_net.saturating_add(resolution.net_amount);
    }
}

pub type GroupedTotals = BTreeMap<Currency, BTreeMap<PaymentType, BTreeMap<String, GroupTotals>>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSummary {
    pub groups: GroupedTotals,
    pub totals: GroupTotals,
    /// Resolutions that hit a specificity tie.
    pub conflicts: u64,
    /// Resolutions that fell back to the tenant's default fee.
    pub defaults_used: u64,
}

impl FeeSummary {
    pub fn record(&mut self, transaction: &Transaction, resolution: &PolicyResolution) {
        let scheme = transaction
            .scheme
            .map(|scheme| scheme.to_string())
            .unwrap_or_else(|| NO_SCHEME.to_string());
        self.groups
            .entry(transaction.currency)
            .or_default()
            .entry(transaction.payment_type)
            .or_default()
            .entry(scheme)
            .or_default()
            .add(transaction.amount, resolution);
        self.totals.add(transaction.amount, resolution);
        if resolution.conflict.is_some() {
            self.conflicts += 1;
        }
        if resolution.used_default() {
            self.defaults_used += 1;
        }
    }

    pub fn group(
        &self,
        currency: Currency,
        payment_type: PaymentType,
        scheme: &str,
    ) -> Option<&GroupTotals> {
        self.groups.get(&currency)?.get(&payment_type)?.get(scheme)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTransaction {
    pub transaction_id: String,
    pub resolution: PolicyResolution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub resolutions: Vec<ResolvedTransaction>,
    pub summary: FeeSummary,
}

impl Resolver {
    /// Resolve every entry against one policy. The first failing entry aborts the batch.
    pub fn resolve_batch(&self, entries: &[BatchEntry], policy: &TenantPolicy) -> Result<BatchReport> {
        let reference = policy_ref(policy)?;
        let mut summary = FeeSummary::default();
        let mut resolutions = Vec::with_capacity(entries.len());

        for entry in entries {
            let resolution = self.resolve_with_ref(
                &entry.transaction,
                policy,
                entry.merchant_id.as_deref(),
                reference.clone(),
            )?;
            summary.record(&entry.transaction, &resolution);
            resolutions.push(ResolvedTransaction {
                transaction_id: entry.transaction.id.clone(),
                resolution,
            });
        }

        tracing::debug!(
            tenant_id = %policy.tenant_id,
            count = resolutions.len(),
            conflicts = summary.conflicts,
            "resolved batch"
        );

        Ok(BatchReport {
            resolutions,
            summary,
        })
    }
}
