//! Resolution engine: default lookup, rule matching, specificity ranking,
//! conflict detection and fee computation, recorded as an ordered trace.
//!
//! Resolution is a pure function of (transaction, policy, merchant id): no
//! clock reads, no I/O, no shared state. Repeated calls give identical results.

use crate::config::{Config, ConflictMode};
use crate::error::{Error, Result};
use crate::fingerprint::policy_ref;
use crate::format::bps_to_percent;
use crate::model::{
    fee_amount, ConflictResolution, FeeRate, FeeSpec, PolicyConflict, PolicyRef, PolicyResolution,
    PolicyRule, ResolutionStep, StepKind, TenantPolicy, Transaction,
};
use crate::resolver::matcher::matches;
use crate::resolver::specificity::specificity;
use crate::resolver::tiers::calculate_tiered_fee;

/// Inputs of a single resolution.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub transaction: &'a Transaction,
    pub tenant_policy: &'a TenantPolicy,
    /// Merchant context not carried on the transaction itself.
    pub merchant_id: Option<&'a str>,
}

/// Resolve with the default (first-match) conflict handling.
pub fn resolve_fee_policy(ctx: &ResolutionContext<'_>) -> Result<PolicyResolution> {
    Resolver::default().resolve(ctx.transaction, ctx.tenant_policy, ctx.merchant_id)
}

#[derive(Debug, Default)]
struct Trace {
    steps: Vec<ResolutionStep>,
}

impl Trace {
    fn push(
        &mut self,
        kind: StepKind,
        description: String,
        fee_bps: Option<FeeRate>,
        rule: Option<&PolicyRule>,
    ) {
        self.steps.push(ResolutionStep {
            step: self.steps.len() as u32 + 1,
            kind,
            description,
            fee_bps,
            rule_id: rule.map(|r| r.id.clone()),
            rule_name: rule.map(|r| r.name.clone()),
        });
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    conflict_mode: ConflictMode,
}

impl Resolver {
    pub fn new(conflict_mode: ConflictMode) -> Self {
        Resolver { conflict_mode }
    }

    pub fn from_config(config: &Config) -> Self {
        Resolver::new(config.get_conflict_mode())
    }

    pub fn conflict_mode(&self) -> ConflictMode {
        self.conflict_mode
    }

    pub fn resolve(
        &self,
        transaction: &Transaction,
        policy: &TenantPolicy,
        merchant_id: Option<&str>,
    ) -> Result<PolicyResolution> {
        let reference = policy_ref(policy)?;
        self.resolve_with_ref(transaction, policy, merchant_id, reference)
    }

    /// Resolve against a policy whose reference was already computed.
    pub(crate) fn resolve_with_ref(
        &self,
        transaction: &Transaction,
        policy: &TenantPolicy,
        merchant_id: Option<&str>,
        reference: PolicyRef,
    ) -> Result<PolicyResolution> {
        let mut trace = Trace::default();

        let default_bps = policy.default_fee(transaction.payment_type)?;
        trace.push(
            StepKind::Default,
            format!(
                "Base policy for {}: {}",
                transaction.payment_type,
                bps_to_percent(default_bps)
            ),
            Some(FeeRate::from_bps(default_bps)),
            None,
        );

        let scored: Vec<(&PolicyRule, i64)> = policy
            .rules
            .iter()
            .filter(|rule| matches(rule, transaction, merchant_id))
            .map(|rule| (rule, specificity(rule)))
            .collect();

        tracing::debug!(
            tenant_id = %policy.tenant_id,
            transaction_id = %transaction.id,
            matched = scored.len(),
            "resolving fee policy"
        );

        let Some(top_score) = scored.iter().map(|(_, score)| *score).max() else {
            trace.push(
                StepKind::RuleMatch,
                "No override rules matched. Using base policy.".to_string(),
                None,
                None,
            );
            let fee = fee_amount(transaction.amount, default_bps);
            return Ok(PolicyResolution {
                fee_bps: FeeRate::from_bps(default_bps),
                fee_amount: fee,
                net_amount: transaction.amount.saturating_sub(fee),
                trace: trace.steps,
                final_rule: None,
                conflict: None,
                policy: reference,
            });
        };

        // Ties keep the policy's authoring order.
        let top: Vec<&PolicyRule> = scored
            .iter()
            .filter(|(_, score)| *score == top_score)
            .map(|(rule, _)| *rule)
            .collect();
        let selected = top[0];

        let conflict = if top.len() > 1 {
            let rule_ids: Vec<String> = top.iter().map(|rule| rule.id.clone()).collect();
            if self.conflict_mode == ConflictMode::Reject {
                return Err(Error::AmbiguousPolicy {
                    score: top_score,
                    rule_ids,
                });
            }
            tracing::warn!(
                tenant_id = %policy.tenant_id,
                transaction_id = %transaction.id,
                score = top_score,
                rules = %rule_ids.join(","),
                selected = %selected.id,
                "equally specific rules matched; using first in list order"
            );
            trace.push(
                StepKind::Conflict,
                format!(
                    "Conflict: {} rules matched with same specificity (score: {}). Using first match: \"{}\"",
                    top.len(),
                    top_score,
                    selected.name
                ),
                None,
                Some(selected),
            );
            Some(PolicyConflict {
                rules: top.iter().map(|rule| (*rule).clone()).collect(),
                message: format!(
                    "{} rules have equal specificity (score: {})",
                    top.len(),
                    top_score
                ),
                resolution: ConflictResolution::FirstMatch,
            })
        } else {
            trace.push(
                StepKind::RuleMatch,
                format!(
                    "Matched rule: \"{}\" (specificity: {})",
                    selected.name, top_score
                ),
                None,
                Some(selected),
            );
            None
        };

        let (fee_rate, fee) = match &selected.fee {
            FeeSpec::Flat { fee_bps } => {
                let rate = FeeRate::from_bps(*fee_bps);
                trace.push(
                    StepKind::RuleMatch,
                    format!("Applied fee: {}", bps_to_percent(*fee_bps)),
                    Some(rate),
                    Some(selected),
                );
                (rate, fee_amount(transaction.amount, *fee_bps))
            }
            FeeSpec::Tiered { tiers } => {
                if tiers.is_empty() {
                    return Err(Error::MissingFeeSpec {
                        rule_id: selected.id.clone(),
                    });
                }
                let breakdown = calculate_tiered_fee(transaction.amount, tiers);
                trace.push(
                    StepKind::TierCalculation,
                    format!(
                        "Tiered pricing applied:\n{}",
                        breakdown.descriptions().join("\n")
                    ),
                    Some(breakdown.fee_rate),
                    Some(selected),
                );
                (breakdown.fee_rate, breakdown.total_fee)
            }
        };

        Ok(PolicyResolution {
            fee_bps: fee_rate,
            fee_amount: fee,
            net_amount: transaction.amount.saturating_sub(fee),
            trace: trace.steps,
            final_rule: Some(selected.clone()),
            conflict,
            policy: reference,
        })
    }
}
