//! Audit fingerprints of policy documents.
//!
//! A resolution records the SHA-256 of the canonical (bincode) encoding of
//! the policy it was computed from, so an auditor can later confirm which
//! exact document produced a fee.

use crate::error::{Error, Result};
use crate::model::{
    Currency, FeeSpec, PaymentType, PolicyRef, PolicyResolution, PolicyRule, Scheme, TenantPolicy,
};
use crate::sha256_digest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// SHA256 of data, lowercase hex.
pub fn fingerprint_hash(data: &[u8]) -> String {
    hex::encode(sha256_digest(data))
}

/// Every field of a policy, optional ones included, in a fixed order. The
/// JSON document shape omits absent fields, which bincode would then encode
/// as nothing at all.
#[derive(Serialize)]
struct CanonicalPolicy<'a> {
    tenant_id: &'a str,
    tenant_name: &'a str,
    version: u64,
    default_fees: &'a BTreeMap<PaymentType, u32>,
    rules: Vec<CanonicalRule<'a>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct CanonicalRule<'a> {
    id: &'a str,
    name: &'a str,
    description: Option<&'a str>,
    currency: Option<Currency>,
    payment_type: Option<PaymentType>,
    scheme: Option<Scheme>,
    merchant_id: Option<&'a str>,
    fee: CanonicalFee,
    priority: Option<i64>,
    enabled: bool,
    effective_from: Option<DateTime<Utc>>,
    effective_to: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
enum CanonicalFee {
    Flat(u32),
    Tiered(Vec<(Option<u64>, u32)>),
}

impl<'a> From<&'a PolicyRule> for CanonicalRule<'a> {
    fn from(rule: &'a PolicyRule) -> Self {
        let fee = match &rule.fee {
            FeeSpec::Flat { fee_bps } => CanonicalFee::Flat(*fee_bps),
            FeeSpec::Tiered { tiers } => CanonicalFee::Tiered(
                tiers.iter().map(|tier| (tier.up_to, tier.fee_bps)).collect(),
            ),
        };
        CanonicalRule {
            id: &rule.id,
            name: &rule.name,
            description: rule.description.as_deref(),
            currency: rule.currency,
            payment_type: rule.payment_type,
            scheme: rule.scheme,
            merchant_id: rule.merchant_id.as_deref(),
            fee,
            priority: rule.priority,
            enabled: rule.enabled,
            effective_from: rule.effective_from,
            effective_to: rule.effective_to,
        }
    }
}

/// Canonical bytes of a policy. Default fees are an ordered map and rules
/// keep authoring order, so equal documents encode identically.
pub fn canonical_bytes(policy: &TenantPolicy) -> Result<Vec<u8>> {
    let canonical = CanonicalPolicy {
        tenant_id: &policy.tenant_id,
        tenant_name: &policy.tenant_name,
        version: policy.version,
        default_fees: &policy.default_fees,
        rules: policy.rules.iter().map(CanonicalRule::from).collect(),
        created_at: policy.created_at,
        updated_at: policy.updated_at,
    };
    bincode::serialize(&canonical)
        .map_err(|e| Error::Document(format!("Failed to encode policy {}: {}", policy.tenant_id, e)))
}

pub fn policy_fingerprint(policy: &TenantPolicy) -> Result<String> {
    Ok(fingerprint_hash(&canonical_bytes(policy)?))
}

pub fn policy_ref(policy: &TenantPolicy) -> Result<PolicyRef> {
    Ok(PolicyRef {
        tenant_id: policy.tenant_id.clone(),
        version: policy.version,
        fingerprint: policy_fingerprint(policy)?,
    })
}

/// True if `resolution` was computed from exactly this policy document.
pub fn resolved_from(resolution: &PolicyResolution, policy: &TenantPolicy) -> Result<bool> {
    Ok(resolution.policy == policy_ref(policy)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AmountTier;
    use chrono::TimeZone;

    fn policy() -> TenantPolicy {
        let at = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
        TenantPolicy {
            tenant_id: "tenant_002".to_string(),
            tenant_name: "Marketplace Inc".to_string(),
            version: 1,
            default_fees: BTreeMap::from([
                (PaymentType::Card, 280),
                (PaymentType::Bank, 100),
                (PaymentType::Wallet, 180),
            ]),
            rules: vec![PolicyRule::flat("rule_mp_001", "All Cards Flat Rate", 275)
                .for_payment_type(PaymentType::Card)],
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = policy_fingerprint(&policy()).unwrap();
        let b = policy_fingerprint(&policy()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let original = policy_fingerprint(&policy()).unwrap();

        let mut changed = policy();
        changed.rules[0].fee = FeeSpec::Flat { fee_bps: 276 };
        assert_ne!(policy_fingerprint(&changed).unwrap(), original);

        let mut bumped = policy();
        bumped.version = 2;
        assert_ne!(policy_fingerprint(&bumped).unwrap(), original);
    }

    #[test]
    fn test_absent_fields_are_encoded() {
        // Same string moved between two optional fields must change the hash.
        let mut described = policy();
        described.rules[0] = described.rules[0].clone().describe("m_1");
        let mut merchant = policy();
        merchant.rules[0] = merchant.rules[0].clone().for_merchant("m_1");
        assert_ne!(
            policy_fingerprint(&described).unwrap(),
            policy_fingerprint(&merchant).unwrap()
        );

        let mut capped = policy();
        capped.rules[0].fee = FeeSpec::Tiered {
            tiers: vec![AmountTier::up_to(7, 275)],
        };
        let mut open = policy();
        open.rules[0].fee = FeeSpec::Tiered {
            tiers: vec![AmountTier::open(275)],
        };
        assert_ne!(
            canonical_bytes(&capped).unwrap(),
            canonical_bytes(&open).unwrap()
        );
    }

    #[test]
    fn test_policy_ref() {
        let reference = policy_ref(&policy()).unwrap();
        assert_eq!(reference.tenant_id, "tenant_002");
        assert_eq!(reference.version, 1);
        assert_eq!(reference.fingerprint, policy_fingerprint(&policy()).unwrap());
    }
}
