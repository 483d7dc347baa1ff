use chrono::{TimeZone, Utc};
use fee_policy::model::{
    AmountTier, Currency, FeeRate, PaymentType, PolicyRule, Scheme, TenantPolicy, Transaction,
};
use fee_policy::resolver::{calculate_tiered_fee, Resolver};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn currency() -> impl Strategy<Value = Currency> {
    prop_oneof![Just(Currency::Zar), Just(Currency::Usd), Just(Currency::Eur)]
}

fn payment_type() -> impl Strategy<Value = PaymentType> {
    prop_oneof![
        Just(PaymentType::Card),
        Just(PaymentType::Bank),
        Just(PaymentType::Wallet)
    ]
}

fn scheme() -> impl Strategy<Value = Option<Scheme>> {
    prop_oneof![
        Just(None),
        Just(Some(Scheme::Visa)),
        Just(Some(Scheme::Mastercard)),
        Just(Some(Scheme::Amex))
    ]
}

fn rule() -> impl Strategy<Value = PolicyRule> {
    (
        prop::option::of(currency()),
        prop::option::of(payment_type()),
        scheme(),
        prop::option::of(prop_oneof![Just("m_1"), Just("m_2")]),
        0u32..1_000,
        prop::option::of(-20i64..20),
        any::<bool>(),
    )
        .prop_map(|(currency, payment_type, scheme, merchant, bps, priority, enabled)| {
            PolicyRule {
                currency,
                payment_type,
                scheme,
                merchant_id: merchant.map(str::to_string),
                priority,
                enabled,
                ..PolicyRule::flat("r", "Generated", bps)
            }
        })
}

fn policy(rules: Vec<PolicyRule>) -> TenantPolicy {
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let rules = rules
        .into_iter()
        .enumerate()
        .map(|(i, rule)| PolicyRule {
            id: format!("rule_{i:03}"),
            ..rule
        })
        .collect();
    TenantPolicy {
        tenant_id: "tenant_prop".to_string(),
        tenant_name: "Property".to_string(),
        version: 1,
        default_fees: BTreeMap::from([
            (PaymentType::Card, 260),
            (PaymentType::Bank, 90),
            (PaymentType::Wallet, 150),
        ]),
        rules,
        created_at: at,
        updated_at: at,
    }
}

proptest! {
    #[test]
    fn prop_resolution_is_deterministic(
        rules in prop::collection::vec(rule(), 0..8),
        amount in 0u64..10_000_000,
        currency in currency(),
        payment_type in payment_type(),
        scheme in scheme(),
        merchant in prop::option::of(prop_oneof![Just("m_1"), Just("m_2")]),
    ) {
        let policy = policy(rules);
        let tx = Transaction::new(
            "t", amount, currency, payment_type, scheme,
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        );
        let resolver = Resolver::default();
        let first = resolver.resolve(&tx, &policy, merchant).unwrap();
        let second = resolver.resolve(&tx, &policy, merchant).unwrap();
        prop_assert_eq!(&first, &second);

        // Trace steps are numbered 1..=n and start from the default.
        for (i, step) in first.trace.iter().enumerate() {
            prop_assert_eq!(step.step as usize, i + 1);
        }
        prop_assert_eq!(first.fee_amount + first.net_amount, amount);

        if let Some(conflict) = &first.conflict {
            prop_assert!(conflict.rules.len() > 1);
            prop_assert_eq!(Some(conflict.rules[0].id.as_str()), first.final_rule_id());
        }
    }

    #[test]
    fn prop_tier_total_close_to_exact(
        caps in prop::collection::vec(1u64..5_000_000, 0..4),
        rates in prop::collection::vec(0u32..1_000, 5),
        amount in 1u64..100_000_000,
    ) {
        let mut tiers: Vec<AmountTier> = caps
            .iter()
            .zip(rates.iter())
            .map(|(cap, bps)| AmountTier::up_to(*cap, *bps))
            .collect();
        tiers.push(AmountTier::open(rates[4]));

        let breakdown = calculate_tiered_fee(amount, &tiers);
        let allocated: u64 = breakdown.bands.iter().map(|b| b.allocated).sum();
        prop_assert_eq!(allocated, amount);

        // Each band rounds by at most half a minor unit.
        let exact_scaled: u128 = breakdown
            .bands
            .iter()
            .map(|b| b.allocated as u128 * b.fee_bps as u128)
            .sum();
        let total_scaled = breakdown.total_fee as u128 * 10_000;
        let drift = total_scaled.abs_diff(exact_scaled);
        prop_assert!(drift <= breakdown.bands.len() as u128 * 5_000);

        // The blended rate reproduces the piecewise total under the flat formula.
        let reproduced = breakdown.fee_rate.fee_for(amount);
        prop_assert!(reproduced.abs_diff(breakdown.total_fee) <= 1);
    }

    #[test]
    fn prop_single_band_matches_flat(amount in 0u64..1_000_000_000, bps in 0u32..10_000) {
        let breakdown = calculate_tiered_fee(amount, &[AmountTier::open(bps)]);
        prop_assert_eq!(breakdown.total_fee, fee_policy::model::fee_amount(amount, bps));
        if amount > 0 && breakdown.total_fee * 10_000 == amount * bps as u64 {
            prop_assert_eq!(breakdown.fee_rate, FeeRate::from_bps(bps));
        }
    }
}
