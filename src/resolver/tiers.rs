//! Progressive (tiered) pricing.

use crate::format::{bps_to_percent, format_minor_units};
use crate::model::{fee_amount, AmountTier, FeeRate};
use std::cmp::Ordering;

/// Portion of an amount consumed by one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierBand {
    pub up_to: Option<u64>,
    pub fee_bps: u32,
    pub allocated: u64,
    pub fee: u64,
}

impl TierBand {
    pub fn describe(&self) -> String {
        let qualifier = if self.up_to.is_some() { "First" } else { "Remaining" };
        format!(
            "{} {} at {}",
            qualifier,
            format_minor_units(self.allocated),
            bps_to_percent(self.fee_bps)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierBreakdown {
    /// Blended rate reproducing `total_fee` under the flat formula.
    pub fee_rate: FeeRate,
    /// Sum of the per-band fees, each rounded half-up.
    pub total_fee: u64,
    pub bands: Vec<TierBand>,
}

impl TierBreakdown {
    pub fn descriptions(&self) -> Vec<String> {
        self.bands.iter().map(TierBand::describe).collect()
    }
}

fn tier_order(a: &AmountTier, b: &AmountTier) -> Ordering {
    match (a.up_to, b.up_to) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Walk the tiers in ascending order, allocating up to each tier's `up_to`
/// from what remains of `amount`; the open tier takes the rest.
pub fn calculate_tiered_fee(amount: u64, tiers: &[AmountTier]) -> TierBreakdown {
    let mut sorted = tiers.to_vec();
    sorted.sort_by(tier_order);

    let mut bands = Vec::new();
    let mut total_fee: u64 = 0;
    let mut remaining = amount;

    for tier in sorted {
        if remaining == 0 {
            break;
        }
        let allocated = match tier.up_to {
            Some(up_to) => remaining.min(up_to),
            None => remaining,
        };
        if allocated == 0 {
            continue;
        }
        let fee = fee_amount(allocated, tier.fee_bps);
        total_fee = total_fee.saturating_add(fee);
        remaining -= allocated;
        bands.push(TierBand {
            up_to: tier.up_to,
            fee_bps: tier.fee_bps,
            allocated,
            fee,
        });
    }

    TierBreakdown {
        fee_rate: FeeRate::blended(total_fee, amount),
        total_fee,
        bands,
    }
}
