use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Basis points per unit (10_000 bps = 100%).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// `FeeRate` units per basis point.
pub const RATE_SCALE: u64 = 10_000;

/// Integer division rounding half away from zero. `den` must be non-zero.
pub fn round_half_up_div(num: u128, den: u128) -> u128 {
    (num + den / 2) / den
}

fn saturate(value: u128) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

/// Fee in minor units for a flat rate: `round(amount * bps / 10000)`.
pub fn fee_amount(amount: u64, fee_bps: u32) -> u64 {
    saturate(round_half_up_div(
        amount as u128 * fee_bps as u128,
        BPS_DENOMINATOR as u128,
    ))
}

/// Fee rate in fixed point: ten-thousandths of a basis point.
///
/// Flat rule rates are exact. Blended rates from tiered pricing are rounded
/// half-up at this precision, so 252.5 bps is stored as `2_525_000`.
///
/// On the wire the rate is plain basis points, the same unit as a rule's
/// `feeBps`: an integer when whole (`270`), a decimal otherwise (`252.5`).
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FeeRate(u64);

impl FeeRate {
    pub const ZERO: FeeRate = FeeRate(0);

    pub fn from_bps(fee_bps: u32) -> Self {
        FeeRate(fee_bps as u64 * RATE_SCALE)
    }

    pub fn from_scaled(units: u64) -> Self {
        FeeRate(units)
    }

    /// Effective rate that spreads `total_fee` over `amount`. Zero for a zero amount.
    pub fn blended(total_fee: u64, amount: u64) -> Self {
        if amount == 0 {
            return FeeRate::ZERO;
        }
        let num = total_fee as u128 * BPS_DENOMINATOR as u128 * RATE_SCALE as u128;
        FeeRate(saturate(round_half_up_div(num, amount as u128)))
    }

    pub fn scaled(self) -> u64 {
        self.0
    }

    /// The rate in whole basis points, if it has no fractional part.
    pub fn whole_bps(self) -> Option<u64> {
        (self.0 % RATE_SCALE == 0).then_some(self.0 / RATE_SCALE)
    }

    pub fn as_bps_f64(self) -> f64 {
        self.0 as f64 / RATE_SCALE as f64
    }

    /// Fee in minor units for `amount` at this rate, rounded half-up.
    pub fn fee_for(self, amount: u64) -> u64 {
        let den = BPS_DENOMINATOR as u128 * RATE_SCALE as u128;
        saturate(round_half_up_div(amount as u128 * self.0 as u128, den))
    }
}

impl Serialize for FeeRate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.whole_bps() {
            Some(bps) => serializer.serialize_u64(bps),
            None => serializer.serialize_f64(self.as_bps_f64()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BpsValue {
    Whole(u64),
    Fractional(f64),
}

impl<'de> Deserialize<'de> for FeeRate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match BpsValue::deserialize(deserializer)? {
            BpsValue::Whole(bps) => bps
                .checked_mul(RATE_SCALE)
                .map(FeeRate)
                .ok_or_else(|| de::Error::custom("fee rate out of range")),
            BpsValue::Fractional(bps) => {
                let scaled = (bps * RATE_SCALE as f64).round();
                if !scaled.is_finite() || scaled < 0.0 || scaled > u64::MAX as f64 {
                    return Err(de::Error::custom(format!("invalid fee rate {}", bps)));
                }
                Ok(FeeRate(scaled as u64))
            }
        }
    }
}

/// Percent with two decimals, e.g. `2.60%`.
impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bps = round_half_up_div(self.0 as u128, RATE_SCALE as u128);
        write!(f, "{}.{:02}%", bps / 100, bps % 100)
    }
}
