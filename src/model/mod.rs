pub mod policy;
pub mod rate;
pub mod resolution;
pub mod transaction;

pub use policy::{AmountTier, FeeSpec, PolicyDocument, PolicyRule, RuleDocument, TenantPolicy};
pub use rate::{fee_amount, round_half_up_div, FeeRate, BPS_DENOMINATOR, RATE_SCALE};
pub use resolution::{
    ConflictResolution, PolicyConflict, PolicyRef, PolicyResolution, ResolutionStep, StepKind,
};
pub use transaction::{Currency, PaymentType, Scheme, Transaction};
