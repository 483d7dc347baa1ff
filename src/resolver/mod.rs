pub mod criteria;
pub mod engine;
pub mod matcher;
pub mod specificity;
pub mod tiers;

pub use criteria::rule_criteria;
pub use engine::{resolve_fee_policy, ResolutionContext, Resolver};
pub use matcher::matches;
pub use specificity::specificity;
pub use tiers::{calculate_tiered_fee, TierBand, TierBreakdown};
