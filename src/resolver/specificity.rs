use crate::model::PolicyRule;

pub const MERCHANT_WEIGHT: i64 = 1000;
pub const SCHEME_WEIGHT: i64 = 100;
pub const CURRENCY_WEIGHT: i64 = 10;
pub const PAYMENT_TYPE_WEIGHT: i64 = 1;

/// Precedence score of a rule; higher wins.
///
/// Merchant targeting always outranks network or geography targeting.
/// `priority` is added on top as an operator override.
pub fn specificity(rule: &PolicyRule) -> i64 {
    let mut score = 0;
    if rule.merchant_id.is_some() {
        score += MERCHANT_WEIGHT;
    }
    if rule.scheme.is_some() {
        score += SCHEME_WEIGHT;
    }
    if rule.currency.is_some() {
        score += CURRENCY_WEIGHT;
    }
    if rule.payment_type.is_some() {
        score += PAYMENT_TYPE_WEIGHT;
    }
    score + rule.priority.unwrap_or(0)
}
