use crate::model::PolicyRule;

/// Human-readable criteria of a rule, most specific first:
/// `"Scheme: amex + Currency: USD"`.
pub fn rule_criteria(rule: &PolicyRule) -> String {
    let mut criteria = Vec::new();
    if let Some(merchant_id) = &rule.merchant_id {
        criteria.push(format!("Merchant: {}", merchant_id));
    }
    if let Some(scheme) = rule.scheme {
        criteria.push(format!("Scheme: {}", scheme));
    }
    if let Some(currency) = rule.currency {
        criteria.push(format!("Currency: {}", currency));
    }
    if let Some(payment_type) = rule.payment_type {
        criteria.push(format!("Payment: {}", payment_type));
    }

    if criteria.is_empty() {
        "No specific criteria".to_string()
    } else {
        criteria.join(" + ")
    }
}
