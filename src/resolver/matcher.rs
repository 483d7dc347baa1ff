use crate::model::{PolicyRule, Transaction};

/// Whether `rule` applies to `tx`.
///
/// Validity windows are inclusive on both ends and compared against the
/// transaction's own timestamp, never the wall clock. A merchant criterion
/// only matches when the caller supplies the same merchant id.
pub fn matches(rule: &PolicyRule, tx: &Transaction, merchant_id: Option<&str>) -> bool {
    if !rule.enabled {
        return false;
    }

    if let Some(from) = rule.effective_from {
        if tx.created_at < from {
            return false;
        }
    }
    if let Some(to) = rule.effective_to {
        if tx.created_at > to {
            return false;
        }
    }

    if rule.currency.is_some_and(|currency| currency != tx.currency) {
        return false;
    }
    if rule
        .payment_type
        .is_some_and(|payment_type| payment_type != tx.payment_type)
    {
        return false;
    }
    if rule.scheme.is_some() && rule.scheme != tx.scheme {
        return false;
    }
    if let Some(required) = rule.merchant_id.as_deref() {
        if merchant_id != Some(required) {
            return false;
        }
    }

    true
}
