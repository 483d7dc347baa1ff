use crate::model::PaymentType;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Rule {rule_id} has neither feeBps nor amountTiers")]
    MissingFeeSpec { rule_id: String },

    #[error("Rule {rule_id} has more than one open-ended amount tier")]
    MultipleOpenTiers { rule_id: String },

    #[error("Rule {rule_id} has effectiveFrom after effectiveTo")]
    InvalidWindow { rule_id: String },

    #[error("Duplicate rule id {rule_id} in policy")]
    DuplicateRuleId { rule_id: String },

    #[error("Tenant policy has no default fee for payment type {payment_type}")]
    MissingDefaultFee { payment_type: PaymentType },

    #[error("Policy {tenant_id} has {count} configuration problem(s)")]
    InvalidPolicy { tenant_id: String, count: usize },

    #[error("Ambiguous policy: rules {} tie at specificity {score}", rule_ids.join(", "))]
    AmbiguousPolicy { score: i64, rule_ids: Vec<String> },

    #[error("Policy not found for tenant {0}")]
    PolicyNotFound(String),

    #[error("Invalid setting: {0}")]
    Settings(String),

    #[error("Invalid document: {0}")]
    Document(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl Error {
    /// True when the policy document itself is malformed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingFeeSpec { .. }
                | Error::MultipleOpenTiers { .. }
                | Error::InvalidWindow { .. }
                | Error::DuplicateRuleId { .. }
                | Error::MissingDefaultFee { .. }
                | Error::InvalidPolicy { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_flagged() {
        let err = Error::MissingDefaultFee {
            payment_type: PaymentType::Wallet,
        };
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "Tenant policy has no default fee for payment type wallet"
        );

        let invalid = Error::InvalidPolicy {
            tenant_id: "tenant_001".to_string(),
            count: 2,
        };
        assert!(invalid.is_configuration());
        assert_eq!(
            invalid.to_string(),
            "Policy tenant_001 has 2 configuration problem(s)"
        );

        let ambiguous = Error::AmbiguousPolicy {
            score: 111,
            rule_ids: vec!["a".to_string(), "b".to_string()],
        };
        assert!(!ambiguous.is_configuration());
        assert_eq!(
            ambiguous.to_string(),
            "Ambiguous policy: rules a, b tie at specificity 111"
        );
    }
}
