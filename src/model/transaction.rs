use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Settlement currency of a transaction.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Zar,
    Usd,
    Eur,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Currency::Zar => "ZAR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Card,
    Bank,
    Wallet,
}

impl PaymentType {
    /// Every payment type a tenant's default fees must cover.
    pub const ALL: [PaymentType; 3] = [PaymentType::Card, PaymentType::Bank, PaymentType::Wallet];
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentType::Card => "card",
            PaymentType::Bank => "bank",
            PaymentType::Wallet => "wallet",
        };
        f.write_str(name)
    }
}

/// Card network.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Visa,
    Mastercard,
    Amex,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scheme::Visa => "visa",
            Scheme::Mastercard => "mastercard",
            Scheme::Amex => "amex",
        };
        f.write_str(name)
    }
}

/// A payment as seen by the resolver. Created upstream and never mutated here.
///
/// `amount` is in minor currency units (cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub amount: u64,
    pub currency: Currency,
    pub payment_type: PaymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<Scheme>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        amount: u64,
        currency: Currency,
        payment_type: PaymentType,
        scheme: Option<Scheme>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Transaction {
            id: id.into(),
            amount,
            currency,
            payment_type,
            scheme,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_document_shape() {
        let json = r#"{
            "id": "t_1",
            "amount": 56000,
            "currency": "USD",
            "paymentType": "card",
            "scheme": "mastercard",
            "createdAt": "2025-09-20T10:00:00Z",
            "fee": 270
        }"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.id, "t_1");
        assert_eq!(tx.amount, 56_000);
        assert_eq!(tx.currency, Currency::Usd);
        assert_eq!(tx.payment_type, PaymentType::Card);
        assert_eq!(tx.scheme, Some(Scheme::Mastercard));
    }

    #[test]
    fn test_scheme_is_optional() {
        let json = r#"{"id":"t_2","amount":100,"currency":"ZAR","paymentType":"bank","createdAt":"2025-01-01T00:00:00Z"}"#;
        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.scheme, None);
        assert!(!serde_json::to_string(&tx).unwrap().contains("scheme"));
    }

    #[test]
    fn test_display_codes() {
        assert_eq!(Currency::Eur.to_string(), "EUR");
        assert_eq!(PaymentType::Wallet.to_string(), "wallet");
        assert_eq!(Scheme::Amex.to_string(), "amex");
    }
}
