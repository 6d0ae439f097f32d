//! Money amounts stored as integer minor units.
//!
//! The commerce backend reports every monetary field as an integer count of the
//! currency's smallest unit (cents for USD and EUR) next to an ISO 4217 code.
//! [`Money`] keeps that representation and only converts to a decimal when
//! formatting.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in minor units with its currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the smallest currency unit (e.g., cents).
    pub amount: i64,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: i64, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    #[must_use]
    pub fn major_units(&self) -> Decimal {
        Decimal::new(self.amount, 2)
    }

    /// Format for display: `$12.34`, `12.34€`, or `12.34 GBP`.
    #[must_use]
    pub fn display(&self) -> String {
        let amount = format!("{:.2}", self.major_units());
        match &self.currency {
            CurrencyCode::USD => format!("${amount}"),
            CurrencyCode::EUR => format!("{amount}€"),
            other => format!("{amount} {}", other.code()),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
///
/// Codes the admin formats specially get their own variant; anything else the
/// backend sends is kept verbatim in [`CurrencyCode::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    Other(String),
}

impl CurrencyCode {
    /// The three-letter code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "USD" => Self::USD,
            "EUR" => Self::EUR,
            "GBP" => Self::GBP,
            "CAD" => Self::CAD,
            "AUD" => Self::AUD,
            _ => Self::Other(code),
        }
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        Self::from(code.to_owned())
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.code().to_owned()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_per_currency() {
        assert_eq!(Money::new(1234, CurrencyCode::USD).display(), "$12.34");
        assert_eq!(Money::new(1234, CurrencyCode::EUR).display(), "12.34€");
        assert_eq!(Money::new(5, CurrencyCode::GBP).display(), "0.05 GBP");
        assert_eq!(Money::new(100, "SEK".into()).display(), "1.00 SEK");
    }

    #[test]
    fn test_currency_code_round_trips_unknown_codes() {
        let parsed: CurrencyCode = serde_json::from_str("\"NOK\"").unwrap_or_default();
        assert_eq!(parsed, CurrencyCode::Other("NOK".to_string()));
        assert_eq!(serde_json::to_string(&parsed).ok().as_deref(), Some("\"NOK\""));

        let usd: CurrencyCode = serde_json::from_str("\"usd\"").unwrap_or_default();
        assert_eq!(usd, CurrencyCode::USD);
    }
}
