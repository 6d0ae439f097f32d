//! Status enums for orders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct StatusParseError {
    kind: &'static str,
    value: String,
}

/// Order payment state as reported by the commerce backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentState {
    /// The wire value used in query parameters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentState {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => Err(StatusParseError {
                kind: "payment state",
                value: other.to_owned(),
            }),
        }
    }
}

/// Order fulfillment (shipping) state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentState {
    #[default]
    Pending,
    Shipped,
    Failed,
}

impl FulfillmentState {
    /// The wire value used in query parameters.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Shipped => "shipped",
            Self::Failed => "failed",
        }
    }

    /// The state an operator flips to from the detail view.
    ///
    /// Shipped orders go back to pending, everything else is marked shipped.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Shipped => Self::Pending,
            Self::Pending | Self::Failed => Self::Shipped,
        }
    }
}

impl fmt::Display for FulfillmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FulfillmentState {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "shipped" => Ok(Self::Shipped),
            "failed" => Ok(Self::Failed),
            other => Err(StatusParseError {
                kind: "fulfillment state",
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_states() {
        assert_eq!("paid".parse::<PaymentState>(), Ok(PaymentState::Paid));
        assert_eq!(
            "shipped".parse::<FulfillmentState>(),
            Ok(FulfillmentState::Shipped)
        );
        let err = "lost".parse::<FulfillmentState>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown fulfillment state: 'lost'");
    }

    #[test]
    fn test_fulfillment_toggle() {
        assert_eq!(FulfillmentState::Pending.toggled(), FulfillmentState::Shipped);
        assert_eq!(FulfillmentState::Shipped.toggled(), FulfillmentState::Pending);
        assert_eq!(FulfillmentState::Failed.toggled(), FulfillmentState::Shipped);
    }
}
