//! Common domain types shared across commerce records.

use serde::{Deserialize, Serialize};

// =============================================================================
// Address Types
// =============================================================================

/// Mailing address attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Full name as entered at checkout.
    #[serde(default)]
    pub name: Option<String>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Company name.
    #[serde(default)]
    pub company: Option<String>,
    /// First line of the address.
    #[serde(default)]
    pub address1: Option<String>,
    /// Second line of the address.
    #[serde(default)]
    pub address2: Option<String>,
    /// City.
    #[serde(default)]
    pub city: Option<String>,
    /// Postal/ZIP code.
    #[serde(default)]
    pub zip: Option<String>,
    /// State or province.
    #[serde(default)]
    pub state: Option<String>,
    /// Country.
    #[serde(default)]
    pub country: Option<String>,
}

/// Address sub-fields, in the order they are exported.
pub const ADDRESS_FIELDS: [&str; 8] = [
    "name", "company", "address1", "address2", "city", "zip", "state", "country",
];

impl Address {
    /// Read an address sub-field by its property name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "name" => &self.name,
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "company" => &self.company,
            "address1" => &self.address1,
            "address2" => &self.address2,
            "city" => &self.city,
            "zip" => &self.zip,
            "state" => &self.state,
            "country" => &self.country,
            _ => return None,
        };
        value.as_deref()
    }

    /// Single-line summary: `city, zip, state, country`.
    #[must_use]
    pub fn one_line(&self) -> String {
        [&self.city, &self.zip, &self.state, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let addr = Address {
            name: Some("Ada".to_string()),
            city: Some("London".to_string()),
            ..Address::default()
        };
        assert_eq!(addr.field("name"), Some("Ada"));
        assert_eq!(addr.field("city"), Some("London"));
        assert_eq!(addr.field("zip"), None);
        assert_eq!(addr.field("planet"), None);
    }

    #[test]
    fn test_one_line_skips_missing_parts() {
        let addr = Address {
            city: Some("Berlin".to_string()),
            zip: Some("10115".to_string()),
            country: Some("DE".to_string()),
            ..Address::default()
        };
        assert_eq!(addr.one_line(), "Berlin, 10115, DE");
    }
}
