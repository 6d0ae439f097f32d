//! Flat list query parameters.

use std::collections::BTreeMap;

use serde::Serialize;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Free text or enum value.
    Text(String),
    /// Integer value (pages, timestamps).
    Int(i64),
    /// Boolean marker.
    Flag(bool),
    /// Set of values, sent comma-separated.
    List(Vec<String>),
}

impl ParamValue {
    /// Whether the value carries information worth sending.
    ///
    /// Blank text, zero, `false` and empty lists are treated as absent.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::Text(text) => !text.is_empty(),
            Self::Int(n) => *n != 0,
            Self::Flag(flag) => *flag,
            Self::List(items) => !items.is_empty(),
        }
    }

    /// Wire encoding of the value.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Int(n) => n.to_string(),
            Self::Flag(flag) => flag.to_string(),
            Self::List(items) => items.join(","),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Parameters for one list request.
///
/// `params` is the flat mapping sent as query pairs. `negated` holds
/// "NOT IN" constraints that the client encodes separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    params: BTreeMap<String, ParamValue>,
    negated: BTreeMap<String, Vec<String>>,
}

impl ListQuery {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter. Absent values (see [`ParamValue::is_present`]) are
    /// dropped and remove any previous value for the key.
    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        if value.is_present() {
            self.params.insert(key.to_owned(), value);
        } else {
            self.params.remove(key);
        }
    }

    /// Set an optional parameter; `None` leaves the key absent.
    pub fn insert_opt<V: Into<ParamValue>>(&mut self, key: &str, value: Option<V>) {
        match value {
            Some(value) => self.insert(key, value),
            None => {
                self.params.remove(key);
            }
        }
    }

    /// Add a "NOT IN" constraint. Empty sets are ignored.
    pub fn negate(&mut self, key: &str, values: Vec<String>) {
        if !values.is_empty() {
            self.negated.insert(key.to_owned(), values);
        }
    }

    /// Look up a parameter.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Whether a parameter is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// The flat parameter mapping.
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    /// The negated constraints.
    #[must_use]
    pub const fn negated(&self) -> &BTreeMap<String, Vec<String>> {
        &self.negated
    }

    /// Requested page, when set.
    #[must_use]
    pub fn page(&self) -> Option<u32> {
        match self.params.get("page") {
            Some(ParamValue::Int(n)) => u32::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Encode as URL query pairs. Negated keys get a trailing `!`.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(key, value)| (key.clone(), value.encode()))
            .chain(
                self.negated
                    .iter()
                    .map(|(key, values)| (format!("{key}!"), values.join(","))),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_values_are_dropped() {
        let mut query = ListQuery::new();
        query.insert("email", "");
        query.insert("from", 0_i64);
        query.insert("tax", false);
        query.insert("billing_countries", Vec::<String>::new());
        query.insert_opt::<String>("item_type", None);
        assert!(query.params().is_empty());
    }

    #[test]
    fn test_insert_absent_value_clears_previous() {
        let mut query = ListQuery::new();
        query.insert("email", "ada@example.com");
        query.insert("email", "");
        assert!(!query.contains_key("email"));
    }

    #[test]
    fn test_to_pairs_encodes_lists_and_negation() {
        let mut query = ListQuery::new();
        query.insert("page", 2_u32);
        query.insert("tax", true);
        query.insert(
            "billing_countries",
            vec!["DE".to_string(), "FR".to_string()],
        );
        query.negate("shipping_countries", vec!["US".to_string()]);

        assert_eq!(
            query.to_pairs(),
            vec![
                ("billing_countries".to_string(), "DE,FR".to_string()),
                ("page".to_string(), "2".to_string()),
                ("tax".to_string(), "true".to_string()),
                ("shipping_countries!".to_string(), "US".to_string()),
            ]
        );
        assert_eq!(query.page(), Some(2));
    }
}
