//! Newtype IDs for type-safe record references.
//!
//! The commerce backend hands out opaque string identifiers. Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing
//! IDs from different record types.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use commerce_admin_core::define_id;
/// define_id!(InvoiceId);
/// define_id!(ShipmentId);
///
/// let invoice = InvoiceId::new("inv_1");
/// let shipment = ShipmentId::new("inv_1");
///
/// // These are different types, so this won't compile:
/// // let _: InvoiceId = shipment;
/// assert_eq!(invoice.as_str(), shipment.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard record IDs
define_id!(OrderId);
define_id!(CustomerId);
define_id!(LineItemId);
define_id!(TransactionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_conversion() {
        let id = OrderId::new("ord_42");
        assert_eq!(id.to_string(), "ord_42");
        assert_eq!(id.as_str(), "ord_42");
        assert_eq!(String::from(id.clone()), "ord_42");
        assert_eq!(OrderId::from("ord_42"), id);
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = CustomerId::new("cus_7");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"cus_7\""));

        let parsed: Result<CustomerId, _> = serde_json::from_str("\"cus_7\"");
        assert_eq!(parsed.ok(), Some(id));
    }
}
