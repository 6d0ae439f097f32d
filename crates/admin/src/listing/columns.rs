//! Persisted column visibility.
//!
//! Stored as a versioned JSON document:
//!
//! ```json
//! {"version": 1, "columns": {"Date": true, "ID": false}}
//! ```
//!
//! Stored flags are merged over the table defaults, so columns added since the
//! document was written get their default and titles that no longer exist are
//! dropped. Documents with another version are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{DataTableConfig, TableColumn};
use crate::preferences::{PreferenceError, PreferenceStore};

/// Current document version.
pub const COLUMN_DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ColumnDocument {
    version: u32,
    columns: BTreeMap<String, bool>,
}

/// Ordered `(title, enabled)` flags for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnVisibility {
    entries: Vec<(String, bool)>,
}

impl ColumnVisibility {
    /// Table defaults.
    #[must_use]
    pub fn defaults(table: &DataTableConfig) -> Self {
        Self {
            entries: table
                .columns
                .iter()
                .map(|c| (c.title.clone(), c.default_visible))
                .collect(),
        }
    }

    /// Defaults with a stored document merged over them.
    ///
    /// Unparsable or differently versioned documents yield the defaults.
    #[must_use]
    pub fn from_document(table: &DataTableConfig, document: Option<&str>) -> Self {
        let mut visibility = Self::defaults(table);

        let stored = document.and_then(|text| match serde_json::from_str::<ColumnDocument>(text) {
            Ok(doc) if doc.version == COLUMN_DOCUMENT_VERSION => Some(doc.columns),
            Ok(doc) => {
                tracing::warn!(
                    version = doc.version,
                    "Ignoring column preferences with unknown version"
                );
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable column preferences");
                None
            }
        });

        if let Some(stored) = stored {
            for (title, enabled) in &mut visibility.entries {
                if let Some(&flag) = stored.get(title.as_str()) {
                    *enabled = flag;
                }
            }
        }
        visibility
    }

    /// Load from a preference store under the table's key.
    #[must_use]
    pub fn load(table: &DataTableConfig, store: &impl PreferenceStore) -> Self {
        Self::from_document(table, store.get(&table.prefs_key).as_deref())
    }

    /// Serialize as a versioned document.
    #[must_use]
    pub fn to_document(&self) -> String {
        let doc = ColumnDocument {
            version: COLUMN_DOCUMENT_VERSION,
            columns: self.entries.iter().cloned().collect(),
        };
        // A map of strings to bools always serializes.
        serde_json::to_string(&doc).unwrap_or_default()
    }

    /// Write to a preference store under the table's key.
    ///
    /// # Errors
    ///
    /// Returns `PreferenceError` if the store rejects the write.
    pub fn save(
        &self,
        table: &DataTableConfig,
        store: &impl PreferenceStore,
    ) -> Result<(), PreferenceError> {
        store.set(&table.prefs_key, &self.to_document())
    }

    /// Flip a column. Returns its new state, or `None` for unknown titles.
    pub fn toggle(&mut self, title: &str) -> Option<bool> {
        let (_, enabled) = self.entries.iter_mut().find(|(t, _)| t == title)?;
        *enabled = !*enabled;
        Some(*enabled)
    }

    /// Whether a column is enabled.
    #[must_use]
    pub fn is_enabled(&self, title: &str) -> bool {
        self.entries.iter().any(|(t, enabled)| t == title && *enabled)
    }

    /// All flags in display order.
    #[must_use]
    pub fn entries(&self) -> &[(String, bool)] {
        &self.entries
    }

    /// Enabled columns of `table`, in display order.
    pub fn enabled_columns<'a>(
        &'a self,
        table: &'a DataTableConfig,
    ) -> impl Iterator<Item = &'a TableColumn> + 'a {
        table.columns.iter().filter(|c| self.is_enabled(&c.title))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::components::orders_table_config;
    use crate::preferences::MemoryPreferenceStore;

    #[test]
    fn test_missing_document_gives_defaults() {
        let table = orders_table_config();
        let visibility = ColumnVisibility::from_document(&table, None);
        assert_eq!(visibility, ColumnVisibility::defaults(&table));
        assert!(visibility.is_enabled("Date"));
        assert!(!visibility.is_enabled("ID"));
    }

    #[test]
    fn test_stored_flags_merge_over_defaults() {
        let table = orders_table_config();
        // Written before "Shipping Company" existed, and holds a retired column.
        let doc = r#"{"version":1,"columns":{"ID":true,"Date":false,"Retired":true}}"#;
        let visibility = ColumnVisibility::from_document(&table, Some(doc));

        assert!(visibility.is_enabled("ID"));
        assert!(!visibility.is_enabled("Date"));
        assert!(visibility.is_enabled("Total"));
        assert!(!visibility.is_enabled("Shipping Company"));
        assert!(!visibility.is_enabled("Retired"));
        assert_eq!(visibility.entries().len(), table.columns.len());
    }

    #[test]
    fn test_unknown_version_and_garbage_fall_back() {
        let table = orders_table_config();
        let defaults = ColumnVisibility::defaults(&table);
        assert_eq!(
            ColumnVisibility::from_document(&table, Some(r#"{"version":7,"columns":{"ID":true}}"#)),
            defaults
        );
        assert_eq!(
            ColumnVisibility::from_document(&table, Some(r#"{"ID":true}"#)),
            defaults
        );
        assert_eq!(ColumnVisibility::from_document(&table, Some("not json")), defaults);
    }

    #[test]
    fn test_toggle_and_save_roundtrip() {
        let table = orders_table_config();
        let store = MemoryPreferenceStore::new();
        let mut visibility = ColumnVisibility::load(&table, &store);

        assert_eq!(visibility.toggle("Billing Address"), Some(true));
        assert_eq!(visibility.toggle("Nope"), None);
        visibility.save(&table, &store).unwrap();

        let reloaded = ColumnVisibility::load(&table, &store);
        assert!(reloaded.is_enabled("Billing Address"));
        assert_eq!(reloaded, visibility);
    }

    #[test]
    fn test_enabled_columns_keep_display_order() {
        let table = orders_table_config();
        let visibility = ColumnVisibility::defaults(&table);
        let titles: Vec<_> = visibility
            .enabled_columns(&table)
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, table.default_columns());
    }
}
