//! Per-row selection overlay.

use serde::Serialize;

use crate::commerce::Record;

/// A loaded record plus its controller-owned selection flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row<T> {
    /// Backend record.
    pub record: T,
    /// Whether the row is selected.
    pub selected: bool,
}

impl<T> Row<T> {
    /// Unselected row.
    pub const fn new(record: T) -> Self {
        Self {
            record,
            selected: false,
        }
    }
}

/// Rows of the current page with selection tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableRows<T> {
    rows: Vec<Row<T>>,
}

impl<T> Default for SelectableRows<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: Record> SelectableRows<T> {
    /// Wrap freshly fetched records; nothing is selected.
    #[must_use]
    pub fn from_records(records: Vec<T>) -> Self {
        Self {
            rows: records.into_iter().map(Row::new).collect(),
        }
    }

    /// All rows in page order.
    #[must_use]
    pub fn rows(&self) -> &[Row<T>] {
        &self.rows
    }

    /// Number of loaded rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no rows are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flip the row with `id`. Returns `false` if no loaded row has that id.
    pub fn toggle(&mut self, id: &str) -> bool {
        match self.rows.iter_mut().find(|row| row.record.record_id() == id) {
            Some(row) => {
                row.selected = !row.selected;
                true
            }
            None => false,
        }
    }

    /// Set every row to the opposite of [`Self::all_selected`].
    pub fn toggle_all(&mut self) {
        let selected = !self.all_selected();
        for row in &mut self.rows {
            row.selected = selected;
        }
    }

    /// Whether any row is selected.
    #[must_use]
    pub fn any_selected(&self) -> bool {
        self.rows.iter().any(|row| row.selected)
    }

    /// Whether every loaded row is selected. False when nothing is loaded.
    #[must_use]
    pub fn all_selected(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|row| row.selected)
    }

    /// Selected records in page order.
    pub fn selected(&self) -> impl Iterator<Item = &T> {
        self.rows
            .iter()
            .filter(|row| row.selected)
            .map(|row| &row.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Item(String);

    impl Record for Item {
        fn record_id(&self) -> &str {
            &self.0
        }
    }

    fn rows(ids: &[&str]) -> SelectableRows<Item> {
        SelectableRows::from_records(ids.iter().map(|id| Item((*id).to_string())).collect())
    }

    #[test]
    fn test_toggle_single_row() {
        let mut rows = rows(&["a", "b", "c"]);
        assert!(rows.toggle("b"));
        assert!(rows.any_selected());
        assert!(!rows.all_selected());
        assert_eq!(rows.selected().map(|i| i.0.as_str()).collect::<Vec<_>>(), vec!["b"]);
        assert!(!rows.toggle("zzz"));
    }

    #[test]
    fn test_toggle_all_from_partial_selects_everything() {
        let mut rows = rows(&["a", "b", "c"]);
        rows.toggle("a");
        rows.toggle_all();
        assert!(rows.all_selected());
        rows.toggle_all();
        assert!(!rows.any_selected());
    }

    #[test]
    fn test_toggle_all_twice_restores_uniform_state() {
        let mut rows = rows(&["a", "b"]);
        let before = rows.clone();
        rows.toggle_all();
        rows.toggle_all();
        assert_eq!(rows, before);

        rows.toggle_all();
        let all = rows.clone();
        rows.toggle_all();
        rows.toggle_all();
        assert_eq!(rows, all);
    }

    #[test]
    fn test_empty_is_not_all_selected() {
        let mut rows = rows(&[]);
        assert!(!rows.all_selected());
        rows.toggle_all();
        assert!(!rows.any_selected());
    }
}
