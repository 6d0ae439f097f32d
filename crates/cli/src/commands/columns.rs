//! Persisted column visibility.
//!
//! # Usage
//!
//! ```bash
//! ca-cli columns show orders
//! ca-cli columns toggle orders "Billing Address"
//! ```

use std::io::{self, Write};

use commerce_admin::components::{DataTableConfig, customers_table_config, orders_table_config};
use commerce_admin::config::AdminConfig;
use commerce_admin::listing::ColumnVisibility;
use commerce_admin::preferences::{FilePreferenceStore, PreferenceStore};

use super::{CliError, ColumnsAction, TableName};

fn table(name: TableName) -> DataTableConfig {
    match name {
        TableName::Orders => orders_table_config(),
        TableName::Customers => customers_table_config(),
    }
}

fn show(out: &mut impl Write, table: &DataTableConfig, visibility: &ColumnVisibility) -> io::Result<()> {
    for (title, enabled) in visibility.entries() {
        let mark = if *enabled { "x" } else { " " };
        writeln!(out, "[{mark}] {title}")?;
    }
    writeln!(out, "({} key: {})", table.table_id, table.prefs_key)
}

/// Flip `title` and persist. Unknown titles are an argument error.
fn toggle(
    table: &DataTableConfig,
    store: &impl PreferenceStore,
    title: &str,
) -> Result<ColumnVisibility, CliError> {
    let mut visibility = ColumnVisibility::load(table, store);
    let enabled = visibility
        .toggle(title)
        .ok_or_else(|| CliError::InvalidArgument(format!("no column '{title}' in {}", table.table_id)))?;
    visibility.save(table, store)?;
    tracing::info!(column = title, enabled, "Column toggled");
    Ok(visibility)
}

/// Run a `columns` subcommand.
pub fn run(config: &AdminConfig, action: ColumnsAction) -> Result<(), CliError> {
    let store = FilePreferenceStore::open(&config.preferences_path)?;
    let mut out = io::stdout().lock();

    match action {
        ColumnsAction::Show { table: name } => {
            let table = table(name);
            show(&mut out, &table, &ColumnVisibility::load(&table, &store))?;
        }
        ColumnsAction::Toggle { table: name, title } => {
            let table = table(name);
            let visibility = toggle(&table, &store, &title)?;
            show(&mut out, &table, &visibility)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let table = orders_table_config();

        let store = FilePreferenceStore::open(&path).unwrap();
        toggle(&table, &store, "ID").unwrap();

        let reopened = FilePreferenceStore::open(&path).unwrap();
        assert!(ColumnVisibility::load(&table, &reopened).is_enabled("ID"));
    }

    #[test]
    fn test_toggle_unknown_column() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferenceStore::open(dir.path().join("prefs.json")).unwrap();
        let err = toggle(&customers_table_config(), &store, "Taxes").unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test]
    fn test_show_marks_enabled_columns() {
        let table = customers_table_config();
        let mut out = Vec::new();
        show(&mut out, &table, &ColumnVisibility::defaults(&table)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("[ ] ID\n[x] Name\n"));
    }
}
