//! Output sinks: CSV for exports, aligned text for listings.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use commerce_admin::listing::ExportRow;

use super::CliError;

/// Open `path` for writing, or stdout when no path is given.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, CliError> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// Write a header record and one record per row.
///
/// Rows are written positionally; every row must carry the header's cells in
/// the same order.
pub fn write_csv<W: Write>(writer: W, headers: &[String], rows: &[ExportRow]) -> Result<(), CliError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(headers)?;
    for row in rows {
        wtr.write_record(row.values())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write rows as left-aligned, space-padded columns.
pub fn write_table<W: Write>(
    mut writer: W,
    headers: &[String],
    rows: &[Vec<String>],
) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    writeln!(writer, "{}", line(headers))?;
    for row in rows {
        writeln!(writer, "{}", line(row))?;
    }
    writer.flush()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> ExportRow {
        let mut row = ExportRow::default();
        for (header, value) in cells {
            row.push(*header, *value);
        }
        row
    }

    #[test]
    fn test_csv_quotes_and_orders_cells() {
        let headers = vec!["Email".to_string(), "Items".to_string()];
        let rows = vec![
            row(&[("Email", "ada@example.com"), ("Items", "2 x Notes, 1 x Poster")]),
            row(&[("Email", "grace@example.com"), ("Items", "")]),
        ];

        let mut out = Vec::new();
        write_csv(&mut out, &headers, &rows).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Email,Items\nada@example.com,\"2 x Notes, 1 x Poster\"\ngrace@example.com,\n"
        );
    }

    #[test]
    fn test_table_pads_columns() {
        let headers = vec!["ID".to_string(), "Email".to_string()];
        let rows = vec![vec!["ord_10".to_string(), "a@x".to_string()]];

        let mut out = Vec::new();
        write_table(&mut out, &headers, &rows).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ID      Email\nord_10  a@x\n");
    }
}
