//! Sales and product reports, written as CSV.
//!
//! # Usage
//!
//! ```bash
//! ca-cli report sales --last-week
//! ca-cli report products --month 2024-11
//! ```

use std::io::{self, Write};

use chrono::Utc;
use commerce_admin::commerce::{ProductRow, ReportRange, SalesRow};
use commerce_admin::config::AdminConfig;
use commerce_admin::reports::{RangePreset, product_report, sales_report};
use commerce_admin_core::Money;

use super::{CliError, RangeArgs, ReportAction, connect};

fn parse_month(value: &str) -> Result<RangePreset, CliError> {
    let invalid = || CliError::InvalidArgument(format!("month '{value}', expected YYYY-MM"));
    let (year, month) = value.split_once('-').ok_or_else(invalid)?;
    Ok(RangePreset::Month {
        year: year.parse().map_err(|_| invalid())?,
        month: month.parse().map_err(|_| invalid())?,
    })
}

fn preset(args: &RangeArgs) -> Result<RangePreset, CliError> {
    if let Some(month) = &args.month {
        return parse_month(month);
    }
    Ok(if args.last_week {
        RangePreset::LastWeek
    } else {
        RangePreset::Last30Days
    })
}

fn range(args: &RangeArgs) -> Result<ReportRange, CliError> {
    let preset = preset(args)?;
    preset
        .range(Utc::now())
        .ok_or_else(|| CliError::InvalidArgument(format!("no such month: {preset:?}")))
}

fn write_sales<W: Write>(writer: W, rows: &[SalesRow]) -> Result<(), CliError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Currency", "Orders", "Subtotal", "Taxes", "Total"])?;
    for row in rows {
        let money = |amount| Money::new(amount, row.currency.clone()).display();
        wtr.write_record([
            row.currency.code().to_owned(),
            row.count.to_string(),
            money(row.subtotal),
            money(row.taxes),
            money(row.total),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_products<W: Write>(writer: W, rows: &[ProductRow]) -> Result<(), CliError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["SKU", "Path", "Quantity", "Total"])?;
    for row in rows {
        wtr.write_record([
            row.sku.clone(),
            row.path.clone().unwrap_or_default(),
            row.quantity.to_string(),
            row.total_money().display(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Run a `report` subcommand.
pub async fn run(config: &AdminConfig, action: ReportAction) -> Result<(), CliError> {
    let (client, _) = connect(config).await?;

    match action {
        ReportAction::Sales(args) => {
            let rows = sales_report(&client, range(&args)?).await?;
            write_sales(io::stdout(), &rows)
        }
        ReportAction::Products(args) => {
            let rows = product_report(&client, range(&args)?).await?;
            write_products(io::stdout(), &rows)
        }
    }
}
