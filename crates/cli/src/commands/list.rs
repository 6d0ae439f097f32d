//! Orders and customers listing and export.
//!
//! # Usage
//!
//! ```bash
//! ca-cli orders list --page 3 --fulfillment pending
//! ca-cli orders export --from 2024-01-01 --to 2024-03-31 -o q1.csv
//! ca-cli orders export --select ord_1,ord_7 --page 2
//! ca-cli customers export --search @example.com
//! ```

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use commerce_admin::commerce::CommerceClient;
use commerce_admin::config::AdminConfig;
use commerce_admin::listing::{
    CellMode, ControllerOptions, CountryScope, CustomerListing, FilterToggle, ListController,
    Listing, MemoryNavigator, OrderListing, OrderQueryState, SearchScope, Sort, SortDirection,
};
use commerce_admin::preferences::FilePreferenceStore;
use commerce_admin_core::{FulfillmentState, PaymentState};

use super::output::{open_output, write_csv, write_table};
use super::{CliError, CustomersAction, OrderQueryArgs, OrdersAction, connect};

type Controller<L> = ListController<L, CommerceClient, MemoryNavigator, Arc<FilePreferenceStore>>;

fn controller<L: Listing>(
    config: &AdminConfig,
    listing: L,
    client: CommerceClient,
    prefs: Arc<FilePreferenceStore>,
    page: u32,
) -> Controller<L> {
    let location = format!("/{}?page={page}", listing.table().table_id);
    ListController::new(
        listing,
        client,
        MemoryNavigator::new(location),
        prefs,
        ControllerOptions {
            max_export_pages: config.export_max_pages,
        },
    )
}

/// Load the current page, turning a recorded error into a failure.
async fn load<L: Listing>(controller: &mut Controller<L>) -> Result<(), CliError> {
    controller.load().await;
    match controller.error() {
        Some(e) => Err(e.clone().into()),
        None => Ok(()),
    }
}

async fn print_page<L: Listing>(controller: &mut Controller<L>) -> Result<(), CliError> {
    load(controller).await?;

    let columns = controller.enabled_columns();
    let headers: Vec<String> = columns.iter().map(|c| c.title.clone()).collect();
    let rows: Vec<Vec<String>> = controller
        .rows()
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    controller
                        .listing()
                        .render_cell(&row.record, column, CellMode::Display)
                })
                .collect()
        })
        .collect();

    let mut out = io::stdout().lock();
    write_table(&mut out, &headers, &rows)?;

    if let Some(summary) = controller.page_summary() {
        let pages = controller
            .page_numbers()
            .iter()
            .map(|&n| {
                if n == summary.current {
                    format!("[{n}]")
                } else {
                    n.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "\n{summary}\nPages: {pages}")?;
    }
    Ok(())
}

async fn export<L: Listing>(
    controller: &mut Controller<L>,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let rows = controller.export_all().await?;
    let headers = controller.export_headers();
    write_csv(open_output(output)?, &headers, &rows)?;
    tracing::info!(count = rows.len(), "Exported rows");
    Ok(())
}

/// Load a page and select `ids` on it. Unknown IDs are skipped with a warning.
async fn select_on_page<L: Listing>(
    controller: &mut Controller<L>,
    ids: &[String],
) -> Result<(), CliError> {
    load(controller).await?;
    for id in ids {
        if !controller.toggle_selection(id) {
            tracing::warn!(id = %id, page = controller.page(), "Not on this page; skipped");
        }
    }
    Ok(())
}

// =============================================================================
// Orders
// =============================================================================

fn parse_day(value: &str, end_of_day: bool) -> Result<i64, CliError> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| CliError::InvalidArgument(format!("date '{value}': {e}")))?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc().timestamp())
        .ok_or_else(|| CliError::InvalidArgument(format!("date '{value}'")))
}

fn parse_country(value: &str) -> CountryScope {
    match value {
        "eu" => CountryScope::Eu,
        "outside-eu" | "outside_eu" => CountryScope::OutsideEu,
        codes => CountryScope::Custom(
            codes
                .split(',')
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty())
                .collect(),
        ),
    }
}

/// Turn command line options into order query state. Each filter that is
/// given is also switched on.
fn order_state(args: &OrderQueryArgs) -> Result<OrderQueryState, CliError> {
    let mut state = OrderQueryState::default();
    state.filters.from = args.from.as_deref().map(|d| parse_day(d, false)).transpose()?;
    state.filters.to = args.to.as_deref().map(|d| parse_day(d, true)).transpose()?;
    state.filters.payment_state = args
        .payment
        .as_deref()
        .map(str::parse::<PaymentState>)
        .transpose()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    state.filters.fulfillment_state = args
        .fulfillment
        .as_deref()
        .map(str::parse::<FulfillmentState>)
        .transpose()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    state.filters.item_type.clone_from(&args.item_type);

    let toggles = [
        (FilterToggle::Date, args.from.is_some() || args.to.is_some()),
        (FilterToggle::Payment, args.payment.is_some()),
        (FilterToggle::Fulfillment, args.fulfillment.is_some()),
        (FilterToggle::ItemType, args.item_type.is_some()),
        (FilterToggle::Country, args.country.is_some()),
        (FilterToggle::Tax, args.tax),
    ];
    for (toggle, enabled) in toggles {
        state.toggles.set(toggle, enabled);
    }
    state.set_country_scope(args.country.as_deref().map(parse_country));

    if let Some(field) = &args.sort {
        state.sort = Sort {
            field: field.clone(),
            direction: if args.desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        };
    }
    state.search.clone_from(&args.search);
    Ok(state)
}

/// Search scope to apply. `--item-type` alone selects the `item_type` scope,
/// since the email scope never sends that filter.
fn effective_scope(args: &OrderQueryArgs) -> Option<&str> {
    match (&args.scope, &args.item_type, &args.search) {
        (None, Some(_), None) => Some("item_type"),
        (scope, _, _) => scope.as_deref(),
    }
}

/// Whether an enabled item type filter is dropped by the email scope.
fn item_type_ignored(state: &OrderQueryState) -> bool {
    state.toggles.is_enabled(FilterToggle::ItemType) && state.search_scope == SearchScope::Email
}

async fn order_controller(
    config: &AdminConfig,
    args: &OrderQueryArgs,
    page: u32,
) -> Result<Controller<OrderListing>, CliError> {
    let state = order_state(args)?;
    let (client, prefs) = connect(config).await?;
    let mut controller = controller(config, OrderListing::new(), client, prefs, page);

    if let Some(scope) = effective_scope(args)
        && !controller.set_search_scope(scope)
    {
        let message = controller
            .snapshot()
            .error_message()
            .unwrap_or_else(|| scope.to_owned());
        return Err(CliError::InvalidArgument(message));
    }
    controller.update_state(|current| {
        *current = OrderQueryState {
            search_scope: current.search_scope,
            ..state
        };
    });
    if item_type_ignored(controller.state()) {
        tracing::warn!("--item-type is ignored while the search scope is email; use --scope item_type");
    }
    Ok(controller)
}

/// Run an `orders` subcommand.
pub async fn orders(config: &AdminConfig, action: OrdersAction) -> Result<(), CliError> {
    match action {
        OrdersAction::List { page, query } => {
            let mut controller = order_controller(config, &query, page).await?;
            if controller.active_filter_count() > 0 {
                tracing::info!(filters = controller.active_filter_count(), "Filters active");
            }
            print_page(&mut controller).await
        }
        OrdersAction::Export {
            query,
            select,
            page,
            output,
        } => {
            let mut controller = order_controller(config, &query, page).await?;
            if !select.is_empty() {
                select_on_page(&mut controller, &select).await?;
            }
            export(&mut controller, output.as_deref()).await
        }
        OrdersAction::Receipts {
            select,
            page,
            template,
            output,
        } => {
            let mut controller = order_controller(config, &OrderQueryArgs::default(), page).await?;
            if select.is_empty() {
                load(&mut controller).await?;
                controller.toggle_all_selection();
            } else {
                select_on_page(&mut controller, &select).await?;
            }

            let html = controller.selected_receipts(template.as_deref()).await?;
            let mut out = open_output(output.as_deref())?;
            out.write_all(html.as_bytes())?;
            out.flush()?;
            Ok(())
        }
    }
}

// =============================================================================
// Customers
// =============================================================================

/// Run a `customers` subcommand.
pub async fn customers(config: &AdminConfig, action: CustomersAction) -> Result<(), CliError> {
    let (client, prefs) = connect(config).await?;

    match action {
        CustomersAction::List { page, search } => {
            let mut controller = controller(config, CustomerListing::new(), client, prefs, page);
            controller.update_state(|state| state.search = search);
            print_page(&mut controller).await
        }
        CustomersAction::Export { search, output } => {
            let mut controller = controller(config, CustomerListing::new(), client, prefs, 1);
            controller.update_state(|state| state.search = search);
            export(&mut controller, output.as_deref()).await
        }
    }
}
