//! CLI command implementations and their shared plumbing.

pub mod columns;
pub mod list;
pub mod login;
pub mod order;
pub mod output;
pub mod report;

use std::sync::Arc;

use clap::{Args, Subcommand, ValueEnum};
use commerce_admin::commerce::{CommerceClient, CommerceError};
use commerce_admin::config::AdminConfig;
use commerce_admin::error::ListError;
use commerce_admin::identity::{IdentityClient, IdentityError, IdentityToken};
use commerce_admin::preferences::{FilePreferenceStore, PreferenceError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Commerce backend call failed.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// List load or export failed.
    #[error(transparent)]
    List(#[from] ListError),

    /// Preference file could not be read or written.
    #[error(transparent)]
    Preferences(#[from] PreferenceError),

    /// Login or token refresh failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// CSV output failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Argument could not be interpreted.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Command needs the identity service but none is configured.
    #[error("IDENTITY_URL is not set")]
    IdentityNotConfigured,
}

// =============================================================================
// Arguments
// =============================================================================

/// Log in.
#[derive(Args)]
pub struct LoginArgs {
    /// Operator email
    #[arg(short, long)]
    pub email: String,
}

/// Filter, sort and search options for the orders list.
#[derive(Args, Debug, Default)]
pub struct OrderQueryArgs {
    /// Free-text search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Field the search applies to (`email`, `item_type`); defaults to email,
    /// or to `item_type` when only `--item-type` is given
    #[arg(long)]
    pub scope: Option<String>,

    /// Sort field
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Placed on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Placed on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Payment state (`pending`, `paid`, `failed`)
    #[arg(long)]
    pub payment: Option<String>,

    /// Fulfillment state (`pending`, `shipped`, `failed`)
    #[arg(long)]
    pub fulfillment: Option<String>,

    /// Line item type (not sent while searching by email)
    #[arg(long)]
    pub item_type: Option<String>,

    /// Billing country: `eu`, `outside-eu` or a comma-separated list of codes
    #[arg(long)]
    pub country: Option<String>,

    /// Only orders that charged tax
    #[arg(long)]
    pub tax: bool,
}

/// Orders subcommands.
#[derive(Subcommand)]
pub enum OrdersAction {
    /// Show one page of orders
    List {
        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[command(flatten)]
        query: OrderQueryArgs,
    },
    /// Export orders as CSV
    Export {
        #[command(flatten)]
        query: OrderQueryArgs,

        /// Export only these order IDs from the given page
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,

        /// Page the selection is made on
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Print receipts for paid orders on a page
    Receipts {
        /// Order IDs to print; all on the page if omitted
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,

        /// Page the selection is made on
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Receipt template name
        #[arg(long)]
        template: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

/// Customers subcommands.
#[derive(Subcommand)]
pub enum CustomersAction {
    /// Show one page of customers
    List {
        /// Page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Email search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Export customers as CSV
    Export {
        /// Email search
        #[arg(short, long)]
        search: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
}

/// Tables with persisted columns.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableName {
    /// Orders list
    Orders,
    /// Customers list
    Customers,
}

/// Columns subcommands.
#[derive(Subcommand)]
pub enum ColumnsAction {
    /// Show every column and whether it is enabled
    Show {
        /// Table
        table: TableName,
    },
    /// Flip a column on or off
    Toggle {
        /// Table
        table: TableName,
        /// Column title
        title: String,
    },
}

/// Address kinds.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressArg {
    /// Billing address
    Billing,
    /// Shipping address
    Shipping,
}

/// Address fields accepted on the command line.
#[derive(Args, Debug)]
pub struct AddressFields {
    /// Full name
    #[arg(long)]
    pub name: Option<String>,
    /// Company
    #[arg(long)]
    pub company: Option<String>,
    /// First address line
    #[arg(long)]
    pub address1: Option<String>,
    /// Second address line
    #[arg(long)]
    pub address2: Option<String>,
    /// City
    #[arg(long)]
    pub city: Option<String>,
    /// Postal code
    #[arg(long)]
    pub zip: Option<String>,
    /// State or province
    #[arg(long)]
    pub state: Option<String>,
    /// Country code
    #[arg(long)]
    pub country: Option<String>,
}

/// Single order subcommands.
#[derive(Subcommand)]
pub enum OrderAction {
    /// Show an order and its customer
    Show {
        /// Order ID
        id: String,
    },
    /// Flip an order between pending and shipped
    Ship {
        /// Order ID
        id: String,
    },
    /// Replace an order's address
    Address {
        /// Order ID
        id: String,
        /// Which address
        #[arg(value_enum)]
        kind: AddressArg,
        #[command(flatten)]
        fields: AddressFields,
    },
}

/// Report window.
#[derive(Args, Debug, Default)]
pub struct RangeArgs {
    /// The last seven days
    #[arg(long, conflicts_with_all = ["last_30_days", "month"])]
    pub last_week: bool,
    /// The last thirty days (default)
    #[arg(long, conflicts_with = "month")]
    pub last_30_days: bool,
    /// A calendar month (YYYY-MM)
    #[arg(long)]
    pub month: Option<String>,
}

/// Report subcommands.
#[derive(Subcommand)]
pub enum ReportAction {
    /// Totals per currency
    Sales(RangeArgs),
    /// Totals per product
    Products(RangeArgs),
}

// =============================================================================
// Session
// =============================================================================

/// Open the preference file and build an authenticated client.
///
/// A configured `COMMERCE_ACCESS_TOKEN` wins; otherwise the stored login
/// session is used, refreshed first when it has expired.
pub async fn connect(
    config: &AdminConfig,
) -> Result<(CommerceClient, Arc<FilePreferenceStore>), CliError> {
    let prefs = Arc::new(FilePreferenceStore::open(&config.preferences_path)?);
    let client = CommerceClient::new(&config.commerce)?;

    if client.has_token().await {
        return Ok((client, prefs));
    }

    match IdentityToken::load(prefs.as_ref())? {
        Some(token) if token.is_expired() => {
            let refreshed = refresh_session(config, &token).await?;
            refreshed.save(prefs.as_ref())?;
            client.set_token(refreshed.access_token).await;
        }
        Some(token) => client.set_token(token.access_token).await,
        None => tracing::warn!("No access token configured and no stored session; run `ca-cli login`"),
    }

    Ok((client, prefs))
}

async fn refresh_session(
    config: &AdminConfig,
    token: &IdentityToken,
) -> Result<IdentityToken, CliError> {
    let identity = config.identity().ok_or(CliError::IdentityNotConfigured)?;
    let refresh_token = token.refresh_token.as_ref().ok_or_else(|| {
        IdentityError::AuthenticationFailed("session expired; run `ca-cli login`".to_string())
    })?;

    tracing::info!("Refreshing expired session");
    Ok(IdentityClient::new(identity)?.refresh(refresh_token).await?)
}
