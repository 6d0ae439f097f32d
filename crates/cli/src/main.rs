//! Commerce Admin CLI - list, export and edit commerce records.
//!
//! # Usage
//!
//! ```bash
//! # Log in against the identity service (stores the session)
//! ca-cli login -e ops@example.com
//!
//! # Page 2 of paid orders, newest first
//! ca-cli orders list --page 2 --payment paid --sort created_at --desc
//!
//! # Export every EU order with taxes to CSV
//! ca-cli orders export --country eu --tax -o orders.csv
//!
//! # Show or toggle table columns
//! ca-cli columns show orders
//! ca-cli columns toggle orders "Billing Address"
//!
//! # Order detail and edits
//! ca-cli order show ord_123
//! ca-cli order ship ord_123
//!
//! # Reports
//! ca-cli report sales --last-30-days
//! ```
//!
//! # Commands
//!
//! - `login` - Authenticate and persist the session
//! - `orders` / `customers` - List one page or export every page as CSV
//! - `columns` - Show or toggle persisted column visibility
//! - `order` - Show, ship or re-address a single order
//! - `report` - Sales and product reports

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use commerce_admin::config::{AdminConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{
    ColumnsAction, CustomersAction, LoginArgs, OrderAction, OrdersAction, ReportAction,
};

#[derive(Parser)]
#[command(name = "ca-cli")]
#[command(author, version, about = "Commerce admin command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in against the identity service
    Login(LoginArgs),
    /// List or export orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// List or export customers
    Customers {
        #[command(subcommand)]
        action: CustomersAction,
    },
    /// Show or toggle table columns
    Columns {
        #[command(subcommand)]
        action: ColumnsAction,
    },
    /// Work with a single order
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
    /// Sales and product reports
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AdminConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(LogFormat::Text);
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.log_format);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Defaults to info level for our crates if `RUST_LOG` is not set. Logs go to
/// stderr so CSV on stdout stays clean.
fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "commerce_admin=info,commerce_admin_cli=info".into());

    let json = format == LogFormat::Json;
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer =
        (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli, config: AdminConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Login(args) => commands::login::login(&config, args).await?,
        Commands::Orders { action } => commands::list::orders(&config, action).await?,
        Commands::Customers { action } => commands::list::customers(&config, action).await?,
        Commands::Columns { action } => commands::columns::run(&config, action)?,
        Commands::Order { action } => commands::order::run(&config, action).await?,
        Commands::Report { action } => commands::report::run(&config, action).await?,
    }
    Ok(())
}
