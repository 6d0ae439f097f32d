//! Record list screens.
//!
//! A [`ListController`] drives one list: it owns filter, sort, search and
//! page state, builds the backend query, fetches a page at a time, tracks row
//! selection and persisted column visibility, and exports the full result
//! set. What is listed and how its cells render comes from a [`Listing`].
//!
//! # Example
//!
//! ```rust,ignore
//! use commerce_admin::listing::{ControllerOptions, ListController, MemoryNavigator, OrderListing};
//! use commerce_admin::preferences::FilePreferenceStore;
//!
//! let mut orders = ListController::new(
//!     OrderListing::new(),
//!     client,
//!     MemoryNavigator::new("/orders?page=2"),
//!     FilePreferenceStore::open(&config.preferences_path)?,
//!     ControllerOptions::default(),
//! );
//! orders.load().await;
//! let rows = orders.export_all().await?;
//! ```

pub mod columns;
mod controller;
pub mod export;
pub mod navigation;
pub mod pagination;
pub mod query;
pub mod resource;
pub mod selection;

pub use columns::ColumnVisibility;
pub use controller::{
    ControllerOptions, ListController, ListSnapshot, LoadOutcome, LoadTicket, RECEIPT_SEPARATOR,
};
pub use export::{DEFAULT_MAX_EXPORT_PAGES, ExportRow};
pub use navigation::{MemoryNavigator, Navigator, RowAction, RowClick};
pub use pagination::{PER_PAGE, PageSummary};
pub use query::{
    CountryScope, CustomerQueryState, FilterToggle, FilterToggles, OrderFilters, OrderQueryState,
    SearchScope, Sort, SortDirection,
};
pub use resource::{CellMode, CustomerListing, Listing, OrderListing};
pub use selection::{Row, SelectableRows};
