//! The list controller.
//!
//! Owns filter, sort, search and page state for one list screen, turns it into
//! a backend query, fetches one page at a time, overlays row selection and
//! walks every page for exports.
//!
//! Loads are sequence-numbered: [`ListController::begin_load`] issues a ticket
//! and [`ListController::finish_load`] drops any completion whose ticket is no
//! longer the latest, so only the most recently requested page is shown.

use commerce_admin_core::PaymentState;
use futures::future::try_join_all;
use tracing::instrument;

use crate::commerce::{CommerceApi, CommerceError, ListQuery, Page, Pagination};
use crate::components::TableColumn;
use crate::error::ListError;
use crate::preferences::PreferenceStore;

use super::columns::ColumnVisibility;
use super::export::{DEFAULT_MAX_EXPORT_PAGES, ExportRow, export_headers, flatten_record, walk_pages};
use super::navigation::{Navigator, RowAction, RowClick};
use super::pagination::{PER_PAGE, PageSummary, initial_page, location_with_page, page_numbers};
use super::query::{CountryScope, FilterToggle, SearchScope};
use super::resource::{CellMode, Listing, OrderListing};
use super::selection::{Row, SelectableRows};

/// Separator placed between receipts when several are opened together.
pub const RECEIPT_SEPARATOR: &str = "<div class='page-break'></div>";

/// Controller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Cap on pages fetched by one export.
    pub max_export_pages: u32,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            max_export_pages: DEFAULT_MAX_EXPORT_PAGES,
        }
    }
}

/// An issued page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    page: u32,
    query: ListQuery,
}

impl LoadTicket {
    /// Request sequence number.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    /// Requested page.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Query to send.
    #[must_use]
    pub const fn query(&self) -> &ListQuery {
        &self.query
    }
}

/// What [`ListController::finish_load`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Rows and pagination replaced.
    Applied,
    /// Error recorded; previous rows kept.
    Failed,
    /// A newer request was issued; completion ignored.
    Stale,
    /// The requested page is past the last page; the caller should go to
    /// page 1. Nothing was applied.
    PageOutOfRange,
}

/// Read-only view of controller state.
pub struct ListSnapshot<'a, L: Listing> {
    /// A page fetch is in flight.
    pub loading: bool,
    /// Last error, cleared by the next successful fetch.
    pub error: Option<&'a ListError>,
    /// Loaded rows with their selection flags.
    pub rows: &'a [Row<L::Record>],
    /// Pagination of the loaded page.
    pub pagination: Option<&'a Pagination>,
    /// Filter, sort and search state.
    pub state: &'a L::State,
    /// Current page.
    pub page: u32,
    /// Column visibility.
    pub columns: &'a ColumnVisibility,
    /// Any row selected.
    pub any_selected: bool,
    /// Every loaded row selected.
    pub all_selected: bool,
}

impl<L: Listing> ListSnapshot<'_, L> {
    /// Error as a display string.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.map(ToString::to_string)
    }
}

/// List controller for one resource.
pub struct ListController<L: Listing, C, N, P> {
    listing: L,
    api: C,
    navigator: N,
    prefs: P,
    options: ControllerOptions,
    state: L::State,
    page: u32,
    columns: ColumnVisibility,
    rows: SelectableRows<L::Record>,
    pagination: Option<Pagination>,
    loading: bool,
    error: Option<ListError>,
    issued: u64,
}

impl<L, C, N, P> ListController<L, C, N, P>
where
    L: Listing,
    C: CommerceApi,
    N: Navigator,
    P: PreferenceStore,
{
    /// Create a controller. The page comes from the navigator's location and
    /// column visibility from the preference store. Nothing is fetched.
    pub fn new(listing: L, api: C, navigator: N, prefs: P, options: ControllerOptions) -> Self {
        let page = initial_page(&navigator.current_location());
        let columns = ColumnVisibility::load(listing.table(), &prefs);

        Self {
            listing,
            api,
            navigator,
            prefs,
            options,
            state: L::State::default(),
            page,
            columns,
            rows: SelectableRows::default(),
            pagination: None,
            loading: false,
            error: None,
            issued: 0,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Read-only view of the controller.
    #[must_use]
    pub fn snapshot(&self) -> ListSnapshot<'_, L> {
        ListSnapshot {
            loading: self.loading,
            error: self.error.as_ref(),
            rows: self.rows.rows(),
            pagination: self.pagination.as_ref(),
            state: &self.state,
            page: self.page,
            columns: &self.columns,
            any_selected: self.rows.any_selected(),
            all_selected: self.rows.all_selected(),
        }
    }

    /// Listed resource.
    pub const fn listing(&self) -> &L {
        &self.listing
    }

    /// Commerce API.
    pub const fn api(&self) -> &C {
        &self.api
    }

    /// Navigator.
    pub const fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Filter, sort and search state.
    pub const fn state(&self) -> &L::State {
        &self.state
    }

    /// Current page.
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Loaded rows.
    pub fn rows(&self) -> &[Row<L::Record>] {
        self.rows.rows()
    }

    /// Pagination of the loaded page.
    pub const fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    /// Last recorded error.
    pub const fn error(&self) -> Option<&ListError> {
        self.error.as_ref()
    }

    /// Whether a fetch is in flight.
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Column visibility.
    pub const fn columns(&self) -> &ColumnVisibility {
        &self.columns
    }

    /// Enabled columns in display order.
    pub fn enabled_columns(&self) -> Vec<&TableColumn> {
        self.columns.enabled_columns(self.listing.table()).collect()
    }

    /// Page numbers to offer, from the loaded pagination.
    pub fn page_numbers(&self) -> Vec<u32> {
        self.pagination
            .as_ref()
            .map(|p| page_numbers(p.current, p.last))
            .unwrap_or_default()
    }

    /// "Showing X–Y of Z" for the loaded page.
    pub fn page_summary(&self) -> Option<PageSummary> {
        self.pagination.as_ref().map(|p| PageSummary::new(p, PER_PAGE))
    }

    /// Query the current state would send.
    pub fn current_query(&self) -> ListQuery {
        self.listing.build_query(&self.state, self.page)
    }

    // =========================================================================
    // State Changes
    // =========================================================================

    /// Change filter state. Takes effect on the next load.
    pub fn update_state(&mut self, update: impl FnOnce(&mut L::State)) {
        update(&mut self.state);
    }

    /// Set the free-text search and reload.
    pub async fn search(&mut self, text: Option<String>) {
        let text = text.filter(|t| !t.trim().is_empty());
        self.listing.set_search(&mut self.state, text);
        self.load().await;
    }

    /// Flip a column and persist the new visibility. Returns the column's new
    /// state, or `None` if the table has no such column.
    pub fn toggle_column(&mut self, title: &str) -> Option<bool> {
        let enabled = self.columns.toggle(title)?;
        if let Err(e) = self.columns.save(self.listing.table(), &self.prefs) {
            tracing::warn!(error = %e, column = title, "Failed to persist column preferences");
        }
        Some(enabled)
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Flip one row's selection. Returns `false` if no loaded row has `id`.
    pub fn toggle_selection(&mut self, id: &str) -> bool {
        self.rows.toggle(id)
    }

    /// Set every row to the opposite of the current all-selected state.
    pub fn toggle_all_selection(&mut self) {
        self.rows.toggle_all();
    }

    /// Any row selected.
    pub fn any_selected(&self) -> bool {
        self.rows.any_selected()
    }

    /// Every loaded row selected.
    pub fn all_selected(&self) -> bool {
        self.rows.all_selected()
    }

    /// Selected records in page order.
    pub fn selected(&self) -> Vec<&L::Record> {
        self.rows.selected().collect()
    }

    /// What a click on a row should do.
    pub fn row_action(&self, click: &RowClick) -> RowAction {
        let path = self.listing.table().record_path(&click.id);
        if click.modifier {
            RowAction::OpenInNewTab(path)
        } else {
            RowAction::Navigate(path)
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Issue a request for the current page: marks the controller loading and
    /// supersedes any request still in flight.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        self.loading = true;
        LoadTicket {
            seq: self.issued,
            page: self.page,
            query: self.current_query(),
        }
    }

    /// Apply a completed request.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Page<L::Record>, CommerceError>,
    ) -> LoadOutcome {
        if ticket.seq != self.issued {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.issued,
                "Discarding stale list response"
            );
            return LoadOutcome::Stale;
        }
        self.loading = false;

        match result {
            Ok(page) => {
                if page.pagination.last < ticket.page && ticket.page != 1 {
                    tracing::info!(
                        page = ticket.page,
                        last = page.pagination.last,
                        "Page past the end of results"
                    );
                    return LoadOutcome::PageOutOfRange;
                }
                self.rows = SelectableRows::from_records(page.records);
                self.pagination = Some(page.pagination);
                self.error = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!(error = %e, page = ticket.page, "Failed to load list");
                self.error = Some(e.into());
                LoadOutcome::Failed
            }
        }
    }

    async fn fetch_ticket(&mut self) -> LoadOutcome {
        let ticket = self.begin_load();
        let result = self.listing.fetch(&self.api, ticket.query()).await;
        self.finish_load(ticket, result)
    }

    /// Fetch the current page.
    ///
    /// Never fails: errors are recorded in state. When the page lies past
    /// the last page, navigates to page 1 and fetches once more.
    #[instrument(skip_all, fields(table = %self.listing.table().table_id, page = self.page))]
    pub async fn load(&mut self) {
        if self.fetch_ticket().await == LoadOutcome::PageOutOfRange {
            self.set_page(1);
            self.fetch_ticket().await;
        }
    }

    fn set_page(&mut self, page: u32) {
        let page = page.max(1);
        let location = location_with_page(&self.navigator.current_location(), page);
        self.navigator.navigate(&location);
        self.page = page;
    }

    /// Move to `page`, reflect it in the location and fetch it.
    pub async fn go_to_page(&mut self, page: u32) {
        self.set_page(page);
        self.load().await;
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// CSV headers for the enabled columns.
    pub fn export_headers(&self) -> Vec<String> {
        export_headers(self.columns.enabled_columns(self.listing.table()))
    }

    /// Flatten one record over the enabled columns.
    pub fn flatten(&self, record: &L::Record) -> ExportRow {
        flatten_record(
            record,
            self.columns.enabled_columns(self.listing.table()),
            |r, column| self.listing.format_cell(r, column, CellMode::Csv),
        )
    }

    async fn export_records(&self) -> Result<Vec<L::Record>, ListError> {
        if self.rows.any_selected() {
            return Ok(self.rows.selected().cloned().collect());
        }

        let (listing, api, state) = (&self.listing, &self.api, &self.state);
        walk_pages(self.options.max_export_pages, |page| {
            let query = listing.build_query(state, page);
            async move { listing.fetch(api, &query).await }
        })
        .await
    }

    /// Flattened rows for every record under the current filter, or only the
    /// selected rows when any are selected.
    ///
    /// # Errors
    ///
    /// Returns the fetch or pagination error that ended the walk; it is also
    /// recorded in state. No partial rows are returned.
    #[instrument(skip_all, fields(table = %self.listing.table().table_id))]
    pub async fn export_all(&mut self) -> Result<Vec<ExportRow>, ListError> {
        match self.export_records().await {
            Ok(records) => {
                tracing::info!(count = records.len(), "Export collected");
                Ok(records.iter().map(|r| self.flatten(r)).collect())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Export failed");
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

impl<C, N, P> ListController<OrderListing, C, N, P>
where
    C: CommerceApi,
    N: Navigator,
    P: PreferenceStore,
{
    /// Sort by `field` (flipping direction if already active) and reload.
    pub async fn set_sort(&mut self, field: &str) {
        self.state.sort.toggle(field);
        self.load().await;
    }

    /// Choose the search scope by name. Unknown names are recorded as a query
    /// error and leave the scope unchanged.
    pub fn set_search_scope(&mut self, scope: &str) -> bool {
        match scope.parse::<SearchScope>() {
            Ok(scope) => {
                self.state.search_scope = scope;
                true
            }
            Err(e) => {
                self.error = Some(ListError::Query(e.to_string()));
                false
            }
        }
    }

    /// Enable or disable a filter. Takes effect on the next load.
    pub fn toggle_filter(&mut self, filter: FilterToggle) -> bool {
        let enabled = !self.state.toggles.is_enabled(filter);
        self.state.toggles.set(filter, enabled);
        enabled
    }

    /// Number of enabled filters.
    pub fn active_filter_count(&self) -> usize {
        self.state.toggles.active_count()
    }

    /// Choose a billing country shortcut. Takes effect on the next load.
    pub fn set_country_scope(&mut self, scope: Option<CountryScope>) {
        self.state.set_country_scope(scope);
    }

    /// Restore default filters, disable every filter and reload.
    pub async fn reset_filters(&mut self) {
        self.state.reset_filters();
        self.load().await;
    }

    /// Receipts for the selected paid orders, fetched concurrently and
    /// joined with a page break.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error; it is also recorded in state.
    #[instrument(skip(self))]
    pub async fn selected_receipts(&mut self, template: Option<&str>) -> Result<String, ListError> {
        let ids: Vec<_> = self
            .rows
            .selected()
            .filter(|order| order.payment_state == PaymentState::Paid)
            .map(|order| order.id.clone())
            .collect();

        let api = &self.api;
        let result = try_join_all(ids.iter().map(|id| api.order_receipt(id, template))).await;

        match result {
            Ok(receipts) => Ok(receipts.join(RECEIPT_SEPARATOR)),
            Err(e) => {
                let e = ListError::from(e);
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }
}
