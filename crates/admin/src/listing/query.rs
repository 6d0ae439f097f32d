//! List query state and the pure state-to-query mapping.

use std::fmt;
use std::str::FromStr;

use commerce_admin_core::{FulfillmentState, PaymentState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::commerce::ListQuery;

use super::pagination::PER_PAGE;

/// EU member states (ISO 3166-1 alpha-2).
pub const EU_COUNTRIES: [&str; 27] = [
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT", "LV",
    "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
];

/// EU member states as owned codes.
#[must_use]
pub fn eu_countries() -> Vec<String> {
    EU_COUNTRIES.iter().map(|&c| c.to_owned()).collect()
}

/// Unknown search scope name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Bad search scope: '{0}'")]
pub struct SearchScopeError(pub String);

/// Which field free-text search applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Customer email.
    #[default]
    Email,
    /// Line item type.
    ItemType,
}

impl SearchScope {
    /// Query parameter the scope writes.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::ItemType => "item_type",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchScope {
    type Err = SearchScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Self::Email),
            "item_type" => Ok(Self::ItemType),
            other => Err(SearchScopeError(other.to_owned())),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// The other direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Active sort: exactly one field and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Backend sort key.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: "created_at".to_string(),
            direction: SortDirection::Asc,
        }
    }
}

impl Sort {
    /// Select `field`: flips direction if it is already active, otherwise
    /// makes it active ascending.
    pub fn toggle(&mut self, field: &str) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            field.clone_into(&mut self.field);
            self.direction = SortDirection::Asc;
        }
    }

    /// `"<field> <asc|desc>"`.
    #[must_use]
    pub fn to_param(&self) -> String {
        format!("{} {}", self.field, self.direction.as_str())
    }
}

/// A filter that can be switched on and off independently of its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterToggle {
    /// `from` / `to` date range.
    Date,
    /// `payment_state`.
    Payment,
    /// `fulfillment_state`.
    Fulfillment,
    /// `item_type`.
    ItemType,
    /// `billing_countries` and the outside-EU negation.
    Country,
    /// `tax=true` marker.
    Tax,
}

impl FromStr for FilterToggle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(Self::Date),
            "payment" => Ok(Self::Payment),
            "fulfillment" | "shipping" => Ok(Self::Fulfillment),
            "item_type" | "type" => Ok(Self::ItemType),
            "country" => Ok(Self::Country),
            "tax" => Ok(Self::Tax),
            other => Err(format!("unknown filter '{other}'")),
        }
    }
}

/// Enabling flags for the order filters. All off by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct FilterToggles {
    /// Date range.
    pub date: bool,
    /// Payment state.
    pub payment: bool,
    /// Fulfillment state.
    pub fulfillment: bool,
    /// Item type.
    pub item_type: bool,
    /// Billing countries.
    pub country: bool,
    /// Tax marker.
    pub tax: bool,
}

impl FilterToggles {
    /// Whether a filter is enabled.
    #[must_use]
    pub const fn is_enabled(&self, toggle: FilterToggle) -> bool {
        match toggle {
            FilterToggle::Date => self.date,
            FilterToggle::Payment => self.payment,
            FilterToggle::Fulfillment => self.fulfillment,
            FilterToggle::ItemType => self.item_type,
            FilterToggle::Country => self.country,
            FilterToggle::Tax => self.tax,
        }
    }

    /// Enable or disable a filter.
    pub const fn set(&mut self, toggle: FilterToggle, enabled: bool) {
        let flag = match toggle {
            FilterToggle::Date => &mut self.date,
            FilterToggle::Payment => &mut self.payment,
            FilterToggle::Fulfillment => &mut self.fulfillment,
            FilterToggle::ItemType => &mut self.item_type,
            FilterToggle::Country => &mut self.country,
            FilterToggle::Tax => &mut self.tax,
        };
        *flag = enabled;
    }

    /// Number of enabled filters.
    #[must_use]
    pub fn active_count(&self) -> usize {
        [
            self.date,
            self.payment,
            self.fulfillment,
            self.item_type,
            self.country,
            self.tax,
        ]
        .into_iter()
        .filter(|&on| on)
        .count()
    }
}

/// Billing country shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryScope {
    /// Billing country in the EU.
    Eu,
    /// Billing country outside the EU, sent as a negated EU list.
    OutsideEu,
    /// Billing country in an explicit list.
    Custom(Vec<String>),
}

/// Filter values for the orders list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderFilters {
    /// Range start, epoch seconds.
    pub from: Option<i64>,
    /// Range end, epoch seconds.
    pub to: Option<i64>,
    /// Payment state.
    pub payment_state: Option<PaymentState>,
    /// Fulfillment state.
    pub fulfillment_state: Option<FulfillmentState>,
    /// Line item type.
    pub item_type: Option<String>,
    /// Billing country codes.
    pub billing_countries: Vec<String>,
    /// Customer email.
    pub email: Option<String>,
}

/// Everything the orders query is built from, apart from the page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderQueryState {
    /// Filter values.
    pub filters: OrderFilters,
    /// Filter enabling flags.
    pub toggles: FilterToggles,
    /// Country shortcut, if one is chosen.
    pub country_scope: Option<CountryScope>,
    /// Sort.
    pub sort: Sort,
    /// Search scope.
    pub search_scope: SearchScope,
    /// Search text.
    pub search: Option<String>,
}

impl OrderQueryState {
    /// Choose a country shortcut, updating `billing_countries` to match.
    pub fn set_country_scope(&mut self, scope: Option<CountryScope>) {
        self.filters.billing_countries = match &scope {
            Some(CountryScope::Eu) => eu_countries(),
            Some(CountryScope::Custom(countries)) => countries.clone(),
            Some(CountryScope::OutsideEu) | None => Vec::new(),
        };
        self.country_scope = scope;
    }

    /// Restore default filters and disable every toggle. Sort and search
    /// are left alone.
    pub fn reset_filters(&mut self) {
        self.filters = OrderFilters::default();
        self.toggles = FilterToggles::default();
        self.country_scope = None;
    }
}

/// Search text for the customers list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerQueryState {
    /// Email search.
    pub search: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

/// Build the orders list query for `page`.
#[must_use]
pub fn build_order_query(state: &OrderQueryState, page: u32) -> ListQuery {
    let filters = &state.filters;
    let toggles = &state.toggles;
    let mut query = ListQuery::new();

    query.insert("user_id", "all");
    query.insert("per_page", PER_PAGE);
    query.insert("page", page.max(1));

    if toggles.date {
        query.insert_opt("from", filters.from);
        query.insert_opt("to", filters.to);
    }
    if toggles.payment {
        query.insert_opt("payment_state", filters.payment_state.map(|s| s.as_str()));
    }
    if toggles.fulfillment {
        query.insert_opt(
            "fulfillment_state",
            filters.fulfillment_state.map(|s| s.as_str()),
        );
    }
    if toggles.tax {
        query.insert("tax", true);
    }
    if toggles.country {
        if state.country_scope == Some(CountryScope::OutsideEu) {
            query.negate("billing_countries", eu_countries());
        } else {
            query.insert("billing_countries", filters.billing_countries.clone());
        }
    }

    let search = non_blank(state.search.as_ref());
    match state.search_scope {
        SearchScope::Email => {
            query.insert_opt("email", search.or_else(|| non_blank(filters.email.as_ref())));
        }
        SearchScope::ItemType => {
            let gated = if toggles.item_type {
                non_blank(filters.item_type.as_ref())
            } else {
                None
            };
            query.insert_opt("item_type", search.or(gated));
        }
    }

    query.insert("sort", state.sort.to_param());
    query
}

/// Build the customers list query for `page`.
#[must_use]
pub fn build_customer_query(state: &CustomerQueryState, page: u32) -> ListQuery {
    let mut query = ListQuery::new();
    query.insert("per_page", PER_PAGE);
    query.insert("page", page.max(1));
    query.insert_opt("email", non_blank(state.search.as_ref()));
    query
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commerce::ParamValue;

    fn loaded_state() -> OrderQueryState {
        OrderQueryState {
            filters: OrderFilters {
                from: Some(1_700_000_000),
                to: Some(1_700_086_400),
                payment_state: Some(PaymentState::Paid),
                fulfillment_state: Some(FulfillmentState::Shipped),
                item_type: Some("Book".to_string()),
                billing_countries: vec!["DE".to_string()],
                email: None,
            },
            ..OrderQueryState::default()
        }
    }

    #[test]
    fn test_defaults() {
        let query = build_order_query(&OrderQueryState::default(), 1);
        assert_eq!(
            query.to_pairs(),
            vec![
                ("page".to_string(), "1".to_string()),
                ("per_page".to_string(), "50".to_string()),
                ("sort".to_string(), "created_at asc".to_string()),
                ("user_id".to_string(), "all".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_is_pure() {
        let mut state = loaded_state();
        state.toggles = FilterToggles {
            date: true,
            payment: true,
            fulfillment: true,
            item_type: true,
            country: true,
            tax: true,
        };
        state.search = Some("ada@example.com".to_string());
        assert_eq!(build_order_query(&state, 4), build_order_query(&state, 4));
    }

    #[test]
    fn test_disabled_filters_do_not_leak() {
        let state = loaded_state();
        let query = build_order_query(&state, 1);
        for key in [
            "from",
            "to",
            "payment_state",
            "fulfillment_state",
            "item_type",
            "billing_countries",
            "tax",
        ] {
            assert!(!query.contains_key(key), "{key} leaked");
        }
        assert!(query.negated().is_empty());
    }

    #[test]
    fn test_enabled_filters_are_sent() {
        let mut state = loaded_state();
        state.toggles.set(FilterToggle::Date, true);
        state.toggles.set(FilterToggle::Payment, true);
        state.toggles.set(FilterToggle::Fulfillment, true);
        state.toggles.set(FilterToggle::Tax, true);
        state.toggles.set(FilterToggle::Country, true);

        let query = build_order_query(&state, 1);
        assert_eq!(query.get("from"), Some(&ParamValue::Int(1_700_000_000)));
        assert_eq!(query.get("to"), Some(&ParamValue::Int(1_700_086_400)));
        assert_eq!(query.get("payment_state"), Some(&ParamValue::from("paid")));
        assert_eq!(
            query.get("fulfillment_state"),
            Some(&ParamValue::from("shipped"))
        );
        assert_eq!(query.get("tax"), Some(&ParamValue::Flag(true)));
        assert_eq!(
            query.get("billing_countries"),
            Some(&ParamValue::List(vec!["DE".to_string()]))
        );
    }

    #[test]
    fn test_scope_exclusivity() {
        let mut state = loaded_state();
        state.toggles.item_type = true;
        state.search = Some("ada@example.com".to_string());

        let query = build_order_query(&state, 1);
        assert_eq!(query.get("email"), Some(&ParamValue::from("ada@example.com")));
        assert!(!query.contains_key("item_type"));

        state.search_scope = SearchScope::ItemType;
        state.search = Some("Ebook".to_string());
        let query = build_order_query(&state, 1);
        assert_eq!(query.get("item_type"), Some(&ParamValue::from("Ebook")));
        assert!(!query.contains_key("email"));
    }

    #[test]
    fn test_item_type_scope_falls_back_to_enabled_filter() {
        let mut state = loaded_state();
        state.search_scope = SearchScope::ItemType;
        assert!(!build_order_query(&state, 1).contains_key("item_type"));

        state.toggles.item_type = true;
        assert_eq!(
            build_order_query(&state, 1).get("item_type"),
            Some(&ParamValue::from("Book"))
        );
    }

    #[test]
    fn test_empty_country_list_is_omitted() {
        let mut state = OrderQueryState::default();
        state.toggles.country = true;
        state.set_country_scope(Some(CountryScope::Custom(Vec::new())));
        let query = build_order_query(&state, 1);
        assert!(!query.contains_key("billing_countries"));
        assert!(query.negated().is_empty());
    }

    #[test]
    fn test_outside_eu_is_negated_side_channel() {
        let mut state = OrderQueryState::default();
        state.toggles.country = true;
        state.set_country_scope(Some(CountryScope::OutsideEu));

        let query = build_order_query(&state, 1);
        assert!(!query.contains_key("billing_countries"));
        assert_eq!(query.negated()["billing_countries"].len(), 27);

        state.set_country_scope(Some(CountryScope::Eu));
        let query = build_order_query(&state, 1);
        assert!(query.negated().is_empty());
        assert_eq!(
            query.get("billing_countries"),
            Some(&ParamValue::List(eu_countries()))
        );
    }

    #[test]
    fn test_sort_toggle() {
        let mut sort = Sort::default();
        sort.toggle("created_at");
        assert_eq!(sort.to_param(), "created_at desc");
        sort.toggle("total");
        assert_eq!(sort.to_param(), "total asc");
        sort.toggle("total");
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_search_scope_parse() {
        assert_eq!("item_type".parse::<SearchScope>().unwrap(), SearchScope::ItemType);
        let err = "sku".parse::<SearchScope>().unwrap_err();
        assert_eq!(err.to_string(), "Bad search scope: 'sku'");
    }

    #[test]
    fn test_reset_filters_keeps_sort() {
        let mut state = loaded_state();
        state.toggles.tax = true;
        state.sort.toggle("total");
        state.set_country_scope(Some(CountryScope::Eu));
        state.reset_filters();
        assert_eq!(state.toggles.active_count(), 0);
        assert_eq!(state.filters, OrderFilters::default());
        assert_eq!(state.country_scope, None);
        assert_eq!(state.sort.field, "total");
    }

    #[test]
    fn test_customer_query() {
        let state = CustomerQueryState {
            search: Some("ada".to_string()),
        };
        let query = build_customer_query(&state, 2);
        assert_eq!(query.get("email"), Some(&ParamValue::from("ada")));
        assert_eq!(query.page(), Some(2));
        assert!(!build_customer_query(&CustomerQueryState::default(), 1).contains_key("email"));
    }
}
