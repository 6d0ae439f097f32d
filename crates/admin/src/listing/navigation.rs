//! Location access and row activation.

use std::sync::Mutex;

/// Read and replace the current location (path and query).
pub trait Navigator: Send + Sync {
    /// Current location, e.g. `/orders?page=2`.
    fn current_location(&self) -> String;

    /// Replace the current location without reloading.
    fn navigate(&self, location: &str);
}

/// Navigator that keeps the location in memory and records every navigation.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    state: Mutex<NavigatorState>,
}

#[derive(Debug, Default)]
struct NavigatorState {
    location: String,
    history: Vec<String>,
}

impl MemoryNavigator {
    /// Start at `location`.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(NavigatorState {
                location: location.into(),
                history: Vec::new(),
            }),
        }
    }

    /// Locations navigated to, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.history.clone())
            .unwrap_or_default()
    }
}

impl Navigator for MemoryNavigator {
    fn current_location(&self) -> String {
        self.state
            .lock()
            .map(|state| state.location.clone())
            .unwrap_or_default()
    }

    fn navigate(&self, location: &str) {
        if let Ok(mut state) = self.state.lock() {
            location.clone_into(&mut state.location);
            state.history.push(location.to_owned());
        }
    }
}

/// A click on a list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowClick {
    /// Record id.
    pub id: String,
    /// Whether a new-tab modifier (Ctrl/Cmd) was held.
    pub modifier: bool,
}

impl RowClick {
    /// Plain click.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            modifier: false,
        }
    }

    /// Click with the new-tab modifier held.
    #[must_use]
    pub const fn with_modifier(mut self) -> Self {
        self.modifier = true;
        self
    }
}

/// What activating a row should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    /// Open the detail page in a new tab.
    OpenInNewTab(String),
    /// Navigate to the detail page.
    Navigate(String),
}

impl RowAction {
    /// Detail page path.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::OpenInNewTab(path) | Self::Navigate(path) => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_navigator_records_history() {
        let nav = MemoryNavigator::new("/orders?page=3");
        assert_eq!(nav.current_location(), "/orders?page=3");
        nav.navigate("/orders?page=1");
        assert_eq!(nav.current_location(), "/orders?page=1");
        assert_eq!(nav.history(), vec!["/orders?page=1".to_string()]);
    }

    #[test]
    fn test_row_click_modifier() {
        let click = RowClick::new("ord_1").with_modifier();
        assert!(click.modifier);
        assert!(!RowClick::new("ord_1").modifier);
    }
}
