use serde::{Deserialize, Serialize};
use tui_dispatch::DataResource;
use tui_dispatch_debug::debug::{ron_string, DebugSection, DebugState};

use crate::catalog::{CatalogEntry, SortOrder};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
/// Selecting within this many rows of the end asks for the next page.
pub const PREFETCH_THRESHOLD: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    pub page_size: usize,
    pub settle_delay_ms: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

/// Search input mode as the view sees it. The filtering session itself is
/// tracked on `AppState`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub active: bool,
    pub query: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    #[default]
    List,
    Detail,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonStat {
    pub name: String,
    pub value: u16,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PokemonInfo {
    pub id: u32,
    pub name: String,
    pub height: u16,
    pub weight: u16,
    pub types: Vec<String>,
    pub stats: Vec<PokemonStat>,
    pub sprite_url: Option<String>,
}

/// The list controller's state. The reducer is its only writer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppState {
    pub config: ListConfig,
    pub terminal_size: (u16, u16),
    pub screen: Screen,

    /// What the view renders now.
    pub visible: Vec<CatalogEntry>,
    /// Every entry fetched so far; append-only.
    pub full: Vec<CatalogEntry>,
    /// Snapshot of `visible` taken when the search session started.
    pub search_cache: Option<Vec<CatalogEntry>>,
    /// Entries that arrived while a search session was active.
    pub deferred: Vec<CatalogEntry>,
    pub search_session_active: bool,
    pub search: SearchState,
    /// Direction the next sort applies.
    pub sort_order: SortOrder,

    pub is_loading: bool,
    pub last_error: Option<String>,
    pub is_navigating: bool,
    pub end_reached: bool,
    pub pages_loaded: usize,
    /// Raw items consumed from the source, including ones dropped as invalid.
    pub fetched_count: usize,
    pub total_count: Option<usize>,
    pub pending_request: Option<u64>,
    pub next_request_id: u64,
    pub disposed: bool,

    pub selected_index: usize,
    pub detail_entry: Option<CatalogEntry>,
    pub detail: DataResource<PokemonInfo>,
    pub tick: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ListConfig::default())
    }
}

impl AppState {
    pub fn new(config: ListConfig) -> Self {
        Self {
            config,
            terminal_size: (80, 24),
            screen: Screen::List,
            visible: Vec::new(),
            full: Vec::new(),
            search_cache: None,
            deferred: Vec::new(),
            search_session_active: false,
            search: SearchState::default(),
            sort_order: SortOrder::Ascending,
            is_loading: false,
            last_error: None,
            is_navigating: false,
            end_reached: false,
            pages_loaded: 0,
            fetched_count: 0,
            total_count: None,
            pending_request: None,
            next_request_id: 1,
            disposed: false,
            selected_index: 0,
            detail_entry: None,
            detail: DataResource::Empty,
            tick: 0,
        }
    }

    pub fn sort_ascending(&self) -> bool {
        self.sort_order == SortOrder::Ascending
    }

    pub fn can_fetch(&self) -> bool {
        !self.disposed && !self.is_loading && !self.end_reached
    }

    pub fn next_offset(&self) -> usize {
        self.fetched_count
    }

    pub fn selected_entry(&self) -> Option<&CatalogEntry> {
        self.visible.get(self.selected_index)
    }

    pub fn set_selected_index(&mut self, index: usize) -> bool {
        if self.visible.is_empty() {
            let changed = self.selected_index != 0;
            self.selected_index = 0;
            return changed;
        }
        let bounded = index.min(self.visible.len() - 1);
        if bounded != self.selected_index {
            self.selected_index = bounded;
            return true;
        }
        false
    }

    /// Keeps the selection inside `visible` after the list is replaced.
    pub fn clamp_selection(&mut self) {
        if self.selected_index >= self.visible.len() {
            self.selected_index = self.visible.len().saturating_sub(1);
        }
    }

    pub fn near_list_end(&self) -> bool {
        self.selected_index + PREFETCH_THRESHOLD >= self.visible.len()
    }

    pub fn status_message(&self) -> String {
        if let Some(error) = &self.last_error {
            return format!("Error: {error}");
        }
        if self.is_loading {
            return "Loading...".to_string();
        }
        if self.detail.is_loading() {
            return "Loading pokemon...".to_string();
        }
        match self.total_count {
            Some(total) => format!("{}/{} loaded", self.full.len(), total),
            None => String::new(),
        }
    }
}

impl DebugState for AppState {
    fn debug_sections(&self) -> Vec<DebugSection> {
        vec![
            DebugSection::new("List")
                .entry("visible", ron_string(&self.visible.len()))
                .entry("full", ron_string(&self.full.len()))
                .entry("total", ron_string(&self.total_count))
                .entry("pages", ron_string(&self.pages_loaded))
                .entry("fetched", ron_string(&self.fetched_count))
                .entry("selected", ron_string(&self.selected_index))
                .entry("sort_next", ron_string(&self.sort_order)),
            DebugSection::new("Search")
                .entry("query", ron_string(&self.search.query))
                .entry("input_active", ron_string(&self.search.active))
                .entry("session", ron_string(&self.search_session_active))
                .entry(
                    "cached",
                    ron_string(&self.search_cache.as_ref().map(|cache| cache.len())),
                )
                .entry("deferred", ron_string(&self.deferred.len())),
            DebugSection::new("Status")
                .entry("loading", ron_string(&self.is_loading))
                .entry("navigating", ron_string(&self.is_navigating))
                .entry("end_reached", ron_string(&self.end_reached))
                .entry("pending_request", ron_string(&self.pending_request))
                .entry("screen", ron_string(&self.screen))
                .entry("error", ron_string(&self.last_error)),
        ]
    }
}
