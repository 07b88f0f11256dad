use crate::catalog::{CatalogEntry, SortOrder};

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    FetchPage {
        request_id: u64,
        limit: usize,
        offset: usize,
    },
    SortEntries {
        entries: Vec<CatalogEntry>,
        order: SortOrder,
    },
    LoadDetail { name: String },
    SettleNavigation { delay_ms: u64 },
}
