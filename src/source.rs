//! Remote catalog contract consumed by the list controller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::FetchError;
use crate::state::PokemonInfo;

/// An unmapped list item as the remote source returns it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCatalogItem {
    pub source_url: String,
    pub raw_name: String,
}

/// One batch of items for a given offset/limit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub total_count: usize,
    pub items: Vec<RawCatalogItem>,
}

/// Paginated catalog plus per-entry detail lookup.
///
/// Timeouts and retries below the request level belong to the implementor.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<CatalogPage, FetchError>;

    async fn fetch_info(&self, name: &str) -> Result<PokemonInfo, FetchError>;
}
