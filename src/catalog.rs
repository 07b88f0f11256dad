//! Catalog entries and the pure list transforms the reducer builds on.

use serde::{Deserialize, Serialize};

use crate::source::RawCatalogItem;

pub const SPRITE_URL_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// One browsable Pokedex entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub image_url: String,
    pub number: u32,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            image_url: sprite_url(number),
            number,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggle(&self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "A-Z",
            SortOrder::Descending => "Z-A",
        }
    }
}

/// Maps a raw source item, dropping it when the URL carries no usable number.
pub fn entry_from_raw(item: &RawCatalogItem) -> Option<CatalogEntry> {
    let number = number_from_url(&item.source_url)?;
    Some(CatalogEntry {
        name: capitalize(&item.raw_name),
        image_url: sprite_url(number),
        number,
    })
}

/// Trailing decimal digits of a resource URL, ignoring one trailing slash.
pub fn number_from_url(url: &str) -> Option<u32> {
    let trimmed = url.strip_suffix('/').unwrap_or(url);
    let digits_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx)?;
    let number: u32 = trimmed[digits_start..].parse().ok()?;
    (number > 0).then_some(number)
}

pub fn sprite_url(number: u32) -> String {
    format!("{SPRITE_URL_BASE}/{number}.png")
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Case-insensitive name substring match, or exact match on the decimal number.
pub fn matches_query(entry: &CatalogEntry, query: &str) -> bool {
    entry.name.to_lowercase().contains(&query.to_lowercase())
        || entry.number.to_string() == query.trim()
}

pub fn filter_entries(entries: &[CatalogEntry], query: &str) -> Vec<CatalogEntry> {
    entries
        .iter()
        .filter(|entry| matches_query(entry, query))
        .cloned()
        .collect()
}

/// Stable ordering by name; equal names keep their relative input order.
pub fn sorted_entries(entries: &[CatalogEntry], order: SortOrder) -> Vec<CatalogEntry> {
    let mut sorted = entries.to_vec();
    match order {
        SortOrder::Ascending => sorted.sort_by(|a, b| a.name.cmp(&b.name)),
        SortOrder::Descending => sorted.sort_by(|a, b| b.name.cmp(&a.name)),
    }
    sorted
}
