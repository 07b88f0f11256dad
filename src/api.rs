//! PokeAPI client with an on-disk response cache

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;

use crate::source::{CatalogPage, CatalogSource, RawCatalogItem};
use crate::state::{PokemonInfo, PokemonStat};

pub const API_BASE: &str = "https://pokeapi.co/api/v2";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
    url: String,
}

#[derive(Clone, Debug, Deserialize)]
struct ListResponse {
    count: usize,
    results: Vec<NamedResource>,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    id: u32,
    name: String,
    height: u16,
    weight: u16,
    types: Vec<PokemonTypeSlot>,
    stats: Vec<PokemonStatSlot>,
    sprites: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonTypeSlot {
    #[serde(rename = "type")]
    type_info: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonStatSlot {
    base_stat: u16,
    stat: NamedResource,
}

#[derive(Clone, Debug)]
pub struct PokeApi {
    base: String,
    cache_root: Option<PathBuf>,
    client: reqwest::Client,
}

impl Default for PokeApi {
    fn default() -> Self {
        Self::new(API_BASE, Some(default_cache_root()))
    }
}

impl PokeApi {
    pub fn new(base: impl Into<String>, cache_root: Option<PathBuf>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            cache_root,
            client: reqwest::Client::new(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    async fn fetch_json_cached<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, FetchError> {
        let bytes = self.fetch_bytes_cached(url).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(path) = self.cache_path(url) {
                    tracing::warn!(%url, "discarding undecodable cached response");
                    let _ = fs::remove_file(&path).await;
                }
                Err(err.into())
            }
        }
    }

    async fn fetch_bytes_cached(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let cache_path = self.cache_path(url);
        if let Some(path) = &cache_path {
            if let Some(bytes) = read_cache(path).await {
                tracing::debug!(%url, "cache hit");
                return Ok(bytes);
            }
        }

        tracing::debug!(%url, "requesting");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        let bytes = response.bytes().await?.to_vec();
        if let Some(path) = &cache_path {
            write_cache(path, &bytes).await;
        }
        Ok(bytes)
    }

    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        let root = self.cache_root.as_ref()?;
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Some(root.join("http").join(digest))
    }
}

#[async_trait]
impl CatalogSource for PokeApi {
    async fn fetch_page(&self, limit: usize, offset: usize) -> Result<CatalogPage, FetchError> {
        let url = format!("{}/pokemon?limit={limit}&offset={offset}", self.base);
        let response: ListResponse = self.fetch_json_cached(&url).await?;
        tracing::info!(offset, received = response.results.len(), total = response.count, "page loaded");
        Ok(page_from_response(response))
    }

    async fn fetch_info(&self, name: &str) -> Result<PokemonInfo, FetchError> {
        let url = format!("{}/pokemon/{name}", self.base);
        let response: PokemonResponse = self.fetch_json_cached(&url).await?;
        Ok(info_from_response(response))
    }
}

fn page_from_response(response: ListResponse) -> CatalogPage {
    CatalogPage {
        total_count: response.count,
        items: response
            .results
            .into_iter()
            .map(|entry| RawCatalogItem {
                source_url: entry.url,
                raw_name: entry.name,
            })
            .collect(),
    }
}

fn info_from_response(response: PokemonResponse) -> PokemonInfo {
    PokemonInfo {
        id: response.id,
        name: response.name,
        height: response.height,
        weight: response.weight,
        types: response
            .types
            .into_iter()
            .map(|slot| slot.type_info.name)
            .collect(),
        stats: response
            .stats
            .into_iter()
            .map(|slot| PokemonStat {
                name: slot.stat.name,
                value: slot.base_stat,
            })
            .collect(),
        sprite_url: pointer_string(&response.sprites, "/front_default"),
    }
}

fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}

pub fn default_cache_root() -> PathBuf {
    let base = std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));
    base.join(".cache").join("pokedex")
}

async fn read_cache(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).await.ok()
}

async fn write_cache(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent).await;
    }
    if let Err(err) = fs::write(path, bytes).await {
        tracing::warn!(path = %path.display(), %err, "failed to write cache");
    }
}
