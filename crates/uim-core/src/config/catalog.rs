//! Catalog store configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the catalog database and search paging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// sqlx connection URL, e.g. `sqlite://data/uim-catalog.sqlite`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Upper bound applied to every search `limit`.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// `limit` used when a search does not supply one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Most intents a natural-language query ranks. Candidates beyond this
    /// bound, in insertion order, are not considered.
    #[serde(default = "default_max_search_candidates")]
    pub max_search_candidates: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            max_page_size: default_max_page_size(),
            default_page_size: default_page_size(),
            max_search_candidates: default_max_search_candidates(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://data/uim-catalog.sqlite".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_max_page_size() -> u32 {
    100
}

fn default_page_size() -> u32 {
    10
}

fn default_max_search_candidates() -> u32 {
    1000
}
