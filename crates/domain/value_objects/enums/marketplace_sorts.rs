use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarketplaceSort {
    #[default]
    Upvotes,
    Newest,
    Relevance,
}

impl Display for MarketplaceSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sort = match self {
            MarketplaceSort::Upvotes => "upvotes",
            MarketplaceSort::Newest => "newest",
            MarketplaceSort::Relevance => "relevance",
        };
        write!(f, "{}", sort)
    }
}

impl MarketplaceSort {
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("newest") | Some("date") => MarketplaceSort::Newest,
            Some("relevance") => MarketplaceSort::Relevance,
            _ => MarketplaceSort::Upvotes,
        }
    }

    /// Relevance ranking is not implemented; it currently sorts like `Upvotes`.
    pub fn effective(&self) -> Self {
        match self {
            MarketplaceSort::Relevance => MarketplaceSort::Upvotes,
            other => *other,
        }
    }
}
