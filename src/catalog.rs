//! Immutable fund catalog and its provider abstraction.
//!
//! The catalog is fetched once by the application startup sequence via
//! [`CatalogProvider::fetch_catalog`], never as an import-time side effect.

use crate::error::Result;
use async_trait::async_trait;

/// One selectable fund: human-readable name plus the opaque identifier the
/// pricing service keys history on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundListing {
    pub name: String,
    pub code: String,
}

/// Immutable list of funds offered by the provider.
#[derive(Debug, Clone)]
pub struct FundCatalog {
    funds: Vec<FundListing>,
}

impl FundCatalog {
    pub fn new(funds: Vec<FundListing>) -> Self {
        FundCatalog { funds }
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FundListing> {
        self.funds.iter()
    }

    /// Case-insensitive substring match against fund names. Returns the
    /// first hit in catalog order.
    pub fn resolve(&self, query: &str) -> Option<&FundListing> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.funds
            .iter()
            .find(|f| f.name.to_lowercase().contains(&needle))
    }
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_catalog(&self) -> Result<FundCatalog>;
}
