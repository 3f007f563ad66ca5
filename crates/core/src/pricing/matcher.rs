//! Catalog candidate search for a free-text product name.
//!
//! Recall beats precision here: a direct OR query over every keyword runs
//! first, and only when it yields nothing does the matcher broaden to one query
//! per keyword (and per keyword stem). Scoring and unit conversion downstream
//! decide which candidates really count.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::product::CatalogListing;
use crate::errors::EngineError;
use crate::pricing::keywords::Keywords;
use crate::pricing::units::{normalize_unit, CanonicalUnit};
use crate::store::CatalogStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStage {
    Direct,
    Broadened,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredListing {
    pub listing: CatalogListing,
    /// Keywords of the query found in the candidate's normalized name.
    pub relevance: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMatch {
    pub keywords: Vec<String>,
    pub stage: SearchStage,
    pub candidates: Vec<ScoredListing>,
}

pub struct CatalogMatcher<'a, S: ?Sized> {
    store: &'a S,
    limit: u32,
}

impl<'a, S> CatalogMatcher<'a, S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: &'a S, limit: u32) -> Self {
        Self { store, limit: limit.max(1) }
    }

    /// Candidates for `name`, most relevant first.
    ///
    /// `unit_filter` only narrows the direct stage; broadening always searches
    /// the whole listed catalog.
    pub async fn find_candidates(
        &self,
        name: &str,
        unit_filter: Option<&CanonicalUnit>,
    ) -> Result<CatalogMatch, EngineError> {
        let keywords = Keywords::extract(name);
        if keywords.is_empty() {
            return Err(EngineError::AmbiguousInput { name: name.to_owned() });
        }
        let terms = keywords.to_vec();

        let direct: Vec<CatalogListing> = self
            .store
            .search_listings(&terms, self.limit)
            .await?
            .into_iter()
            .filter(|listing| {
                unit_filter.map_or(true, |unit| normalize_unit(&listing.product.unit) == *unit)
            })
            .collect();

        let (stage, listings) = if direct.is_empty() {
            (SearchStage::Broadened, self.broadened(&terms).await?)
        } else {
            (SearchStage::Direct, direct)
        };

        if listings.is_empty() {
            return Err(EngineError::NotFound {
                subject: format!("ningún producto comparable a \"{}\"", name.trim()),
            });
        }

        let mut candidates: Vec<ScoredListing> = listings
            .into_iter()
            .map(|listing| {
                let relevance = keywords.relevance(&listing.product.name);
                ScoredListing { listing, relevance }
            })
            .collect();
        // stable: equal scores keep catalog order
        candidates.sort_by(|left, right| right.relevance.cmp(&left.relevance));

        Ok(CatalogMatch { keywords: terms, stage, candidates })
    }

    async fn broadened(&self, terms: &[String]) -> Result<Vec<CatalogListing>, EngineError> {
        let mut seen = HashSet::new();
        let mut union = Vec::new();

        for term in terms.iter().flat_map(|term| broadened_terms(term)) {
            for listing in self.store.search_listings(&[term], self.limit).await? {
                if seen.insert(listing.product.id) {
                    union.push(listing);
                }
            }
        }

        union.truncate(self.limit as usize);
        Ok(union)
    }
}

/// A keyword plus its singular stem ("limones" also searches "limon").
pub fn broadened_terms(keyword: &str) -> Vec<String> {
    let mut terms = vec![keyword.to_owned()];
    let length = keyword.chars().count();
    let stem = if keyword.ends_with("es") && length > 5 {
        keyword.strip_suffix("es")
    } else if keyword.ends_with('s') && length > 4 {
        keyword.strip_suffix('s')
    } else {
        None
    };
    if let Some(stem) = stem {
        terms.push(stem.to_owned());
    }
    terms
}
