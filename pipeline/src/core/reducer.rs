//! Search result reducer
//!
//! Bounds each query's results to a fixed quota per kind by uniform sampling
//! without replacement. Partitions smaller than the quota are kept whole.

use chrono::Utc;
use rand::Rng;
use shared::{KindCounts, QueryResults, ReducedQuery, ReducedSearch, SearchListing};

use super::sampling::sample_preserving_order;

/// Fixed-quota sampler for search results
#[derive(Debug, Clone, Copy)]
pub struct Reducer {
    quota_per_kind: usize,
}

impl Reducer {
    pub fn new(quota_per_kind: usize) -> Self {
        Self { quota_per_kind }
    }

    /// Reduce one query's results
    pub fn reduce_query<R: Rng + ?Sized>(&self, results: &QueryResults, rng: &mut R) -> ReducedQuery {
        ReducedQuery {
            query: results.query.clone(),
            original_counts: KindCounts {
                videos: results.videos.len(),
                shorts: results.shorts.len(),
            },
            videos: sample_preserving_order(&results.videos, self.quota_per_kind, rng),
            shorts: sample_preserving_order(&results.shorts, self.quota_per_kind, rng),
            error: results.error.clone(),
        }
    }

    /// Reduce every query; the feed outcome is carried through unchanged
    pub fn reduce_listing<R: Rng + ?Sized>(&self, listing: &SearchListing, rng: &mut R) -> ReducedSearch {
        ReducedSearch {
            reduced_at: Utc::now(),
            quota_per_kind: self.quota_per_kind,
            searches: listing.searches.iter().map(|s| self.reduce_query(s, rng)).collect(),
            feed: listing.feed.clone(),
        }
    }
}

impl Default for Reducer {
    fn default() -> Self {
        Self::new(3)
    }
}
