//! Ranker: orders scored listings into the shortlist.
//!
//! Primary key is `predicted_score` descending; ties fall through to price
//! ascending, seller rating descending, then product name ascending. The
//! chain is a total order, so identical inputs always give identical output
//! regardless of input order.

use std::cmp::Ordering;

use crate::core::ScoredListing;

/// Total order used by [`rank`]; `Less` means `a` ranks above `b`
pub fn compare_scored(a: &ScoredListing, b: &ScoredListing) -> Ordering {
    b.predicted_score
        .total_cmp(&a.predicted_score)
        .then_with(|| a.listing.price.total_cmp(&b.listing.price))
        .then_with(|| b.listing.seller_rating.total_cmp(&a.listing.seller_rating))
        .then_with(|| a.listing.product_name.cmp(&b.listing.product_name))
}

/// Drops excluded listings (non-finite score), sorts the rest and keeps the
/// first `top_n`, assigning ranks `1..=k`.
pub fn rank(scored: Vec<ScoredListing>, top_n: usize) -> Vec<ScoredListing> {
    let mut ranked: Vec<ScoredListing> = scored
        .into_iter()
        .filter(ScoredListing::is_rankable)
        .collect();

    ranked.sort_by(compare_scored);
    ranked.truncate(top_n);

    for (i, entry) in ranked.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    ranked
}
