//! Result Assembler: zips ranked listings with their comparisons.

use crate::comparison::Currency;
use crate::core::{ComparisonResult, RankedDeal, ScoredListing};

/// Pairs each ranked listing with its comparison, keeping rank order.
///
/// `comparisons[i]` belongs to `ranked[i]`; a missing entry means no
/// comparison.
pub fn assemble(
    ranked: Vec<ScoredListing>,
    comparisons: Vec<Option<ComparisonResult>>,
    fx_rate: f64,
    currency: &Currency,
) -> Vec<RankedDeal> {
    let mut comparisons = comparisons.into_iter();

    ranked
        .into_iter()
        .map(|scored| {
            let comparison = comparisons.next().flatten();
            let listing = scored.listing;
            RankedDeal {
                rank: scored.rank,
                converted_price: currency.convert(listing.price, fx_rate),
                product_name: listing.product_name,
                platform: listing.platform,
                price: listing.price,
                seller_rating: listing.seller_rating,
                spec_score: listing.spec_score,
                predicted_score: scored.predicted_score,
                brand: listing.brand,
                specs: listing.specs,
                comparison,
            }
        })
        .collect()
}
