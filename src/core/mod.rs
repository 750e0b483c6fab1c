pub mod deal_response;
pub mod listing;

pub use deal_response::{ComparisonResult, DealResponse, DealResultType, PriceDirection, RankedDeal, ScoredListing};
pub use listing::{Category, Listing, ProductInfo, ProductSpecs, ReferenceProduct};
