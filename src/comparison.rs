//! Comparator: price deltas between listings and the reference product.
//!
//! Converted amounts are rounded to the target currency's minor unit exactly
//! once, straight from the base-currency price, and deltas are taken between
//! the integer minor-unit amounts. `Equal` therefore means the two prices
//! display identically.

use serde::{Deserialize, Serialize};

use crate::core::{ComparisonResult, Listing, PriceDirection, ReferenceProduct};
use crate::error::{DealEngineError, Result};

/// Target currency of converted prices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Currency {
    /// ISO 4217 code, passed through to the response
    pub code: String,
    /// Digits after the decimal point (2 for INR/USD, 0 for JPY)
    pub minor_units: u32,
}

impl Default for Currency {
    fn default() -> Self {
        Self {
            code: "INR".to_string(),
            minor_units: 2,
        }
    }
}

impl Currency {
    pub fn new(code: impl Into<String>, minor_units: u32) -> Self {
        Self {
            code: code.into(),
            minor_units,
        }
    }

    fn scale(&self) -> f64 {
        10f64.powi(self.minor_units as i32)
    }

    /// `amount * fx_rate` as an integer count of minor units (single rounding)
    pub fn to_minor_units(&self, amount: f64, fx_rate: f64) -> i64 {
        (amount * fx_rate * self.scale()).round() as i64
    }

    pub fn from_minor_units(&self, minor: i64) -> f64 {
        minor as f64 / self.scale()
    }

    /// Converted and rounded amount
    pub fn convert(&self, amount: f64, fx_rate: f64) -> f64 {
        self.from_minor_units(self.to_minor_units(amount, fx_rate))
    }
}

/// Rejects exchange rates that cannot produce a meaningful price
pub fn validate_fx_rate(fx_rate: f64) -> Result<()> {
    if !fx_rate.is_finite() || fx_rate < 0.0 {
        return Err(DealEngineError::InvalidRequest(format!(
            "fx_rate must be a non-negative number, got {}",
            fx_rate
        )));
    }
    Ok(())
}

/// Compares one listing against the reference product.
///
/// Returns `None` when there is no reference (no comparison context).
pub fn compare(
    reference: Option<&ReferenceProduct>,
    listing: &Listing,
    fx_rate: f64,
    currency: &Currency,
) -> Option<ComparisonResult> {
    let reference = reference?;

    let listing_minor = currency.to_minor_units(listing.price, fx_rate);
    let reference_minor = currency.to_minor_units(reference.price, fx_rate);
    let delta_minor = listing_minor - reference_minor;

    let price_delta_direction = match delta_minor.signum() {
        1 => PriceDirection::Higher,
        -1 => PriceDirection::Lower,
        _ => PriceDirection::Equal,
    };

    Some(ComparisonResult {
        reference: reference.clone(),
        listing: listing.clone(),
        converted_listing_price: currency.from_minor_units(listing_minor),
        converted_reference_price: currency.from_minor_units(reference_minor),
        price_delta: currency.from_minor_units(delta_minor),
        price_delta_direction,
    })
}
