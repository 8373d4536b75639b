//! Auction-lot input model and search-dump parsing.
//!
//! ## Observed dump shape
//!
//! The search API returns `{"results": [{"hits": [...]}, ...]}` where each
//! hit is one auction lot. Field names are camelCase as sent by the API;
//! `dateTimeUTCUnix` does not follow the camelCase convention serde would
//! derive, so every field carries an explicit rename.
//!
//! Hits routinely carry extra keys beyond the fixed set below (highlight
//! results, ranking info, house ids). Those are preserved losslessly in
//! [`AuctionLot::extra`] so callers can round-trip them into the persisted
//! record's raw-data payload.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("search dump is malformed: {source}")]
    InvalidDump {
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level search dump: `results`, each containing `hits`.
#[derive(Debug, Deserialize)]
struct SearchDump {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    /// Raw hit objects; deserialized individually so one malformed hit
    /// does not discard the rest of the dump.
    #[serde(default)]
    hits: Vec<serde_json::Value>,
}

/// One auction lot as received from the search API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionLot {
    #[serde(rename = "lotNumber")]
    pub lot_number: String,

    /// Unique lot key; the image pipeline's result mapping is keyed on it.
    #[serde(rename = "lotRef")]
    pub lot_ref: String,

    #[serde(rename = "lotTitle")]
    pub lot_title: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Auction house display name, e.g. `"Dirk Soulis Auctions"`. Used to
    /// namespace image storage paths.
    #[serde(rename = "houseName")]
    pub house_name: String,

    #[serde(rename = "saleType")]
    pub sale_type: String,

    /// Local sale timestamp as sent, e.g. `"2024-09-21 11:00:00"`. Kept as
    /// a string; the pipeline never interprets it.
    #[serde(rename = "dateTimeLocal")]
    pub date_time_local: String,

    #[serde(rename = "dateTimeUTCUnix")]
    pub date_time_utc_unix: i64,

    #[serde(rename = "priceResult")]
    pub price_result: f64,

    #[serde(rename = "currencyCode")]
    pub currency_code: String,

    #[serde(rename = "currencySymbol")]
    pub currency_symbol: String,

    /// Photo reference: relative path under the image CDN, an absolute
    /// URL, or a `test:` sentinel. May be absent — normalized to empty.
    #[serde(rename = "photoPath", default)]
    pub photo_path: String,

    /// Unrecognized hit keys, preserved for lossless round-trip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Parse a raw search dump into auction lots.
///
/// A hit that fails to deserialize is logged and skipped so the rest of
/// the dump still yields lots.
///
/// # Errors
///
/// Returns [`ParseError::InvalidDump`] when the dump itself is not valid
/// JSON or lacks the `results` array.
pub fn parse_search_results(raw: &str) -> Result<Vec<AuctionLot>, ParseError> {
    let dump: SearchDump =
        serde_json::from_str(raw).map_err(|source| ParseError::InvalidDump { source })?;

    let mut lots = Vec::new();
    for result in dump.results {
        for hit in result.hits {
            match serde_json::from_value::<AuctionLot>(hit) {
                Ok(lot) => lots.push(lot),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed hit in search dump");
                }
            }
        }
    }

    Ok(lots)
}

#[cfg(test)]
#[path = "lots_test.rs"]
mod tests;
