use valuer_core::AuctionLot;

/// Identity of one image-bearing lot record: everything the pipeline
/// needs to fetch, place, and reference its photo. Owned by the caller
/// and borrowed by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotImage {
    /// Unique lot key; the result mapping is keyed on it.
    pub lot_ref: String,
    /// Auction house display name, used for path namespacing.
    pub house_name: String,
    /// Relative CDN path, absolute URL, or `test:` sentinel. Empty means
    /// the lot has no photo and is skipped.
    pub photo_path: String,
}

impl LotImage {
    #[must_use]
    pub fn new(
        lot_ref: impl Into<String>,
        house_name: impl Into<String>,
        photo_path: impl Into<String>,
    ) -> Self {
        Self {
            lot_ref: lot_ref.into(),
            house_name: house_name.into(),
            photo_path: photo_path.into(),
        }
    }
}

impl From<&AuctionLot> for LotImage {
    fn from(lot: &AuctionLot) -> Self {
        Self {
            lot_ref: lot.lot_ref.clone(),
            house_name: lot.house_name.clone(),
            photo_path: lot.photo_path.clone(),
        }
    }
}
