//! Deterministic storage path derivation for lot images.

/// Derives the relative storage path for a lot's image.
///
/// The path is `{house}/{lot_ref}/{filename}` where `house` is the house
/// name lowercased with spaces and slashes replaced by underscores, and
/// `filename` is the final segment of the photo reference. Reprocessing
/// the same lot and photo always yields the same path, which is what makes
/// the existence-check skip in the pipeline sound.
///
/// This is positional path construction, not validation: empty inputs
/// degrade to empty segments rather than erroring.
#[must_use]
pub fn storage_path(house_name: &str, lot_ref: &str, photo_path: &str) -> String {
    let house = house_name.to_lowercase().replace([' ', '/'], "_");
    let filename = photo_path.rsplit('/').next().unwrap_or("");
    format!("{house}/{lot_ref}/{filename}")
}
