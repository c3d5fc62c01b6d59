//! Embeddable map URLs for a record's coordinates.

pub const DEFAULT_ZOOM: u32 = 12;

/// Build an embeddable map URL for the given coordinates.
///
/// With an API key this uses the keyed embed endpoint; without one it
/// falls back to the keyless query URL so the feature degrades instead
/// of disappearing.
pub fn embed_url(api_key: Option<&str>, latitude: f64, longitude: f64, zoom: u32) -> String {
    match api_key {
        Some(key) if !key.is_empty() => format!(
            "https://www.google.com/maps/embed/v1/view?key={key}&center={latitude},{longitude}&zoom={zoom}"
        ),
        _ => format!(
            "https://maps.google.com/maps?q={latitude},{longitude}&z={zoom}&output=embed"
        ),
    }
}
