use crate::models::feature::GeocodeFeature;

pub mod containment;
pub mod overlap;
pub mod points;
pub mod shape;

/// JSON object of failing features, keyed as each check defines.
/// An empty map means the check passed.
pub type FailureMap = serde_json::Map<String, serde_json::Value>;

/// The whole feature as a GeoJSON Feature value.
pub(crate) fn feature_value(feature: &GeocodeFeature) -> serde_json::Value {
    serde_json::to_value(feature.to_geojson()).unwrap_or_default()
}

/// Just the feature's geometries, as a GeoJSON geometry array.
pub(crate) fn geometry_list_value(feature: &GeocodeFeature) -> serde_json::Value {
    serde_json::to_value(feature.geometry_values()).unwrap_or_default()
}
