use super::{FailureMap, feature_value};
use crate::models::feature::GeocodeFeature;
use geo::Validation;

/// Features whose polygon violates OGC simple-feature validity: rings with
/// too few vertices, self-intersections and the like. Failures are keyed by
/// `id` alone; when several map codes share an invalid id, the first one
/// seen is reported.
pub fn invalid_shapes(features: &[GeocodeFeature]) -> FailureMap {
    let mut failures = FailureMap::new();
    for feature in features {
        let Some(polygon) = &feature.polygon else {
            continue;
        };
        if polygon.is_valid() {
            continue;
        }
        let key = feature.properties.id.to_string();
        if !failures.contains_key(&key) {
            failures.insert(key, feature_value(feature));
        }
    }
    failures
}
