use super::{FailureMap, feature_value, geometry_list_value};
use crate::models::feature::{Dataset, GeocodeFeature};
use geo::{Contains, Within};

/// A feature's point geometry must lie within its polygon geometry.
/// Features missing either geometry are skipped. Failures are keyed by
/// composite key, with the feature's geometry list as the value.
pub fn points_outside_polygons(features: &[GeocodeFeature]) -> FailureMap {
    let mut failures = FailureMap::new();
    for feature in features {
        let (Some(point), Some(polygon)) = (&feature.point, &feature.polygon) else {
            continue;
        };
        if !point.is_within(polygon) {
            failures.insert(feature.composite_key(), geometry_list_value(feature));
        }
    }
    failures
}

/// A feature's polygon must fall within its parent's polygon. Countries
/// have no parent and are skipped, as are features whose parent record
/// (looked up as `{parent_id}_{map_code}`) is missing or has no polygon.
pub fn polygons_outside_parents(dataset: &Dataset) -> FailureMap {
    let mut failures = FailureMap::new();
    for feature in &dataset.features {
        let Some(child) = &feature.polygon else {
            continue;
        };
        if feature.properties.class == 0 {
            continue;
        }
        let Some(parent_id) = feature.properties.parent_id else {
            eprintln!(
                "⚠️ Record {} has no parent id, cannot check parent containment",
                feature.composite_key()
            );
            continue;
        };
        let parent_key = format!("{}_{}", parent_id, feature.properties.map_code);
        let Some(parent) = dataset.get(&parent_key) else {
            eprintln!(
                "⚠️ Record {}'s parent {parent_key} has no corresponding record",
                feature.composite_key()
            );
            continue;
        };
        let Some(parent_polygon) = &parent.polygon else {
            continue;
        };
        if !parent_polygon.contains(child) {
            failures.insert(feature.composite_key(), feature_value(feature));
        }
    }
    failures
}
