use super::{FailureMap, feature_value};
use crate::models::feature::GeocodeFeature;
use geo::{Intersects, Rect, coord};

/// Every feature must carry a point geometry inside the WGS84 longitude
/// and latitude range. Points exactly on the range boundary are valid;
/// a feature with no point geometry at all is a failure.
pub fn points_outside_world(features: &[GeocodeFeature]) -> FailureMap {
    let world = Rect::new(coord! { x: -180.0, y: -90.0 }, coord! { x: 180.0, y: 90.0 });
    let mut failures = FailureMap::new();
    for feature in features {
        let in_bounds = feature.point.is_some_and(|point| world.intersects(&point));
        if !in_bounds {
            failures.insert(feature.composite_key(), feature_value(feature));
        }
    }
    failures
}

/// A point parked exactly on (0, 0) is unset data, not a real location.
pub fn points_on_null_island(features: &[GeocodeFeature]) -> FailureMap {
    let mut failures = FailureMap::new();
    for feature in features {
        if let Some(point) = feature.point
            && point.x() == 0.0
            && point.y() == 0.0
        {
            failures.insert(feature.composite_key(), feature_value(feature));
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feature::FeatureProperties;
    use geo::point;

    fn feature_at(id: i32, point: Option<(f64, f64)>) -> GeocodeFeature {
        GeocodeFeature {
            properties: FeatureProperties {
                id,
                map_code: 0,
                class: 1,
                ..Default::default()
            },
            point: point.map(|(x, y)| point!(x: x, y: y)),
            polygon: None,
        }
    }

    #[test]
    fn flags_points_beyond_wgs84_bounds() {
        let features = vec![
            feature_at(1, Some((-122.3, 47.6))),
            feature_at(2, Some((181.0, 47.6))),
            feature_at(3, Some((-122.3, -90.5))),
        ];
        let failures = points_outside_world(&features);
        assert_eq!(failures.len(), 2);
        assert!(failures.contains_key("2_0"));
        assert!(failures.contains_key("3_0"));
    }

    #[test]
    fn boundary_points_are_in_bounds() {
        let features = vec![
            feature_at(1, Some((180.0, 90.0))),
            feature_at(2, Some((-180.0, -90.0))),
        ];
        assert!(points_outside_world(&features).is_empty());
    }

    #[test]
    fn missing_points_are_out_of_bounds() {
        let failures = points_outside_world(&[feature_at(7, None)]);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures["7_0"]["properties"]["id"], 7);
    }

    #[test]
    fn flags_exact_null_island_only() {
        let features = vec![
            feature_at(1, Some((0.0, 0.0))),
            feature_at(2, Some((0.0001, 0.0))),
            feature_at(3, None),
        ];
        let failures = points_on_null_island(&features);
        assert_eq!(failures.len(), 1);
        assert!(failures.contains_key("1_0"));
    }
}
