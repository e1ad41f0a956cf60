use super::FailureMap;
use crate::models::feature::GeocodeFeature;
use geo::{Area, BooleanOps, BoundingRect, Contains, Geometry, Intersects, MultiPolygon};
use rstar::{AABB, RTree, RTreeObject};

/// No two polygons of the same class and map code may overlap. Candidate
/// pairs come from an R-tree over bounding boxes; each flagged pair appears
/// once, keyed `"{key1};{key2}"`, with a GeometryCollection of both
/// features' geometries as the value.
pub fn overlapping_polygons(features: &[GeocodeFeature]) -> FailureMap {
    // 1) Collect polygon carriers, normalised to multipolygons
    let mut entries: Vec<PolygonEntry> = Vec::new();
    for feature in features {
        let multi = match &feature.polygon {
            Some(Geometry::Polygon(p)) => MultiPolygon::new(vec![p.clone()]),
            Some(Geometry::MultiPolygon(mp)) => mp.clone(),
            _ => continue,
        };
        let Some(rect) = multi.bounding_rect() else {
            continue;
        };
        entries.push(PolygonEntry {
            ordinal: entries.len(),
            feature,
            polygon: multi,
            envelope: AABB::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            ),
        });
    }

    // 2) Index the bounding boxes
    let tree = RTree::bulk_load(
        entries
            .iter()
            .map(|entry| IndexedEnvelope {
                envelope: entry.envelope,
                ordinal: entry.ordinal,
            })
            .collect(),
    );

    // 3) Probe each polygon against the index and verify real overlap
    let mut failures = FailureMap::new();
    for entry in &entries {
        for hit in tree.locate_in_envelope_intersecting(&entry.envelope) {
            let candidate = &entries[hit.ordinal];
            if candidate.ordinal == entry.ordinal {
                continue;
            }
            if candidate.feature.properties.map_code != entry.feature.properties.map_code
                || candidate.feature.properties.class != entry.feature.properties.class
            {
                continue;
            }
            let key = format!(
                "{};{}",
                candidate.feature.composite_key(),
                entry.feature.composite_key()
            );
            let reverse = format!(
                "{};{}",
                entry.feature.composite_key(),
                candidate.feature.composite_key()
            );
            if failures.contains_key(&key) || failures.contains_key(&reverse) {
                continue;
            }
            if polygons_overlap(&candidate.polygon, &entry.polygon) {
                let mut geometries = candidate.feature.geometry_values();
                geometries.extend(entry.feature.geometry_values());
                let collection =
                    geojson::Geometry::new(geojson::Value::GeometryCollection(geometries));
                failures.insert(key, serde_json::to_value(collection).unwrap_or_default());
            }
        }
    }
    failures
}

struct PolygonEntry<'a> {
    ordinal: usize,
    feature: &'a GeocodeFeature,
    polygon: MultiPolygon<f64>,
    envelope: AABB<[f64; 2]>,
}

struct IndexedEnvelope {
    envelope: AABB<[f64; 2]>,
    ordinal: usize,
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// DE-9IM "overlaps" for areal geometries: the interiors share area while
/// neither side covers the other. Polygons that merely touch along a border,
/// or where one sits inside the other, do not count.
fn polygons_overlap(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> bool {
    if !a.intersects(b) || a.contains(b) || b.contains(a) {
        return false;
    }
    a.intersection(b).unsigned_area() > 0.0
}
