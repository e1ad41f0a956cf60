use geo::{Geometry, Point};
use geojson::JsonObject;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Geocoding classes as emitted by the extractor.
pub const CLASSES: &[(i32, &str)] = &[
    (0, "Country"),
    (1, "State"),
    (2, "County"),
    (10, "City"),
    (100, "ZipCode"),
    (101, "AreaCode"),
    (102, "CMSA"),
    (103, "Congress"),
];

pub fn class_name(class: i32) -> Option<&'static str> {
    CLASSES.iter().find(|(id, _)| *id == class).map(|(_, n)| *n)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub id: i32,
    pub map_code: i32,
    pub parent_id: Option<i32>,
    pub class: i32,
    pub fips: Option<String>,
    pub iso2: Option<String>,
    pub iso3: Option<String>,
    pub de_de: Option<String>,
    pub en_us: Option<String>,
    pub es_es: Option<String>,
    pub fr_fr: Option<String>,
    pub ja_jp: Option<String>,
    pub ko_kr: Option<String>,
    pub pt_br: Option<String>,
    pub zh_cn: Option<String>,
    pub none: Option<String>,
    pub synonyms: Option<Vec<String>>,
}

impl FeatureProperties {
    /// Compound primary key shared by every table/file of the dataset.
    pub fn composite_key(&self) -> String {
        format!("{}_{}", self.id, self.map_code)
    }
}

/// One geocodable entity: properties plus up to two geometries.
///
/// The extractor emits each entity as a GeoJSON Feature whose geometry is a
/// GeometryCollection holding an optional polygon (Polygon or MultiPolygon)
/// and an optional point, in that order.
#[derive(Debug, Clone)]
pub struct GeocodeFeature {
    pub properties: FeatureProperties,
    pub point: Option<Point<f64>>,
    /// Restricted to `Geometry::Polygon` / `Geometry::MultiPolygon`.
    pub polygon: Option<Geometry<f64>>,
}

impl GeocodeFeature {
    pub fn composite_key(&self) -> String {
        self.properties.composite_key()
    }

    /// The feature's geometries as GeoJSON objects, polygon first.
    pub fn geometry_values(&self) -> Vec<geojson::Geometry> {
        let mut geoms = Vec::with_capacity(2);
        if let Some(polygon) = &self.polygon {
            geoms.push(geojson::Geometry::new(geojson::Value::from(polygon)));
        }
        if let Some(point) = &self.point {
            geoms.push(geojson::Geometry::new(geojson::Value::from(point)));
        }
        geoms
    }

    pub fn to_geojson(&self) -> geojson::Feature {
        let properties: Option<JsonObject> = match serde_json::to_value(&self.properties) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        };
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::GeometryCollection(
                self.geometry_values(),
            ))),
            id: None,
            properties,
            foreign_members: None,
        }
    }
}

/// A loaded dataset, indexed by composite key for parent lookups.
///
/// Duplicate composite keys are a data defect; the first record wins and the
/// duplicate is reported on the console, as the extractor QA always has.
pub struct Dataset {
    pub features: Vec<GeocodeFeature>,
    by_key: HashMap<String, usize>,
}

impl Dataset {
    pub fn index(features: Vec<GeocodeFeature>) -> Self {
        let mut by_key = HashMap::with_capacity(features.len());
        for (idx, feature) in features.iter().enumerate() {
            let key = feature.composite_key();
            if by_key.contains_key(&key) {
                eprintln!("⚠️ Record already exists with the compound primary key {key}");
            } else {
                by_key.insert(key, idx);
            }
        }
        Self { features, by_key }
    }

    pub fn get(&self, key: &str) -> Option<&GeocodeFeature> {
        self.by_key.get(key).map(|&idx| &self.features[idx])
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{MultiPolygon, point, polygon};

    fn feature(id: i32, map_code: i32) -> GeocodeFeature {
        GeocodeFeature {
            properties: FeatureProperties {
                id,
                map_code,
                class: 1,
                en_us: Some(format!("Feature {id}")),
                ..Default::default()
            },
            point: Some(point!(x: 10.0, y: 20.0)),
            polygon: Some(Geometry::MultiPolygon(MultiPolygon::new(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 4.0, y: 0.0),
                (x: 4.0, y: 4.0),
                (x: 0.0, y: 4.0),
            ]]))),
        }
    }

    #[test]
    fn composite_key_joins_id_and_map_code() {
        assert_eq!(feature(110, 0).composite_key(), "110_0");
    }

    #[test]
    fn to_geojson_emits_collection_polygon_first() {
        let gj = feature(7, 3).to_geojson();
        let geometry = gj.geometry.expect("feature should carry geometry");
        match geometry.value {
            geojson::Value::GeometryCollection(geoms) => {
                assert_eq!(geoms.len(), 2);
                assert!(matches!(geoms[0].value, geojson::Value::MultiPolygon(_)));
                assert!(matches!(geoms[1].value, geojson::Value::Point(_)));
            }
            other => panic!("expected GeometryCollection, got {other:?}"),
        }
        let props = gj.properties.expect("properties should serialize");
        assert_eq!(props["id"], 7);
        assert_eq!(props["map_code"], 3);
        assert_eq!(props["en_us"], "Feature 7");
        assert!(props["fr_fr"].is_null());
    }

    #[test]
    fn dataset_index_keeps_first_duplicate() {
        let mut second = feature(1, 0);
        second.properties.en_us = Some("duplicate".to_string());
        let dataset = Dataset::index(vec![feature(1, 0), second, feature(2, 0)]);
        assert_eq!(dataset.len(), 3);
        let kept = dataset.get("1_0").expect("key should resolve");
        assert_eq!(kept.properties.en_us.as_deref(), Some("Feature 1"));
        assert!(dataset.get("9_9").is_none());
    }
}
