use super::FeatureReader;
use crate::models::feature::{FeatureProperties, GeocodeFeature};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use geo::Geometry;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Row};
use std::collections::HashMap;

/// Reads a geocoding database: the `features`, `names`, `synonyms`,
/// `points` and `polygons` tables, optionally with one or more sets of
/// `staging_<prefix>_*` tables applied on top of production.
pub struct PostgresFeatureReader {
    host: String,
    database: String,
    user: String,
    password: String,
    staging_prefixes: Vec<String>,
}

impl PostgresFeatureReader {
    pub fn new(
        host: String,
        database: String,
        user: String,
        password: String,
        staging_prefixes: Vec<String>,
    ) -> Self {
        Self {
            host,
            database,
            user,
            password,
            staging_prefixes,
        }
    }
}

#[async_trait]
impl FeatureReader for PostgresFeatureReader {
    async fn read_features(&self) -> Result<Vec<GeocodeFeature>> {
        for prefix in &self.staging_prefixes {
            // Prefixes are interpolated into table names, so reject
            // anything that is not a plain identifier.
            if prefix.is_empty()
                || !prefix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                bail!("invalid staging prefix '{prefix}'");
            }
        }

        let options = PgConnectOptions::new()
            .host(&self.host)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password);
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("failed to connect to postgres at {}/{}", self.host, self.database)
            })?;

        let mut tables = TableSet::query(&pool, None).await?;
        for prefix in &self.staging_prefixes {
            let staging = TableSet::query(&pool, Some(prefix.as_str())).await?;
            tables.apply_staging(staging);
        }
        pool.close().await;

        let features = tables.into_features()?;
        println!("📦 Total features: {}", features.len());
        Ok(features)
    }
}

#[derive(Debug, Clone)]
struct FeatureRow {
    id: i32,
    parent_id: Option<i32>,
    class: i32,
    map_code: i32,
}

#[derive(Debug)]
struct NameRow {
    id: i32,
    map_code: i32,
    de_de: Option<String>,
    es_es: Option<String>,
    fr_fr: Option<String>,
    ja_jp: Option<String>,
    ko_kr: Option<String>,
    pt_br: Option<String>,
    zh_cn: Option<String>,
    none: Option<String>,
    fips: Option<String>,
    iso2: Option<String>,
    iso3: Option<String>,
}

#[derive(Debug)]
struct SynonymRow {
    id: i32,
    map_code: i32,
    name: Option<String>,
}

#[derive(Debug)]
struct GeomRow {
    id: i32,
    map_code: i32,
    geom: Option<String>,
}

fn select_sql(columns: &str, table: &str, staging_prefix: Option<&str>) -> String {
    match staging_prefix {
        Some(prefix) => format!("SELECT {columns} FROM staging_{prefix}_{table}"),
        None => format!("SELECT {columns} FROM {table}"),
    }
}

fn compound_key(id: i32, map_code: i32) -> String {
    format!("{id}_{map_code}")
}

/// Hash rows by compound key, rejecting duplicates. Synonyms are the one
/// table where duplicate id+map_code combinations are legitimate, so they
/// skip this and go through `grouped` instead.
fn keyed<T>(rows: Vec<T>, table: &str, key_of: impl Fn(&T) -> String) -> Result<HashMap<String, T>> {
    let mut map = HashMap::with_capacity(rows.len());
    let mut duplicates = Vec::new();
    for row in rows {
        let key = key_of(&row);
        if map.insert(key.clone(), row).is_some() {
            duplicates.push(key);
        }
    }
    if !duplicates.is_empty() {
        duplicates.sort_unstable();
        duplicates.dedup();
        bail!(
            "duplicate keys found in the '{table}' table of staging or production data: {}",
            duplicates.join(", ")
        );
    }
    Ok(map)
}

fn grouped(rows: Vec<SynonymRow>) -> HashMap<String, Vec<SynonymRow>> {
    let mut map: HashMap<String, Vec<SynonymRow>> = HashMap::new();
    for row in rows {
        map.entry(compound_key(row.id, row.map_code))
            .or_default()
            .push(row);
    }
    map
}

/// One dataset's worth of table contents, hashed by compound key.
#[derive(Default)]
struct TableSet {
    features: HashMap<String, FeatureRow>,
    names: HashMap<String, NameRow>,
    synonyms: HashMap<String, Vec<SynonymRow>>,
    points: HashMap<String, GeomRow>,
    polygons: HashMap<String, GeomRow>,
}

impl TableSet {
    async fn query(pool: &PgPool, staging_prefix: Option<&str>) -> Result<TableSet> {
        let features = fetch_features(pool, staging_prefix).await?;
        let names = fetch_names(pool, staging_prefix).await?;
        let synonyms = fetch_synonyms(pool, staging_prefix).await?;
        let points = fetch_geometries(pool, "points", "pt_geom", staging_prefix).await?;
        let polygons = fetch_geometries(pool, "polygons", "pl_geom", staging_prefix).await?;

        Ok(TableSet {
            features: keyed(features, "features", |r| compound_key(r.id, r.map_code))?,
            names: keyed(names, "names", |r| compound_key(r.id, r.map_code))?,
            synonyms: grouped(synonyms),
            points: keyed(points, "points", |r| compound_key(r.id, r.map_code))?,
            polygons: keyed(polygons, "polygons", |r| compound_key(r.id, r.map_code))?,
        })
    }

    /// Apply a staging dataset on top of this one. Staging rows replace
    /// production rows with the same key, except synonyms, which append.
    fn apply_staging(&mut self, staging: TableSet) {
        self.features.extend(staging.features);
        self.names.extend(staging.names);
        self.points.extend(staging.points);
        self.polygons.extend(staging.polygons);
        for (key, rows) in staging.synonyms {
            self.synonyms.entry(key).or_default().extend(rows);
        }
    }

    /// Assemble the merged tables into features. The features table defines
    /// the set of compound keys; rows in the other tables that match
    /// nothing there are reported and skipped.
    fn into_features(self) -> Result<Vec<GeocodeFeature>> {
        let mut ordered: Vec<&String> = self.features.keys().collect();
        ordered.sort();

        let mut features: Vec<GeocodeFeature> = Vec::with_capacity(ordered.len());
        let mut by_key: HashMap<String, usize> = HashMap::new();
        for key in ordered {
            let row = &self.features[key];
            by_key.insert(key.clone(), features.len());
            features.push(GeocodeFeature {
                properties: FeatureProperties {
                    id: row.id,
                    map_code: row.map_code,
                    parent_id: row.parent_id,
                    class: row.class,
                    synonyms: Some(Vec::new()),
                    ..Default::default()
                },
                point: None,
                polygon: None,
            });
        }

        for (key, row) in &self.names {
            let Some(&idx) = by_key.get(key) else {
                eprintln!("⚠️ names: no feature record for compound key {key}, skipping row");
                continue;
            };
            let properties = &mut features[idx].properties;
            properties.de_de = row.de_de.clone();
            properties.es_es = row.es_es.clone();
            properties.fr_fr = row.fr_fr.clone();
            properties.ja_jp = row.ja_jp.clone();
            properties.ko_kr = row.ko_kr.clone();
            properties.pt_br = row.pt_br.clone();
            properties.zh_cn = row.zh_cn.clone();
            properties.none = row.none.clone();
            properties.fips = row.fips.clone();
            properties.iso2 = row.iso2.clone();
            properties.iso3 = row.iso3.clone();
        }

        for (key, rows) in &self.synonyms {
            let Some(&idx) = by_key.get(key) else {
                eprintln!("⚠️ synonyms: no feature record for compound key {key}, skipping rows");
                continue;
            };
            let values = features[idx]
                .properties
                .synonyms
                .get_or_insert_with(Vec::new);
            for row in rows {
                match &row.name {
                    Some(name) => values.push(name.clone()),
                    None => eprintln!("⚠️ synonyms: null name for compound key {key}, skipping row"),
                }
            }
        }

        for (key, row) in &self.points {
            let Some(&idx) = by_key.get(key) else {
                eprintln!("⚠️ points: no feature record for compound key {key}, skipping row");
                continue;
            };
            match parse_geometry(row, "points", key)? {
                Some(Geometry::Point(point)) => features[idx].point = Some(point),
                Some(_) => {
                    eprintln!("⚠️ points: compound key {key} carries a non-point geometry, ignoring it")
                }
                None => {}
            }
        }

        for (key, row) in &self.polygons {
            let Some(&idx) = by_key.get(key) else {
                eprintln!("⚠️ polygons: no feature record for compound key {key}, skipping row");
                continue;
            };
            match parse_geometry(row, "polygons", key)? {
                Some(geometry @ (Geometry::Polygon(_) | Geometry::MultiPolygon(_))) => {
                    features[idx].polygon = Some(geometry)
                }
                Some(_) => eprintln!(
                    "⚠️ polygons: compound key {key} carries a non-polygon geometry, ignoring it"
                ),
                None => {}
            }
        }

        Ok(features)
    }
}

fn parse_geometry(row: &GeomRow, table: &str, key: &str) -> Result<Option<Geometry<f64>>> {
    let Some(raw) = &row.geom else {
        eprintln!("⚠️ {table}: null geometry for compound key {key}, skipping row");
        return Ok(None);
    };
    let parsed: geojson::Geometry = serde_json::from_str(raw)
        .with_context(|| format!("{table}: invalid GeoJSON for compound key {key}"))?;
    let geometry = Geometry::<f64>::try_from(parsed.value)
        .with_context(|| format!("{table}: unsupported geometry for compound key {key}"))?;
    Ok(Some(geometry))
}

async fn fetch_features(pool: &PgPool, staging_prefix: Option<&str>) -> Result<Vec<FeatureRow>> {
    let sql = select_sql("id, parent_id, class, map_code", "features", staging_prefix);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .with_context(|| format!("query failed to execute: {sql}"))?;
    rows.into_iter()
        .map(|row| {
            Ok(FeatureRow {
                id: row.try_get("id")?,
                parent_id: row.try_get("parent_id")?,
                class: row.try_get("class")?,
                map_code: row.try_get("map_code")?,
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("while decoding rows from: {sql}"))
}

async fn fetch_names(pool: &PgPool, staging_prefix: Option<&str>) -> Result<Vec<NameRow>> {
    let sql = select_sql(
        "de_de, es_es, fr_fr, ja_jp, ko_kr, pt_br, zh_cn, none, id, map_code, fips, iso2, iso3",
        "names",
        staging_prefix,
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .with_context(|| format!("query failed to execute: {sql}"))?;
    rows.into_iter()
        .map(|row| {
            Ok(NameRow {
                id: row.try_get("id")?,
                map_code: row.try_get("map_code")?,
                de_de: row.try_get("de_de")?,
                es_es: row.try_get("es_es")?,
                fr_fr: row.try_get("fr_fr")?,
                ja_jp: row.try_get("ja_jp")?,
                ko_kr: row.try_get("ko_kr")?,
                pt_br: row.try_get("pt_br")?,
                zh_cn: row.try_get("zh_cn")?,
                none: row.try_get("none")?,
                fips: row.try_get("fips")?,
                iso2: row.try_get("iso2")?,
                iso3: row.try_get("iso3")?,
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("while decoding rows from: {sql}"))
}

async fn fetch_synonyms(pool: &PgPool, staging_prefix: Option<&str>) -> Result<Vec<SynonymRow>> {
    let sql = select_sql("name, map_code, id", "synonyms", staging_prefix);
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .with_context(|| format!("query failed to execute: {sql}"))?;
    rows.into_iter()
        .map(|row| {
            Ok(SynonymRow {
                id: row.try_get("id")?,
                map_code: row.try_get("map_code")?,
                name: row.try_get("name")?,
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("while decoding rows from: {sql}"))
}

async fn fetch_geometries(
    pool: &PgPool,
    table: &str,
    alias: &str,
    staging_prefix: Option<&str>,
) -> Result<Vec<GeomRow>> {
    let sql = select_sql(
        &format!("id, map_code, ST_AsGeoJSON(the_geom) as {alias}"),
        table,
        staging_prefix,
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .with_context(|| format!("query failed to execute: {sql}"))?;
    rows.into_iter()
        .map(|row| {
            Ok(GeomRow {
                id: row.try_get("id")?,
                map_code: row.try_get("map_code")?,
                geom: row.try_get(alias)?,
            })
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("while decoding rows from: {sql}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature_row(id: i32, map_code: i32, class: i32) -> FeatureRow {
        FeatureRow {
            id,
            parent_id: None,
            class,
            map_code,
        }
    }

    fn point_row(id: i32, map_code: i32, x: f64, y: f64) -> GeomRow {
        GeomRow {
            id,
            map_code,
            geom: Some(format!(
                r#"{{"type":"Point","coordinates":[{x},{y}]}}"#
            )),
        }
    }

    #[test]
    fn select_statements_swap_in_staging_tables() {
        assert_eq!(
            select_sql("id, parent_id, class, map_code", "features", None),
            "SELECT id, parent_id, class, map_code FROM features"
        );
        assert_eq!(
            select_sql("name, map_code, id", "synonyms", Some("aug")),
            "SELECT name, map_code, id FROM staging_aug_synonyms"
        );
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let rows = vec![
            feature_row(1, 0, 1),
            feature_row(2, 0, 1),
            feature_row(1, 0, 2),
        ];
        let err = keyed(rows, "features", |r| compound_key(r.id, r.map_code)).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("features"));
        assert!(message.contains("1_0"));
    }

    #[test]
    fn staging_rows_replace_production_except_synonyms() {
        let mut production = TableSet {
            features: keyed(
                vec![feature_row(1, 0, 1), feature_row(2, 0, 1)],
                "features",
                |r| compound_key(r.id, r.map_code),
            )
            .unwrap(),
            synonyms: grouped(vec![SynonymRow {
                id: 1,
                map_code: 0,
                name: Some("Prod".to_string()),
            }]),
            ..Default::default()
        };
        let staging = TableSet {
            features: keyed(vec![feature_row(1, 0, 10)], "features", |r| {
                compound_key(r.id, r.map_code)
            })
            .unwrap(),
            synonyms: grouped(vec![SynonymRow {
                id: 1,
                map_code: 0,
                name: Some("Staged".to_string()),
            }]),
            ..Default::default()
        };

        production.apply_staging(staging);
        assert_eq!(production.features["1_0"].class, 10);
        assert_eq!(production.features["2_0"].class, 1);
        let names: Vec<_> = production.synonyms["1_0"]
            .iter()
            .filter_map(|r| r.name.as_deref())
            .collect();
        assert_eq!(names, vec!["Prod", "Staged"]);
    }

    #[test]
    fn assembles_features_from_all_tables() {
        let tables = TableSet {
            features: keyed(
                vec![feature_row(110, 0, 1)],
                "features",
                |r| compound_key(r.id, r.map_code),
            )
            .unwrap(),
            names: keyed(
                vec![NameRow {
                    id: 110,
                    map_code: 0,
                    de_de: Some("Einhundert".to_string()),
                    es_es: None,
                    fr_fr: None,
                    ja_jp: None,
                    ko_kr: None,
                    pt_br: None,
                    zh_cn: None,
                    none: Some("One Hundred".to_string()),
                    fips: None,
                    iso2: None,
                    iso3: None,
                }],
                "names",
                |r| compound_key(r.id, r.map_code),
            )
            .unwrap(),
            synonyms: grouped(vec![SynonymRow {
                id: 110,
                map_code: 0,
                name: Some("Synonym 110".to_string()),
            }]),
            points: keyed(
                vec![point_row(110, 0, -30.27, -7.7)],
                "points",
                |r| compound_key(r.id, r.map_code),
            )
            .unwrap(),
            polygons: keyed(
                vec![GeomRow {
                    id: 110,
                    map_code: 0,
                    geom: Some(
                        r#"{"type":"MultiPolygon","coordinates":[[[[0,0],[4,0],[4,4],[0,4],[0,0]]]]}"#
                            .to_string(),
                    ),
                }],
                "polygons",
                |r| compound_key(r.id, r.map_code),
            )
            .unwrap(),
        };

        let features = tables.into_features().unwrap();
        assert_eq!(features.len(), 1);
        let feature = &features[0];
        assert_eq!(feature.composite_key(), "110_0");
        assert_eq!(feature.properties.de_de.as_deref(), Some("Einhundert"));
        assert_eq!(feature.properties.none.as_deref(), Some("One Hundred"));
        assert_eq!(
            feature.properties.synonyms,
            Some(vec!["Synonym 110".to_string()])
        );
        assert_eq!(feature.point.unwrap().x(), -30.27);
        assert!(matches!(feature.polygon, Some(Geometry::MultiPolygon(_))));
    }

    #[test]
    fn rows_without_a_feature_record_are_skipped() {
        let tables = TableSet {
            features: keyed(vec![feature_row(1, 0, 1)], "features", |r| {
                compound_key(r.id, r.map_code)
            })
            .unwrap(),
            points: keyed(vec![point_row(999, 0, 1.0, 2.0)], "points", |r| {
                compound_key(r.id, r.map_code)
            })
            .unwrap(),
            ..Default::default()
        };

        let features = tables.into_features().unwrap();
        assert_eq!(features.len(), 1);
        assert!(features[0].point.is_none());
    }

    #[test]
    fn empty_synonym_lists_serialize_as_lists() {
        let tables = TableSet {
            features: keyed(vec![feature_row(1, 0, 1)], "features", |r| {
                compound_key(r.id, r.map_code)
            })
            .unwrap(),
            ..Default::default()
        };

        let features = tables.into_features().unwrap();
        assert_eq!(features[0].properties.synonyms, Some(Vec::new()));
    }
}
