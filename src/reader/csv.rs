use super::FeatureReader;
use crate::models::feature::{FeatureProperties, GeocodeFeature};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use csv::ReaderBuilder;
use geo::{Geometry, point};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use wkt::TryFromWkt;

/// The extract files that make up one geocoding class. Named files carry
/// identity and localised names, LocalData files carry geometry, Synonyms
/// files carry alternate and display names. AreaCode and ZipCode ship
/// without synonyms.
struct ClassFiles {
    class_id: i32,
    named: &'static str,
    local: &'static str,
    synonyms: Option<&'static str>,
}

impl ClassFiles {
    fn files(&self) -> impl Iterator<Item = &'static str> {
        [Some(self.named), Some(self.local), self.synonyms]
            .into_iter()
            .flatten()
    }
}

const FILE_STRUCTURE: &[ClassFiles] = &[
    ClassFiles { class_id: 0, named: "Country.csv", local: "LocalDataCountry.csv", synonyms: Some("CountrySynonyms.csv") },
    ClassFiles { class_id: 1, named: "State.csv", local: "LocalDataState.csv", synonyms: Some("StateSynonyms.csv") },
    ClassFiles { class_id: 2, named: "County.csv", local: "LocalDataCounty.csv", synonyms: Some("CountySynonyms.csv") },
    ClassFiles { class_id: 10, named: "City.csv", local: "LocalDataCity.csv", synonyms: Some("CitySynonyms.csv") },
    ClassFiles { class_id: 100, named: "ZipCode.csv", local: "LocalDataZipCode.csv", synonyms: None },
    ClassFiles { class_id: 101, named: "AreaCode.csv", local: "LocalDataAreaCode.csv", synonyms: None },
    ClassFiles { class_id: 102, named: "CMSA.csv", local: "LocalDataCMSA.csv", synonyms: Some("CMSASynonyms.csv") },
    ClassFiles { class_id: 103, named: "Congress.csv", local: "LocalDataCongress.csv", synonyms: Some("CongressSynonyms.csv") },
];

pub struct CsvFeatureReader {
    dir: PathBuf,
}

impl CsvFeatureReader {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl FeatureReader for CsvFeatureReader {
    async fn read_features(&self) -> Result<Vec<GeocodeFeature>> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || read_directory(&dir)).await?
    }
}

pub fn read_directory(dir: &Path) -> Result<Vec<GeocodeFeature>> {
    // 1) Check every expected file is present before touching any of them
    validate_files(dir)?;

    // 2) Set up the progress bar, one tick per file
    let total_files: u64 = FILE_STRUCTURE
        .iter()
        .map(|class| class.files().count() as u64)
        .sum();
    let pb = ProgressBar::new(total_files);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n[{bar:40.cyan/blue}] {pos}/{len} {percent}%")
            .unwrap()
            .progress_chars("█▇▆▅▄▃▂▁  "),
    );

    // 3) Assemble features class by class
    let mut features = Vec::new();
    for class in FILE_STRUCTURE {
        features.extend(read_class(dir, class, &pb)?);
    }

    pb.finish_with_message("✅ All geocoding CSVs loaded!");
    println!("📦 Total features: {}", features.len());
    Ok(features)
}

fn validate_files(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("CSV directory {} does not exist", dir.display());
    }

    let present: HashSet<String> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();

    let missing: Vec<&str> = FILE_STRUCTURE
        .iter()
        .flat_map(ClassFiles::files)
        .filter(|file| !present.contains(*file))
        .collect();

    if !missing.is_empty() {
        bail!(
            "missing expected CSV files in {}: {}",
            dir.display(),
            missing.join(", ")
        );
    }
    Ok(())
}

/// Read one pipe-delimited extract file into header-keyed rows. The files
/// are written without quoting, so embedded quotes pass through verbatim.
fn read_rows(path: &Path) -> Result<Vec<HashMap<String, String>>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'|')
        .quoting(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("failed to read {}", path.display()))?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn required<'a>(row: &'a HashMap<String, String>, column: &str, file: &str) -> Result<&'a str> {
    row.get(column)
        .map(String::as_str)
        .with_context(|| format!("{file}: row is missing expected column '{column}'"))
}

/// Compound key of a LocalData or Synonyms row. In those files the column
/// holding the feature's own id is called `ParentID`.
fn row_key(row: &HashMap<String, String>, file: &str) -> Result<Option<String>> {
    let id = required(row, "ParentID", file)?;
    let map_code = required(row, "MapCode", file)?;
    match (id.parse::<i32>(), map_code.parse::<i32>()) {
        (Ok(id), Ok(map_code)) => Ok(Some(format!("{id}_{map_code}"))),
        _ => {
            eprintln!("⚠️ {file}: unparseable compound key '{id}_{map_code}', skipping row");
            Ok(None)
        }
    }
}

fn assign_locale(properties: &mut FeatureProperties, locale: &str, name: String) -> bool {
    let slot = match locale {
        "de_de" => &mut properties.de_de,
        "en_us" => &mut properties.en_us,
        "es_es" => &mut properties.es_es,
        "fr_fr" => &mut properties.fr_fr,
        "ja_jp" => &mut properties.ja_jp,
        "ko_kr" => &mut properties.ko_kr,
        "pt_br" => &mut properties.pt_br,
        "zh_cn" => &mut properties.zh_cn,
        "none" => &mut properties.none,
        _ => return false,
    };
    *slot = Some(name);
    true
}

fn read_class(dir: &Path, class: &ClassFiles, pb: &ProgressBar) -> Result<Vec<GeocodeFeature>> {
    // Named file first, it defines the set of compound keys for the class
    pb.set_message(format!("Reading {:<30}", class.named));
    let named_rows = read_rows(&dir.join(class.named))?;
    pb.inc(1);

    let mut features: Vec<GeocodeFeature> = Vec::with_capacity(named_rows.len());
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for row in named_rows {
        let id: i32 = required(&row, "ID", class.named)?
            .parse()
            .with_context(|| format!("{}: 'ID' is not an integer", class.named))?;
        let map_code: i32 = required(&row, "MapCode", class.named)?
            .parse()
            .with_context(|| format!("{}: 'MapCode' is not an integer", class.named))?;
        // Empty or unparseable parents are treated as absent
        let parent_id = row
            .get("ParentID")
            .and_then(|value| value.parse::<i32>().ok());

        let mut properties = FeatureProperties {
            id,
            map_code,
            parent_id,
            class: class.class_id,
            ..Default::default()
        };
        // Most named files carry the unlocalised name in a `Name` column
        properties.none = row.get("Name").cloned();
        // Country.csv carries extra identity columns
        if let Some(fips) = row.get("FIPS") {
            properties.fips = Some(fips.clone());
            properties.iso2 = row.get("ISO3166_2").cloned();
            properties.iso3 = row.get("ISO3166_3").cloned();
        }

        let key = properties.composite_key();
        if by_key.contains_key(&key) {
            eprintln!(
                "⚠️ {}: record already exists with the compound primary key {key}, keeping the first",
                class.named
            );
            continue;
        }
        by_key.insert(key, features.len());
        features.push(GeocodeFeature {
            properties,
            point: None,
            polygon: None,
        });
    }

    // Geometry file: a WKT polygon column (literal "None" when absent) plus
    // a point as Longitude/Latitude
    pb.set_message(format!("Reading {:<30}", class.local));
    let local_rows = read_rows(&dir.join(class.local))?;
    pb.inc(1);

    for row in local_rows {
        let Some(key) = row_key(&row, class.local)? else {
            continue;
        };
        let Some(&idx) = by_key.get(&key) else {
            eprintln!(
                "⚠️ {}: no named record for compound key {key}, skipping row",
                class.local
            );
            continue;
        };
        let feature = &mut features[idx];

        if let Some(raw) = row.get("Geometry")
            && raw != "None"
            && !raw.is_empty()
        {
            let geometry = Geometry::<f64>::try_from_wkt_str(raw)
                .map_err(|err| anyhow!("{}: invalid WKT for {key}: {err}", class.local))?;
            match geometry {
                Geometry::Polygon(_) | Geometry::MultiPolygon(_) => {
                    feature.polygon = Some(geometry)
                }
                _ => eprintln!(
                    "⚠️ {}: compound key {key} carries a non-polygon geometry, ignoring it",
                    class.local
                ),
            }
        }

        let lon: f64 = required(&row, "Longitude", class.local)?
            .parse()
            .with_context(|| format!("{}: 'Longitude' is not a number", class.local))?;
        let lat: f64 = required(&row, "Latitude", class.local)?
            .parse()
            .with_context(|| format!("{}: 'Latitude' is not a number", class.local))?;
        feature.point = Some(point!(x: lon, y: lat));
    }

    // Synonyms file, where present: display names route to locale columns,
    // everything else appends to the synonym list
    if let Some(synonyms_file) = class.synonyms {
        pb.set_message(format!("Reading {:<30}", synonyms_file));
        let synonym_rows = read_rows(&dir.join(synonyms_file))?;
        pb.inc(1);

        for row in synonym_rows {
            let Some(key) = row_key(&row, synonyms_file)? else {
                continue;
            };
            let Some(&idx) = by_key.get(&key) else {
                eprintln!(
                    "⚠️ {}: no named record for compound key {key}, skipping row",
                    synonyms_file
                );
                continue;
            };
            let properties = &mut features[idx].properties;
            let name = required(&row, "Name", synonyms_file)?.to_string();

            if row.get("IsDisplayName").map(String::as_str) == Some("1") {
                let locale = required(&row, "Locale", synonyms_file)?.to_lowercase();
                if !assign_locale(properties, &locale, name) {
                    eprintln!(
                        "⚠️ {}: unknown locale '{locale}' for compound key {key}, skipping row",
                        synonyms_file
                    );
                }
            } else {
                properties.synonyms.get_or_insert_with(Vec::new).push(name);
            }
        }
    }

    Ok(features)
}
