use crate::config::DataSource;
use crate::models::feature::GeocodeFeature;
use async_trait::async_trait;

pub mod csv;
pub mod postgres;

/// A source of geocoding features. Implementations pull the whole
/// dataset into memory so the checks can cross-reference freely.
#[async_trait]
pub trait FeatureReader: Send + Sync {
    async fn read_features(&self) -> anyhow::Result<Vec<GeocodeFeature>>;
}

pub fn reader_for(source: &DataSource) -> Box<dyn FeatureReader> {
    match source {
        DataSource::Csv { dir } => Box::new(csv::CsvFeatureReader::new(dir.clone())),
        DataSource::Postgres {
            host,
            database,
            user,
            password,
            staging_prefixes,
        } => Box::new(postgres::PostgresFeatureReader::new(
            host.clone(),
            database.clone(),
            user.clone(),
            password.clone(),
            staging_prefixes.clone(),
        )),
    }
}
