use crate::checks;
use crate::config::DataSource;
use crate::endpoints::map::INDEX_HTML;
use crate::endpoints::server::AppState;
use crate::models::feature::Dataset;
use crate::reader::reader_for;
use crate::utils::status::print_dataset_summary;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Source selection as sent by the dashboard's connection form. Everything
/// is optional at the wire level; `into_source` decides what is actually
/// required for the chosen input type.
#[derive(Debug, Deserialize)]
pub struct SourceParams {
    input_type: Option<String>,
    path_to_csv: Option<String>,
    host: Option<String>,
    database: Option<String>,
    user: Option<String>,
    password: Option<String>,
    staging_prefix: Option<String>,
}

impl SourceParams {
    fn into_source(self) -> Result<DataSource, String> {
        match self.input_type.as_deref() {
            Some("csv") => {
                let Some(dir) = self.path_to_csv.filter(|p| !p.is_empty()) else {
                    return Err("path_to_csv is required when input_type is csv".to_string());
                };
                Ok(DataSource::Csv {
                    dir: PathBuf::from(dir),
                })
            }
            Some("postgres") => {
                let staging_prefixes = self
                    .staging_prefix
                    .as_deref()
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok(DataSource::Postgres {
                    host: required(self.host, "host")?,
                    database: required(self.database, "database")?,
                    user: required(self.user, "user")?,
                    password: required(self.password, "password")?,
                    staging_prefixes,
                })
            }
            Some(other) => Err(format!(
                "unknown input_type '{other}', expected csv or postgres"
            )),
            None => Err("input_type is required".to_string()),
        }
    }
}

fn required(field: Option<String>, name: &str) -> Result<String, String> {
    field
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("{name} is required when input_type is postgres"))
}

/// Loads a dataset through the cache. Concurrent requests for the same
/// source share one read; errors are not cached, so a failed load is retried
/// on the next click.
async fn load_dataset(state: &AppState, source: DataSource) -> anyhow::Result<Arc<Dataset>> {
    state
        .cache
        .try_get_with(source.clone(), async {
            println!("🔍 Loading dataset from {}", source.describe());
            let features = reader_for(&source).read_features().await?;
            print_dataset_summary(&features);
            Ok(Arc::new(Dataset::index(features)))
        })
        .await
        .map_err(|e: Arc<anyhow::Error>| anyhow::anyhow!("{e:#}"))
}

async fn run_check<F>(state: Arc<AppState>, params: SourceParams, check: F) -> Response
where
    F: FnOnce(&Dataset) -> checks::FailureMap,
{
    let source = match params.into_source() {
        Ok(source) => source,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };
    match load_dataset(&state, source).await {
        Ok(dataset) => (StatusCode::OK, Json(check(&dataset))).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")).into_response(),
    }
}

pub async fn webmap_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

pub async fn invalid_shape_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SourceParams>,
) -> impl IntoResponse {
    run_check(state, params, |dataset| {
        checks::shape::invalid_shapes(&dataset.features)
    })
    .await
}

pub async fn overlapping_polygons_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SourceParams>,
) -> impl IntoResponse {
    run_check(state, params, |dataset| {
        checks::overlap::overlapping_polygons(&dataset.features)
    })
    .await
}

pub async fn point_in_polygon_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SourceParams>,
) -> impl IntoResponse {
    run_check(state, params, |dataset| {
        checks::containment::points_outside_polygons(&dataset.features)
    })
    .await
}

pub async fn wgs84_point_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SourceParams>,
) -> impl IntoResponse {
    run_check(state, params, |dataset| {
        checks::points::points_outside_world(&dataset.features)
    })
    .await
}

pub async fn null_island_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SourceParams>,
) -> impl IntoResponse {
    run_check(state, params, |dataset| {
        checks::points::points_on_null_island(&dataset.features)
    })
    .await
}

pub async fn polygon_within_parent_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SourceParams>,
) -> impl IntoResponse {
    run_check(state, params, checks::containment::polygons_outside_parents).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty() -> SourceParams {
        SourceParams {
            input_type: None,
            path_to_csv: None,
            host: None,
            database: None,
            user: None,
            password: None,
            staging_prefix: None,
        }
    }

    fn postgres() -> SourceParams {
        SourceParams {
            input_type: Some("postgres".to_string()),
            host: Some("pg".to_string()),
            database: Some("geo".to_string()),
            user: Some("qa".to_string()),
            password: Some("pw".to_string()),
            ..empty()
        }
    }

    #[test]
    fn csv_source_requires_a_path() {
        let mut params = empty();
        params.input_type = Some("csv".to_string());
        let err = params.into_source().unwrap_err();
        assert!(err.contains("path_to_csv"));

        let mut params = empty();
        params.input_type = Some("csv".to_string());
        params.path_to_csv = Some("/data/geo".to_string());
        let source = params.into_source().expect("valid csv params");
        assert_eq!(
            source,
            DataSource::Csv {
                dir: PathBuf::from("/data/geo")
            }
        );
    }

    #[test]
    fn postgres_source_splits_staging_prefixes() {
        let mut params = postgres();
        params.staging_prefix = Some(" aug, sep ,".to_string());
        match params.into_source().expect("valid postgres params") {
            DataSource::Postgres {
                staging_prefixes, ..
            } => assert_eq!(staging_prefixes, vec!["aug", "sep"]),
            other => panic!("expected postgres source, got {other:?}"),
        }

        match postgres().into_source().expect("valid postgres params") {
            DataSource::Postgres {
                staging_prefixes, ..
            } => assert!(staging_prefixes.is_empty()),
            other => panic!("expected postgres source, got {other:?}"),
        }
    }

    #[test]
    fn postgres_source_requires_connection_fields() {
        let mut params = postgres();
        params.database = None;
        let err = params.into_source().unwrap_err();
        assert!(err.contains("database"));
    }

    #[test]
    fn unknown_input_type_is_rejected() {
        let mut params = empty();
        params.input_type = Some("sqlite".to_string());
        let err = params.into_source().unwrap_err();
        assert!(err.contains("sqlite"));
        assert!(empty().into_source().is_err());
    }
}
