use crate::config::{Config, DataSource};
use crate::endpoints::handlers::{
    invalid_shape_handler, null_island_handler, overlapping_polygons_handler,
    point_in_polygon_handler, polygon_within_parent_handler, webmap_handler, wgs84_point_handler,
};
use crate::models::feature::Dataset;
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

pub struct AppState {
    pub cache: moka::future::Cache<DataSource, Arc<Dataset>>,
}

pub struct ValidationServer {
    config: Config,
}

impl ValidationServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn start(self) -> anyhow::Result<()> {
        let cache = moka::future::Cache::builder()
            .max_capacity(self.config.cache_capacity)
            .time_to_live(self.config.cache_ttl)
            .build();
        let state = Arc::new(AppState { cache });

        let app: Router = Router::new()
            .route("/", get(webmap_handler))
            .route("/geocoding/testinvalidShape", get(invalid_shape_handler))
            .route(
                "/geocoding/testoverlappingpolygons",
                get(overlapping_polygons_handler),
            )
            .route("/geocoding/testpointinpolygon", get(point_in_polygon_handler))
            .route("/geocoding/testwgs84point", get(wgs84_point_handler))
            .route("/geocoding/testnullisland", get(null_island_handler))
            .route(
                "/geocoding/testpolygonwithinparent",
                get(polygon_within_parent_handler),
            )
            .layer(CompressionLayer::new())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

        println!(
            r#"
    🚀 GeoVet serving on {addr}

    🧪 Dashboard for vetting a geocoding dataset on a map
       → http://{addr}/

    📍 Validation endpoints (GET, data source in the query string)
       → http://{addr}/geocoding/testinvalidShape
       → http://{addr}/geocoding/testoverlappingpolygons
       → http://{addr}/geocoding/testpointinpolygon
       → http://{addr}/geocoding/testwgs84point
       → http://{addr}/geocoding/testnullisland
       → http://{addr}/geocoding/testpolygonwithinparent
            "#
        );

        axum::serve(listener, app).await.unwrap();

        Ok(())
    }
}
