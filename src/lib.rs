pub mod checks;
pub mod config;
pub mod endpoints;
pub mod models;
pub mod reader;
pub mod utils;

pub use config::{Cli, Config, DataSource};
pub use endpoints::server::ValidationServer;
