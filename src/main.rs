use clap::Parser;
use geovet::{Cli, Config, ValidationServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: Config = Cli::parse().into();
    let server = ValidationServer::new(config);
    server.start().await
}
