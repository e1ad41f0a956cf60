use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Where a dataset comes from. Built per request from the dashboard's
/// connection form; also the cache key for loaded datasets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSource {
    Csv {
        dir: PathBuf,
    },
    Postgres {
        host: String,
        database: String,
        user: String,
        password: String,
        staging_prefixes: Vec<String>,
    },
}

impl DataSource {
    /// Short description for console output. Never includes credentials.
    pub fn describe(&self) -> String {
        match self {
            DataSource::Csv { dir } => format!("csv:{}", dir.display()),
            DataSource::Postgres {
                host,
                database,
                staging_prefixes,
                ..
            } => {
                if staging_prefixes.is_empty() {
                    format!("postgres:{host}/{database}")
                } else {
                    format!(
                        "postgres:{host}/{database} (+staging {})",
                        staging_prefixes.join(",")
                    )
                }
            }
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "geovet", version, about = "Map dashboard for vetting geocoding datasets")]
pub struct Cli {
    /// Port to serve on
    #[arg(long, default_value_t = 8000)]
    pub port: u16,

    /// Seconds a loaded dataset stays cached between test runs
    #[arg(long, default_value_t = 300)]
    pub cache_ttl: u64,

    /// Maximum number of datasets held in the cache at once
    #[arg(long, default_value_t = 4)]
    pub cache_capacity: u64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8000,
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 4,
        }
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Config {
            port: cli.port,
            cache_ttl: Duration::from_secs(cli.cache_ttl),
            cache_capacity: cli.cache_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_hides_credentials() {
        let source = DataSource::Postgres {
            host: "pgsqlgis-repos".to_string(),
            database: "pg_geocoding".to_string(),
            user: "qa".to_string(),
            password: "hunter2".to_string(),
            staging_prefixes: vec!["aug".to_string()],
        };
        let text = source.describe();
        assert!(text.contains("pgsqlgis-repos/pg_geocoding"));
        assert!(text.contains("aug"));
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("qa"));
    }

    #[test]
    fn cli_defaults_match_config_default() {
        let config: Config = Cli::parse_from(["geovet"]).into();
        let default = Config::default();
        assert_eq!(config.port, default.port);
        assert_eq!(config.cache_ttl, default.cache_ttl);
        assert_eq!(config.cache_capacity, default.cache_capacity);
    }
}
