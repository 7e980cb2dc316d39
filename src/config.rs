use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_REGION: &str = "67";
pub const BATCH_SIZE: usize = 10_000;

const DEFAULT_SOURCE_URL: &str =
    "https://adresse.data.gouv.fr/data/ban/adresses/latest/csv/adresses-{region}.csv.gz";

#[derive(Debug, Clone)]
pub struct Config {
    pub regions: Vec<String>,
    pub output_path: PathBuf,
    /// Download URL with a `{region}` placeholder
    pub source_url_template: String,
    pub batch_size: usize,
}

impl Config {
    /// `BAN_SOURCE_URL` and `ADDRESSES_DB_PATH` override the defaults.
    pub fn from_env(regions: Vec<String>) -> Self {
        let source_url_template = env::var("BAN_SOURCE_URL")
            .unwrap_or_else(|_| DEFAULT_SOURCE_URL.to_owned());

        let output_path = env::var("ADDRESSES_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_output_path());

        Config::new(regions, output_path, source_url_template)
    }

    pub fn new(regions: Vec<String>, output_path: PathBuf, source_url_template: String) -> Self {
        let regions = if regions.is_empty() {
            vec![DEFAULT_REGION.to_owned()]
        } else {
            regions
        };

        Config {
            regions,
            output_path,
            source_url_template,
            batch_size: BATCH_SIZE,
        }
    }
}

/// `resources/addresses.db` next to the crate, where the search feature looks for it.
pub fn default_output_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("resources")
        .join("addresses.db")
}
