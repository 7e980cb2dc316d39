use std::io::Read;
use std::time::Duration;

use flate2::read::GzDecoder;

use crate::data::import::error::ImportError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const DOWNLOAD_TIMEOUT_SECS: u64 = 600;
const REGION_PLACEHOLDER: &str = "{region}";

/// Where the gzip compressed extract of a region comes from.
pub trait AddressSource {
    fn url(&self, region: &str) -> String;

    /// Returns the compressed body for `region`.
    fn fetch(&self, region: &str) -> Result<Vec<u8>, ImportError>;
}

pub struct HttpSource {
    client: reqwest::blocking::Client,
    url_template: String,
}

impl HttpSource {
    pub fn new(url_template: &str) -> Result<Self, ImportError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;

        Ok(HttpSource { client, url_template: url_template.to_owned() })
    }
}

impl AddressSource for HttpSource {
    fn url(&self, region: &str) -> String {
        region_url(&self.url_template, region)
    }

    fn fetch(&self, region: &str) -> Result<Vec<u8>, ImportError> {
        let resp = self.client.get(&self.url(region)).send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ImportError::HttpStatus { region: region.to_owned(), status });
        }

        Ok(resp.bytes()?.to_vec())
    }
}

/// The region code is substituted as is, the remote end decides whether it exists.
pub fn region_url(template: &str, region: &str) -> String {
    template.replace(REGION_PLACEHOLDER, region)
}

pub fn decompress(region: &str, bytes: &[u8]) -> Result<String, ImportError> {
    let mut text = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut text)
        .map_err(|err| ImportError::Decompress(region.to_owned(), err))?;

    Ok(text)
}
