use std::path::PathBuf;

use reqwest::Client;
use thiserror::Error;
use tokio::fs;
use tracing::debug;

use crate::records::{RecordError, VaccinationRecord, decode_records};

/// Where the time-series feed comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSource {
    Http(String),
    File(PathBuf),
}

impl FeedSource {
    /// `http://` and `https://` locations are fetched, anything else is read
    /// from disk.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            FeedSource::Http(location.to_owned())
        } else {
            FeedSource::File(PathBuf::from(location))
        }
    }
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid feed: {0}")]
    Decode(#[from] RecordError),
}

/// Fetches and validates the vaccination time series.
pub struct FeedClient {
    client: Client,
    source: FeedSource,
}

impl FeedClient {
    pub fn new(source: FeedSource) -> Self {
        Self {
            client: Client::new(),
            source,
        }
    }

    pub fn source(&self) -> &FeedSource {
        &self.source
    }

    pub async fn fetch(&self) -> Result<Vec<VaccinationRecord>, FeedError> {
        let body = match &self.source {
            FeedSource::Http(url) => self.fetch_http(url).await?,
            FeedSource::File(path) => fs::read(path).await.map_err(|source| FeedError::Read {
                path: path.display().to_string(),
                source,
            })?,
        };
        debug!(bytes = body.len(), source = ?self.source, "Fetched feed");
        Ok(decode_records(&body)?)
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, FeedError> {
        let request_error = |source| FeedError::Request {
            url: url.to_owned(),
            source,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(request_error)?
            .error_for_status()
            .map_err(request_error)?;
        let bytes = response.bytes().await.map_err(request_error)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urls_and_paths() {
        assert_eq!(
            FeedSource::parse("https://nagi-p.com/vaccination/prefecture.json"),
            FeedSource::Http("https://nagi-p.com/vaccination/prefecture.json".to_owned())
        );
        assert_eq!(
            FeedSource::parse("data/prefecture.json"),
            FeedSource::File(PathBuf::from("data/prefecture.json"))
        );
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let client = FeedClient::new(FeedSource::File(PathBuf::from(
            "/nonexistent/vaccination-feed.json",
        )));
        assert!(matches!(client.fetch().await, Err(FeedError::Read { .. })));
    }
}
