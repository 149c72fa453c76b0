use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, CACHE_CONTROL, EXPIRES, HeaderMap, HeaderValue, PRAGMA},
};
use tracing::debug;

use crate::{classify::RawResponse, community::CommunityId, error::TransportError};

use super::RiskTransport;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    http: Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .default_headers(no_cache_headers())
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the landslide API")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { base_url, http })
    }

    pub fn url_for(&self, community: CommunityId) -> String {
        format!("{}/landslide/{}", self.base_url, community)
    }
}

fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store, must-revalidate"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn transport_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

#[async_trait]
impl RiskTransport for HttpTransport {
    async fn get_risk(&self, community: CommunityId) -> Result<RawResponse, TransportError> {
        let url = self.url_for(community);
        debug!("Fetching landslide risk: {}", url);

        let res = self.http.get(&url).send().await.map_err(transport_error)?;

        let status = res.status().as_u16();
        let body = res.text().await.map_err(transport_error)?;

        debug!("{} answered {} ({} bytes)", url, status, body.len());

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_strips_trailing_slash() {
        let t = HttpTransport::new("http://localhost:5000/", Duration::from_secs(10)).unwrap();
        assert_eq!(t.url_for(CommunityId::Craig), "http://localhost:5000/landslide/AK91");
    }

    #[test]
    fn requests_defeat_caches() {
        let headers = no_cache_headers();
        assert_eq!(headers[CACHE_CONTROL], "no-cache, no-store, must-revalidate");
        assert_eq!(headers[PRAGMA], "no-cache");
        assert_eq!(headers[EXPIRES], "0");
    }

    #[tokio::test]
    async fn refused_connection_is_a_network_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let t = HttpTransport::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap();
        let err = t.get_risk(CommunityId::Craig).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn silent_server_is_a_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Accept and hold every connection without answering.
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let t = HttpTransport::new(format!("http://{addr}"), Duration::from_millis(50)).unwrap();
        let err = t.get_risk(CommunityId::Kasaan).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout);

        server.abort();
    }
}
