use crate::{
    Config, RawResponse,
    community::CommunityId,
    error::TransportError,
    transport::http::HttpTransport,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod http;

/// The fetch capability the store is built on.
///
/// Implementations report any HTTP status as `Ok`; only failures below HTTP
/// are errors.
#[async_trait]
pub trait RiskTransport: Send + Sync + Debug {
    async fn get_risk(&self, community: CommunityId) -> Result<RawResponse, TransportError>;
}

/// Construct the HTTP transport from config.
pub fn transport_from_config(config: &Config) -> anyhow::Result<HttpTransport> {
    let base_url = config.api_base_url()?;
    HttpTransport::new(base_url, config.timeout())
}
