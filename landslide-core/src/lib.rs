//! Core library for the `landslide` risk client.
//!
//! This crate defines:
//! - The community registry (Craig and Kasaan, Alaska)
//! - Freshness checks and error classification for risk API responses
//! - The risk data store that publishes `{data, loading, error}`
//! - Configuration and the HTTP transport
//!
//! It is used by `landslide-cli`, but any presentation layer can drive the
//! store and observe its state.

pub mod classify;
pub mod community;
pub mod config;
pub mod error;
pub mod freshness;
pub mod model;
pub mod store;
pub mod transport;

pub use classify::{FetchOutcome, RawOutcome, RawResponse, classify};
pub use community::{CommunityId, CommunityLocation, MapView, get_community_location};
pub use config::Config;
pub use error::{ErrorCategory, ErrorDescriptor, ServerErrorKind, TransportError, ValidationError};
pub use freshness::{Freshness, FreshnessStatus, classify_freshness, format_elapsed};
pub use model::{RiskLevel, RiskSnapshot, StoreState, get_risk_level_label};
pub use store::{RiskDataStore, Settlement};
pub use transport::{RiskTransport, http::HttpTransport, transport_from_config};
