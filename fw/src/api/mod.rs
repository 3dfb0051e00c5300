//! Torn API access
//!
//! The [`TornApi`] trait is the seam between the refresh pipeline and the
//! remote data source; [`TornClient`] is the HTTP implementation.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod torn;
mod types;

pub use client::TornApi;
pub use error::ApiError;
pub use torn::TornClient;
pub use types::{ApiRequest, EntityType, FACTION_SELECTIONS, USER_SELECTIONS, reject_on_error_field};

use crate::config::ApiConfig;

/// Create the HTTP API client from config
pub fn create_client(config: &ApiConfig) -> Result<Arc<dyn TornApi>, ApiError> {
    debug!(base_url = %config.base_url, "create_client: called");
    Ok(Arc::new(TornClient::from_config(config)?))
}
