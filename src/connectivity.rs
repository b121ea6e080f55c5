//! Connectivity probe
//!
//! One-shot, time-bounded liveness check against the service root.

use std::time::Duration;

use serde::Serialize;

use crate::api::ApiClient;
use crate::error::{ErrorSource, RequestError};
use crate::{log_info, log_warn};

const MODULE: &str = "connectivity";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityStatus {
    Checking,
    Connected,
    Disconnected,
}

/// Probe the service once. Never retries.
pub async fn probe(client: &ApiClient, timeout: Duration) -> Result<(), RequestError> {
    log_info!(MODULE, "Checking service at {}", client.base_url());

    match client.ping(timeout).await {
        Ok(status) => {
            log_info!(MODULE, "Service reachable (HTTP {})", status);
            Ok(())
        }
        Err(e) => {
            log_warn!(MODULE, "Service unreachable: {}", e);
            Err(RequestError::new(ErrorSource::Connectivity, e.to_string()))
        }
    }
}
