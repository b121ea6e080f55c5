//! Options loader
//!
//! Fetches the categorical option sets once the service is reachable.

use std::time::Duration;

use crate::api::{ApiClient, OptionSet};
use crate::error::{ErrorSource, RequestError};
use crate::{log_error, log_info, log_warn};

const MODULE: &str = "options";

/// Fetch the option sets. There is no retry here; the caller keeps the
/// form blocked until a set is available.
pub async fn load(client: &ApiClient, timeout: Option<Duration>) -> Result<OptionSet, RequestError> {
    let options = client.get_options(timeout).await.map_err(|e| {
        log_error!(MODULE, "Failed to fetch options: {}", e);
        RequestError::new(
            ErrorSource::Options,
            e.service_message()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Failed to load options: {}", e)),
        )
    })?;

    for (name, values) in options.as_map() {
        if values.is_empty() {
            log_warn!(MODULE, "Service returned no values for {}", name);
        } else {
            log_info!(MODULE, "Loaded {} values for {}", values.len(), name);
        }
    }

    Ok(options)
}
