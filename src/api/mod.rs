//! Prediction service client
//!
//! Thin HTTP layer over the four service endpoints. Callers decide how
//! failures are presented; this module only reports what happened.

mod models;

pub use models::{
    CategoricalField, EstimatedFeatures, InputEcho, OptionSet, PredictionRequest,
    PredictionResponse, PredictionResult, ServiceErrorBody,
};

use std::fmt;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};

use crate::config;
use crate::{log_debug, log_error, log_info};

const MODULE: &str = "api";

/// Failure talking to the service
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connect failure, timeout or undecodable body
    Transport(String),
    /// Service answered with a failure; `message` is its `error` field if any
    Service { status: u16, message: Option<String> },
}

impl ApiError {
    /// Human-readable message reported by the service, if there was one
    pub fn service_message(&self) -> Option<&str> {
        match self {
            ApiError::Service { message, .. } => message.as_deref(),
            ApiError::Transport(_) => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(e) => write!(f, "{}", e),
            ApiError::Service { status, message } => match message {
                Some(m) => write!(f, "Service returned {}: {}", status, m),
                None => write!(f, "Service returned {}", status),
            },
        }
    }
}

impl std::error::Error for ApiError {}

/// Multi-part image prediction payload
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    pub brand: String,
    pub fuel_type: String,
    pub transmission: String,
    pub has_accident: u8,
    pub is_clean_title: u8,
}

/// Client bound to one service root
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let http = Client::builder()
            .user_agent(config::app::USER_AGENT)
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET the service root. Any success status counts as alive.
    pub async fn ping(&self, timeout: Duration) -> Result<u16, ApiError> {
        let url = self.url(config::urls::ROOT);
        log_debug!(MODULE, "Liveness check: GET {} ({:?})", url, timeout);

        let response = send(self.http.get(&url).timeout(timeout)).await?;
        let status = response.status();
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(ApiError::Service {
                status: status.as_u16(),
                message: None,
            })
        }
    }

    /// Fetch the categorical option sets
    pub async fn get_options(&self, timeout: Option<Duration>) -> Result<OptionSet, ApiError> {
        let url = self.url(config::urls::GET_OPTIONS);
        log_info!(MODULE, "Fetching options from {}", url);

        let mut request = self.http.get(&url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = send(request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(service_error(response).await);
        }

        response.json::<OptionSet>().await.map_err(|e| {
            log_error!(MODULE, "Failed to parse options: {}", e);
            ApiError::Transport(format!("Failed to parse options: {}", e))
        })
    }

    /// POST a structured prediction request
    pub async fn predict(
        &self,
        request: &PredictionRequest,
        timeout: Duration,
    ) -> Result<PredictionResponse, ApiError> {
        let url = self.url(config::urls::PREDICT);
        log_info!(MODULE, "POST {} (brand: {})", url, request.brand);

        let response = send(self.http.post(&url).json(request).timeout(timeout)).await?;
        read_prediction(response).await
    }

    /// POST an image with its metadata as multipart form data
    pub async fn predict_image(
        &self,
        upload: ImageUpload,
        timeout: Duration,
    ) -> Result<PredictionResponse, ApiError> {
        let url = self.url(config::urls::PREDICT_IMAGE);
        log_info!(
            MODULE,
            "POST {} ({}, {} bytes, brand: {})",
            url,
            upload.filename,
            upload.bytes.len(),
            upload.brand
        );

        let part = Part::bytes(upload.bytes)
            .file_name(upload.filename)
            .mime_str(&upload.mime_type)
            .map_err(|e| ApiError::Transport(format!("Invalid MIME type: {}", e)))?;

        let form = Form::new()
            .part("image", part)
            .text("brand", upload.brand)
            .text("fuel_type", upload.fuel_type)
            .text("transmission", upload.transmission)
            .text("has_accident", upload.has_accident.to_string())
            .text("is_clean_title", upload.is_clean_title.to_string());

        let response = send(self.http.post(&url).multipart(form).timeout(timeout)).await?;
        read_prediction(response).await
    }
}

async fn send(request: RequestBuilder) -> Result<Response, ApiError> {
    request.send().await.map_err(|e| {
        if e.is_timeout() {
            ApiError::Transport(format!("Request timed out: {}", e))
        } else {
            ApiError::Transport(format!("Request failed: {}", e))
        }
    })
}

async fn service_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let message = response
        .json::<ServiceErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error);
    ApiError::Service { status, message }
}

async fn read_prediction(response: Response) -> Result<PredictionResponse, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(service_error(response).await);
    }

    let body: PredictionResponse = response
        .json()
        .await
        .map_err(|e| ApiError::Transport(format!("Failed to parse response: {}", e)))?;

    if body.success == Some(false) {
        return Err(ApiError::Service {
            status: status.as_u16(),
            message: body.error,
        });
    }
    Ok(body)
}
