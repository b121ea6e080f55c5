//! Prediction request dispatcher
//!
//! Sends either a structured request or an image with its metadata, and
//! turns the service's answer into a [`PredictionResult`] or a
//! [`RequestError`]. Loading and result bookkeeping belong to the state
//! machine; this module only performs one request per call.

use std::time::Duration;

use crate::api::{
    ApiClient, ApiError, InputEcho, PredictionRequest, PredictionResponse, PredictionResult,
    ImageUpload,
};
use crate::config::Settings;
use crate::error::{ErrorSource, RequestError};
use crate::form::ImageMetadata;
use crate::image::ImageAsset;
use crate::utils::format_thousands;
use crate::{log_error, log_info};

const MODULE: &str = "dispatch";

pub const STRUCTURED_FALLBACK_MESSAGE: &str = "Failed to predict price";
pub const IMAGE_FALLBACK_MESSAGE: &str = "Failed to predict from image";
pub const MISSING_IMAGE_MESSAGE: &str = "Please select an image";

#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: ApiClient,
    predict_timeout: Duration,
    image_predict_timeout: Duration,
}

impl Dispatcher {
    pub fn new(client: ApiClient, settings: &Settings) -> Self {
        Self {
            client,
            predict_timeout: settings.predict_timeout,
            image_predict_timeout: settings.image_predict_timeout,
        }
    }

    /// POST the full structured request
    pub async fn submit_structured(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, RequestError> {
        log_info!(MODULE, "Submitting structured prediction for {}", request.brand);

        let response = self
            .client
            .predict(request, self.predict_timeout)
            .await
            .map_err(|e| {
                to_request_error(e, ErrorSource::StructuredSubmit, STRUCTURED_FALLBACK_MESSAGE)
            })?;

        let fallback_echo = InputEcho {
            brand: Some(request.brand.clone()),
            model_year: Some(request.model_year),
            mileage: Some(request.mileage as f64),
            fuel_type: Some(request.fuel_type.clone()),
            transmission: Some(request.transmission.clone()),
            car_age: None,
            has_accident: Some(request.has_accident),
            horsepower: Some(request.horsepower),
        };

        into_result(
            response,
            fallback_echo,
            ErrorSource::StructuredSubmit,
            STRUCTURED_FALLBACK_MESSAGE,
        )
    }

    /// POST an image and its metadata. Without an asset nothing is sent.
    pub async fn submit_image(
        &self,
        asset: Option<&ImageAsset>,
        metadata: &ImageMetadata,
    ) -> Result<PredictionResult, RequestError> {
        let asset = asset
            .ok_or_else(|| RequestError::new(ErrorSource::ImageSubmit, MISSING_IMAGE_MESSAGE))?;
        let file = &asset.file;

        log_info!(
            MODULE,
            "Submitting image prediction: {} ({})",
            file.filename,
            file.mime_type
        );

        // Only the bytes that passed validation are ever uploaded.
        let bytes = asset.bytes.clone().ok_or_else(|| {
            log_error!(MODULE, "No readable bytes for {}", file.filename);
            RequestError::new(ErrorSource::ImageSubmit, crate::image::READ_FAILURE_MESSAGE)
        })?;

        let upload = ImageUpload {
            bytes,
            filename: file.filename.clone(),
            mime_type: file.mime_type.clone(),
            brand: metadata.brand.clone(),
            fuel_type: metadata.fuel_type.clone(),
            transmission: metadata.transmission.clone(),
            has_accident: metadata.has_accident,
            is_clean_title: metadata.is_clean_title,
        };

        let response = self
            .client
            .predict_image(upload, self.image_predict_timeout)
            .await
            .map_err(|e| to_request_error(e, ErrorSource::ImageSubmit, IMAGE_FALLBACK_MESSAGE))?;

        // The image endpoint reports estimates instead of an echo.
        let estimated = response.estimated_features.clone().unwrap_or_default();
        let fallback_echo = InputEcho {
            brand: Some(metadata.brand.clone()),
            model_year: estimated.model_year,
            mileage: estimated.mileage,
            fuel_type: Some(metadata.fuel_type.clone()),
            transmission: Some(metadata.transmission.clone()),
            car_age: None,
            has_accident: Some(metadata.has_accident),
            horsepower: estimated.horsepower,
        };

        into_result(
            response,
            fallback_echo,
            ErrorSource::ImageSubmit,
            IMAGE_FALLBACK_MESSAGE,
        )
    }
}

fn to_request_error(error: ApiError, source: ErrorSource, fallback: &str) -> RequestError {
    log_error!(MODULE, "Prediction failed ({}): {}", source, error);
    let message = error.service_message().unwrap_or(fallback);
    RequestError::new(source, message)
}

fn into_result(
    response: PredictionResponse,
    fallback_echo: InputEcho,
    source: ErrorSource,
    fallback: &str,
) -> Result<PredictionResult, RequestError> {
    let formatted = response
        .predicted_price_formatted
        .or_else(|| response.predicted_price.map(format_thousands));

    let Some(predicted_price_formatted) = formatted else {
        log_error!(MODULE, "Prediction response carried no price ({})", source);
        return Err(RequestError::new(source, fallback));
    };

    log_info!(MODULE, "Prediction succeeded: {}", predicted_price_formatted);

    Ok(PredictionResult {
        predicted_price_formatted,
        predicted_price: response.predicted_price,
        input_data: response.input_data.unwrap_or(fallback_echo),
        estimated_features: response.estimated_features,
        message: response.message,
    })
}
