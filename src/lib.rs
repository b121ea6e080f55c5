//! Car Price Client - predict used car prices from vehicle attributes or a photo
//!
//! Client-side orchestration for a remote prediction service: connectivity
//! check, option loading, form and image input, and the two submission
//! pipelines, all driven by [`state::AppState`].

pub mod api;
pub mod commands;
pub mod config;
pub mod connectivity;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod image;
pub mod logging;
pub mod options;
pub mod render;
pub mod state;
pub mod utils;

pub use api::{OptionSet, PredictionRequest, PredictionResult};
pub use config::Settings;
pub use connectivity::ConnectivityStatus;
pub use error::{ErrorSource, RequestError};
pub use form::{FormField, FormInput};
pub use image::{ImageAsset, SelectedFile};
pub use state::{AppState, Pipeline, Screen, Snapshot, SubmissionState};
