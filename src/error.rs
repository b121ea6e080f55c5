//! User-visible request errors

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which step of the flow produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorSource {
    Connectivity,
    Options,
    Validation,
    StructuredSubmit,
    ImageSubmit,
}

impl ErrorSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSource::Connectivity => "connectivity",
            ErrorSource::Options => "options",
            ErrorSource::Validation => "validation",
            ErrorSource::StructuredSubmit => "structured-submit",
            ErrorSource::ImageSubmit => "image-submit",
        }
    }
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error shown to the user, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestError {
    pub message: String,
    pub source: ErrorSource,
}

impl RequestError {
    pub fn new(source: ErrorSource, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorSource::Validation, message)
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RequestError {}
