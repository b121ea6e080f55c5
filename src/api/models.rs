//! Wire models
//!
//! Types exchanged with the prediction service.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Categorical fields whose allowed values come from the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    Brand,
    FuelType,
    Transmission,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::Brand,
        CategoricalField::FuelType,
        CategoricalField::Transmission,
    ];

    /// Field name as used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalField::Brand => "brand",
            CategoricalField::FuelType => "fuel_type",
            CategoricalField::Transmission => "transmission",
        }
    }
}

/// Allowed values per categorical field, as returned by `/get_options`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    pub brands: Vec<String>,
    pub fuel_types: Vec<String>,
    pub transmissions: Vec<String>,
}

impl OptionSet {
    pub fn values(&self, field: CategoricalField) -> &[String] {
        match field {
            CategoricalField::Brand => &self.brands,
            CategoricalField::FuelType => &self.fuel_types,
            CategoricalField::Transmission => &self.transmissions,
        }
    }

    pub fn contains(&self, field: CategoricalField, value: &str) -> bool {
        self.values(field).iter().any(|v| v == value)
    }

    /// First value of a field, the default selection
    pub fn first(&self, field: CategoricalField) -> Option<&str> {
        self.values(field).first().map(String::as_str)
    }

    /// Field name to values, in form order
    pub fn as_map(&self) -> IndexMap<&'static str, &[String]> {
        CategoricalField::ALL
            .iter()
            .map(|field| (field.name(), self.values(*field)))
            .collect()
    }
}

/// Structured prediction payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub brand: String,
    pub model_year: i32,
    pub mileage: u32,
    pub fuel_type: String,
    pub transmission: String,
    pub horsepower: f64,
    pub engine_size: f64,
    pub has_accident: u8,
    pub is_clean_title: u8,
}

/// Echo of the inputs the service used for a prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputEcho {
    pub brand: Option<String>,
    pub model_year: Option<i32>,
    #[serde(alias = "distance")]
    pub mileage: Option<f64>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub car_age: Option<i32>,
    pub has_accident: Option<u8>,
    pub horsepower: Option<f64>,
}

/// Features the service inferred from an image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatedFeatures {
    pub model_year: Option<i32>,
    pub mileage: Option<f64>,
    pub horsepower: Option<f64>,
}

/// Raw success/failure body of both prediction endpoints
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PredictionResponse {
    pub success: Option<bool>,
    pub predicted_price: Option<f64>,
    pub predicted_price_formatted: Option<String>,
    pub input_data: Option<InputEcho>,
    pub estimated_features: Option<EstimatedFeatures>,
    pub message: Option<String>,
    pub error: Option<String>,
}

/// Error body returned with non-success statuses
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServiceErrorBody {
    pub error: Option<String>,
}

/// A completed price estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_price_formatted: String,
    pub predicted_price: Option<f64>,
    pub input_data: InputEcho,
    pub estimated_features: Option<EstimatedFeatures>,
    pub message: Option<String>,
}
