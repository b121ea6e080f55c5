//! Form input model
//!
//! Holds the structured request as the user typed it. Values stay text
//! until submission, where they are coerced and checked in one place.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::api::{CategoricalField, OptionSet, PredictionRequest};
use crate::config::form as defaults;
use crate::error::RequestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Brand,
    ModelYear,
    Mileage,
    FuelType,
    Transmission,
    Horsepower,
    EngineSize,
    HasAccident,
    IsCleanTitle,
}

impl FormField {
    pub const ALL: [FormField; 9] = [
        FormField::Brand,
        FormField::ModelYear,
        FormField::Mileage,
        FormField::FuelType,
        FormField::Transmission,
        FormField::Horsepower,
        FormField::EngineSize,
        FormField::HasAccident,
        FormField::IsCleanTitle,
    ];

    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            FormField::Brand => "brand",
            FormField::ModelYear => "model_year",
            FormField::Mileage => "mileage",
            FormField::FuelType => "fuel_type",
            FormField::Transmission => "transmission",
            FormField::Horsepower => "horsepower",
            FormField::EngineSize => "engine_size",
            FormField::HasAccident => "has_accident",
            FormField::IsCleanTitle => "is_clean_title",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            FormField::Brand => "Brand",
            FormField::ModelYear => "Model Year",
            FormField::Mileage => "Distance (km)",
            FormField::FuelType => "Fuel Type",
            FormField::Transmission => "Transmission",
            FormField::Horsepower => "Horsepower",
            FormField::EngineSize => "Engine Size (L)",
            FormField::HasAccident => "Accident History",
            FormField::IsCleanTitle => "Clean Title",
        }
    }

    pub fn categorical(&self) -> Option<CategoricalField> {
        match self {
            FormField::Brand => Some(CategoricalField::Brand),
            FormField::FuelType => Some(CategoricalField::FuelType),
            FormField::Transmission => Some(CategoricalField::Transmission),
            _ => None,
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        if wanted == "distance" {
            return Ok(FormField::Mileage);
        }
        FormField::ALL
            .into_iter()
            .find(|field| field.name() == wanted)
            .ok_or_else(|| format!("Unknown field: {}", s.trim()))
    }
}

/// Categorical and flag fields sent alongside an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    pub brand: String,
    pub fuel_type: String,
    pub transmission: String,
    pub has_accident: u8,
    pub is_clean_title: u8,
}

/// Editable request parameters, kept as entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormInput {
    brand: String,
    model_year: String,
    mileage: String,
    fuel_type: String,
    transmission: String,
    horsepower: String,
    engine_size: String,
    has_accident: String,
    is_clean_title: String,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            brand: String::new(),
            model_year: defaults::DEFAULT_MODEL_YEAR.to_string(),
            mileage: defaults::DEFAULT_MILEAGE.to_string(),
            fuel_type: String::new(),
            transmission: String::new(),
            horsepower: defaults::DEFAULT_HORSEPOWER.to_string(),
            engine_size: format!("{:.1}", defaults::DEFAULT_ENGINE_SIZE),
            has_accident: defaults::DEFAULT_HAS_ACCIDENT.to_string(),
            is_clean_title: defaults::DEFAULT_IS_CLEAN_TITLE.to_string(),
        }
    }
}

impl FormInput {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Brand => &self.brand,
            FormField::ModelYear => &self.model_year,
            FormField::Mileage => &self.mileage,
            FormField::FuelType => &self.fuel_type,
            FormField::Transmission => &self.transmission,
            FormField::Horsepower => &self.horsepower,
            FormField::EngineSize => &self.engine_size,
            FormField::HasAccident => &self.has_accident,
            FormField::IsCleanTitle => &self.is_clean_title,
        }
    }

    /// Replace one field. Nothing is validated here.
    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Brand => &mut self.brand,
            FormField::ModelYear => &mut self.model_year,
            FormField::Mileage => &mut self.mileage,
            FormField::FuelType => &mut self.fuel_type,
            FormField::Transmission => &mut self.transmission,
            FormField::Horsepower => &mut self.horsepower,
            FormField::EngineSize => &mut self.engine_size,
            FormField::HasAccident => &mut self.has_accident,
            FormField::IsCleanTitle => &mut self.is_clean_title,
        };
        *slot = value.into();
    }

    /// Select the first allowed value of every categorical field
    pub fn seed_from(&mut self, options: &OptionSet) {
        for (name, values) in options.as_map() {
            if let Ok(field) = name.parse::<FormField>() {
                let first = values.first().cloned().unwrap_or_default();
                self.set(field, first);
            }
        }
    }

    /// Coerce and check every field for a structured submission
    pub fn to_request(
        &self,
        options: &OptionSet,
        current_year: i32,
    ) -> Result<PredictionRequest, RequestError> {
        let model_year = parse_int_in(
            FormField::ModelYear,
            &self.model_year,
            defaults::MIN_MODEL_YEAR as i64,
            current_year as i64,
        )? as i32;
        let mileage = parse_int_in(
            FormField::Mileage,
            &self.mileage,
            defaults::MIN_MILEAGE as i64,
            defaults::MAX_MILEAGE as i64,
        )? as u32;

        let horsepower = parse_number(FormField::Horsepower, &self.horsepower)?;
        if horsepower < defaults::MIN_HORSEPOWER {
            return Err(RequestError::validation(format!(
                "{} must be at least {}",
                FormField::Horsepower.label(),
                defaults::MIN_HORSEPOWER
            )));
        }

        let engine_size = parse_number(FormField::EngineSize, &self.engine_size)?;
        if !(defaults::MIN_ENGINE_SIZE..=defaults::MAX_ENGINE_SIZE).contains(&engine_size) {
            return Err(RequestError::validation(format!(
                "{} must be between {:.1} and {:.1}",
                FormField::EngineSize.label(),
                defaults::MIN_ENGINE_SIZE,
                defaults::MAX_ENGINE_SIZE
            )));
        }

        let metadata = self.image_metadata(options)?;

        Ok(PredictionRequest {
            brand: metadata.brand,
            model_year,
            mileage,
            fuel_type: metadata.fuel_type,
            transmission: metadata.transmission,
            horsepower,
            engine_size,
            has_accident: metadata.has_accident,
            is_clean_title: metadata.is_clean_title,
        })
    }

    /// Coerce and check the fields that accompany an image
    pub fn image_metadata(&self, options: &OptionSet) -> Result<ImageMetadata, RequestError> {
        Ok(ImageMetadata {
            brand: self.categorical_value(FormField::Brand, options)?,
            fuel_type: self.categorical_value(FormField::FuelType, options)?,
            transmission: self.categorical_value(FormField::Transmission, options)?,
            has_accident: parse_flag(FormField::HasAccident, &self.has_accident)?,
            is_clean_title: parse_flag(FormField::IsCleanTitle, &self.is_clean_title)?,
        })
    }

    fn categorical_value(
        &self,
        field: FormField,
        options: &OptionSet,
    ) -> Result<String, RequestError> {
        let value = self.get(field);
        match field.categorical() {
            Some(categorical) if options.contains(categorical, value) => Ok(value.to_string()),
            _ => Err(RequestError::validation(format!(
                "{} must be one of the available options",
                field.label()
            ))),
        }
    }
}

fn parse_int_in(field: FormField, raw: &str, min: i64, max: i64) -> Result<i64, RequestError> {
    let value: i64 = raw.trim().parse().map_err(|_| {
        RequestError::validation(format!("{} must be a whole number", field.label()))
    })?;
    if value < min || value > max {
        return Err(RequestError::validation(format!(
            "{} must be between {} and {}",
            field.label(),
            min,
            max
        )));
    }
    Ok(value)
}

fn parse_number(field: FormField, raw: &str) -> Result<f64, RequestError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| RequestError::validation(format!("{} must be a number", field.label())))
}

fn parse_flag(field: FormField, raw: &str) -> Result<u8, RequestError> {
    match raw.trim() {
        "0" => Ok(0),
        "1" => Ok(1),
        _ => Err(RequestError::validation(format!(
            "{} must be 0 or 1",
            field.label()
        ))),
    }
}
