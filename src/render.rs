//! Text rendering of the current screen
//!
//! Pure projection: the same [`Screen`] always renders the same text.

use std::fmt::Write;

use crate::api::{CategoricalField, PredictionResult};
use crate::form::FormField;
use crate::state::{Pipeline, ReadyView, Screen, SubmissionState};
use crate::utils::{format_size, format_thousands};

const RULE: &str = "----------------------------------------";

pub fn render(screen: &Screen<'_>) -> String {
    match screen {
        Screen::Checking => "Connecting to backend...\n".to_string(),
        Screen::Disconnected { api_url, failure } => {
            let mut out = format!(
                "Backend Not Running\n\
                 Could not reach the prediction service at {}.\n",
                api_url
            );
            if let Some(e) = failure {
                let _ = writeln!(out, "({})", e.message);
            }
            out.push_str("Start the backend, then type `retry` to check again.\n");
            out
        }
        Screen::LoadingOptions { failure } => match failure {
            None => "Loading options...\n".to_string(),
            Some(e) => format!(
                "Loading options...\n(options could not be loaded: {})\n\
                 Type `retry` to restart.\n",
                e.message
            ),
        },
        Screen::Ready(view) => render_ready(view),
    }
}

fn render_ready(view: &ReadyView<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Car Price Predictor  [Connected to Backend]");
    let _ = writeln!(
        out,
        "Tabs: {} Form Input | {} Image Upload",
        marker(view.active == Pipeline::Form),
        marker(view.active == Pipeline::Image)
    );
    let _ = writeln!(out, "{}", RULE);

    match view.active {
        Pipeline::Form => {
            for field in FormField::ALL {
                let _ = writeln!(out, "{:<18} {}", field.label(), field_value(view, field));
            }
        }
        Pipeline::Image => {
            match view.image {
                Some(asset) => {
                    let _ = writeln!(
                        out,
                        "Image              {} ({}, {})",
                        asset.file.filename,
                        asset.file.mime_type,
                        format_size(asset.file.size)
                    );
                    let _ = writeln!(
                        out,
                        "Preview            {}",
                        match &asset.preview {
                            Some(p) => format!("ready ({} chars)", p.len()),
                            None => "unavailable".to_string(),
                        }
                    );
                }
                None => {
                    let _ = writeln!(out, "Image              none (JPG, PNG, GIF, WEBP, BMP; max 10MB)");
                }
            }
            for field in [FormField::Brand, FormField::FuelType, FormField::Transmission] {
                let _ = writeln!(out, "{:<18} {}", field.label(), field_value(view, field));
            }
        }
    }

    let _ = writeln!(out, "{}", RULE);
    let action = match (view.active, view.submission.is_loading()) {
        (Pipeline::Form, true) => "Predicting...",
        (Pipeline::Image, true) => "Analyzing...",
        (Pipeline::Form, false) => "Predict Price",
        (Pipeline::Image, false) => "Predict from Image",
    };
    let _ = writeln!(
        out,
        "[submit] {}{}",
        action,
        if view.can_submit { "" } else { " (disabled)" }
    );

    match view.submission {
        SubmissionState::Succeeded(result) => render_result(&mut out, result),
        SubmissionState::Failed(error) => {
            let _ = writeln!(out, "\nError: {}", error.message);
        }
        SubmissionState::Idle | SubmissionState::Submitting(_) => {}
    }

    out
}

fn render_result(out: &mut String, result: &PredictionResult) {
    let _ = writeln!(out, "\nPredicted Price: {}", result.predicted_price_formatted);
    if let Some(message) = &result.message {
        let _ = writeln!(out, "{}", message);
    }

    let echo = &result.input_data;
    let _ = writeln!(out, "Input Summary:");
    let _ = writeln!(out, "  Brand:        {}", echo.brand.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  Year:         {}", opt(echo.model_year));
    let _ = writeln!(
        out,
        "  Distance:     {}",
        echo.mileage
            .map(|m| format!("{} km", format_thousands(m)))
            .unwrap_or_else(|| "-".to_string())
    );
    let _ = writeln!(out, "  Fuel:         {}", echo.fuel_type.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  Transmission: {}", echo.transmission.as_deref().unwrap_or("-"));
    let _ = writeln!(
        out,
        "  Horsepower:   {}",
        echo.horsepower
            .map(|hp| format!("{} HP", hp))
            .unwrap_or_else(|| "-".to_string())
    );
}

fn field_value(view: &ReadyView<'_>, field: FormField) -> String {
    let raw = view.form.get(field);
    match field {
        FormField::HasAccident => match raw {
            "0" => "No Accident".to_string(),
            "1" => "Has Accident".to_string(),
            other => other.to_string(),
        },
        FormField::IsCleanTitle => match raw {
            "1" => "Yes".to_string(),
            "0" => "No".to_string(),
            other => other.to_string(),
        },
        FormField::Mileage => match raw.trim().parse::<f64>() {
            Ok(km) => format!("{}  ({} km)", raw, format_thousands(km)),
            Err(_) => format!("{}  (range: 100 - 405,000 km)", raw),
        },
        _ => match field.categorical() {
            Some(categorical) => format!("{}  [{}]", raw, choices(view, categorical)),
            None => raw.to_string(),
        },
    }
}

fn choices(view: &ReadyView<'_>, field: CategoricalField) -> String {
    view.options.values(field).join(", ")
}

fn marker(active: bool) -> &'static str {
    if active {
        "(*)"
    } else {
        "( )"
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
