//! Formatting utilities for human-readable output
//!
//! Provides consistent formatting functions for the application.

/// Bytes per kilobyte constant
pub const KB: u64 = 1024;
/// Bytes per megabyte constant
pub const MB: u64 = 1024 * 1024;

/// Convert bytes to kilobytes as f64 (for logging)
#[inline]
pub fn bytes_to_kb(bytes: u64) -> f64 {
    bytes as f64 / KB as f64
}

/// Convert bytes to megabytes as f64 (for calculations and logging)
#[inline]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / MB as f64
}

/// Format bytes into human-readable size string (e.g., "1.5 MB", "256 KB")
pub fn format_size(bytes: u64) -> String {
    if bytes >= MB {
        format!("{:.1} MB", bytes_to_mb(bytes))
    } else if bytes >= KB {
        format!("{:.0} KB", bytes_to_kb(bytes))
    } else {
        format!("{} B", bytes)
    }
}

/// Group the integer part with commas (e.g., 53000.0 -> "53,000")
///
/// Fractions are kept only when present, rounded to two places.
pub fn format_thousands(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = (value.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if negative && (whole > 0 || cents > 0) { "-" } else { "" };
    if cents > 0 {
        format!("{}{}.{:02}", sign, grouped, cents)
    } else {
        format!("{}{}", sign, grouped)
    }
}
