//! Text and number normalization shared by the probes.

mod license;
mod params;

pub use license::{
    find_license_in_text, license_compatibility, normalize_license, LicenseClass,
};
pub use params::{parse_param_count, parse_param_value};

use serde_json::Value;

/// Clamp into `[0, 1]`. NaN maps to 0.0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Clamp a JSON value. Numbers and numeric strings are clamped; anything else is 0.0.
pub fn clamp01_json(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().map(clamp01).unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().map(clamp01).unwrap_or(0.0),
        _ => 0.0,
    }
}
