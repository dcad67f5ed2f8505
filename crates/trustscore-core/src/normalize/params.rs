use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]*\.?[0-9]+)\s*(K|M|B|THOUSAND|MILLION|BILLION)$").expect("valid regex")
    })
}

/// Parse a parameter count such as `110000000`, `1,300,000`, `7B`, `258M`,
/// `3.5K` or `7 billion`. Returns `None` for anything else.
pub fn parse_param_count(raw: &str) -> Option<f64> {
    let s = raw.trim().to_uppercase().replace(',', "");
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<f64>() {
        return n.is_finite().then_some(n);
    }

    let caps = suffix_regex().captures(&s)?;
    let number: f64 = caps[1].parse().ok()?;
    let scale = match &caps[2] {
        "K" | "THOUSAND" => 1e3,
        "M" | "MILLION" => 1e6,
        "B" | "BILLION" => 1e9,
        _ => return None,
    };
    Some(number * scale)
}

/// [`parse_param_count`] for JSON card values (numbers or strings).
pub fn parse_param_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_param_count(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_param_count("110000000"), Some(110_000_000.0));
        assert_eq!(parse_param_count("1,300,000"), Some(1_300_000.0));
        assert_eq!(parse_param_count(" 42.5 "), Some(42.5));
    }

    #[test]
    fn test_suffixed_forms() {
        assert_eq!(parse_param_count("7B"), Some(7e9));
        assert_eq!(parse_param_count("258M"), Some(258e6));
        assert_eq!(parse_param_count("3.5K"), Some(3500.0));
        assert_eq!(parse_param_count("7 b"), Some(7e9));
    }

    #[test]
    fn test_spelled_out_units() {
        assert_eq!(parse_param_count("7 billion"), Some(7e9));
        assert_eq!(parse_param_count("110 Million"), Some(110e6));
        assert_eq!(parse_param_count("3 thousand"), Some(3000.0));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_param_count(""), None);
        assert_eq!(parse_param_count("large"), None);
        assert_eq!(parse_param_count("7 trillion"), None);
        assert_eq!(parse_param_count("inf"), None);
        assert_eq!(parse_param_count("B7"), None);
    }

    #[test]
    fn test_json_values() {
        assert_eq!(parse_param_value(&json!(124_000_000u64)), Some(124e6));
        assert_eq!(parse_param_value(&json!("1.5B")), Some(1.5e9));
        assert_eq!(parse_param_value(&json!(true)), None);
        assert_eq!(parse_param_value(&json!(null)), None);
    }
}
