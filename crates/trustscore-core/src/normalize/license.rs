//! License alias resolution and compatibility classes.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Alias -> canonical key. Every canonical key maps to itself.
const ALIASES: &[(&str, &str)] = &[
    ("mit", "mit"),
    ("apache-2.0", "apache-2.0"),
    ("apache 2.0", "apache-2.0"),
    ("apache2", "apache-2.0"),
    ("bsd-3-clause", "bsd-3-clause"),
    ("bsd 3-clause", "bsd-3-clause"),
    ("bsd-2-clause", "bsd-2-clause"),
    ("bsd 2-clause", "bsd-2-clause"),
    ("mpl-2.0", "mpl-2.0"),
    ("mpl 2.0", "mpl-2.0"),
    ("lgpl-2.1", "lgpl-2.1"),
    ("lgpl 2.1", "lgpl-2.1"),
    ("lgpl-3.0", "lgpl-3.0"),
    ("lgpl 3.0", "lgpl-3.0"),
    ("gpl-2.0", "gpl-2.0"),
    ("gpl 2.0", "gpl-2.0"),
    ("gpl-3.0", "gpl-3.0"),
    ("gpl 3.0", "gpl-3.0"),
    ("agpl-3.0", "agpl-3.0"),
    ("agpl 3.0", "agpl-3.0"),
    ("cc-by-4.0", "cc-by-4.0"),
    ("cc-by 4.0", "cc-by-4.0"),
    ("cc-by-sa-4.0", "cc-by-sa-4.0"),
    ("cc-by-sa 4.0", "cc-by-sa-4.0"),
    ("cc-by-nc-4.0", "cc-by-nc-4.0"),
    ("cc-by-nc 4.0", "cc-by-nc-4.0"),
    ("cc-by-nc-sa-4.0", "cc-by-nc-sa-4.0"),
    ("cc-by-nc-sa 4.0", "cc-by-nc-sa-4.0"),
    ("llama2", "llama2"),
    ("llama 2", "llama2"),
    ("llama-2", "llama2"),
    ("meta-llama", "llama2"),
    ("meta llama", "llama2"),
    ("llama3", "llama3"),
    ("llama 3", "llama3"),
    ("llama-3", "llama3"),
    ("meta-llama-3", "llama3"),
    ("other", "other"),
    ("unknown", "unknown"),
];

fn lookup(key: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
}

fn cc_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"cc[-\s]?by(?P<nc>[-\s]?nc)?(?P<sa>[-\s]?sa)?[-\s]?4\.0").expect("valid regex")
    })
}

/// License names recognized in free text. `other`/`unknown` are deliberately
/// absent: as prose words they say nothing about the license.
fn text_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)
            \b(
                apache[-\s]?(?:license,?[-\s]?)?(?:version[-\s]?)?2\.0
                |mit
                |bsd[-\s]?[23][-\s]?clause
                |mpl[-\s]?2\.0
                |a?gpl[-\s]?[23]\.0
                |lgpl[-\s]?(?:2\.1|3\.0)
                |cc[-\s]?by(?:[-\s]?nc)?(?:[-\s]?sa)?[-\s]?4\.0
                |llama[-\s]?[23]
                |meta[-\s]?llama(?:[-\s]?3)?
            )\b",
        )
        .expect("valid regex")
    })
}

fn license_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)license[:\s]+([^\n\r]+)").expect("valid regex"))
}

/// Resolve a free-form license declaration to a canonical key.
///
/// Lower-cases, maps `_` to `-`, strips punctuation around each word (inner
/// `.`/`-` survive, so `2.0` and `bsd-3-clause` stay intact), collapses
/// whitespace and drops the words `license` and `version`; then tries the alias table, a dash-joined variant,
/// and finally prefix patterns (`bsd 3...`, `apache ... 2.0`, CC-BY family).
/// Idempotent on canonical keys.
pub fn normalize_license(raw: &str) -> Option<&'static str> {
    let lowered = raw.trim().to_lowercase().replace('_', "-");
    let s = lowered
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .filter(|word| *word != "license" && *word != "licence" && *word != "version")
        .collect::<Vec<_>>()
        .join(" ");
    if s.is_empty() {
        return None;
    }

    if let Some(canonical) = lookup(&s) {
        return Some(canonical);
    }
    let dashed = s.replace(' ', "-");
    if let Some(canonical) = lookup(&dashed) {
        return Some(canonical);
    }

    if s.starts_with("apache") && s.contains("2.0") {
        return Some("apache-2.0");
    }
    if s.starts_with("bsd 3") || s.starts_with("bsd-3") {
        return Some("bsd-3-clause");
    }
    if s.starts_with("bsd 2") || s.starts_with("bsd-2") {
        return Some("bsd-2-clause");
    }
    if s.starts_with("mpl") && s.contains("2.0") {
        return Some("mpl-2.0");
    }
    if s.starts_with("lgpl") && s.contains("2.1") {
        return Some("lgpl-2.1");
    }
    if s.starts_with("lgpl") && s.contains("3.0") {
        return Some("lgpl-3.0");
    }
    if s.starts_with("gpl") && s.contains("3.0") {
        return Some("gpl-3.0");
    }
    if s.starts_with("gpl") && s.contains("2.0") {
        return Some("gpl-2.0");
    }
    if s.starts_with("agpl") && s.contains("3.0") {
        return Some("agpl-3.0");
    }
    if s.contains("llama-3") || s.contains("llama 3") {
        return Some("llama3");
    }
    if s.contains("llama-2") || s.contains("llama 2") || s.contains("meta-llama") {
        return Some("llama2");
    }

    cc_regex().captures(&s).map(|caps| {
        match (caps.name("nc").is_some(), caps.name("sa").is_some()) {
            (false, false) => "cc-by-4.0",
            (false, true) => "cc-by-sa-4.0",
            (true, false) => "cc-by-nc-4.0",
            (true, true) => "cc-by-nc-sa-4.0",
        }
    })
}

/// Scan README-style text for a license. The first normalizable mention wins;
/// a `License: <rest of line>` statement is the fallback.
pub fn find_license_in_text(text: &str) -> Option<&'static str> {
    if text.is_empty() {
        return None;
    }
    let mention = text_regex()
        .find_iter(text)
        .find_map(|m| normalize_license(m.as_str()));
    if mention.is_some() {
        return mention;
    }
    license_line_regex()
        .captures_iter(text)
        .find_map(|caps| normalize_license(&caps[1]))
}

/// Coarse license family used for model/code compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseClass {
    Permissive,
    Copyleft,
    Restricted,
    Unknown,
}

impl LicenseClass {
    /// Classify a license name or SPDX id (canonical or raw).
    pub fn of(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.is_empty() {
            return LicenseClass::Unknown;
        }
        if ["mit", "bsd", "apache", "mpl"]
            .iter()
            .any(|family| name.contains(family))
        {
            return LicenseClass::Permissive;
        }
        if name.contains("gpl") {
            return LicenseClass::Copyleft;
        }
        if name.contains("cc-by-nc") || name.contains("proprietary") {
            return LicenseClass::Restricted;
        }
        LicenseClass::Unknown
    }
}

/// Whether a model under `model` may ship with code under `repo`.
/// Permissive repos are always fine; copyleft code with a permissive model is
/// partially compatible; everything else scores 0.
pub fn license_compatibility(model: LicenseClass, repo: LicenseClass) -> f64 {
    match (model, repo) {
        (_, LicenseClass::Permissive) => 1.0,
        (LicenseClass::Permissive, LicenseClass::Copyleft) => 0.5,
        _ => 0.0,
    }
}
