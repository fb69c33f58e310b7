use regex::Regex;
use std::sync::OnceLock;
use crate::sanitize::Sanitizer;

pub const UNKNOWN_CAUSE: &str = "Unknown cause - requires diagnosis";
pub const GENERIC_CAUSES: [&str; 3] = ["Component failure or degradation", "Wiring or connection issue", "Sensor malfunction"];
pub const MAX_CAUSES: usize = 5;

static UNCLOSED_PAREN: OnceLock<Option<Regex>> = OnceLock::new();

fn strip_unclosed(s: &str) -> String {
    match UNCLOSED_PAREN.get_or_init(|| Regex::new(r"\s*\([^)]*$").ok()) {
        Some(re) => re.replace(s, "").trim().to_string(),
        None => s.trim().to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() { Some(f) => f.to_uppercase().chain(c).collect(), None => String::new() }
}

/// Splits a raw cause field into at most five capitalized phrases. Never returns an empty list.
pub fn extract_causes(raw: &str, sanitizer: &Sanitizer) -> Vec<String> {
    if raw.trim().is_empty() { return vec![UNKNOWN_CAUSE.to_string()]; }
    let cleaned = sanitizer.clean(raw);
    let causes: Vec<String> = cleaned
        .split([',', ';', '|'])
        .map(strip_unclosed)
        .filter(|c| c.chars().count() > 3)
        .map(|c| capitalize(&c))
        .take(MAX_CAUSES)
        .collect();
    if causes.is_empty() { GENERIC_CAUSES.iter().map(|s| s.to_string()).collect() } else { causes }
}
