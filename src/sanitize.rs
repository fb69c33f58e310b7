use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_BLOCKED_TERMS: &[&str] = &[
    "Atlas Copco",
    "QAS",
    "QES",
    "Scribd",
    "manual",
    "consult the",
    "refer to",
    "technician if unresolved",
    "or a technician",
];

const LINK_PATTERNS: &[&str] = &[r"\[\]\([^)]*\)", r"\[?\]?\(s?:?//[^\s)]+\)?", r"https?://\S+"];
const FRAGMENT_PATTERNS: &[&str] = &[r"\(e\.g\.[^)]*$", r"\(i\.e\.[^)]*$"];

struct Rule { re: Regex, with: &'static str }

fn compile(patterns: &[&str], with: &'static str) -> Vec<Rule> {
    patterns.iter().filter_map(|p| match Regex::new(p) {
        Ok(re) => Some(Rule { re, with }),
        Err(e) => { log::warn!("Skipping sanitizer pattern {}: {}", p, e); None }
    }).collect()
}

static LINKS: OnceLock<Vec<Rule>> = OnceLock::new();
static FRAGMENTS: OnceLock<Vec<Rule>> = OnceLock::new();
static COLLAPSE: OnceLock<Vec<Rule>> = OnceLock::new();

fn collapse_rules() -> Vec<Rule> {
    let mut v = compile(&[r"\s+"], " ");
    v.extend(compile(&[r"\.+"], "."));
    v.extend(compile(&[r"\s+\."], "."));
    v
}

fn term_pattern<S: AsRef<str>>(terms: &[S]) -> Option<String> {
    let alts: Vec<String> = terms.iter()
        .map(|t| t.as_ref().split_whitespace().map(regex::escape).collect::<Vec<_>>().join(r"\s+"))
        .filter(|t| !t.is_empty())
        .collect();
    if alts.is_empty() { return None; }
    Some(format!(r"(?i)(?:{})[^.]*\.?", alts.join("|")))
}

/// Strips links, blocked brand/reference phrases and dangling parentheticals from free text.
/// A blocked phrase runs from the leftmost blocked term through the next period.
#[derive(Clone)]
pub struct Sanitizer { terms: Option<Regex> }

impl Default for Sanitizer {
    fn default() -> Self { Self::new(DEFAULT_BLOCKED_TERMS) }
}

impl Sanitizer {
    pub fn new<S: AsRef<str>>(blocked_terms: &[S]) -> Self {
        let terms = term_pattern(blocked_terms).and_then(|p| match Regex::new(&p) {
            Ok(re) => Some(re),
            Err(e) => { log::warn!("Blocked terms not applied: {}", e); None }
        });
        Self { terms }
    }

    fn pass(&self, s: &str) -> String {
        let mut t = s.to_string();
        for r in LINKS.get_or_init(|| compile(LINK_PATTERNS, "")) { t = r.re.replace_all(&t, r.with).into_owned(); }
        if let Some(re) = &self.terms { t = re.replace_all(&t, "").into_owned(); }
        for r in FRAGMENTS.get_or_init(|| compile(FRAGMENT_PATTERNS, "")) { t = r.re.replace_all(&t, r.with).into_owned(); }
        for r in COLLAPSE.get_or_init(collapse_rules) { t = r.re.replace_all(&t, r.with).into_owned(); }
        t.trim().to_string()
    }

    /// Applies the rule list until the text stops changing, so `clean(clean(x)) == clean(x)`.
    pub fn clean(&self, raw: &str) -> String {
        let mut cur = self.pass(raw);
        loop {
            let next = self.pass(&cur);
            if next == cur { return cur; }
            cur = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_urls_and_link_remnants() {
        let s = Sanitizer::default();
        assert_eq!(s.clean("Replace filter https://example.com/x now"), "Replace filter now");
        assert_eq!(s.clean("See [](https://a.b/c) for the chart"), "See for the chart");
        assert_eq!(s.clean("Check valve (s://cdn.x/y.pdf)"), "Check valve");
    }

    #[test]
    fn strips_blocked_phrases_to_period() {
        let s = Sanitizer::default();
        assert_eq!(s.clean("Check fuel level. Refer to the Atlas Copco manual for torque. Replace filter."), "Check fuel level. Replace filter.");
        assert_eq!(s.clean("Bleed air from lines or a  technician."), "Bleed air from lines");
        assert_eq!(s.clean("Clean the sensor. Consult   the documentation"), "Clean the sensor.");
    }

    #[test]
    fn strips_trailing_fragments_and_collapses() {
        let s = Sanitizer::default();
        assert_eq!(s.clean("Sensor fault (e.g. open circuit"), "Sensor fault");
        assert_eq!(s.clean("Low level (i.e. below mark"), "Low level");
        assert_eq!(s.clean("  too   many ... dots  . "), "too many. dots.");
    }

    #[test]
    fn clean_is_idempotent() {
        let s = Sanitizer::default();
        for raw in [
            "Check https://x.y/z.. then (e.g. the relay",
            "Replace injector. Refer to QAS docs. Clean [](//a.b) tank (i.e. drain",
            "plain text",
            "",
            "... ",
        ] {
            let once = s.clean(raw);
            assert_eq!(s.clean(&once), once, "{:?}", raw);
        }
    }

    #[test]
    fn nested_blocked_terms_are_fully_removed() {
        let s = Sanitizer::default();
        let raw = format!("{}refer to.{}", "re".repeat(10), "fer to.".repeat(10));
        let once = s.clean(&raw);
        assert_eq!(once, "");
        assert_eq!(s.clean(&once), once);
    }

    #[test]
    fn custom_terms_replace_defaults() {
        let s = Sanitizer::new(&["Acme"]);
        assert_eq!(s.clean("See manual. Acme parts only."), "See manual.");
    }
}
