use std::sync::OnceLock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use crate::knowledge::lookup_content;
use crate::params::{classify, lookup, SeverityTier};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticResult {
    pub parameter_key: String,
    pub display_name: String,
    pub tier: SeverityTier,
    pub value: f64,
    pub unit: String,
    pub message: String,
    pub possible_causes: Vec<String>,
    pub immediate_actions: Vec<String>,
    pub long_term_fixes: Vec<String>,
    pub related_parameters: Vec<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct DiagnosticSummary {
    pub critical: usize,
    pub warning: usize,
    pub normal: usize,
    pub overall: Option<SeverityTier>,
}

static LEADING_NUMBER: OnceLock<Option<Regex>> = OnceLock::new();

/// Reads the leading decimal number, so `"12 psi"` is 12 and `"psi 12"` is rejected.
fn parse_value(raw: &str) -> Option<f64> {
    let re = LEADING_NUMBER.get_or_init(|| Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").ok()).as_ref()?;
    let v = re.find(raw.trim())?.as_str().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// Classifies every reading against the registry and attaches knowledge for its tier.
///
/// Blank, unparsable or non-finite values and unregistered keys are omitted. The result is
/// ordered critical, warning, normal; input order is kept within a tier.
pub fn analyze<I, K, V>(inputs: I) -> Vec<DiagnosticResult>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = Vec::new();
    for (k, v) in inputs {
        let key = k.as_ref();
        let raw = v.as_ref();
        if raw.trim().is_empty() { continue; }
        let Some(spec) = lookup(key) else { log::debug!("no bands registered for '{}', skipping", key); continue; };
        let Some(value) = parse_value(raw) else { log::debug!("unparsable value '{}' for {}", raw, key); continue; };
        let tier = classify(spec, value);
        let c = lookup_content(key, tier, value, spec);
        out.push(DiagnosticResult {
            parameter_key: spec.key.to_string(),
            display_name: spec.display_name.to_string(),
            tier,
            value,
            unit: spec.unit.to_string(),
            message: c.message,
            possible_causes: c.possible_causes,
            immediate_actions: c.immediate_actions,
            long_term_fixes: c.long_term_fixes,
            related_parameters: c.related_parameters,
        });
    }
    out.sort_by(|a, b| b.tier.cmp(&a.tier));
    out
}

pub fn summarize(results: &[DiagnosticResult]) -> DiagnosticSummary {
    let mut s = DiagnosticSummary::default();
    for r in results {
        match r.tier {
            SeverityTier::Critical => s.critical += 1,
            SeverityTier::Warning => s.warning += 1,
            SeverityTier::Normal => s.normal += 1,
        }
    }
    s.overall = results.iter().map(|r| r.tier).max();
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_oil_pressure_is_single_critical_result() {
        let r = analyze([("oilPressure", "12")]);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].tier, SeverityTier::Critical);
        assert!(r[0].message.contains("STOP ENGINE"));
        assert_eq!(r[0].unit, "PSI");
        assert_eq!(r[0].display_name, "Oil Pressure");
    }

    #[test]
    fn results_are_ordered_by_tier_then_input() {
        let r = analyze([
            ("frequency", "50"),
            ("rpm", "1460"),
            ("coolantTemp", "110"),
            ("voltageL1N", "230"),
            ("batteryVoltage", "23"),
            ("oilPressure", "10"),
        ]);
        let keys: Vec<&str> = r.iter().map(|d| d.parameter_key.as_str()).collect();
        assert_eq!(keys, vec!["coolantTemp", "oilPressure", "rpm", "batteryVoltage", "frequency", "voltageL1N"]);
        for w in r.windows(2) { assert!(w[0].tier >= w[1].tier); }
    }

    #[test]
    fn bad_values_and_unknown_keys_are_omitted() {
        let r = analyze(vec![
            ("oilPressure".to_string(), "abc".to_string()),
            ("coolantTemp".to_string(), "  ".to_string()),
            ("frequency".to_string(), "NaN".to_string()),
            ("rpm".to_string(), "inf".to_string()),
            ("turboBoost".to_string(), "12".to_string()),
            ("fuelLevel".to_string(), " 55 ".to_string()),
        ]);
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].parameter_key, "fuelLevel");
        assert_eq!(r[0].tier, SeverityTier::Normal);
    }

    #[test]
    fn values_with_trailing_units_use_leading_number() {
        let r = analyze([("oilPressure", "12 psi"), ("coolantTemp", "C 90"), ("fuelLevel", "-.5e1%")]);
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].parameter_key, "oilPressure");
        assert_eq!(r[0].value, 12.0);
        assert_eq!(r[1].value, -5.0);
        assert_eq!(parse_value("1e999"), None);
        assert_eq!(parse_value("+3."), Some(3.0));
    }

    #[test]
    fn summary_counts_and_overall() {
        let r = analyze([("oilPressure", "45"), ("rpm", "1460"), ("loadPercent", "50")]);
        let s = summarize(&r);
        assert_eq!((s.critical, s.warning, s.normal), (0, 1, 2));
        assert_eq!(s.overall, Some(SeverityTier::Warning));
        assert_eq!(summarize(&[]).overall, None);
    }

    #[test]
    fn analyze_is_deterministic() {
        let input = [("oilPressure", "65"), ("powerFactor", "0.7"), ("currentL1", "560")];
        assert_eq!(analyze(input), analyze(input));
    }
}
