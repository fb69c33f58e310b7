use std::path::Path;
use std::sync::OnceLock;
use chrono::Local;
use comfy_table::{ContentArrangement, Table};
use thiserror::Error;
use crate::classify::FaultSeverity;
use crate::engine::{DiagnosticResult, DiagnosticSummary};
use crate::params::{all_specs, SeverityTier};
use crate::pipeline::{EnrichedFaultRecord, EnrichmentOutput};

static ENABLE_COLOR: OnceLock<bool> = OnceLock::new();

/// Sets terminal colouring once per process; later calls are ignored.
pub fn init_color(enabled: bool) { let _ = ENABLE_COLOR.set(enabled); }

pub fn paint(s: &str, code: &str) -> String {
    if *ENABLE_COLOR.get().unwrap_or(&false) { format!("\x1b[{}m{}\x1b[0m", code, s) } else { s.to_string() }
}

fn tier_code(t: SeverityTier) -> &'static str { match t { SeverityTier::Critical => "1;31", SeverityTier::Warning => "33", SeverityTier::Normal => "32" } }

fn severity_code(s: FaultSeverity) -> &'static str { match s { FaultSeverity::Critical => "1;31", FaultSeverity::Warning => "33", FaultSeverity::Info => "34" } }

fn truncate(s: &str, n: usize) -> String {
    let mut out: String = s.chars().take(n).collect();
    if s.chars().count() > n { out.push_str("..."); }
    out
}

fn reading(r: &DiagnosticResult) -> String { if r.unit.is_empty() { format!("{}", r.value) } else { format!("{} {}", r.value, r.unit) } }

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub fn render_summary_line(s: &DiagnosticSummary) -> String {
    let overall = s.overall.map(|t| paint(&t.as_str().to_uppercase(), tier_code(t))).unwrap_or_else(|| "NONE".to_string());
    format!("Overall: {}  Critical: {}  Warning: {}  Normal: {}", overall, s.critical, s.warning, s.normal)
}

pub fn render_diagnostics_text(results: &[DiagnosticResult], summary: &DiagnosticSummary) -> String {
    let mut s = String::new();
    s.push_str(&paint("Generator Diagnostics", "1;36"));
    s.push('\n');
    s.push_str(&render_summary_line(summary));
    s.push_str("\n\n");
    if results.is_empty() { s.push_str("No readings to diagnose\n"); return s; }
    for r in results {
        let tag = paint(&format!("[{}]", r.tier.as_str().to_uppercase()), tier_code(r.tier));
        s.push_str(&format!("{} {} = {}\n", tag, paint(&r.display_name, "1"), reading(r)));
        s.push_str(&format!("  {}\n", r.message));
        for (title, items) in [("Possible causes", &r.possible_causes), ("Immediate actions", &r.immediate_actions), ("Long-term fixes", &r.long_term_fixes)] {
            if items.is_empty() { continue; }
            s.push_str(&format!("  {}:\n", title));
            for i in items { s.push_str(&format!("    - {}\n", i)); }
        }
        if !r.related_parameters.is_empty() { s.push_str(&format!("  Related: {}\n", r.related_parameters.join(", "))); }
        s.push('\n');
    }
    s
}

pub fn diagnostics_table(results: &[DiagnosticResult]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["Parameter", "Value", "Tier", "Message"].map(|h| paint(h, "1")));
    for r in results {
        table.add_row([r.display_name.clone(), reading(r), paint(r.tier.as_str(), tier_code(r.tier)), truncate(&r.message, 80)]);
    }
    table
}

pub fn render_diagnostics_markdown(results: &[DiagnosticResult], summary: &DiagnosticSummary) -> String {
    let mut s = String::new();
    s.push_str("# Generator Diagnostic Report\n\n");
    s.push_str(&format!("Generated: {}\n\n", Local::now().format("%Y-%m-%d %H:%M")));
    s.push_str("## Summary\n");
    s.push_str(&format!("- Overall: {}\n", summary.overall.map(|t| t.as_str()).unwrap_or("none")));
    s.push_str(&format!("- Critical: {}\n", summary.critical));
    s.push_str(&format!("- Warning: {}\n", summary.warning));
    s.push_str(&format!("- Normal: {}\n\n", summary.normal));
    s.push_str("## Readings\n");
    if results.is_empty() { s.push_str("None\n"); return s; }
    s.push_str("| Parameter | Value | Tier |\n|---|---|---|\n");
    for r in results { s.push_str(&format!("| {} | {} | {} |\n", r.display_name, reading(r), r.tier)); }
    s.push('\n');
    for r in results.iter().filter(|r| r.tier != SeverityTier::Normal) {
        s.push_str(&format!("### {} ({})\n{}\n\n", r.display_name, r.tier, r.message));
        if !r.possible_causes.is_empty() { s.push_str("Possible causes:\n"); for c in &r.possible_causes { s.push_str(&format!("- {}\n", c)); } s.push('\n'); }
        if !r.immediate_actions.is_empty() { s.push_str("Immediate actions:\n"); for a in &r.immediate_actions { s.push_str(&format!("- [ ] {}\n", a)); } s.push('\n'); }
        if !r.long_term_fixes.is_empty() { s.push_str("Long-term fixes:\n"); for f in &r.long_term_fixes { s.push_str(&format!("- {}\n", f)); } s.push('\n'); }
    }
    s
}

pub fn write_diagnostics_csv(path: &Path, results: &[DiagnosticResult]) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["parameter", "display_name", "value", "unit", "tier", "message", "possible_causes", "immediate_actions", "long_term_fixes"])?;
    for r in results {
        wtr.write_record([
            r.parameter_key.clone(), r.display_name.clone(), r.value.to_string(), r.unit.clone(), r.tier.to_string(), r.message.clone(),
            r.possible_causes.join("; "), r.immediate_actions.join("; "), r.long_term_fixes.join("; "),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn params_table() -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["Key", "Name", "Unit", "Normal", "Warning", "Critical"].map(|h| paint(h, "1")));
    for p in all_specs() {
        table.add_row([
            p.key.to_string(), p.display_name.to_string(), p.unit.to_string(),
            format!("{}-{}", p.normal_min, p.normal_max), format!("{}-{}", p.warning_low, p.warning_high), format!("{}-{}", p.critical_low, p.critical_high),
        ]);
    }
    table
}

pub fn records_table(records: &[&EnrichedFaultRecord], top: usize) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["Brand", "Code", "Category", "Severity", "Title"].map(|h| paint(h, "1")));
    for r in records.iter().take(top) {
        table.add_row([r.brand.clone(), r.code.clone(), r.category.to_string(), paint(r.severity.as_str(), severity_code(r.severity)), truncate(&r.title, 60)]);
    }
    table
}

pub fn render_stats_text(out: &EnrichmentOutput, top: usize) -> String {
    let st = &out.stats;
    let mut s = String::new();
    s.push_str(&format!("{} {}  {} {}  {} {}\n", paint("Lines:", "1"), st.lines_read, paint("Records:", "1"), st.rows_parsed, paint("Skipped:", "1"), st.rows_skipped));
    for (title, list) in [("Brands", &st.by_brand), ("Categories", &st.by_category), ("Severity", &st.by_severity)] {
        let parts: Vec<String> = list.iter().take(top).map(|c| format!("{} ({})", c.name, c.count)).collect();
        s.push_str(&format!("{} {}\n", paint(&format!("{}:", title), "1"), if parts.is_empty() { "None".to_string() } else { parts.join(", ") }));
    }
    s
}

pub fn render_kb_markdown(out: &EnrichmentOutput, shown: &[&EnrichedFaultRecord], top: usize) -> String {
    let st = &out.stats;
    let mut s = String::new();
    s.push_str("# Fault Code Knowledge Base\n\n");
    s.push_str(&format!("Generated: {}\n\n", Local::now().format("%Y-%m-%d %H:%M")));
    s.push_str("## Summary\n");
    s.push_str(&format!("- Lines Read: {}\n", st.lines_read));
    s.push_str(&format!("- Records: {}\n", st.rows_parsed));
    s.push_str(&format!("- Skipped Rows: {}\n\n", st.rows_skipped));
    for (title, list) in [("Brands", &st.by_brand), ("Categories", &st.by_category), ("Severity", &st.by_severity)] {
        s.push_str(&format!("## {}\n", title));
        if list.is_empty() { s.push_str("None\n\n"); continue; }
        for c in list.iter().take(top) { s.push_str(&format!("- {} ({})\n", c.name, c.count)); }
        s.push('\n');
    }
    s.push_str("## Records\n");
    if shown.is_empty() { s.push_str("None\n"); return s; }
    for r in shown.iter().take(top) {
        s.push_str(&format!("### {} {} [{}] ({})\n", r.brand, r.code, r.category, r.severity));
        s.push_str(&format!("{}\n\n", r.description));
        s.push_str("Causes:\n");
        for c in &r.causes { s.push_str(&format!("- {}\n", c)); }
        s.push_str("\nSteps:\n");
        for step in &r.diagnostic_steps { s.push_str(&format!("{}. {} (expect: {})\n", step.step, step.action, step.expected_result)); }
        s.push_str(&format!("\nEscalation: {}\n\n", r.when_to_call_expert));
    }
    s
}

/// One flat row per record; list fields are joined with `; `.
pub fn write_records_csv(path: &Path, records: &[&EnrichedFaultRecord]) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["code", "brand", "model", "category", "severity", "title", "causes", "first_step", "easy_fix", "when_to_call_expert", "related_codes"])?;
    for r in records {
        wtr.write_record([
            r.code.clone(), r.brand.clone(), r.model.clone(), r.category.to_string(), r.severity.to_string(), r.title.clone(),
            r.causes.join("; "),
            r.diagnostic_steps.first().map(|s| s.action.clone()).unwrap_or_default(),
            r.solutions.first().map(|s| s.solution.clone()).unwrap_or_default(),
            r.when_to_call_expert.clone(),
            r.related_codes.join("; "),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the knowledge base as YAML for `.yaml`/`.yml` paths, pretty JSON otherwise.
pub fn write_kb(path: &Path, out: &EnrichmentOutput) -> Result<(), ReportError> {
    let yaml = path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml")).unwrap_or(false);
    let body = if yaml { serde_yaml::to_string(out)? } else { serde_json::to_string_pretty(out)? };
    std::fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{analyze, summarize};
    use crate::pipeline::EnrichmentPipeline;

    fn kb() -> EnrichmentOutput {
        let csv = "Perkins,1300,E042,\"coolant temperature high shutdown\",\"thermostat stuck, low coolant\",check level,replace thermostat\n\
Cummins,QSK,P0087,fuel rail pressure low,clogged filter,replace filter\n";
        EnrichmentPipeline::default().run(csv.as_bytes(), "r").unwrap()
    }

    #[test]
    fn text_listing_includes_message_and_lists() {
        let r = analyze([("oilPressure", "12"), ("frequency", "50")]);
        let s = render_diagnostics_text(&r, &summarize(&r));
        assert!(s.contains("[CRITICAL] Oil Pressure = 12 PSI"));
        assert!(s.contains("STOP ENGINE"));
        assert!(s.contains("Immediate actions:"));
        assert!(s.contains("Critical: 1"));
    }

    #[test]
    fn markdown_lists_only_abnormal_details() {
        let r = analyze([("oilPressure", "12"), ("frequency", "50")]);
        let md = render_diagnostics_markdown(&r, &summarize(&r));
        assert!(md.contains("| Output Frequency | 50 Hz | normal |"));
        assert!(md.contains("### Oil Pressure (critical)"));
        assert!(!md.contains("### Output Frequency"));
    }

    #[test]
    fn tables_have_one_row_per_item() {
        let r = analyze([("oilPressure", "45"), ("rpm", "1500")]);
        assert_eq!(diagnostics_table(&r).row_iter().count(), 2);
        assert_eq!(params_table().row_iter().count(), all_specs().len());
        let out = kb();
        let refs: Vec<&EnrichedFaultRecord> = out.records.iter().collect();
        assert_eq!(records_table(&refs, 1).row_iter().count(), 1);
    }

    #[test]
    fn kb_markdown_and_stats() {
        let out = kb();
        let refs: Vec<&EnrichedFaultRecord> = out.records.iter().collect();
        let md = render_kb_markdown(&out, &refs, 10);
        assert!(md.contains("- Records: 2"));
        assert!(md.contains("### Perkins E042 [Cooling System] (critical)"));
        let st = render_stats_text(&out, 10);
        assert!(st.contains("Cummins (1)"));
    }

    #[test]
    fn writes_csv_and_kb_files() {
        let out = kb();
        let refs: Vec<&EnrichedFaultRecord> = out.records.iter().collect();
        let dir = std::env::temp_dir();
        let csv_path = dir.join("powerdiag_records_test.csv");
        write_records_csv(&csv_path, &refs).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.starts_with("code,brand,model,category"));
        assert_eq!(text.lines().count(), 3);

        let json_path = dir.join("powerdiag_kb_test.json");
        write_kb(&json_path, &out).unwrap();
        let back: EnrichmentOutput = serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(back, out);

        let yaml_path = dir.join("powerdiag_kb_test.yaml");
        write_kb(&yaml_path, &out).unwrap();
        let y = std::fs::read_to_string(&yaml_path).unwrap();
        assert!(y.contains("whenToCallExpert:"));

        let diag_path = dir.join("powerdiag_diag_test.csv");
        write_diagnostics_csv(&diag_path, &analyze([("oilPressure", "12")])).unwrap();
        assert!(std::fs::read_to_string(&diag_path).unwrap().contains("oilPressure,Oil Pressure,12,PSI,critical"));
        for p in [csv_path, json_path, yaml_path, diag_path] { let _ = std::fs::remove_file(p); }
    }
}
