use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::causes::extract_causes;
use crate::classify::{categorize, classify_severity, Category, FaultSeverity};
use crate::guidance::{DiagnosticStep, GuidanceSynthesizer, Solution};
use crate::record::{parse_row, RawFaultRow};
use crate::sanitize::Sanitizer;

pub const DEFAULT_MODEL: &str = "All Models";
pub const DEFAULT_DESCRIPTION: &str = "Fault condition detected";
const TITLE_MAX: usize = 100;
const RELATED_MAX: usize = 5;
const MIN_FRAGMENT: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage { Idle, Parsing, Sanitizing, Classifying, Synthesizing, Complete, Failed }

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Parsing => "parsing",
            PipelineStage::Sanitizing => "sanitizing",
            PipelineStage::Classifying => "classifying",
            PipelineStage::Synthesizing => "synthesizing",
            PipelineStage::Complete => "complete",
            PipelineStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read fault records from {source_name}: {source}")]
    Io { source_name: String, #[source] source: std::io::Error },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedFaultRecord {
    pub code: String,
    pub brand: String,
    pub model: String,
    pub category: Category,
    pub severity: FaultSeverity,
    pub title: String,
    pub description: String,
    pub symptoms: Vec<String>,
    pub causes: Vec<String>,
    pub diagnostic_steps: Vec<DiagnosticStep>,
    pub solutions: Vec<Solution>,
    pub preventive_measures: Vec<String>,
    pub safety_warnings: Vec<String>,
    pub when_to_call_expert: String,
    pub related_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_solution: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry { pub name: String, pub count: usize }

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub lines_read: usize,
    pub rows_parsed: usize,
    pub rows_skipped: usize,
    pub by_brand: Vec<CountEntry>,
    pub by_category: Vec<CountEntry>,
    pub by_severity: Vec<CountEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentOutput {
    pub records: Vec<EnrichedFaultRecord>,
    pub stats: PipelineStats,
}

struct CleanRow { raw: RawFaultRow, description: String, solution: String }

struct ClassifiedRow { clean: CleanRow, causes: Vec<String>, category: Category, severity: FaultSeverity }

/// Count descending, then name ascending.
fn ranked<'a>(names: impl Iterator<Item = &'a str>) -> Vec<CountEntry> {
    let mut m: BTreeMap<&str, usize> = BTreeMap::new();
    for n in names { *m.entry(n).or_insert(0) += 1; }
    let mut v: Vec<CountEntry> = m.into_iter().map(|(name, count)| CountEntry { name: name.to_string(), count }).collect();
    v.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    v
}

fn truncate_chars(s: &str, n: usize) -> String { s.chars().take(n).collect() }

/// One-shot batch job turning raw fault rows into enriched knowledge-base records.
pub struct EnrichmentPipeline {
    sanitizer: Sanitizer,
    synthesizer: GuidanceSynthesizer,
    stage: PipelineStage,
    progress: Option<indicatif::ProgressBar>,
}

impl Default for EnrichmentPipeline {
    fn default() -> Self { Self::new(Sanitizer::default(), GuidanceSynthesizer::default()) }
}

impl EnrichmentPipeline {
    pub fn new(sanitizer: Sanitizer, synthesizer: GuidanceSynthesizer) -> Self {
        Self { sanitizer, synthesizer, stage: PipelineStage::Idle, progress: None }
    }

    pub fn with_progress(mut self, pb: indicatif::ProgressBar) -> Self { self.progress = Some(pb); self }

    pub fn stage(&self) -> PipelineStage { self.stage }

    fn enter(&mut self, stage: PipelineStage) {
        log::debug!("pipeline: {} -> {}", self.stage, stage);
        self.stage = stage;
        if let Some(ref pb) = self.progress { pb.set_message(format!("{}", stage)); pb.tick(); }
    }

    pub fn run_path(&mut self, path: &Path) -> Result<EnrichmentOutput, PipelineError> {
        let name = path.to_string_lossy().to_string();
        let f = match std::fs::File::open(path) {
            Ok(f) => f,
            Err(source) => { self.enter(PipelineStage::Failed); return Err(PipelineError::Io { source_name: name, source }); }
        };
        self.run(std::io::BufReader::new(f), &name)
    }

    pub fn run<R: BufRead>(&mut self, mut reader: R, source_name: &str) -> Result<EnrichmentOutput, PipelineError> {
        self.enter(PipelineStage::Parsing);
        let mut stats = PipelineStats::default();
        let mut rows = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(source) => { self.enter(PipelineStage::Failed); return Err(PipelineError::Io { source_name: source_name.to_string(), source }); }
            }
            // Bad bytes become U+FFFD; only the affected row is at risk.
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            stats.lines_read += 1;
            if line.trim().is_empty() { continue; }
            match parse_row(line) {
                Ok(r) => rows.push(r),
                Err(e) => { stats.rows_skipped += 1; log::debug!("{}:{}: skipped row: {}", source_name, stats.lines_read, e); }
            }
            if let Some(ref pb) = self.progress && stats.lines_read % 500 == 0 { pb.set_message(format!("parsed {} lines", stats.lines_read)); pb.tick(); }
        }
        stats.rows_parsed = rows.len();

        self.enter(PipelineStage::Sanitizing);
        let cleaned: Vec<CleanRow> = rows.into_iter().map(|raw| self.sanitize_row(raw)).collect();

        self.enter(PipelineStage::Classifying);
        let classified: Vec<ClassifiedRow> = cleaned.into_iter().map(|c| self.classify_row(c)).collect();

        self.enter(PipelineStage::Synthesizing);
        let mut records: Vec<EnrichedFaultRecord> = classified.into_iter().map(|c| self.synthesize_row(c)).collect();
        link_related(&mut records);

        stats.by_brand = ranked(records.iter().map(|r| r.brand.as_str()));
        stats.by_category = ranked(records.iter().map(|r| r.category.as_str()));
        stats.by_severity = ranked(records.iter().map(|r| r.severity.as_str()));
        self.enter(PipelineStage::Complete);
        log::info!("{}: {} records enriched, {} rows skipped", source_name, stats.rows_parsed, stats.rows_skipped);
        Ok(EnrichmentOutput { records, stats })
    }

    fn sanitize_row(&self, raw: RawFaultRow) -> CleanRow {
        let description = self.sanitizer.clean(&raw.description);
        let joined = raw.solution_fragments.iter()
            .map(|s| s.trim())
            .filter(|s| s.chars().count() > MIN_FRAGMENT)
            .collect::<Vec<_>>()
            .join(". ")
            .replace('|', ". ");
        let solution = self.sanitizer.clean(&joined);
        CleanRow { raw, description, solution }
    }

    fn classify_row(&self, clean: CleanRow) -> ClassifiedRow {
        let causes = extract_causes(&clean.raw.cause, &self.sanitizer);
        let text = format!("{} {}", clean.description, self.sanitizer.clean(&clean.raw.cause));
        let category = categorize(&text);
        let severity = classify_severity(&text);
        ClassifiedRow { clean, causes, category, severity }
    }

    fn synthesize_row(&self, c: ClassifiedRow) -> EnrichedFaultRecord {
        let g = self.synthesizer.synthesize(c.category, c.severity);
        let raw = c.clean.raw;
        let description = if c.clean.description.is_empty() { DEFAULT_DESCRIPTION.to_string() } else { c.clean.description };
        let mut symptoms = vec![description.clone()];
        symptoms.extend(c.causes.iter().take(2).cloned());
        EnrichedFaultRecord {
            code: raw.code,
            model: if raw.model.is_empty() { DEFAULT_MODEL.to_string() } else { raw.model },
            brand: raw.brand,
            category: c.category,
            severity: c.severity,
            title: truncate_chars(&description, TITLE_MAX),
            description,
            symptoms,
            causes: c.causes,
            diagnostic_steps: g.diagnostic_steps,
            solutions: g.solutions,
            preventive_measures: g.preventive_measures,
            safety_warnings: g.safety_warnings,
            when_to_call_expert: g.when_to_call_expert,
            related_codes: Vec::new(),
            source_solution: c.clean.solution,
        }
    }
}

/// Fills `related_codes` with other codes sharing brand and category, in input order.
fn link_related(records: &mut [EnrichedFaultRecord]) {
    let mut groups: HashMap<(String, Category), Vec<String>> = HashMap::new();
    for r in records.iter() {
        let codes = groups.entry((r.brand.clone(), r.category)).or_default();
        if !codes.contains(&r.code) { codes.push(r.code.clone()); }
    }
    for r in records.iter_mut() {
        if let Some(codes) = groups.get(&(r.brand.clone(), r.category)) {
            r.related_codes = codes.iter().filter(|c| **c != r.code).take(RELATED_MAX).cloned().collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guidance::Difficulty;

    const SAMPLE: &str = "Brand,Model,Code,Description,Cause,Solution1,Solution2\n\
Perkins,1300,E042,\"coolant temperature high shutdown\",\"thermostat stuck, low coolant\",check level,replace thermostat\n\
\n\
Perkins,,E043,fuel injector fault,worn injector,replace injector,bleed the fuel system\n\
Cummins,QSK,101,sensor check,,,\n\
X,m,1,d,c,s\n\
Perkins,1300,E044,coolant temperature sensor low,open circuit (see,,\n";

    fn run_sample() -> EnrichmentOutput {
        EnrichmentPipeline::default().run(SAMPLE.as_bytes(), "sample").unwrap()
    }

    #[test]
    fn enriches_coolant_shutdown_end_to_end() {
        let out = run_sample();
        let r = &out.records[0];
        assert_eq!(r.code, "E042");
        assert_eq!(r.category, Category::CoolingSystem);
        assert_eq!(r.severity, FaultSeverity::Critical);
        assert_eq!(r.causes, vec!["Thermostat stuck", "Low coolant"]);
        assert_eq!(r.solutions[0].difficulty, Difficulty::Easy);
        assert_eq!(r.symptoms, vec!["coolant temperature high shutdown", "Thermostat stuck", "Low coolant"]);
        assert_eq!(r.source_solution, "check level. replace thermostat");
        assert!(r.when_to_call_expert.contains("immediately"));
        assert_eq!(r.related_codes, vec!["E044"]);
    }

    #[test]
    fn derived_defaults_and_stats() {
        let out = run_sample();
        assert_eq!(out.stats.lines_read, 7);
        assert_eq!(out.stats.rows_parsed, 4);
        assert_eq!(out.stats.rows_skipped, 2);
        let fuel = &out.records[1];
        assert_eq!(fuel.model, DEFAULT_MODEL);
        assert_eq!(fuel.category, Category::FuelSystem);
        assert_eq!(fuel.source_solution, "replace injector. bleed the fuel system");
        let cummins = &out.records[2];
        assert_eq!(cummins.causes, vec![crate::causes::UNKNOWN_CAUSE]);
        assert_eq!(cummins.severity, FaultSeverity::Info);
        assert!(cummins.related_codes.is_empty());
        assert_eq!(out.stats.by_brand[0], CountEntry { name: "Perkins".into(), count: 3 });
        assert_eq!(out.stats.by_category[0].name, "Cooling System");
    }

    #[test]
    fn pipeline_is_idempotent() {
        let a = serde_json::to_string(&run_sample()).unwrap();
        let b = serde_json::to_string(&run_sample()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_description_gets_default_and_title_is_bounded() {
        let long = "x".repeat(150);
        let input = format!("Volvo,TAD,1,https://a.b/c,cause here,fix it now\nVolvo,TAD,2,{},cause here,\n", long);
        let out = EnrichmentPipeline::default().run(input.as_bytes(), "t").unwrap();
        assert_eq!(out.records[0].description, DEFAULT_DESCRIPTION);
        assert_eq!(out.records[1].title.chars().count(), 100);
        assert_eq!(out.records[1].description.len(), 150);
    }

    #[test]
    fn invalid_utf8_row_does_not_abort_run() {
        let input: &[u8] = b"Perkins,1300,E042,coolant temperature high,thermostat stuck,check level\n\
Volvo,TAD,E\xff\xfe7,bad \xff bytes,worn part,replace part\n\
Cummins,QSK,P0087,fuel rail pressure low,clogged filter,replace filter\n";
        let mut p = EnrichmentPipeline::default();
        let out = p.run(input, "bytes").unwrap();
        assert_eq!(p.stage(), PipelineStage::Complete);
        assert_eq!(out.stats.lines_read, 3);
        assert_eq!(out.stats.rows_parsed, 3);
        let codes: Vec<&str> = out.records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["E042", "E\u{FFFD}\u{FFFD}7", "P0087"]);
    }

    #[test]
    fn missing_file_fails() {
        let mut p = EnrichmentPipeline::default();
        let path = std::env::temp_dir().join("powerdiag_missing_input.csv");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(p.run_path(&path), Err(PipelineError::Io { .. })));
        assert_eq!(p.stage(), PipelineStage::Failed);
    }

    #[test]
    fn reads_from_file() {
        let path = std::env::temp_dir().join("powerdiag_pipeline_input.csv");
        std::fs::write(&path, SAMPLE).unwrap();
        let mut p = EnrichmentPipeline::default();
        let out = p.run_path(&path).unwrap();
        assert_eq!(out.records.len(), 4);
        assert_eq!(p.stage(), PipelineStage::Complete);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn source_solution_is_omitted_when_empty() {
        let out = run_sample();
        let v = serde_json::to_value(&out.records[2]).unwrap();
        assert!(v.get("sourceSolution").is_none());
        assert!(v.get("whenToCallExpert").is_some());
    }
}
