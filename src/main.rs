use std::path::Path;
use anyhow::{Context, Result};
use clap::{ArgAction, ColorChoice, CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use powerdiag::config::{load_config, AppConfig, LogFormat, OutputFmt};
use powerdiag::guidance::{GuidanceSynthesizer, DEFAULT_CONTACT};
use powerdiag::pipeline::{EnrichedFaultRecord, EnrichmentOutput, EnrichmentPipeline, PipelineStats};
use powerdiag::query::FaultFilter;
use powerdiag::sanitize::{Sanitizer, DEFAULT_BLOCKED_TERMS};
use powerdiag::{analyze, report, summarize, DiagnosticResult, DiagnosticSummary, FaultSeverity};

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
enum TextFormat { Lines, Table }

fn parse_reading(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "PowerDiag",
    about = "Generator parameter diagnostics and fault-code knowledge base builder",
    long_about = "Generator parameter diagnostics and fault-code knowledge base builder. Classifies technician readings against operating bands and enriches raw fault-code CSV exports into structured repair guidance.",
    after_long_help = "Examples:\n  PowerDiag --reading oilPressure=12 --reading coolantTemp=98\n  PowerDiag --readings-file readings.json --output json --fail-on-critical\n  PowerDiag --list-params\n  PowerDiag --enrich faults.csv --kb-out kb.json --csv-path kb.csv\n  PowerDiag --enrich faults.csv --brand Perkins --severity critical --text-format table",
    color = ColorChoice::Auto
)]
struct Args {
    /// Parameter reading as KEY=VALUE (repeatable)
    #[arg(long, short = 'r', value_parser = parse_reading)]
    reading: Vec<(String, String)>,
    /// JSON object of readings, e.g. {"oilPressure": "12"}
    #[arg(long)]
    readings_file: Option<String>,
    #[arg(long, default_value_t = false)]
    list_params: bool,
    /// Raw fault-code CSV to enrich
    #[arg(long, short = 'e')]
    enrich: Option<String>,
    /// Knowledge base artifact (.json or .yaml)
    #[arg(long, short = 'k')]
    kb_out: Option<String>,
    #[arg(long)]
    csv_path: Option<String>,
    #[arg(long)]
    md_path: Option<String>,
    #[arg(long, short = 'b')]
    brand: Option<String>,
    #[arg(long, short = 'c')]
    category: Option<String>,
    #[arg(long, short = 's')]
    severity: Option<FaultSeverity>,
    #[arg(long)]
    search: Option<String>,
    #[arg(long, num_args = 0.., value_delimiter = ',')]
    blocked_terms: Vec<String>,
    /// Who technicians are told to escalate to
    #[arg(long)]
    contact: Option<String>,
    #[arg(long, short = 'n', default_value_t = 20)]
    top: usize,
    #[arg(long, short = 'o', value_enum, default_value = "text")]
    output: OutputFmt,
    #[arg(long, value_enum, default_value = "lines")]
    text_format: TextFormat,
    #[arg(long, short = 'C', default_value_t = false)]
    no_color: bool,
    #[arg(long, default_value_t = false)]
    force_color: bool,
    #[arg(long, default_value_t = false)]
    progress: bool,
    /// Exit with status 2 when any reading is critical
    #[arg(long, default_value_t = false)]
    fail_on_critical: bool,
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
    #[arg(long)]
    log_path: Option<String>,
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,
    #[arg(long, value_enum)]
    completions: Option<Shell>,
    #[arg(long)]
    completions_out: Option<String>,
    #[arg(long)]
    config: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            reading: vec![],
            readings_file: None,
            list_params: false,
            enrich: None,
            kb_out: None,
            csv_path: None,
            md_path: None,
            brand: None,
            category: None,
            severity: None,
            search: None,
            blocked_terms: vec![],
            contact: None,
            top: 20,
            output: OutputFmt::Text,
            text_format: TextFormat::Lines,
            no_color: false,
            force_color: false,
            progress: false,
            fail_on_critical: false,
            log_level: None,
            log_format: None,
            log_path: None,
            verbose: 0,
            quiet: false,
            completions: None,
            completions_out: None,
            config: None,
        }
    }
}

#[derive(Serialize)]
struct DiagnosticsReport<'a> {
    summary: DiagnosticSummary,
    results: &'a [DiagnosticResult],
}

#[derive(Serialize)]
struct KnowledgeView<'a> {
    stats: &'a PipelineStats,
    records: Vec<&'a EnrichedFaultRecord>,
}

fn main() -> Result<()> {
    let mut args = Args::parse();
    if let Some(sh) = args.completions {
        let mut cmd = Args::command();
        if let Some(path) = args.completions_out.as_ref() {
            let mut f = std::fs::File::create(path).with_context(|| format!("creating {}", path))?;
            clap_complete::generate(sh, &mut cmd, "PowerDiag", &mut f);
        } else {
            clap_complete::generate(sh, &mut cmd, "PowerDiag", &mut std::io::stdout());
        }
        return Ok(());
    }
    if let Some(cfg) = load_config(args.config.as_deref())? { apply_config(&mut args, cfg); }
    init_logging(&args);
    let term = std::env::var("TERM").unwrap_or_default();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let color_default = std::io::stdout().is_terminal() && !no_color_env && term != "dumb";
    report::init_color(if args.force_color { true } else { color_default && !args.no_color });

    let mut did_work = false;
    if args.list_params {
        did_work = true;
        match args.output {
            OutputFmt::Json => println!("{}", serde_json::to_string_pretty(powerdiag::params::all_specs())?),
            OutputFmt::Text => println!("{}", report::params_table()),
        }
    }

    let readings = collect_readings(&args)?;
    let mut critical = false;
    if !readings.is_empty() {
        did_work = true;
        let results = analyze(readings);
        let summary = summarize(&results);
        critical = summary.critical > 0;
        emit_diagnostics(&args, &results, &summary)?;
    }

    if let Some(input) = args.enrich.clone() {
        did_work = true;
        let out = run_enrichment(&args, Path::new(&input))?;
        emit_knowledge_base(&args, &out)?;
    }

    if !did_work {
        Args::command().print_help().context("printing help")?;
        println!();
    }
    if args.fail_on_critical && critical { std::process::exit(2); }
    Ok(())
}

fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if args.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if let Some(lvl) = args.log_level {
        let f = match lvl { LogLevel::Error => log::LevelFilter::Error, LogLevel::Warn => log::LevelFilter::Warn, LogLevel::Info => log::LevelFilter::Info, LogLevel::Debug => log::LevelFilter::Debug, LogLevel::Trace => log::LevelFilter::Trace };
        builder.filter_level(f);
    } else if args.verbose > 0 {
        let f = if args.verbose >= 3 { log::LevelFilter::Trace } else if args.verbose == 2 { log::LevelFilter::Debug } else { log::LevelFilter::Info };
        builder.filter_level(f);
    }
    if let Some(fmt) = args.log_format {
        match fmt {
            LogFormat::Json => {
                builder.format(|buf, record| {
                    use std::io::Write;
                    let obj = serde_json::json!({
                        "ts": chrono::Local::now().to_rfc3339(),
                        "level": record.level().to_string(),
                        "target": record.target(),
                        "msg": record.args().to_string(),
                    });
                    writeln!(buf, "{}", obj)
                });
            }
            LogFormat::Text => {
                builder.format(|buf, record| {
                    use std::io::Write;
                    let ts = chrono::Local::now().format("%H:%M:%S");
                    writeln!(buf, "[{:<5} {}] {}", record.level(), ts, record.args())
                });
            }
        }
    }
    if let Some(path) = args.log_path.as_ref() {
        match std::fs::File::create(path) {
            Ok(f) => { builder.target(env_logger::Target::Pipe(Box::new(f))); }
            Err(e) => { eprintln!("Failed to open log file {}: {}", path, e); }
        }
    }
    builder.init();
}

fn apply_config(args: &mut Args, cfg: AppConfig) {
    if args.blocked_terms.is_empty() && let Some(v) = cfg.blocked_terms { args.blocked_terms = v; }
    if args.contact.is_none() && let Some(v) = cfg.contact { args.contact = Some(v); }
    if args.output == OutputFmt::Text && let Some(v) = cfg.output { args.output = v; }
    if args.kb_out.is_none() && let Some(v) = cfg.kb_out { args.kb_out = Some(v); }
    if args.csv_path.is_none() && let Some(v) = cfg.csv_path { args.csv_path = Some(v); }
    if args.md_path.is_none() && let Some(v) = cfg.md_path { args.md_path = Some(v); }
    if let Some(v) = cfg.progress { args.progress = args.progress || v; }
    if args.log_format.is_none() && let Some(v) = cfg.log_format { args.log_format = Some(v); }
    if args.log_path.is_none() && let Some(v) = cfg.log_path { args.log_path = Some(v); }
    if args.top == 20 && let Some(v) = cfg.top { args.top = v; }
}

/// JSON values may be strings or numbers; anything else is skipped.
fn readings_from_json(text: &str) -> Result<Vec<(String, String)>> {
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text).context("readings file must be a JSON object")?;
    let mut out = Vec::new();
    for (k, v) in map {
        match v {
            serde_json::Value::String(s) => out.push((k, s)),
            serde_json::Value::Number(n) => out.push((k, n.to_string())),
            other => log::warn!("Ignoring reading {}: unsupported value {}", k, other),
        }
    }
    Ok(out)
}

fn collect_readings(args: &Args) -> Result<Vec<(String, String)>> {
    let mut readings = Vec::new();
    if let Some(p) = args.readings_file.as_ref() {
        let text = std::fs::read_to_string(p).with_context(|| format!("reading {}", p))?;
        readings.extend(readings_from_json(&text).with_context(|| format!("parsing {}", p))?);
    }
    readings.extend(args.reading.iter().cloned());
    Ok(readings)
}

fn emit_diagnostics(args: &Args, results: &[DiagnosticResult], summary: &DiagnosticSummary) -> Result<()> {
    match args.output {
        OutputFmt::Json => println!("{}", serde_json::to_string_pretty(&DiagnosticsReport { summary: *summary, results })?),
        OutputFmt::Text => match args.text_format {
            TextFormat::Lines => print!("{}", report::render_diagnostics_text(results, summary)),
            TextFormat::Table => { println!("{}", report::diagnostics_table(results)); println!("{}", report::render_summary_line(summary)); }
        },
    }
    // Artifact paths belong to the knowledge base when enriching.
    if args.enrich.is_some() { return Ok(()); }
    if let Some(p) = args.md_path.as_ref() {
        std::fs::write(p, report::render_diagnostics_markdown(results, summary)).with_context(|| format!("writing {}", p))?;
        log::info!("wrote {}", p);
    }
    if let Some(p) = args.csv_path.as_ref() {
        report::write_diagnostics_csv(Path::new(p), results).with_context(|| format!("writing {}", p))?;
        log::info!("wrote {}", p);
    }
    Ok(())
}

fn run_enrichment(args: &Args, input: &Path) -> Result<EnrichmentOutput> {
    let sanitizer = if args.blocked_terms.is_empty() { Sanitizer::new(DEFAULT_BLOCKED_TERMS) } else { Sanitizer::new(args.blocked_terms.as_slice()) };
    let synthesizer = GuidanceSynthesizer::new(args.contact.clone().unwrap_or_else(|| DEFAULT_CONTACT.to_string()));
    let mut pipeline = EnrichmentPipeline::new(sanitizer, synthesizer);
    let pb = if args.progress { Some(indicatif::ProgressBar::new_spinner()) } else { None };
    if let Some(ref pb) = pb { pb.set_message(format!("Enriching {}", input.to_string_lossy())); pipeline = pipeline.with_progress(pb.clone()); }
    let out = pipeline.run_path(input);
    if let Some(pb) = pb { pb.finish_and_clear(); }
    Ok(out?)
}

fn build_filter(args: &Args) -> FaultFilter {
    FaultFilter { brand: args.brand.clone(), category: args.category.clone(), severity: args.severity, search: args.search.clone() }
}

fn emit_knowledge_base(args: &Args, out: &EnrichmentOutput) -> Result<()> {
    let filter = build_filter(args);
    let shown = filter.apply(&out.records);
    match args.output {
        OutputFmt::Json => println!("{}", serde_json::to_string_pretty(&KnowledgeView { stats: &out.stats, records: shown.iter().take(args.top).copied().collect() })?),
        OutputFmt::Text => {
            print!("{}", report::render_stats_text(out, args.top));
            if !filter.is_empty() { println!("Matching records: {}", shown.len()); }
            match args.text_format {
                TextFormat::Table => println!("{}", report::records_table(&shown, args.top)),
                TextFormat::Lines => for r in shown.iter().take(args.top) {
                    println!("{} {} [{}] {}: {}", report::paint(&r.severity.as_str().to_uppercase(), "1"), r.code, r.brand, r.category, r.title);
                },
            }
        }
    }
    if let Some(p) = args.kb_out.as_ref() {
        report::write_kb(Path::new(p), out).with_context(|| format!("writing {}", p))?;
        log::info!("wrote {} records to {}", out.records.len(), p);
    }
    if let Some(p) = args.csv_path.as_ref() {
        report::write_records_csv(Path::new(p), &shown).with_context(|| format!("writing {}", p))?;
        log::info!("wrote {}", p);
    }
    if let Some(p) = args.md_path.as_ref() {
        std::fs::write(p, report::render_kb_markdown(out, &shown, args.top)).with_context(|| format!("writing {}", p))?;
        log::info!("wrote {}", p);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reading_requires_key_and_equals() {
        assert_eq!(parse_reading(" oilPressure = 12 "), Ok(("oilPressure".to_string(), "12".to_string())));
        assert_eq!(parse_reading("fuelLevel="), Ok(("fuelLevel".to_string(), String::new())));
        assert!(parse_reading("oilPressure").is_err());
        assert!(parse_reading("=12").is_err());
    }

    #[test]
    fn cli_parses_readings_and_severity() {
        let a = Args::try_parse_from(["PowerDiag", "-r", "oilPressure=12", "--reading", "rpm=1500", "--severity", "critical", "-vv"]).unwrap();
        assert_eq!(a.reading.len(), 2);
        assert_eq!(a.severity, Some(FaultSeverity::Critical));
        assert_eq!(a.verbose, 2);
        assert!(Args::try_parse_from(["PowerDiag", "--reading", "oops"]).is_err());
    }

    #[test]
    fn json_readings_accept_strings_and_numbers() {
        let r = readings_from_json(r#"{"oilPressure": "12", "rpm": 1500, "note": true}"#).unwrap();
        assert_eq!(r.len(), 2);
        assert!(r.contains(&("rpm".to_string(), "1500".to_string())));
        assert!(readings_from_json("[1,2]").is_err());
    }

    #[test]
    fn json_readings_keep_file_order() {
        let r = readings_from_json(r#"{"rpm": "1460", "coolantTemp": "98", "batteryVoltage": "23"}"#).unwrap();
        let keys: Vec<&str> = r.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["rpm", "coolantTemp", "batteryVoltage"]);
    }

    #[test]
    fn config_fills_only_unset_flags() {
        let mut a = Args { contact: Some("Cli Contact".into()), top: 7, ..Default::default() };
        let cfg = AppConfig { contact: Some("File Contact".into()), top: Some(3), kb_out: Some("kb.yaml".into()), output: Some(OutputFmt::Json), progress: Some(true), ..Default::default() };
        apply_config(&mut a, cfg);
        assert_eq!(a.contact.as_deref(), Some("Cli Contact"));
        assert_eq!(a.top, 7);
        assert_eq!(a.kb_out.as_deref(), Some("kb.yaml"));
        assert_eq!(a.output, OutputFmt::Json);
        assert!(a.progress);
    }

    #[test]
    fn readings_file_feeds_analysis() {
        let p = std::env::temp_dir().join("powerdiag_readings_test.json");
        std::fs::write(&p, r#"{"oilPressure": "12"}"#).unwrap();
        let a = Args { readings_file: Some(p.to_string_lossy().to_string()), reading: vec![("frequency".into(), "50".into())], ..Default::default() };
        let readings = collect_readings(&a).unwrap();
        let results = analyze(readings);
        assert_eq!(results.len(), 2);
        assert!(results[0].message.contains("STOP ENGINE"));
        let _ = std::fs::remove_file(&p);
    }

    #[test]
    fn enrichment_writes_artifacts_for_filtered_records() {
        let dir = std::env::temp_dir();
        let input = dir.join("powerdiag_cli_faults.csv");
        std::fs::write(&input, "Perkins,1300,E042,coolant temperature high shutdown,\"thermostat stuck, low coolant\",check level\nCummins,QSK,P0087,fuel rail pressure low,clogged filter,replace filter\n").unwrap();
        let kb = dir.join("powerdiag_cli_kb.json");
        let csv = dir.join("powerdiag_cli_kb.csv");
        let a = Args {
            enrich: Some(input.to_string_lossy().to_string()),
            kb_out: Some(kb.to_string_lossy().to_string()),
            csv_path: Some(csv.to_string_lossy().to_string()),
            brand: Some("perkins".into()),
            contact: Some("Depot".into()),
            ..Default::default()
        };
        let out = run_enrichment(&a, &input).unwrap();
        assert!(out.records[0].when_to_call_expert.starts_with("Contact Depot"));
        emit_knowledge_base(&a, &out).unwrap();
        let saved: EnrichmentOutput = serde_json::from_str(&std::fs::read_to_string(&kb).unwrap()).unwrap();
        assert_eq!(saved.records.len(), 2);
        assert_eq!(std::fs::read_to_string(&csv).unwrap().lines().count(), 2);
        for p in [input, kb, csv] { let _ = std::fs::remove_file(p); }
    }
}
