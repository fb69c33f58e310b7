use std::path::{Path, PathBuf};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_ENV: &str = "POWERDIAG_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "PowerDiag.toml";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFmt { Text, Json }

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat { Text, Json }

/// Values from `PowerDiag.toml`. Every field is optional; command-line flags take precedence.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub blocked_terms: Option<Vec<String>>,
    pub contact: Option<String>,
    pub output: Option<OutputFmt>,
    pub kb_out: Option<String>,
    pub csv_path: Option<String>,
    pub md_path: Option<String>,
    pub progress: Option<bool>,
    pub log_format: Option<LogFormat>,
    pub log_path: Option<String>,
    pub top: Option<usize>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },
}

pub fn parse_config(text: &str, path: &str) -> Result<AppConfig, ConfigError> {
    toml::from_str::<AppConfig>(text).map_err(|source| ConfigError::Parse { path: path.to_string(), source })
}

fn read_config(p: &Path) -> Result<AppConfig, ConfigError> {
    let path = p.to_string_lossy().to_string();
    let text = std::fs::read_to_string(p).map_err(|source| ConfigError::Read { path: path.clone(), source })?;
    parse_config(&text, &path)
}

/// Loads the config named by `path_opt`, else `$POWERDIAG_CONFIG`, else `./PowerDiag.toml`.
///
/// An explicitly named file must exist; a missing default file yields `Ok(None)`.
pub fn load_config(path_opt: Option<&str>) -> Result<Option<AppConfig>, ConfigError> {
    let explicit = path_opt.map(|s| s.to_string()).or_else(|| std::env::var(CONFIG_ENV).ok().filter(|s| !s.trim().is_empty()));
    if let Some(p) = explicit {
        log::debug!("loading config {}", p);
        return read_config(Path::new(&p)).map(Some);
    }
    let def = PathBuf::from(DEFAULT_CONFIG_FILE);
    if !def.exists() { return Ok(None); }
    log::debug!("loading default config {}", def.to_string_lossy());
    read_config(&def).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_fields() {
        let cfg = parse_config(r#"
blocked_terms = ["Acme", "see page"]
contact = "Acme Field Service"
output = "json"
kb_out = "kb.yaml"
csv_path = "kb.csv"
md_path = "kb.md"
progress = true
log_format = "json"
log_path = "powerdiag.log"
top = 5
"#, "inline").unwrap();
        assert_eq!(cfg.blocked_terms.as_deref(), Some(&["Acme".to_string(), "see page".to_string()][..]));
        assert_eq!(cfg.contact.as_deref(), Some("Acme Field Service"));
        assert_eq!(cfg.output, Some(OutputFmt::Json));
        assert_eq!(cfg.log_format, Some(LogFormat::Json));
        assert_eq!(cfg.top, Some(5));
        assert_eq!(cfg.progress, Some(true));
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse_config("", "inline").unwrap(), AppConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(parse_config("colour = true", "inline"), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn explicit_path_is_read_and_must_exist() {
        let p = std::env::temp_dir().join("powerdiag_config_test.toml");
        let ps = p.to_string_lossy().to_string();
        std::fs::write(&p, "top = 3\ncontact = \"Depot\"\n").unwrap();
        let cfg = load_config(Some(ps.as_str())).unwrap().unwrap();
        assert_eq!(cfg.top, Some(3));
        let _ = std::fs::remove_file(&p);
        assert!(matches!(load_config(Some(ps.as_str())), Err(ConfigError::Read { .. })));
    }
}
