use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFaultRow {
    pub brand: String,
    pub model: String,
    pub code: String,
    pub description: String,
    pub cause: String,
    pub solution_fragments: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MalformedRow {
    #[error("expected at least 6 fields, found {0}")]
    TooFewFields(usize),
    #[error("header row")]
    Header,
    #[error("empty brand")]
    EmptyBrand,
    #[error("brand '{0}' too short")]
    ShortBrand(String),
    #[error("empty fault code")]
    EmptyCode,
}

/// Splits one line on commas. A `"` toggles quoting and is dropped; fields are trimmed.
/// Escaped quotes are not recognised.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => { fields.push(cur.trim().to_string()); cur.clear(); }
            _ => cur.push(ch),
        }
    }
    fields.push(cur.trim().to_string());
    fields
}

pub fn parse_row(line: &str) -> Result<RawFaultRow, MalformedRow> {
    let mut f = parse_line(line.trim_end_matches(['\r', '\n']));
    if f.len() < 6 { return Err(MalformedRow::TooFewFields(f.len())); }
    if f[0].is_empty() { return Err(MalformedRow::EmptyBrand); }
    if f[0] == "Brand" { return Err(MalformedRow::Header); }
    if f[0].chars().count() < 2 { return Err(MalformedRow::ShortBrand(f[0].clone())); }
    if f[2].is_empty() { return Err(MalformedRow::EmptyCode); }
    let solution_fragments = f.split_off(5);
    let mut it = f.into_iter();
    let mut next = || it.next().unwrap_or_default();
    Ok(RawFaultRow { brand: next(), model: next(), code: next(), description: next(), cause: next(), solution_fragments })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_commas_stay_in_field() {
        let f = parse_line(r#"Perkins, 1300 ,E042,"coolant temperature high, shutdown",x,y"#);
        assert_eq!(f, vec!["Perkins", "1300", "E042", "coolant temperature high, shutdown", "x", "y"]);
    }

    #[test]
    fn unbalanced_quote_swallows_rest() {
        let f = parse_line(r#"a,"b,c,d"#);
        assert_eq!(f, vec!["a", "b,c,d"]);
    }

    #[test]
    fn row_keeps_all_solution_fragments() {
        let r = parse_row(r#"Perkins,1300,E042,"coolant temperature high shutdown","thermostat stuck, low coolant",check level,replace thermostat"#).unwrap();
        assert_eq!(r.brand, "Perkins");
        assert_eq!(r.code, "E042");
        assert_eq!(r.cause, "thermostat stuck, low coolant");
        assert_eq!(r.solution_fragments, vec!["check level", "replace thermostat"]);
    }

    #[test]
    fn malformed_rows_are_rejected() {
        assert_eq!(parse_row("a,b,c"), Err(MalformedRow::TooFewFields(3)));
        assert_eq!(parse_row("Brand,Model,Code,Description,Cause,Solution"), Err(MalformedRow::Header));
        assert_eq!(parse_row(",m,c,d,c,s"), Err(MalformedRow::EmptyBrand));
        assert_eq!(parse_row("X,m,c,d,c,s"), Err(MalformedRow::ShortBrand("X".into())));
        assert_eq!(parse_row("Volvo,m,,d,c,s"), Err(MalformedRow::EmptyCode));
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let r = parse_row("Volvo,TAD,101,desc,cause,fix\r\n").unwrap();
        assert_eq!(r.solution_fragments, vec!["fix"]);
    }
}
