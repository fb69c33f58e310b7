use crate::classify::FaultSeverity;
use crate::pipeline::EnrichedFaultRecord;

pub fn by_brand<'a>(records: &'a [EnrichedFaultRecord], brand: &str) -> Vec<&'a EnrichedFaultRecord> {
    records.iter().filter(|r| r.brand.eq_ignore_ascii_case(brand.trim())).collect()
}

pub fn by_category<'a>(records: &'a [EnrichedFaultRecord], category: &str) -> Vec<&'a EnrichedFaultRecord> {
    let needle = category.trim().to_lowercase();
    records.iter().filter(|r| r.category.as_str().to_lowercase().contains(&needle)).collect()
}

pub fn by_severity(records: &[EnrichedFaultRecord], severity: FaultSeverity) -> Vec<&EnrichedFaultRecord> {
    records.iter().filter(|r| r.severity == severity).collect()
}

fn search_hit(r: &EnrichedFaultRecord, needle_lower: &str) -> bool {
    [r.code.as_str(), r.title.as_str(), r.description.as_str(), r.brand.as_str()]
        .iter()
        .any(|f| f.to_lowercase().contains(needle_lower))
}

pub fn search<'a>(records: &'a [EnrichedFaultRecord], query: &str) -> Vec<&'a EnrichedFaultRecord> {
    let needle = query.trim().to_lowercase();
    records.iter().filter(|r| search_hit(r, &needle)).collect()
}

/// Conjunction of the optional filters; an empty filter keeps everything.
#[derive(Clone, Debug, Default)]
pub struct FaultFilter {
    pub brand: Option<String>,
    pub category: Option<String>,
    pub severity: Option<FaultSeverity>,
    pub search: Option<String>,
}

impl FaultFilter {
    pub fn is_empty(&self) -> bool { self.brand.is_none() && self.category.is_none() && self.severity.is_none() && self.search.is_none() }

    pub fn matches(&self, r: &EnrichedFaultRecord) -> bool {
        if let Some(b) = self.brand.as_ref() && !r.brand.eq_ignore_ascii_case(b.trim()) { return false; }
        if let Some(c) = self.category.as_ref() && !r.category.as_str().to_lowercase().contains(&c.trim().to_lowercase()) { return false; }
        if let Some(s) = self.severity && r.severity != s { return false; }
        if let Some(q) = self.search.as_ref() && !search_hit(r, &q.trim().to_lowercase()) { return false; }
        true
    }

    pub fn apply<'a>(&self, records: &'a [EnrichedFaultRecord]) -> Vec<&'a EnrichedFaultRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::EnrichmentPipeline;

    fn records() -> Vec<EnrichedFaultRecord> {
        let csv = "Perkins,1300,E042,coolant temperature high shutdown,thermostat stuck,replace thermostat\n\
Cummins,QSK,P0087,fuel rail pressure low,clogged filter,replace filter\n\
perkins,1100,E100,crank sensor check,worn wiring,repair wiring\n";
        EnrichmentPipeline::default().run(csv.as_bytes(), "q").unwrap().records
    }

    #[test]
    fn brand_is_case_insensitive_equality() {
        let r = records();
        assert_eq!(by_brand(&r, "PERKINS").len(), 2);
        assert!(by_brand(&r, "Perk").is_empty());
    }

    #[test]
    fn category_is_substring() {
        let r = records();
        let hits: Vec<&str> = by_category(&r, "system").iter().map(|x| x.code.as_str()).collect();
        assert_eq!(hits, vec!["E042", "P0087"]);
    }

    #[test]
    fn severity_and_search() {
        let r = records();
        assert_eq!(by_severity(&r, FaultSeverity::Critical).len(), 1);
        assert_eq!(search(&r, "p0087").len(), 1);
        assert_eq!(search(&r, "cummins").len(), 1);
        assert_eq!(search(&r, "thermostat").len(), 0);
    }

    #[test]
    fn filter_combines_conditions() {
        let r = records();
        let f = FaultFilter { brand: Some("perkins".into()), severity: Some(FaultSeverity::Info), ..Default::default() };
        let hits = f.apply(&r);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "E100");
        assert!(FaultFilter::default().is_empty());
        assert_eq!(FaultFilter::default().apply(&r).len(), 3);
    }
}
