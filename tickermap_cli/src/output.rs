use serde::Serialize;
use tabled::{Table, Tabled};
use tickermap_lib::finnhub_api::types::CompanyProfile;
use tickermap_lib::master_list::Mismatch;
use tickermap_lib::{MappingEntry, RunSummary, ValidationReport};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled, Serialize)]
struct MappingRow {
    #[tabled(rename = "Ticker")]
    #[serde(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Company ID")]
    #[serde(rename = "Company ID")]
    company_id: String,
    #[tabled(rename = "Match")]
    #[serde(rename = "Match")]
    match_type: String,
    #[tabled(rename = "Score")]
    #[serde(rename = "Score")]
    score: String,
    #[tabled(rename = "Created")]
    #[serde(rename = "Created")]
    created_at: String,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Count")]
    count: usize,
}

#[derive(Tabled)]
struct MismatchRow {
    #[tabled(rename = "Ticker")]
    ticker: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Got")]
    actual: String,
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn build_mapping_rows(entries: &[MappingEntry]) -> Vec<MappingRow> {
    entries
        .iter()
        .map(|e| MappingRow {
            ticker: e.ticker.clone(),
            company_id: e.company_id.clone(),
            match_type: e.match_type.to_string(),
            score: format!("{:.1}", e.score),
            created_at: e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect()
}

fn build_summary_rows(summary: &RunSummary) -> Vec<CountRow> {
    let mut rows = vec![
        CountRow { outcome: "processed".into(), count: summary.processed },
        CountRow { outcome: "exact".into(), count: summary.exact },
        CountRow { outcome: "auto fuzzy".into(), count: summary.auto },
        CountRow { outcome: "manual".into(), count: summary.manual },
        CountRow { outcome: "rejected".into(), count: summary.rejected },
        CountRow { outcome: "skipped".into(), count: summary.skipped },
        CountRow { outcome: "errors".into(), count: summary.errors },
        CountRow { outcome: "already mapped".into(), count: summary.already_mapped },
    ];
    if summary.kept_existing > 0 {
        rows.push(CountRow { outcome: "kept existing".into(), count: summary.kept_existing });
    }
    rows
}

fn build_mismatch_rows(wrong: &[Mismatch]) -> Vec<MismatchRow> {
    wrong
        .iter()
        .map(|m| MismatchRow {
            ticker: m.ticker.clone(),
            expected: m.expected.clone(),
            actual: m.actual.clone(),
        })
        .collect()
}

fn build_profile_rows(profile: &CompanyProfile) -> Vec<FieldRow> {
    let fields: [(&'static str, &Option<String>); 11] = [
        ("Name", &profile.name),
        ("Ticker", &profile.ticker),
        ("Exchange", &profile.exchange),
        ("Country", &profile.country),
        ("Currency", &profile.currency),
        ("ISIN", &profile.isin),
        ("CUSIP", &profile.cusip),
        ("Industry", &profile.finnhub_industry),
        ("Sector", &profile.gsector),
        ("Website", &profile.weburl),
        ("IPO", &profile.ipo),
    ];
    fields
        .into_iter()
        .filter_map(|(field, value)| value.as_ref().map(|v| FieldRow { field, value: v.clone() }))
        .collect()
}

// -- Table output --

pub fn print_mappings_table(entries: &[MappingEntry]) {
    println!("{}", Table::new(build_mapping_rows(entries)));
}

pub fn print_summary_table(summary: &RunSummary) {
    println!("{}", Table::new(build_summary_rows(summary)));
    if !summary.verdicts.is_empty() {
        let rows: Vec<CountRow> = summary
            .verdicts
            .iter()
            .map(|(verdict, count)| CountRow { outcome: verdict.to_string(), count: *count })
            .collect();
        println!("{}", Table::new(rows));
    }
}

pub fn print_report_table(report: &ValidationReport) {
    let rows = vec![
        CountRow { outcome: "master list".into(), count: report.total },
        CountRow { outcome: "correct".into(), count: report.correct },
        CountRow { outcome: "wrong".into(), count: report.wrong.len() },
        CountRow { outcome: "missing".into(), count: report.missing.len() },
    ];
    println!("{}", Table::new(rows));
    println!("Accuracy: {:.1}%", report.accuracy);
    if !report.wrong.is_empty() {
        println!("{}", Table::new(build_mismatch_rows(&report.wrong)));
    }
    if !report.missing.is_empty() {
        println!("Missing in mappings: {}", report.missing.join(", "));
    }
}

pub fn print_profile_table(profile: &CompanyProfile) {
    println!("{}", Table::new(build_profile_rows(profile)));
}

// -- JSON output --

pub fn print_mappings_json(entries: &[MappingEntry]) {
    print_json(&build_mapping_rows(entries));
}

pub fn print_json<T: Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
