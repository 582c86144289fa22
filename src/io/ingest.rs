//! Application CSV and JSON ingest.
//!
//! Batch files are read leniently: any missing column or empty cell takes the
//! field default, unknown columns are carried through untouched for export,
//! and a bad value rejects only its own row. Every data row is kept, parsed
//! or not, so exports can line results up with the input.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use csv::StringRecord;

use crate::domain::Application;
use crate::error::AppError;

/// Alternate header spellings accepted for application fields.
const HEADER_ALIASES: [(&str, &str); 5] = [
    ("late_payments", "late_payments_90d"),
    ("dti", "debt_to_income"),
    ("utilization", "credit_utilization"),
    ("employment_years", "employment_length"),
    ("inquiries", "recent_inquiries"),
];

/// Columns the ingest understands (application fields plus `id`/`defaulted`).
const KNOWN_COLUMNS: [&str; 23] = [
    "id",
    "defaulted",
    "age",
    "income",
    "credit_score",
    "debt_to_income",
    "loan_amount",
    "employment_length",
    "number_of_credit_lines",
    "late_payments_90d",
    "credit_utilization",
    "recent_inquiries",
    "existing_loans",
    "savings_balance",
    "monthly_expenses",
    "education_level",
    "marital_status",
    "dependents",
    "property_ownership",
    "business_owner",
    "credit_history_length",
    "industry_risk",
    "geographic_risk",
];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

/// A successfully parsed row.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    pub application: Application,
    /// Observed default outcome, when the file carries labels.
    pub defaulted: Option<bool>,
}

/// One data row of the input file.
#[derive(Debug, Clone)]
pub struct IngestEntry {
    /// 1-based line number in the file.
    pub line: usize,
    pub id: String,
    /// Raw cell values, in header order.
    pub fields: Vec<String>,
    pub parsed: Result<ParsedRow, String>,
}

#[derive(Debug, Clone)]
pub struct IngestedBatch {
    /// Header names as written in the file.
    pub headers: Vec<String>,
    pub entries: Vec<IngestEntry>,
}

impl IngestedBatch {
    pub fn rows_read(&self) -> usize {
        self.entries.len()
    }

    pub fn rows_valid(&self) -> usize {
        self.entries.iter().filter(|e| e.parsed.is_ok()).count()
    }

    pub fn row_errors(&self) -> Vec<RowError> {
        self.entries
            .iter()
            .filter_map(|e| {
                e.parsed.as_ref().err().map(|message| RowError {
                    line: e.line,
                    id: Some(e.id.clone()),
                    message: message.clone(),
                })
            })
            .collect()
    }
}

/// Load an application CSV.
///
/// Fails with exit code 2 when the file cannot be read or has no usable
/// header, and with exit code 3 when no row parses.
pub fn load_applications(path: &Path) -> Result<IngestedBatch, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    let batch = read_applications(file)?;

    if batch.rows_valid() == 0 {
        return Err(AppError::no_data(format!(
            "No valid application rows in '{}' ({} rows read).",
            path.display(),
            batch.rows_read()
        )));
    }
    Ok(batch)
}

/// Parse application rows from any CSV reader.
pub fn read_applications<R: std::io::Read>(mut input: R) -> Result<IngestedBatch, AppError> {
    let mut data = Vec::new();
    input
        .read_to_end(&mut data)
        .map_err(|e| AppError::input(format!("Failed to read CSV: {e}")))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_slice());

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    if !header_map.keys().any(|k| KNOWN_COLUMNS.contains(&k.as_str())) {
        return Err(AppError::input(
            "CSV header has no recognized application columns.",
        ));
    }

    let mut lines = LineIndex::new(&data);
    let mut entries = Vec::new();
    let mut record = StringRecord::new();
    loop {
        let start = reader.position().byte();
        let entry = match reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                let line = lines.record_line(start);
                let id = get_optional(&record, &header_map, "id")
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("row-{line}"));
                IngestEntry {
                    line,
                    id,
                    fields: record.iter().map(str::to_string).collect(),
                    parsed: parse_row(&record, &header_map),
                }
            }
            Err(e) => {
                let line = lines.record_line(e.position().map_or(start, |p| p.byte()));
                IngestEntry {
                    line,
                    id: format!("row-{line}"),
                    fields: Vec::new(),
                    parsed: Err(format!("CSV parse error: {e}")),
                }
            }
        };
        entries.push(entry);
    }

    Ok(IngestedBatch {
        headers: headers.iter().map(str::to_string).collect(),
        entries,
    })
}

/// Physical line numbers for record offsets.
///
/// The reader's own position is taken before blank lines are skipped and
/// quoted cells can span lines, so lines are counted from the raw bytes.
/// Offsets must be queried in increasing order.
struct LineIndex<'a> {
    data: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineIndex<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            line: 1,
        }
    }

    /// 1-based line of the first non-blank byte at or after `start`.
    fn record_line(&mut self, start: u64) -> usize {
        let mut pos = usize::try_from(start).map_or(self.data.len(), |p| p.min(self.data.len()));
        while pos < self.data.len() && matches!(self.data[pos], b'\n' | b'\r') {
            pos += 1;
        }
        if pos > self.offset {
            self.line += self.data[self.offset..pos]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.offset = pos;
        }
        self.line
    }
}

/// Read a single application from a JSON object. Missing keys take defaults.
pub fn load_application_json(path: &Path) -> Result<Application, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open '{}': {e}", path.display())))?;
    let app: Application = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::input(format!("Invalid application JSON '{}': {e}", path.display())))?;
    app.validate().map_err(AppError::input)?;
    Ok(app)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    let normalized: Vec<String> = headers.iter().map(normalize_header_name).collect();

    // Exact names first so they win over an alias for the same field.
    for (idx, name) in normalized.iter().enumerate() {
        map.entry(name.clone()).or_insert(idx);
    }
    for (idx, name) in normalized.iter().enumerate() {
        if let Some((_, canonical)) = HEADER_ALIASES.iter().find(|(alias, _)| alias == name) {
            map.entry(canonical.to_string()).or_insert(idx);
        }
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<ParsedRow, String> {
    let mut app = Application::default();
    let cell = |name: &str| get_optional(record, header_map, name);

    set(&mut app.age, cell("age"), "age")?;
    set(&mut app.income, cell("income"), "income")?;
    set(&mut app.credit_score, cell("credit_score"), "credit_score")?;
    set(&mut app.debt_to_income, cell("debt_to_income"), "debt_to_income")?;
    set(&mut app.loan_amount, cell("loan_amount"), "loan_amount")?;
    set(&mut app.employment_length, cell("employment_length"), "employment_length")?;
    set(
        &mut app.number_of_credit_lines,
        cell("number_of_credit_lines"),
        "number_of_credit_lines",
    )?;
    set(&mut app.late_payments_90d, cell("late_payments_90d"), "late_payments_90d")?;
    set(&mut app.credit_utilization, cell("credit_utilization"), "credit_utilization")?;
    set(&mut app.recent_inquiries, cell("recent_inquiries"), "recent_inquiries")?;
    set(&mut app.existing_loans, cell("existing_loans"), "existing_loans")?;
    set(&mut app.savings_balance, cell("savings_balance"), "savings_balance")?;
    set(&mut app.monthly_expenses, cell("monthly_expenses"), "monthly_expenses")?;
    set(&mut app.dependents, cell("dependents"), "dependents")?;
    set(&mut app.property_ownership, cell("property_ownership"), "property_ownership")?;
    set(
        &mut app.credit_history_length,
        cell("credit_history_length"),
        "credit_history_length",
    )?;
    set(&mut app.industry_risk, cell("industry_risk"), "industry_risk")?;
    set(&mut app.geographic_risk, cell("geographic_risk"), "geographic_risk")?;

    if let Some(v) = cell("education_level") {
        app.education_level = v.to_string();
    }
    if let Some(v) = cell("marital_status") {
        app.marital_status = v.to_string();
    }
    if let Some(v) = cell("business_owner") {
        app.business_owner = parse_bool(v).ok_or_else(|| invalid("business_owner", v, "a boolean"))?;
    }

    let defaulted = match cell("defaulted") {
        Some(v) => Some(parse_bool(v).ok_or_else(|| invalid("defaulted", v, "0 or 1"))?),
        None => None,
    };

    app.validate()?;
    Ok(ParsedRow {
        application: app,
        defaulted,
    })
}

/// Overwrite `slot` when the cell is present; leave the default otherwise.
fn set<T>(slot: &mut T, value: Option<&str>, name: &str) -> Result<(), String>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(v) = value {
        *slot = v.parse().map_err(|e| format!("Invalid `{name}` '{v}': {e}"))?;
    }
    Ok(())
}

fn invalid(name: &str, value: &str, expected: &str) -> String {
    format!("Invalid `{name}` '{value}' (expected {expected}).")
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PropertyOwnership, RiskBand};

    fn ingest(csv: &str) -> IngestedBatch {
        read_applications(csv.as_bytes()).unwrap()
    }

    #[test]
    fn missing_columns_take_defaults() {
        let batch = ingest("id,age,income\nA1,40,900000\n");
        let row = batch.entries[0].parsed.as_ref().unwrap();
        assert_eq!(batch.entries[0].id, "A1");
        assert_eq!(row.application.age, 40);
        assert_eq!(row.application.income, 900_000.0);
        assert_eq!(row.application.credit_score, 650);
        assert_eq!(row.application.property_ownership, PropertyOwnership::Owned);
        assert_eq!(row.defaulted, None);
    }

    #[test]
    fn aliases_and_bom_are_normalized() {
        let batch = ingest("\u{feff}DTI,Utilization,late_payments,Industry_Risk\n0.1,0.15,3,low\n");
        let app = &batch.entries[0].parsed.as_ref().unwrap().application;
        assert_eq!(app.debt_to_income, 0.1);
        assert_eq!(app.credit_utilization, 0.15);
        assert_eq!(app.late_payments_90d, 3);
        assert_eq!(app.industry_risk, RiskBand::Low);
    }

    #[test]
    fn exact_header_wins_over_alias() {
        let batch = ingest("dti,debt_to_income\n0.9,0.2\n");
        let app = &batch.entries[0].parsed.as_ref().unwrap().application;
        assert_eq!(app.debt_to_income, 0.2);
    }

    #[test]
    fn bad_rows_are_reported_and_skipped() {
        let batch = ingest("id,age,credit_score\nok,30,700\nyoung,12,700\nbad,abc,700\n");
        assert_eq!(batch.rows_read(), 3);
        assert_eq!(batch.rows_valid(), 1);

        let errors = batch.row_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].line, 3);
        assert_eq!(errors[0].id.as_deref(), Some("young"));
        assert!(errors[0].message.contains("age"));
        assert!(errors[1].message.contains("'abc'"));
    }

    #[test]
    fn line_numbers_follow_the_file_not_the_row_count() {
        let batch = ingest("id,age,income\nA-1,40,\"9000\n00\"\n\nA-2,abc,5\n");
        assert_eq!(batch.rows_read(), 2);
        assert_eq!(batch.entries[0].fields[2], "9000\n00");

        let errors = batch.row_errors();
        let a2 = errors.iter().find(|e| e.id.as_deref() == Some("A-2")).unwrap();
        assert_eq!(a2.line, 5);
        assert!(a2.message.contains("'abc'"));
    }

    #[test]
    fn empty_cells_and_missing_ids() {
        let batch = ingest("age,income,defaulted\n,,1\n");
        let entry = &batch.entries[0];
        assert_eq!(entry.id, "row-2");
        let row = entry.parsed.as_ref().unwrap();
        assert_eq!(row.application, Application::default());
        assert_eq!(row.defaulted, Some(true));
    }

    #[test]
    fn unknown_columns_are_kept_verbatim() {
        let batch = ingest("branch,age\nPune,45\n");
        assert_eq!(batch.headers, vec!["branch", "age"]);
        assert_eq!(batch.entries[0].fields, vec!["Pune", "45"]);
    }

    #[test]
    fn unrecognized_header_is_an_input_error() {
        let err = read_applications("foo,bar\n1,2\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }

    #[test]
    fn bool_parsing() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
