use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use shared::models::{Purchase, PurchaseTable, REQUIRED_COLUMNS};

use crate::error::EngineError;

// European number and short-date handling: "12,5" decimals and "DD.MM.YY" dates.
pub mod european_format {
    use anyhow::{anyhow, bail, Result};
    use chrono::NaiveDate;

    /// Two-digit years up to this value land in the 2000s, the rest in the 1900s.
    pub const CENTURY_PIVOT: u32 = 68;

    // Parses decimals like "12,5" or "10" into f64. There is no thousands
    // separator, so "1.234,5" and "12.5" are both rejected.
    pub fn parse_decimal(s: &str) -> Result<f64> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);

        if !digits.chars().any(|c| c.is_ascii_digit()) {
            bail!("Failed to parse decimal '{}': no digits", s);
        }
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_digit() && *c != ',') {
            bail!("Failed to parse decimal '{}': unexpected character '{}'", s, bad);
        }
        if digits.matches(',').count() > 1 {
            bail!("Failed to parse decimal '{}': more than one decimal comma", s);
        }

        trimmed
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|e| anyhow!("Failed to parse decimal '{}': {}", s, e))
    }

    pub fn expand_two_digit_year(yy: u32) -> i32 {
        if yy <= CENTURY_PIVOT {
            2000 + yy as i32
        } else {
            1900 + yy as i32
        }
    }

    // Parses "DD.MM.YY" (day and month may be a single digit) into a date.
    pub fn parse_short_date(s: &str) -> Result<NaiveDate> {
        let trimmed = s.trim();
        let parts: Vec<&str> = trimmed.split('.').collect();
        let [day, month, year] = parts[..] else {
            bail!("Failed to parse date '{}': expected DD.MM.YY", s);
        };

        let numeric = |part: &str, min_len: usize, max_len: usize| {
            (min_len..=max_len).contains(&part.len()) && part.chars().all(|c| c.is_ascii_digit())
        };
        if !numeric(day, 1, 2) || !numeric(month, 1, 2) || !numeric(year, 2, 2) {
            bail!("Failed to parse date '{}': expected DD.MM.YY", s);
        }

        // All three parts are 1-2 ascii digits, so these parses cannot fail.
        let day: u32 = day.parse()?;
        let month: u32 = month.parse()?;
        let year = expand_two_digit_year(year.parse()?);

        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| anyhow!("Failed to parse date '{}': invalid calendar date", s))
    }

}

// Header positions of the required columns, in `REQUIRED_COLUMNS` order.
struct ColumnIndex {
    positions: [usize; REQUIRED_COLUMNS.len()],
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord) -> Result<Self, EngineError> {
        let names: Vec<&str> = headers
            .iter()
            .map(|name| name.trim().trim_start_matches('\u{feff}'))
            .collect();

        let mut positions = [0; REQUIRED_COLUMNS.len()];
        for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = names
                .iter()
                .position(|name| *name == column)
                .ok_or_else(|| EngineError::SchemaError { column: column.to_string() })?;
        }
        Ok(ColumnIndex { positions })
    }

    // Rows are never shorter than the header (the reader is not flexible).
    fn field<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        REQUIRED_COLUMNS
            .iter()
            .position(|required| *required == column)
            .and_then(|idx| record.get(self.positions[idx]))
            .unwrap_or_default()
    }
}

/// Reads the semicolon-separated purchase log into a [`PurchaseTable`].
///
/// The load is all-or-nothing: the first malformed row aborts it.
pub struct FragranceCsvParser;

impl FragranceCsvParser {
    // CSV Header: house;fragrance;order_date;arrival_date;shipping_date;sample_ml;sample_cost;bottle_ml;bottle_cost;amount;rating
    // Example Row: Guerlain;Shalimar;03.01.23;09.01.23;05.01.23;2;4,5;;;1;4
    // The whole file is read before parsing, so any open or read failure
    // (missing file, directory, permission, I/O error) is a SourceUnavailable.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<PurchaseTable, EngineError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| EngineError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_reader(bytes.as_slice())
    }

    pub fn load_from_reader<R: Read>(reader: R) -> Result<PurchaseTable, EngineError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .trim(Trim::Headers)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let columns = ColumnIndex::resolve(&headers)?;

        let mut records = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result?;
            let line = record
                .position()
                .map(|pos| pos.line())
                .unwrap_or(idx as u64 + 2);
            records.push(Self::parse_record(&record, &columns, line)?);
        }
        Ok(PurchaseTable::new(records))
    }

    fn parse_record(record: &StringRecord, columns: &ColumnIndex, line: u64) -> Result<Purchase, EngineError> {
        let date = |column: &str| Self::date_field(columns.field(record, column), column, line);
        let number = |column: &str| Self::number_field(columns.field(record, column), column, line);

        let purchase = Purchase {
            house: columns.field(record, "house").to_string(),
            fragrance: columns.field(record, "fragrance").to_string(),
            order_date: date("order_date")?,
            arrival_date: date("arrival_date")?,
            shipping_date: date("shipping_date")?,
            sample_ml: number("sample_ml")?,
            sample_cost: number("sample_cost")?,
            bottle_ml: number("bottle_ml")?,
            bottle_cost: number("bottle_cost")?,
            amount: number("amount")?,
            rating: number("rating")?,
            sample_cost_ml: f64::NAN,
            bottle_cost_ml: f64::NAN,
        };
        Ok(purchase.with_derived_costs())
    }

    fn date_field(raw: &str, column: &str, line: u64) -> Result<NaiveDate, EngineError> {
        european_format::parse_short_date(raw).map_err(|e| Self::parse_error(line, column, raw, e))
    }

    // Empty cells are missing values, not errors.
    fn number_field(raw: &str, column: &str, line: u64) -> Result<f64, EngineError> {
        if raw.trim().is_empty() {
            return Ok(f64::NAN);
        }
        european_format::parse_decimal(raw).map_err(|e| Self::parse_error(line, column, raw, e))
    }

    fn parse_error(line: u64, column: &str, raw: &str, err: anyhow::Error) -> EngineError {
        EngineError::ParseError {
            line,
            column: column.to_string(),
            value: raw.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "house;fragrance;order_date;arrival_date;shipping_date;sample_ml;sample_cost;bottle_ml;bottle_cost;amount;rating";

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    fn load(content: &str) -> Result<PurchaseTable, EngineError> {
        let tmp_file = create_test_csv(content);
        FragranceCsvParser::load_from_path(tmp_file.path())
    }

    #[test]
    fn test_load_valid_data() {
        let csv_content = format!(
            "{HEADER}\n\
             Guerlain;Shalimar;03.01.23;09.01.23;05.01.23;2;4,5;50;120;1;4\n\
             Chanel;No. 5;15.02.23;20.02.23;17.02.23;1,5;3;0;0;2;3,5"
        );
        let table = load(&csv_content).unwrap();

        assert_eq!(table.len(), 2);
        let first = &table.records()[0];
        assert_eq!(first.house, "Guerlain");
        assert_eq!(first.fragrance, "Shalimar");
        assert_eq!(first.order_date, NaiveDate::from_ymd_opt(2023, 1, 3).unwrap());
        assert_eq!(first.arrival_date, NaiveDate::from_ymd_opt(2023, 1, 9).unwrap());
        assert_eq!(first.shipping_date, NaiveDate::from_ymd_opt(2023, 1, 5).unwrap());
        assert_eq!(first.sample_ml, 2.0);
        assert_eq!(first.sample_cost, 4.5);
        assert_eq!(first.sample_cost_ml, 2.25);
        assert_eq!(first.bottle_cost_ml, 2.4);

        let second = &table.records()[1];
        assert_eq!(second.fragrance, "No. 5");
        assert_eq!(second.sample_ml, 1.5);
        assert_eq!(second.sample_cost_ml, 2.0);
        assert_eq!(second.rating, 3.5);
        // 0 ml bottle: derived cost is missing, not a failure
        assert!(!second.bottle_cost_ml.is_finite());
    }

    #[test]
    fn test_load_keeps_file_order_and_repeats() {
        let csv_content = format!(
            "{HEADER}\n\
             B;X;01.01.23;02.01.23;01.01.23;1;1;0;0;1;1\n\
             A;Y;01.01.23;02.01.23;01.01.23;1;1;0;0;1;1\n\
             B;X;05.01.23;06.01.23;05.01.23;1;1;0;0;1;1"
        );
        let table = load(&csv_content).unwrap();
        let houses: Vec<&str> = table.iter().map(|p| p.house.as_str()).collect();
        assert_eq!(houses, ["B", "A", "B"]);
    }

    #[test]
    fn test_load_reordered_and_extra_columns() {
        let csv_content = "\
notes;rating;amount;bottle_cost;bottle_ml;sample_cost;sample_ml;shipping_date;arrival_date;order_date;fragrance;house
gift;5;1;0;0;6;3;02.03.23;04.03.23;01.03.23;Aventus;Creed";
        let table = load(csv_content).unwrap();
        let p = &table.records()[0];
        assert_eq!(p.house, "Creed");
        assert_eq!(p.rating, 5.0);
        assert_eq!(p.sample_cost_ml, 2.0);
    }

    #[test]
    fn test_load_header_with_bom() {
        let csv_content = format!("\u{feff}{HEADER}\nA;X;01.01.23;02.01.23;01.01.23;1;1;0;0;1;1");
        let table = load(&csv_content).unwrap();
        assert_eq!(table.records()[0].house, "A");
    }

    #[test]
    fn test_load_empty_numeric_cells_are_missing() {
        let csv_content = format!("{HEADER}\nA;X;01.01.23;02.01.23;01.01.23;2;4;;;1;");
        let table = load(&csv_content).unwrap();
        let p = &table.records()[0];
        assert!(p.bottle_ml.is_nan());
        assert!(p.bottle_cost.is_nan());
        assert!(p.bottle_cost_ml.is_nan());
        assert!(p.rating.is_nan());
        assert_eq!(p.sample_cost_ml, 2.0);
    }

    #[test]
    fn test_load_header_only() {
        let table = load(HEADER).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let result = FragranceCsvParser::load_from_path("non_existent_file.csv");
        assert!(matches!(result, Err(EngineError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_load_unreadable_source() {
        let dir = tempfile::tempdir().unwrap();
        let result = FragranceCsvParser::load_from_path(dir.path());
        assert!(matches!(result, Err(EngineError::SourceUnavailable { .. })));
    }

    #[test]
    fn test_each_required_column_is_checked() {
        for missing in REQUIRED_COLUMNS {
            let header: Vec<&str> = REQUIRED_COLUMNS.iter().copied().filter(|c| *c != missing).collect();
            let result = FragranceCsvParser::load_from_reader(header.join(";").as_bytes());
            match result {
                Err(EngineError::SchemaError { column }) => assert_eq!(column, missing),
                other => panic!("expected schema error for '{}', got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn test_load_missing_column() {
        let csv_content = "\
house;fragrance;order_date;arrival_date;shipping_date;sample_ml;sample_cost;bottle_ml;bottle_cost;amount
A;X;01.01.23;02.01.23;01.01.23;1;1;0;0;1";
        match load(csv_content) {
            Err(EngineError::SchemaError { column }) => assert_eq!(column, "rating"),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_empty_file_is_schema_error() {
        let result = FragranceCsvParser::load_from_reader("".as_bytes());
        assert!(matches!(result, Err(EngineError::SchemaError { .. })));
    }

    #[test]
    fn test_load_bad_date_aborts_whole_load() {
        let csv_content = format!(
            "{HEADER}\n\
             A;X;01.01.23;02.01.23;01.01.23;1;1;0;0;1;1\n\
             A;Y;31.02.23;02.03.23;01.03.23;1;1;0;0;1;1"
        );
        match load(&csv_content) {
            Err(EngineError::ParseError { line, column, value, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "order_date");
                assert_eq!(value, "31.02.23");
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_empty_date_is_parse_error() {
        let csv_content = format!("{HEADER}\nA;X;01.01.23;;01.01.23;1;1;0;0;1;1");
        match load(&csv_content) {
            Err(EngineError::ParseError { column, .. }) => assert_eq!(column, "arrival_date"),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_bad_number() {
        let csv_content = format!("{HEADER}\nA;X;01.01.23;02.01.23;01.01.23;two;1;0;0;1;1");
        let err = load(&csv_content).unwrap_err();
        assert!(err.to_string().contains("column 'sample_ml'"));
        assert!(err.to_string().contains("Failed to parse decimal 'two'"));
    }

    #[test]
    fn test_load_ragged_row() {
        let csv_content = format!("{HEADER}\nA;X;01.01.23");
        let result = load(&csv_content);
        assert!(matches!(result, Err(EngineError::Csv { .. })));
    }
}
