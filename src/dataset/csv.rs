//! CSV loading into a [`Frame`].
//!
//! Fields are parsed per cell (integer, float, then string). The NA tokens
//! below are read as missing, so `"NA"` in a column such as `Alley` becomes
//! `Null` rather than a category.

use super::{DatasetError, FeatureValue, Frame};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Tokens read as missing values.
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a headed CSV file.
pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Frame, DatasetError> {
    let file = File::open(path.as_ref())?;
    read_csv_from_reader(BufReader::new(file))
}

/// Load headed CSV data from any reader.
pub fn read_csv_from_reader<R: Read>(reader: R) -> Result<Frame, DatasetError> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let names: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = record.iter().map(parse_field).collect();
        rows.push(row);
    }

    Frame::from_rows(names, rows)
}

fn parse_field(raw: &str) -> FeatureValue {
    if NA_TOKENS.contains(&raw) {
        FeatureValue::Null
    } else {
        FeatureValue::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;

    const SAMPLE: &str = "\
Order,PID,Lot Frontage,Alley,SaleType,SalePrice
1,526301100,141,NA,WD ,215000
2,526350040,80,Pave,New,105000
3,526351010,,NA,WD ,172000
";

    #[test]
    fn test_read_csv_types() {
        let frame = read_csv_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(frame.shape(), (3, 6));

        let frontage = frame.column_by_name("Lot Frontage").unwrap();
        assert_eq!(frontage[0], FeatureValue::Int(141));
        assert_eq!(frontage[2], FeatureValue::Null);

        let alley = frame.column_by_name("Alley").unwrap();
        assert_eq!(alley[0], FeatureValue::Null);
        assert_eq!(alley[1], FeatureValue::Str("Pave".to_string()));

        // Trailing whitespace is part of the category.
        let sale_type = frame.column_by_name("SaleType").unwrap();
        assert_eq!(sale_type[0], FeatureValue::Str("WD ".to_string()));
    }

    #[test]
    fn test_read_csv_kinds() {
        let frame = read_csv_from_reader(SAMPLE.as_bytes()).unwrap();
        let idx = frame.position("Lot Frontage").unwrap();
        assert_eq!(frame.column_kind(idx), ColumnKind::Numeric);
        let idx = frame.position("Alley").unwrap();
        assert_eq!(frame.column_kind(idx), ColumnKind::Categorical);
    }

    #[test]
    fn test_read_csv_ragged_row() {
        let data = "a,b\n1,2\n3\n";
        assert!(read_csv_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_read_csv_missing_file() {
        let result = read_csv("/definitely/not/here.csv");
        assert!(matches!(result, Err(DatasetError::Io(_))));
    }
}
