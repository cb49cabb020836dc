use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use encoding_rs::Encoding;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::importer::ImportError;

pub const CHASE_HEADER: [&str; 7] = [
    "Details",
    "Posting Date",
    "Description",
    "Amount",
    "Type",
    "Balance",
    "Check or Slip #",
];

const DATE_FORMAT: &str = "%m/%d/%Y";
const DEBIT: &str = "DEBIT";

/// One data row of a Chase statement. Columns are matched by header name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatementRecord {
    #[serde(rename = "Details")]
    pub details: String,
    #[serde(rename = "Posting Date")]
    pub posting_date: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "Type")]
    pub type_: String,
}

impl StatementRecord {
    pub fn is_debit(&self) -> bool {
        self.details == DEBIT
    }

    /// Parses the MM/DD/YYYY posting date. The year must have exactly four digits.
    pub fn parse_posting_date(&self, row: usize) -> Result<NaiveDate, ImportError> {
        let value = self.posting_date.trim();
        let invalid = |source: Option<chrono::ParseError>| ImportError::InvalidDate {
            row,
            value: self.posting_date.clone(),
            source,
        };

        let year = value.rsplit('/').next().unwrap_or_default();
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(None));
        }

        NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|err| invalid(Some(err)))
    }

    pub fn parse_amount(&self, row: usize) -> Result<Decimal, ImportError> {
        Decimal::from_str(self.amount.trim()).map_err(|source| ImportError::InvalidAmount {
            row,
            value: self.amount.clone(),
            source,
        })
    }
}

fn lookup_encoding(encoding_label: &str) -> Result<&'static Encoding, ImportError> {
    Encoding::for_label(encoding_label.trim().as_bytes())
        .ok_or_else(|| ImportError::UnknownEncoding(encoding_label.to_string()))
}

/// Decodes the statement up to the end of its first line and returns that line.
///
/// Undecodable bytes become U+FFFD, which never matches a header. Decoding stops after the
/// first line break. A leading byte order mark is dropped.
pub fn read_header_line(path: &Path, encoding_label: &str) -> Result<String, ImportError> {
    let encoding = lookup_encoding(encoding_label)?;
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut reader = BufReader::new(File::open(path)?);
    let mut decoded = String::new();

    loop {
        let chunk = reader.fill_buf()?;
        let last = chunk.is_empty();
        if let Some(needed) = decoder.max_utf8_buffer_length(chunk.len()) {
            decoded.reserve(needed);
        }
        let (_, read, _) = decoder.decode_to_string(chunk, &mut decoded, last);
        reader.consume(read);

        if last || decoded.contains('\n') {
            break;
        }
    }

    let decoded = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);
    Ok(decoded.lines().next().unwrap_or_default().to_string())
}

/// Reads the whole statement and decodes it with the encoding named by `encoding_label`.
///
/// Fails with `ImportError::Malformed` on any undecodable byte. A leading byte order mark is
/// dropped.
pub fn read_statement(path: &Path, encoding_label: &str) -> Result<String, ImportError> {
    let encoding = lookup_encoding(encoding_label)?;
    let bytes = fs::read(path)?;

    let content = encoding
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .ok_or(ImportError::Malformed(encoding.name()))?;

    Ok(content
        .strip_prefix('\u{feff}')
        .unwrap_or(&content)
        .to_string())
}

/// Checks the header line field by field, in order. Surrounding quotes on each field are ignored.
pub fn is_valid_header(line: &str) -> bool {
    let actual: Vec<&str> = line
        .trim()
        .split(',')
        .map(|column| column.trim_matches('"'))
        .collect();

    actual == CHASE_HEADER
}

/// Iterates over the data rows of `content`, numbered from 0.
///
/// Rows may carry more fields than the header; the extra ones are ignored.
pub fn statement_records(
    content: &str,
) -> impl Iterator<Item = Result<(usize, StatementRecord), ImportError>> + '_ {
    csv::ReaderBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .flexible(true)
        .from_reader(content.as_bytes())
        .into_deserialize::<StatementRecord>()
        .enumerate()
        .map(|(row, record)| record.map(|r| (row, r)).map_err(ImportError::from))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const CONTENT: &str = "\
Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #
DEBIT,12/01/2020,\"Coffee, Tea & Co\",-4.50,DEBIT_CARD,95.50,,
CREDIT,11/30/2020,Payroll,100.00,ACH_CREDIT,100.00,,
";

    #[test]
    fn test_valid_header() {
        assert_eq!(is_valid_header(&CHASE_HEADER.join(",")), true);
        assert_eq!(is_valid_header(&format!("{}  \r\n", CHASE_HEADER.join(","))), true);
        assert_eq!(
            is_valid_header("\"Details\",\"Posting Date\",\"Description\",\"Amount\",\"Type\",\"Balance\",\"Check or Slip #\""),
            true
        );
    }

    #[test]
    fn test_invalid_header() {
        assert_eq!(is_valid_header(""), false);
        assert_eq!(is_valid_header("Details,Posting Date,Description,Amount,Type,Balance"), false);
        assert_eq!(
            is_valid_header("Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #,Extra"),
            false
        );
        assert_eq!(
            is_valid_header("Posting Date,Details,Description,Amount,Type,Balance,Check or Slip #"),
            false
        );
        assert_eq!(
            is_valid_header("details,posting date,description,amount,type,balance,check or slip #"),
            false
        );
    }

    #[test]
    fn test_statement_records() -> Result<()> {
        let records = statement_records(CONTENT).collect::<Result<Vec<_>, _>>()?;

        assert_eq!(records.len(), 2);

        let (row, first) = &records[0];
        assert_eq!(*row, 0);
        assert_eq!(first.description, "Coffee, Tea & Co");
        assert_eq!(first.is_debit(), true);
        assert_eq!(first.parse_amount(0)?, dec!(-4.50));
        assert_eq!(first.parse_posting_date(0)?, NaiveDate::from_ymd_opt(2020, 12, 1).unwrap());

        let (row, second) = &records[1];
        assert_eq!(*row, 1);
        assert_eq!(second.is_debit(), false);
        assert_eq!(second.type_, "ACH_CREDIT");

        Ok(())
    }

    #[test]
    fn test_invalid_posting_date() -> Result<()> {
        let content = "Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #\n\
                       DEBIT,2020-12-01,Coffee,-4.50,DEBIT_CARD,95.50,\n";
        let (row, record) = statement_records(content).next().unwrap()?;

        match record.parse_posting_date(row) {
            Err(ImportError::InvalidDate { row, value, .. }) => {
                assert_eq!(row, 0);
                assert_eq!(value, "2020-12-01");
            },
            other => anyhow::bail!("expected an invalid date error, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_two_digit_year_is_invalid() -> Result<()> {
        let content = "Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #\n\
                       DEBIT,12/01/20,Coffee,-4.50,DEBIT_CARD,95.50,\n";
        let (row, record) = statement_records(content).next().unwrap()?;

        match record.parse_posting_date(row) {
            Err(ImportError::InvalidDate { row, value, .. }) => {
                assert_eq!(row, 0);
                assert_eq!(value, "12/01/20");
            },
            other => anyhow::bail!("expected an invalid date error, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_invalid_amount() -> Result<()> {
        let content = "Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #\n\
                       DEBIT,12/01/2020,Coffee,$4.50,DEBIT_CARD,95.50,\n";
        let (row, record) = statement_records(content).next().unwrap()?;

        match record.parse_amount(row) {
            Err(ImportError::InvalidAmount { value, .. }) => assert_eq!(value, "$4.50"),
            other => anyhow::bail!("expected an invalid amount error, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    fn test_missing_column() {
        let content = "Details,Posting Date,Description,Amount,Type,Balance,Check or Slip #\n\
                       DEBIT,12/01/2020,Coffee\n";

        assert_eq!(statement_records(content).next().unwrap().is_err(), true);
    }

    #[test]
    fn test_read_statement_with_encoding() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("latin1.csv");
        // "Café" in windows-1252
        fs::write(&path, b"Caf\xe9\n")?;

        assert_eq!(read_statement(&path, "windows-1252")?, "Café\n");
        assert_eq!(
            matches!(read_statement(&path, "utf-8"), Err(ImportError::Malformed("UTF-8"))),
            true
        );
        assert_eq!(
            matches!(read_statement(&path, "klingon"), Err(ImportError::UnknownEncoding(_))),
            true
        );

        Ok(())
    }

    #[test]
    fn test_read_header_line_stops_at_first_line() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("stmt.csv");
        fs::write(&path, b"\xef\xbb\xbfDetails,Amount\r\nDEBIT,Caf\xe9\n")?;

        assert_eq!(read_header_line(&path, "utf-8")?, "Details,Amount");
        assert_eq!(
            matches!(read_statement(&path, "utf-8"), Err(ImportError::Malformed("UTF-8"))),
            true
        );

        Ok(())
    }

    #[test]
    fn test_read_header_line_empty_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("empty.csv");
        fs::write(&path, b"")?;

        assert_eq!(read_header_line(&path, "utf-8")?, "");

        Ok(())
    }

    #[test]
    fn test_read_statement_drops_bom() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bom.csv");
        fs::write(&path, "\u{feff}Details\n")?;

        assert_eq!(read_statement(&path, "utf-8")?, "Details\n");

        Ok(())
    }
}
