use std::path::Path;

use chrono::NaiveDate;
use getset::Getters;
use log::{debug, info};

use super::{ImportError, ImporterConfig, StatementImporter};
use crate::data::{self, StatementRecord};
use crate::ledger::{Amount, Meta, Posting, Transaction};

const CURRENCY: &str = "USD";
const FILE_NAME: &str = "Chase_Statement.csv";

/// Importer for the CSV export of Chase Bank checking accounts.
#[derive(Debug, Clone, Getters)]
pub struct ChaseBankImporter {
    #[getset(get = "pub")]
    config: ImporterConfig,
}

impl ChaseBankImporter {
    pub fn new(config: ImporterConfig) -> ChaseBankImporter {
        ChaseBankImporter { config }
    }

    /// Reads the whole statement, or `None` if it is not a Chase statement.
    ///
    /// Once the header matches, undecodable content is an error.
    fn read_matching(&self, path: &Path) -> Result<Option<String>, ImportError> {
        if !self.identify(path) {
            return Ok(None);
        }

        data::read_statement(path, self.config.file_encoding()).map(Some)
    }

    /// Counter-account for the row: expenses for debits, income otherwise.
    fn category_for(&self, record: &StatementRecord) -> &str {
        if record.is_debit() {
            self.config.expense_cat().as_str()
        } else {
            self.config.credit_cat().as_str()
        }
    }

    fn to_transaction(
        &self,
        path: &Path,
        row: usize,
        record: StatementRecord,
    ) -> Result<Transaction, ImportError> {
        let date = record.parse_posting_date(row)?;
        let units = Amount::new(record.parse_amount(row)?, CURRENCY);

        let mut postings = vec![Posting::new(self.config.account().as_str(), units.clone())];

        let category = self.category_for(&record);
        if !category.is_empty() {
            postings.push(Posting::new(category, units.negated()));
        }

        Ok(Transaction::new(
            Meta::new(path, row),
            date,
            record.description,
            record.type_,
            postings,
        ))
    }
}

impl StatementImporter for ChaseBankImporter {
    fn name(&self) -> String {
        "Chase Bank: ChaseBankImporter".to_string()
    }

    fn identify(&self, path: &Path) -> bool {
        match data::read_header_line(path, self.config.file_encoding()) {
            Ok(header) if data::is_valid_header(&header) => true,
            Ok(header) => {
                debug!("header mismatch in {:?}: {:?}", path, header);
                false
            },
            Err(err) => {
                debug!("cannot identify {:?}, err={}", path, err);
                false
            },
        }
    }

    fn file_date(&self, path: &Path) -> Result<Option<NaiveDate>, ImportError> {
        let content = match self.read_matching(path)? {
            Some(content) => content,
            None => return Ok(None),
        };

        let mut latest: Option<NaiveDate> = None;
        for record in data::statement_records(&content) {
            let (row, record) = record?;
            let date = record.parse_posting_date(row)?;
            if latest.map_or(true, |d| date > d) {
                latest = Some(date);
            }
        }

        Ok(latest)
    }

    fn extract(
        &self,
        path: &Path,
        _existing_entries: Option<&[Transaction]>,
    ) -> Result<Vec<Transaction>, ImportError> {
        let content = match self.read_matching(path)? {
            Some(content) => content,
            None => return Ok(Vec::new()),
        };

        let entries = data::statement_records(&content)
            .map(|record| record.and_then(|(row, record)| self.to_transaction(path, row, record)))
            .collect::<Result<Vec<_>, _>>()?;

        info!("extracted {} transactions from {:?}", entries.len(), path);

        Ok(entries)
    }

    fn file_name(&self, _path: &Path) -> &'static str {
        FILE_NAME
    }

    fn file_account(&self, _path: &Path) -> &str {
        self.config.account().as_str()
    }
}
