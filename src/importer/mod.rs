use std::path::Path;

use chrono::NaiveDate;
use enum_dispatch::enum_dispatch;
use getset::Getters;
use thiserror::Error;

use crate::ledger::Transaction;

pub mod chase;


pub use chase::ChaseBankImporter;

pub const DEFAULT_FILE_ENCODING: &str = "utf-8";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read statement: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown file encoding `{0}`")]
    UnknownEncoding(String),
    #[error("statement is not valid {0}")]
    Malformed(&'static str),
    #[error("{0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: invalid posting date `{value}`")]
    InvalidDate {
        row: usize,
        value: String,
        #[source]
        source: Option<chrono::ParseError>,
    },
    #[error("row {row}: invalid amount `{value}`")]
    InvalidAmount {
        row: usize,
        value: String,
        #[source]
        source: rust_decimal::Error,
    },
}

/// Accounts an importer books statement rows against.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct ImporterConfig {
    account: String,
    /// Counter-account for debit rows. Empty means no second posting.
    expense_cat: String,
    /// Counter-account for credit rows. Empty means no second posting.
    credit_cat: String,
    file_encoding: String,
}

impl ImporterConfig {
    pub fn new(account: impl Into<String>) -> ImporterConfig {
        ImporterConfig {
            account: account.into(),
            expense_cat: String::new(),
            credit_cat: String::new(),
            file_encoding: DEFAULT_FILE_ENCODING.to_string(),
        }
    }

    pub fn with_expense_cat(mut self, expense_cat: impl Into<String>) -> ImporterConfig {
        self.expense_cat = expense_cat.into();
        self
    }

    pub fn with_credit_cat(mut self, credit_cat: impl Into<String>) -> ImporterConfig {
        self.credit_cat = credit_cat.into();
        self
    }

    pub fn with_file_encoding(mut self, file_encoding: impl Into<String>) -> ImporterConfig {
        self.file_encoding = file_encoding.into();
        self
    }
}

#[enum_dispatch]
pub trait StatementImporter {
    /// Human readable name of the importer.
    fn name(&self) -> String;

    /// Returns whether the file is a statement this importer understands.
    ///
    /// Never fails: a file that cannot be read or decoded simply does not match.
    fn identify(&self, path: &Path) -> bool;

    /// Returns the latest transaction date in the statement, or `None` if the file does not
    /// match or holds no transactions.
    fn file_date(&self, path: &Path) -> Result<Option<NaiveDate>, ImportError>;

    /// Converts every row of the statement into a transaction, in file order.
    ///
    /// Returns an empty list for files that do not match. `existing_entries` are the
    /// transactions already known to the ledger.
    fn extract(
        &self,
        path: &Path,
        existing_entries: Option<&[Transaction]>,
    ) -> Result<Vec<Transaction>, ImportError>;

    /// Name the statement should be filed under.
    fn file_name(&self, path: &Path) -> &'static str;

    /// Ledger account the statement belongs to.
    fn file_account(&self, path: &Path) -> &str;
}

#[enum_dispatch(StatementImporter)]
#[derive(Debug, Clone)]
pub enum Importer {
    ChaseBankImporter,
}
