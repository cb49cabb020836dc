use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use getset::{CopyGetters, Getters};

use super::{Amount, Flag};

/// Where an entry was read from: the statement path and the 0-based data row.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Meta {
    #[getset(get = "pub")]
    filename: PathBuf,
    #[getset(get_copy = "pub")]
    lineno: usize,
}

impl Meta {
    pub fn new(filename: &Path, lineno: usize) -> Meta {
        Meta {
            filename: filename.to_path_buf(),
            lineno,
        }
    }
}

/// One leg of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct Posting {
    account: String,
    units: Amount,
}

impl Posting {
    pub fn new(account: impl Into<String>, units: Amount) -> Posting {
        Posting {
            account: account.into(),
            units,
        }
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}  {}", self.account, self.units)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Transaction {
    #[getset(get = "pub")]
    meta: Meta,
    #[getset(get_copy = "pub")]
    date: NaiveDate,
    #[getset(get_copy = "pub")]
    flag: Flag,
    #[getset(get = "pub")]
    payee: String,
    #[getset(get = "pub")]
    narration: String,
    #[getset(get = "pub")]
    tags: BTreeSet<String>,
    #[getset(get = "pub")]
    links: BTreeSet<String>,
    #[getset(get = "pub")]
    postings: Vec<Posting>,
}

impl Transaction {
    /// Creates a cleared transaction without tags or links.
    pub fn new(
        meta: Meta,
        date: NaiveDate,
        payee: impl Into<String>,
        narration: impl Into<String>,
        postings: Vec<Posting>,
    ) -> Transaction {
        Transaction {
            meta,
            date,
            flag: Flag::Okay,
            payee: payee.into(),
            narration: narration.into(),
            tags: BTreeSet::new(),
            links: BTreeSet::new(),
            postings,
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in value.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            _ => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

/// Renders the entry in beancount syntax, one posting per line.
impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.date.format("%Y-%m-%d"), self.flag)?;
        write_quoted(f, &self.payee)?;
        write!(f, " ")?;
        write_quoted(f, &self.narration)?;
        for tag in &self.tags {
            write!(f, " #{}", tag)?;
        }
        for link in &self.links {
            write!(f, " ^{}", link)?;
        }
        for posting in &self.postings {
            write!(f, "\n{}", posting)?;
        }
        Ok(())
    }
}
