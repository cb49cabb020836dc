use std::fmt;

use getset::{CopyGetters, Getters};
use rust_decimal::Decimal;

pub mod transaction;


pub use transaction::{Meta, Posting, Transaction};

/// Status flag of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flag {
    /// Completed and cleared (`*`).
    #[default]
    Okay,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Okay => write!(f, "*"),
        }
    }
}

/// A decimal number of units of a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Amount {
    #[getset(get_copy = "pub")]
    number: Decimal,
    #[getset(get = "pub")]
    currency: String,
}

impl Amount {
    pub fn new(number: Decimal, currency: impl Into<String>) -> Amount {
        Amount {
            number,
            currency: currency.into(),
        }
    }

    pub fn negated(&self) -> Amount {
        Amount {
            number: -self.number,
            currency: self.currency.clone(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.number, self.currency)
    }
}
