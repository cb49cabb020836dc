//! Beancount importer for the CSV statements exported by Chase Bank.

pub mod data;
pub mod importer;
pub mod ledger;
