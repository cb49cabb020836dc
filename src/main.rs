use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use beancount_chase::importer::{
    ChaseBankImporter, Importer, ImporterConfig, StatementImporter, DEFAULT_FILE_ENCODING,
};

#[derive(Parser, Debug)]
#[command(name = "chase-extract")]
#[command(version, about = "extract beancount entries from Chase Bank CSV statements", long_about = None)]
struct Cli {
    /// Account the statements belong to, e.g. Assets:US:Chase:Checking
    #[arg(long)]
    account: String,
    /// Counter-account for debit rows
    #[arg(long, default_value = "")]
    expense_cat: String,
    /// Counter-account for credit rows
    #[arg(long, default_value = "")]
    credit_cat: String,
    /// Text encoding of the statements
    #[arg(long, default_value = DEFAULT_FILE_ENCODING)]
    encoding: String,
    /// Statement files to extract.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let config = ImporterConfig::new(args.account)
        .with_expense_cat(args.expense_cat)
        .with_credit_cat(args.credit_cat)
        .with_file_encoding(args.encoding);
    let importer: Importer = ChaseBankImporter::new(config).into();

    println!(";; -*- mode: beancount -*-");
    for path in args.files {
        if !importer.identify(&path) {
            info!("{} does not match {:?}, skipping", importer.name(), path);
            continue;
        }

        let file_date = importer
            .file_date(&path)
            .with_context(|| format!("failed to read dates from {:?}", path))?;
        info!(
            "{:?}: account={} file_date={:?}",
            path,
            importer.file_account(&path),
            file_date
        );

        let entries = importer
            .extract(&path, None)
            .with_context(|| format!("failed to extract {:?}", path))?;

        println!("**** {}", path.display());
        for entry in entries {
            println!();
            println!("{}", entry);
        }
        println!();
    }

    Ok(())
}
