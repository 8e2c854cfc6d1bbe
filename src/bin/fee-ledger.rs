use std::fs::File;

use anyhow::{Context, Result};
use fee_ledger::{
    account::Amount,
    bin_utils::{Service, ServiceError},
    processor::TransferProcessError,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // stdout carries the report, logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let accounts_file = args
        .next()
        .context("Expected an accounts file name as the first argument")?;
    let transfers_file = args
        .next()
        .context("Expected a transfers file name as the second argument")?;
    let fee = args
        .next()
        .map(|fee| {
            fee.parse::<Amount>()
                .with_context(|| format!("Fee `{fee}` is not an integer"))
        })
        .transpose()?;

    let accounts =
        File::open(&accounts_file).with_context(|| format!("Failed to open `{accounts_file}`"))?;
    let transfers = File::open(&transfers_file)
        .with_context(|| format!("Failed to open `{transfers_file}`"))?;

    let service = Service {
        accounts,
        transfers,
        fee,
        output: &mut std::io::stdout(),
        error_printer: Box::new(|input, line, err| match err {
            ServiceError::Process(TransferProcessError::TransferErr(err)) => {
                eprintln!("Error in {input} at line {line} ({:?}): {err}", err.kind())
            }
            err => eprintln!("Error in {input} at line {line}: {err}"),
        }),
    };
    service.run()?;
    Ok(())
}
