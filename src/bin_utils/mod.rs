//! This module could be a separate crate on its own, to bootstrap [`crate`] within a binary,
//! it lives here so integration tests can drive it directly.

use std::{
    fmt,
    io::{Read, Write},
};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use crate::{
    account::Amount,
    processor::{
        TransferProcessError, TransferProcessor, in_memory_processor::InMemoryTransferProcessor,
    },
    transaction::Transaction,
};
use csv_parser::{AccountRecord, CsvRecordParser, TransferRecord};
use csv_printer::print_balances;
pub mod csv_parser;
pub mod csv_printer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Accounts,
    Transfers,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Accounts => f.write_str("accounts"),
            Input::Transfers => f.write_str("transfers"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Malformed row: {0}")]
    Malformed(#[from] csv::Error),
    #[error(transparent)]
    Process(#[from] TransferProcessError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub accepted: usize,
    pub declined: usize,
    pub failed: usize,
}

pub struct Service<'w, A, T, W: 'w> {
    pub accounts: A,
    pub transfers: T,
    pub fee: Option<Amount>,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(Input, u64, ServiceError)>,
}

impl<'w, A, T, W> Service<'w, A, T, W>
where
    A: Read,
    T: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<Summary> {
        let mut processor = InMemoryTransferProcessor::new(Transaction::new());
        if let Some(fee) = self.fee {
            processor.transaction_mut().set_fee(fee);
        }

        let accounts = CsvRecordParser::<_, AccountRecord>::new(self.accounts)
            .context("Failed to read accounts header")?;
        for (line, row) in accounts {
            let opened = row
                .map_err(ServiceError::from)
                .and_then(|row| Ok(processor.open_account(row.account, row.balance)?));
            if let Err(err) = opened {
                (self.error_printer)(Input::Accounts, line, err);
            }
        }

        let transfers = CsvRecordParser::<_, TransferRecord>::new(self.transfers)
            .context("Failed to read transfers header")?;
        let mut summary = Summary::default();
        for (line, row) in transfers {
            let processed = row
                .map_err(ServiceError::from)
                .and_then(|row| Ok(processor.process_transfer(row.from, row.to, row.amount)?));
            match processed {
                Ok(true) => summary.accepted += 1,
                Ok(false) => summary.declined += 1,
                Err(err) => {
                    summary.failed += 1;
                    (self.error_printer)(Input::Transfers, line, err);
                }
            }
        }
        info!(?summary, "Transfers processed");

        print_balances(self.output, processor.accounts())?;
        Ok(summary)
    }
}
