use thiserror::Error;

use crate::{
    account::{AccountId, Amount},
    transaction::TransactionError,
};

pub mod in_memory_processor;

#[derive(Debug, Error)]
pub enum TransferProcessError {
    #[error("Account {id} is already open")]
    DuplicateAccount { id: AccountId },
    #[error("Account {id} does not exist")]
    UnknownAccount { id: AccountId },
    #[error(transparent)]
    TransferErr(#[from] TransactionError),
}

pub trait TransferProcessor {
    fn open_account(&mut self, id: AccountId, balance: Amount) -> Result<(), TransferProcessError>;

    /// Returns `Ok(false)` when the transfer was declined.
    fn process_transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<bool, TransferProcessError>;
}
