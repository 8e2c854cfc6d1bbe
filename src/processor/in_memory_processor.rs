use std::collections::{BTreeMap, btree_map::Entry};

use tracing::debug;

use crate::{
    account::{Account, AccountId, Amount},
    transaction::Transaction,
};

use super::{TransferProcessError, TransferProcessor};

#[derive(Debug, Default)]
pub struct InMemoryTransferProcessor {
    accounts: BTreeMap<AccountId, Account>,
    transaction: Transaction,
}

impl InMemoryTransferProcessor {
    pub fn new(transaction: Transaction) -> Self {
        Self {
            accounts: BTreeMap::new(),
            transaction,
        }
    }

    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// Accounts ordered by id.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn transaction_mut(&mut self) -> &mut Transaction {
        &mut self.transaction
    }

    fn get(&self, id: AccountId) -> Result<&Account, TransferProcessError> {
        self.accounts
            .get(&id)
            .ok_or(TransferProcessError::UnknownAccount { id })
    }
}

impl TransferProcessor for InMemoryTransferProcessor {
    fn open_account(&mut self, id: AccountId, balance: Amount) -> Result<(), TransferProcessError> {
        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(TransferProcessError::DuplicateAccount { id }),
            Entry::Vacant(entry) => {
                debug!(id, balance, "Opening account");
                entry.insert(Account::new(id, balance));
                Ok(())
            }
        }
    }

    fn process_transfer(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<bool, TransferProcessError> {
        let from_acc = self.get(from)?;
        let to_acc = self.get(to)?;
        // equal ids resolve to the same account, which `make` rejects
        let accepted = self.transaction.make(from_acc, to_acc, amount)?;
        debug!(from, to, amount, accepted, "Transfer processed");
        Ok(accepted)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        account::LedgerAccount,
        transaction::{ErrorKind, TransactionError},
    };

    use super::*;

    #[test]
    fn process_some_transfers() {
        let mut processor = InMemoryTransferProcessor::new(Transaction::with_fee(1));
        processor.open_account(1, 220).unwrap();
        processor.open_account(2, 250).unwrap();
        assert_eq!(processor.accounts().count(), 2);

        assert!(processor.process_transfer(1, 2, 150).unwrap());
        assert!(!processor.process_transfer(1, 2, 150).unwrap());

        let a1 = processor.account(1).unwrap();
        assert_eq!(a1.balance(), 69);
        assert!(!a1.is_locked());
        let a2 = processor.account(2).unwrap();
        assert_eq!(a2.balance(), 400);
        assert!(!a2.is_locked());
    }

    #[test]
    fn duplicate_and_unknown_accounts() {
        let mut processor = InMemoryTransferProcessor::default();
        processor.open_account(1, 10).unwrap();
        let err = processor.open_account(1, 99).unwrap_err();
        assert!(matches!(err, TransferProcessError::DuplicateAccount { id: 1 }));
        assert_eq!(processor.account(1).unwrap().balance(), 10);

        let err = processor.process_transfer(1, 5, 1).unwrap_err();
        assert!(matches!(err, TransferProcessError::UnknownAccount { id: 5 }));
        assert_eq!(err.to_string(), "Account 5 does not exist");
        let err = processor.process_transfer(6, 1, 1).unwrap_err();
        assert!(matches!(err, TransferProcessError::UnknownAccount { id: 6 }));
    }

    #[test]
    fn transfer_errors_are_passed_through() {
        let mut processor = InMemoryTransferProcessor::default();
        processor.open_account(1, 10).unwrap();
        processor.open_account(2, 10).unwrap();

        let err = processor.process_transfer(1, 1, 5).unwrap_err();
        assert!(matches!(
            err,
            TransferProcessError::TransferErr(TransactionError::SameAccount)
        ));

        let err = processor.process_transfer(1, 2, 5).unwrap_err();
        let TransferProcessError::TransferErr(err) = err else {
            panic!("unexpected error {err:?}");
        };
        assert_eq!(err, TransactionError::FeeNotConfigured);
        assert_eq!(err.kind(), ErrorKind::Logic);

        processor.transaction_mut().set_fee(2);
        assert!(processor.process_transfer(1, 2, 5).unwrap());
        assert_eq!(processor.account(1).unwrap().balance(), 3);
        assert_eq!(processor.account(2).unwrap().balance(), 15);
    }
}
