use std::cell::Cell;

use thiserror::Error;

pub type AccountId = u32;
pub type Amount = i64;

/// Advisory lock of a single account.
///
/// Acquiring never blocks: it either flips the state or fails straight away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockState {
    #[default]
    Unlocked,
    Locked,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Account {id} is not locked, balance cannot be changed")]
    NotLocked { id: AccountId },
    #[error("Account {id} is already locked")]
    AlreadyLocked { id: AccountId },
    #[error("Changing balance {balance} of account {id} by {diff} overflows")]
    BalanceOverflow {
        id: AccountId,
        balance: Amount,
        diff: Amount,
    },
}

/// Capabilities a transfer needs from an account.
///
/// Every method takes `&self`, so the same account can be handed out twice
/// and the lock is what gates mutation through those shared references.
pub trait LedgerAccount {
    fn balance(&self) -> Amount;

    /// Adds `diff` to the balance. Only allowed while the account is locked.
    fn change_balance(&self, diff: Amount) -> Result<(), AccountError>;

    fn lock(&self) -> Result<(), AccountError>;

    /// Releasing an already unlocked account is a no-op.
    fn unlock(&self);
}

#[derive(Debug)]
pub struct Account {
    id: AccountId,
    balance: Cell<Amount>,
    lock: Cell<LockState>,
}

impl Account {
    pub fn new(id: AccountId, balance: Amount) -> Self {
        Self {
            id,
            balance: Cell::new(balance),
            lock: Cell::new(LockState::Unlocked),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn lock_state(&self) -> LockState {
        self.lock.get()
    }

    pub fn is_locked(&self) -> bool {
        self.lock.get() == LockState::Locked
    }
}

impl LedgerAccount for Account {
    fn balance(&self) -> Amount {
        self.balance.get()
    }

    fn change_balance(&self, diff: Amount) -> Result<(), AccountError> {
        if !self.is_locked() {
            return Err(AccountError::NotLocked { id: self.id });
        }
        let balance = self.balance.get();
        let updated = balance
            .checked_add(diff)
            .ok_or(AccountError::BalanceOverflow {
                id: self.id,
                balance,
                diff,
            })?;
        self.balance.set(updated);
        Ok(())
    }

    fn lock(&self) -> Result<(), AccountError> {
        match self.lock.get() {
            LockState::Locked => Err(AccountError::AlreadyLocked { id: self.id }),
            LockState::Unlocked => {
                self.lock.set(LockState::Locked);
                Ok(())
            }
        }
    }

    fn unlock(&self) {
        self.lock.set(LockState::Unlocked);
    }
}
