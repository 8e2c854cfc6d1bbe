use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::account::{AccountError, Amount, LedgerAccount};

/// Broad class of a [`TransactionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input value is malformed regardless of any account state.
    InvalidArgument,
    /// Request breaks a structural rule or a configuration precondition.
    Logic,
    /// Account state did not allow the operation.
    Runtime,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Cannot transfer to the same account")]
    SameAccount,
    #[error("Transfer amount must not be negative, got {amount}")]
    NegativeAmount { amount: Amount },
    #[error("Transfer amount {amount} plus fee {fee} overflows")]
    AmountOverflow { amount: Amount, fee: Amount },
    #[error("Fee is not configured")]
    FeeNotConfigured,
    #[error("Fee must not be negative, got {fee}")]
    InvalidFee { fee: Amount },
    #[error(transparent)]
    Account(#[from] AccountError),
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NegativeAmount { .. } | Self::AmountOverflow { .. } => ErrorKind::InvalidArgument,
            Self::SameAccount | Self::FeeNotConfigured | Self::InvalidFee { .. } => ErrorKind::Logic,
            Self::Account(_) => ErrorKind::Runtime,
        }
    }
}

/// Holds an account lock and releases it when dropped.
struct LockGuard<'a, A: LedgerAccount + ?Sized> {
    account: &'a A,
}

impl<'a, A: LedgerAccount + ?Sized> LockGuard<'a, A> {
    fn acquire(account: &'a A) -> Result<Self, AccountError> {
        account.lock()?;
        Ok(Self { account })
    }
}

impl<A: LedgerAccount + ?Sized> Drop for LockGuard<'_, A> {
    fn drop(&mut self) {
        self.account.unlock();
    }
}

/// Moves funds between two accounts, charging a fixed fee to the sender.
///
/// The fee is taken out of circulation, nobody is credited with it.
/// A `Transaction` keeps no per-transfer state and can be reused freely.
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    fee: Option<Amount>,
}

impl Transaction {
    /// Creates a transaction service without a fee; it must be set before
    /// any transfer is made.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fee(fee: Amount) -> Self {
        Self { fee: Some(fee) }
    }

    pub fn fee(&self) -> Option<Amount> {
        self.fee
    }

    pub fn set_fee(&mut self, fee: Amount) {
        self.fee = Some(fee);
    }

    /// Transfers `amount` from `from` to `to` and burns the fee.
    ///
    /// Returns `Ok(false)` when the request is well formed but cannot be
    /// funded: either `amount` does not exceed the fee, or `from` holds less
    /// than `amount + fee`. Balances are untouched in that case.
    ///
    /// # Errors
    ///
    /// Checked in this order, before any lock is taken:
    /// * [`TransactionError::SameAccount`] if both references point to one account
    /// * [`TransactionError::NegativeAmount`] / [`TransactionError::AmountOverflow`]
    /// * [`TransactionError::FeeNotConfigured`] / [`TransactionError::InvalidFee`]
    ///
    /// Afterwards any [`AccountError`] from locking or changing balances is
    /// returned as is, without retrying. Both accounts are unlocked on return.
    pub fn make<F, T>(&self, from: &F, to: &T, amount: Amount) -> Result<bool, TransactionError>
    where
        F: LedgerAccount + ?Sized,
        T: LedgerAccount + ?Sized,
    {
        let (fee, total) = self.validate(from, to, amount)?;

        let _from_guard = LockGuard::acquire(from).inspect_err(|err| {
            warn!(%err, "Failed to lock source account");
        })?;
        let _to_guard = LockGuard::acquire(to).inspect_err(|err| {
            warn!(%err, "Failed to lock destination account");
        })?;

        if amount <= fee {
            info!(amount, fee, "Transfer declined, amount does not exceed fee");
            return Ok(false);
        }
        let balance = from.balance();
        if balance < total {
            info!(balance, total, "Transfer declined, insufficient funds");
            return Ok(false);
        }

        from.change_balance(-total)?;
        if let Err(err) = to.change_balance(amount) {
            warn!(%err, total, "Crediting destination failed, reverting debit");
            if let Err(revert_err) = from.change_balance(total) {
                error!(%revert_err, total, "Failed to revert debit of source account");
            }
            return Err(err.into());
        }

        debug!(amount, fee, "Transfer completed");
        Ok(true)
    }

    fn validate<F, T>(
        &self,
        from: &F,
        to: &T,
        amount: Amount,
    ) -> Result<(Amount, Amount), TransactionError>
    where
        F: LedgerAccount + ?Sized,
        T: LedgerAccount + ?Sized,
    {
        if std::ptr::eq(from as *const F as *const (), to as *const T as *const ()) {
            return Err(TransactionError::SameAccount);
        }
        if amount < 0 {
            return Err(TransactionError::NegativeAmount { amount });
        }
        let fee = match self.fee {
            None => return Err(TransactionError::FeeNotConfigured),
            Some(fee) if fee < 0 => return Err(TransactionError::InvalidFee { fee }),
            Some(fee) => fee,
        };
        let total = amount
            .checked_add(fee)
            .ok_or(TransactionError::AmountOverflow { amount, fee })?;
        Ok((fee, total))
    }
}
