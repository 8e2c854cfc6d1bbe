/// Account balance and its advisory lock.
/// Balance can only be changed while the account is locked.
pub mod account;

/// Transfer of funds between two accounts, charging a fee that is burned.
pub mod transaction;

/// Transfer processor interface, plus "in memory" implementation
/// that owns accounts by id and routes transfers to [`transaction`].
pub mod processor;

/// Bootstraps the core logic over CSV input. Kept in the library so
/// integration tests can use it.
pub mod bin_utils;
