use std::io::Write;

use anyhow::Context;
use csv::Writer;
use serde::Serialize;

use crate::account::{Account, AccountId, Amount, LedgerAccount};

#[derive(Debug, Serialize)]
pub struct AccountBalance {
    pub account: AccountId,
    pub balance: Amount,
}

impl From<&Account> for AccountBalance {
    fn from(acc: &Account) -> Self {
        Self {
            account: acc.id(),
            balance: acc.balance(),
        }
    }
}

/// Writes the `account,balance` report, one row per account in iteration order.
pub fn print_balances<'a, W>(
    output: &mut W,
    accounts: impl IntoIterator<Item = &'a Account>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for acc in accounts {
        writer
            .serialize(AccountBalance::from(acc))
            .with_context(|| format!("Failed to write balance of account {}", acc.id()))?;
    }
    writer.flush().context("Failed to flush balance report")
}
