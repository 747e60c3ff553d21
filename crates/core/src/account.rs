use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::money::Money;

pub const DEFAULT_CURRENCY: &str = "CLP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ledger account that confirmed statement rows are posted against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Option<AccountId>,
    pub name: String,
    /// Issuing institution, as reported by the statement detector.
    pub institution: Option<String>,
    pub currency: String,
    pub balance: Money,
}

impl Account {
    pub fn new(name: &str) -> Self {
        Account {
            id: None,
            name: name.to_string(),
            institution: None,
            currency: DEFAULT_CURRENCY.to_string(),
            balance: Money::zero(),
        }
    }

    pub fn with_balance(mut self, balance: Money) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_institution(mut self, institution: &str) -> Self {
        self.institution = Some(institution.to_string());
        self
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),
    #[error("Statement import not found: {0}")]
    ImportNotFound(i64),
    #[error("Statement import {0} was already confirmed")]
    ImportAlreadyConfirmed(i64),
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(Money),
    #[error("No transactions to confirm")]
    NothingToConfirm,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_defaults() {
        let acct = Account::new("Cuenta Corriente");
        assert_eq!(acct.currency, "CLP");
        assert!(acct.balance.is_zero());
        assert!(acct.id.is_none());
        assert!(acct.institution.is_none());
    }

    #[test]
    fn builder_sets_balance_and_institution() {
        let acct = Account::new("Cuenta RUT")
            .with_balance(Money::from_cents(50_000_000))
            .with_institution("BancoEstado");
        assert_eq!(acct.balance, Money::from_cents(50_000_000));
        assert_eq!(acct.institution.as_deref(), Some("BancoEstado"));
    }

    #[test]
    fn ledger_error_messages() {
        assert_eq!(
            LedgerError::AccountNotFound(AccountId(7)).to_string(),
            "Account not found: 7"
        );
        assert_eq!(
            LedgerError::ImportAlreadyConfirmed(3).to_string(),
            "Statement import 3 was already confirmed"
        );
    }
}
