pub mod account;
pub mod money;
pub mod transaction;

pub use account::{Account, AccountId, LedgerError, DEFAULT_CURRENCY};
pub use money::Money;
pub use transaction::{
    Direction, ParsedTransaction, ReviewedTransaction, StatementParseResult,
    MAX_DESCRIPTION_CHARS, NO_DESCRIPTION,
};
