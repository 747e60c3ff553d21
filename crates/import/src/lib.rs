//! Statement recovery engine: turns the text of a bank statement export into
//! dated, signed-by-direction transactions without per-bank configuration.

pub mod amount;
pub mod assembler;
pub mod classifier;
pub mod date;
pub mod institution;
pub mod statement;
pub mod tokenizer;
pub(crate) mod util;

pub use amount::{parse_amount, NumberLayout};
pub use assembler::assemble;
pub use classifier::{classify, ColumnRoles, NumericCandidate, RowClass};
pub use date::parse_date;
pub use institution::{detect_institution, Institution, INSTITUTIONS, UNIDENTIFIED_INSTITUTION};
pub use statement::{
    candidate_lines, parse_row, parse_statement, CandidateLine, ParseContext, ParseStats,
    RowOutcome, SkipReason, StatementParser,
};
pub use tokenizer::{tokenize, Separator};
