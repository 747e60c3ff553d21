pub mod db;

pub use db::{
    confirm_statement_import, create_account, create_db, create_statement_import,
    find_import_by_hash, get_account, get_all_accounts, get_statement_import,
    get_transactions_for_account, DbPool, ImportStatus, ImportSummary, NewStatementImport,
    PostedTransaction, StatementImport, StorageError, DEFAULT_POSTED_DESCRIPTION,
};
