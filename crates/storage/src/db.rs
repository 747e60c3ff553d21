use cartola_core::{Account, AccountId, Direction, LedgerError, Money, ReviewedTransaction};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub type DbPool = Pool<Sqlite>;

/// Description written for confirmed rows the reviewer left blank.
pub const DEFAULT_POSTED_DESCRIPTION: &str = "Imported from statement";

/// `source` column value for rows posted from a statement scan.
const SCAN_SOURCE: &str = "scan";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Pending,
    Done,
}

impl ImportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportStatus::Pending => "pending",
            ImportStatus::Done => "done",
        }
    }

    fn from_column(s: &str) -> Self {
        match s {
            "done" => ImportStatus::Done,
            _ => ImportStatus::Pending,
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scan waiting for (or past) confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementImport {
    pub id: i64,
    pub account_id: Option<AccountId>,
    pub filename: String,
    pub bank_detected: String,
    pub rows_total: i64,
    pub rows_imported: i64,
    pub rows_skipped: i64,
    pub status: ImportStatus,
    pub content_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewStatementImport<'a> {
    pub account_id: Option<AccountId>,
    pub filename: &'a str,
    pub bank_detected: &'a str,
    pub rows_total: usize,
    pub content_hash: &'a str,
}

/// A ledger row written by a confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostedTransaction {
    pub id: i64,
    pub account_id: AccountId,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub amount: Money,
    pub description: String,
    pub date: NaiveDate,
    pub source: String,
    pub import_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            institution TEXT,
            currency TEXT NOT NULL DEFAULT 'CLP',
            balance_cents INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS statement_imports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER,
            filename TEXT NOT NULL,
            bank_detected TEXT NOT NULL,
            rows_total INTEGER NOT NULL DEFAULT 0,
            rows_imported INTEGER NOT NULL DEFAULT 0,
            rows_skipped INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'pending',
            content_hash TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (account_id) REFERENCES accounts(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_statement_imports_hash ON statement_imports(content_hash)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL,
            type TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            source TEXT NOT NULL,
            import_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (account_id) REFERENCES accounts(id),
            FOREIGN KEY (import_id) REFERENCES statement_imports(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ── Accounts ─────────────────────────────────────────────────────────────────

type AccountRow = (i64, String, Option<String>, String, i64);

fn account_from_row(r: AccountRow) -> Account {
    Account {
        id: Some(AccountId(r.0)),
        name: r.1,
        institution: r.2,
        currency: r.3,
        balance: Money::from_cents(r.4),
    }
}

pub async fn create_account(pool: &DbPool, account: &Account) -> Result<AccountId, StorageError> {
    let balance_cents = account
        .balance
        .to_cents()
        .ok_or(LedgerError::AmountOutOfRange(account.balance))?;

    let result = sqlx::query(
        "INSERT INTO accounts (name, institution, currency, balance_cents) VALUES (?, ?, ?, ?)",
    )
    .bind(&account.name)
    .bind(&account.institution)
    .bind(&account.currency)
    .bind(balance_cents)
    .execute(pool)
    .await?;

    Ok(AccountId(result.last_insert_rowid()))
}

pub async fn get_account(pool: &DbPool, id: AccountId) -> Result<Option<Account>, sqlx::Error> {
    let row = sqlx::query_as::<_, AccountRow>(
        "SELECT id, name, institution, currency, balance_cents FROM accounts WHERE id = ?",
    )
    .bind(id.0)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(account_from_row))
}

pub async fn get_all_accounts(pool: &DbPool) -> Result<Vec<Account>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AccountRow>(
        "SELECT id, name, institution, currency, balance_cents FROM accounts ORDER BY name, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(account_from_row).collect())
}

// ── Import jobs ──────────────────────────────────────────────────────────────

type ImportRow = (i64, Option<i64>, String, String, i64, i64, i64, String, String, String);

const IMPORT_COLUMNS: &str = "id, account_id, filename, bank_detected, rows_total, rows_imported, rows_skipped, status, content_hash, created_at";

fn import_from_row(r: ImportRow) -> StatementImport {
    StatementImport {
        id: r.0,
        account_id: r.1.map(AccountId),
        filename: r.2,
        bank_detected: r.3,
        rows_total: r.4,
        rows_imported: r.5,
        rows_skipped: r.6,
        status: ImportStatus::from_column(&r.7),
        content_hash: r.8,
        created_at: r.9,
    }
}

pub async fn create_statement_import(
    pool: &DbPool,
    job: &NewStatementImport<'_>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO statement_imports (account_id, filename, bank_detected, rows_total, status, content_hash) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(job.account_id.map(|a| a.0))
    .bind(job.filename)
    .bind(job.bank_detected)
    .bind(job.rows_total as i64)
    .bind(ImportStatus::Pending.as_str())
    .bind(job.content_hash)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn get_statement_import(
    pool: &DbPool,
    id: i64,
) -> Result<Option<StatementImport>, sqlx::Error> {
    let row = sqlx::query_as::<_, ImportRow>(&format!(
        "SELECT {IMPORT_COLUMNS} FROM statement_imports WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(import_from_row))
}

/// Earliest job recorded for the same uploaded bytes, if any.
pub async fn find_import_by_hash(
    pool: &DbPool,
    content_hash: &str,
) -> Result<Option<StatementImport>, sqlx::Error> {
    let row = sqlx::query_as::<_, ImportRow>(&format!(
        "SELECT {IMPORT_COLUMNS} FROM statement_imports WHERE content_hash = ? ORDER BY id LIMIT 1"
    ))
    .bind(content_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(import_from_row))
}

// ── Posting ──────────────────────────────────────────────────────────────────

/// Post the reviewed rows of an import job to `account_id`.
///
/// Everything happens in one database transaction: the inserted rows, the
/// account balance and the job counters are committed together or not at all.
/// Rows that are excluded or lack an amount or date count as skipped.
pub async fn confirm_statement_import(
    pool: &DbPool,
    import_id: i64,
    account_id: AccountId,
    rows: &[ReviewedTransaction],
) -> Result<ImportSummary, StorageError> {
    if rows.is_empty() {
        return Err(LedgerError::NothingToConfirm.into());
    }

    let mut db_tx = pool.begin().await?;

    let status = sqlx::query_as::<_, (String,)>("SELECT status FROM statement_imports WHERE id = ?")
        .bind(import_id)
        .fetch_optional(&mut *db_tx)
        .await?;
    match status.map(|(s,)| ImportStatus::from_column(&s)) {
        None => return Err(LedgerError::ImportNotFound(import_id).into()),
        Some(ImportStatus::Done) => return Err(LedgerError::ImportAlreadyConfirmed(import_id).into()),
        Some(ImportStatus::Pending) => {}
    }

    let account = sqlx::query_as::<_, (i64,)>("SELECT id FROM accounts WHERE id = ?")
        .bind(account_id.0)
        .fetch_optional(&mut *db_tx)
        .await?;
    if account.is_none() {
        return Err(LedgerError::AccountNotFound(account_id).into());
    }

    let mut summary = ImportSummary::default();
    let mut net_cents: i64 = 0;

    for row in rows {
        let Some((amount, date)) = row.postable() else {
            summary.skipped += 1;
            continue;
        };
        let cents = amount
            .to_cents()
            .ok_or(LedgerError::AmountOutOfRange(amount))?;
        let description = row
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_POSTED_DESCRIPTION);

        sqlx::query(
            "INSERT INTO transactions (account_id, type, amount_cents, description, date, source, import_id) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(account_id.0)
        .bind(row.direction.to_string())
        .bind(cents)
        .bind(description)
        .bind(date)
        .bind(SCAN_SOURCE)
        .bind(import_id)
        .execute(&mut *db_tx)
        .await?;

        let signed = match row.direction {
            Direction::Income => cents,
            Direction::Expense => -cents,
        };
        net_cents = net_cents
            .checked_add(signed)
            .ok_or(LedgerError::AmountOutOfRange(amount))?;
        summary.imported += 1;
    }

    sqlx::query("UPDATE accounts SET balance_cents = balance_cents + ? WHERE id = ?")
        .bind(net_cents)
        .bind(account_id.0)
        .execute(&mut *db_tx)
        .await?;

    sqlx::query(
        "UPDATE statement_imports SET account_id = ?, rows_imported = ?, rows_skipped = ?, status = ? WHERE id = ?",
    )
    .bind(account_id.0)
    .bind(summary.imported as i64)
    .bind(summary.skipped as i64)
    .bind(ImportStatus::Done.as_str())
    .bind(import_id)
    .execute(&mut *db_tx)
    .await?;

    db_tx.commit().await?;

    tracing::info!(
        import_id,
        account = %account_id,
        imported = summary.imported,
        skipped = summary.skipped,
        "statement import confirmed"
    );

    Ok(summary)
}

pub async fn get_transactions_for_account(
    pool: &DbPool,
    account_id: AccountId,
) -> Result<Vec<PostedTransaction>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (i64, i64, String, i64, String, NaiveDate, String, Option<i64>)>(
        "SELECT id, account_id, type, amount_cents, description, date, source, import_id FROM transactions WHERE account_id = ? ORDER BY date, id",
    )
    .bind(account_id.0)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            let direction = r
                .2
                .parse::<Direction>()
                .map_err(|e| sqlx::Error::Decode(e.into()))?;
            Ok(PostedTransaction {
                id: r.0,
                account_id: AccountId(r.1),
                direction,
                amount: Money::from_cents(r.3),
                description: r.4,
                date: r.5,
                source: r.6,
                import_id: r.7,
            })
        })
        .collect()
}
