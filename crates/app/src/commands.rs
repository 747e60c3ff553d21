use anyhow::{Context, Result};
use cartola_core::{Account, AccountId, LedgerError, Money, ParsedTransaction, ReviewedTransaction};
use cartola_import::{ParseStats, StatementParser};
use cartola_storage::{DbPool, ImportSummary, NewStatementImport};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::decode::decode_statement;
use crate::upload::{content_hash, extension, read_upload};

pub const EMPTY_RESULT_WARNING: &str = "No transactions were recognized in this file. \
Download the statement as CSV from your online banking and scan that export instead.";

/// Characters of decoded text shown by `debug`.
const DEBUG_PREVIEW_CHARS: usize = 3000;
const DEBUG_SAMPLE_ROWS: usize = 10;

#[derive(Debug, Serialize)]
pub struct ScanOutput {
    pub import_id: i64,
    pub bank_detected: String,
    pub rows_found: usize,
    pub warning: Option<String>,
    /// Earlier import job for the same file bytes.
    pub duplicate_of: Option<i64>,
    pub preview: Vec<ParsedTransaction>,
    pub all_transactions: Vec<ParsedTransaction>,
}

#[derive(Debug, Serialize)]
pub struct DebugOutput {
    pub ext: String,
    pub text_preview: String,
    pub text_length: usize,
    pub lines: usize,
    pub transactions_found: usize,
    pub bank_detected: String,
    pub first_10: Vec<ParsedTransaction>,
    pub stats: ParseStats,
}

#[derive(Debug, Serialize)]
pub struct ConfirmOutput {
    pub import_id: i64,
    pub account_id: AccountId,
    #[serde(flatten)]
    pub summary: ImportSummary,
    pub balance: Money,
}

/// Reviewed rows as written by hand or by a review screen: either a bare
/// array or an object with a `transactions` array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReviewInput {
    Rows(Vec<ReviewedTransaction>),
    Wrapped { transactions: Vec<ReviewedTransaction> },
}

pub async fn scan(
    pool: &DbPool,
    path: &Path,
    account_id: Option<AccountId>,
    preview_rows: usize,
) -> Result<ScanOutput> {
    let bytes = read_upload(path)?;
    let hash = content_hash(&bytes);

    if let Some(id) = account_id {
        if cartola_storage::get_account(pool, id).await?.is_none() {
            return Err(LedgerError::AccountNotFound(id).into());
        }
    }

    let duplicate_of = cartola_storage::find_import_by_hash(pool, &hash)
        .await?
        .map(|job| job.id);
    if let Some(earlier) = duplicate_of {
        tracing::warn!(earlier, file = %path.display(), "statement was already scanned");
    }

    let text = decode_statement(&bytes);
    let result = StatementParser::parse(&text);
    let warning = result.is_empty().then(|| EMPTY_RESULT_WARNING.to_string());

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let import_id = cartola_storage::create_statement_import(
        pool,
        &NewStatementImport {
            account_id,
            filename: &filename,
            bank_detected: &result.institution_name,
            rows_total: result.transactions.len(),
            content_hash: &hash,
        },
    )
    .await
    .context("record statement import")?;

    tracing::info!(
        import_id,
        filename = %filename,
        bank = %result.institution_name,
        rows = result.transactions.len(),
        "statement scanned"
    );

    Ok(ScanOutput {
        import_id,
        bank_detected: result.institution_name,
        rows_found: result.transactions.len(),
        warning,
        duplicate_of,
        preview: result.transactions.iter().take(preview_rows).cloned().collect(),
        all_transactions: result.transactions,
    })
}

/// Show what the parser sees in a file without recording anything.
pub fn debug_extract(path: &Path) -> Result<DebugOutput> {
    let bytes = read_upload(path)?;
    let text = decode_statement(&bytes);
    let (result, stats) = StatementParser::parse_with_stats(&text);

    Ok(DebugOutput {
        ext: extension(path),
        text_preview: text.chars().take(DEBUG_PREVIEW_CHARS).collect(),
        text_length: text.chars().count(),
        lines: text.lines().count(),
        transactions_found: result.transactions.len(),
        bank_detected: result.institution_name,
        first_10: result.transactions.into_iter().take(DEBUG_SAMPLE_ROWS).collect(),
        stats,
    })
}

pub fn parse_review_input(json: &str, include_all: bool) -> Result<Vec<ReviewedTransaction>> {
    let input: ReviewInput = serde_json::from_str(json).context("parse reviewed transactions")?;
    let mut rows = match input {
        ReviewInput::Rows(rows) => rows,
        ReviewInput::Wrapped { transactions } => transactions,
    };
    if include_all {
        rows.iter_mut().for_each(|r| r.include = true);
    }
    Ok(rows)
}

pub async fn confirm(
    pool: &DbPool,
    import_id: i64,
    account_id: AccountId,
    rows: &[ReviewedTransaction],
) -> Result<ConfirmOutput> {
    let summary =
        cartola_storage::confirm_statement_import(pool, import_id, account_id, rows).await?;
    let Some(account) = cartola_storage::get_account(pool, account_id).await? else {
        return Err(LedgerError::AccountNotFound(account_id).into());
    };

    Ok(ConfirmOutput {
        import_id,
        account_id,
        summary,
        balance: account.balance,
    })
}

pub async fn add_account(
    pool: &DbPool,
    name: &str,
    institution: Option<&str>,
    balance: Option<Decimal>,
) -> Result<Account> {
    let mut account = Account::new(name);
    if let Some(institution) = institution {
        account = account.with_institution(institution);
    }
    if let Some(balance) = balance {
        account = account.with_balance(Money::from_decimal(balance));
    }

    let id = cartola_storage::create_account(pool, &account).await?;
    account.id = Some(id);
    tracing::info!(account = %id, name, "account created");
    Ok(account)
}

pub async fn list_accounts(pool: &DbPool) -> Result<Vec<Account>> {
    Ok(cartola_storage::get_all_accounts(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartola_core::Direction;
    use cartola_storage::{create_db, get_statement_import, ImportStatus, StorageError};
    use std::fs;
    use tempfile::TempDir;

    const CARTOLA: &str = "Cartola BCI\n\
                           Fecha;Descripcion;Cargo;Abono;Saldo\n\
                           15/01/2025;Compra Jumbo;-25000;;475000\n\
                           16/01/2025;Pago Agua;-12000;;463000\n";

    async fn setup() -> (TempDir, DbPool) {
        let dir = TempDir::new().unwrap();
        let pool = create_db(&dir.path().join("cartola.db")).await.unwrap();
        (dir, pool)
    }

    fn write(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    // ── scan ──────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn scan_records_pending_import() {
        let (dir, pool) = setup().await;
        let path = write(&dir, "enero.csv", CARTOLA.as_bytes());

        let out = scan(&pool, &path, None, 1).await.unwrap();
        assert_eq!(out.bank_detected, "BCI");
        assert_eq!(out.rows_found, 2);
        assert_eq!(out.preview.len(), 1);
        assert_eq!(out.all_transactions.len(), 2);
        assert!(out.warning.is_none());
        assert!(out.duplicate_of.is_none());

        let job = get_statement_import(&pool, out.import_id).await.unwrap().unwrap();
        assert_eq!(job.filename, "enero.csv");
        assert_eq!(job.status, ImportStatus::Pending);
        assert_eq!(job.rows_total, 2);
    }

    #[tokio::test]
    async fn rescanning_same_bytes_reports_duplicate() {
        let (dir, pool) = setup().await;
        let path = write(&dir, "enero.csv", CARTOLA.as_bytes());

        let first = scan(&pool, &path, None, 20).await.unwrap();
        let second = scan(&pool, &path, None, 20).await.unwrap();
        assert_eq!(second.duplicate_of, Some(first.import_id));
        assert_ne!(second.import_id, first.import_id);
    }

    #[tokio::test]
    async fn empty_result_carries_warning() {
        let (dir, pool) = setup().await;
        let path = write(&dir, "vacio.txt", b"Fecha;Descripcion;Monto\n");

        let out = scan(&pool, &path, None, 20).await.unwrap();
        assert_eq!(out.rows_found, 0);
        assert_eq!(out.warning.as_deref(), Some(EMPTY_RESULT_WARNING));
    }

    #[tokio::test]
    async fn scan_rejects_pdf() {
        let (dir, pool) = setup().await;
        let path = write(&dir, "cartola.pdf", b"%PDF-1.4");
        assert!(scan(&pool, &path, None, 20).await.is_err());
    }

    #[tokio::test]
    async fn scan_with_unknown_account_fails() {
        let (dir, pool) = setup().await;
        let path = write(&dir, "enero.csv", CARTOLA.as_bytes());
        let err = scan(&pool, &path, Some(AccountId(7)), 20).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::AccountNotFound(AccountId(7)))
        );
    }

    // ── debug ─────────────────────────────────────────────────────────────────

    #[test]
    fn debug_reports_text_and_stats() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "enero.CSV", CARTOLA.as_bytes());

        let out = debug_extract(&path).unwrap();
        assert_eq!(out.ext, "csv");
        assert_eq!(out.lines, 4);
        assert_eq!(out.transactions_found, 2);
        assert_eq!(out.first_10.len(), 2);
        assert_eq!(out.stats.noise, 1);
        assert_eq!(out.text_preview, CARTOLA);
    }

    // ── confirm ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn scan_then_confirm_moves_balance() {
        let (dir, pool) = setup().await;
        let account = add_account(&pool, "Cuenta Corriente", Some("BCI"), Some(Decimal::from(500_000)))
            .await
            .unwrap();
        let account_id = account.id.unwrap();
        let path = write(&dir, "enero.csv", CARTOLA.as_bytes());
        let scanned = scan(&pool, &path, Some(account_id), 20).await.unwrap();

        let json = serde_json::to_string(&scanned.all_transactions).unwrap();
        let rows = parse_review_input(&json, true).unwrap();
        let out = confirm(&pool, scanned.import_id, account_id, &rows).await.unwrap();

        assert_eq!(out.summary, ImportSummary { imported: 2, skipped: 0 });
        assert_eq!(out.balance, Money::from_decimal(Decimal::from(463_000)));

        let err = confirm(&pool, scanned.import_id, account_id, &rows).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StorageError>(),
            Some(StorageError::Ledger(LedgerError::ImportAlreadyConfirmed(_)))
        ));
    }

    // ── review input ──────────────────────────────────────────────────────────

    #[test]
    fn review_input_accepts_wrapped_rows_and_blanks() {
        let json = r#"{"transactions": [
            {"include": true, "type": "expense", "amount": "25000", "date": "2025-01-15", "description": "Compra"},
            {"include": true, "type": "income", "amount": "", "date": "2025-01-16"}
        ]}"#;
        let rows = parse_review_input(json, false).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].direction, Direction::Expense);
        assert!(rows[0].postable().is_some());
        assert!(rows[1].amount.is_none());
    }

    #[test]
    fn scan_output_rows_need_explicit_include() {
        let json = r#"[{"date": "2025-01-15", "description": "Compra", "amount": "25000.00", "type": "expense", "raw": "x"}]"#;
        let rows = parse_review_input(json, false).unwrap();
        assert!(!rows[0].include);
        let rows = parse_review_input(json, true).unwrap();
        assert!(rows[0].include);
    }

    // ── accounts ──────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn add_and_list_accounts() {
        let (_dir, pool) = setup().await;
        add_account(&pool, "Cuenta RUT", None, None).await.unwrap();
        add_account(&pool, "Ahorro", Some("BancoEstado"), None).await.unwrap();

        let accounts = list_accounts(&pool).await.unwrap();
        let names: Vec<_> = accounts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Ahorro", "Cuenta RUT"]);
    }
}
