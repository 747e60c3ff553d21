use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Statements larger than this are refused before being read.
pub const MAX_UPLOAD_BYTES: u64 = 30 * 1024 * 1024;

pub const ACCEPTED_EXTENSIONS: &[&str] = &["csv", "txt"];

/// Formats that need a text export before they can be scanned.
const CONVERT_FIRST_EXTENSIONS: &[&str] = &["pdf", "xls", "xlsx"];

pub fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

pub fn check_extension(path: &Path) -> Result<()> {
    let ext = extension(path);
    if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(());
    }
    if CONVERT_FIRST_EXTENSIONS.contains(&ext.as_str()) {
        bail!(
            "{}: .{ext} statements must be exported or converted to .csv or .txt before scanning",
            path.display()
        );
    }
    bail!(
        "{}: unsupported file type (accepted: .csv, .txt)",
        path.display()
    );
}

/// Read a statement file after checking its type and size.
pub fn read_upload(path: &Path) -> Result<Vec<u8>> {
    check_extension(path)?;
    let size = fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    if size > MAX_UPLOAD_BYTES {
        bail!(
            "{}: file is {size} bytes, larger than the {MAX_UPLOAD_BYTES} byte limit",
            path.display()
        );
    }
    fs::read(path).with_context(|| format!("read {}", path.display()))
}

/// Lowercase hex SHA-256 of the uploaded bytes (64 chars).
pub fn content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest: [u8; 32] = hasher.finalize().into();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
