//! Byte-to-text step run before the statement parser.
//!
//! Chilean bank exports arrive as UTF-8 or as Latin-1 (ISO-8859-1). Valid
//! UTF-8 is kept as is; anything else is read as Latin-1, which maps every
//! byte to a character and therefore never fails.

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub fn decode_statement(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            tracing::debug!("statement is not valid UTF-8, reading as Latin-1");
            latin1(bytes)
        }
    };
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    normalize_newlines(text)
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
