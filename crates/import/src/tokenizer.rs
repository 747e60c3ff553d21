use serde::Serialize;
use std::fmt;

use crate::util::strip_quotes;

/// Number of leading lines inspected when sniffing the separator.
pub const SNIFF_SAMPLE_LINES: usize = 20;

/// A separator must occur more often than this in the sample to be chosen.
const SNIFF_MIN_OCCURRENCES: usize = 5;

/// Field delimiter shared by every row of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Separator {
    Semicolon,
    Comma,
    Tab,
}

impl Separator {
    pub fn as_byte(self) -> u8 {
        match self {
            Separator::Semicolon => b';',
            Separator::Comma => b',',
            Separator::Tab => b'\t',
        }
    }

    pub fn as_char(self) -> char {
        char::from(self.as_byte())
    }

    /// Pick the document separator from the first [`SNIFF_SAMPLE_LINES`] lines.
    ///
    /// `;` wins when it appears more than five times, then `,` under the same
    /// rule; otherwise the document is assumed to be tab separated (the layout
    /// PDF text extraction produces).
    pub fn sniff<S: AsRef<str>>(lines: &[S]) -> Self {
        let (semicolons, commas) = lines
            .iter()
            .take(SNIFF_SAMPLE_LINES)
            .flat_map(|l| l.as_ref().chars())
            .fold((0usize, 0usize), |(s, c), ch| match ch {
                ';' => (s + 1, c),
                ',' => (s, c + 1),
                _ => (s, c),
            });

        if semicolons > SNIFF_MIN_OCCURRENCES {
            Separator::Semicolon
        } else if commas > SNIFF_MIN_OCCURRENCES {
            Separator::Comma
        } else {
            Separator::Tab
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Separator::Semicolon => write!(f, ";"),
            Separator::Comma => write!(f, ","),
            Separator::Tab => write!(f, "\\t"),
        }
    }
}

/// Split one line into trimmed, quote-stripped fields.
///
/// Quotes carry no meaning while splitting: every separator ends a field, and
/// one quote at either end of a field is dropped afterwards. A quote that
/// opens and never closes (common in PDF-extracted text) cannot swallow the
/// rest of the row.
pub fn tokenize(line: &str, separator: Separator) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .delimiter(separator.as_byte())
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => record
            .iter()
            .map(|field| strip_quotes(field.trim()).trim().to_string())
            .collect(),
        // Empty input or a record the reader refuses: fall back to a plain split.
        _ => line
            .split(separator.as_char())
            .map(|field| strip_quotes(field.trim()).trim().to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── sniff ─────────────────────────────────────────────────────────────────

    #[test]
    fn sniff_semicolon() {
        let lines = ["15/01/2025;Compra;-25000;;475000", "16/01/2025;Sueldo;;1500000;1975000"];
        assert_eq!(Separator::sniff(&lines), Separator::Semicolon);
    }

    #[test]
    fn sniff_comma() {
        let lines = ["15/01/2025,Compra,-25000,,475000", "16/01/2025,Sueldo,,1500000,1975000"];
        assert_eq!(Separator::sniff(&lines), Separator::Comma);
    }

    #[test]
    fn sniff_semicolon_beats_comma() {
        let lines = ["a;b;c;d;e;f;g,h,i,j,k,l,m"];
        assert_eq!(Separator::sniff(&lines), Separator::Semicolon);
    }

    #[test]
    fn sniff_threshold_is_strictly_more_than_five() {
        assert_eq!(Separator::sniff(&["a;b;c;d;e;f"]), Separator::Tab);
        assert_eq!(Separator::sniff(&["a;b;c;d;e;f;g"]), Separator::Semicolon);
    }

    #[test]
    fn sniff_defaults_to_tab() {
        let lines = ["15/01/2025\tCompra\t-25000", "16/01/2025\tSueldo\t1500000"];
        assert_eq!(Separator::sniff(&lines), Separator::Tab);
        assert_eq!(Separator::sniff::<&str>(&[]), Separator::Tab);
    }

    #[test]
    fn sniff_ignores_lines_past_sample() {
        let mut lines = vec!["no separators here"; SNIFF_SAMPLE_LINES];
        lines.push("a;b;c;d;e;f;g;h;i");
        assert_eq!(Separator::sniff(&lines), Separator::Tab);
    }

    // ── tokenize ──────────────────────────────────────────────────────────────

    #[test]
    fn tokenize_trims_fields() {
        assert_eq!(
            tokenize(" 15/01/2025 ; Compra Jumbo ;-25000; ;475000", Separator::Semicolon),
            vec!["15/01/2025", "Compra Jumbo", "-25000", "", "475000"]
        );
    }

    #[test]
    fn tokenize_strips_quotes() {
        assert_eq!(
            tokenize("\"15/01/2025\";\"Compra\";\"-25.000\"", Separator::Semicolon),
            vec!["15/01/2025", "Compra", "-25.000"]
        );
    }

    #[test]
    fn tokenize_splits_inside_quotes() {
        assert_eq!(
            tokenize("15/01/2025,\"Compra, Lider\",-1000", Separator::Comma),
            vec!["15/01/2025", "Compra", "Lider", "-1000"]
        );
    }

    #[test]
    fn tokenize_unbalanced_quote_keeps_later_fields() {
        assert_eq!(
            tokenize("15/01/2025;\"Compra Jumbo;-25000;;475000", Separator::Semicolon),
            vec!["15/01/2025", "Compra Jumbo", "-25000", "", "475000"]
        );
    }

    #[test]
    fn tokenize_tab() {
        assert_eq!(
            tokenize("15/01/2025\tCompra\t-25000", Separator::Tab),
            vec!["15/01/2025", "Compra", "-25000"]
        );
    }

    #[test]
    fn tokenize_single_field() {
        assert_eq!(tokenize("solo texto", Separator::Semicolon), vec!["solo texto"]);
    }
}
