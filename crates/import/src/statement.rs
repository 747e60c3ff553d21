use cartola_core::{ParsedTransaction, StatementParseResult};
use serde::Serialize;

use crate::assembler::assemble;
use crate::classifier::{classify, RowClass};
use crate::institution::detect_institution;
use crate::tokenizer::{tokenize, Separator};

/// Lines this short or shorter are never rows.
const MIN_LINE_CHARS: usize = 2;

/// Document-level facts fixed before any row is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    pub separator: Separator,
    pub institution: &'static str,
}

impl ParseContext {
    pub fn detect<S: AsRef<str>>(text: &str, lines: &[S]) -> Self {
        Self {
            separator: Separator::sniff(lines),
            institution: detect_institution(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Noise,
    TooFewFields,
    NoDate,
    NoNumeric,
    ZeroAmount,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Parsed(ParsedTransaction),
    Skipped(SkipReason),
}

/// Per-document counters, reported by the `debug` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub lines: usize,
    pub parsed: usize,
    pub noise: usize,
    pub too_few_fields: usize,
    pub no_date: usize,
    pub no_numeric: usize,
    pub zero_amount: usize,
}

impl ParseStats {
    fn record(&mut self, outcome: &RowOutcome) {
        self.lines += 1;
        match outcome {
            RowOutcome::Parsed(_) => self.parsed += 1,
            RowOutcome::Skipped(SkipReason::Noise) => self.noise += 1,
            RowOutcome::Skipped(SkipReason::TooFewFields) => self.too_few_fields += 1,
            RowOutcome::Skipped(SkipReason::NoDate) => self.no_date += 1,
            RowOutcome::Skipped(SkipReason::NoNumeric) => self.no_numeric += 1,
            RowOutcome::Skipped(SkipReason::ZeroAmount) => self.zero_amount += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.lines - self.parsed
    }
}

/// Process one line with the document's fixed context. Rows never see each other.
pub fn parse_row(line: &str, ctx: &ParseContext) -> RowOutcome {
    let fields = tokenize(line, ctx.separator);
    match classify(&fields) {
        RowClass::Noise => RowOutcome::Skipped(SkipReason::Noise),
        RowClass::TooFewFields => RowOutcome::Skipped(SkipReason::TooFewFields),
        RowClass::NoDate => RowOutcome::Skipped(SkipReason::NoDate),
        RowClass::NoNumeric => RowOutcome::Skipped(SkipReason::NoNumeric),
        RowClass::Classified(roles) => match assemble(&fields, &roles, line) {
            Some(tx) => RowOutcome::Parsed(tx),
            None => RowOutcome::Skipped(SkipReason::ZeroAmount),
        },
    }
}

/// A trimmed document line and its 1-based position in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

impl AsRef<str> for CandidateLine<'_> {
    fn as_ref(&self) -> &str {
        self.text
    }
}

/// Candidate rows of a document: trimmed, with near-empty lines dropped.
pub fn candidate_lines(text: &str) -> Vec<CandidateLine<'_>> {
    text.lines()
        .enumerate()
        .map(|(i, l)| CandidateLine { number: i + 1, text: l.trim() })
        .filter(|l| l.text.chars().count() > MIN_LINE_CHARS)
        .collect()
}

pub struct StatementParser;

impl StatementParser {
    pub fn parse(text: &str) -> StatementParseResult {
        Self::parse_with_stats(text).0
    }

    /// Parse a decoded statement. Unusable rows are skipped, never reported
    /// as errors; an empty transaction list is a valid result.
    pub fn parse_with_stats(text: &str) -> (StatementParseResult, ParseStats) {
        let lines = candidate_lines(text);
        let ctx = ParseContext::detect(text, &lines);

        let mut stats = ParseStats::default();
        let mut transactions = Vec::new();
        for line in &lines {
            let outcome = parse_row(line.text, &ctx);
            stats.record(&outcome);
            match outcome {
                RowOutcome::Parsed(tx) => transactions.push(tx),
                RowOutcome::Skipped(reason) => {
                    tracing::debug!(line = line.number, ?reason, "skipping statement row");
                }
            }
        }

        tracing::info!(
            institution = ctx.institution,
            separator = %ctx.separator,
            parsed = stats.parsed,
            skipped = stats.skipped(),
            "statement parsed"
        );
        if transactions.is_empty() {
            tracing::warn!("no transactions recognized in statement");
        }

        let result = StatementParseResult {
            institution_name: ctx.institution.to_string(),
            transactions,
        };
        (result, stats)
    }
}

pub fn parse_statement(text: &str) -> StatementParseResult {
    StatementParser::parse(text)
}
