//! Whitespace normalization for extracted page text.
//!
//! Web pages come back with enormous runs of blank lines and indentation.
//! The passes below flatten that into something cheap to ship to the model,
//! applied in a fixed order and capped at a hard length.

use regex::Regex;
use std::sync::LazyLock;

/// Hard cap on cleaned text length, in characters.
pub const MAX_CONTENT_LEN: usize = 100_000;

static NEWLINE_RUNS_OF_4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{4,}").expect("static regex"));
static SPACE_RUNS_OF_3: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {3,}").expect("static regex"));
static RESIDUAL_NEWLINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n+(\s*\n)*").expect("static regex"));

/// Normalize whitespace and truncate to `max_len` characters.
///
/// Order matters: runs of four or more newlines collapse to three, double
/// newlines become a single space, tabs are stripped, runs of three or more
/// spaces collapse to two, and any residual newline run collapses to one.
/// Tabs go before the space pass so removing them cannot leave a space run
/// the pass never saw. Applying the function twice yields the same result
/// as once.
pub fn clean_text(text: &str, max_len: usize) -> String {
    let trimmed = text.trim();
    let pass = NEWLINE_RUNS_OF_4.replace_all(trimmed, "\n\n\n");
    let pass = pass.replace("\n\n", " ");
    let pass = pass.replace('\t', "");
    let pass = SPACE_RUNS_OF_3.replace_all(&pass, "  ");
    let mut cleaned = RESIDUAL_NEWLINE_RUNS
        .replace_all(&pass, "\n")
        .into_owned();

    if let Some((idx, _)) = cleaned.char_indices().nth(max_len) {
        cleaned.truncate(idx);
        // The cut may land after whitespace; keep the output trimmed.
        cleaned.truncate(cleaned.trim_end().len());
    }
    cleaned
}
