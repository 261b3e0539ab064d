//! Size budgets for context handed between stages.
//!
//! Every cross-stage hand-off is a capped string. Head truncation keeps the
//! first `n` characters, tail truncation keeps the last `n`. Both append
//! [`TRUNCATION_MARKER`] only when something was cut. Lengths are counted in
//! characters, not bytes.

/// Appended to any field that exceeded its budget.
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Serialized profile handed to a specialist (head).
pub const PROFILE_CHARS: usize = 1200;
/// Enrichment result handed to a specialist (head).
pub const ENRICHMENT_CONTEXT_CHARS: usize = 1200;
/// Earlier specialists' insights handed to the next one (tail).
pub const INSIGHTS_CHARS: usize = 2000;
/// Labelled outputs handed to the synthesizer (head).
pub const SYNTHESIS_CHARS: usize = 4000;
/// Raw lookup text handed to the enrichment summariser (head).
pub const LOOKUP_RAW_CHARS: usize = 3000;

/// Recent messages shown to specialists and the enrichment unit.
pub const HISTORY_WINDOW: usize = 6;
/// Recent messages shown to the profile distiller.
pub const DISTILL_WINDOW: usize = 8;
/// The distiller runs when the user-message count is a multiple of this.
pub const DISTILL_CADENCE: usize = 3;
/// Compaction triggers above this many messages.
pub const COMPACT_THRESHOLD: usize = 60;
/// Messages kept verbatim after compaction.
pub const COMPACT_KEEP_RECENT: usize = 10;
/// Older messages considered for the summary.
pub const COMPACT_OLDER_WINDOW: usize = 40;
/// Hard cap on specialists per turn.
pub const MAX_SPECIALISTS: usize = 3;

/// Keep the first `limit` characters of `text`.
pub fn truncate_head(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
    }
}

/// Keep the last `limit` characters of `text`.
///
/// The cut is made at the start: the oldest characters are dropped. The
/// marker is appended at the end all the same, so it flags that text was
/// removed, not where.
pub fn truncate_tail(text: &str, limit: usize) -> String {
    let total = text.chars().count();
    if total <= limit {
        return text.to_string();
    }
    let skip = total - limit;
    let cut = text
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    format!("{}{}", &text[cut..], TRUNCATION_MARKER)
}
