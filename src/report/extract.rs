//! Section Extractor: best-effort recovery of one labeled section's body
//! from unstructured model output.
//!
//! Model output formatting is not guaranteed exact, so extraction tolerates
//! missing colons, varying dash characters, and inconsistent spacing via a
//! two-tier fallback. Each tier is deliberately kept separate and is
//! unit-tested on its own rather than collapsed into one pattern.

use regex::Regex;
use std::sync::OnceLock;

/// A section ends where the next numbered section begins (`digits.` followed
/// by an uppercase letter), or at an unnumbered `NOTE:` / `CONTEXT ID:`
/// marker, or at end of text.
fn section_boundary() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| {
        Regex::new(r"\d+\.\s*[A-Z]|NOTE:|CONTEXT ID:").expect("section boundary pattern is valid")
    })
}

/// Tier 2 only stops at numbered markers.
fn numbered_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"\d+\.\s*[A-Z]").expect("numbered marker pattern is valid"))
}

/// Extract the body of the section introduced by `label` from `text`.
///
/// Returns the trimmed body, or an empty string when the label cannot be
/// found at any fallback tier. Never errors: labels are regex-escaped
/// before pattern construction (labels like `3. EMOTIONAL SEQUENCE`
/// contain metacharacters).
pub fn extract_section(text: &str, label: &str) -> String {
    let escaped = regex::escape(label);

    // Tier 1: label plus an optional separator run (colon, dash, en/em
    // dash, whitespace), body up to the next section boundary. The body
    // spans newlines.
    if let Ok(head) = Regex::new(&format!(r"{escaped}[\s:\-–—]*"))
        && let Some(found) = head.find(text)
    {
        let rest = &text[found.end()..];
        let body = match section_boundary().find(rest) {
            Some(boundary) => &rest[..boundary.start()],
            None => rest,
        };
        let trimmed = body.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // Tier 2: skip the remainder of the label's own line, then take
    // everything up to the next numbered marker.
    if let Ok(line) = Regex::new(&format!(r"{escaped}[^\n]*\n"))
        && let Some(found) = line.find(text)
    {
        let rest = &text[found.end()..];
        let body = match numbered_marker().find(rest) {
            Some(marker) => &rest[..marker.start()],
            None => rest,
        };
        let trimmed = body.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    String::new()
}
