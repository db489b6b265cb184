//! Recall codes: `PREFIX-YYYYMMDD-HHMMSS`, issued once per conversation and
//! reused for every report regeneration and storage key.

use chrono::{DateTime, Local};
use regex::Regex;

/// Validates and generates recall codes for one configured prefix. Every
/// validation site in the crate goes through this type, so the prefix can
/// never drift between the gateway and the asset store.
#[derive(Debug, Clone)]
pub struct CodeFormat {
    prefix: String,
    pattern: Regex,
}

impl CodeFormat {
    /// The prefix is validated at config load time to be non-empty uppercase
    /// ASCII, so the composed pattern is always valid.
    pub fn new(prefix: &str) -> Self {
        let escaped = regex::escape(prefix);
        let pattern = Regex::new(&format!(r"^{escaped}-\d{{8}}-\d{{6}}$"))
            .expect("code pattern built from an escaped prefix");
        Self {
            prefix: prefix.to_string(),
            pattern,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a fresh code from the current local time.
    pub fn generate(&self) -> String {
        self.generate_at(Local::now())
    }

    pub fn generate_at(&self, timestamp: DateTime<Local>) -> String {
        format!("{}-{}", self.prefix, timestamp.format("%Y%m%d-%H%M%S"))
    }

    pub fn is_valid(&self, code: &str) -> bool {
        self.pattern.is_match(code)
    }

    /// Human-readable shape for error messages.
    pub fn expected_shape(&self) -> String {
        format!("{}-YYYYMMDD-HHMMSS", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_code_matches_own_pattern() {
        let format = CodeFormat::new("SSY");
        let code = format.generate();
        assert!(format.is_valid(&code), "generated code {code} should validate");
    }

    #[test]
    fn generate_at_is_deterministic() {
        let format = CodeFormat::new("EMV");
        let timestamp = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(format.generate_at(timestamp), "EMV-20240101-120000");
    }

    #[test]
    fn rejects_wrong_prefix() {
        let format = CodeFormat::new("SSY");
        assert!(!format.is_valid("EMV-20240101-120000"));
    }

    #[test]
    fn rejects_malformed_codes() {
        let format = CodeFormat::new("SSY");
        for code in [
            "SSY-2024-120000",
            "SSY-20240101-12000",
            "SSY-20240101-1200000",
            "ssy-20240101-120000",
            "SSY-20240101120000",
            "SSY-20240101-120000 ",
            "",
        ] {
            assert!(!format.is_valid(code), "{code:?} should be rejected");
        }
    }

    #[test]
    fn expected_shape_names_prefix() {
        assert_eq!(CodeFormat::new("SSY").expected_shape(), "SSY-YYYYMMDD-HHMMSS");
    }
}
