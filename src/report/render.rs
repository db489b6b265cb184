//! Report Renderer: serializes a [`ReportRecord`] into a self-contained
//! HTML document for the downstream image capture step. Pure: same record
//! in, same document out; no external calls.

use super::types::{ReportRecord, SECTIONS, numbered_label};

/// Shown in place of any section the extraction left empty; the capture
/// image must never contain a blank section body.
const EMPTY_SECTION_PLACEHOLDER: &str =
    "Content was not generated; the conversation may be too short.";

/// Minimal HTML escaping for section bodies and the code. The renderer is
/// the only place in the crate that interpolates model output into markup.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the fixed-structure capture document: title, code, the 16
/// sections in numeric order, and a footer restating the code.
pub fn render_report(record: &ReportRecord) -> String {
    let code = escape_html(&record.code);
    let mut document = String::with_capacity(4096);

    document.push_str(
        "<div class=\"report-container\" style=\"font-family: Arial, sans-serif; \
         padding: 20px; background-color: #f9f9f9; max-width: 800px; \
         border-radius: 10px; box-shadow: 0 0 10px rgba(0,0,0,0.1);\">\n",
    );
    document.push_str(
        "  <h1 style=\"color: #333; text-align: center;\">[PORTABLE CONTEXT LAYER REPORT]</h1>\n",
    );
    document.push_str(&format!(
        "  <h2 style=\"color: #555; text-align: center;\">CODE: {code}</h2>\n"
    ));

    for (number, name) in SECTIONS {
        let body = record.section_body(number);
        let shown = if body.trim().is_empty() {
            EMPTY_SECTION_PLACEHOLDER.to_string()
        } else {
            escape_html(body)
        };
        document.push_str("  <div class=\"section\" style=\"margin-bottom: 20px;\">\n");
        document.push_str(&format!(
            "    <h3 style=\"color: #444;\">{}:</h3>\n",
            numbered_label(number, name)
        ));
        document.push_str(&format!(
            "    <p style=\"color: #666; line-height: 1.6;\">{shown}</p>\n"
        ));
        document.push_str("  </div>\n");
    }

    document.push_str(&format!(
        "  <div class=\"footer\" style=\"text-align: center; margin-top: 30px; \
         color: #888; font-size: 0.8em;\">\n    <p>END OF CONTEXT</p>\n    \
         <p>CODE: {code}</p>\n  </div>\n</div>\n"
    ));
    document
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record() -> ReportRecord {
        let mut record = ReportRecord::empty("SSY-20240101-120000");
        for (number, name) in SECTIONS {
            record.set_section_body(number, format!("body of {name}"));
        }
        record
    }

    #[test]
    fn renders_every_section_heading_in_order() {
        let document = render_report(&full_record());
        let mut last_position = 0;
        for (number, name) in SECTIONS {
            let heading = format!("{}:", numbered_label(number, name));
            let position = document.find(&heading).expect("heading present");
            assert!(position > last_position, "{heading} out of order");
            last_position = position;
        }
    }

    #[test]
    fn empty_fields_get_placeholder_never_blank() {
        let record = ReportRecord::empty("SSY-20240101-120000");
        let document = render_report(&record);
        assert!(!document.contains("<p style=\"color: #666; line-height: 1.6;\"></p>"));
        assert_eq!(
            document.matches(EMPTY_SECTION_PLACEHOLDER).count(),
            SECTIONS.len()
        );
    }

    #[test]
    fn code_appears_in_header_and_footer() {
        let document = render_report(&full_record());
        assert!(document.matches("CODE: SSY-20240101-120000").count() >= 2);
        assert!(document.contains("END OF CONTEXT"));
    }

    #[test]
    fn section_bodies_are_html_escaped() {
        let mut record = full_record();
        record.flow = "<script>alert('x')</script> & more".into();
        let document = render_report(&record);
        assert!(!document.contains("<script>"));
        assert!(document.contains("&lt;script&gt;"));
        assert!(document.contains("&amp; more"));
    }

    #[test]
    fn rendering_is_pure() {
        let record = full_record();
        assert_eq!(render_report(&record), render_report(&record));
    }
}
