//! Report pipeline: code issuance, section extraction from free-form model
//! output, report assembly, and HTML rendering for image capture.

pub mod assemble;
pub mod code;
pub mod extract;
pub mod render;
pub mod types;

pub use assemble::ReportAssembler;
pub use code::CodeFormat;
pub use extract::extract_section;
pub use render::render_report;
pub use types::{ReportRecord, SECTIONS, numbered_label};
