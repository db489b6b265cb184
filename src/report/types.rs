use serde::{Deserialize, Serialize};

/// The 16 fixed report sections, in render order. Numbering is contiguous
/// 1 through 16; both the extraction prompt and the extractor labels are
/// built from this one table.
pub const SECTIONS: [(u8, &str); 16] = [
    (1, "FLOW"),
    (2, "CORE EXPRESSIONS"),
    (3, "EMOTIONAL SEQUENCE"),
    (4, "RESTORATION TRIGGER"),
    (5, "RETRIEVAL INSTRUCTION"),
    (6, "CONTEXT TIMESTAMP"),
    (7, "FEEDBACK SIGNAL"),
    (8, "RESPONSE STYLE SUGGESTION"),
    (9, "USER STYLE INDICATOR"),
    (10, "NEXT MEMORY LABEL"),
    (11, "CONTINUATION CONTEXT"),
    (12, "CONTEXT VARIATION HINT"),
    (13, "AI SELF-MODULATION TIP"),
    (14, "RESPONSE DIRECTION OPTIONS"),
    (15, "REPORT GENERATED USING"),
    (16, "NOTE"),
];

/// `"N. NAME"`, the numbered form the extraction prompt demands and the
/// extractor searches for.
pub fn numbered_label(number: u8, name: &str) -> String {
    format!("{number}. {name}")
}

/// One structured summary of a conversation. Created fresh on every
/// report-generation call and never mutated after assembly; the renderer
/// receives it as an immutable snapshot.
///
/// Field names serialize in camelCase to match the capture client's wire
/// format.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportRecord {
    pub code: String,
    pub flow: String,
    pub core_expressions: String,
    pub emotional_sequence: String,
    pub restoration_trigger: String,
    pub retrieval_instruction: String,
    pub context_timestamp: String,
    pub feedback_signal: String,
    pub response_style_suggestion: String,
    pub user_style_indicator: String,
    pub next_memory_label: String,
    pub continuation_context: String,
    pub context_variation_hint: String,
    pub ai_self_modulation_tip: String,
    pub response_direction_options: String,
    pub report_generated_using: String,
    pub note: String,
}

impl ReportRecord {
    pub fn empty(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    /// Body of a section by its number in [`SECTIONS`].
    pub fn section_body(&self, number: u8) -> &str {
        match number {
            1 => &self.flow,
            2 => &self.core_expressions,
            3 => &self.emotional_sequence,
            4 => &self.restoration_trigger,
            5 => &self.retrieval_instruction,
            6 => &self.context_timestamp,
            7 => &self.feedback_signal,
            8 => &self.response_style_suggestion,
            9 => &self.user_style_indicator,
            10 => &self.next_memory_label,
            11 => &self.continuation_context,
            12 => &self.context_variation_hint,
            13 => &self.ai_self_modulation_tip,
            14 => &self.response_direction_options,
            15 => &self.report_generated_using,
            16 => &self.note,
            _ => "",
        }
    }

    pub(crate) fn set_section_body(&mut self, number: u8, body: String) {
        match number {
            1 => self.flow = body,
            2 => self.core_expressions = body,
            3 => self.emotional_sequence = body,
            4 => self.restoration_trigger = body,
            5 => self.retrieval_instruction = body,
            6 => self.context_timestamp = body,
            7 => self.feedback_signal = body,
            8 => self.response_style_suggestion = body,
            9 => self.user_style_indicator = body,
            10 => self.next_memory_label = body,
            11 => self.continuation_context = body,
            12 => self.context_variation_hint = body,
            13 => self.ai_self_modulation_tip = body,
            14 => self.response_direction_options = body,
            15 => self.report_generated_using = body,
            16 => self.note = body,
            _ => {}
        }
    }
}
