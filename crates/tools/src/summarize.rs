//! Summarize tool — truncates text to a fixed character budget.
//!
//! Counts Unicode scalar values, never bytes, so multi-byte text is never
//! split inside a character. No sentence-aware trimming.

use async_trait::async_trait;
use chatrelay_core::error::ExecutionError;
use chatrelay_core::tool::{Tool, ToolArguments, ToolParameter, string_arg};

/// Maximum number of characters kept.
pub const SUMMARY_MAX_CHARS: usize = 200;

/// Appended when the input was cut.
pub const TRUNCATION_MARKER: char = '…';

pub struct SummarizeTool;

#[async_trait]
impl Tool for SummarizeTool {
    fn name(&self) -> &str {
        "summarize"
    }

    fn description(&self) -> &str {
        "Summarize text in 1–2 sentences."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![ToolParameter::required_string("text").with_description("The text to summarize")]
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ExecutionError> {
        let text = string_arg(self.name(), arguments, "text")?;
        Ok(summarize(text))
    }
}

/// Keep the first [`SUMMARY_MAX_CHARS`] characters of `text`.
pub fn summarize(text: &str) -> String {
    match text.char_indices().nth(SUMMARY_MAX_CHARS) {
        Some((cut, _)) => {
            let mut out = String::with_capacity(cut + TRUNCATION_MARKER.len_utf8());
            out.push_str(&text[..cut]);
            out.push(TRUNCATION_MARKER);
            out
        }
        None => text.to_string(),
    }
}
