//! Translate tool — tags text with the requested target language.
//!
//! This is a placeholder transform: the output is `"[{targetLang}] {text}"`
//! and no translation happens. Swap the registered tool for a real
//! implementation to change that.

use async_trait::async_trait;
use chatrelay_core::error::ExecutionError;
use chatrelay_core::tool::{Tool, ToolArguments, ToolParameter, string_arg};

pub struct TranslateTool;

#[async_trait]
impl Tool for TranslateTool {
    fn name(&self) -> &str {
        "translate"
    }

    fn description(&self) -> &str {
        "Translate text into a target language."
    }

    fn parameters(&self) -> Vec<ToolParameter> {
        vec![
            ToolParameter::required_string("text").with_description("The text to translate"),
            ToolParameter::required_string("targetLang")
                .with_description("Target language code, e.g. 'fr'"),
        ]
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ExecutionError> {
        let text = string_arg(self.name(), arguments, "text")?;
        let target = string_arg(self.name(), arguments, "targetLang")?;
        Ok(tag_translation(text, target))
    }
}

pub fn tag_translation(text: &str, target_lang: &str) -> String {
    format!("[{target_lang}] {text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_with_target_language() {
        assert_eq!(tag_translation("hello", "fr"), "[fr] hello");
    }

    #[tokio::test]
    async fn execute_formats_output() {
        let args = serde_json::json!({"text": "hello", "targetLang": "fr"})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(TranslateTool.execute(&args).await.unwrap(), "[fr] hello");
    }

    #[tokio::test]
    async fn execute_reports_missing_target() {
        let args = serde_json::json!({"text": "hello"}).as_object().cloned().unwrap();
        let err = TranslateTool.execute(&args).await.unwrap_err();
        assert_eq!(
            err,
            ExecutionError::MissingArgument {
                tool: "translate".into(),
                argument: "targetLang".into(),
            }
        );
    }

    #[test]
    fn schema_declares_both_parameters_in_order() {
        let schema = TranslateTool.schema();
        let names: Vec<_> = schema.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["text", "targetLang"]);
        assert!(schema.parameters.iter().all(|p| p.required));
    }
}
