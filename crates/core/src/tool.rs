//! Tool trait — the abstraction over what the completion service may call.
//!
//! A tool is a schema + handler pair. New tools are added by registering
//! another implementation in the [`ToolRegistry`]; dispatch and execution
//! logic never change.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ExecutionError;
use crate::provider::ToolDefinition;

/// Arguments of a tool invocation, keyed by parameter name.
pub type ToolArguments = serde_json::Map<String, serde_json::Value>;

/// A validated request to execute a tool, produced by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: ToolArguments,
}

impl ToolInvocation {
    pub fn new(name: impl Into<String>, arguments: ToolArguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Integer,
    Boolean,
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ToolParameter {
    /// A required string parameter.
    pub fn required_string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterType::String,
            required: true,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The static description of a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// Parameters in declaration order
    pub parameters: Vec<ToolParameter>,
}

impl ToolSchema {
    /// Render the parameter list as a JSON Schema object.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for param in &self.parameters {
            let mut prop = serde_json::json!({ "type": param.kind });
            if let Some(desc) = &param.description {
                prop["description"] = serde_json::json!(desc);
            }
            properties.insert(param.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Render as `name(param, param)` for the system instruction.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        format!("{}({})", self.name, params.join(", "))
    }

    /// Names of required parameters that are absent (or `null`) in `arguments`.
    pub fn missing_required<'a>(&'a self, arguments: &ToolArguments) -> Vec<&'a str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .filter(|p| arguments.get(&p.name).is_none_or(|v| v.is_null()))
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// The core Tool trait.
///
/// Handlers receive arguments that already passed required-parameter
/// validation; type mismatches are theirs to report as
/// [`ExecutionError::HandlerFailed`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "summarize").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// Declared parameters, in order.
    fn parameters(&self) -> Vec<ToolParameter>;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: &ToolArguments) -> std::result::Result<String, ExecutionError>;

    /// The full schema of this tool.
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        let schema = self.schema();
        ToolDefinition {
            parameters: schema.to_json_schema(),
            name: schema.name,
            description: schema.description,
        }
    }
}

/// Read a string argument, distinguishing absent from ill-typed values.
pub fn string_arg<'a>(
    tool: &str,
    arguments: &'a ToolArguments,
    name: &str,
) -> std::result::Result<&'a str, ExecutionError> {
    match arguments.get(name) {
        None | Some(serde_json::Value::Null) => Err(ExecutionError::MissingArgument {
            tool: tool.to_string(),
            argument: name.to_string(),
        }),
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(other) => Err(ExecutionError::HandlerFailed {
            tool: tool.to_string(),
            reason: format!("argument '{name}' must be a string, got {other}"),
        }),
    }
}

/// An ordered registry of available tools.
///
/// The pipeline uses this to:
/// 1. Advertise tool schemas to the completion service (registration order)
/// 2. Resolve tools by name when the service requests one
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name,
    /// keeping its position.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => self.tools[idx] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Resolve a tool by name, failing with `UnknownTool`.
    pub fn resolve(&self, name: &str) -> std::result::Result<&dyn Tool, ExecutionError> {
        self.get(name)
            .ok_or_else(|| ExecutionError::UnknownTool(name.to_string()))
    }

    /// All schemas, in registration order.
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
