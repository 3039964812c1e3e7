//! Tool trait and registry for agent capabilities.
//!
//! Tools are the way the agent reaches outside the model. Each tool has a
//! name the model refers to, a description rendered into the prompt, and a
//! JSON schema for its arguments.
//!
//! The reason-act protocol only carries free text (`Entrada da Ferramenta:`),
//! so every tool can also be called with a plain string through
//! [`DynTool::call_text`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

pub use crate::error::ToolError;

/// A type alias for `Result<T, ToolError>`.
pub type ToolResult<T> = Result<T, ToolError>;

/// Definition of a tool as shown to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool (e.g., `duckduckgo_search`).
    pub name: String,

    /// Description of what the tool does.
    pub description: String,

    /// JSON schema for the tool's parameters.
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Returns the parameter a bare text input binds to: the first entry of
    /// the schema's `required` list, falling back to the first property.
    #[must_use]
    pub fn primary_parameter(&self) -> Option<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .and_then(|required| required.first())
            .and_then(Value::as_str)
            .or_else(|| {
                self.parameters
                    .get("properties")
                    .and_then(Value::as_object)
                    .and_then(|props| props.keys().next())
                    .map(String::as_str)
            })
    }
}

/// The core trait for all tools that agents can use.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Static name of the tool.
    const NAME: &'static str;

    /// Arguments type for the tool.
    type Args: for<'de> Deserialize<'de> + Send;

    /// Output type of the tool.
    type Output: Serialize + Send;

    /// Error type for tool execution.
    type Error: Into<ToolError> + Send;

    /// Get the name of the tool.
    fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Get the description of the tool.
    fn description(&self) -> String;

    /// Get the JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given arguments.
    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error>;

    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters_schema())
    }

    /// Call the tool with JSON arguments and return JSON output.
    async fn call_json(&self, args: Value) -> Result<Value, ToolError>
    where
        Self::Output: 'static,
    {
        // Handle both string and object arguments
        let typed_args: Self::Args = match &args {
            Value::String(s) => serde_json::from_str(s)?,
            _ => serde_json::from_value(args)?,
        };

        let result = self.call(typed_args).await.map_err(Into::into)?;
        serde_json::to_value(result).map_err(|e| ToolError::execution(e.to_string()))
    }
}

/// A boxed dynamic tool that can be used in collections.
pub type BoxedTool = Box<dyn DynTool>;

/// Object-safe version of the Tool trait for dynamic dispatch.
#[async_trait]
pub trait DynTool: Send + Sync {
    /// Get the name of the tool.
    fn name(&self) -> &str;

    /// Get the description of the tool.
    fn description(&self) -> String;

    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Call the tool with JSON arguments.
    async fn call_json(&self, args: Value) -> Result<Value, ToolError>;

    /// Call the tool with the free-text input of the reason-act protocol.
    ///
    /// A JSON object is passed through as arguments; anything else is bound
    /// to the tool's primary parameter. String outputs are returned as-is,
    /// other outputs as compact JSON.
    async fn call_text(&self, input: &str) -> Result<String, ToolError> {
        let args = text_to_args(&self.definition(), input)?;
        let output = self.call_json(args).await?;
        Ok(match output {
            Value::String(text) => text,
            other => other.to_string(),
        })
    }
}

#[async_trait]
impl<T: Tool + 'static> DynTool for T
where
    T::Output: 'static,
{
    fn name(&self) -> &str {
        Tool::name(self)
    }

    fn description(&self) -> String {
        Tool::description(self)
    }

    fn definition(&self) -> ToolDefinition {
        Tool::definition(self)
    }

    async fn call_json(&self, args: Value) -> Result<Value, ToolError> {
        Tool::call_json(self, args).await
    }
}

/// Turn a free-text tool input into JSON arguments for `definition`.
fn text_to_args(definition: &ToolDefinition, input: &str) -> ToolResult<Value> {
    let trimmed = input.trim();
    if trimmed.starts_with('{')
        && let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed)
    {
        return Ok(value);
    }

    let param = definition.primary_parameter().ok_or_else(|| {
        ToolError::invalid_args(format!(
            "tool '{}' declares no parameter for text input",
            definition.name
        ))
    })?;

    let mut args = serde_json::Map::new();
    args.insert(param.to_owned(), Value::String(strip_quotes(trimmed).to_owned()));
    Ok(Value::Object(args))
}

/// Remove one pair of matching surrounding quotes.
pub(crate) fn strip_quotes(text: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    text
}

/// A collection of tools that can be used by an agent.
///
/// Tools are keyed by name and iterated in name order so the rendered prompt
/// is stable between runs.
#[derive(Default)]
pub struct ToolBox {
    tools: BTreeMap<String, BoxedTool>,
}

impl ToolBox {
    /// Create a new empty toolbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool to the toolbox, replacing any tool with the same name.
    pub fn add<T: Tool + 'static>(&mut self, tool: T)
    where
        T::Output: 'static,
    {
        self.tools.insert(Tool::name(&tool).to_owned(), Box::new(tool));
    }

    /// Add a tool and return the toolbox (builder style).
    #[must_use]
    pub fn with<T: Tool + 'static>(mut self, tool: T) -> Self
    where
        T::Output: 'static,
    {
        self.add(tool);
        self
    }

    /// Get the names of all tools, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Check if the toolbox contains a tool with the given name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of tools in the toolbox.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the toolbox is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Render `name: description` lines for the `tools` template variable.
    #[must_use]
    pub fn render_descriptions(&self) -> String {
        self.tools
            .values()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Call a tool by name with free-text input.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::NotFound`] for unknown names, otherwise whatever
    /// the tool itself returns.
    pub async fn call_text(&self, name: &str, input: &str) -> ToolResult<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::not_found(name))?;
        tool.call_text(input).await
    }
}

impl fmt::Debug for ToolBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolBox")
            .field("tools", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct Upper;

    #[derive(Debug, Deserialize)]
    struct UpperArgs {
        text: String,
    }

    #[async_trait]
    impl Tool for Upper {
        const NAME: &'static str = "upper";
        type Args = UpperArgs;
        type Output = String;
        type Error = ToolError;

        fn description(&self) -> String {
            "Uppercases text.".to_owned()
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": { "text": { "type": "string" } },
                "required": ["text"]
            })
        }

        async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
            Ok(args.text.to_uppercase())
        }
    }

    #[derive(Debug, Clone, Copy)]
    struct Length;

    #[derive(Debug, Deserialize)]
    struct LengthArgs {
        word: String,
    }

    #[async_trait]
    impl Tool for Length {
        const NAME: &'static str = "length";
        type Args = LengthArgs;
        type Output = usize;
        type Error = ToolError;

        fn description(&self) -> String {
            "Counts characters.".to_owned()
        }

        fn parameters_schema(&self) -> Value {
            serde_json::json!({
                "type": "object",
                "properties": { "word": { "type": "string" } }
            })
        }

        async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
            Ok(args.word.chars().count())
        }
    }

    mod tool_definition {
        use super::*;

        #[test]
        fn primary_parameter_prefers_required() {
            let def = ToolDefinition::new(
                "t",
                "d",
                serde_json::json!({
                    "properties": { "a": {}, "b": {} },
                    "required": ["b"]
                }),
            );
            assert_eq!(def.primary_parameter(), Some("b"));
        }

        #[test]
        fn primary_parameter_falls_back_to_first_property() {
            assert_eq!(Tool::definition(&Length).primary_parameter(), Some("word"));
        }

        #[test]
        fn primary_parameter_none_without_schema() {
            let def = ToolDefinition::new("t", "d", serde_json::json!({}));
            assert_eq!(def.primary_parameter(), None);
        }
    }

    mod call_text {
        use super::*;

        #[tokio::test]
        async fn binds_plain_text_to_primary_parameter() {
            let out = DynTool::call_text(&Upper, "  capital da frança ").await.unwrap();
            assert_eq!(out, "CAPITAL DA FRANÇA");
        }

        #[tokio::test]
        async fn strips_surrounding_quotes() {
            let out = DynTool::call_text(&Upper, "\"paris\"").await.unwrap();
            assert_eq!(out, "PARIS");
        }

        #[tokio::test]
        async fn json_object_input_is_used_as_arguments() {
            let out = DynTool::call_text(&Upper, r#"{"text": "oi"}"#).await.unwrap();
            assert_eq!(out, "OI");
        }

        #[tokio::test]
        async fn non_string_output_is_rendered_as_json() {
            let out = DynTool::call_text(&Length, "abc").await.unwrap();
            assert_eq!(out, "3");
        }
    }

    mod toolbox {
        use super::*;

        #[test]
        fn names_are_sorted() {
            let toolbox = ToolBox::new().with(Upper).with(Length);
            assert_eq!(toolbox.names(), vec!["length", "upper"]);
            assert_eq!(toolbox.len(), 2);
            assert!(toolbox.contains("upper"));
            assert!(!toolbox.contains("missing"));
        }

        #[test]
        fn render_descriptions_lists_each_tool() {
            let toolbox = ToolBox::new().with(Upper).with(Length);
            assert_eq!(
                toolbox.render_descriptions(),
                "length: Counts characters.\nupper: Uppercases text."
            );
        }

        #[test]
        fn empty_toolbox() {
            let toolbox = ToolBox::new();
            assert!(toolbox.is_empty());
            assert_eq!(toolbox.render_descriptions(), "");
        }

        #[tokio::test]
        async fn call_text_unknown_tool_is_not_found() {
            let toolbox = ToolBox::new().with(Upper);
            let err = toolbox.call_text("nope", "x").await.unwrap_err();
            assert!(matches!(err, ToolError::NotFound(name) if name == "nope"));
        }

        #[tokio::test]
        async fn call_text_dispatches_by_name() {
            let toolbox = ToolBox::new().with(Upper).with(Length);
            assert_eq!(toolbox.call_text("upper", "a").await.unwrap(), "A");
            assert_eq!(toolbox.call_text("length", "abcd").await.unwrap(), "4");
        }

        #[tokio::test]
        async fn call_text_with_bad_json_arguments_is_invalid() {
            let toolbox = ToolBox::new().with(Upper);
            let err = toolbox
                .call_text("upper", r#"{"other": 1}"#)
                .await
                .unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments(_)));
        }
    }

    #[test]
    fn strip_quotes_only_matching_pairs() {
        assert_eq!(strip_quotes("'a'"), "a");
        assert_eq!(strip_quotes("\"a"), "\"a");
        assert_eq!(strip_quotes("`a b`"), "a b");
        assert_eq!(strip_quotes("plain"), "plain");
    }
}
