//! Tool System
//!
//! Tools are registered once at startup and invoked by the agent loop.
//! Each tool declares a strongly-typed input; raw JSON from the model is
//! checked against the published contract and deserialized before the
//! handler runs.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result, ToolError};

/// JSON Schema primitive type of a parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    fn matches(self, value: &serde_json::Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type
    #[serde(rename = "type")]
    pub param_type: ParamType,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    pub fn required(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, param_type: ParamType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

/// Published invocation contract of a tool
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolContract {
    /// Unique tool identifier
    pub name: String,

    /// Guidance for the model; never validated locally
    pub description: String,

    /// Parameter definitions, in declaration order
    pub parameters: Vec<ParameterSchema>,
}

impl ToolContract {
    /// JSON Schema object for the tool's input
    pub fn input_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({ "type": p.param_type, "description": p.description }),
                )
            })
            .collect();
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

    /// Check raw input against the declared parameters
    pub fn validate(&self, input: &serde_json::Value) -> std::result::Result<(), ToolError> {
        let Some(fields) = input.as_object() else {
            return Err(ToolError::InvalidInput(format!(
                "{} expects an object, got {}",
                self.name, input
            )));
        };

        for param in &self.parameters {
            match fields.get(&param.name) {
                None | Some(serde_json::Value::Null) if param.required => {
                    return Err(ToolError::InvalidInput(format!(
                        "Missing required parameter: {}",
                        param.name
                    )));
                }
                Some(value) if !value.is_null() && !param.param_type.matches(value) => {
                    return Err(ToolError::InvalidInput(format!(
                        "Parameter '{}' must be of type {:?}",
                        param.name, param.param_type
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    type Input: DeserializeOwned + Send;
    type Output: Serialize + Send;

    /// Contract published to the completion service
    fn contract(&self) -> ToolContract;

    /// Execute the tool with validated input
    async fn call(&self, input: Self::Input) -> std::result::Result<Self::Output, ToolError>;
}

/// Object-safe handler stored in the registry
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn contract(&self) -> &ToolContract;

    /// Validate, decode, run, and encode one invocation
    async fn invoke(&self, input: &serde_json::Value) -> std::result::Result<serde_json::Value, ToolError>;
}

struct TypedHandler<T> {
    contract: ToolContract,
    tool: T,
}

#[async_trait]
impl<T: Tool> ToolHandler for TypedHandler<T> {
    fn contract(&self) -> &ToolContract {
        &self.contract
    }

    async fn invoke(&self, input: &serde_json::Value) -> std::result::Result<serde_json::Value, ToolError> {
        self.contract.validate(input)?;

        let typed: T::Input = serde_json::from_value(input.clone())
            .map_err(|e| ToolError::InvalidInput(format!("{}: {}", self.contract.name, e)))?;

        let output = self.tool.call(typed).await?;

        serde_json::to_value(output).map_err(|e| ToolError::Execution(e.to_string()))
    }
}

/// Registry for available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolHandler>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool. Names must be unique.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        let contract = tool.contract();
        self.register_handler(Arc::new(TypedHandler { contract, tool }))
    }

    /// Register an already type-erased handler
    pub fn register_handler(&mut self, handler: Arc<dyn ToolHandler>) -> Result<()> {
        let name = handler.contract().name.clone();
        if self.tools.contains_key(&name) {
            return Err(AgentError::Config(format!("Tool registered twice: {}", name)));
        }
        self.tools.insert(name, handler);
        Ok(())
    }

    /// Look up the handler for a tool name
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        self.tools.get(name).cloned()
    }

    /// Contracts to publish, sorted by name
    pub fn contracts(&self) -> Vec<ToolContract> {
        let mut contracts: Vec<ToolContract> =
            self.tools.values().map(|t| t.contract().clone()).collect();
        contracts.sort_by(|a, b| a.name.cmp(&b.name));
        contracts
    }

    /// Startup check: every published contract has exactly one handler and
    /// every handler is published.
    pub fn verify_contracts(&self, published: &[ToolContract]) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for contract in published {
            if !seen.insert(contract.name.as_str()) {
                return Err(AgentError::Config(format!(
                    "Contract published twice: {}",
                    contract.name
                )));
            }
            if !self.tools.contains_key(&contract.name) {
                return Err(AgentError::Config(format!(
                    "No handler for published tool: {}",
                    contract.name
                )));
            }
        }

        if let Some(unpublished) = self.tools.keys().find(|name| !seen.contains(name.as_str())) {
            return Err(AgentError::Config(format!(
                "Handler registered but not published: {}",
                unpublished
            )));
        }

        Ok(())
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct EchoInput {
        text: String,
        #[serde(default)]
        repeat: Option<u64>,
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        type Input = EchoInput;
        type Output = String;

        fn contract(&self) -> ToolContract {
            ToolContract {
                name: "echo".into(),
                description: "Echo text back".into(),
                parameters: vec![
                    ParameterSchema::required("text", ParamType::String, "Text to echo"),
                    ParameterSchema::optional("repeat", ParamType::Integer, "Repetitions"),
                ],
            }
        }

        async fn call(&self, input: EchoInput) -> std::result::Result<String, ToolError> {
            Ok(input.text.repeat(input.repeat.unwrap_or(1) as usize))
        }
    }

    #[test]
    fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("echo").is_some());
        assert!(registry.resolve("unknown").is_none());
        assert_eq!(registry.names(), ["echo"]);
    }

    #[test]
    fn duplicate_registration_is_a_config_error() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        assert!(matches!(registry.register(EchoTool), Err(AgentError::Config(_))));
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();

        let first = registry.resolve("echo").unwrap();
        let second = registry.resolve("echo").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn input_schema_lists_required_fields() {
        let schema = EchoTool.contract().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["text"]["type"], "string");
        assert_eq!(schema["properties"]["repeat"]["type"], "integer");
        assert_eq!(schema["required"], json!(["text"]));
    }

    #[tokio::test]
    async fn invoke_validates_before_running() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        let handler = registry.resolve("echo").unwrap();

        let ok = handler.invoke(&json!({"text": "ab", "repeat": 2})).await.unwrap();
        assert_eq!(ok, json!("abab"));

        let missing = handler.invoke(&json!({})).await.unwrap_err();
        assert!(matches!(missing, ToolError::InvalidInput(_)));

        let wrong_type = handler.invoke(&json!({"text": 5})).await.unwrap_err();
        assert!(matches!(wrong_type, ToolError::InvalidInput(_)));

        let not_object = handler.invoke(&json!("text")).await.unwrap_err();
        assert!(matches!(not_object, ToolError::InvalidInput(_)));
    }

    #[test]
    fn verify_contracts_detects_drift() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();

        assert!(registry.verify_contracts(&registry.contracts()).is_ok());
        assert!(registry.verify_contracts(&[]).is_err());

        let mut extra = registry.contracts();
        extra.push(ToolContract {
            name: "ghost".into(),
            description: String::new(),
            parameters: Vec::new(),
        });
        assert!(matches!(registry.verify_contracts(&extra), Err(AgentError::Config(_))));
    }
}
