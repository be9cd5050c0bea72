// ABOUTME: Typed parameter schemas for tools and the argument validation they drive.
// ABOUTME: Renders model-facing JSON Schema and hides parameters sourced from context variables.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

use crate::context::ContextVariables;

/// Validated arguments handed to a tool executor.
pub type ToolArgs = Map<String, Value>;

/// Primitive JSON types a parameter may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

/// Where a parameter's value comes from at invocation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// Supplied by the model in the tool call arguments.
    Model,
    /// Filled from the context variable with the same key; hidden from the model.
    Context,
}

/// One named parameter of a tool.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
    pub required: bool,
    /// When set, the argument must equal exactly this value.
    pub literal: Option<Value>,
    pub source: ParamSource,
}

/// Errors produced when tool call arguments do not satisfy the schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid type for parameter '{name}': expected '{expected}', got '{actual}'")]
    InvalidType {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Invalid value for parameter '{name}': expected {expected}")]
    LiteralMismatch { name: String, expected: Value },

    #[error("Missing context variable for parameter: {0}")]
    MissingContext(String),
}

/// The ordered parameter list of a tool.
#[derive(Debug, Clone, Default)]
pub struct ParameterSchema {
    params: Vec<ParameterSpec>,
}

impl ParameterSchema {
    /// A schema with no parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required model-supplied parameter.
    pub fn required(self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.push(name, param_type, description, true, None, ParamSource::Model)
    }

    /// Add an optional model-supplied parameter.
    pub fn optional(self, name: &str, param_type: ParamType, description: &str) -> Self {
        self.push(name, param_type, description, false, None, ParamSource::Model)
    }

    /// Add a required string parameter that only accepts `value`.
    pub fn literal(self, name: &str, value: &str, description: &str) -> Self {
        self.push(
            name,
            ParamType::String,
            description,
            true,
            Some(Value::String(value.to_string())),
            ParamSource::Model,
        )
    }

    /// Add a parameter filled from the context variable `name`. It never
    /// appears in the schema shown to the model.
    pub fn from_context(self, name: &str, param_type: ParamType, required: bool) -> Self {
        self.push(name, param_type, "", required, None, ParamSource::Context)
    }

    fn push(
        mut self,
        name: &str,
        param_type: ParamType,
        description: &str,
        required: bool,
        literal: Option<Value>,
        source: ParamSource,
    ) -> Self {
        self.params.push(ParameterSpec {
            name: name.to_string(),
            param_type,
            description: description.to_string(),
            required,
            literal,
            source,
        });
        self
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// JSON Schema for the model-supplied parameters only.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in self.params.iter().filter(|p| p.source == ParamSource::Model) {
            let mut property = json!({ "type": param.param_type.as_str() });
            if !param.description.is_empty() {
                property["description"] = Value::String(param.description.clone());
            }
            if let Some(literal) = &param.literal {
                property["enum"] = json!([literal]);
            }
            properties.insert(param.name.clone(), property);
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false
        })
    }

    /// Check `args` against the schema and return only the declared
    /// parameters, with context-sourced ones filled from `context`.
    /// Undeclared keys are dropped.
    pub fn validate(
        &self,
        args: &Value,
        context: &ContextVariables,
    ) -> Result<ToolArgs, ValidationError> {
        let empty = Map::new();
        let supplied = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => return Err(ValidationError::NotAnObject(type_name(other))),
        };

        let mut validated = Map::new();
        for param in &self.params {
            let value = match param.source {
                ParamSource::Model => supplied.get(&param.name),
                ParamSource::Context => context.get(&param.name),
            };

            let Some(value) = value else {
                if param.required {
                    return Err(match param.source {
                        ParamSource::Model => ValidationError::MissingParameter(param.name.clone()),
                        ParamSource::Context => ValidationError::MissingContext(param.name.clone()),
                    });
                }
                continue;
            };

            if !param.param_type.accepts(value) {
                return Err(ValidationError::InvalidType {
                    name: param.name.clone(),
                    expected: param.param_type.as_str(),
                    actual: type_name(value),
                });
            }

            if let Some(literal) = &param.literal
                && literal != value
            {
                return Err(ValidationError::LiteralMismatch {
                    name: param.name.clone(),
                    expected: literal.clone(),
                });
            }

            validated.insert(param.name.clone(), value.clone());
        }

        Ok(validated)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
