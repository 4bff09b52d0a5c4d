//! Tool descriptors and their JSON-schema projection.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

/// Schema of a single tool parameter.
///
/// A parameter without a default value is required; the `required` array of
/// the published input schema is derived from exactly this rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSchema {
    Integer {
        default: Option<i64>,
        min: Option<i64>,
        max: Option<i64>,
    },
    String {
        default: Option<String>,
    },
    Boolean {
        default: Option<bool>,
    },
}

impl ParamSchema {
    /// Whether callers must supply this parameter.
    pub fn is_required(&self) -> bool {
        match self {
            Self::Integer { default, .. } => default.is_none(),
            Self::String { default } => default.is_none(),
            Self::Boolean { default } => default.is_none(),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            Self::Integer { default, min, max } => {
                let mut obj = Map::new();
                obj.insert("type".to_owned(), json!("integer"));
                if let Some(default) = default {
                    obj.insert("default".to_owned(), json!(default));
                }
                if let Some(min) = min {
                    obj.insert("minimum".to_owned(), json!(min));
                }
                if let Some(max) = max {
                    obj.insert("maximum".to_owned(), json!(max));
                }
                Value::Object(obj)
            }
            Self::String { default } => {
                let mut obj = Map::new();
                obj.insert("type".to_owned(), json!("string"));
                if let Some(default) = default {
                    obj.insert("default".to_owned(), json!(default));
                }
                Value::Object(obj)
            }
            Self::Boolean { default } => {
                let mut obj = Map::new();
                obj.insert("type".to_owned(), json!("boolean"));
                if let Some(default) = default {
                    obj.insert("default".to_owned(), json!(default));
                }
                Value::Object(obj)
            }
        }
    }
}

/// A registered tool: human-readable description plus parameter schemas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolDescriptor {
    pub description: String,
    pub params: BTreeMap<String, ParamSchema>,
}

impl ToolDescriptor {
    fn to_json(&self, name: &str) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for (param, schema) in &self.params {
            properties.insert(param.clone(), schema.to_json());
            if schema.is_required() {
                required.push(json!(param));
            }
        }

        let mut input_schema = Map::new();
        input_schema.insert("type".to_owned(), json!("object"));
        input_schema.insert("properties".to_owned(), Value::Object(properties));
        if !required.is_empty() {
            input_schema.insert("required".to_owned(), Value::Array(required));
        }

        json!({
            "name": name,
            "description": self.description,
            "inputSchema": Value::Object(input_schema),
        })
    }
}

/// Append-only mapping from tool name to descriptor, frozen once the session
/// engine leaves `Idle`.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a tool under `name`.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        params: BTreeMap<String, ParamSchema>,
    ) {
        self.tools.insert(
            name.into(),
            ToolDescriptor {
                description: description.into(),
                params,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The `tools/list` result object.
    pub fn to_json(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|(name, tool)| tool.to_json(name))
            .collect();
        json!({ "tools": tools })
    }
}
