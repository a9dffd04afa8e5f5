//! Operations advertised by the library extension

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{ExecutionError, ExecutionResult};

/// Semantic tag for an operation result or parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    None,
    String,
    Object,
}

impl ValueType {
    /// Whether a supplied JSON value carries this tag's shape
    pub fn accepts(&self, value: &JsonValue) -> bool {
        match self {
            ValueType::None => value.is_null(),
            ValueType::String => value.is_string(),
            ValueType::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::None => write!(f, "none"),
            ValueType::String => write!(f, "string"),
            ValueType::Object => write!(f, "object"),
        }
    }
}

/// A single named parameter of an operation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub is_required: bool,
    pub help_text: String,
}

impl ParameterDescriptor {
    fn required(name: &str, description: &str, value_type: ValueType, help_text: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value_type,
            is_required: true,
            help_text: help_text.to_string(),
        }
    }
}

/// Metadata describing one operation callers may request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    pub name: String,
    pub description: String,
    pub result_type: ValueType,
    pub is_required: bool,
    pub help_text: String,
    pub parameters: Vec<ParameterDescriptor>,
}

impl OperationDescriptor {
    /// Look up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Check a caller payload against this operation's parameters.
    ///
    /// Required parameters must be present and non-null. Present parameters
    /// must match their declared shape. Unknown keys are passed through.
    pub fn validate(&self, parameters: &JsonValue) -> ExecutionResult<()> {
        let fields = match parameters {
            JsonValue::Object(map) => Some(map),
            JsonValue::Null => None,
            other => {
                return Err(ExecutionError::InvalidParameter {
                    operation: self.name.clone(),
                    parameter: "<root>".to_string(),
                    reason: format!("expected an object, found {}", json_kind(other)),
                })
            }
        };

        for descriptor in &self.parameters {
            match fields.and_then(|f| f.get(&descriptor.name)) {
                None | Some(JsonValue::Null) if descriptor.is_required => {
                    return Err(ExecutionError::MissingParameter {
                        operation: self.name.clone(),
                        parameter: descriptor.name.clone(),
                    });
                }
                None | Some(JsonValue::Null) => {}
                Some(value) if !descriptor.value_type.accepts(value) => {
                    return Err(ExecutionError::InvalidParameter {
                        operation: self.name.clone(),
                        parameter: descriptor.name.clone(),
                        reason: format!(
                            "expected {}, found {}",
                            descriptor.value_type,
                            json_kind(value)
                        ),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Read-only ordered table of operations
#[derive(Debug, Clone)]
pub struct OperationCatalog {
    operations: Vec<OperationDescriptor>,
}

impl OperationCatalog {
    /// The operations offered by the library extension: `list`, `info`, `run`
    pub fn library() -> Self {
        let operations = vec![
            OperationDescriptor {
                name: "list".to_string(),
                description: "Lists available assemblies.".to_string(),
                result_type: ValueType::None,
                is_required: false,
                help_text: "No parameters required.".to_string(),
                parameters: Vec::new(),
            },
            OperationDescriptor {
                name: "info".to_string(),
                description: "Provides detailed information about an assembly.".to_string(),
                result_type: ValueType::String,
                is_required: true,
                help_text: "Provide 'assemblyName'.".to_string(),
                parameters: vec![ParameterDescriptor::required(
                    "assemblyName",
                    "Name of the assembly.",
                    ValueType::String,
                    "Assembly file name.",
                )],
            },
            OperationDescriptor {
                name: "run".to_string(),
                description: "Executes a method in a class.".to_string(),
                result_type: ValueType::Object,
                is_required: true,
                help_text: "Provide 'assembly', 'class', 'method', and 'parameters'.".to_string(),
                parameters: vec![ParameterDescriptor::required(
                    "content",
                    "JSON representation of method execution.",
                    ValueType::Object,
                    "JSON with assembly, class, method, and parameters.",
                )],
            },
        ];

        Self { operations }
    }

    pub fn operations(&self) -> &[OperationDescriptor] {
        &self.operations
    }

    /// Find an operation by its exact name
    pub fn get(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_library_catalog_order() {
        let catalog = OperationCatalog::library();
        let names: Vec<&str> = catalog.operations().iter().map(|op| op.name.as_str()).collect();
        assert_eq!(names, vec!["list", "info", "run"]);
    }

    #[test]
    fn test_catalog_shapes() {
        let catalog = OperationCatalog::library();

        let list = catalog.get("list").unwrap();
        assert!(!list.is_required);
        assert!(list.parameters.is_empty());
        assert_eq!(list.result_type, ValueType::None);

        let info = catalog.get("info").unwrap();
        let assembly = info.parameter("assemblyName").unwrap();
        assert!(assembly.is_required);
        assert_eq!(assembly.value_type, ValueType::String);

        let run = catalog.get("run").unwrap();
        assert_eq!(run.parameter("content").unwrap().value_type, ValueType::Object);
        assert!(catalog.get("RUN").is_none());
    }

    #[test]
    fn test_validate_required_parameters() {
        let catalog = OperationCatalog::library();
        let info = catalog.get("info").unwrap();

        assert!(info.validate(&json!({"assemblyName": "Demo.dll"})).is_ok());
        assert!(matches!(
            info.validate(&json!({})),
            Err(ExecutionError::MissingParameter { ref parameter, .. }) if parameter == "assemblyName"
        ));
        assert!(matches!(
            info.validate(&JsonValue::Null),
            Err(ExecutionError::MissingParameter { .. })
        ));
        assert!(matches!(
            info.validate(&json!({"assemblyName": 12})),
            Err(ExecutionError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_validate_run_content() {
        let catalog = OperationCatalog::library();
        let run = catalog.get("run").unwrap();

        let payload = json!({
            "content": {"assembly": "Demo.dll", "class": "Demo.Greeter", "method": "Hello", "parameters": []}
        });
        assert!(run.validate(&payload).is_ok());
        assert!(run.validate(&json!({"content": "Demo.dll"})).is_err());
        assert!(run.validate(&json!(["content"])).is_err());
    }

    #[test]
    fn test_list_accepts_anything_shaped_as_object() {
        let catalog = OperationCatalog::library();
        let list = catalog.get("list").unwrap();
        assert!(list.validate(&JsonValue::Null).is_ok());
        assert!(list.validate(&json!({"extra": true})).is_ok());
    }

    #[test]
    fn test_descriptor_serializes_camel_case() {
        let catalog = OperationCatalog::library();
        let value = serde_json::to_value(catalog.get("info").unwrap()).unwrap();
        assert_eq!(value["resultType"], "string");
        assert_eq!(value["isRequired"], true);
        assert_eq!(value["parameters"][0]["type"], "string");
        assert_eq!(value["parameters"][0]["helpText"], "Assembly file name.");
    }
}
