//! Result schemas and their strict validator.
//!
//! Each structured result shape implements [`StructuredOutput`], which
//! describes its fields to the model and validates raw model text. Validation
//! accepts exactly one JSON object of the expected shape: surrounding
//! whitespace is tolerated, anything else (prose, code fences, arrays, extra or
//! missing fields, wrong types) is rejected.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// The three structured result kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SchemaKind {
    CodeAnalysis,
    TestGeneration,
    TestExplanation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    String,
    StringList,
}

/// One field of a result schema as described to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub field_type: FieldType,
    pub description: &'static str,
}

impl FieldSchema {
    const fn new(name: &'static str, field_type: FieldType, description: &'static str) -> Self {
        Self {
            name,
            field_type,
            description,
        }
    }

    fn to_json_schema(self) -> Value {
        match self.field_type {
            FieldType::Boolean => json!({ "type": "boolean", "description": self.description }),
            FieldType::String => json!({ "type": "string", "description": self.description }),
            FieldType::StringList => json!({
                "type": "array",
                "items": { "type": "string" },
                "description": self.description,
            }),
        }
    }
}

/// A result shape the model must emit as a single JSON object.
pub trait StructuredOutput: DeserializeOwned + Serialize + Send + Sync + 'static {
    const KIND: SchemaKind;

    /// All fields are required.
    fn fields() -> &'static [FieldSchema];

    /// JSON schema for this shape, embedded in the prompt.
    fn json_schema() -> Value {
        let mut properties = Map::new();
        for field in Self::fields() {
            properties.insert(field.name.to_string(), field.to_json_schema());
        }
        let required: Vec<&str> = Self::fields().iter().map(|f| f.name).collect();
        json!({
            "title": Self::KIND.to_string(),
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Text that fills a prompt's `format_instructions` slot.
    fn format_instructions() -> String {
        format!(
            "Respond with a single JSON object that conforms to the JSON schema below. \
             Output nothing else: no prose before or after it, no markdown, no code fences.\n\n{}",
            Self::json_schema()
        )
    }

    /// Validates raw model text against this shape.
    fn parse(raw: &str) -> Result<Self, String> {
        parse_strict(raw)
    }
}

/// Deserializes `raw` as exactly one JSON object of type `T`.
pub fn parse_strict<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("response is empty".to_string());
    }
    // Struct deserializers also accept JSON arrays; only objects are valid here.
    if !trimmed.starts_with('{') {
        return Err(format!(
            "response is not a single JSON object (starts with {:?})",
            trimmed.chars().next().unwrap_or_default()
        ));
    }
    serde_json::from_str(trimmed).map_err(|err| format!("response does not match schema: {err}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodeAnalysisResult {
    pub is_optimal: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

impl StructuredOutput for CodeAnalysisResult {
    const KIND: SchemaKind = SchemaKind::CodeAnalysis;

    fn fields() -> &'static [FieldSchema] {
        const FIELDS: &[FieldSchema] = &[
            FieldSchema::new(
                "is_optimal",
                FieldType::Boolean,
                "Whether the code is optimal or not",
            ),
            FieldSchema::new(
                "issues",
                FieldType::StringList,
                "List of issues found in the code",
            ),
            FieldSchema::new(
                "suggestions",
                FieldType::StringList,
                "List of suggestions for improvement",
            ),
        ];
        FIELDS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestGenerationResult {
    pub test_code: String,
}

impl StructuredOutput for TestGenerationResult {
    const KIND: SchemaKind = SchemaKind::TestGeneration;

    fn fields() -> &'static [FieldSchema] {
        const FIELDS: &[FieldSchema] = &[FieldSchema::new(
            "test_code",
            FieldType::String,
            "The complete python code for the pytest unit test",
        )];
        FIELDS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestExplanationResult {
    pub explanation: String,
}

impl StructuredOutput for TestExplanationResult {
    const KIND: SchemaKind = SchemaKind::TestExplanation;

    fn fields() -> &'static [FieldSchema] {
        const FIELDS: &[FieldSchema] = &[FieldSchema::new(
            "explanation",
            FieldType::String,
            "The detailed educational explanation of the test",
        )];
        FIELDS
    }
}
