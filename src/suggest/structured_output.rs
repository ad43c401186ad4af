use crate::errors::{AppError, AppResult};
use crate::models::{MergeSuggestion, RestructureResponse};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};

pub static RESTRUCTURE_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "merge_suggestions": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "target_folder": { "type": "string" },
                        "source_folders": { "type": "array", "items": { "type": "string" } },
                        "suggested_name": { "type": "string" },
                        "rationale": { "type": "string" }
                    },
                    "required": ["target_folder", "source_folders", "suggested_name", "rationale"],
                    "additionalProperties": false
                }
            },
            "reason": { "type": "string" }
        },
        "required": ["merge_suggestions", "reason"],
        "additionalProperties": false
    })
});

#[derive(Debug, Clone)]
pub struct StructuredOutputValidationResult {
    pub value: Option<Value>,
    pub error: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RestructureWire {
    merge_suggestions: Vec<MergeSuggestionWire>,
    reason: String,
}

#[derive(Debug, Deserialize)]
struct MergeSuggestionWire {
    target_folder: String,
    source_folders: Vec<String>,
    suggested_name: String,
    rationale: String,
}

impl From<MergeSuggestionWire> for MergeSuggestion {
    fn from(wire: MergeSuggestionWire) -> Self {
        Self {
            target_folder: wire.target_folder,
            source_folders: wire.source_folders,
            suggested_name: wire.suggested_name,
            rationale: wire.rationale,
        }
    }
}

pub fn resolve_structured_output(stdout: &str) -> Option<Value> {
    if let Some(value) = parse_json_value(stdout) {
        return Some(value);
    }
    stdout.lines().rev().find_map(parse_json_value)
}

fn parse_json_value(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

pub fn validate_structured_output(value: Option<Value>, schema: &Value) -> StructuredOutputValidationResult {
    let Some(value) = value else {
        return StructuredOutputValidationResult {
            value: None,
            error: Some("Structured output is missing or invalid JSON.".to_string()),
            errors: vec![],
        };
    };

    let compiled = match jsonschema::JSONSchema::compile(schema) {
        Ok(compiled) => compiled,
        Err(error) => {
            return StructuredOutputValidationResult {
                value: Some(value),
                error: Some(format!("Failed to validate structured output schema: {}", error)),
                errors: vec![],
            }
        }
    };

    let errors: Vec<String> = compiled
        .validate(&value)
        .err()
        .map(|errors| {
            errors
                .map(|error| {
                    let path = error.instance_path.to_string();
                    if path.is_empty() {
                        error.to_string()
                    } else {
                        format!("{}: {}", path, error)
                    }
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let error = (!errors.is_empty()).then(|| "Structured output did not match schema.".to_string());
    StructuredOutputValidationResult {
        value: Some(value),
        error,
        errors,
    }
}

pub fn parse_restructure_response(stdout: &str) -> AppResult<RestructureResponse> {
    let validation = validate_structured_output(resolve_structured_output(stdout), &RESTRUCTURE_SCHEMA);
    if let Some(error) = validation.error {
        let detail = if validation.errors.is_empty() {
            error
        } else {
            format!("{} {}", error, validation.errors.join("; "))
        };
        return Err(AppError::Suggestion(detail));
    }
    let value = validation
        .value
        .ok_or_else(|| AppError::Suggestion("Structured output is missing.".to_string()))?;

    let wire: RestructureWire =
        serde_json::from_value(value).map_err(|error| AppError::Suggestion(error.to_string()))?;
    Ok(RestructureResponse {
        merge_suggestions: wire.merge_suggestions.into_iter().map(MergeSuggestion::from).collect(),
        reason: wire.reason,
    })
}
