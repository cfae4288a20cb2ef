use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};

pub const FIELD_OVERVIEW: &str = "overview";

/// The five list-valued fields. Order matters: it is the order demanded in
/// the prompt and the order of the serialized canonical text.
pub const LIST_FIELDS: [&str; 5] = [
    "client_requirements",
    "technical_details",
    "equipment_models",
    "usage_metrics",
    "recommended_actions",
];

/// Structured technical summary extracted from one call transcript.
///
/// All six fields are required. The list fields must come back from the
/// model as actual JSON arrays; a scalar where an array belongs fails
/// schema validation rather than being coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub overview: String,
    pub client_requirements: Vec<String>,
    pub technical_details: Vec<String>,
    pub equipment_models: Vec<String>,
    pub usage_metrics: Vec<String>,
    pub recommended_actions: Vec<String>,
}

impl Summary {
    /// Validates the raw model payload structurally before deserializing,
    /// so schema violations name the offending field.
    pub fn from_value(value: &Value) -> AppResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| AppError::Schema("payload is not a json object".to_owned()))?;

        if !object.contains_key(FIELD_OVERVIEW) {
            return Err(AppError::Schema(format!("missing field {FIELD_OVERVIEW}")));
        }

        for field in LIST_FIELDS {
            match object.get(field) {
                None => return Err(AppError::Schema(format!("missing field {field}"))),
                Some(Value::Array(_)) => {}
                Some(_) => return Err(AppError::Schema(format!("{field} is not a list"))),
            }
        }

        serde_json::from_value(value.clone())
            .map_err(|error| AppError::Schema(format!("field type mismatch: {error}")))
    }

    /// Canonical text stored back into the row: multi-line JSON with
    /// non-ASCII characters preserved, not escaped.
    pub fn to_canonical_text(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
