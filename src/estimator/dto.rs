use serde::{Deserialize, Serialize};

/// A not-yet-persisted food item as produced by the estimator.
///
/// Unknown fields are rejected and every field except `assumptions` is
/// required, so a single malformed item fails the whole payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedFood {
    pub item: String,
    pub qty: f64,
    pub unit: String,
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParseResponse {
    pub items: Vec<ParsedFood>,
}

impl ParseResponse {
    /// Validates raw model output against the response shape.
    pub fn from_model_output(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw.trim())
    }
}
