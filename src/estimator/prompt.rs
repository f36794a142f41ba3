use serde_json::{json, Value};

pub const SYSTEM_PROMPT: &str = "You are a nutrition estimator. Convert casual food diary inputs into precise items with realistic calories and macros.

Rules:
- Output JSON ONLY matching:
  type ParsedFood = {
    item: string; qty: number; unit: string;
    calories_kcal: number; protein_g: number; carbs_g: number; fat_g: number;
    assumptions?: string[];
  };
  type ParseResponse = { items: ParsedFood[] };
- Prefer grams for solids and ml for liquids when quantities are given.
- If the user uses informal units (\"slice\", \"tbsp\"), keep that unit and return a reasonable qty with assumptions.
- If uncertain, choose the most reasonable assumption and note it in assumptions.
- Use typical US grocery items and realistic macro values.";

pub const JSON_ONLY_SUFFIX: &str = "\nReturn JSON ONLY.";

const TEMPERATURE: f64 = 0.2;

/// Strict structured-output schema for `{ items: ParsedFood[] }`.
///
/// Strict mode wants every property listed as required, so `assumptions` is
/// required but nullable; the validator treats null and absent alike.
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "items": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "item": { "type": "string" },
                        "qty": { "type": "number" },
                        "unit": { "type": "string" },
                        "calories_kcal": { "type": "number" },
                        "protein_g": { "type": "number" },
                        "carbs_g": { "type": "number" },
                        "fat_g": { "type": "number" },
                        "assumptions": {
                            "type": ["array", "null"],
                            "items": { "type": "string" }
                        }
                    },
                    "required": [
                        "item", "qty", "unit", "calories_kcal",
                        "protein_g", "carbs_g", "fat_g", "assumptions"
                    ]
                }
            }
        },
        "required": ["items"]
    })
}

fn message(role: &str, text: &str) -> Value {
    json!({ "role": role, "content": [{ "type": "input_text", "text": text }] })
}

/// Responses API body for one parse attempt.
pub fn parse_request(model: &str, text: &str, json_only: bool) -> Value {
    let user = if json_only {
        format!("{text}{JSON_ONLY_SUFFIX}")
    } else {
        text.to_string()
    };
    json!({
        "model": model,
        "input": [message("system", SYSTEM_PROMPT), message("user", &user)],
        "temperature": TEMPERATURE,
        "text": {
            "format": {
                "type": "json_schema",
                "name": "ParseResponse",
                "strict": true,
                "schema": response_schema(),
            }
        }
    })
}

/// Minimal request used by the health probe.
pub fn probe_request(model: &str) -> Value {
    json!({
        "model": model,
        "input": [message("system", "You are a health probe."), message("user", "ping")],
        "temperature": 0,
        "max_output_tokens": 16,
    })
}

fn non_empty(v: &Value) -> Option<&str> {
    v.as_str().filter(|s| !s.is_empty())
}

/// Pulls the text payload out of a Responses API body.
pub fn extract_output_text(body: &Value) -> Option<&str> {
    if let Some(text) = body.get("output_text").and_then(non_empty) {
        return Some(text);
    }
    if let Some(text) = body.pointer("/content/0/text").and_then(non_empty) {
        return Some(text);
    }
    body.get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content")?.as_array())
        .flatten()
        .find_map(|part| part.get("text").and_then(non_empty))
}
