use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo_types::{EntryRow, Source};
use crate::{dayclock::DayKey, estimator::ParsedFood};

/// Entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    #[serde(rename = "dayKey")]
    pub day_key: DayKey,
    #[serde(rename = "consumedAt", with = "time::serde::rfc3339")]
    pub consumed_at: OffsetDateTime,
    pub item: String,
    pub qty: f64,
    pub unit: String,
    pub calories_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Vec<String>>,
}

impl From<EntryRow> for Entry {
    fn from(r: EntryRow) -> Self {
        Self {
            id: r.id,
            day_key: r.day_key,
            consumed_at: r.consumed_at,
            item: r.item,
            qty: r.qty,
            unit: r.unit,
            calories_kcal: r.calories_kcal,
            protein_g: r.protein_g,
            carbs_g: r.carbs_g,
            fat_g: r.fat_g,
            source: r.source,
            assumptions: r.meta.and_then(|m| m.assumptions),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BulkUpsertRequest {
    pub day_key: DayKey,
    pub items: Vec<ParsedFood>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub consumed_at: Option<OffsetDateTime>,
    /// Defaults to `ai`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "dayKey")]
    pub day_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub const OK: OkResponse = OkResponse { ok: true };
}
