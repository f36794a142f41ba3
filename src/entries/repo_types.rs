use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{dayclock::DayKey, estimator::ParsedFood, tenant::TenantKey};

/// Provenance of a stored entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Ai,
    Manual,
    Label,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Ai => "ai",
            Source::Manual => "manual",
            Source::Label => "label",
        }
    }

    /// Unknown or missing tags read back as `ai`.
    pub fn from_stored(raw: Option<&str>) -> Self {
        match raw {
            Some("manual") => Source::Manual,
            Some("label") => Source::Label,
            _ => Source::Ai,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<Vec<String>>,
}

/// One row of the entries table, in its stored shape.
///
/// `id` is opaque: rows written by older clients carry non-UUID ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRow {
    pub id: String,
    pub sync_key: TenantKey,
    pub day_key: DayKey,
    #[serde(with = "time::serde::rfc3339")]
    pub consumed_at: OffsetDateTime,
    pub item: String,
    #[serde(deserialize_with = "number_or_string")]
    pub qty: f64,
    pub unit: String,
    #[serde(deserialize_with = "number_or_string")]
    pub calories_kcal: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub protein_g: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub carbs_g: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub fat_g: f64,
    #[serde(default, deserialize_with = "source_or_default")]
    pub source: Source,
    #[serde(default)]
    pub meta: Option<EntryMeta>,
}

impl EntryRow {
    pub fn assumptions(&self) -> Option<&[String]> {
        self.meta.as_ref()?.assumptions.as_deref()
    }
}

/// An entry about to be stored; the store assigns `id` and `sync_key`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub day_key: DayKey,
    pub consumed_at: OffsetDateTime,
    pub source: Source,
    pub food: ParsedFood,
}

impl NewEntry {
    pub fn into_row(self, tenant: &TenantKey) -> EntryRow {
        let ParsedFood {
            item,
            qty,
            unit,
            calories_kcal,
            protein_g,
            carbs_g,
            fat_g,
            assumptions,
        } = self.food;
        EntryRow {
            id: Uuid::new_v4().to_string(),
            sync_key: tenant.clone(),
            day_key: self.day_key,
            consumed_at: self.consumed_at,
            item,
            qty,
            unit,
            calories_kcal,
            protein_g,
            carbs_g,
            fat_g,
            source: self.source,
            meta: assumptions.map(|a| EntryMeta {
                assumptions: Some(a),
            }),
        }
    }
}

// numeric columns can come back from PostgREST as strings
fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn source_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Source, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(Source::from_stored(raw.as_deref()))
}
