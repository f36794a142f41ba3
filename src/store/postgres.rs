//! Entries table in a Postgres database reached directly through `sqlx`.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{EntryStore, StoreError, StoreHealth};
use crate::{
    dayclock::DayKey,
    entries::repo_types::{EntryMeta, EntryRow, NewEntry, Source},
    tenant::TenantKey,
};

lazy_static! {
    static ref TABLE_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").unwrap();
}

const COLUMNS: &str = "id, day_key, consumed_at, item, qty, unit, calories_kcal, \
                       protein_g, carbs_g, fat_g, source, meta";

/// Undefined table.
const PG_UNDEFINED_TABLE: &str = "42P01";

#[derive(Debug, FromRow)]
struct EntryRecord {
    id: Uuid,
    day_key: String,
    consumed_at: OffsetDateTime,
    item: String,
    qty: f64,
    unit: String,
    calories_kcal: f64,
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
    source: Option<String>,
    meta: Option<Json<EntryMeta>>,
}

impl EntryRecord {
    fn into_row(self, tenant: &TenantKey) -> Result<EntryRow, StoreError> {
        let day_key = self
            .day_key
            .parse::<DayKey>()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(EntryRow {
            id: self.id.to_string(),
            sync_key: tenant.clone(),
            day_key,
            consumed_at: self.consumed_at,
            item: self.item,
            qty: self.qty,
            unit: self.unit,
            calories_kcal: self.calories_kcal,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            source: Source::from_stored(self.source.as_deref()),
            meta: self.meta.map(|Json(m)| m),
        })
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    table: String,
}

impl PgStore {
    pub fn new(pool: PgPool, table: &str) -> anyhow::Result<Self> {
        if !TABLE_NAME.is_match(table) {
            return Err(anyhow!("invalid ENTRIES_TABLE {table:?}"));
        }
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Lazily connecting pool; the first query opens the connection.
    pub fn connect_lazy(database_url: &str, table: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_lazy(database_url)
            .context("parse DATABASE_URL")?;
        Self::new(pool, table)
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl EntryStore for PgStore {
    async fn insert_many(
        &self,
        tenant: &TenantKey,
        entries: Vec<NewEntry>,
    ) -> Result<Vec<EntryRow>, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {} (id, sync_key, day_key, consumed_at, item, qty, unit,
                            calories_kcal, protein_g, carbs_g, fat_g, source, meta)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {COLUMNS}
            "#,
            self.table
        );

        // all or nothing
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = entry.into_row(tenant);
            let id = Uuid::parse_str(&row.id).map_err(|e| StoreError::Decode(e.to_string()))?;
            let record = sqlx::query_as::<_, EntryRecord>(&sql)
                .bind(id)
                .bind(tenant.expose())
                .bind(row.day_key.to_string())
                .bind(row.consumed_at)
                .bind(&row.item)
                .bind(row.qty)
                .bind(&row.unit)
                .bind(row.calories_kcal)
                .bind(row.protein_g)
                .bind(row.carbs_g)
                .bind(row.fat_g)
                .bind(row.source.as_str())
                .bind(row.meta.clone().map(Json))
                .fetch_one(&mut *tx)
                .await?;
            stored.push(record.into_row(tenant)?);
        }
        tx.commit().await?;
        Ok(stored)
    }

    async fn list_by_day(&self, tenant: &TenantKey, day: DayKey) -> Result<Vec<EntryRow>, StoreError> {
        let sql = format!(
            r#"
            SELECT {COLUMNS}
              FROM {}
             WHERE sync_key = $1 AND day_key = $2
             ORDER BY consumed_at ASC
            "#,
            self.table
        );
        let records = sqlx::query_as::<_, EntryRecord>(&sql)
            .bind(tenant.expose())
            .bind(day.to_string())
            .fetch_all(&self.pool)
            .await?;
        records.into_iter().map(|r| r.into_row(tenant)).collect()
    }

    async fn delete_by_id(&self, tenant: &TenantKey, id: &str) -> Result<(), StoreError> {
        // the id column is uuid; anything else cannot match a row
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(());
        };
        let sql = format!("DELETE FROM {} WHERE id = $1 AND sync_key = $2", self.table);
        sqlx::query(&sql)
            .bind(id)
            .bind(tenant.expose())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_before(&self, tenant: &TenantKey, cutoff: DayKey) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE sync_key = $1 AND day_key < $2", self.table);
        sqlx::query(&sql)
            .bind(tenant.expose())
            .bind(cutoff.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn probe(&self) -> StoreHealth {
        let sql = format!("SELECT id FROM {} LIMIT 1", self.table);
        match sqlx::query_scalar::<_, Uuid>(&sql)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(_) => StoreHealth {
                reachable: true,
                table_exists: true,
                status: 200,
                error: None,
            },
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(PG_UNDEFINED_TABLE) => {
                StoreHealth {
                    reachable: true,
                    table_exists: false,
                    status: 404,
                    error: Some(db.message().to_string()),
                }
            }
            Err(e) => StoreHealth {
                error: Some(e.to_string()),
                ..Default::default()
            },
        }
    }
}
