use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use std::marker::PhantomData;
use ticketpro_core::{CoreError, CoreResult, Entity, Repository};
use uuid::Uuid;

use crate::{db_err, StoreError};

/// Records without their own table, kept as JSONB in `documents` keyed by kind
pub struct PgDocumentRepository<T> {
    pool: PgPool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PgDocumentRepository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

fn decode<T: DeserializeOwned>(body: Value) -> CoreResult<T> {
    serde_json::from_value(body).map_err(|e| StoreError::Corrupt(e.to_string()).into())
}

fn encode<T: Serialize>(item: &T) -> CoreResult<Value> {
    serde_json::to_value(item).map_err(|e| CoreError::InternalError(e.to_string()))
}

#[async_trait]
impl<T> Repository<T> for PgDocumentRepository<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    async fn list(&self) -> CoreResult<Vec<T>> {
        let rows: Vec<(Value,)> = sqlx::query_as("SELECT body FROM documents WHERE kind = $1 ORDER BY seq")
            .bind(T::KIND)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.into_iter().map(|(body,)| decode(body)).collect()
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<T>> {
        let row: Option<(Value,)> = sqlx::query_as("SELECT body FROM documents WHERE kind = $1 AND id = $2")
            .bind(T::KIND)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(|(body,)| decode(body)).transpose()
    }

    async fn insert(&self, item: T) -> CoreResult<T> {
        let result = sqlx::query(
            "INSERT INTO documents (id, kind, body) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING",
        )
        .bind(item.id())
        .bind(T::KIND)
        .bind(encode(&item)?)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict(format!("{} {} already exists", T::KIND, item.id())));
        }
        Ok(item)
    }

    async fn update(&self, item: T) -> CoreResult<T> {
        let result = sqlx::query("UPDATE documents SET body = $3, updated_at = NOW() WHERE id = $1 AND kind = $2")
            .bind(item.id())
            .bind(T::KIND)
            .bind(encode(&item)?)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(T::KIND, item.id()));
        }
        Ok(item)
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1 AND kind = $2")
            .bind(id)
            .bind(T::KIND)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
