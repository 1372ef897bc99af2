//! Postgres-backed document store.
//!
//! Each collection is one table holding the document as JSONB:
//!
//! ```sql
//! CREATE TABLE <collection> (
//!     seq        BIGSERIAL,
//!     id         UUID PRIMARY KEY,
//!     doc        JSONB NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! `seq` records insertion order and is the tie-break for every ordered
//! query. Unique fields get an expression index on `doc->>'<field>'`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::instrument;
use uuid::Uuid;

use super::query::{Filter, FindOptions, SortOrder};
use super::{Document, DocumentStore, StoreError, Stored, new_id, to_json};

/// Postgres-backed store for one document collection.
///
/// Table and index names come from [`Document::COLLECTION`] and
/// [`Document::UNIQUE_FIELDS`], which are compile-time constants. Every
/// runtime value (ids, documents, field keys, search text) is bound.
pub struct PostgresDocumentStore<D: Document> {
    pool: Arc<PgPool>,
    _document: PhantomData<fn() -> D>,
}

impl<D: Document> Clone for PostgresDocumentStore<D> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _document: PhantomData,
        }
    }
}

impl<D: Document> std::fmt::Debug for PostgresDocumentStore<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresDocumentStore")
            .field("collection", &D::COLLECTION)
            .finish_non_exhaustive()
    }
}

impl<D: Document> PostgresDocumentStore<D> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            _document: PhantomData,
        }
    }

    /// Create the collection table and its unique indexes if missing.
    #[instrument(skip(self), fields(collection = D::COLLECTION), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let table = D::COLLECTION;
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                seq        BIGSERIAL,
                id         UUID PRIMARY KEY,
                doc        JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#
        ))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;

        for field in D::UNIQUE_FIELDS {
            sqlx::query(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {table}_{field}_key ON {table} ((doc->>'{field}'))"
            ))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    fn select(&self) -> QueryBuilder<'static, Postgres> {
        QueryBuilder::new(format!("SELECT id, doc FROM {} ", D::COLLECTION))
    }
}

/// Append a `WHERE` clause for `filter` (nothing for [`Filter::All`]).
fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {}
        Filter::Eq(pairs) => {
            let probe: Map<String, Value> = pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect();
            qb.push("WHERE doc @> ");
            qb.push_bind(Json(Value::Object(probe)));
        }
        Filter::Contains { fields, .. } if fields.is_empty() => {
            qb.push("WHERE FALSE");
        }
        Filter::Contains { fields, needle } => {
            let pattern = format!("%{}%", escape_like(needle));
            qb.push("WHERE (");
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push("doc ->> ");
                qb.push_bind(*field);
                qb.push(" ILIKE ");
                qb.push_bind(pattern.clone());
            }
            qb.push(")");
        }
    }
}

/// Escape `LIKE` metacharacters so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn row_to_stored<D: Document>(row: &PgRow) -> Result<Stored<D>, StoreError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| StoreError::Serialization(format!("failed to read id column: {e}")))?;
    let Json(doc): Json<Value> = row
        .try_get("doc")
        .map_err(|e| StoreError::Serialization(format!("failed to read doc column: {e}")))?;
    let document = serde_json::from_value(doc).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(Stored::new(D::Id::from(id), document))
}

#[async_trait::async_trait]
impl<D: Document> DocumentStore<D> for PostgresDocumentStore<D> {
    #[instrument(skip(self), fields(collection = D::COLLECTION), err)]
    async fn find_one(&self, filter: &Filter) -> Result<Option<Stored<D>>, StoreError> {
        let mut qb = self.select();
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY seq ASC LIMIT 1");

        let row = qb
            .build()
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_one", e))?;
        row.as_ref().map(row_to_stored).transpose()
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION), err)]
    async fn find(&self, options: &FindOptions) -> Result<Vec<Stored<D>>, StoreError> {
        let mut qb = self.select();
        push_filter(&mut qb, &options.filter);

        qb.push(" ORDER BY ");
        if let Some(sort) = options.sort {
            // jsonb ordering: numbers numerically, strings by collation.
            qb.push("doc -> ");
            qb.push_bind(sort.field);
            qb.push(match sort.order {
                SortOrder::Asc => " ASC NULLS FIRST, ",
                SortOrder::Desc => " DESC NULLS LAST, ",
            });
        }
        qb.push("seq ASC");

        if let Some(limit) = options.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(options.skip).unwrap_or(i64::MAX));

        let rows = qb
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find", e))?;
        rows.iter().map(row_to_stored).collect()
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION), err)]
    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) AS n FROM {} ", D::COLLECTION));
        push_filter(&mut qb, filter);

        let row = qb
            .build()
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("count", e))?;
        let n: i64 = row.try_get("n").map_err(|e| map_sqlx_error("count", e))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION, id = %id), err)]
    async fn get(&self, id: D::Id) -> Result<Option<Stored<D>>, StoreError> {
        let row = sqlx::query(&format!("SELECT id, doc FROM {} WHERE id = $1", D::COLLECTION))
            .bind(Into::<Uuid>::into(id))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;
        row.as_ref().map(row_to_stored).transpose()
    }

    #[instrument(skip(self, document), fields(collection = D::COLLECTION), err)]
    async fn insert_one(&self, document: D) -> Result<Stored<D>, StoreError> {
        let id = new_id::<D>();
        let json = to_json(&document)?;
        sqlx::query(&format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", D::COLLECTION))
            .bind(Into::<Uuid>::into(id))
            .bind(Json(json))
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_one", e))?;
        Ok(Stored::new(id, document))
    }

    #[instrument(skip(self, documents), fields(collection = D::COLLECTION, count = documents.len()), err)]
    async fn insert_many(&self, documents: Vec<D>) -> Result<Vec<Stored<D>>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("insert_many", e))?;
        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", D::COLLECTION);

        let mut stored = Vec::with_capacity(documents.len());
        for document in documents {
            let id = new_id::<D>();
            let json = to_json(&document)?;
            sqlx::query(&sql)
                .bind(Into::<Uuid>::into(id))
                .bind(Json(json))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("insert_many", e))?;
            stored.push(Stored::new(id, document));
        }

        tx.commit().await.map_err(|e| map_sqlx_error("insert_many", e))?;
        Ok(stored)
    }

    #[instrument(skip(self, document), fields(collection = D::COLLECTION, id = %id), err)]
    async fn update_by_id(&self, id: D::Id, document: D) -> Result<Option<Stored<D>>, StoreError> {
        let json = to_json(&document)?;
        let row = sqlx::query(&format!(
            "UPDATE {} SET doc = $2 WHERE id = $1 RETURNING id, doc",
            D::COLLECTION
        ))
        .bind(Into::<Uuid>::into(id))
        .bind(Json(json))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_by_id", e))?;
        row.as_ref().map(row_to_stored).transpose()
    }

    #[instrument(skip(self), fields(collection = D::COLLECTION, id = %id), err)]
    async fn delete_by_id(&self, id: D::Id) -> Result<Option<Stored<D>>, StoreError> {
        let row = sqlx::query(&format!("DELETE FROM {} WHERE id = $1 RETURNING id, doc", D::COLLECTION))
            .bind(Into::<Uuid>::into(id))
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_by_id", e))?;
        row.as_ref().map(row_to_stored).transpose()
    }
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                let field = db_err
                    .constraint()
                    .and_then(|c| c.strip_suffix("_key"))
                    .and_then(|c| c.split_once('_'))
                    .map(|(_, field)| field.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                StoreError::Duplicate(field)
            } else {
                StoreError::Backend(format!("database error in {operation}: {}", db_err.message()))
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
