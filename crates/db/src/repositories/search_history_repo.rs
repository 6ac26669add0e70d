//! Repository for the `search_history` table.

use sqlx::PgPool;
use vigil_core::types::DbId;

use crate::models::search::SearchHistoryEntry;

/// Column list for `search_history` SELECT queries.
const COLUMNS: &str = "id, user_id, query_text, parsed_attributes, result_count, searched_at";

/// Provides query operations for the search audit trail.
pub struct SearchHistoryRepo;

impl SearchHistoryRepo {
    /// Append one executed search.
    pub async fn insert(
        pool: &PgPool,
        user_id: Option<DbId>,
        query_text: &str,
        parsed_attributes: &serde_json::Value,
        result_count: i32,
    ) -> Result<SearchHistoryEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO search_history (user_id, query_text, parsed_attributes, result_count) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SearchHistoryEntry>(&query)
            .bind(user_id)
            .bind(query_text)
            .bind(parsed_attributes)
            .bind(result_count)
            .fetch_one(pool)
            .await
    }

    pub async fn list(pool: &PgPool, limit: i64) -> Result<Vec<SearchHistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM search_history \
             ORDER BY searched_at DESC, id DESC \
             LIMIT $1"
        );
        sqlx::query_as::<_, SearchHistoryEntry>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM search_history WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Clear the entire audit trail; returns how many rows were removed.
    pub async fn clear(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM search_history").execute(pool).await?;
        Ok(result.rows_affected())
    }
}
