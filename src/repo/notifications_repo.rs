use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationsRepo {
    pub pool: PgPool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct NotificationRow {
    pub id: i64,
    pub transaction_id: Option<Uuid>,
    pub raw_data: serde_json::Value,
    pub processed: bool,
    pub processing_error: String,
    pub received_at: chrono::DateTime<chrono::Utc>,
}

impl NotificationsRepo {
    /// Store the payload before anything touches it; reconciliation works
    /// off the stored row.
    pub async fn insert_raw(&self, raw: &serde_json::Value) -> Result<i64> {
        let row = sqlx::query(
            "INSERT INTO payment_notifications (raw_data) VALUES ($1) RETURNING id",
        )
        .bind(raw)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    pub async fn mark_processed(&self, id: i64, transaction_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_notifications
            SET processed = true, transaction_id = $2, processing_error = ''
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_error(
        &self,
        id: i64,
        error: &str,
        transaction_id: Option<Uuid>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_notifications
            SET processing_error = $2, transaction_id = COALESCE($3, transaction_id)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_unprocessed(&self, limit: i64) -> Result<Vec<NotificationRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, transaction_id, raw_data, processed, processing_error, received_at
            FROM payment_notifications
            WHERE processed = false
            ORDER BY received_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| NotificationRow {
                id: row.get("id"),
                transaction_id: row.get("transaction_id"),
                raw_data: row.get("raw_data"),
                processed: row.get("processed"),
                processing_error: row.get("processing_error"),
                received_at: row.get("received_at"),
            })
            .collect())
    }
}
