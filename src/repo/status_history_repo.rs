use crate::domain::transaction::PaymentStatus;
use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct StatusHistoryRepo {
    pub pool: PgPool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusHistoryRow {
    pub transaction_id: Uuid,
    pub old_status: String,
    pub new_status: String,
    pub reason: String,
    pub changed_by: String,
    pub changed_at: chrono::DateTime<chrono::Utc>,
}

impl StatusHistoryRepo {
    pub async fn record(
        &self,
        transaction_id: Uuid,
        old_status: PaymentStatus,
        new_status: PaymentStatus,
        reason: &str,
        changed_by: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_status_history (transaction_id, old_status, new_status, reason, changed_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(transaction_id)
        .bind(old_status.as_str())
        .bind(new_status.as_str())
        .bind(reason)
        .bind(changed_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_for_transaction(&self, transaction_id: Uuid) -> Result<Vec<StatusHistoryRow>> {
        let rows = sqlx::query(
            r#"
            SELECT transaction_id, old_status, new_status, reason, changed_by, changed_at
            FROM payment_status_history
            WHERE transaction_id = $1
            ORDER BY changed_at ASC
            "#,
        )
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StatusHistoryRow {
                transaction_id: row.get("transaction_id"),
                old_status: row.get("old_status"),
                new_status: row.get("new_status"),
                reason: row.get("reason"),
                changed_by: row.get("changed_by"),
                changed_at: row.get("changed_at"),
            })
            .collect())
    }
}
