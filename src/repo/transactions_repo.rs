use crate::domain::transaction::{PaymentStatus, PaymentType};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct TransactionsRepo {
    pub pool: PgPool,
}

#[derive(Debug, Clone)]
pub struct StoredTransaction {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub user_id: String,
    pub payment_type: String,
    pub external_order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub gateway_transaction_id: String,
    pub gateway_reference: String,
    pub payment_token: String,
    pub original_reference: String,
    pub payer_phone: String,
    pub payer_account: String,
    pub payment_initiated_at: DateTime<Utc>,
    pub payment_completed_at: Option<DateTime<Utc>>,
    pub payment_expires_at: Option<DateTime<Utc>>,
    pub response_message: String,
    pub response_code: String,
    pub redirect_url: String,
    pub retry_count: i32,
    pub max_retries: i32,
    pub error_details: String,
    pub created_at: DateTime<Utc>,
}

impl StoredTransaction {
    pub fn status_enum(&self) -> PaymentStatus {
        PaymentStatus::parse(&self.status).unwrap_or(PaymentStatus::Failed)
    }

    pub fn type_enum(&self) -> PaymentType {
        PaymentType::parse(&self.payment_type).unwrap_or(PaymentType::Payment)
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub user_id: String,
    pub payment_type: PaymentType,
    pub external_order_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub original_reference: String,
    pub payer_account: String,
    pub payment_expires_at: Option<DateTime<Utc>>,
    pub return_url: String,
    pub user_agent: String,
    pub ip_address: Option<String>,
    pub notes: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusRollupRow {
    pub payment_type: String,
    pub status: String,
    pub count: i64,
    pub total_amount: Decimal,
}

const COLUMNS: &str = r#"
    id, order_id, user_id, payment_type, external_order_id, amount, currency, status,
    gateway_transaction_id, gateway_reference, payment_token, original_reference,
    payer_phone, payer_account, payment_initiated_at, payment_completed_at,
    payment_expires_at, response_message, response_code, redirect_url,
    retry_count, max_retries, error_details, created_at
"#;

fn map_row(row: PgRow) -> StoredTransaction {
    StoredTransaction {
        id: row.get("id"),
        order_id: row.get("order_id"),
        user_id: row.get("user_id"),
        payment_type: row.get("payment_type"),
        external_order_id: row.get("external_order_id"),
        amount: row.get("amount"),
        currency: row.get("currency"),
        status: row.get("status"),
        gateway_transaction_id: row.get("gateway_transaction_id"),
        gateway_reference: row.get("gateway_reference"),
        payment_token: row.get("payment_token"),
        original_reference: row.get("original_reference"),
        payer_phone: row.get("payer_phone"),
        payer_account: row.get("payer_account"),
        payment_initiated_at: row.get("payment_initiated_at"),
        payment_completed_at: row.get("payment_completed_at"),
        payment_expires_at: row.get("payment_expires_at"),
        response_message: row.get("response_message"),
        response_code: row.get("response_code"),
        redirect_url: row.get("redirect_url"),
        retry_count: row.get("retry_count"),
        max_retries: row.get("max_retries"),
        error_details: row.get("error_details"),
        created_at: row.get("created_at"),
    }
}

impl TransactionsRepo {
    pub async fn insert(&self, data: &NewTransaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                id, order_id, user_id, payment_type, external_order_id, amount, currency,
                status, original_reference, payer_account, payment_expires_at, return_url,
                user_agent, ip_address, notes
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7,
                'initiated', $8, $9, $10, $11,
                $12, $13, $14
            )
            "#,
        )
        .bind(data.id)
        .bind(data.order_id)
        .bind(&data.user_id)
        .bind(data.payment_type.as_str())
        .bind(&data.external_order_id)
        .bind(data.amount)
        .bind(&data.currency)
        .bind(&data.original_reference)
        .bind(&data.payer_account)
        .bind(data.payment_expires_at)
        .bind(&data.return_url)
        .bind(&data.user_agent)
        .bind(&data.ip_address)
        .bind(&data.notes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredTransaction>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM payment_transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row))
    }

    pub async fn find_by_gateway_transaction_id(
        &self,
        gateway_transaction_id: &str,
    ) -> Result<Option<StoredTransaction>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS} FROM payment_transactions
            WHERE gateway_transaction_id = $1 AND gateway_transaction_id <> ''
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(gateway_transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row))
    }

    pub async fn find_by_external_order_id(
        &self,
        external_order_id: &str,
    ) -> Result<Option<StoredTransaction>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM payment_transactions WHERE external_order_id = $1"
        ))
        .bind(external_order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row))
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        status: Option<&str>,
        limit: i64,
    ) -> Result<Vec<StoredTransaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS} FROM payment_transactions
            WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(user_id)
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_row).collect())
    }

    /// An order may carry at most one live payment attempt at a time.
    pub async fn has_unsettled_for_order(&self, order_id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS one FROM payment_transactions
            WHERE order_id = $1
              AND status IN ('initiated', 'pending', 'processing')
              AND (payment_expires_at IS NULL OR payment_expires_at > $2)
            LIMIT 1
            "#,
        )
        .bind(order_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    pub async fn mark_pending_with_token(
        &self,
        id: Uuid,
        token: &str,
        redirect_url: &str,
        raw: serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_transactions
            SET status = 'pending', payment_token = $2, redirect_url = $3,
                api_response_data = $4, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(redirect_url)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_failed(
        &self,
        id: Uuid,
        error_details: &str,
        raw: Option<serde_json::Value>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_transactions
            SET status = 'failed', error_details = $2,
                api_response_data = COALESCE($3, api_response_data), updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_details)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes a gateway status report onto the row. Identifier fields are the
    /// gateway's authoritative values; `completed_at` is stamped only on the
    /// first settlement.
    pub async fn apply_gateway_report(
        &self,
        id: Uuid,
        status: PaymentStatus,
        gateway_transaction_id: &str,
        gateway_reference: &str,
        payer_phone: &str,
        response_message: &str,
        raw: serde_json::Value,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment_transactions
            SET status = $2,
                gateway_transaction_id = CASE WHEN $3 <> '' THEN $3 ELSE gateway_transaction_id END,
                gateway_reference = CASE WHEN $4 <> '' THEN $4 ELSE gateway_reference END,
                payer_phone = CASE WHEN $5 <> '' THEN $5 ELSE payer_phone END,
                response_message = $6,
                api_response_data = $7,
                payment_completed_at = COALESCE(payment_completed_at, $8),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(gateway_transaction_id)
        .bind(gateway_reference)
        .bind(payer_phone)
        .bind(response_message)
        .bind(raw)
        .bind(completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_expiry_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<StoredTransaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS} FROM payment_transactions
            WHERE status IN ('initiated', 'pending', 'processing')
              AND payment_expires_at IS NOT NULL
              AND payment_expires_at < $1
            ORDER BY payment_expires_at ASC
            LIMIT $2
            "#
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_row).collect())
    }

    /// Guarded so a settlement that lands between the sweep's read and this
    /// write is never overwritten.
    pub async fn mark_expired(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions
            SET status = 'expired', updated_at = now()
            WHERE id = $1 AND status IN ('initiated', 'pending', 'processing')
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns false when the retry invariant no longer holds.
    pub async fn begin_retry(&self, id: Uuid, new_expiry: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions
            SET status = 'initiated', retry_count = retry_count + 1,
                payment_expires_at = $2, error_details = '', updated_at = now()
            WHERE id = $1
              AND status IN ('failed', 'expired')
              AND retry_count < max_retries
            "#,
        )
        .bind(id)
        .bind(new_expiry)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn sum_successful_refunds(&self, original_reference: &str) -> Result<Decimal> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount), 0) AS total
            FROM payment_transactions
            WHERE payment_type = 'refund' AND status = 'success' AND original_reference = $1
            "#,
        )
        .bind(original_reference)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("total"))
    }

    pub async fn mark_refunded(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment_transactions
            SET status = 'refunded', updated_at = now()
            WHERE id = $1 AND status = 'success'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn status_rollup(&self) -> Result<Vec<StatusRollupRow>> {
        let rows = sqlx::query(
            r#"
            SELECT payment_type, status, COUNT(*) AS count, COALESCE(SUM(amount), 0) AS total_amount
            FROM payment_transactions
            GROUP BY payment_type, status
            ORDER BY payment_type, status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StatusRollupRow {
                payment_type: row.get("payment_type"),
                status: row.get("status"),
                count: row.get("count"),
                total_amount: row.get("total_amount"),
            })
            .collect())
    }
}
