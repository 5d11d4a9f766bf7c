use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Clone)]
pub struct OrdersRepo {
    pub pool: PgPool,
}

/// Projection of the marketplace order the payment flow reads and mutates.
#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: String,
    pub status: String,
    pub total_amount: Decimal,
    pub currency: String,
}

impl OrdersRepo {
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredOrder>> {
        let row = sqlx::query(
            r#"
            SELECT id, order_number, customer_id, status, total_amount, currency
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| StoredOrder {
            id: row.get("id"),
            order_number: row.get("order_number"),
            customer_id: row.get("customer_id"),
            status: row.get("status"),
            total_amount: row.get("total_amount"),
            currency: row.get("currency"),
        }))
    }

    pub async fn mark_paid(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE orders SET status = 'paid', updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
