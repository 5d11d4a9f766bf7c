use crate::domain::lifecycle::transition_for_report;
use crate::domain::transaction::{err, ErrorEnvelope, PaymentStatus, PaymentType};
use crate::moncash::{MoncashApi, MoncashError, PaymentDetails};
use crate::repo::notifications_repo::NotificationsRepo;
use crate::repo::orders_repo::OrdersRepo;
use crate::repo::status_history_repo::StatusHistoryRepo;
use crate::repo::transactions_repo::{StoredTransaction, TransactionsRepo};
use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Webhook bodies carry `transactionId` and/or `orderId`; the transaction id
/// wins when both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKey {
    TransactionId(String),
    OrderId(String),
}

pub fn extract_match_key(payload: &Value) -> Option<MatchKey> {
    if let Some(id) = payload
        .get("transactionId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return Some(MatchKey::TransactionId(id.to_string()));
    }

    payload
        .get("orderId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(|s| MatchKey::OrderId(s.to_string()))
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct WebhookOutcome {
    pub transaction_id: Uuid,
    pub status: PaymentStatus,
}

/// Applies gateway-reported statuses to local transactions: used by the
/// status-check endpoint and by webhook processing. The gateway is always
/// re-queried; webhook bodies are never trusted for the status itself.
#[derive(Clone)]
pub struct Reconciler {
    pub transactions_repo: TransactionsRepo,
    pub history_repo: StatusHistoryRepo,
    pub notifications_repo: NotificationsRepo,
    pub orders_repo: OrdersRepo,
    pub moncash: Arc<dyn MoncashApi>,
}

impl Reconciler {
    pub async fn find_for_key(&self, key: &MatchKey) -> anyhow::Result<Option<StoredTransaction>> {
        match key {
            MatchKey::TransactionId(id) => {
                self.transactions_repo.find_by_gateway_transaction_id(id).await
            }
            MatchKey::OrderId(id) => self.transactions_repo.find_by_external_order_id(id).await,
        }
    }

    pub async fn fetch_details(&self, key: &MatchKey) -> Result<PaymentDetails, MoncashError> {
        match key {
            MatchKey::TransactionId(id) => self.moncash.payment_by_transaction_id(id).await,
            MatchKey::OrderId(id) => self.moncash.payment_by_order_id(id).await,
        }
    }

    /// Writes the authoritative gateway report onto the transaction. The
    /// identifier fields refresh even when no status transition applies;
    /// settled statuses are never moved. Success on a payment flips the
    /// linked order to paid.
    pub async fn apply_report(
        &self,
        txn: &StoredTransaction,
        details: &PaymentDetails,
        changed_by: &str,
    ) -> anyhow::Result<StoredTransaction> {
        let current = txn.status_enum();
        let next = transition_for_report(current, &details.message);
        let target = next.unwrap_or(current);
        let completed_at = (next == Some(PaymentStatus::Success)).then(chrono::Utc::now);

        self.transactions_repo
            .apply_gateway_report(
                txn.id,
                target,
                &details.transaction_id,
                &details.reference,
                &details.payer,
                &details.message,
                details.raw.clone(),
                completed_at,
            )
            .await?;

        if let Some(next) = next {
            self.history_repo
                .record(txn.id, current, next, "gateway status report", changed_by)
                .await?;

            if next == PaymentStatus::Success && txn.type_enum() == PaymentType::Payment {
                if let Some(order_id) = txn.order_id {
                    self.orders_repo.mark_paid(order_id).await?;
                    tracing::info!(%order_id, transaction_id = %txn.id, "order marked paid");
                }
            }
        }

        Ok(self
            .transactions_repo
            .find_by_id(txn.id)
            .await?
            .unwrap_or_else(|| txn.clone()))
    }

    /// Full webhook path: persist raw payload, match, re-fetch authoritative
    /// status, transition. Unmatched notifications stay unprocessed for
    /// manual inspection.
    pub async fn process_webhook(
        &self,
        payload: Value,
    ) -> Result<WebhookOutcome, (StatusCode, ErrorEnvelope)> {
        let note_id = self
            .notifications_repo
            .insert_raw(&payload)
            .await
            .map_err(crate::domain::transaction::internal)?;

        let Some(key) = extract_match_key(&payload) else {
            let _ = self
                .notifications_repo
                .mark_error(note_id, "missing transactionId and orderId", None)
                .await;
            return Err((
                StatusCode::BAD_REQUEST,
                err("INVALID_NOTIFICATION", "notification carries neither transactionId nor orderId"),
            ));
        };

        let matched = self
            .find_for_key(&key)
            .await
            .map_err(crate::domain::transaction::internal)?;

        let Some(txn) = matched else {
            let _ = self
                .notifications_repo
                .mark_error(note_id, "no matching transaction", None)
                .await;
            return Err((
                StatusCode::NOT_FOUND,
                err("TRANSACTION_NOT_FOUND", "no transaction matches the notification"),
            ));
        };

        match self.fetch_details(&key).await {
            Ok(details) => {
                let updated = self
                    .apply_report(&txn, &details, "webhook")
                    .await
                    .map_err(crate::domain::transaction::internal)?;
                self.notifications_repo
                    .mark_processed(note_id, txn.id)
                    .await
                    .map_err(crate::domain::transaction::internal)?;

                Ok(WebhookOutcome {
                    transaction_id: txn.id,
                    status: updated.status_enum(),
                })
            }
            Err(e) => {
                let _ = self
                    .notifications_repo
                    .mark_error(note_id, &e.to_string(), Some(txn.id))
                    .await;
                tracing::warn!(transaction_id = %txn.id, error = %e, "status re-fetch failed during webhook");
                Err((
                    StatusCode::BAD_GATEWAY,
                    err("GATEWAY_ERROR", "could not verify payment status with MonCash"),
                ))
            }
        }
    }
}
