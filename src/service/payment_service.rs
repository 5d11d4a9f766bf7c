use crate::domain::lifecycle::{can_retry, default_expiry, refund_allowed, refundable_amount};
use crate::domain::transaction::{
    err, generate_external_order_id, internal, CreatePaymentRequest, CreatePaymentResponse,
    CreatePayoutRequest, CreateRefundRequest, ErrorEnvelope, PaymentStatus, PaymentType,
    StatusCheckRequest, StatusCheckResponse, TransactionView,
};
use crate::moncash::MoncashApi;
use crate::repo::orders_repo::OrdersRepo;
use crate::repo::status_history_repo::{StatusHistoryRepo, StatusHistoryRow};
use crate::repo::transactions_repo::{
    NewTransaction, StatusRollupRow, StoredTransaction, TransactionsRepo,
};
use crate::service::reconciliation::{MatchKey, Reconciler};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

const LIST_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct PaymentService {
    pub pool: sqlx::PgPool,
    pub transactions_repo: TransactionsRepo,
    pub orders_repo: OrdersRepo,
    pub history_repo: StatusHistoryRepo,
    pub reconciler: Reconciler,
    pub moncash: Arc<dyn MoncashApi>,
}

impl PaymentService {
    pub async fn create_payment(
        &self,
        req: CreatePaymentRequest,
        user_id: &str,
        user_agent: String,
        ip_address: Option<String>,
    ) -> Result<CreatePaymentResponse, (StatusCode, ErrorEnvelope)> {
        let order = self
            .orders_repo
            .find_by_id(req.order_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| (StatusCode::NOT_FOUND, err("ORDER_NOT_FOUND", "order not found")))?;

        if order.customer_id != user_id {
            return Err((
                StatusCode::FORBIDDEN,
                err("NOT_ORDER_OWNER", "order belongs to another customer"),
            ));
        }
        if order.status == "paid" {
            return Err((
                StatusCode::CONFLICT,
                err("ORDER_ALREADY_PAID", "order is already paid"),
            ));
        }

        let now = chrono::Utc::now();
        if self
            .transactions_repo
            .has_unsettled_for_order(order.id, now)
            .await
            .map_err(internal)?
        {
            return Err((
                StatusCode::CONFLICT,
                err(
                    "PAYMENT_IN_PROGRESS",
                    "order already has an unsettled payment attempt",
                ),
            ));
        }

        let id = Uuid::new_v4();
        let external_order_id = generate_external_order_id();
        let data = NewTransaction {
            id,
            order_id: Some(order.id),
            user_id: user_id.to_string(),
            payment_type: PaymentType::Payment,
            external_order_id: external_order_id.clone(),
            amount: order.total_amount,
            currency: order.currency.clone(),
            original_reference: String::new(),
            payer_account: String::new(),
            payment_expires_at: Some(default_expiry(now)),
            return_url: req.return_url.unwrap_or_default(),
            user_agent,
            ip_address,
            notes: String::new(),
        };
        self.transactions_repo.insert(&data).await.map_err(internal)?;

        match self
            .moncash
            .create_payment(&external_order_id, order.total_amount)
            .await
        {
            Ok(created) => {
                self.transactions_repo
                    .mark_pending_with_token(id, &created.token, &created.redirect_url, created.raw)
                    .await
                    .map_err(internal)?;
                self.history_repo
                    .record(
                        id,
                        PaymentStatus::Initiated,
                        PaymentStatus::Pending,
                        "payment token received",
                        user_id,
                    )
                    .await
                    .map_err(internal)?;

                let txn = self.load(id).await?;
                tracing::info!(transaction_id = %id, %external_order_id, "payment initiated");
                Ok(CreatePaymentResponse {
                    payment_url: created.redirect_url,
                    transaction: to_view(&txn, chrono::Utc::now()),
                })
            }
            Err(e) => {
                self.transactions_repo
                    .mark_failed(id, &e.to_string(), None)
                    .await
                    .map_err(internal)?;
                self.history_repo
                    .record(
                        id,
                        PaymentStatus::Initiated,
                        PaymentStatus::Failed,
                        "gateway error during creation",
                        user_id,
                    )
                    .await
                    .map_err(internal)?;

                tracing::warn!(transaction_id = %id, error = %e, "payment initiation failed");
                Err((
                    StatusCode::BAD_GATEWAY,
                    ErrorEnvelope {
                        error: crate::domain::transaction::ErrorPayload {
                            code: "PAYMENT_INITIATION_FAILED".to_string(),
                            message: "could not create the MonCash payment".to_string(),
                            details: Some(e.to_string()),
                        },
                    },
                ))
            }
        }
    }

    pub async fn retry(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<CreatePaymentResponse, (StatusCode, ErrorEnvelope)> {
        let txn = self.load(id).await?;
        if txn.user_id != user_id {
            return Err((
                StatusCode::FORBIDDEN,
                err("FORBIDDEN", "transaction belongs to another user"),
            ));
        }

        let old_status = txn.status_enum();
        if !can_retry(old_status, txn.retry_count, txn.max_retries) {
            return Err((
                StatusCode::CONFLICT,
                err(
                    "RETRY_NOT_ALLOWED",
                    "transaction is not retryable (status or retry limit)",
                ),
            ));
        }

        let now = chrono::Utc::now();
        let began = self
            .transactions_repo
            .begin_retry(id, default_expiry(now))
            .await
            .map_err(internal)?;
        if !began {
            return Err((
                StatusCode::CONFLICT,
                err("RETRY_NOT_ALLOWED", "transaction is no longer retryable"),
            ));
        }
        self.history_repo
            .record(id, old_status, PaymentStatus::Initiated, "manual retry", user_id)
            .await
            .map_err(internal)?;

        match self
            .moncash
            .create_payment(&txn.external_order_id, txn.amount)
            .await
        {
            Ok(created) => {
                self.transactions_repo
                    .mark_pending_with_token(id, &created.token, &created.redirect_url, created.raw)
                    .await
                    .map_err(internal)?;
                self.history_repo
                    .record(
                        id,
                        PaymentStatus::Initiated,
                        PaymentStatus::Pending,
                        "payment token received",
                        user_id,
                    )
                    .await
                    .map_err(internal)?;

                let txn = self.load(id).await?;
                Ok(CreatePaymentResponse {
                    payment_url: created.redirect_url,
                    transaction: to_view(&txn, chrono::Utc::now()),
                })
            }
            Err(e) => {
                self.transactions_repo
                    .mark_failed(id, &e.to_string(), None)
                    .await
                    .map_err(internal)?;
                self.history_repo
                    .record(
                        id,
                        PaymentStatus::Initiated,
                        PaymentStatus::Failed,
                        "gateway error during retry",
                        user_id,
                    )
                    .await
                    .map_err(internal)?;

                Err((
                    StatusCode::BAD_GATEWAY,
                    err("PAYMENT_INITIATION_FAILED", "could not re-create the MonCash payment"),
                ))
            }
        }
    }

    pub async fn check_status(
        &self,
        req: StatusCheckRequest,
        user_id: &str,
    ) -> Result<StatusCheckResponse, (StatusCode, ErrorEnvelope)> {
        let key = match (&req.transaction_id, &req.external_order_id) {
            (Some(id), _) if !id.is_empty() => MatchKey::TransactionId(id.clone()),
            (_, Some(id)) if !id.is_empty() => MatchKey::OrderId(id.clone()),
            _ => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    err(
                        "MISSING_LOOKUP_KEY",
                        "provide transaction_id or external_order_id",
                    ),
                ))
            }
        };

        let txn = self
            .reconciler
            .find_for_key(&key)
            .await
            .map_err(internal)?
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    err("TRANSACTION_NOT_FOUND", "transaction not found"),
                )
            })?;

        if txn.user_id != user_id {
            return Err((
                StatusCode::FORBIDDEN,
                err("FORBIDDEN", "transaction belongs to another user"),
            ));
        }

        let details = self.reconciler.fetch_details(&key).await.map_err(|e| {
            (
                StatusCode::BAD_GATEWAY,
                err("GATEWAY_ERROR", &format!("status check failed: {e}")),
            )
        })?;

        let updated = self
            .reconciler
            .apply_report(&txn, &details, user_id)
            .await
            .map_err(internal)?;

        Ok(StatusCheckResponse {
            transaction: to_view(&updated, chrono::Utc::now()),
            gateway_message: details.message,
        })
    }

    pub async fn list_transactions(
        &self,
        user_id: &str,
        status: Option<String>,
    ) -> Result<Vec<TransactionView>, (StatusCode, ErrorEnvelope)> {
        if let Some(s) = &status {
            if PaymentStatus::parse(s).is_none() {
                return Err((
                    StatusCode::BAD_REQUEST,
                    err("INVALID_STATUS", "unknown status filter"),
                ));
            }
        }

        let rows = self
            .transactions_repo
            .list_for_user(user_id, status.as_deref(), LIST_LIMIT)
            .await
            .map_err(internal)?;

        let now = chrono::Utc::now();
        Ok(rows.iter().map(|t| to_view(t, now)).collect())
    }

    pub async fn get_transaction(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<TransactionView, (StatusCode, ErrorEnvelope)> {
        let txn = self.load(id).await?;
        if txn.user_id != user_id {
            return Err((
                StatusCode::FORBIDDEN,
                err("FORBIDDEN", "transaction belongs to another user"),
            ));
        }

        Ok(to_view(&txn, chrono::Utc::now()))
    }

    pub async fn transaction_history(
        &self,
        id: Uuid,
        user_id: &str,
    ) -> Result<Vec<StatusHistoryRow>, (StatusCode, ErrorEnvelope)> {
        let txn = self.load(id).await?;
        if txn.user_id != user_id {
            return Err((
                StatusCode::FORBIDDEN,
                err("FORBIDDEN", "transaction belongs to another user"),
            ));
        }

        self.history_repo
            .list_for_transaction(id)
            .await
            .map_err(internal)
    }

    pub async fn create_payout(
        &self,
        req: CreatePayoutRequest,
        operator: &str,
    ) -> Result<TransactionView, (StatusCode, ErrorEnvelope)> {
        if req.amount <= Decimal::ZERO {
            return Err((
                StatusCode::BAD_REQUEST,
                err("INVALID_AMOUNT", "amount must be greater than 0"),
            ));
        }
        if req.receiver.trim().is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                err("INVALID_RECEIVER", "receiver account is required"),
            ));
        }

        let id = Uuid::new_v4();
        let data = NewTransaction {
            id,
            order_id: None,
            user_id: operator.to_string(),
            payment_type: PaymentType::Payout,
            external_order_id: generate_external_order_id(),
            amount: req.amount,
            currency: "HTG".to_string(),
            original_reference: req.reference.unwrap_or_default(),
            payer_account: req.receiver.clone(),
            payment_expires_at: None,
            return_url: String::new(),
            user_agent: String::new(),
            ip_address: None,
            notes: req.description.clone(),
        };
        self.transactions_repo.insert(&data).await.map_err(internal)?;

        self.settle_transfer(id, &req.receiver, req.amount, &req.description, operator)
            .await
    }

    pub async fn payout_status(
        &self,
        id: Uuid,
    ) -> Result<StatusCheckResponse, (StatusCode, ErrorEnvelope)> {
        let txn = self.load(id).await?;
        if txn.type_enum() != PaymentType::Payout {
            return Err((
                StatusCode::NOT_FOUND,
                err("TRANSACTION_NOT_FOUND", "no payout with this id"),
            ));
        }

        let gateway_message = if txn.gateway_transaction_id.is_empty() {
            txn.response_message.clone()
        } else {
            self.moncash
                .transfer_by_transaction_id(&txn.gateway_transaction_id)
                .await
                .map(|t| t.message)
                .map_err(|e| {
                    (
                        StatusCode::BAD_GATEWAY,
                        err("GATEWAY_ERROR", &format!("payout status check failed: {e}")),
                    )
                })?
        };

        Ok(StatusCheckResponse {
            transaction: to_view(&txn, chrono::Utc::now()),
            gateway_message,
        })
    }

    /// Refunds are new transactions pointed at the original payment's
    /// gateway id, executed as a transfer back to the payer. Cumulative
    /// successful refunds never exceed the original amount.
    pub async fn create_refund(
        &self,
        req: CreateRefundRequest,
        operator: &str,
    ) -> Result<TransactionView, (StatusCode, ErrorEnvelope)> {
        let original = self.load(req.transaction_id).await?;

        if original.type_enum() != PaymentType::Payment
            || !matches!(
                original.status_enum(),
                PaymentStatus::Success | PaymentStatus::Refunded
            )
        {
            return Err((
                StatusCode::CONFLICT,
                err(
                    "TRANSACTION_NOT_ELIGIBLE",
                    "only successful payments can be refunded",
                ),
            ));
        }
        if original.gateway_transaction_id.is_empty() {
            return Err((
                StatusCode::CONFLICT,
                err(
                    "TRANSACTION_NOT_ELIGIBLE",
                    "payment has no gateway transaction reference",
                ),
            ));
        }

        let receiver = if !original.payer_account.is_empty() {
            original.payer_account.clone()
        } else {
            original.payer_phone.clone()
        };
        if receiver.is_empty() {
            return Err((
                StatusCode::CONFLICT,
                err("TRANSACTION_NOT_ELIGIBLE", "payment has no payer account on record"),
            ));
        }

        let already = self
            .transactions_repo
            .sum_successful_refunds(&original.gateway_transaction_id)
            .await
            .map_err(internal)?;
        let requested = req
            .amount
            .unwrap_or_else(|| refundable_amount(original.amount, already));

        if !refund_allowed(original.amount, already, requested) {
            return Err((
                StatusCode::CONFLICT,
                err(
                    "REFUND_EXCEEDS_ORIGINAL",
                    "refund would exceed the original payment amount",
                ),
            ));
        }

        let reason = req.reason.unwrap_or_else(|| "refund".to_string());
        let id = Uuid::new_v4();
        let data = NewTransaction {
            id,
            order_id: None,
            user_id: operator.to_string(),
            payment_type: PaymentType::Refund,
            external_order_id: generate_external_order_id(),
            amount: requested,
            currency: original.currency.clone(),
            original_reference: original.gateway_transaction_id.clone(),
            payer_account: receiver.clone(),
            payment_expires_at: None,
            return_url: String::new(),
            user_agent: String::new(),
            ip_address: None,
            notes: reason.clone(),
        };
        self.transactions_repo.insert(&data).await.map_err(internal)?;

        let view = self
            .settle_transfer(id, &receiver, requested, &reason, operator)
            .await?;

        if already + requested >= original.amount {
            let moved = self
                .transactions_repo
                .mark_refunded(original.id)
                .await
                .map_err(internal)?;
            if moved {
                self.history_repo
                    .record(
                        original.id,
                        PaymentStatus::Success,
                        PaymentStatus::Refunded,
                        "fully refunded",
                        operator,
                    )
                    .await
                    .map_err(internal)?;
            }
        }

        Ok(view)
    }

    pub async fn analytics(&self) -> Result<Vec<StatusRollupRow>, (StatusCode, ErrorEnvelope)> {
        self.transactions_repo.status_rollup().await.map_err(internal)
    }

    async fn settle_transfer(
        &self,
        id: Uuid,
        receiver: &str,
        amount: Decimal,
        description: &str,
        operator: &str,
    ) -> Result<TransactionView, (StatusCode, ErrorEnvelope)> {
        match self.moncash.create_transfer(receiver, amount, description).await {
            Ok(transfer) => {
                self.transactions_repo
                    .apply_gateway_report(
                        id,
                        PaymentStatus::Success,
                        &transfer.transaction_id,
                        "",
                        "",
                        &transfer.message,
                        transfer.raw,
                        Some(chrono::Utc::now()),
                    )
                    .await
                    .map_err(internal)?;
                self.history_repo
                    .record(
                        id,
                        PaymentStatus::Initiated,
                        PaymentStatus::Success,
                        "transfer completed",
                        operator,
                    )
                    .await
                    .map_err(internal)?;

                let txn = self.load(id).await?;
                tracing::info!(transaction_id = %id, receiver, "transfer completed");
                Ok(to_view(&txn, chrono::Utc::now()))
            }
            Err(e) => {
                self.transactions_repo
                    .mark_failed(id, &e.to_string(), None)
                    .await
                    .map_err(internal)?;
                self.history_repo
                    .record(
                        id,
                        PaymentStatus::Initiated,
                        PaymentStatus::Failed,
                        "gateway error during transfer",
                        operator,
                    )
                    .await
                    .map_err(internal)?;

                tracing::warn!(transaction_id = %id, error = %e, "transfer failed");
                Err((
                    StatusCode::BAD_GATEWAY,
                    err("TRANSFER_FAILED", "could not execute the MonCash transfer"),
                ))
            }
        }
    }

    async fn load(&self, id: Uuid) -> Result<StoredTransaction, (StatusCode, ErrorEnvelope)> {
        self.transactions_repo
            .find_by_id(id)
            .await
            .map_err(internal)?
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    err("TRANSACTION_NOT_FOUND", "transaction not found"),
                )
            })
    }
}

pub fn to_view(txn: &StoredTransaction, now: chrono::DateTime<chrono::Utc>) -> TransactionView {
    TransactionView {
        id: txn.id,
        order_id: txn.order_id,
        payment_type: txn.type_enum(),
        external_order_id: txn.external_order_id.clone(),
        amount: txn.amount,
        currency: txn.currency.clone(),
        status: txn.status_enum(),
        gateway_transaction_id: txn.gateway_transaction_id.clone(),
        gateway_reference: txn.gateway_reference.clone(),
        payer_phone: txn.payer_phone.clone(),
        payment_initiated_at: txn.payment_initiated_at,
        payment_completed_at: txn.payment_completed_at,
        payment_expires_at: txn.payment_expires_at,
        retry_count: txn.retry_count,
        max_retries: txn.max_retries,
        response_message: txn.response_message.clone(),
        response_code: txn.response_code.clone(),
        gateway_url: (!txn.redirect_url.is_empty()).then(|| txn.redirect_url.clone()),
        is_expired: txn.payment_expires_at.is_some_and(|t| now > t),
    }
}
