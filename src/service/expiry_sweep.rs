use crate::domain::transaction::PaymentStatus;
use crate::repo::status_history_repo::StatusHistoryRepo;
use crate::repo::transactions_repo::TransactionsRepo;

const SWEEP_BATCH: i64 = 200;

/// Periodic sweep that moves unsettled transactions past their payment
/// window to `expired`. The UPDATE is guarded on the unsettled statuses, so
/// a settlement racing the sweep wins.
pub struct ExpirySweep {
    pub transactions_repo: TransactionsRepo,
    pub history_repo: StatusHistoryRepo,
    pub interval: std::time::Duration,
}

impl ExpirySweep {
    pub async fn run(self) {
        loop {
            if let Err(e) = self.sweep_once().await {
                tracing::warn!(error = %e, "expiry sweep pass failed");
            }
            tokio::time::sleep(self.interval).await;
        }
    }

    pub async fn sweep_once(&self) -> anyhow::Result<usize> {
        let now = chrono::Utc::now();
        let due = self.transactions_repo.list_expiry_due(now, SWEEP_BATCH).await?;
        let mut expired = 0usize;

        for txn in due {
            if self.transactions_repo.mark_expired(txn.id).await? {
                self.history_repo
                    .record(
                        txn.id,
                        txn.status_enum(),
                        PaymentStatus::Expired,
                        "payment window elapsed",
                        "expiry-sweep",
                    )
                    .await?;
                expired += 1;
            }
        }

        if expired > 0 {
            tracing::info!(expired, "expiry sweep marked transactions");
        }
        Ok(expired)
    }
}
