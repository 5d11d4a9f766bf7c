use crate::moncash::{
    redirect_url, AccountBalance, CustomerStatus, MoncashApi, MoncashError, PaymentCreated,
    PaymentDetails, TransferDetails,
};
use rust_decimal::Decimal;
use serde_json::json;

/// Test double for the gateway. `behavior` mirrors the sandbox scenarios:
/// ALWAYS_SUCCESS, ALWAYS_FAILED, REPORT_PENDING, API_DOWN.
pub struct MockMoncash {
    pub behavior: String,
}

impl MockMoncash {
    pub fn success() -> Self {
        Self {
            behavior: "ALWAYS_SUCCESS".to_string(),
        }
    }

    fn down(&self) -> Option<MoncashError> {
        if self.behavior == "API_DOWN" {
            Some(MoncashError::Api {
                status: 503,
                body: "mock gateway down".to_string(),
            })
        } else {
            None
        }
    }

    fn report_message(&self) -> &str {
        match self.behavior.as_str() {
            "ALWAYS_FAILED" => "failed",
            "REPORT_PENDING" => "pending",
            _ => "successful",
        }
    }
}

#[async_trait::async_trait]
impl MoncashApi for MockMoncash {
    async fn create_payment(
        &self,
        external_order_id: &str,
        amount: Decimal,
    ) -> Result<PaymentCreated, MoncashError> {
        if let Some(err) = self.down() {
            return Err(err);
        }

        let token = format!("mock-token-{}", uuid::Uuid::new_v4().simple());
        Ok(PaymentCreated {
            redirect_url: redirect_url("https://sandbox.moncash.test", &token),
            raw: json!({
                "payment_token": {"token": token.clone()},
                "orderId": external_order_id,
                "amount": amount.to_string(),
                "status": 200,
            }),
            token,
        })
    }

    async fn payment_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<PaymentDetails, MoncashError> {
        if let Some(err) = self.down() {
            return Err(err);
        }

        Ok(PaymentDetails {
            transaction_id: transaction_id.to_string(),
            reference: format!("ref-{transaction_id}"),
            message: self.report_message().to_string(),
            payer: "50937000001".to_string(),
            cost: None,
            raw: json!({"payment": {"transaction_id": transaction_id, "message": self.report_message()}}),
        })
    }

    async fn payment_by_order_id(&self, order_id: &str) -> Result<PaymentDetails, MoncashError> {
        if let Some(err) = self.down() {
            return Err(err);
        }

        Ok(PaymentDetails {
            transaction_id: format!("mock-txn-{}", uuid::Uuid::new_v4().simple()),
            reference: format!("ref-{order_id}"),
            message: self.report_message().to_string(),
            payer: "50937000001".to_string(),
            cost: None,
            raw: json!({"payment": {"orderId": order_id, "message": self.report_message()}}),
        })
    }

    async fn create_transfer(
        &self,
        receiver: &str,
        amount: Decimal,
        _description: &str,
    ) -> Result<TransferDetails, MoncashError> {
        if let Some(err) = self.down() {
            return Err(err);
        }
        if self.behavior == "ALWAYS_FAILED" {
            return Err(MoncashError::Api {
                status: 400,
                body: "mock transfer declined".to_string(),
            });
        }

        let transaction_id = format!("mock-transfer-{}", uuid::Uuid::new_v4().simple());
        Ok(TransferDetails {
            transaction_id: transaction_id.clone(),
            message: "successful".to_string(),
            receiver: receiver.to_string(),
            raw: json!({
                "transfer": {
                    "transaction_id": transaction_id,
                    "receiver": receiver,
                    "amount": amount.to_string(),
                    "message": "successful",
                }
            }),
        })
    }

    async fn transfer_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<TransferDetails, MoncashError> {
        if let Some(err) = self.down() {
            return Err(err);
        }

        Ok(TransferDetails {
            transaction_id: transaction_id.to_string(),
            message: self.report_message().to_string(),
            receiver: "50937000002".to_string(),
            raw: json!({"transfer": {"transaction_id": transaction_id, "message": self.report_message()}}),
        })
    }

    async fn balance(&self) -> Result<AccountBalance, MoncashError> {
        if let Some(err) = self.down() {
            return Err(err);
        }

        Ok(AccountBalance {
            balance: Decimal::new(1_000_000, 2),
            currency: "HTG".to_string(),
        })
    }

    async fn customer_status(&self, account: &str) -> Result<CustomerStatus, MoncashError> {
        if let Some(err) = self.down() {
            return Err(err);
        }

        Ok(CustomerStatus {
            account: account.to_string(),
            kyc_level: "full".to_string(),
            active: true,
            raw: json!({"account": account, "kyc_level": "full", "active": true}),
        })
    }
}
