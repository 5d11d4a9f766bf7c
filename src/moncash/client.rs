use crate::config::MoncashConfig;
use crate::moncash::token::TokenCache;
use crate::moncash::{
    parse_balance, parse_customer_status, parse_payment_details, parse_payment_token,
    parse_transfer_details, redirect_url, AccountBalance, CustomerStatus, MoncashApi,
    MoncashError, PaymentCreated, PaymentDetails, TransferDetails,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};

pub struct MoncashClient {
    api_host: String,
    gateway_base_url: String,
    timeout_ms: u64,
    client: reqwest::Client,
    tokens: TokenCache,
}

impl MoncashClient {
    pub fn new(cfg: &MoncashConfig) -> Self {
        let client = reqwest::Client::new();
        Self {
            api_host: cfg.api_host.clone(),
            gateway_base_url: cfg.gateway_base_url.clone(),
            timeout_ms: cfg.timeout_ms,
            tokens: TokenCache::new(cfg, client.clone()),
            client,
        }
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, MoncashError> {
        let bearer = self.tokens.bearer().await?;
        let url = format!("https://{}{}", self.api_host, path);
        let resp = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
            .json(&body)
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MoncashError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        Ok(resp.json().await?)
    }

    async fn get_json(&self, path: &str) -> Result<Value, MoncashError> {
        let bearer = self.tokens.bearer().await?;
        let url = format!("https://{}{}", self.api_host, path);
        let resp = self
            .client
            .get(url)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MoncashError::Api {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait::async_trait]
impl MoncashApi for MoncashClient {
    async fn create_payment(
        &self,
        external_order_id: &str,
        amount: Decimal,
    ) -> Result<PaymentCreated, MoncashError> {
        let raw = self
            .post_json(
                "/v1/CreatePayment",
                json!({
                    "amount": amount.to_string(),
                    "orderId": external_order_id,
                }),
            )
            .await?;

        let token = parse_payment_token(&raw)?;
        Ok(PaymentCreated {
            redirect_url: redirect_url(&self.gateway_base_url, &token),
            token,
            raw,
        })
    }

    async fn payment_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<PaymentDetails, MoncashError> {
        let raw = self
            .post_json(
                "/v1/RetrieveTransactionPayment",
                json!({"transactionId": transaction_id}),
            )
            .await?;
        parse_payment_details(&raw)
    }

    async fn payment_by_order_id(&self, order_id: &str) -> Result<PaymentDetails, MoncashError> {
        let raw = self
            .post_json("/v1/RetrieveOrderPayment", json!({"orderId": order_id}))
            .await?;
        parse_payment_details(&raw)
    }

    async fn create_transfer(
        &self,
        receiver: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<TransferDetails, MoncashError> {
        let raw = self
            .post_json(
                "/v1/Transfert",
                json!({
                    "amount": amount.to_string(),
                    "receiver": receiver,
                    "desc": description,
                }),
            )
            .await?;
        parse_transfer_details(&raw)
    }

    async fn transfer_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<TransferDetails, MoncashError> {
        let raw = self
            .post_json(
                "/v1/RetrieveTransfert",
                json!({"transactionId": transaction_id}),
            )
            .await?;
        parse_transfer_details(&raw)
    }

    async fn balance(&self) -> Result<AccountBalance, MoncashError> {
        let raw = self.get_json("/v1/Balance").await?;
        parse_balance(&raw)
    }

    async fn customer_status(&self, account: &str) -> Result<CustomerStatus, MoncashError> {
        let raw = self
            .post_json("/v1/RetrieveCustomerStatus", json!({"account": account}))
            .await?;
        parse_customer_status(&raw)
    }
}
