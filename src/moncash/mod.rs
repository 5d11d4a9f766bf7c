use rust_decimal::Decimal;
use serde_json::Value;

pub mod client;
pub mod mock;
pub mod token;

#[derive(Debug, thiserror::Error)]
pub enum MoncashError {
    #[error("moncash transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("moncash api error: http {status}: {body}")]
    Api { status: u16, body: String },
    #[error("moncash response missing {0}")]
    Malformed(&'static str),
}

/// Payment request accepted by the gateway; the customer completes it on the
/// hosted MonCash page behind `redirect_url`.
#[derive(Debug, Clone)]
pub struct PaymentCreated {
    pub token: String,
    pub redirect_url: String,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct PaymentDetails {
    pub transaction_id: String,
    pub reference: String,
    pub message: String,
    pub payer: String,
    pub cost: Option<Decimal>,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct TransferDetails {
    pub transaction_id: String,
    pub message: String,
    pub receiver: String,
    pub raw: Value,
}

#[derive(Debug, Clone)]
pub struct AccountBalance {
    pub balance: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct CustomerStatus {
    pub account: String,
    pub kyc_level: String,
    pub active: bool,
    pub raw: Value,
}

#[async_trait::async_trait]
pub trait MoncashApi: Send + Sync {
    async fn create_payment(
        &self,
        external_order_id: &str,
        amount: Decimal,
    ) -> Result<PaymentCreated, MoncashError>;

    async fn payment_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<PaymentDetails, MoncashError>;

    async fn payment_by_order_id(&self, order_id: &str) -> Result<PaymentDetails, MoncashError>;

    async fn create_transfer(
        &self,
        receiver: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<TransferDetails, MoncashError>;

    async fn transfer_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<TransferDetails, MoncashError>;

    async fn balance(&self) -> Result<AccountBalance, MoncashError>;

    async fn customer_status(&self, account: &str) -> Result<CustomerStatus, MoncashError>;
}

pub fn redirect_url(gateway_base_url: &str, token: &str) -> String {
    format!(
        "{}/Payment/Redirect?token={}",
        gateway_base_url.trim_end_matches('/'),
        token
    )
}

pub fn parse_payment_token(raw: &Value) -> Result<String, MoncashError> {
    raw.get("payment_token")
        .and_then(|t| t.get("token"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or(MoncashError::Malformed("payment_token.token"))
}

pub fn parse_payment_details(raw: &Value) -> Result<PaymentDetails, MoncashError> {
    let payment = raw.get("payment").ok_or(MoncashError::Malformed("payment"))?;

    Ok(PaymentDetails {
        transaction_id: payment
            .get("transaction_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        reference: payment
            .get("reference")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        message: payment
            .get("message")
            .and_then(Value::as_str)
            .ok_or(MoncashError::Malformed("payment.message"))?
            .to_string(),
        payer: payment
            .get("payer")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        cost: payment
            .get("cost")
            .and_then(|c| match c {
                Value::String(s) => s.parse::<Decimal>().ok(),
                Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
                _ => None,
            }),
        raw: raw.clone(),
    })
}

pub fn parse_transfer_details(raw: &Value) -> Result<TransferDetails, MoncashError> {
    let transfer = raw.get("transfer").ok_or(MoncashError::Malformed("transfer"))?;

    Ok(TransferDetails {
        transaction_id: transfer
            .get("transaction_id")
            .and_then(Value::as_str)
            .ok_or(MoncashError::Malformed("transfer.transaction_id"))?
            .to_string(),
        message: transfer
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        receiver: transfer
            .get("receiver")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        raw: raw.clone(),
    })
}

pub fn parse_balance(raw: &Value) -> Result<AccountBalance, MoncashError> {
    let balance = raw
        .get("balance")
        .and_then(|b| match b {
            Value::String(s) => s.parse::<Decimal>().ok(),
            Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
            _ => None,
        })
        .ok_or(MoncashError::Malformed("balance"))?;

    Ok(AccountBalance {
        balance,
        currency: raw
            .get("currency")
            .and_then(Value::as_str)
            .unwrap_or("HTG")
            .to_string(),
    })
}

pub fn parse_customer_status(raw: &Value) -> Result<CustomerStatus, MoncashError> {
    Ok(CustomerStatus {
        account: raw
            .get("account")
            .and_then(Value::as_str)
            .ok_or(MoncashError::Malformed("account"))?
            .to_string(),
        kyc_level: raw
            .get("kyc_level")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        active: raw.get("active").and_then(Value::as_bool).unwrap_or(false),
        raw: raw.clone(),
    })
}
