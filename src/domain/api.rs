//! Contract of the backing account API.
//!
//! The kiosk consumes this interface but does not own the transport or
//! the store behind it. All four operations share the success-flag-plus-
//! message shape; a `success: false` payload and a transport failure
//! are treated identically by the caller — a recoverable error, never a
//! fatal one.

use super::models::{TransactionKind, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport-level failure talking to the backing API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// One committed ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub balance_after: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_balance: Option<f64>,
    pub message: String,
}

/// The authentication/balance/transaction API the kiosk talks to.
#[async_trait]
pub trait AtmApi: Send + Sync {
    async fn authenticate(&self, pin: &str) -> ApiResult<AuthResponse>;
    async fn get_balance(&self, user_id: &str) -> ApiResult<BalanceResponse>;
    async fn withdraw(&self, user_id: &str, amount: f64) -> ApiResult<TransactionResponse>;
    async fn deposit(&self, user_id: &str, amount: f64) -> ApiResult<TransactionResponse>;
}
