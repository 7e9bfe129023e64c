//! HTTP client for a remote account API, plus the adapter that turns
//! any [`AtmApi`] into the [`TransactionExecutor`] the navigation core
//! consumes.

use crate::domain::{
    ApiError, ApiResult, AtmApi, AuthResponse, BalanceResponse, NavError, NavResult,
    TransactionExecutor, TransactionKind, TransactionReceipt, TransactionResponse,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct AuthRequest<'a> {
    pin: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionRequest<'a> {
    user_id: &'a str,
    amount: f64,
}

/// [`AtmApi`] over HTTP.
///
/// The remote API signals domain failures in the body, not the status
/// line, so responses are decoded regardless of status code and only
/// transport or decode problems become an [`ApiError`].
pub struct HttpAtmApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAtmApi {
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> ApiResult<R>
    where
        B: Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl AtmApi for HttpAtmApi {
    async fn authenticate(&self, pin: &str) -> ApiResult<AuthResponse> {
        self.post("/auth", &AuthRequest { pin }).await
    }

    async fn get_balance(&self, user_id: &str) -> ApiResult<BalanceResponse> {
        let response = self
            .client
            .get(format!("{}/balance/{user_id}", self.base_url))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    async fn withdraw(&self, user_id: &str, amount: f64) -> ApiResult<TransactionResponse> {
        self.post("/withdraw", &TransactionRequest { user_id, amount })
            .await
    }

    async fn deposit(&self, user_id: &str, amount: f64) -> ApiResult<TransactionResponse> {
        self.post("/deposit", &TransactionRequest { user_id, amount })
            .await
    }
}

/// Runs withdrawals and deposits through an [`AtmApi`].
///
/// Atomicity is inherited from the API: a `success: false` body means
/// nothing was committed, so it is safe to surface the message and
/// leave the session where it was.
pub struct ApiTransactionExecutor {
    api: Arc<dyn AtmApi>,
}

impl ApiTransactionExecutor {
    pub fn new(api: Arc<dyn AtmApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl TransactionExecutor for ApiTransactionExecutor {
    async fn execute(
        &self,
        kind: TransactionKind,
        user_id: &str,
        amount: f64,
    ) -> NavResult<TransactionReceipt> {
        let outcome = match kind {
            TransactionKind::Withdraw => self.api.withdraw(user_id, amount).await,
            TransactionKind::Deposit => self.api.deposit(user_id, amount).await,
        };
        let response = outcome.map_err(|e| NavError::Transaction(e.to_string()))?;
        if !response.success {
            return Err(NavError::Transaction(response.message));
        }
        let new_balance = response
            .new_balance
            .or(response.transaction.map(|t| t.balance_after))
            .ok_or_else(|| {
                NavError::Transaction("transaction response missing new balance".into())
            })?;
        Ok(TransactionReceipt { new_balance })
    }
}
