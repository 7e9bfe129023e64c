use thiserror::Error;

/// Failures a transition action can surface.
///
/// Nothing here is fatal: the engine absorbs these, leaves the screen
/// where it was and shows the message in the current screen's error
/// slot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("no transaction pending")]
    NoPendingTransaction,
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// Message from the backing API, verbatim. A `success: false`
    /// response and a transport failure both end up here.
    #[error("{0}")]
    Transaction(String),
}

pub type NavResult<T> = Result<T, NavError>;
