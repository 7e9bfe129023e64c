//! In-process bank used when no external API is configured.
//!
//! Seeded with three demo accounts so the kiosk works out of the box.
//! All four operations go through one mutex, which is what makes the
//! check-then-commit in [`MockBank::apply_transaction`] atomic: a
//! rejected withdrawal can never leave a partial balance change behind.

use crate::domain::{
    ApiResult, AtmApi, AuthResponse, BalanceResponse, CardType, TransactionKind,
    TransactionRecord, TransactionResponse, User,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct Account {
    pin: &'static str,
    user: User,
}

struct BankState {
    accounts: Vec<Account>,
    transactions: Vec<TransactionRecord>,
    next_transaction: u64,
}

/// A mutable in-memory ledger behind the [`AtmApi`] contract.
pub struct MockBank {
    state: Mutex<BankState>,
}

impl Default for MockBank {
    fn default() -> Self {
        let accounts = vec![
            Account {
                pin: "1234",
                user: User {
                    id: "1".into(),
                    name: "Peter Parker".into(),
                    card_type: CardType::Visa,
                    balance: 1500.0,
                },
            },
            Account {
                pin: "5678",
                user: User {
                    id: "2".into(),
                    name: "Jane Smith".into(),
                    card_type: CardType::Mastercard,
                    balance: 2300.50,
                },
            },
            Account {
                pin: "9999",
                user: User {
                    id: "3".into(),
                    name: "Mike Johnson".into(),
                    card_type: CardType::Maestro,
                    balance: 750.25,
                },
            },
        ];
        Self {
            state: Mutex::new(BankState {
                accounts,
                transactions: Vec::new(),
                next_transaction: 1,
            }),
        }
    }
}

impl MockBank {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BankState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Committed ledger entries, oldest first.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.state().transactions.clone()
    }

    fn apply_transaction(
        &self,
        user_id: &str,
        kind: TransactionKind,
        amount: f64,
    ) -> TransactionResponse {
        let mut state = self.state();
        let Some(account) = state.accounts.iter_mut().find(|a| a.user.id == user_id) else {
            return rejected("User not found");
        };
        if amount <= 0.0 {
            return rejected("Amount must be greater than 0");
        }
        let new_balance = match kind {
            TransactionKind::Withdraw => {
                if amount > account.user.balance {
                    return rejected("Insufficient funds");
                }
                account.user.balance - amount
            }
            TransactionKind::Deposit => account.user.balance + amount,
        };
        account.user.balance = new_balance;

        let id = format!("tx{}", state.next_transaction);
        state.next_transaction += 1;
        let record = TransactionRecord {
            id,
            user_id: user_id.to_string(),
            kind,
            amount,
            timestamp: Utc::now(),
            balance_after: new_balance,
        };
        state.transactions.push(record.clone());

        let verb = match kind {
            TransactionKind::Withdraw => "withdrew",
            TransactionKind::Deposit => "deposited",
        };
        TransactionResponse {
            success: true,
            transaction: Some(record),
            new_balance: Some(new_balance),
            message: format!("Successfully {verb} ${amount}"),
        }
    }
}

fn rejected(message: &str) -> TransactionResponse {
    TransactionResponse {
        success: false,
        transaction: None,
        new_balance: None,
        message: message.to_string(),
    }
}

#[async_trait]
impl AtmApi for MockBank {
    async fn authenticate(&self, pin: &str) -> ApiResult<AuthResponse> {
        if pin.is_empty() {
            return Ok(AuthResponse {
                success: false,
                user: None,
                message: "PIN is required".into(),
            });
        }
        let state = self.state();
        Ok(match state.accounts.iter().find(|a| a.pin == pin) {
            Some(account) => AuthResponse {
                success: true,
                user: Some(account.user.clone()),
                message: "Authentication successful".into(),
            },
            None => AuthResponse {
                success: false,
                user: None,
                message: "Invalid PIN. Please try again.".into(),
            },
        })
    }

    async fn get_balance(&self, user_id: &str) -> ApiResult<BalanceResponse> {
        let state = self.state();
        Ok(match state.accounts.iter().find(|a| a.user.id == user_id) {
            Some(account) => BalanceResponse {
                success: true,
                balance: Some(account.user.balance),
                message: "Balance retrieved successfully".into(),
            },
            None => BalanceResponse {
                success: false,
                balance: None,
                message: "User not found".into(),
            },
        })
    }

    async fn withdraw(&self, user_id: &str, amount: f64) -> ApiResult<TransactionResponse> {
        Ok(self.apply_transaction(user_id, TransactionKind::Withdraw, amount))
    }

    async fn deposit(&self, user_id: &str, amount: f64) -> ApiResult<TransactionResponse> {
        Ok(self.apply_transaction(user_id, TransactionKind::Deposit, amount))
    }
}
