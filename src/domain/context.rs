//! The per-press capability bundle handed to guards and actions.
//!
//! An [`ActionContext`] is built immediately before a button press is
//! dispatched and discarded once the transition settles. Instead of
//! mutating application state directly, actions queue [`StateCommand`]s
//! through the context's dispatcher; the owner applies the queue in
//! order after the transition resolves. That keeps guards pure, makes
//! the ordering guarantee (state changes before the screen change)
//! explicit, and lets a failed action leave no trace.

use super::errors::{NavError, NavResult};
use super::models::{TransactionKind, User};
use async_trait::async_trait;
use std::sync::Arc;

/// A state mutation requested by a transition action.
///
/// Each variant corresponds to one of the store actions the screens
/// react to; the queue is the kiosk's dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum StateCommand {
    /// Wipe the PIN entry buffer.
    ClearPin,
    /// Drop the session: user, authentication flag, PIN, errors.
    Logout,
    /// Clear transient transaction UI state: amount, kind, error.
    ClearUi,
    /// Replace the pending amount (raw, unparsed).
    SetAmount(Option<String>),
    /// Replace the pending transaction kind.
    SetTransactionKind(Option<TransactionKind>),
    /// Surface or clear the current screen's error slot.
    SetError(Option<String>),
    /// Commit a fresh balance reported by the orchestrator.
    UpdateBalance(f64),
    /// The screen-change notification; always last on success.
    ShowScreen(super::models::ScreenId),
}

/// Receipt returned by a successful financial transaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionReceipt {
    pub new_balance: f64,
}

/// The transaction orchestrator as the navigation core sees it.
///
/// Implementations must be atomic from the caller's point of view:
/// either the balance mutation commits and the new balance comes back,
/// or nothing changes and an error does.
#[async_trait]
pub trait TransactionExecutor: Send + Sync {
    async fn execute(
        &self,
        kind: TransactionKind,
        user_id: &str,
        amount: f64,
    ) -> NavResult<TransactionReceipt>;
}

/// Asynchronous side effects a transition can carry.
///
/// Kept as a closed set so the engine's await-and-abort-on-failure
/// contract is visible in the type rather than inferred at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncEffect {
    /// Run the pending withdraw/deposit through the bound executor.
    RunTransaction,
}

/// Capability bundle for a single button press.
///
/// Ephemeral by design: construct, dispatch, drain, drop.
///
/// # Examples
///
/// ```
/// use tatm::domain::{ActionContext, StateCommand};
///
/// let mut ctx = ActionContext::new().with_amount(Some("100".into()));
/// ctx.dispatch(StateCommand::ClearPin);
/// assert_eq!(ctx.into_commands(), vec![StateCommand::ClearPin]);
/// ```
#[derive(Default)]
pub struct ActionContext {
    /// Raw amount string the user has entered, if any.
    pub current_amount: Option<String>,
    /// Which transaction screen the amount belongs to, if any.
    pub transaction_kind: Option<TransactionKind>,
    /// The authenticated customer, if any.
    pub user: Option<User>,
    executor: Option<Arc<dyn TransactionExecutor>>,
    commands: Vec<StateCommand>,
}

impl ActionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_amount(mut self, amount: Option<String>) -> Self {
        self.current_amount = amount;
        self
    }

    pub fn with_transaction_kind(mut self, kind: Option<TransactionKind>) -> Self {
        self.transaction_kind = kind;
        self
    }

    pub fn with_user(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn TransactionExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Queue a state mutation. Nothing is applied until the owner
    /// drains the queue after the transition settles.
    pub fn dispatch(&mut self, command: StateCommand) {
        self.commands.push(command);
    }

    /// The screen-change callback: queued so it is observed strictly
    /// after every command the action dispatched before it.
    pub fn notify_screen_change(&mut self, to: super::models::ScreenId) {
        self.commands.push(StateCommand::ShowScreen(to));
    }

    /// Commands queued so far, in dispatch order.
    pub fn commands(&self) -> &[StateCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<StateCommand> {
        self.commands
    }

    /// Runs one asynchronous effect to completion.
    ///
    /// On failure nothing has been queued by the effect, so the caller
    /// can abort the transition without unwinding anything.
    pub async fn run_effect(&mut self, effect: AsyncEffect) -> NavResult<()> {
        match effect {
            AsyncEffect::RunTransaction => self.run_transaction().await,
        }
    }

    /// The bound financial transaction (`CONFIRM` on withdraw/deposit).
    ///
    /// Preconditions mirror the guard: an authenticated user, a pending
    /// kind and a positive amount. The executor is atomic, so a failure
    /// here means no balance moved; success queues the new balance and
    /// clears the transient amount/kind state before the screen change.
    async fn run_transaction(&mut self) -> NavResult<()> {
        let user = self.user.as_ref().ok_or(NavError::NotAuthenticated)?;
        let kind = self
            .transaction_kind
            .ok_or(NavError::NoPendingTransaction)?;
        let raw = self
            .current_amount
            .clone()
            .ok_or(NavError::NoPendingTransaction)?;
        let amount: f64 = raw
            .parse()
            .map_err(|_| NavError::InvalidAmount(raw.clone()))?;
        if amount <= 0.0 {
            return Err(NavError::InvalidAmount(raw));
        }
        let executor = self
            .executor
            .as_ref()
            .ok_or(NavError::NoPendingTransaction)?
            .clone();

        let receipt = executor.execute(kind, &user.id, amount).await?;
        self.dispatch(StateCommand::UpdateBalance(receipt.new_balance));
        self.dispatch(StateCommand::ClearUi);
        Ok(())
    }
}
