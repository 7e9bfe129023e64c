//! The navigation state machine: a declarative transition table and
//! the engine that drives it.
//!
//! Every side-button press is interpreted as `(current screen, label)`.
//! The label is reverse-mapped to a stable [`Trigger`] through the
//! localization layer, the table is consulted for a legal transition,
//! its guard is evaluated once, its action (if any) runs to completion,
//! and only then does the screen change fire. A failure anywhere along
//! that path is absorbed: the kiosk never leaves a reachable screen
//! because of a bad press.

use super::context::{ActionContext, AsyncEffect, StateCommand};
use super::models::{ScreenId, Trigger};
use std::collections::HashMap;
use tracing::{info, warn};

/// Synchronous precondition over the action context. Must be
/// side-effect-free; it gates the transition and nothing else.
pub type Guard = fn(&ActionContext) -> bool;

/// Side effect executed when a transition fires.
#[derive(Debug, Clone, Copy)]
pub enum TransitionAction {
    /// Runs inline before the screen change; cannot fail.
    Sync(fn(&mut ActionContext)),
    /// Awaited to completion; a failure aborts the transition.
    Async(AsyncEffect),
}

/// One rule of the state machine: `(from, trigger) -> to`, optionally
/// guarded, optionally side-effecting.
#[derive(Clone, Copy)]
pub struct Transition {
    pub from: ScreenId,
    pub to: ScreenId,
    pub trigger: Trigger,
    pub guard: Option<Guard>,
    pub action: Option<TransitionAction>,
}

impl Transition {
    pub fn new(from: ScreenId, to: ScreenId, trigger: Trigger) -> Self {
        Self {
            from,
            to,
            trigger,
            guard: None,
            action: None,
        }
    }

    pub fn guarded(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn with_action(mut self, action: TransitionAction) -> Self {
        self.action = Some(action);
        self
    }
}

fn has_positive_amount(ctx: &ActionContext) -> bool {
    ctx.current_amount
        .as_deref()
        .and_then(|raw| raw.parse::<f64>().ok())
        .is_some_and(|amount| amount > 0.0)
}

fn clear_pin(ctx: &mut ActionContext) {
    ctx.dispatch(StateCommand::ClearPin);
}

fn end_session(ctx: &mut ActionContext) {
    ctx.dispatch(StateCommand::Logout);
    ctx.dispatch(StateCommand::ClearUi);
}

fn clear_transaction_ui(ctx: &mut ActionContext) {
    ctx.dispatch(StateCommand::ClearUi);
}

/// Resolves button presses against the transition table.
///
/// Construct one per kiosk and inject it into whatever owns the event
/// loop; there is deliberately no global instance.
///
/// Transitions are bucketed by `(from, trigger)` for O(1) average
/// lookup. Within a bucket the declaration order is preserved and the
/// first entry whose guard passes wins; this tie-break is a documented
/// design choice, not an accident of storage.
pub struct NavigationEngine {
    transitions: HashMap<(ScreenId, Trigger), Vec<Transition>>,
}

impl Default for NavigationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationEngine {
    /// Engine preloaded with the kiosk's standard table.
    pub fn new() -> Self {
        let mut engine = Self {
            transitions: HashMap::new(),
        };
        for transition in Self::default_table() {
            engine.add_transition(transition);
        }
        engine
    }

    /// Engine with an empty table, for callers that build their own.
    pub fn empty() -> Self {
        Self {
            transitions: HashMap::new(),
        }
    }

    fn default_table() -> Vec<Transition> {
        use ScreenId::*;
        use Trigger::*;
        vec![
            // Welcome
            Transition::new(Welcome, PinEntry, EnterPin),
            // PIN entry
            Transition::new(PinEntry, Welcome, Cancel),
            Transition::new(PinEntry, PinEntry, Clear)
                .with_action(TransitionAction::Sync(clear_pin)),
            // Main menu
            Transition::new(ScreenId::MainMenu, ScreenId::Balance, Trigger::Balance),
            Transition::new(ScreenId::MainMenu, ScreenId::Withdraw, Trigger::Withdraw),
            Transition::new(ScreenId::MainMenu, ScreenId::Deposit, Trigger::Deposit),
            Transition::new(ScreenId::MainMenu, Welcome, Exit)
                .with_action(TransitionAction::Sync(end_session)),
            Transition::new(ScreenId::MainMenu, PinEntry, ReEnterPin),
            // Balance
            Transition::new(ScreenId::Balance, ScreenId::MainMenu, Trigger::MainMenu),
            // Withdraw
            Transition::new(ScreenId::Withdraw, ScreenId::MainMenu, Trigger::MainMenu)
                .with_action(TransitionAction::Sync(clear_transaction_ui)),
            Transition::new(ScreenId::Withdraw, ScreenId::MainMenu, Cancel)
                .with_action(TransitionAction::Sync(clear_transaction_ui)),
            Transition::new(ScreenId::Withdraw, ScreenId::Balance, Confirm)
                .guarded(has_positive_amount)
                .with_action(TransitionAction::Async(AsyncEffect::RunTransaction)),
            // Deposit
            Transition::new(ScreenId::Deposit, ScreenId::MainMenu, Trigger::MainMenu)
                .with_action(TransitionAction::Sync(clear_transaction_ui)),
            Transition::new(ScreenId::Deposit, ScreenId::MainMenu, Cancel)
                .with_action(TransitionAction::Sync(clear_transaction_ui)),
            Transition::new(ScreenId::Deposit, ScreenId::Balance, Confirm)
                .guarded(has_positive_amount)
                .with_action(TransitionAction::Async(AsyncEffect::RunTransaction)),
        ]
    }

    /// Pure reverse lookup from a rendered label to its trigger.
    ///
    /// Returns `None` for decorative or unmapped labels; no side
    /// effects either way.
    pub fn resolve_trigger(
        &self,
        label: &str,
        lookup: &dyn Fn(&str) -> Option<Trigger>,
    ) -> Option<Trigger> {
        lookup(label)
    }

    /// First transition in declaration order whose `(from, trigger)`
    /// matches and whose guard (if any) passes for `ctx`.
    pub fn find_transition(
        &self,
        from: ScreenId,
        trigger: Trigger,
        ctx: &ActionContext,
    ) -> Option<&Transition> {
        self.transitions
            .get(&(from, trigger))?
            .iter()
            .find(|t| t.guard.is_none_or(|guard| guard(ctx)))
    }

    /// Resolves a button press end to end.
    ///
    /// Orchestration: label → trigger → transition → guard → action →
    /// screen change. An unmapped label, a missing transition or a
    /// false guard is a warned no-op returning `None`. A failing async
    /// action aborts the transition, surfaces its message through
    /// `SetError` and returns `None`; the screen-change notification is
    /// only queued after the action has fully succeeded.
    ///
    /// The guard is evaluated exactly once, before the action; it is
    /// not re-checked when the action resolves.
    pub async fn execute_transition(
        &self,
        from: ScreenId,
        label: &str,
        ctx: &mut ActionContext,
        lookup: &dyn Fn(&str) -> Option<Trigger>,
    ) -> Option<ScreenId> {
        let Some(trigger) = self.resolve_trigger(label, lookup) else {
            warn!(label, "no trigger mapped to button label");
            return None;
        };

        let Some(transition) = self.find_transition(from, trigger, ctx).copied() else {
            warn!(%from, ?trigger, "no transition from screen for trigger");
            return None;
        };

        match transition.action {
            Some(TransitionAction::Sync(run)) => run(ctx),
            Some(TransitionAction::Async(effect)) => {
                if let Err(err) = ctx.run_effect(effect).await {
                    warn!(%from, ?trigger, error = %err, "transition action failed");
                    ctx.dispatch(StateCommand::SetError(Some(err.to_string())));
                    return None;
                }
            }
            None => {}
        }

        ctx.notify_screen_change(transition.to);
        info!(%from, to = %transition.to, ?trigger, "screen transition");
        Some(transition.to)
    }

    /// Appends a rule; within its `(from, trigger)` bucket it is tried
    /// after everything already declared.
    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions
            .entry((transition.from, transition.trigger))
            .or_default()
            .push(transition);
    }

    /// Removes every rule matching `(from, trigger)` — guarded and
    /// unguarded variants alike.
    pub fn remove_transition(&mut self, from: ScreenId, trigger: Trigger) {
        self.transitions.remove(&(from, trigger));
    }

    /// All rules leaving `screen`, in no particular bucket order.
    pub fn transitions_from(&self, screen: ScreenId) -> Vec<&Transition> {
        self.transitions
            .values()
            .flatten()
            .filter(|t| t.from == screen)
            .collect()
    }

    /// Screens reachable from `screen` in one press.
    pub fn possible_destinations(&self, screen: ScreenId) -> Vec<ScreenId> {
        let mut destinations: Vec<ScreenId> = self
            .transitions_from(screen)
            .into_iter()
            .map(|t| t.to)
            .collect();
        destinations.sort();
        destinations.dedup();
        destinations
    }

    /// Whether `(from, trigger)` can currently reach `to`, honoring the
    /// guard against `ctx`.
    pub fn can_transition(
        &self,
        from: ScreenId,
        to: ScreenId,
        trigger: Trigger,
        ctx: &ActionContext,
    ) -> bool {
        self.transitions
            .get(&(from, trigger))
            .into_iter()
            .flatten()
            .any(|t| t.to == to && t.guard.is_none_or(|guard| guard(ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::{TransactionExecutor, TransactionReceipt};
    use crate::domain::errors::{NavError, NavResult};
    use crate::domain::models::{CardType, TransactionKind, User};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn english_lookup(label: &str) -> Option<Trigger> {
        match label {
            "Enter PIN" => Some(Trigger::EnterPin),
            "Cancel" => Some(Trigger::Cancel),
            "Clear" => Some(Trigger::Clear),
            "Balance" => Some(Trigger::Balance),
            "Withdraw" => Some(Trigger::Withdraw),
            "Deposit" => Some(Trigger::Deposit),
            "Exit" => Some(Trigger::Exit),
            "Re-Enter PIN" => Some(Trigger::ReEnterPin),
            "Main Menu" => Some(Trigger::MainMenu),
            "Confirm" => Some(Trigger::Confirm),
            _ => None,
        }
    }

    struct CountingExecutor {
        result: Result<f64, String>,
        calls: AtomicUsize,
    }

    impl CountingExecutor {
        fn ok(new_balance: f64) -> Self {
            Self {
                result: Ok(new_balance),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                result: Err(message.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TransactionExecutor for CountingExecutor {
        async fn execute(
            &self,
            _kind: TransactionKind,
            _user_id: &str,
            _amount: f64,
        ) -> NavResult<TransactionReceipt> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .map(|new_balance| TransactionReceipt { new_balance })
                .map_err(NavError::Transaction)
        }
    }

    fn test_user() -> User {
        User {
            id: "1".into(),
            name: "Peter Parker".into(),
            card_type: CardType::Visa,
            balance: 1500.0,
        }
    }

    fn confirm_ctx(amount: &str, executor: Arc<CountingExecutor>) -> ActionContext {
        ActionContext::new()
            .with_user(Some(test_user()))
            .with_amount(Some(amount.into()))
            .with_transaction_kind(Some(TransactionKind::Withdraw))
            .with_executor(executor)
    }

    #[tokio::test]
    async fn unmapped_label_is_a_warned_noop() {
        let engine = NavigationEngine::new();
        let mut ctx = ActionContext::new();
        let next = engine
            .execute_transition(ScreenId::Welcome, "Decorative", &mut ctx, &english_lookup)
            .await;
        assert_eq!(next, None);
        assert!(ctx.commands().is_empty());
    }

    #[tokio::test]
    async fn absent_pair_is_a_noop_for_every_screen() {
        let engine = NavigationEngine::new();
        // CONFIRM is only legal on the transaction screens.
        for screen in [ScreenId::Welcome, ScreenId::PinEntry, ScreenId::Balance] {
            let mut ctx = ActionContext::new();
            let next = engine
                .execute_transition(screen, "Confirm", &mut ctx, &english_lookup)
                .await;
            assert_eq!(next, None, "screen {screen}");
            assert!(ctx.commands().is_empty());
        }
    }

    #[tokio::test]
    async fn enter_pin_moves_to_pin_entry() {
        let engine = NavigationEngine::new();
        let mut ctx = ActionContext::new();
        let next = engine
            .execute_transition(ScreenId::Welcome, "Enter PIN", &mut ctx, &english_lookup)
            .await;
        assert_eq!(next, Some(ScreenId::PinEntry));
        assert_eq!(
            ctx.into_commands(),
            vec![StateCommand::ShowScreen(ScreenId::PinEntry)]
        );
    }

    #[tokio::test]
    async fn clear_on_pin_entry_stays_and_clears_the_pin() {
        let engine = NavigationEngine::new();
        let mut ctx = ActionContext::new();
        let next = engine
            .execute_transition(ScreenId::PinEntry, "Clear", &mut ctx, &english_lookup)
            .await;
        assert_eq!(next, Some(ScreenId::PinEntry));
        assert_eq!(
            ctx.into_commands(),
            vec![
                StateCommand::ClearPin,
                StateCommand::ShowScreen(ScreenId::PinEntry)
            ]
        );
    }

    #[tokio::test]
    async fn exit_clears_the_session_before_the_screen_change() {
        let engine = NavigationEngine::new();
        let mut ctx = ActionContext::new().with_user(Some(test_user()));
        let next = engine
            .execute_transition(ScreenId::MainMenu, "Exit", &mut ctx, &english_lookup)
            .await;
        assert_eq!(next, Some(ScreenId::Welcome));
        assert_eq!(
            ctx.into_commands(),
            vec![
                StateCommand::Logout,
                StateCommand::ClearUi,
                StateCommand::ShowScreen(ScreenId::Welcome)
            ]
        );
    }

    #[tokio::test]
    async fn confirm_with_zero_amount_never_calls_the_orchestrator() {
        let engine = NavigationEngine::new();
        let executor = Arc::new(CountingExecutor::ok(1400.0));
        let mut ctx = confirm_ctx("0", executor.clone());
        let next = engine
            .execute_transition(ScreenId::Withdraw, "Confirm", &mut ctx, &english_lookup)
            .await;
        assert_eq!(next, None);
        assert!(ctx.commands().is_empty());
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_confirm_lands_on_balance_with_state_cleared() {
        let engine = NavigationEngine::new();
        let executor = Arc::new(CountingExecutor::ok(1400.0));
        let mut ctx = confirm_ctx("100", executor.clone());
        let next = engine
            .execute_transition(ScreenId::Withdraw, "Confirm", &mut ctx, &english_lookup)
            .await;
        assert_eq!(next, Some(ScreenId::Balance));
        assert_eq!(
            ctx.into_commands(),
            vec![
                StateCommand::UpdateBalance(1400.0),
                StateCommand::ClearUi,
                StateCommand::ShowScreen(ScreenId::Balance)
            ]
        );
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_confirm_aborts_and_surfaces_the_message() {
        let engine = NavigationEngine::new();
        let executor = Arc::new(CountingExecutor::failing("Insufficient funds"));
        let mut ctx = confirm_ctx("100", executor);
        let next = engine
            .execute_transition(ScreenId::Withdraw, "Confirm", &mut ctx, &english_lookup)
            .await;
        assert_eq!(next, None);
        assert_eq!(
            ctx.into_commands(),
            vec![StateCommand::SetError(Some("Insufficient funds".into()))]
        );
    }

    #[tokio::test]
    async fn first_matching_entry_in_declaration_order_wins() {
        let mut engine = NavigationEngine::empty();
        engine.add_transition(
            Transition::new(ScreenId::MainMenu, ScreenId::Balance, Trigger::Confirm)
                .guarded(|ctx| ctx.current_amount.is_some()),
        );
        engine.add_transition(Transition::new(
            ScreenId::MainMenu,
            ScreenId::Welcome,
            Trigger::Confirm,
        ));

        // Guard passes: the earlier declaration wins over the
        // unconditional one.
        let ctx = ActionContext::new().with_amount(Some("5".into()));
        let hit = engine
            .find_transition(ScreenId::MainMenu, Trigger::Confirm, &ctx)
            .expect("a transition matches");
        assert_eq!(hit.to, ScreenId::Balance);

        // Guard fails: falls through to the next declaration.
        let ctx = ActionContext::new();
        let hit = engine
            .find_transition(ScreenId::MainMenu, Trigger::Confirm, &ctx)
            .expect("fallback transition matches");
        assert_eq!(hit.to, ScreenId::Welcome);
    }

    #[test]
    fn remove_drops_guarded_and_unguarded_variants_together() {
        let mut engine = NavigationEngine::new();
        engine.add_transition(
            Transition::new(ScreenId::Withdraw, ScreenId::Welcome, Trigger::Confirm)
                .guarded(|_| false),
        );
        engine.remove_transition(ScreenId::Withdraw, Trigger::Confirm);
        let ctx = ActionContext::new().with_amount(Some("100".into()));
        assert!(
            engine
                .find_transition(ScreenId::Withdraw, Trigger::Confirm, &ctx)
                .is_none()
        );
    }

    #[test]
    fn destinations_from_main_menu_cover_both_regions() {
        let engine = NavigationEngine::new();
        assert_eq!(
            engine.possible_destinations(ScreenId::MainMenu),
            vec![
                ScreenId::Welcome,
                ScreenId::PinEntry,
                ScreenId::Balance,
                ScreenId::Withdraw,
                ScreenId::Deposit
            ]
        );
    }

    #[test]
    fn can_transition_honors_the_guard() {
        let engine = NavigationEngine::new();
        let with_amount = ActionContext::new().with_amount(Some("50".into()));
        let without = ActionContext::new();
        assert!(engine.can_transition(
            ScreenId::Deposit,
            ScreenId::Balance,
            Trigger::Confirm,
            &with_amount
        ));
        assert!(!engine.can_transition(
            ScreenId::Deposit,
            ScreenId::Balance,
            Trigger::Confirm,
            &without
        ));
    }
}
