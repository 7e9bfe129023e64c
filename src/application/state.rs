//! Application state for the kiosk.
//!
//! One [`App`] owns everything a session needs: the current screen,
//! the session/account/ui state slices, the injected navigation engine,
//! the screen resolver and the backing-API handles. UI events are
//! handled one at a time — a button press is awaited end to end before
//! the next event is read, so no two transitions are ever in flight for
//! the same session.

use crate::application::i18n::{Language, Localizer};
use crate::application::resolver::{Rendered, ScreenContext, ScreenHandlers, ScreenResolver};
use crate::domain::{
    ActionContext, AtmApi, NavigationEngine, ScreenId, StateCommand, TransactionExecutor,
    TransactionKind, User,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::warn;

/// Digits a PIN must have before it is submitted.
pub const PIN_LENGTH: usize = 4;

/// Preset amounts offered on the transaction screens.
pub const QUICK_AMOUNTS: [u32; 4] = [20, 50, 100, 200];

/// Longest amount the kiosk will let a customer type.
const MAX_AMOUNT_DIGITS: usize = 7;

/// Authentication state, owned here and only ever read by the
/// navigation engine and the resolver.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    /// PIN entry buffer; never rendered as plain text.
    pub pin: String,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Last known account figures.
#[derive(Debug, Clone, Default)]
pub struct AccountState {
    pub balance: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Transient per-screen UI state.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Raw amount string being composed on a transaction screen.
    pub current_amount: Option<String>,
    pub transaction_kind: Option<TransactionKind>,
    pub error: Option<String>,
    pub is_loading: bool,
}

/// The kiosk.
pub struct App {
    pub current_screen: ScreenId,
    pub session: SessionState,
    pub account: AccountState,
    pub ui: UiState,
    pub should_quit: bool,
    i18n: Localizer,
    engine: NavigationEngine,
    api: Arc<dyn AtmApi>,
    executor: Arc<dyn TransactionExecutor>,
    resolver: Arc<ScreenResolver>,
}

impl App {
    /// A kiosk on the welcome screen with a fresh session.
    ///
    /// Collaborators are injected rather than reached through globals:
    /// the engine, API client, transaction executor and resolver are
    /// all plain values owned here.
    pub fn new(
        api: Arc<dyn AtmApi>,
        executor: Arc<dyn TransactionExecutor>,
        resolver: Arc<ScreenResolver>,
    ) -> Self {
        Self {
            current_screen: ScreenId::Welcome,
            session: SessionState::default(),
            account: AccountState::default(),
            ui: UiState::default(),
            should_quit: false,
            i18n: Localizer::default(),
            engine: NavigationEngine::new(),
            api,
            executor,
            resolver,
        }
    }

    /// Localization lookup bound to the active language.
    pub fn t(&self, key: &str) -> String {
        self.i18n.t(key)
    }

    pub fn language(&self) -> Language {
        self.i18n.language()
    }

    /// Handles one side-button press end to end.
    ///
    /// The language toggle is not a navigation concern and is handled
    /// before the state machine sees the label. Everything else flows
    /// through the engine; the commands the transition queued are then
    /// applied in dispatch order, which keeps the screen change strictly
    /// after the action's state changes.
    pub async fn press_button(&mut self, label: &str) {
        if label.is_empty() || self.ui.is_loading || self.session.is_loading {
            return;
        }
        if label == self.i18n.t("languages.languageToggle") {
            self.i18n.toggle();
            return;
        }

        let mut ctx = self.action_context();
        let map = self.i18n.label_trigger_map();
        let lookup = |l: &str| map.get(l).copied();
        let next = self
            .engine
            .execute_transition(self.current_screen, label, &mut ctx, &lookup)
            .await;

        for command in ctx.into_commands() {
            self.apply(command);
        }

        if let Some(to) = next {
            if to == ScreenId::Balance {
                self.refresh_balance().await;
            }
            self.resolver.preload(likely_next(to)).await;
        }
    }

    /// Builds the ephemeral capability bundle for one press.
    fn action_context(&self) -> ActionContext {
        ActionContext::new()
            .with_amount(self.ui.current_amount.clone())
            .with_transaction_kind(self.ui.transaction_kind)
            .with_user(self.session.user.clone())
            .with_executor(Arc::clone(&self.executor))
    }

    /// Applies one queued state command.
    fn apply(&mut self, command: StateCommand) {
        match command {
            StateCommand::ClearPin => self.session.pin.clear(),
            StateCommand::Logout => {
                self.session = SessionState::default();
                self.account = AccountState::default();
            }
            StateCommand::ClearUi => {
                self.ui.current_amount = None;
                self.ui.transaction_kind = None;
                self.ui.error = None;
                self.ui.is_loading = false;
            }
            StateCommand::SetAmount(amount) => self.ui.current_amount = amount,
            StateCommand::SetTransactionKind(kind) => self.ui.transaction_kind = kind,
            StateCommand::SetError(error) => self.ui.error = error,
            StateCommand::UpdateBalance(balance) => {
                self.account.balance = Some(balance);
                self.account.last_updated = Some(Utc::now());
                if let Some(user) = self.session.user.as_mut() {
                    user.balance = balance;
                }
            }
            StateCommand::ShowScreen(to) => self.enter_screen(to),
        }
    }

    /// Screen-entry effects: the transaction screens pin their kind the
    /// moment they appear, the way the original screens did on mount.
    fn enter_screen(&mut self, to: ScreenId) {
        self.current_screen = to;
        match to {
            ScreenId::Withdraw => self.ui.transaction_kind = Some(TransactionKind::Withdraw),
            ScreenId::Deposit => self.ui.transaction_kind = Some(TransactionKind::Deposit),
            _ => {}
        }
    }

    /// Appends a PIN digit; the 4th digit submits automatically.
    pub async fn push_pin_digit(&mut self, digit: char) {
        if self.current_screen != ScreenId::PinEntry
            || !digit.is_ascii_digit()
            || self.session.is_loading
            || self.session.pin.len() >= PIN_LENGTH
        {
            return;
        }
        self.session.pin.push(digit);
        if self.session.pin.len() == PIN_LENGTH {
            self.submit_pin().await;
        }
    }

    pub fn pop_pin_digit(&mut self) {
        if !self.session.is_loading {
            self.session.pin.pop();
        }
    }

    /// Authenticates the buffered PIN against the backing API.
    ///
    /// Success is the one screen change that bypasses the transition
    /// table: the authentication event is driven by an external call,
    /// not a button label. It also preloads the main menu so the
    /// customer never sees a loading flash right after logging in.
    pub async fn submit_pin(&mut self) -> bool {
        let pin = self.session.pin.clone();
        self.session.is_loading = true;
        self.session.error = None;

        let outcome = self.api.authenticate(&pin).await;
        self.session.is_loading = false;
        match outcome {
            Ok(response) if response.success && response.user.is_some() => {
                self.session.user = response.user;
                self.session.is_authenticated = true;
                self.session.pin.clear();
                self.resolver.preload(&[ScreenId::MainMenu]).await;
                self.enter_screen(ScreenId::MainMenu);
                true
            }
            Ok(response) => {
                self.session.pin.clear();
                self.session.error = Some(response.message);
                false
            }
            Err(err) => {
                warn!(error = %err, "authentication request failed");
                self.session.pin.clear();
                self.session.error = Some(err.to_string());
                false
            }
        }
    }

    /// Re-reads the balance from the backing API; failures surface in
    /// the screen's error slot and never change the screen.
    pub async fn refresh_balance(&mut self) {
        let Some(user_id) = self.session.user.as_ref().map(|u| u.id.clone()) else {
            return;
        };
        self.ui.is_loading = true;
        let outcome = self.api.get_balance(&user_id).await;
        self.ui.is_loading = false;
        match outcome {
            Ok(response) if response.success && response.balance.is_some() => {
                self.account.balance = response.balance;
                self.account.last_updated = Some(Utc::now());
            }
            Ok(response) => self.ui.error = Some(response.message),
            Err(err) => {
                warn!(error = %err, "balance request failed");
                self.ui.error = Some(err.to_string());
            }
        }
    }

    /// Appends a digit to the amount being composed.
    pub fn push_amount_digit(&mut self, digit: char) {
        if !matches!(
            self.current_screen,
            ScreenId::Withdraw | ScreenId::Deposit
        ) || !digit.is_ascii_digit()
            || self.ui.is_loading
        {
            return;
        }
        let mut amount = self.ui.current_amount.take().unwrap_or_default();
        if amount == "0" {
            amount.clear();
        }
        if amount.len() < MAX_AMOUNT_DIGITS {
            amount.push(digit);
        }
        self.ui.current_amount = Some(amount);
    }

    pub fn pop_amount_digit(&mut self) {
        if let Some(amount) = self.ui.current_amount.as_mut() {
            amount.pop();
            if amount.is_empty() {
                self.ui.current_amount = None;
            }
        }
    }

    /// Cycles through the preset amounts on a transaction screen.
    pub fn cycle_quick_amount(&mut self) {
        if !matches!(self.current_screen, ScreenId::Withdraw | ScreenId::Deposit) {
            return;
        }
        let next = match self.ui.current_amount.as_deref() {
            Some(current) => {
                let position = QUICK_AMOUNTS
                    .iter()
                    .position(|preset| preset.to_string() == current);
                match position {
                    Some(i) => QUICK_AMOUNTS[(i + 1) % QUICK_AMOUNTS.len()],
                    None => QUICK_AMOUNTS[0],
                }
            }
            None => QUICK_AMOUNTS[0],
        };
        self.ui.current_amount = Some(next.to_string());
    }

    /// Resolves the active screen to a renderable unit, applying the
    /// resolver's redirect if the session no longer allows it.
    pub fn resolve_screen(&mut self) -> Rendered {
        let mut redirect = None;
        let rendered = {
            let mut on_change = |screen: ScreenId| redirect = Some(screen);
            let mut ctx = ScreenContext {
                is_authenticated: self.session.is_authenticated,
                user: self.session.user.as_ref(),
                handlers: ScreenHandlers {
                    on_screen_change: &mut on_change,
                },
            };
            self.resolver.render(self.current_screen, &mut ctx)
        };
        if let Some(to) = redirect {
            self.current_screen = to;
        }
        rendered
    }
}

/// Screens a customer is most likely to want next, preloaded after a
/// transition so their first render is flash-free.
fn likely_next(screen: ScreenId) -> &'static [ScreenId] {
    match screen {
        ScreenId::Welcome => &[ScreenId::PinEntry],
        ScreenId::PinEntry => &[ScreenId::MainMenu],
        ScreenId::MainMenu => &[ScreenId::Balance, ScreenId::Withdraw],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::resolver::{ScreenUnit, ScreenView};
    use crate::infrastructure::{ApiTransactionExecutor, MockBank};
    use ratatui::{Frame, layout::Rect};
    use std::collections::HashMap;

    struct NullView;

    impl ScreenView for NullView {
        fn render(&self, _frame: &mut Frame<'_>, _area: Rect, _app: &App) {}
    }

    fn test_app() -> App {
        let bank = Arc::new(MockBank::default());
        let executor = Arc::new(ApiTransactionExecutor::new(bank.clone()));
        let welcome: ScreenUnit = Arc::new(NullView);
        let resolver = Arc::new(ScreenResolver::new(welcome, HashMap::new()));
        App::new(bank, executor, resolver)
    }

    async fn authed_app() -> App {
        let mut app = test_app();
        app.enter_screen(ScreenId::PinEntry);
        app.session.pin = "1234".into();
        assert!(app.submit_pin().await, "demo PIN authenticates");
        app
    }

    #[tokio::test]
    async fn welcome_enter_pin_reaches_pin_entry() {
        let mut app = test_app();
        app.press_button("Enter PIN").await;
        assert_eq!(app.current_screen, ScreenId::PinEntry);
    }

    #[tokio::test]
    async fn clear_on_pin_entry_wipes_the_buffer_and_stays() {
        let mut app = test_app();
        app.press_button("Enter PIN").await;
        app.push_pin_digit('1').await;
        app.push_pin_digit('2').await;
        app.press_button("Clear").await;
        assert_eq!(app.current_screen, ScreenId::PinEntry);
        assert!(app.session.pin.is_empty());
    }

    #[tokio::test]
    async fn fourth_digit_authenticates_and_lands_on_main_menu() {
        let mut app = test_app();
        app.press_button("Enter PIN").await;
        for digit in ['1', '2', '3', '4'] {
            app.push_pin_digit(digit).await;
        }
        assert_eq!(app.current_screen, ScreenId::MainMenu);
        assert!(app.session.is_authenticated);
        assert_eq!(
            app.session.user.as_ref().map(|u| u.name.as_str()),
            Some("Peter Parker")
        );
        assert!(app.session.pin.is_empty());
    }

    #[tokio::test]
    async fn wrong_pin_surfaces_the_backend_message() {
        let mut app = test_app();
        app.enter_screen(ScreenId::PinEntry);
        app.session.pin = "0000".into();
        assert!(!app.submit_pin().await);
        assert_eq!(app.current_screen, ScreenId::PinEntry);
        assert_eq!(
            app.session.error.as_deref(),
            Some("Invalid PIN. Please try again.")
        );
        assert!(app.session.pin.is_empty());
    }

    #[tokio::test]
    async fn full_withdraw_flow_updates_the_balance() {
        let mut app = authed_app().await;
        app.press_button("Withdraw").await;
        assert_eq!(app.current_screen, ScreenId::Withdraw);
        assert_eq!(app.ui.transaction_kind, Some(TransactionKind::Withdraw));

        for digit in ['1', '0', '0'] {
            app.push_amount_digit(digit);
        }
        app.press_button("Confirm").await;

        assert_eq!(app.current_screen, ScreenId::Balance);
        assert_eq!(app.account.balance, Some(1400.0));
        assert_eq!(app.ui.current_amount, None);
        assert_eq!(app.ui.transaction_kind, None);
        assert_eq!(app.ui.error, None);
    }

    #[tokio::test]
    async fn rejected_withdraw_stays_put_and_shows_the_message() {
        let mut app = authed_app().await;
        app.press_button("Withdraw").await;
        for digit in ['9', '9', '9', '9', '9'] {
            app.push_amount_digit(digit);
        }
        app.press_button("Confirm").await;

        assert_eq!(app.current_screen, ScreenId::Withdraw);
        assert_eq!(app.ui.error.as_deref(), Some("Insufficient funds"));
        // The attempt committed nothing.
        app.refresh_balance().await;
        assert_eq!(app.account.balance, Some(1500.0));
    }

    #[tokio::test]
    async fn confirm_without_an_amount_is_ignored() {
        let mut app = authed_app().await;
        app.press_button("Withdraw").await;
        app.press_button("Confirm").await;
        assert_eq!(app.current_screen, ScreenId::Withdraw);
        assert_eq!(app.ui.error, None);
    }

    #[tokio::test]
    async fn deposit_flow_raises_the_balance() {
        let mut app = authed_app().await;
        app.press_button("Deposit").await;
        assert_eq!(app.ui.transaction_kind, Some(TransactionKind::Deposit));
        app.cycle_quick_amount();
        assert_eq!(app.ui.current_amount.as_deref(), Some("20"));
        app.press_button("Confirm").await;
        assert_eq!(app.current_screen, ScreenId::Balance);
        assert_eq!(app.account.balance, Some(1520.0));
    }

    #[tokio::test]
    async fn exit_logs_out_and_returns_to_welcome() {
        let mut app = authed_app().await;
        app.press_button("Exit").await;
        assert_eq!(app.current_screen, ScreenId::Welcome);
        assert!(!app.session.is_authenticated);
        assert!(app.session.user.is_none());
        assert_eq!(app.account.balance, None);
    }

    #[tokio::test]
    async fn language_toggle_switches_labels_without_navigating() {
        let mut app = test_app();
        app.press_button("Español").await;
        assert_eq!(app.language(), Language::Es);
        assert_eq!(app.current_screen, ScreenId::Welcome);
        // The table is untouched: the localized label still navigates.
        app.press_button("Ingresar PIN").await;
        assert_eq!(app.current_screen, ScreenId::PinEntry);
    }

    #[tokio::test]
    async fn unmapped_label_changes_nothing() {
        let mut app = authed_app().await;
        app.press_button("No Such Button").await;
        assert_eq!(app.current_screen, ScreenId::MainMenu);
        assert!(app.session.is_authenticated);
    }

    #[tokio::test]
    async fn resolver_redirect_kicks_unauthenticated_sessions_home() {
        let mut app = test_app();
        app.current_screen = ScreenId::Balance;
        let _ = app.resolve_screen();
        assert_eq!(app.current_screen, ScreenId::Welcome);
    }

    #[tokio::test]
    async fn balance_screen_refreshes_from_the_api() {
        let mut app = authed_app().await;
        app.press_button("Balance").await;
        assert_eq!(app.current_screen, ScreenId::Balance);
        assert_eq!(app.account.balance, Some(1500.0));
    }

    #[test]
    fn quick_amounts_cycle_in_order() {
        let mut app = test_app();
        app.current_screen = ScreenId::Withdraw;
        for expected in ["20", "50", "100", "200", "20"] {
            app.cycle_quick_amount();
            assert_eq!(app.ui.current_amount.as_deref(), Some(expected));
        }
    }
}
