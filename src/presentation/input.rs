use crate::application::App;
use crate::domain::{SIDE_BUTTONS, ScreenId, screen_buttons};
use crossterm::event::{KeyCode, KeyModifiers};

pub struct InputHandler;

impl InputHandler {
    /// Routes one key event. Button presses are awaited end to end, so
    /// the next event is not read until the transition has settled.
    pub async fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && key == KeyCode::Char('c') {
            app.should_quit = true;
            return;
        }

        match key {
            // F1-F4 map to the left bezel column, F5-F8 to the right.
            KeyCode::F(n @ 1..=8) => {
                if let Some(label) = Self::side_button_label(app, n as usize) {
                    app.press_button(&label).await;
                }
            }
            KeyCode::Char(c @ '0'..='9') => {
                if app.current_screen == ScreenId::PinEntry {
                    app.push_pin_digit(c).await;
                } else {
                    app.push_amount_digit(c);
                }
            }
            KeyCode::Backspace => {
                if app.current_screen == ScreenId::PinEntry {
                    app.pop_pin_digit();
                } else {
                    app.pop_amount_digit();
                }
            }
            KeyCode::Tab => app.cycle_quick_amount(),
            KeyCode::Char('q') => {
                if app.current_screen == ScreenId::Welcome {
                    app.should_quit = true;
                }
            }
            _ => {}
        }
    }

    fn side_button_label(app: &App, fkey: usize) -> Option<String> {
        let t = |key: &str| app.t(key);
        let buttons = screen_buttons(app.current_screen, &t);
        if fkey <= SIDE_BUTTONS {
            buttons.left[fkey - 1].clone()
        } else {
            buttons.right[fkey - 1 - SIDE_BUTTONS].clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{ScreenResolver, ScreenUnit};
    use crate::infrastructure::{ApiTransactionExecutor, MockBank};
    use crate::presentation::screens::{screen_loaders, welcome_view};
    use std::sync::Arc;

    fn test_app() -> App {
        let bank = Arc::new(MockBank::new());
        let executor = Arc::new(ApiTransactionExecutor::new(bank.clone()));
        let welcome: ScreenUnit = welcome_view();
        let resolver = Arc::new(ScreenResolver::new(welcome, screen_loaders()));
        App::new(bank, executor, resolver)
    }

    #[tokio::test]
    async fn f8_on_welcome_starts_pin_entry() {
        let mut app = test_app();
        InputHandler::handle_key_event(&mut app, KeyCode::F(8), KeyModifiers::NONE).await;
        assert_eq!(app.current_screen, ScreenId::PinEntry);
    }

    #[tokio::test]
    async fn f1_toggles_the_language_everywhere() {
        let mut app = test_app();
        InputHandler::handle_key_event(&mut app, KeyCode::F(1), KeyModifiers::NONE).await;
        assert_eq!(app.language().as_str(), "es");
        assert_eq!(app.current_screen, ScreenId::Welcome);
    }

    #[tokio::test]
    async fn unassigned_fkey_does_nothing() {
        let mut app = test_app();
        InputHandler::handle_key_event(&mut app, KeyCode::F(5), KeyModifiers::NONE).await;
        assert_eq!(app.current_screen, ScreenId::Welcome);
    }

    #[tokio::test]
    async fn digits_fill_the_pin_and_authenticate() {
        let mut app = test_app();
        InputHandler::handle_key_event(&mut app, KeyCode::F(8), KeyModifiers::NONE).await;
        for digit in ['1', '2', '3', '4'] {
            InputHandler::handle_key_event(&mut app, KeyCode::Char(digit), KeyModifiers::NONE)
                .await;
        }
        assert_eq!(app.current_screen, ScreenId::MainMenu);
    }

    #[tokio::test]
    async fn ctrl_c_quits_from_any_screen() {
        let mut app = test_app();
        InputHandler::handle_key_event(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn q_only_quits_on_the_welcome_screen() {
        let mut app = test_app();
        InputHandler::handle_key_event(&mut app, KeyCode::F(8), KeyModifiers::NONE).await;
        InputHandler::handle_key_event(&mut app, KeyCode::Char('q'), KeyModifiers::NONE).await;
        assert!(!app.should_quit);
    }
}
