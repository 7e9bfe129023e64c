//! The six kiosk screens as renderable units.
//!
//! Only the welcome screen is constructed eagerly; the rest are behind
//! async loaders registered in [`screen_loaders`] so the resolver can
//! materialize and cache them on demand.

use crate::application::{App, QUICK_AMOUNTS, ScreenLoader, ScreenUnit, ScreenView};
use crate::domain::ScreenId;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::collections::HashMap;
use std::sync::Arc;

/// The always-resident welcome unit.
pub fn welcome_view() -> ScreenUnit {
    Arc::new(WelcomeView)
}

/// Async loaders for every lazily materialized screen.
pub fn screen_loaders() -> HashMap<ScreenId, ScreenLoader> {
    let mut loaders: HashMap<ScreenId, ScreenLoader> = HashMap::new();
    loaders.insert(ScreenId::PinEntry, loader(|| Arc::new(PinEntryView)));
    loaders.insert(ScreenId::MainMenu, loader(|| Arc::new(MainMenuView)));
    loaders.insert(ScreenId::Balance, loader(|| Arc::new(BalanceView)));
    loaders.insert(
        ScreenId::Withdraw,
        loader(|| Arc::new(TransactionView::withdraw())),
    );
    loaders.insert(
        ScreenId::Deposit,
        loader(|| Arc::new(TransactionView::deposit())),
    );
    loaders
}

fn loader(make: fn() -> ScreenUnit) -> ScreenLoader {
    Arc::new(move || Box::pin(async move { Ok(make()) }))
}

/// Rows of centered lines laid out from the top of the screen area.
fn centered_lines(f: &mut Frame, area: Rect, lines: Vec<Line<'_>>) {
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(30), Constraint::Min(0)])
        .split(area);
    f.render_widget(paragraph, chunks[1]);
}

fn title_line(text: String) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
}

fn error_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::Red),
    ))
}

fn hint_line(text: String) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

struct WelcomeView;

impl ScreenView for WelcomeView {
    fn render(&self, f: &mut Frame<'_>, area: Rect, app: &App) {
        let lines = vec![
            title_line(app.t("screens.welcomeTitle")),
            Line::default(),
            Line::from(app.t("screens.welcomeHint")),
            Line::default(),
            hint_line(app.t("demo.demoPins")),
        ];
        centered_lines(f, area, lines);
    }
}

struct PinEntryView;

impl ScreenView for PinEntryView {
    fn render(&self, f: &mut Frame<'_>, area: Rect, app: &App) {
        let mut lines = vec![title_line(app.t("screens.enterYourPin")), Line::default()];

        let dots: String = "* ".repeat(app.session.pin.len()).trim_end().to_string();
        lines.push(Line::from(Span::styled(
            if dots.is_empty() { "_".to_string() } else { dots },
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());

        if app.session.is_loading {
            lines.push(Line::from(Span::styled(
                app.t("screens.authenticating"),
                Style::default().fg(Color::Yellow),
            )));
        } else if let Some(error) = app.session.error.as_deref() {
            lines.push(error_line(error));
        }
        lines.push(Line::default());
        lines.push(hint_line(app.t("demo.demoPins")));
        centered_lines(f, area, lines);
    }
}

struct MainMenuView;

impl ScreenView for MainMenuView {
    fn render(&self, f: &mut Frame<'_>, area: Rect, app: &App) {
        let mut lines = Vec::new();
        if let Some(user) = app.session.user.as_ref() {
            lines.push(Line::from(format!(
                "{}, {}",
                app.t("screens.greeting"),
                user.name
            )));
            lines.push(hint_line(user.card_type.as_str().to_string()));
            lines.push(Line::default());
        }
        lines.push(title_line(app.t("screens.mainMenuTitle")));
        centered_lines(f, area, lines);
    }
}

struct BalanceView;

impl ScreenView for BalanceView {
    fn render(&self, f: &mut Frame<'_>, area: Rect, app: &App) {
        let mut lines = vec![title_line(app.t("screens.currentBalance")), Line::default()];
        if app.ui.is_loading {
            lines.push(Line::from(app.t("screens.loading")));
        } else if let Some(balance) = app.account.balance {
            lines.push(Line::from(Span::styled(
                format!("${balance:.2}"),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        if let Some(error) = app.ui.error.as_deref() {
            lines.push(Line::default());
            lines.push(error_line(error));
        }
        centered_lines(f, area, lines);
    }
}

/// Withdraw and deposit share one layout; only the instruction differs.
struct TransactionView {
    instruction_key: &'static str,
}

impl TransactionView {
    fn withdraw() -> Self {
        Self {
            instruction_key: "screens.selectWithdrawAmount",
        }
    }

    fn deposit() -> Self {
        Self {
            instruction_key: "screens.selectDepositAmount",
        }
    }
}

impl ScreenView for TransactionView {
    fn render(&self, f: &mut Frame<'_>, area: Rect, app: &App) {
        let mut lines = vec![title_line(app.t(self.instruction_key)), Line::default()];

        let mut presets = Vec::new();
        for (i, preset) in QUICK_AMOUNTS.iter().enumerate() {
            if i > 0 {
                presets.push(Span::raw("   "));
            }
            let selected = app.ui.current_amount.as_deref() == Some(&preset.to_string());
            let style = if selected {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else {
                Style::default()
            };
            presets.push(Span::styled(format!(" ${preset} "), style));
        }
        lines.push(Line::from(presets));
        lines.push(Line::default());

        let amount = app.ui.current_amount.as_deref().unwrap_or("");
        lines.push(Line::from(format!(
            "{}: ${amount}",
            app.t("screens.amountEntered")
        )));
        lines.push(Line::default());

        if app.ui.is_loading {
            lines.push(Line::from(Span::styled(
                app.t("screens.processing"),
                Style::default().fg(Color::Yellow),
            )));
        } else if let Some(error) = app.ui.error.as_deref() {
            lines.push(error_line(error));
        }
        centered_lines(f, area, lines);
    }
}
