use crate::application::{App, Rendered};
use crate::domain::{SIDE_BUTTONS, screen_buttons};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

const SIDEBAR_WIDTH: u16 = 20;

pub fn render_ui(f: &mut Frame, app: &App, rendered: &Rendered) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_body(f, app, rendered, chunks[1]);
    render_status_bar(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let header = Paragraph::new(format!(
        "tatm - {} | {}",
        app.t("screens.welcomeTitle"),
        app.current_screen
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

/// Side-button columns flank the screen area the way the physical
/// bezel buttons flank an ATM display.
fn render_body(f: &mut Frame, app: &App, rendered: &Rendered, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Min(0),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(area);

    let t = |key: &str| app.t(key);
    let buttons = screen_buttons(app.current_screen, &t);
    render_side_buttons(f, &buttons.left, 1, Alignment::Left, columns[0]);
    render_screen(f, app, rendered, columns[1]);
    render_side_buttons(f, &buttons.right, 5, Alignment::Right, columns[2]);
}

fn render_side_buttons(
    f: &mut Frame,
    labels: &[Option<String>; SIDE_BUTTONS],
    first_fkey: usize,
    alignment: Alignment,
    area: Rect,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(1, 4); SIDE_BUTTONS])
        .split(area);

    for (i, label) in labels.iter().enumerate() {
        let Some(label) = label else {
            continue;
        };
        let text = match alignment {
            Alignment::Left => format!("F{} {label}", first_fkey + i),
            _ => format!("{label} F{}", first_fkey + i),
        };
        let button = Paragraph::new(text)
            .alignment(alignment)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Yellow));
        f.render_widget(button, rows[i]);
    }
}

fn render_screen(f: &mut Frame, app: &App, rendered: &Rendered, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("RustBank");
    let inner = block.inner(area);
    f.render_widget(block, area);

    match rendered {
        Rendered::Ready(unit) => unit.render(f, inner, app),
        Rendered::Pending => {
            let loading = Paragraph::new(app.t("screens.loading"))
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Yellow));
            f.render_widget(loading, inner);
        }
    }
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let busy = app.session.is_loading || app.ui.is_loading;
    let text = if busy {
        app.t("screens.processing")
    } else {
        format!(
            "Lang: {} | F1-F8: side buttons | 0-9: keypad | Tab: preset amounts | Ctrl+C: exit",
            app.language().as_str()
        )
    };
    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(if busy {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        });
    f.render_widget(status, area);
}
