//! Reusable UI components for the TUI.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppMode};

/// Render the help bar with context-sensitive key bindings.
pub fn render_help_bar(f: &mut Frame, area: Rect, app: &App) {
    let help_text = build_help_text(app);

    let help = Paragraph::new(Line::from(help_text))
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));

    f.render_widget(help, area);
}

/// Build help text based on current app state.
fn build_help_text(app: &App) -> Vec<Span<'static>> {
    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let sep_style = Style::default().fg(Color::DarkGray);
    let text_style = Style::default().fg(Color::White);

    let bindings: &[(&'static str, &'static str)] = match app.mode {
        AppMode::ConfirmDelete => &[("Y", "Confirm"), ("N/Esc", "Cancel")],
        AppMode::EditSegment => &[("Tab", "Next hint"), ("Enter", "Go"), ("Esc", "Cancel")],
        AppMode::UploadPrompt => &[("Enter", "Upload"), ("Esc", "Cancel")],
        AppMode::Normal if !app.nav.state().panel_open => {
            &[("o", "Open explorer"), ("[ ]", "Back/Fwd"), ("q", "Quit")]
        }
        AppMode::Normal => &[
            ("↑↓", "Select"),
            ("Enter", "Open"),
            ("Bksp", "Up"),
            ("e", "Rename crumb"),
            ("u", "Upload"),
            ("d", "Delete"),
            ("r", "Refresh"),
            ("[ ]", "Back/Fwd"),
            ("Esc", "Close"),
        ],
    };

    let mut spans = Vec::new();
    for (i, (key, label)) in bindings.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", sep_style));
        }
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(format!(":{}", label), text_style));
    }
    spans
}

/// Render the status bar.
pub fn render_status_bar(f: &mut Frame, area: Rect, message: &str) {
    let status = Paragraph::new(message.to_string())
        .style(Style::default().bg(Color::Blue).fg(Color::White));
    f.render_widget(status, area);
}

/// Centered popup area of `height` lines, 60% wide.
pub fn popup_area(area: Rect, height: u16) -> Rect {
    let width = (area.width * 60 / 100).max(40).min(area.width.saturating_sub(4));
    let x = area.width.saturating_sub(width) / 2;
    let y = area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height.min(area.height))
}

/// Delete confirmation dialog.
pub fn render_delete_confirm(f: &mut Frame, app: &App) {
    let Some(ref target) = app.delete_target else {
        return;
    };
    let area = popup_area(f.area(), 7);
    f.render_widget(Clear, area);

    let text = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("Delete ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(target.entry.kind.as_str()),
            Span::raw(":"),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            target.entry.key.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(vec![
            Span::styled("[Y]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Yes  "),
            Span::styled("[N/Esc]", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" No"),
        ]),
    ];

    let popup = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" ⚠ Confirm Delete ")
                .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(popup, area);
}

/// Single-line input popup.
pub fn render_input_popup(f: &mut Frame, title: &str, hint: &str, input: &str) {
    let area = popup_area(f.area(), 5);
    f.render_widget(Clear, area);

    let text = vec![
        Line::from(Span::styled(hint.to_string(), Style::default().fg(Color::DarkGray))),
        Line::from(vec![
            Span::styled(input.to_string(), Style::default().fg(Color::White)),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ]),
    ];

    let popup = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", title)),
    );
    f.render_widget(popup, area);
}
