//! The explorer drawer: breadcrumbs, upload progress and the listing table.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, List, ListItem, Paragraph, Row, Table},
    Frame,
};

use crate::app::{App, AppMode};
use crate::breadcrumb::crumbs;
use crate::upload::UploadState;

pub fn render_drawer(f: &mut Frame, area: Rect, app: &mut App) {
    if !app.nav.state().panel_open {
        let closed = Paragraph::new(Line::from(vec![
            Span::raw("Press "),
            Span::styled("o", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" to open the S3 file explorer"),
        ]))
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", app.title)));
        f.render_widget(closed, area);
        return;
    }

    let upload = app.upload_snapshot();
    let error_lines = upload.errors.len().min(5) as u16;
    let notice_lines = u16::from(app.nav.notice().is_some());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                       // Breadcrumbs
            Constraint::Length(notice_lines),            // Listing/delete failures
            Constraint::Length(if upload.busy { 3 } else { 0 }), // Progress
            Constraint::Length(error_lines),             // Upload errors
            Constraint::Min(0),                          // Table
        ])
        .split(area);

    render_breadcrumbs(f, chunks[0], app);

    if let Some(notice) = app.nav.notice() {
        let line = Paragraph::new(format!("✗ {} (Esc to dismiss)", notice))
            .style(Style::default().fg(Color::Red));
        f.render_widget(line, chunks[1]);
    }

    if upload.busy {
        render_progress(f, chunks[2], &upload);
    }

    if error_lines > 0 {
        let lines: Vec<Line> = upload
            .errors
            .iter()
            .take(error_lines as usize)
            .map(|e| Line::from(Span::styled(e.clone(), Style::default().fg(Color::Red))))
            .collect();
        f.render_widget(Paragraph::new(lines), chunks[3]);
    }

    render_table(f, chunks[4], app);

    if matches!(app.mode, AppMode::EditSegment) {
        render_hints(f, chunks[4], app);
    }
}

fn render_breadcrumbs(f: &mut Frame, area: Rect, app: &App) {
    let chain = crumbs(app.nav.prefix());
    let crumb_style = Style::default().fg(Color::Cyan);
    let terminal_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut spans = Vec::new();
    for (i, crumb) in chain.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" / ", sep_style));
        }
        let is_terminal = i + 1 == chain.len();
        if is_terminal && matches!(app.mode, AppMode::EditSegment) {
            spans.push(Span::styled(format!("{}▏", app.input), terminal_style));
        } else if is_terminal {
            spans.push(Span::styled(crumb.display_label().to_string(), terminal_style));
        } else {
            spans.push(Span::styled(crumb.display_label().to_string(), crumb_style));
        }
    }

    let title = format!(" {} ", app.title);
    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(bar, area);
}

fn render_progress(f: &mut Frame, area: Rect, upload: &UploadState) {
    let percent = upload.percent.clamp(0.0, 100.0).round() as u16;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Upload"))
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .percent(percent)
        .label(format!("{} {}%", upload.message, percent));
    f.render_widget(gauge, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let block = Block::default().borders(Borders::ALL);

    let Some(rows) = app.nav.table() else {
        let loading = Paragraph::new("Loading...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(loading, area);
        return;
    };

    let body: Vec<Row> = rows
        .iter()
        .map(|row| {
            let name_style = if row.entry.is_error() {
                Style::default().fg(Color::Red)
            } else if row.link().is_some() {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(row.name_cell()).style(name_style),
                Cell::from(row.size_cell()).style(Style::default().fg(Color::DarkGray)),
                Cell::from(row.modified_cell()).style(Style::default().fg(Color::DarkGray)),
                Cell::from(if row.delete_request().is_some() { row.delete_cell() } else { "" }),
            ])
        })
        .collect();

    let header = Row::new(vec!["Name", "Size", "Last Modified", "Delete"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let table = Table::new(
        body,
        [
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(19),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

/// Rows plus borders, saturating on huge folder lists.
fn popup_height(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(2)
}

fn render_hints(f: &mut Frame, area: Rect, app: &App) {
    let hints = &app.nav.state().hints;
    if hints.is_empty() {
        return;
    }

    let height = popup_height(hints.len()).min(area.height);
    let width = 32.min(area.width);
    let popup = Rect::new(area.x + 1, area.y, width, height);

    let items: Vec<ListItem> = hints
        .iter()
        .enumerate()
        .map(|(i, hint)| {
            let style = if Some(i) == app.hint_cursor {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else {
                Style::default()
            };
            ListItem::new(hint.label.clone()).style(style)
        })
        .collect();

    f.render_widget(ratatui::widgets::Clear, popup);
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title("Folders")),
        popup,
    );
}
