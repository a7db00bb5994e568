use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppMode};

pub async fn handle_events(app: &mut App) -> Result<()> {
    // Apply listings, deletes and upload refreshes that finished meanwhile
    app.poll_background();

    if event::poll(std::time::Duration::from_millis(100))? {
        if let Event::Key(key) = event::read()? {
            // Ctrl+C quits from every mode
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                app.should_quit = true;
                return Ok(());
            }

            match app.mode {
                AppMode::Normal => handle_normal_mode(app, key),
                AppMode::EditSegment => handle_edit_segment(app, key),
                AppMode::UploadPrompt => handle_upload_prompt(app, key),
                AppMode::ConfirmDelete => handle_confirm_delete(app, key),
            }
        }
    }
    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('[') => app.back(),
        KeyCode::Char(']') => app.forward(),
        KeyCode::Char('o') if !app.nav.state().panel_open => app.open_panel(),
        _ if !app.nav.state().panel_open => {}
        KeyCode::Esc => {
            if app.nav.notice().is_some() {
                app.nav.dismiss_notice();
            } else {
                app.close_panel();
            }
        }
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        KeyCode::Enter => app.enter_selected(),
        KeyCode::Backspace => app.go_parent(),
        KeyCode::Char('e') => app.edit_terminal_crumb(),
        KeyCode::Char('d') | KeyCode::Delete => app.begin_delete(),
        KeyCode::Char('u') => app.begin_upload(),
        KeyCode::Char('r') => app.refresh(),
        _ => {}
    }
}

fn handle_edit_segment(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.accept_segment(),
        KeyCode::Esc => app.cancel_edit(),
        KeyCode::Tab => app.cycle_hint(),
        KeyCode::Backspace => {
            app.input.pop();
            app.hint_cursor = None;
        }
        KeyCode::Char(c) => {
            app.input.push(c);
            app.hint_cursor = None;
        }
        _ => {}
    }
}

fn handle_upload_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.start_upload(),
        KeyCode::Esc => {
            app.input.clear();
            app.mode = AppMode::Normal;
        }
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => app.input.push(c),
        _ => {}
    }
}

fn handle_confirm_delete(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.delete_target = None;
            app.mode = AppMode::Normal;
        }
        _ => {}
    }
}
