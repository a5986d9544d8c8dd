use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane};
use crate::tui::AppEvent;

const MOUSE_SCROLL_LINES: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if key.code == KeyCode::Tab {
        app.focus = app.focus.next();
        return;
    }

    match app.focus {
        FocusPane::Input => handle_input(app, key),
        FocusPane::Chat => handle_chat(app, key),
        FocusPane::Models => handle_models(app, key),
    }
}

fn handle_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.focus = FocusPane::Chat;
        }
        KeyCode::Enter => app.submit_prompt(),
        // With no model to ask, the box stays read-only
        _ if !app.session.has_models() => {}
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            if app.input_cursor < app.input.chars().count() {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

fn handle_chat(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => app.dismiss_notice(),

        // Half-page scroll (must be before plain 'd'/'u' to match first)
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        KeyCode::Char('i') | KeyCode::Enter => app.focus = FocusPane::Input,
        KeyCode::Char('m') => app.focus = FocusPane::Models,
        _ => {}
    }
}

fn handle_models(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.models_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.models_nav_up(),
        KeyCode::Enter | KeyCode::Char(' ') => {
            app.select_highlighted_model();
            app.focus = FocusPane::Input;
        }
        KeyCode::Esc => {
            // Drop the highlight back onto the model actually in use
            app.model_list_state.select(app.session.selected_index());
            app.focus = FocusPane::Input;
        }
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (x, y) = (mouse.column, mouse.row);
    let in_chat = app.chat_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_models = app.models_area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::ScrollDown if in_chat => app.scroll_down(MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollUp if in_chat => app.scroll_up(MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollDown if in_models => app.models_nav_down(),
        MouseEventKind::ScrollUp if in_models => app.models_nav_up(),
        _ => {}
    }
}
