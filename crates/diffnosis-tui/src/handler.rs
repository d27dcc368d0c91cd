use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, ProfileField, Screen};
use crate::input::LineInput;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work on any screen
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.screen {
        Screen::Profile => handle_profile_key(app, key),
        Screen::Chat => handle_chat_key(app, key),
    }
}

fn handle_profile_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // "Next": on to the chat
        KeyCode::Enter => app.start_chat(),

        KeyCode::Tab | KeyCode::Down => app.next_field(),
        KeyCode::BackTab | KeyCode::Up => app.prev_field(),

        // The sex picker is a two-way toggle
        KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
            if app.focused_field == ProfileField::Sex =>
        {
            app.toggle_sex();
        }

        _ => {
            if let Some(input) = app.focused_input_mut() {
                edit_line(input, key);
            }
        }
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    match key.code {
        // Home: leaving the chat ends the session
        KeyCode::Esc => app.leave_chat(),

        // Ignored while a reply is pending or the box is empty
        KeyCode::Enter => {
            if app.can_submit() {
                app.submit_chat();
            }
        }

        KeyCode::PageUp => app.scroll_chat_up(app.chat_height.max(2) / 2),
        KeyCode::PageDown => app.scroll_chat_down(app.chat_height.max(2) / 2),
        KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Down => app.scroll_chat_down(1),

        _ => edit_line(&mut app.chat_input, key),
    }
}

/// Shared single-line editing keys
fn edit_line(input: &mut LineInput, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert(c),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != Screen::Chat {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_chat_down(3),
        MouseEventKind::ScrollUp => app.scroll_chat_up(3),
        _ => {}
    }
}
