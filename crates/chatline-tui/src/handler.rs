use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use chatline_core::Focus;
use crate::app::App;
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.poll_query().await;
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any state
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('s') => app.submit(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.submit(),
        KeyCode::Tab => {
            let next = match app.controller.view().focus {
                Focus::Input => Focus::Transcript,
                Focus::Transcript => Focus::Input,
            };
            app.controller.set_focus(next);
        }
        KeyCode::PageUp => {
            let page = app.page_height();
            app.scroll_up(page);
        }
        KeyCode::PageDown => {
            let page = app.page_height();
            app.scroll_down(page);
        }
        _ => match app.controller.view().focus {
            Focus::Input => handle_input_key(app, key),
            Focus::Transcript => handle_transcript_key(app, key),
        },
    }
}

fn handle_input_key(app: &mut App, key: KeyEvent) {
    // Editing is a no-op while the controller has the input locked
    match key.code {
        KeyCode::Backspace => app.controller.backspace(),
        KeyCode::Delete => app.controller.delete(),
        KeyCode::Left => app.controller.cursor_left(),
        KeyCode::Right => app.controller.cursor_right(),
        KeyCode::Home => app.controller.cursor_home(),
        KeyCode::End => app.controller.cursor_end(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Char(c) => app.controller.insert_char(c),
        _ => {}
    }
}

fn handle_transcript_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(1),
        KeyCode::Home | KeyCode::Char('g') => app.scroll_up(u16::MAX),
        KeyCode::End | KeyCode::Char('G') => app.scroll_down(u16::MAX),
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        MouseEventKind::Down(MouseButton::Left) => {
            let on_send = app.send_area.is_some_and(|r| point_in_rect(x, y, r));
            let on_chat = app.chat_area.is_some_and(|r| point_in_rect(x, y, r));
            if on_send {
                app.submit();
            } else if on_chat {
                app.controller.set_focus(Focus::Transcript);
            } else {
                app.controller.set_focus(Focus::Input);
            }
        }
        _ => {}
    }
}
