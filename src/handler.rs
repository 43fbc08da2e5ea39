use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::api::{ChatClient, ChatError};
use crate::app::App;
use crate::tui::AppEvent;

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, client: &ChatClient, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, client, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, client, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            reap_pending(app).await;
            reap_health(app).await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, client: &ChatClient, key: KeyEvent) {
    // Quit from any state
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // Plain Enter submits. Enter with a modifier held is reserved for
        // multi-line input and must not submit.
        KeyCode::Enter => {
            if key.modifiers.is_empty() {
                submit(app, client);
            }
        }

        // Transcript scrolling
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::PageUp => app.scroll_page_up(),
        KeyCode::PageDown => app.scroll_page_down(),

        // Input editing
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(c) => {
            // Control/alt chords are key bindings, not input
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT)
            {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.insert(byte_pos, c);
                app.cursor += 1;
            }
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, client: &ChatClient, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let on_send = app
                .send_area
                .map(|r| point_in_rect(mouse.column, mouse.row, r))
                .unwrap_or(false);
            if on_send {
                submit(app, client);
            }
        }
        MouseEventKind::ScrollUp => app.scroll_up(),
        MouseEventKind::ScrollDown => app.scroll_down(),
        _ => {}
    }
}

/// Run the submission lifecycle: validate/append via begin_send, then
/// dispatch the request on a background task. begin_send's guard makes this
/// a no-op for empty input or while a request is already in flight.
fn submit(app: &mut App, client: &ChatClient) {
    let raw = app.input.clone();
    if let Some(message) = app.begin_send(&raw) {
        let client = client.clone();
        app.pending = Some(tokio::spawn(async move { client.send(&message).await }));
    }
}

/// Settle the in-flight request once its task has finished. A task that
/// died without producing a result settles through the same error path, so
/// the busy state is always released.
async fn reap_pending(app: &mut App) {
    let finished = app.pending.as_ref().is_some_and(|t| t.is_finished());
    if !finished {
        return;
    }

    if let Some(task) = app.pending.take() {
        let result = match task.await {
            Ok(result) => result,
            Err(err) => Err(ChatError::Task(err)),
        };
        app.finish_send(result);
    }
}

async fn reap_health(app: &mut App) {
    let finished = app.health_probe.as_ref().is_some_and(|t| t.is_finished());
    if !finished {
        return;
    }

    if let Some(task) = app.health_probe.take() {
        let result = match task.await {
            Ok(result) => result,
            Err(err) => Err(ChatError::Task(err)),
        };
        app.settle_health(result);
    }
}
