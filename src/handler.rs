use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tracing::debug;
use crate::app::App;
use crate::controller::SubmitOutcome;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {} // Picked up on the next render
        AppEvent::Tick => app.on_tick(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,

        // Transcript scrolling works while a request is in flight
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(app.half_page()),
        KeyCode::PageDown => app.scroll_down(app.half_page()),

        // Input is disabled while pending
        _ if app.session.is_pending() => {}

        KeyCode::Enter => {
            let outcome = app.submit();
            if outcome != SubmitOutcome::Accepted {
                debug!(?outcome, "submission not accepted");
            }
        }
        KeyCode::Backspace => app.session.edit_draft(|d| {
            d.backspace();
        }),
        KeyCode::Delete => app.session.edit_draft(|d| {
            d.delete();
        }),
        KeyCode::Left => app.session.edit_draft(|d| d.move_left()),
        KeyCode::Right => app.session.edit_draft(|d| d.move_right()),
        KeyCode::Home => app.session.edit_draft(|d| d.move_home()),
        KeyCode::End => app.session.edit_draft(|d| d.move_end()),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.session.edit_draft(|d| d.insert(c));
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(3),
        MouseEventKind::ScrollUp => app.scroll_up(3),
        _ => {}
    }
}
