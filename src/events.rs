use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, View};

/// File written by the `e` key.
pub const READINGS_EXPORT_FILE: &str = "sensorwatch_readings.json";
/// File written by the `x` key.
pub const TABLE_EXPORT_FILE: &str = "sensorwatch_table.csv";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Gauges),
        KeyCode::Char('2') => app.set_view(View::Table),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),

        // Table navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Char('s') if app.current_view == View::Table => app.cycle_sort(),
        KeyCode::Char('S') if app.current_view == View::Table => app.toggle_sort_direction(),

        KeyCode::Char('r') => app.force_refresh(),
        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let path = PathBuf::from(READINGS_EXPORT_FILE);
            match app.export_readings(&path) {
                Ok(()) => app.set_status_message(format!("Exported to {}", path.display())),
                Err(e) => app.set_status_message(format!("Export failed: {}", e)),
            }
        }
        KeyCode::Char('x') => {
            let path = PathBuf::from(TABLE_EXPORT_FILE);
            match app.export_table_csv(&path) {
                Ok(()) => app.set_status_message(format!("Exported to {}", path.display())),
                Err(e) => app.set_status_message(format!("Export failed: {}", e)),
            }
        }

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),
        MouseEventKind::Down(_) if mouse.row == 1 => {
            // Tab positions: " 1:Gauges " (0-10), " 2:Table " (11-21)
            if mouse.column < 11 {
                app.set_view(View::Gauges);
            } else if mouse.column < 22 {
                app.set_view(View::Table);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::TableSnapshot;
    use crate::source::ChannelSource;
    use crossterm::event::{KeyEventKind, KeyEventState, MouseButton};
    use std::time::Instant;

    fn app() -> App {
        let (_tx, source) = ChannelSource::create("test");
        App::new(Box::new(source), &DashboardConfig::default())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.running);
    }

    #[test]
    fn test_help_swallows_next_key() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('?')));
        assert!(app.show_help);
        handle_key_event(&mut app, key(KeyCode::Char('q')));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn test_view_keys() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('2')));
        assert_eq!(app.current_view, View::Table);
        handle_key_event(&mut app, key(KeyCode::Tab));
        assert_eq!(app.current_view, View::Gauges);
    }

    #[test]
    fn test_sort_keys_only_in_table_view() {
        let mut app = app();
        app.apply_table_update(
            TableSnapshot::from_json(r#"{"data": [{"a": 1, "b": 2}]}"#),
            Instant::now(),
        );

        handle_key_event(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.table_state.sort_column, 0);

        app.set_view(View::Table);
        handle_key_event(&mut app, key(KeyCode::Char('s')));
        assert_eq!(app.table_state.sort_column, 1);
        handle_key_event(&mut app, key(KeyCode::Char('S')));
        assert!(!app.table_state.ascending);
    }

    #[test]
    fn test_refresh_without_poller_sets_status() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Char('r')));
        assert_eq!(app.get_status_message(), Some("Refreshing..."));
    }

    #[test]
    fn test_tab_click() {
        let mut app = app();
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 14,
            row: 1,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse_event(&mut app, click);
        assert_eq!(app.current_view, View::Table);
    }
}
