//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::Metric;

/// Render the header bar with the latest reading of every metric.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        " SENSORWATCH ",
        Style::default().add_modifier(Modifier::BOLD),
    )];

    for metric in Metric::ALL {
        let gauge = app.gauge(metric);
        spans.push(Span::raw("│ "));
        if gauge.last_update().is_some() {
            let options = metric.gauge_options();
            spans.push(Span::styled(
                format!("{} {}", options.label.format(gauge.target()), metric.unit()),
                Style::default().fg(options.bands.color_for(gauge.target()).into()),
            ));
        } else {
            spans.push(Span::styled(
                format!("- {}", metric.unit()),
                Style::default().add_modifier(Modifier::DIM),
            ));
        }
        spans.push(Span::raw(" "));
    }

    if app.co2_alarm_active() {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled("● CO2 ALARM", app.theme.alarm_style()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| Line::from(format!(" {}:{} ", i + 1, view.label())))
        .collect();

    let selected = View::ALL
        .iter()
        .position(|&v| v == app.current_view)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the source, time since the last reading, and available controls.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Gauges => "r:refresh e:export Tab:switch ?:help q:quit",
        View::Table => "↑↓:select s:sort S:reverse x:csv Tab:switch ?:help q:quit",
    };

    let latest = Metric::ALL
        .iter()
        .filter_map(|&m| app.gauge(m).last_update())
        .max();

    let status = if let Some(err) = app.source_error() {
        format!(" Error: {} | q:quit", err)
    } else if let Some(t) = latest {
        format!(
            " {} | Updated {:.1}s ago | {}",
            app.source_description(),
            t.elapsed().as_secs_f64(),
            controls
        )
    } else {
        format!(" {} | Waiting for readings... | {}", app.source_description(), controls)
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/→ h/l     Switch views"),
        Line::from("  1/2         Gauges / Table"),
        Line::from("  ↑/↓ j/k     Select table row"),
        Line::from("  PgUp/PgDn   Jump 10 rows"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Table",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from("  x         Export table to CSV"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r         Fetch everything now"),
        Line::from("  e         Export readings to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 25u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
