//! Table view rendering.
//!
//! Shows the rows loaded from the table endpoint, sorted by the persisted sort
//! column.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;

/// Render the table view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let Some(ref data) = app.table else {
        let message = match app.table_error {
            Some(ref err) => format!(" Table unavailable: {}", err),
            None => " Loading table...".to_string(),
        };
        let style = if app.table_error.is_some() {
            Style::default().fg(app.theme.error)
        } else {
            Style::default()
        };
        frame.render_widget(
            Paragraph::new(message).style(style).block(block.title(" History ")),
            area,
        );
        return;
    };

    let sort_column = app.table_state.sort_column;
    let ascending = app.table_state.ascending;
    let arrow = if ascending { "↑" } else { "↓" };

    let header = Row::new(data.columns.iter().enumerate().map(|(i, name)| {
        if i == sort_column {
            Cell::from(format!("{}{}", name, arrow))
        } else {
            Cell::from(name.clone())
        }
    }))
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = data
        .sorted_rows(sort_column, ascending)
        .into_iter()
        .map(|cells| Row::new(cells.iter().map(|c| Cell::from(c.clone()))))
        .collect();

    let widths = vec![Constraint::Fill(1); data.columns.len().max(1)];

    let selected = app.selected_row.min(data.rows.len().saturating_sub(1));
    let position = if data.is_empty() {
        String::new()
    } else {
        format!(" [{}/{}]", selected + 1, data.rows.len())
    };

    let loaded = app
        .table_loaded_at
        .map(|t| format!(", loaded {:.0}s ago", t.elapsed().as_secs_f64()))
        .unwrap_or_default();

    let mut title = vec![Span::raw(format!(
        " History ({} rows{}){} [s:sort S:reverse x:csv] ",
        data.rows.len(),
        loaded,
        position
    ))];
    if let Some(ref err) = app.table_error {
        title.push(Span::styled(
            format!(" reload failed: {} ", err),
            Style::default().fg(app.theme.error),
        ));
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(block.title(ratatui::text::Line::from(title)))
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !data.is_empty() {
        state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
