//! Gauge view rendering.
//!
//! One bordered panel per metric: a bar gauge filled to the current value in
//! the value's band color, and a trend line underneath.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::{AnimationStatus, BandSet, Metric};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the gauges view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let rows = Layout::vertical([Constraint::Ratio(1, 3); 3]).split(area);
    for (metric, row) in Metric::ALL.into_iter().zip(rows.iter()) {
        render_gauge(frame, app, metric, *row);
    }
}

fn render_gauge(frame: &mut Frame, app: &App, metric: Metric, area: Rect) {
    let gauge = app.gauge(metric);
    let band = gauge.band();
    let fill: Color = band.color.into();

    let mut title = vec![Span::styled(
        format!(" {} ({}) ", metric.label(), metric.unit()),
        app.theme.header,
    )];
    if metric == Metric::Co2 && app.co2_alarm_active() {
        title.push(Span::styled(" ALARM ", app.theme.alarm_style()));
    }

    let block = Block::default()
        .title(Line::from(title))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);

    let label = Span::styled(
        format!("{} {}", gauge.label(), metric.unit()),
        Style::default().add_modifier(Modifier::BOLD),
    );
    let widget = Gauge::default()
        .gauge_style(Style::default().fg(fill).bg(app.theme.gauge_track))
        .ratio(gauge.ratio())
        .label(label)
        .use_unicode(true);
    frame.render_widget(widget, parts[0]);

    let width = parts[1].width.saturating_sub(40) as usize;
    let mut spans = sparkline_spans(
        &app.history.sparkline(metric, gauge.max()),
        &app.history.values(metric),
        &metric.gauge_options().bands,
        width,
    );

    let rate = app
        .history
        .rate_per_minute(metric)
        .map(|r| format!("{:+.1}/min", r))
        .unwrap_or_else(|| "-".to_string());

    let updated = match gauge.last_update() {
        Some(t) => format!("{:.0}s ago", t.elapsed().as_secs_f64()),
        None => "waiting".to_string(),
    };

    let marker = match gauge.status() {
        AnimationStatus::Animating => "~",
        AnimationStatus::Idle => " ",
    };

    spans.push(Span::raw(format!(
        " {} {:<10} {:<11} {}",
        marker, band.name, rate, updated
    )));
    let info = Line::from(spans);
    frame.render_widget(
        Paragraph::new(info).style(Style::default().add_modifier(Modifier::DIM)),
        parts[1],
    );
}

/// The most recent `width` points as sparkline cells, each colored by the
/// band of its own value, padded with spaces.
fn sparkline_spans(
    levels: &[u8],
    values: &[f64],
    bands: &BandSet,
    width: usize,
) -> Vec<Span<'static>> {
    let start = levels.len().saturating_sub(width);
    let mut spans: Vec<Span<'static>> = levels[start..]
        .iter()
        .zip(&values[values.len().saturating_sub(levels.len() - start)..])
        .map(|(&level, &value)| {
            Span::styled(
                SPARKLINE_CHARS[level.min(7) as usize].to_string(),
                Style::default().fg(bands.color_for(value).into()),
            )
        })
        .collect();

    let drawn = spans.len();
    if drawn < width {
        spans.push(Span::raw(" ".repeat(width - drawn)));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::band::CO2_BANDS;
    use crate::data::Rgb;

    fn text(spans: &[Span]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_sparkline_pads() {
        assert_eq!(text(&sparkline_spans(&[], &[], &CO2_BANDS, 3)), "   ");
        assert_eq!(
            text(&sparkline_spans(&[0, 7], &[100.0, 2500.0], &CO2_BANDS, 4)),
            "▁█  "
        );
    }

    #[test]
    fn test_sparkline_keeps_latest() {
        let values = [0.0, 400.0, 700.0, 1000.0, 2500.0];
        let spans = sparkline_spans(&[0, 1, 2, 3, 9], &values, &CO2_BANDS, 3);
        assert_eq!(text(&spans), "▃▄█");
    }

    #[test]
    fn test_sparkline_colors_each_point_by_band() {
        let values = [250.0, 900.0, 1700.0];
        let spans = sparkline_spans(&[1, 2, 5], &values, &CO2_BANDS, 3);

        let colors: Vec<Option<Color>> = spans.iter().map(|s| s.style.fg).collect();
        let expected: Vec<Option<Color>> = vec![
            Some(Rgb(0xff, 0xff, 0xff).into()),
            Some(Rgb(0xff, 0x91, 0x00).into()),
            Some(Rgb(0xa1, 0x00, 0x0b).into()),
        ];
        assert_eq!(colors, expected);
    }
}
