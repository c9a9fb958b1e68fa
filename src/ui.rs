//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a three-row split: the panel (icon + count) on top, an
//!   empty body that hosts the alert popup, and a one-line status bar.
//! * When the display state says the panel is hidden, nothing is drawn in
//!   its place.
//! * [`ratatui`] is the TUI framework; see its docs for widget details.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

/// Draw the complete UI for one frame.
pub fn draw(app: &App, frame: &mut Frame) {
    let [panel_area, body_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    if app.display.visible {
        draw_panel(app, frame, panel_area);
    }
    if app.paused {
        let paused = Paragraph::new("Polling paused (space to resume)")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        frame.render_widget(paused, body_area);
    }
    if let Some(alert) = &app.alert {
        draw_alert(frame, body_area, &alert.title, &alert.message);
    }
    draw_status_bar(app, frame, status_area);
}

/// The panel widget: icon plus count label (or the error glyph).
fn draw_panel(app: &App, frame: &mut Frame, area: Rect) {
    let display = &app.display;
    let mut spans = vec![Span::styled(" ● ", Style::default().fg(Color::White))];

    if display.count_visible {
        let style = if display.error_glyph {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else if display.count > 0 {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Green)
        };
        spans.push(Span::styled(display.label(), style));
    }

    let panel = Paragraph::new(Line::from(spans))
        .block(Block::default().title(" GitHub ").borders(Borders::ALL));
    let width = area.width.min(24);
    frame.render_widget(panel, Rect { width, ..area });
}

/// A centred popup over the body.
fn draw_alert(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let popup = centered(area, 44, 5);
    let body = Paragraph::new(vec![
        Line::from(Span::styled(message, Style::default().fg(Color::White))),
        Line::from(Span::styled(
            "Enter: open  x: dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(Clear, popup);
    frame.render_widget(body, popup);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  q: quit  o: open  r: refresh  space: pause  p: settings"),
    ]));
    frame.render_widget(status, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
