//! Summary chart of running activities by timer status

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::app::App;
use super::utils::get_status_color;

/// Max chars for a bar
const MAX_BAR: usize = 30;

/// Render the summary chart
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let total = app.rows.len();
    let mut lines = Vec::new();

    if total > 0 {
        for (status, count) in app.status_counts() {
            let bar_width = count * MAX_BAR / total;
            let color = get_status_color(status);

            lines.push(Line::from(vec![
                Span::styled(
                    format!("{:8} ", status.as_str()),
                    Style::default().fg(Color::White),
                ),
                Span::styled("█".repeat(bar_width), Style::default().fg(color)),
                Span::styled(format!(" {}", count), Style::default().fg(color)),
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Total: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                total.to_string(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            "Nothing running",
            Style::default().fg(Color::Gray),
        )));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Status ")
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(paragraph, area);
}
