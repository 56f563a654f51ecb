//! Table of running activities

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::app::App;
use super::utils::{get_activity_color, get_status_style, get_status_symbol};
use crate::utils::{format_elapsed, format_minutes, progress_bar, truncate_string};

const BAR_WIDTH: usize = 20;

/// Render the board
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Active ({}) ", app.rows.len()))
        .border_style(Style::default().fg(Color::Cyan));

    if app.rows.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No dogs are out. Press 's' to start an activity.",
            Style::default().fg(Color::Gray),
        )))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(vec![
        Cell::from(""),
        Cell::from("Dog"),
        Cell::from("Activity"),
        Cell::from("Elapsed"),
        Cell::from("Progress"),
        Cell::from("Next"),
    ])
    .style(Style::default().add_modifier(Modifier::BOLD).fg(Color::White));

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|row| {
            let status_style = get_status_style(row.timer.status);
            let next = match row.timer.minutes_to_next_threshold {
                Some(m) => format!("in {}", format_minutes(m)),
                None if row.timer.overdue_minutes > 0 => {
                    format!("+{} over", format_minutes(row.timer.overdue_minutes))
                }
                None => "due".to_string(),
            };

            Row::new(vec![
                Cell::from(get_status_symbol(row.timer.status)).style(status_style),
                Cell::from(truncate_string(&row.activity.dog_id, 16)),
                Cell::from(truncate_string(&row.definition.label, 18))
                    .style(Style::default().fg(get_activity_color(&row.definition.color))),
                Cell::from(format_elapsed(row.timer.elapsed_seconds)).style(status_style),
                Cell::from(progress_bar(row.timer.progress, BAR_WIDTH)).style(status_style),
                Cell::from(next),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(17),
            Constraint::Length(19),
            Constraint::Length(9),
            Constraint::Length(BAR_WIDTH as u16 + 1),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(Style::default().bg(Color::DarkGray))
    .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(app.selected_index());
    f.render_stateful_widget(table, area, &mut state);
}

// Made with Bob
