//! Main UI rendering logic

use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::app::{App, AppMode};
use super::form::{FormField, StartForm};
use super::messages::MessageType;
use super::utils::{get_activity_color, get_message_style};
use super::{board_view, summary_chart};
use crate::utils::format_minutes;

/// Main draw function
pub fn draw(f: &mut Frame, app: &App) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Main content
            Constraint::Length(5), // Messages
            Constraint::Length(3), // Footer
        ])
        .split(size);

    render_header(f, app, chunks[0]);

    match app.mode {
        AppMode::Help => render_help(f, chunks[1]),
        _ => render_main_content(f, app, chunks[1]),
    }

    render_messages(f, app, chunks[2]);
    render_footer(f, app, chunks[3]);

    if let (AppMode::StartActivity, Some(form)) = (app.mode, app.form.as_ref()) {
        render_start_form(f, form, size);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let title = format!(
        " K9 Track - {} [{}] - {} ",
        app.workflow.facility_id(),
        app.workflow.backend_name(),
        app.now.with_timezone(&Local).format("%H:%M:%S")
    );
    let header = Paragraph::new(title)
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

    f.render_widget(header, area);
}

fn render_main_content(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(7), Constraint::Length(5)])
        .split(area);

    board_view::render(f, app, chunks[0]);
    summary_chart::render(f, app, chunks[1]);
    render_details(f, app, chunks[2]);
}

/// Details of the selected activity
fn render_details(f: &mut Frame, app: &App, area: Rect) {
    let lines = match app.selected_row() {
        Some(row) => {
            let def = &row.definition;
            vec![
                Line::from(vec![
                    Span::styled(
                        format!("{} ", row.activity.dog_id),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("{} ({})", def.label, def.code),
                        Style::default().fg(get_activity_color(&def.color)),
                    ),
                    Span::raw(format!(
                        "  warn {} / max {}",
                        format_minutes(def.warning_minutes),
                        format_minutes(def.max_minutes)
                    )),
                ]),
                Line::from(format!(
                    "Started {}",
                    row.activity
                        .started_at
                        .with_timezone(&Local)
                        .format("%H:%M")
                )),
                Line::from(Span::styled(
                    row.activity.notes.clone().unwrap_or_default(),
                    Style::default().fg(Color::Gray),
                )),
            ]
        }
        None => vec![Line::from(Span::styled(
            "No activity selected",
            Style::default().fg(Color::Gray),
        ))],
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Details ")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let section = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        ))
    };

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Cyan),
        )),
        Line::from(""),
        section("Board:"),
        Line::from("  ↑/↓ or k/j    Select activity"),
        Line::from("  s or a        Start an activity"),
        Line::from("  x or Enter    Stop selected activity"),
        Line::from("  r             Reload from backend"),
        Line::from(""),
        section("Start form:"),
        Line::from("  Tab/Shift+Tab Move between fields"),
        Line::from("  ↑/↓ or 1-9    Pick activity type"),
        Line::from("  Enter         Start"),
        Line::from("  Esc           Cancel"),
        Line::from(""),
        section("General:"),
        Line::from("  q or Esc      Quit"),
        Line::from("  ? or h        Show this help"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to return...",
            Style::default().fg(Color::Gray),
        )),
    ];

    let paragraph = Paragraph::new(help_text).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Help ")
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(paragraph, area);
}

fn render_messages(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    let recent_messages: Vec<_> = app.messages.iter().rev().take(3).collect();
    for msg in recent_messages.iter().rev() {
        let mut style = get_message_style(msg.message_type);
        if app.mode == AppMode::StopConfirm && msg.message_type == MessageType::Warning {
            style = style.add_modifier(Modifier::SLOW_BLINK);
        }

        lines.push(Line::from(vec![
            Span::styled(format!("{} ", msg.icon()), style),
            Span::styled(msg.text.as_str(), style),
        ]));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "Ready",
            Style::default().fg(Color::Gray),
        )));
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Messages ")
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.mode {
        AppMode::Normal => "[↑↓] Select  [s]tart  [x] Stop  [r]eload  [?] help  [q]uit",
        AppMode::StartActivity => "[Tab] Next field  [Enter] Start  [Esc] Cancel",
        AppMode::StopConfirm => "[y] Confirm  [n/Esc] Cancel",
        AppMode::Help => "Press any key to return",
    };

    let footer = Paragraph::new(shortcuts)
        .style(Style::default().fg(Color::Gray))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

    f.render_widget(footer, area);
}

/// Centered popup holding the start form
fn render_start_form(f: &mut Frame, form: &StartForm, area: Rect) {
    let width = 56.min(area.width);
    let height = (form.options.len() as u16 + 8).min(area.height);
    let popup = Rect {
        x: area.width.saturating_sub(width) / 2,
        y: area.height.saturating_sub(height) / 2,
        width,
        height,
    };

    let mut lines = Vec::new();
    for field in FormField::all() {
        let focused = field == form.current_field;
        let label_style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let value = form.field_value(field);
        let cursor = if focused && field != FormField::ActivityType {
            "_"
        } else {
            ""
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{:9}", format!("{}:", field.label())), label_style),
            Span::raw(format!("{}{}", value, cursor)),
        ]));

        if field == FormField::ActivityType && focused {
            for (i, option) in form.options.iter().enumerate() {
                let marker = if i == form.selected_type { "▶" } else { " " };
                lines.push(Line::from(Span::styled(
                    format!("  {} {} {}", marker, i + 1, option.label),
                    Style::default().fg(get_activity_color(&option.color)),
                )));
            }
        }
    }

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Start Activity ")
            .border_style(Style::default().fg(Color::Yellow))
            .style(Style::default().bg(Color::Black)),
    );

    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

// Made with Bob
