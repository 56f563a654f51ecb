//! Utility functions for the interactive board

use super::messages::MessageType;
use crate::activity::TimerStatus;
use ratatui::style::{Color, Modifier, Style};

/// Map an activity type's color name to a terminal color
pub fn get_activity_color(color: &str) -> Color {
    match color.to_lowercase().as_str() {
        "red" | "rose" => Color::Red,
        "amber" | "yellow" | "orange" => Color::Yellow,
        "green" | "emerald" | "lime" => Color::Green,
        "blue" | "sky" => Color::Blue,
        "indigo" | "violet" | "purple" => Color::Magenta,
        "pink" | "fuchsia" => Color::LightMagenta,
        "teal" | "cyan" => Color::Cyan,
        "slate" | "gray" | "grey" | "zinc" => Color::Gray,
        _ => Color::White,
    }
}

pub fn get_status_color(status: TimerStatus) -> Color {
    match status {
        TimerStatus::Normal => Color::Green,
        TimerStatus::Warning => Color::Yellow,
        TimerStatus::Urgent => Color::Red,
    }
}

/// Urgent rows blink so they stand out from across the room
pub fn get_status_style(status: TimerStatus) -> Style {
    let style = Style::default().fg(get_status_color(status));
    match status {
        TimerStatus::Normal => style,
        TimerStatus::Warning => style.add_modifier(Modifier::BOLD),
        TimerStatus::Urgent => style.add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
    }
}

pub fn get_status_symbol(status: TimerStatus) -> &'static str {
    match status {
        TimerStatus::Normal => "●",
        TimerStatus::Warning => "▲",
        TimerStatus::Urgent => "■",
    }
}

/// Get style for message type
pub fn get_message_style(message_type: MessageType) -> Style {
    match message_type {
        MessageType::Info => Style::default().fg(Color::Cyan),
        MessageType::Success => Style::default().fg(Color::Green),
        MessageType::Warning => Style::default().fg(Color::Yellow),
        MessageType::Error => Style::default().fg(Color::Red),
    }
}


// Made with Bob
