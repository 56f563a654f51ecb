//! Message handling for the interactive board

use std::time::{Duration, Instant};

/// How long a message stays in the pane
const MESSAGE_TTL: Duration = Duration::from_secs(10);

/// Message type for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

/// A message to display to the user
#[derive(Debug, Clone)]
pub struct Message {
    pub message_type: MessageType,
    pub text: String,
    pub timestamp: Instant,
}

impl Message {
    pub fn new(message_type: MessageType, text: impl Into<String>) -> Self {
        Self {
            message_type,
            text: text.into(),
            timestamp: Instant::now(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(MessageType::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(MessageType::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(MessageType::Warning, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageType::Error, text)
    }

    /// Errors stay until replaced; everything else expires
    pub fn is_expired(&self) -> bool {
        self.message_type != MessageType::Error && self.timestamp.elapsed() > MESSAGE_TTL
    }

    pub fn icon(&self) -> &str {
        match self.message_type {
            MessageType::Info => "ℹ",
            MessageType::Success => "✓",
            MessageType::Warning => "⚠",
            MessageType::Error => "✗",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_message_is_not_expired() {
        assert!(!Message::info("Loaded").is_expired());
    }

    #[test]
    fn test_errors_never_expire() {
        let mut msg = Message::error("Backend unreachable");
        if let Some(past) = Instant::now().checked_sub(MESSAGE_TTL * 2) {
            msg.timestamp = past;
            assert!(!msg.is_expired());

            let mut info = Message::info("old");
            info.timestamp = past;
            assert!(info.is_expired());
        }
    }
}

// Made with Bob
