use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Utility functions for k9track

// ===== STRING UTILITIES =====

/// Masks an API key for safe logging (shows first 4 characters, masks the rest)
pub fn mask_api_key(api_key: &str) -> String {
    let visible: String = api_key.chars().take(4).collect();
    let hidden = api_key.chars().count().saturating_sub(4);
    if hidden == 0 {
        "*".repeat(visible.chars().count())
    } else {
        format!("{}{}", visible, "*".repeat(hidden))
    }
}

/// Truncates a string to a display width, adding "..." if truncated
pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let budget = max_width - 3;
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push_str("...");
    out
}

/// Pads a string with spaces to a display width
pub fn pad_to_width(s: &str, width: usize) -> String {
    let current = s.width();
    if current >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - current))
    }
}

/// Checks if a string is empty or contains only whitespace
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

// ===== TIME UTILITIES =====

/// Formats elapsed seconds as HH:MM:SS (hours are not capped at 24)
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Formats a minute count for humans: "45m", "2h", "3h 05m"
pub fn format_minutes(minutes: i64) -> String {
    let minutes = minutes.max(0);
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {:02}m", h, m),
    }
}

/// Renders a text progress bar, e.g. `[######----]`
pub fn progress_bar(fraction: f64, width: usize) -> String {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let filled = (fraction * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("abcdefgh"), "abcd****");
        assert_eq!(mask_api_key("abc"), "***");
        assert_eq!(mask_api_key(""), "");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Bella", 10), "Bella");
        assert_eq!(truncate_string("Group Play Session", 10), "Group P...");
        assert_eq!(truncate_string("abcdef", 2), "..");
        assert_eq!(truncate_string("犬犬犬犬犬", 7), "犬犬...");
    }

    #[test]
    fn test_pad_to_width() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("abcd", 2), "abcd");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00:00");
        assert_eq!(format_elapsed(25 * 60 + 7), "00:25:07");
        assert_eq!(format_elapsed(26 * 3600), "26:00:00");
        assert_eq!(format_elapsed(-10), "00:00:00");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(120), "2h");
        assert_eq!(format_minutes(185), "3h 05m");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.5, 10), "[#####-----]");
        assert_eq!(progress_bar(3.0, 4), "[####]");
        assert_eq!(progress_bar(f64::NAN, 4), "[----]");
        assert!(is_blank("   "));
    }
}
