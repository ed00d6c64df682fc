//! Formatting utilities

use chrono::{DateTime, Utc};

/// Format a timestamp as relative (e.g., "2m ago")
pub fn relative_time(dt: DateTime<Utc>) -> String {
    let now = Utc::now();
    let diff = now.signed_duration_since(dt);

    if diff.num_seconds() < 60 {
        format!("{}s ago", diff.num_seconds().max(0))
    } else if diff.num_minutes() < 60 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_hours() < 24 {
        format!("{}h ago", diff.num_hours())
    } else {
        format!("{}d ago", diff.num_days())
    }
}

/// Hide a secret for display (length hint capped at 12)
pub fn mask(secret: &str) -> String {
    "*".repeat(secret.chars().count().min(12))
}

/// A centered banner line padded with spaces to `width`
pub fn centered(title: &str, width: usize) -> String {
    format!("{:^width$}", title, width = width)
}
