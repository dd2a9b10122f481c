//! Result extraction: artifact paths from specialist output
//!
//! Tools announce new artifacts with a `saved to: <path>` phrase. The scan
//! runs over the newly produced messages only, most recent first, and the
//! most recent declaration wins; with no marker the pointer is carried over
//! unchanged.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::Message;

/// Case-insensitive marker followed by a path ending in a recognized
/// dataset extension
static SAVE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)saved to:\s*(.+?\.csv)\b").expect("save marker regex is valid")
});

/// Find the authoritative artifact path announced in a batch of new messages
///
/// Scans messages newest-first; within one message the last marker wins.
pub fn extract_saved_path(new_messages: &[Message]) -> Option<String> {
    for message in new_messages.iter().rev() {
        if let Some(capture) = SAVE_MARKER
            .captures_iter(&message.content)
            .last()
            .and_then(|c| c.get(1))
        {
            return Some(capture.as_str().trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_marker_returns_none() {
        let messages = vec![
            Message::assistant("All finished, nothing was written."),
            Message::tool("EDA Report: shape (10, 3)"),
        ];
        assert_eq!(extract_saved_path(&messages), None);
    }

    #[test]
    fn test_single_marker() {
        let messages = vec![Message::tool(
            "Data cleaning complete. Saved to: /tmp/data_cleaned.csv. Handled nulls.",
        )];
        assert_eq!(
            extract_saved_path(&messages),
            Some("/tmp/data_cleaned.csv".to_string())
        );
    }

    #[test]
    fn test_most_recent_message_wins() {
        let messages = vec![
            Message::tool("Saved to: /tmp/old_cleaned.csv."),
            Message::tool("Results saved to: /tmp/new_clustered.csv."),
        ];
        assert_eq!(
            extract_saved_path(&messages),
            Some("/tmp/new_clustered.csv".to_string())
        );
    }

    #[test]
    fn test_last_marker_within_one_message_wins() {
        let messages = vec![Message::tool(
            "First pass saved to: /tmp/a_cleaned.csv. Second pass saved to: /tmp/b_cleaned.csv.",
        )];
        assert_eq!(
            extract_saved_path(&messages),
            Some("/tmp/b_cleaned.csv".to_string())
        );
    }

    #[test]
    fn test_case_insensitive_marker() {
        let messages = vec![Message::tool("results SAVED TO: /tmp/out.csv")];
        assert_eq!(extract_saved_path(&messages), Some("/tmp/out.csv".to_string()));
    }

    #[test]
    fn test_unrecognized_extension_ignored() {
        let messages = vec![Message::tool("Chart saved to: /tmp/plot.png")];
        assert_eq!(extract_saved_path(&messages), None);
    }
}
