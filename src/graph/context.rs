//! Context injection for specialist invocations
//!
//! Every specialist call gets one extra system entry carrying the exact
//! active file path and the termination contract. Unconstrained specialist
//! loops tend to either ask the user for confirmation or keep re-running
//! tools; this injected contract is the enforcement mechanism. The entry is
//! payload only — it is excluded from the committed delta.

use crate::core::Message;

/// Build the injected context entry for a specialist invocation
pub fn context_message(data_path: Option<&str>) -> Message {
    let current = data_path.unwrap_or("No file uploaded");

    Message::system(format!(
        "IMPORTANT: The currently active data file path is: {current}.\n\
         This is the authoritative path. You MUST use this EXACT string for all tool \
         'file_path' arguments. No relative paths, no guessing.\n\
         \n\
         INSTRUCTIONS:\n\
         1. If you use 'clean_data', it will save a new file (identifiable by '_cleaned' \
         in the path).\n\
         2. If you see high correlations in 'perform_eda', use 'clean_data' ONCE more with \
         'drop_columns' (using the SUGGESTED DROPS from the EDA report) to fix them.\n\
         3. Once you have performed your specific task, summarize what was done in one \
         declarative sentence and then FINISH YOUR TURN.\n\
         4. REPORT: 'Task Complete. Data is ready for [Next Step].'\n\
         5. FORBIDDEN: Do NOT ask the user 'How would you like to proceed?'. Do NOT say \
         'Let me know'. Just report facts and exit.\n\
         6. DO NOT loop indefinitely. Perform the action, summarize, and exit."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_carries_exact_path() {
        let msg = context_message(Some("/data/sales_cleaned.csv"));
        assert_eq!(msg.role, "system");
        assert!(msg.content.contains("/data/sales_cleaned.csv"));
        assert!(msg.content.contains("EXACT string"));
    }

    #[test]
    fn test_context_without_upload() {
        let msg = context_message(None);
        assert!(msg.content.contains("No file uploaded"));
    }

    #[test]
    fn test_context_forbids_questions() {
        let msg = context_message(Some("x.csv"));
        assert!(msg.content.contains("FORBIDDEN"));
        assert!(msg.content.contains("FINISH YOUR TURN"));
    }
}
