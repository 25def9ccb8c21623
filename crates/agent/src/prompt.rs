//! System prompt defaults.

/// Prefixed to the user message when the session runs in dry-run mode.
pub const DRY_RUN_TAG: &str = "[DRY RUN MODE ENABLED] ";

/// Used when neither the config file nor `BASH_SYSTEM_PROMPT` provides one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant that can execute bash commands and assist with running command-line tooling.
When running in dry run mode, you should explain what commands you would execute and their expected effects,
but note that they won't actually be run. Format your dry run explanations clearly, starting with \"🔍 Dry Run:\"
followed by the explanation of what would happen if the commands were executed.";

/// The user message as sent to the provider.
pub fn tag_user_message(message: &str, dry_run: bool) -> String {
    if dry_run {
        format!("{DRY_RUN_TAG}{message}")
    } else {
        message.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_tag_is_prefixed() {
        assert_eq!(
            tag_user_message("list files", true),
            "[DRY RUN MODE ENABLED] list files"
        );
        assert_eq!(tag_user_message("list files", false), "list files");
    }

    #[test]
    fn default_prompt_mentions_dry_run_marker() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains(bashpilot_tools::DRY_RUN_MARKER));
    }
}
