//! Chat and username sanitisers for relayed messages (spec §4.6, §8).

const MAX_USERNAME_LEN: usize = 16;
const TRUNCATION_SUFFIX: &str = "...";

/// Sanitises an inbound chat message before relaying it to the game.
///
/// Mentions and custom emoji are rewritten to plain-text placeholders,
/// quote/backslash/control characters are stripped or replaced, runs of
/// whitespace are collapsed, and the result is truncated to `max_len`
/// with the final 3 characters replaced by `"..."` if it overflows.
pub fn sanitize_message(content: &str, max_len: usize) -> String {
    let mentions_rewritten = rewrite_mentions(content);
    let quotes_removed = mentions_rewritten.replace('"', "'").replace('\\', "");
    let newlines_collapsed = quotes_removed.replace(['\n', '\r'], " ");
    let collapsed = collapse_whitespace(&newlines_collapsed);
    let trimmed = collapsed.trim();

    truncate(trimmed, max_len)
}

/// Sanitises a chat-platform display name before using it as the RC
/// `discordmsg` author.
pub fn sanitize_username(name: &str) -> String {
    let filtered: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let truncated: String = filtered.chars().take(MAX_USERNAME_LEN).collect();
    let trimmed = truncated.trim();

    if trimmed.is_empty() {
        "Discord".to_string()
    } else {
        trimmed.to_string()
    }
}

fn rewrite_mentions(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let bytes = content.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some(end) = content[i..].find('>') {
                let token = &content[i..i + end + 1];
                if let Some(replacement) = rewrite_token(token) {
                    out.push_str(&replacement);
                    i += end + 1;
                    continue;
                }
            }
        }
        // Safe: operating on char boundaries via the original string.
        let ch = content[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

fn rewrite_token(token: &str) -> Option<String> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;

    if let Some(rest) = inner.strip_prefix("@&") {
        if is_snowflake(rest) {
            return Some("[role]".to_string());
        }
    }
    if let Some(rest) = inner.strip_prefix("@!") {
        if is_snowflake(rest) {
            return Some("[mention]".to_string());
        }
    }
    if let Some(rest) = inner.strip_prefix('@') {
        if is_snowflake(rest) {
            return Some("[mention]".to_string());
        }
    }
    if let Some(rest) = inner.strip_prefix('#') {
        if is_snowflake(rest) {
            return Some("[channel]".to_string());
        }
    }
    if let Some(rest) = inner.strip_prefix("a:").or_else(|| inner.strip_prefix(':')) {
        let mut parts = rest.rsplitn(2, ':');
        let id = parts.next()?;
        let name = parts.next()?;
        if is_snowflake(id) && !name.is_empty() {
            return Some(format!(":{name}:"));
        }
    }

    None
}

fn is_snowflake(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;

    for ch in s.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }

    out
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }

    let keep = max_len.saturating_sub(TRUNCATION_SUFFIX.len());
    let mut truncated: String = s.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_user_mentions() {
        assert_eq!(sanitize_message("hi <@12345>", 256), "hi [mention]");
        assert_eq!(sanitize_message("hi <@!12345>", 256), "hi [mention]");
    }

    #[test]
    fn rewrites_role_and_channel_mentions() {
        assert_eq!(sanitize_message("<@&999> <#111>", 256), "[role] [channel]");
    }

    #[test]
    fn rewrites_custom_emoji() {
        assert_eq!(sanitize_message("<:pog:123456> nice", 256), ":pog: nice");
        assert_eq!(sanitize_message("<a:pogg:123456> nice", 256), ":pogg: nice");
    }

    #[test]
    fn strips_quotes_and_backslashes_and_newlines() {
        let sanitized = sanitize_message("say \"hi\\there\"\nline2\r", 256);
        assert!(!sanitized.contains('"'));
        assert!(!sanitized.contains('\\'));
        assert!(!sanitized.contains('\n'));
        assert!(!sanitized.contains('\r'));
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(sanitize_message("a     b\t\tc", 256), "a b c");
    }

    #[test]
    fn truncates_long_messages_with_ellipsis() {
        let long = "a".repeat(300);
        let sanitized = sanitize_message(&long, 256);
        assert_eq!(sanitized.chars().count(), 256);
        assert!(sanitized.ends_with("..."));
    }

    #[test]
    fn username_sanitiser_keeps_allowed_characters_and_truncates() {
        assert_eq!(sanitize_username("Steve_123"), "Steve_123");
        assert_eq!(sanitize_username("a!@#$%^&*()b"), "ab");
        assert_eq!(sanitize_username("ThisNameIsWayTooLongForTheGame"), "ThisNameIsWayToo");
    }

    #[test]
    fn username_sanitiser_falls_back_to_discord_when_empty() {
        assert_eq!(sanitize_username("!@#$%"), "Discord");
    }
}
