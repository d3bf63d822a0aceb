//! Pattern rules for chat input validation, in evaluation order.
//!
//! Every pattern is compiled by the `regex` crate, whose matching time is
//! linear in the input length. There is no backtracking to exploit, so
//! repetition-heavy inputs cost the same as any other input of that size.
//!
//! Keyword and command lists use ASCII word boundaries (`(?-u)`): non-ASCII
//! letters adjacent to a keyword count as a boundary.

use regex::Regex;

/// Any tag-shaped substring, not just script or style.
pub const HTML_TAG: &str = r"<[^>]*>";

pub const JAVASCRIPT_PROTOCOL: &str = r"(?i)javascript\s*:";

/// `onclick=`, `onerror =` and friends.
pub const EVENT_HANDLER: &str = r"(?i-u)\bon[a-z]+\s*=";

pub const SQL_KEYWORDS: &str = r"(?i-u)\b(?:select|insert|update|delete|drop|union|exec|script|create|alter|truncate|grant|revoke|declare|benchmark|sleep|waitfor)\b";

/// Shell chaining, pipes, substitution and smuggled `\n` escapes.
pub const COMMAND_OPERATORS: &str = r"&&|\|\||\||;|`|\$\(|\$\{|\\n";

/// Command names only count when followed by whitespace, so the bare word
/// used as a noun at the end of a sentence still passes.
pub const FILESYSTEM_COMMANDS: &str = r"(?i-u)\b(?:rm|rmdir|mv|cp|chmod|chown|chgrp|cat|ls|wget|curl|nc|netcat|sudo|kill|pkill|dd|mkfs)\s";

pub const PATH_TRAVERSAL: &str = r"(?i)\.\./|\.\.\\|%2e%2e";

pub const SYSTEM_PATHS: &str = r"(?i)/etc/|/root/|/proc/|/sys/|/dev/|/boot/|/var/log/|/s?bin/|\b[a-z]:\\";

pub const PROMPT_INJECTION: &str = concat!(
    r"(?i)\bignore\s+(?:all\s+|any\s+|the\s+|your\s+)?(?:previous|above|prior|earlier|preceding)\s+(?:instructions?|prompts?|commands?|rules|directions)",
    r"|\bdisregard\s+(?:all\s+|any\s+|the\s+|your\s+)?(?:previous\s+|above\s+|prior\s+|earlier\s+)?(?:instructions?|prompts?|commands?|rules|directions)",
    r"|\bforget\s+(?:all\s+|any\s+|the\s+|your\s+)?(?:previous\s+|above\s+|prior\s+|earlier\s+)?(?:instructions?|prompts?|commands?|rules|directions)",
    r"|\bsystem\s*:",
    r"|<\|[^|]*\|>",
    r"|\[/?inst\]",
    r"|###\s*instruction",
);

/// A named pattern and the message returned when it matches.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub name: &'static str,
    pub message: &'static str,
    regex: Regex,
}

impl PatternRule {
    fn compile(name: &'static str, pattern: &str, message: &'static str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            message,
            regex: Regex::new(pattern)?,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Compile the battery. Cheap, specific rules come first.
pub fn compile_rules() -> Result<Vec<PatternRule>, regex::Error> {
    Ok(vec![
        PatternRule::compile("html_tag", HTML_TAG, "HTML tags are not allowed")?,
        PatternRule::compile(
            "javascript_protocol",
            JAVASCRIPT_PROTOCOL,
            "JavaScript protocol is not allowed",
        )?,
        PatternRule::compile(
            "event_handler",
            EVENT_HANDLER,
            "Event handler attributes are not allowed",
        )?,
        PatternRule::compile(
            "sql_keyword",
            SQL_KEYWORDS,
            "Message contains potentially dangerous SQL keywords",
        )?,
        PatternRule::compile(
            "command_operator",
            COMMAND_OPERATORS,
            "Message contains command injection characters",
        )?,
        PatternRule::compile(
            "filesystem_command",
            FILESYSTEM_COMMANDS,
            "Message contains system commands",
        )?,
        PatternRule::compile(
            "path_traversal",
            PATH_TRAVERSAL,
            "Path traversal sequences are not allowed",
        )?,
        PatternRule::compile("system_path", SYSTEM_PATHS, "System paths are not allowed")?,
        PatternRule::compile(
            "prompt_injection",
            PROMPT_INJECTION,
            "Message contains prompt injection patterns",
        )?,
    ])
}
