//! Log sanitization: strips patient identity from formatted log lines.
//!
//! Reports are bound to an owner (the account name). Log lines must never
//! carry that binding together with symptoms or diagnoses, so every line
//! written by the subscriber passes through [`sanitize`], which redacts:
//! - `owner=`/`user=`/`username=` values
//! - e-mail addresses and phone numbers
//! - UUIDs
//! - base64 key material (artifact signing seeds)
//!
//! Callers should still avoid logging identities in the first place; this is
//! the last line before the sink.

use std::sync::OnceLock;

use regex::Regex;
use tracing_subscriber::fmt::MakeWriter;

/// Maximum number of bytes sanitized per line; the rest is dropped.
const MAX_LINE_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    replacement: &'static str,
}

static RULES: OnceLock<Vec<Rule>> = OnceLock::new();

fn rules() -> &'static [Rule] {
    RULES.get_or_init(|| {
        [
            (
                r#"(?i)\b(owner|user|username)(\s*[=:]\s*)("[^"]*"|[^\s,;)]+)"#,
                "$1$2[REDACTED-OWNER]",
            ),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (
                r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
                "[REDACTED-UUID]",
            ),
            (
                r"(?:\+92|\b0)3\d{2}[-\s]?\d{7}\b|\b(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s][0-9]{3}[-.\s][0-9]{4}\b",
                "[REDACTED-PHONE]",
            ),
            (r"\b[A-Za-z0-9+/]{43}=", "[REDACTED-KEY]"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| Rule {
            regex: Regex::new(pattern).expect("Valid regex"),
            replacement,
        })
        .collect()
    })
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }
    let mut end = max_bytes;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

/// Redact identities and key material from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    let (prefix, truncated) = truncate_to_char_boundary(input, MAX_LINE_BYTES);

    let mut out = prefix.to_string();
    for rule in rules() {
        if rule.regex.is_match(&out) {
            out = rule.regex.replace_all(&out, rule.replacement).into_owned();
        }
    }

    if truncated {
        out.push_str(" [TRUNCATED]\n");
    }
    out
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted line
/// before it reaches the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

/// Line-buffering writer produced by [`SanitizingMakeWriter`].
pub struct SanitizingWriter<W: std::io::Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let line = String::from_utf8_lossy(bytes);
        self.inner.write_all(sanitize(&line).as_bytes())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }

        // A single line without a newline must not grow without bound.
        if self.buffer.len() > MAX_LINE_BYTES * 2 {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<W: std::io::Write> Drop for SanitizingWriter<W> {
    fn drop(&mut self) {
        let _ = std::io::Write::flush(self);
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_redacts_owner_binding() {
        let out = sanitize("Appended report for owner=alice_92 (top=Dengue)");
        assert!(out.contains("owner=[REDACTED-OWNER]"));
        assert!(!out.contains("alice_92"));
        assert!(out.contains("top=Dengue"));

        let quoted = sanitize(r#"history requested user: "Dr. Khan""#);
        assert!(!quoted.contains("Khan"));
    }

    #[test]
    fn test_redacts_contact_details() {
        let out = sanitize("contact patient@clinic.pk or 0300-1234567");
        assert!(out.contains("[REDACTED-EMAIL]"));
        assert!(out.contains("[REDACTED-PHONE]"));
        assert!(!out.contains("1234567"));
    }

    #[test]
    fn test_redacts_uuid_and_keys() {
        let out = sanitize("session 550e8400-e29b-41d4-a716-446655440000");
        assert!(out.contains("[REDACTED-UUID]"));

        let seed = "q5Zt1pH0kR3sV8xY2bN6mC9fJ4gL7wE1aS5dF8hK0jQ=";
        let out = sanitize(&format!("seed {seed}"));
        assert!(out.contains("[REDACTED-KEY]"));
    }

    #[test]
    fn test_plain_text_untouched() {
        let line = "Inference complete: top=Malaria confidence=71.3%";
        assert_eq!(sanitize(line), line);
    }

    #[test]
    fn test_truncates_long_lines() {
        let long = "x".repeat(MAX_LINE_BYTES + 10);
        let out = sanitize(&long);
        assert!(out.ends_with("[TRUNCATED]\n"));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter {
                inner: &mut sink,
                buffer: Vec::new(),
            };
            writer.write_all(b"owner=bob saved\npartial ").expect("write");
            writer.write_all(b"owner=eve\n").expect("write");
        }
        let text = String::from_utf8(sink).expect("utf8");
        assert_eq!(
            text,
            "owner=[REDACTED-OWNER] saved\npartial owner=[REDACTED-OWNER]\n"
        );
    }
}
