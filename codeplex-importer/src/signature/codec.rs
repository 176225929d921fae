//! Template-driven signature rendering and parsing.

use super::SignatureError;
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use regex::Regex;

/// Default preamble template for migrated content.
const DEFAULT_TEMPLATE: &str = "*From {{author}} on {{timestamp}}*\n\n";

/// The marker embedded in every issue body and comment the importer creates.
///
/// On a later run, recovering this marker from existing content is how the
/// importer recognizes its own work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSignature {
    /// Original author, or empty when the export carries no author names.
    pub author: String,
    /// Original posting timestamp, at whole-second precision.
    pub timestamp: DateTime<Utc>,
}

impl MigrationSignature {
    /// Creates a signature, truncating the timestamp to the codec's
    /// second-level precision.
    #[must_use]
    pub fn new(author: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            author: author.into(),
            timestamp: truncate_to_seconds(timestamp),
        }
    }
}

/// Truncates a timestamp to whole seconds.
///
/// All timestamp-equality decisions in the importer happen at this precision,
/// matching what the rendered signature can represent.
#[must_use]
pub fn truncate_to_seconds(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}

/// A compiled template segment.
#[derive(Debug, Clone)]
enum Segment {
    /// Literal text, matched exactly.
    Literal(String),
    /// A named `{{placeholder}}`, captured non-greedily.
    Placeholder(String),
}

/// Renders and parses migration signatures from a single compiled template.
///
/// The template is compiled once into an ordered list of literal and
/// placeholder segments; the renderer walks that list, and the matcher is a
/// regex derived from the same list. Because both directions share one
/// compiled form, they cannot drift apart when the template changes.
#[derive(Debug)]
pub struct SignatureCodec {
    segments: Vec<Segment>,
    matcher: Regex,
}

impl SignatureCodec {
    /// Creates a codec using the default template.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the matcher fails to compile.
    pub fn new() -> Result<Self, SignatureError> {
        Self::with_template(DEFAULT_TEMPLATE)
    }

    /// Creates a codec from a custom template.
    ///
    /// Placeholders are written `{{name}}`; the codec understands `author`
    /// and `timestamp`. Unterminated braces are treated as literal text.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the derived matcher is not a valid
    /// pattern (e.g. a placeholder name that is not a valid group name).
    pub fn with_template(template: &str) -> Result<Self, SignatureError> {
        let segments = compile_template(template);
        let matcher = build_matcher(&segments)?;
        Ok(Self { segments, matcher })
    }

    /// Renders the signature preamble.
    #[must_use]
    pub fn render(&self, signature: &MigrationSignature) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => match name.as_str() {
                    "author" => out.push_str(&signature.author),
                    "timestamp" => out.push_str(&format_timestamp(signature.timestamp)),
                    _ => {}
                },
            }
        }
        out
    }

    /// Renders the signature preamble followed by the original message.
    #[must_use]
    pub fn prepend(&self, signature: &MigrationSignature, message: &str) -> String {
        let mut body = self.render(signature);
        body.push_str(message);
        body
    }

    /// Attempts to recover a signature from previously rendered content.
    ///
    /// Returns `None` for text that does not start with the preamble. That is
    /// the normal outcome for organic content (e.g. a comment written by a
    /// human), not an error.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<MigrationSignature> {
        let captures = self.matcher.captures(text)?;
        let author = captures.name("author")?.as_str().to_string();
        let timestamp = DateTime::parse_from_rfc3339(captures.name("timestamp")?.as_str())
            .ok()?
            .with_timezone(&Utc);
        Some(MigrationSignature { author, timestamp })
    }
}

/// Formats a timestamp for embedding: RFC 3339, UTC, whole seconds.
///
/// Locale-invariant and round-trippable at second precision.
fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    truncate_to_seconds(timestamp).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Splits a template into literal and `{{placeholder}}` segments.
fn compile_template(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        if let Some(close) = after_open.find("}}") {
            literal.push_str(&rest[..open]);
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Placeholder(after_open[..close].trim().to_string()));
            rest = &after_open[close + 2..];
        } else {
            // Unterminated braces stay literal.
            literal.push_str(&rest[..open + 2]);
            rest = after_open;
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    segments
}

/// Derives the parse regex from the compiled segments.
///
/// Literals become exact escaped matches, placeholders become non-greedy
/// named groups, and the whole pattern is anchored to the start of the text.
fn build_matcher(segments: &[Segment]) -> Result<Regex, SignatureError> {
    let mut pattern = String::from("^");
    for segment in segments {
        match segment {
            Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
            Segment::Placeholder(name) => {
                pattern.push_str(&format!("(?P<{name}>.*?)"));
            }
        }
    }
    Ok(Regex::new(&pattern)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn codec() -> SignatureCodec {
        SignatureCodec::new().unwrap()
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn render_parse_round_trip() {
        let signature = MigrationSignature::new("alice", at(2009, 5, 5, 8, 30, 0));
        let rendered = codec().render(&signature);

        assert_eq!(codec().parse(&rendered), Some(signature));
    }

    #[test]
    fn round_trip_with_empty_author() {
        let signature = MigrationSignature::new("", at(2009, 5, 7, 10, 0, 0));
        let rendered = codec().render(&signature);

        assert_eq!(codec().parse(&rendered), Some(signature));
    }

    #[test]
    fn parse_recovers_signature_from_full_body() {
        let signature = MigrationSignature::new("bob", at(2010, 1, 2, 3, 4, 5));
        let body = codec().prepend(&signature, "the original comment\nwith two lines");

        assert_eq!(codec().parse(&body), Some(signature));
    }

    #[test]
    fn parse_rejects_organic_content() {
        assert_eq!(codec().parse("I can reproduce this on Windows 7."), None);
        assert_eq!(codec().parse(""), None);
    }

    #[test]
    fn parse_is_anchored_to_start() {
        let signature = MigrationSignature::new("", at(2009, 5, 5, 8, 30, 0));
        let rendered = codec().render(&signature);
        let shifted = format!("reply above\n{rendered}");

        assert_eq!(codec().parse(&shifted), None);
    }

    #[test]
    fn timestamps_are_truncated_to_seconds() {
        let sub_second = at(2009, 5, 5, 8, 30, 0) + chrono::Duration::milliseconds(750);
        let signature = MigrationSignature::new("", sub_second);
        let parsed = codec().parse(&codec().render(&signature)).unwrap();

        assert_eq!(parsed.timestamp, truncate_to_seconds(sub_second));
    }

    #[test]
    fn custom_template_round_trips() {
        let custom =
            SignatureCodec::with_template("Migrated ({{timestamp}}) by {{author}}:\n").unwrap();
        let signature = MigrationSignature::new("importer", at(2020, 12, 31, 23, 59, 59));
        let body = custom.prepend(&signature, "text");

        assert_eq!(custom.parse(&body), Some(signature));
    }

    #[test]
    fn unterminated_braces_are_literal() {
        let codec = SignatureCodec::with_template("prefix {{author}} tail {{oops").unwrap();
        let signature = MigrationSignature::new("x", at(2020, 1, 1, 0, 0, 0));

        assert_eq!(codec.render(&signature), "prefix x tail {{oops");
    }
}
