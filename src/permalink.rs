//! Defines [`Permalink`], a small two-way pattern language for translating
//! between naming conventions. A permalink rule is a template such as
//! `:year-:month-:day-:title` where every `:name` is a placeholder. The same
//! rule can [`Permalink::parse`] a string into named [`Fields`] and
//! [`Permalink::stringify`] named fields back into a string.
//!
//! Placeholders are `:` followed by ASCII word characters, the last of which
//! may not be `_`. Everything else in the template is literal text.

use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Named values extracted by [`Permalink::parse`] or consumed by
/// [`Permalink::stringify`].
pub type Fields = BTreeMap<String, String>;

/// Per-placeholder sub-patterns used instead of the default `(.+?)`.
pub type Segments = HashMap<String, Segment>;

/// The pattern spliced into the matcher for a single placeholder. Each
/// segment must contain exactly one capture group.
#[derive(Clone, Debug)]
pub enum Segment {
    /// Raw regular expression text.
    Pattern(String),

    /// An already-compiled expression; its source text is used verbatim.
    Compiled(Regex),
}

impl Segment {
    fn as_str(&self) -> &str {
        match self {
            Segment::Pattern(pattern) => pattern,
            Segment::Compiled(regex) => regex.as_str(),
        }
    }
}

impl From<&str> for Segment {
    fn from(pattern: &str) -> Segment {
        Segment::Pattern(pattern.to_owned())
    }
}

impl From<Regex> for Segment {
    fn from(regex: Regex) -> Segment {
        Segment::Compiled(regex)
    }
}

const DEFAULT_SEGMENT: &str = "(.+?)";

/// A placeholder: `:` and a run of ASCII word characters not ending in `_`.
const PLACEHOLDER: &str = r":([A-Za-z0-9_]*[A-Za-z0-9])";

/// A compiled permalink rule.
#[derive(Clone, Debug)]
pub struct Permalink {
    rule: String,
    regex: Regex,
    params: Vec<String>,
    placeholder: Regex,
}

impl Permalink {
    /// Compiles `rule` with default segments for every placeholder.
    pub fn new(rule: &str) -> Result<Permalink> {
        Permalink::with_segments(rule, &Segments::new())
    }

    /// Compiles `rule`, substituting `segments[name]` for any placeholder
    /// that has an entry. Literal text is escaped so it only matches itself
    /// and the resulting matcher is anchored at both ends.
    pub fn with_segments(rule: &str, segments: &Segments) -> Result<Permalink> {
        if rule.is_empty() {
            return Err(Error::Config("rule is required".to_owned()));
        }

        let placeholder = Regex::new(PLACEHOLDER)
            .map_err(|e| Error::Config(format!("invalid placeholder grammar: {}", e)))?;

        let mut pattern = String::from("^");
        let mut params: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for piece in pieces(&placeholder, rule) {
            match piece {
                Piece::Literal(text) => pattern.push_str(&regex::escape(text)),
                Piece::Param(name) => {
                    if !seen.insert(name) {
                        return Err(Error::Config(format!(
                            "placeholder `:{}` appears more than once in `{}`",
                            name, rule
                        )));
                    }
                    pattern.push_str(match segments.get(name) {
                        Some(segment) => segment.as_str(),
                        None => DEFAULT_SEGMENT,
                    });
                    params.push(name.to_owned());
                }
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| {
            Error::Config(format!("invalid pattern for rule `{}`: {}", rule, e))
        })?;

        // `captures_len` counts the implicit whole-match group.
        if regex.captures_len() - 1 != params.len() {
            return Err(Error::Config(format!(
                "rule `{}` has {} placeholders but its pattern `{}` has {} capture groups",
                rule,
                params.len(),
                pattern,
                regex.captures_len() - 1,
            )));
        }

        Ok(Permalink {
            rule: rule.to_owned(),
            regex,
            params,
            placeholder,
        })
    }

    /// The template this rule was compiled from.
    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// Placeholder names in order of appearance.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// The anchored matcher.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns whether `candidate` matches the rule in full.
    pub fn test(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// Extracts the placeholder values from `candidate`. Returns `None` when
    /// `candidate` doesn't match, which is distinct from a match that yields
    /// no fields. Groups that didn't participate in the match are omitted.
    pub fn parse(&self, candidate: &str) -> Option<Fields> {
        let captures = self.regex.captures(candidate)?;
        Some(
            self.params
                .iter()
                .zip(captures.iter().skip(1))
                .filter_map(|(name, group)| {
                    group.map(|m| (name.clone(), m.as_str().to_owned()))
                })
                .collect(),
        )
    }

    /// Renders the original template, replacing every placeholder with its
    /// value from `fields`. A placeholder without a value is an error.
    pub fn stringify(&self, fields: &Fields) -> Result<String> {
        let mut out = String::with_capacity(self.rule.len());
        for piece in pieces(&self.placeholder, &self.rule) {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Param(name) => match fields.get(name) {
                    Some(value) => out.push_str(value),
                    None => return Err(Error::MissingField(name.to_owned())),
                },
            }
        }
        Ok(out)
    }
}

enum Piece<'a> {
    Literal(&'a str),
    Param(&'a str),
}

/// Splits a rule into literal runs and placeholder names. A `:` that isn't
/// followed by a valid name is literal text.
fn pieces<'a>(placeholder: &Regex, rule: &'a str) -> Vec<Piece<'a>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for captures in placeholder.captures_iter(rule) {
        let (whole, name) = match (captures.get(0), captures.get(1)) {
            (Some(whole), Some(name)) => (whole, name),
            _ => continue,
        };
        if last < whole.start() {
            pieces.push(Piece::Literal(&rule[last..whole.start()]));
        }
        pieces.push(Piece::Param(name.as_str()));
        last = whole.end();
    }
    if last < rule.len() {
        pieces.push(Piece::Literal(&rule[last..]));
    }
    pieces
}

/// The result of a fallible permalink operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error compiling or rendering a [`Permalink`].
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Returned when a rule is empty or can't be compiled.
    Config(String),

    /// Returned by [`Permalink::stringify`] when a placeholder has no value.
    MissingField(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "invalid permalink setting: {}", msg),
            Error::MissingField(name) => {
                write!(f, "no value for permalink placeholder `:{}`", name)
            }
        }
    }
}

impl std::error::Error for Error {}
