//! Defines the [`PostInfo`], [`Parser`], and [`Error`] types. [`Parser`]
//! turns one content file into a [`PostInfo`]: the file name is matched
//! against the filename [`Permalink`] to get the post's fields, the fields
//! are rendered through the route [`Permalink`], and the front matter
//! overrides whatever was derived from the file name.

use crate::markdown;
use crate::permalink::{self, Fields, Permalink, Segments};
use crate::tag::Tags;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The number of body characters kept in a derived summary.
const SUMMARY_LENGTH: usize = 100;

/// Appended to every derived summary.
const ELLIPSIS: &str = "...";

/// A post's metadata as seen by the page layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PostInfo {
    /// The display title.
    pub title: String,

    /// The absolute URL path of the post, e.g. `/2021/03/07/hello-world/`.
    pub route: String,

    /// The source file.
    pub path: PathBuf,

    /// The post date formatted as `YYYY-MM-DD`.
    pub date: String,

    /// The post's tags in front-matter order.
    pub tags: Vec<String>,

    /// A plain-text teaser.
    pub summary: String,
}

/// The front-matter fields this crate understands. Every field overrides a
/// value derived from the file name or body; unknown keys are ignored.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub date: Option<serde_yaml::Value>,

    #[serde(default)]
    pub tags: Option<Tags>,

    #[serde(default)]
    pub summary: Option<String>,

    /// Consumed by the page layer to decide which data a page receives.
    #[serde(default)]
    pub layout: Option<String>,
}

impl Frontmatter {
    /// Splits `input` into its decoded front matter and its body. A document
    /// that doesn't open with a `---` line has no front matter.
    pub fn split(input: &str) -> Result<(Frontmatter, &str)> {
        const FENCE: &str = "---";

        let input = input.trim_start_matches('\u{feff}');
        let mut lines = input.split_inclusive('\n');
        match lines.next() {
            Some(first) if first.trim_end() == FENCE => {
                let yaml_start = first.len();
                let mut offset = yaml_start;
                for line in lines {
                    if line.trim_end() == FENCE {
                        let frontmatter = Self::decode(&input[yaml_start..offset])?;
                        return Ok((frontmatter, &input[offset + line.len()..]));
                    }
                    offset += line.len();
                }
                Err(Error::FrontmatterMissingEndFence)
            }
            _ => Ok((Frontmatter::default(), input)),
        }
    }

    fn decode(yaml: &str) -> Result<Frontmatter> {
        if yaml.trim().is_empty() {
            return Ok(Frontmatter::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Parses [`PostInfo`] objects from content files.
pub struct Parser {
    /// Matches post slugs, e.g. `:year-:month-:day-:title`.
    filename: Permalink,

    /// Renders post routes, e.g. `:year/:month/:day/:title/`.
    route: Permalink,

    /// File extensions (without the dot) that mark a content file.
    extensions: Vec<String>,
}

impl Parser {
    /// Constructs a new parser. A file extension on `filename_pattern` (e.g.
    /// the `.md` in `:year-:month-:day-:title.md`) is dropped before the
    /// pattern is compiled since slugs never carry one.
    pub fn new(
        filename_pattern: &str,
        route_pattern: &str,
        extensions: &[String],
    ) -> Result<Parser> {
        let filename_pattern = match Path::new(filename_pattern).extension() {
            Some(ext) => {
                &filename_pattern[..filename_pattern.len() - ext.len() - 1]
            }
            None => filename_pattern,
        };
        Ok(Parser {
            filename: Permalink::with_segments(filename_pattern, &filename_segments())?,
            route: Permalink::new(route_pattern)?,
            extensions: extensions.to_vec(),
        })
    }

    /// Returns whether `path` has one of the content extensions.
    pub fn is_content(&self, path: &Path) -> bool {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self.extensions.iter().any(|e| e == ext),
            None => false,
        }
    }

    /// Returns the slug for a content file: its file stem, or the name of its
    /// directory if the stem is `index` (post bundles).
    pub fn slug(path: &Path) -> Result<String> {
        let invalid = || InvalidFileNameError(path.to_owned());
        let stem = path.file_stem().ok_or_else(invalid)?;
        let name = if stem == "index" {
            path.parent()
                .and_then(Path::file_name)
                .ok_or_else(invalid)?
        } else {
            stem
        };
        Ok(name.to_str().ok_or_else(invalid)?.to_owned())
    }

    /// Matches `slug` against the filename pattern.
    pub fn fields(&self, slug: &str) -> Result<Fields> {
        self.filename
            .parse(slug)
            .ok_or_else(|| Error::MalformedFilename(slug.to_owned()))
    }

    /// Computes the absolute route for `slug`.
    pub fn route(&self, slug: &str) -> Result<String> {
        Ok(format!("/{}", self.route.stringify(&self.fields(slug)?)?))
    }

    /// Parses the content file at `path`. Returns `Ok(None)` for files that
    /// aren't content files.
    pub fn parse_post(&self, path: &Path) -> Result<Option<PostInfo>> {
        if !self.is_content(path) {
            return Ok(None);
        }
        match self._parse_post(path) {
            Ok(post) => Ok(Some(post)),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(&self, path: &Path) -> Result<PostInfo> {
        let slug = Self::slug(path)?;
        let fields = self.fields(&slug)?;
        let route = format!("/{}", self.route.stringify(&fields)?);

        let contents = read_to_string(path)?;
        let (frontmatter, body) = Frontmatter::split(&contents)?;

        let title = match non_empty(frontmatter.title) {
            Some(title) => title,
            None => fields.get("title").cloned().unwrap_or_else(|| slug.clone()),
        };

        let date = match frontmatter.date {
            Some(value) if !is_falsy(&value) => date_from_value(&value)?,
            _ => {
                let prefix: String = slug.chars().take(10).collect();
                normalize_date(&prefix).ok_or(Error::InvalidDate(prefix))?
            }
        };

        let summary = match non_empty(frontmatter.summary) {
            Some(summary) => summary,
            None => summarize(body),
        };

        Ok(PostInfo {
            title,
            route,
            path: path.to_owned(),
            date,
            tags: Tags::normalize(frontmatter.tags.as_ref()),
            summary,
        })
    }
}

/// Segment overrides for the filename pattern.
fn filename_segments() -> Segments {
    let mut segments = Segments::new();
    for (name, pattern) in &[
        ("year", r"(\d{4})"),
        ("month", r"(\d{2})"),
        ("day", r"(\d{2})"),
        ("i_month", r"(\d{1,2})"),
        ("i_day", r"(\d{1,2})"),
        ("hash", r"([0-9a-f]{12})"),
    ] {
        segments.insert(name.to_string(), (*pattern).into());
    }
    segments
}

/// Reads a whole file. The handle is closed before returning, whether or not
/// the read succeeds.
pub(crate) fn read_to_string(path: &Path) -> Result<String> {
    use std::io::Read;
    let mut contents = String::new();
    crate::util::open(path, "content")?.read_to_string(&mut contents)?;
    Ok(contents)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn is_falsy(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Null => true,
        serde_yaml::Value::Bool(b) => !b,
        serde_yaml::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn date_from_value(value: &serde_yaml::Value) -> Result<String> {
    match value {
        serde_yaml::Value::String(s) => {
            normalize_date(s).ok_or_else(|| Error::InvalidDate(s.clone()))
        }
        // Numbers are milliseconds since the Unix epoch.
        serde_yaml::Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
            .ok_or_else(|| Error::InvalidDate(n.to_string())),
        other => Err(Error::InvalidDate(format!("{:?}", other))),
    }
}

/// Normalizes a date-like string to `YYYY-MM-DD`. Accepts plain dates
/// (`-` or `/` separated), date-times with a space or `T` separator, and
/// RFC 3339 timestamps, whose date is taken as written.
pub fn normalize_date(raw: &str) -> Option<String> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    let raw = raw.trim();
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_local().date())
        .ok()
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        })?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Derives a teaser from a post body: a leading heading line is removed,
/// the first [`SUMMARY_LENGTH`] characters are kept, markdown is stripped
/// and [`ELLIPSIS`] is appended.
pub fn summarize(body: &str) -> String {
    let head: String = strip_leading_heading(body.trim())
        .chars()
        .take(SUMMARY_LENGTH)
        .collect();
    format!("{}{}", markdown::to_plain_text(&head), ELLIPSIS)
}

fn strip_leading_heading(body: &str) -> &str {
    let rest = body.trim_start_matches('#');
    if rest.len() == body.len() {
        return body;
    }
    let text = rest.trim_start();
    if text.len() == rest.len() {
        // `#tag` isn't a heading
        return body;
    }
    match text.find('\n') {
        Some(i) => &text[i..],
        None => "",
    }
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {}

/// Represents the result of a [`PostInfo`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`PostInfo`] object or indexing a directory
/// of them.
#[derive(Debug)]
pub enum Error {
    /// Returned when a content file opens a frontmatter fence (`---`) but
    /// never closes it.
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when a slug doesn't match the filename pattern, so no route
    /// can be computed for the post.
    MalformedFilename(String),

    /// Returned when a front-matter or file-name date can't be understood.
    InvalidDate(String),

    /// Returned for permalink compile and render errors.
    Permalink(permalink::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::MalformedFilename(slug) => write!(
                f,
                "file name `{}` doesn't match the filename pattern",
                slug
            ),
            Error::InvalidDate(date) => write!(f, "invalid date `{}`", date),
            Error::Permalink(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::MalformedFilename(_) => None,
            Error::InvalidDate(_) => None,
            Error::Permalink(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<permalink::Error> for Error {
    /// Converts a [`permalink::Error`] into an [`Error`].
    fn from(err: permalink::Error) -> Error {
        Error::Permalink(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for directory traversal.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
