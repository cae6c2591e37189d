//! Loads the project file (`quire.yaml`) into a [`Config`].

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "quire.yaml";

#[derive(Deserialize)]
struct Extensions(Vec<String>);
impl Default for Extensions {
    fn default() -> Self {
        Extensions(vec!["md".to_owned(), "mdx".to_owned(), "html".to_owned()])
    }
}

fn default_root_directory() -> PathBuf {
    PathBuf::from("blog")
}

fn default_posts_directory() -> PathBuf {
    PathBuf::from("_posts")
}

fn default_filename_pattern() -> String {
    String::from(":year-:month-:day-:title.md")
}

fn default_route_pattern() -> String {
    String::from(":year/:month/:day/:title/")
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Project {
    #[serde(default)]
    pub title: String,

    pub site_root: Url,

    #[serde(default = "default_root_directory")]
    pub root_directory: PathBuf,

    #[serde(default = "default_posts_directory")]
    pub posts_directory: PathBuf,

    #[serde(default = "default_filename_pattern")]
    pub filename_pattern: String,

    #[serde(default = "default_route_pattern")]
    pub route_pattern: String,

    #[serde(default)]
    pub extensions: Extensions,
}

pub struct Config {
    /// The site title.
    pub title: String,

    /// The absolute URL the site is served from. Should end in `/`.
    pub site_root: Url,

    /// The directory holding every page of the site.
    pub root_directory: PathBuf,

    /// The posts directory, relative to `root_directory`.
    pub posts_directory: PathBuf,

    /// The file-naming convention for posts, e.g. `:year-:month-:day-:title.md`.
    pub filename_pattern: String,

    /// The route for posts, e.g. `:year/:month/:day/:title/`.
    pub route_pattern: String,

    /// Extensions (without the dot) of content files.
    pub extensions: Vec<String>,

    /// Where build output is written.
    pub output_directory: PathBuf,
}

impl Config {
    /// The absolute posts directory.
    pub fn posts_source_directory(&self) -> PathBuf {
        self.root_directory.join(&self.posts_directory)
    }

    /// Looks for the project file in `dir` and each of its ancestors, then
    /// loads the first one found. `output_directory` defaults to `build`
    /// beside the project file.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::NotFound),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        use crate::util::open;
        let project: Project = serde_yaml::from_reader(open(path, "project")?)
            .map_err(|e| Error::DeserializeYaml(path.to_owned(), e))?;
        let project_root = path.parent().ok_or_else(|| Error::NoParent(path.to_owned()))?;
        Ok(Config {
            title: project.title,
            site_root: project.site_root,
            root_directory: project_root.join(project.root_directory),
            posts_directory: project.posts_directory,
            filename_pattern: project.filename_pattern,
            route_pattern: project.route_pattern,
            extensions: project.extensions.0,
            output_directory: match output_directory {
                Some(dir) => dir.to_owned(),
                None => project_root.join("build"),
            },
        })
    }
}

/// The result of loading a [`Config`].
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Config`].
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or its
    /// ancestors.
    NotFound,

    /// Returned when the project file's directory can't be determined.
    NoParent(PathBuf),

    /// Returned when the project file isn't valid.
    DeserializeYaml(PathBuf, serde_yaml::Error),

    /// Returned for I/O errors reading the project file.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::NoParent(path) => write!(
                f,
                "Can't get parent directory for provided project file path '{}'",
                path.display()
            ),
            Error::DeserializeYaml(path, err) => {
                write!(f, "Loading configuration '{}': {}", path.display(), err)
            }
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound => None,
            Error::NoParent(_) => None,
            Error::DeserializeYaml(_, err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
