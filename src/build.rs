//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: indexing the posts ([`crate::index`]), collecting the
//! site's other pages, and extending every page's data from the index
//! ([`crate::plugin`]). [`write_site_data`] stores the result for the page
//! layer.

use crate::config::Config;
use crate::index::build_index;
use crate::plugin::{PageData, Plugin};
use crate::post::{Error as ParseError, Frontmatter, Parser as PostParser, PostInfo};
use crate::tag::PostTag;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use url::ParseError as UrlParseError;
use walkdir::WalkDir;

/// The file [`write_site_data`] writes into the output directory.
pub const SITE_DATA_FILE: &str = "site-data.yaml";

/// Everything the page layer needs to render the site.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SiteData {
    pub title: String,
    pub posts: Vec<PostInfo>,
    pub tags: BTreeMap<String, PostTag>,
    pub pages: Vec<PageData>,
}

/// Builds the site data from a [`Config`]. Any error aborts the build.
pub fn build_site(config: &Config) -> Result<SiteData> {
    let parser = PostParser::new(
        &config.filename_pattern,
        &config.route_pattern,
        &config.extensions,
    )?;

    let posts_source_directory = config.posts_source_directory();
    let index = build_index(&parser, &posts_source_directory)?;
    let plugin = Plugin::new(&index, &config.posts_directory, &config.site_root);

    let mut pages = collect_pages(&parser, &config.root_directory, &posts_source_directory)?;

    // `build_index` canonicalizes post paths, so strip the canonical prefix.
    let posts_root = std::fs::canonicalize(&posts_source_directory)?;
    for page in plugin.additional_pages() {
        let relative = page
            .file_path
            .strip_prefix(&posts_root)
            .unwrap_or(&page.file_path);
        pages.push(PageData {
            route_path: page.route_path,
            relative_path: config.posts_directory.join(relative),
            ..PageData::default()
        });
    }

    for page in pages.iter_mut() {
        plugin.extend_page_data(page)?;
    }

    info!(
        "indexed {} posts with {} tags; {} pages",
        index.posts.len(),
        index.tags.len(),
        pages.len()
    );

    Ok(SiteData {
        title: config.title.clone(),
        posts: index.posts,
        tags: index.tags,
        pages,
    })
}

/// Writes `data` as YAML to [`SITE_DATA_FILE`] in `output_directory`,
/// creating the directory if needed. Returns the written file's path.
pub fn write_site_data(data: &SiteData, output_directory: &Path) -> Result<PathBuf> {
    // Serialize before touching the disk so a failure leaves nothing behind.
    let yaml = serde_yaml::to_string(data)?;
    std::fs::create_dir_all(output_directory)?;
    let path = output_directory.join(SITE_DATA_FILE);
    std::fs::write(&path, yaml)?;
    info!("wrote {}", path.display());
    Ok(path)
}

/// Collects the content pages under `root`, leaving out the posts
/// directory. Only a page's `layout` and `title` front matter are read.
fn collect_pages(parser: &PostParser, root: &Path, posts: &Path) -> Result<Vec<PageData>> {
    let mut pages = Vec::new();
    for result in WalkDir::new(root)
        .follow_links(true)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|entry| entry.path() != posts)
    {
        let entry = result.map_err(ParseError::from)?;
        if !entry.file_type().is_file() || !parser.is_content(entry.path()) {
            continue;
        }
        // strip_prefix() should never fail since WalkDir yields paths under
        // `root`
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let contents = crate::post::read_to_string(entry.path())?;
        let (frontmatter, _) = Frontmatter::split(&contents).map_err(|e| {
            ParseError::Annotated(
                format!("parsing page `{}`", entry.path().display()),
                Box::new(e),
            )
        })?;
        pages.push(PageData {
            route_path: page_route(relative),
            relative_path: relative.to_owned(),
            layout: frontmatter.layout,
            title: frontmatter.title,
            ..PageData::default()
        });
    }
    Ok(pages)
}

/// Routes a page by its path relative to the site root: `dir/index.md`
/// becomes `/dir/` and `dir/name.md` becomes `/dir/name`.
fn page_route(relative: &Path) -> String {
    let mut parts: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem == "index" {
        parts.push(String::new());
    } else {
        parts.push(stem);
    }
    format!("/{}", parts.join("/"))
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing,
/// linking tag pages, serializing the site data, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned when a page URL can't be built from the site root.
    UrlParse(UrlParseError),

    /// Returned for errors serializing the site data.
    SerializeYaml(serde_yaml::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::SerializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::SerializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<UrlParseError> for Error {
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::SerializeYaml(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    fn config(output: &Path) -> std::result::Result<Config, Box<dyn std::error::Error>> {
        Ok(Config::from_directory(Path::new("./testdata"), Some(output))?)
    }

    fn find<'a>(data: &'a SiteData, route: &str) -> &'a PageData {
        data.pages
            .iter()
            .find(|p| p.route_path == route)
            .unwrap_or_else(|| panic!("no page routed at {}", route))
    }

    #[test]
    fn test_page_route() {
        assert_eq!("/", page_route(Path::new("index.md")));
        assert_eq!("/tags/", page_route(Path::new("tags/index.md")));
        assert_eq!("/about", page_route(Path::new("about.md")));
        assert_eq!("/docs/setup", page_route(Path::new("docs/setup.mdx")));
    }

    #[test]
    fn test_build_site() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let out = TempDir::new()?;
        let data = build_site(&config(out.path())?)?;

        assert_eq!("Test Blog", data.title);
        let routes: Vec<&str> = data.posts.iter().map(|p| p.route.as_str()).collect();
        assert_eq!(
            vec![
                "/2021/03/07/hello-world/",
                "/2020/06/15/notes/",
                "/2020/01/01/first-post/",
            ],
            routes,
        );
        assert_eq!(2, data.tags["rust"].count);

        let home = find(&data, "/");
        assert_eq!(Some("home"), home.layout.as_deref());
        assert_eq!(3, home.posts.as_ref().map(Vec::len).unwrap_or(0));

        let archives = find(&data, "/archives/");
        assert_eq!(Some(&data.posts), archives.posts.as_ref());

        let tags = find(&data, "/tags/");
        let entries = tags.tags.as_ref().expect("tags page should get tags");
        assert_eq!("rust", entries[0].name);
        assert_eq!("https://example.org/tags/?tag=rust", entries[0].url);

        let about = find(&data, "/about");
        assert!(about.posts.is_none() && about.tags.is_none());
        assert_eq!(Some("About"), about.title.as_deref());

        let notes = find(&data, "/2020/06/15/notes/");
        assert_eq!(Path::new("_posts/2020-06-15-notes.mdx"), notes.relative_path);
        assert_eq!(
            "/2020/01/01/first-post/",
            notes.prev_post.as_ref().expect("older post").route
        );
        assert_eq!(
            "/2021/03/07/hello-world/",
            notes.next_post.as_ref().expect("newer post").route
        );
        assert_eq!(Some("2020-06-15"), notes.date.as_deref());

        // posts are only routed through their permalinks
        assert!(data.pages.iter().all(|p| !p.route_path.starts_with("/_posts")));
        assert_eq!(7, data.pages.len());
        Ok(())
    }

    #[test]
    fn test_write_site_data() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let out = TempDir::new()?;
        let nested = out.path().join("site");
        let data = build_site(&config(&nested)?)?;
        let path = write_site_data(&data, &nested)?;
        assert_eq!(nested.join(SITE_DATA_FILE), path);
        let written = std::fs::read_to_string(&path)?;
        assert_eq!(serde_yaml::to_string(&data)?, written);
        Ok(())
    }
}
