//! Builds the [`PostIndex`]: the date-sorted list of every post and the
//! posts grouped by tag. An index is built in one pass over a posts
//! directory and isn't modified afterwards.

use crate::post::{Error, Parser, PostInfo, Result};
use crate::tag::PostTag;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// The posts found under a posts directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PostIndex {
    /// Every post, most recent first. Posts sharing a date keep the order in
    /// which they were found.
    pub posts: Vec<PostInfo>,

    /// Tag name to the posts carrying it, each list most recent first.
    pub tags: BTreeMap<String, PostTag>,
}

impl PostIndex {
    /// Walks `root` recursively and indexes every content file. Files that
    /// aren't content files are skipped; any other failure aborts the whole
    /// pass.
    pub fn build(parser: &Parser, root: &Path) -> Result<PostIndex> {
        let root = std::fs::canonicalize(root).map_err(|e| {
            Error::Annotated(
                format!("reading posts directory `{}`", root.display()),
                Box::new(e.into()),
            )
        })?;

        let mut index = PostIndex::default();
        for result in WalkDir::new(&root)
            .follow_links(true)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = result?;
            if !entry.file_type().is_file() {
                continue;
            }
            match parser.parse_post(entry.path())? {
                Some(post) => {
                    debug!("indexed `{}` as {}", entry.path().display(), post.route);
                    index.push(post);
                }
                None => debug!("skipping `{}`", entry.path().display()),
            }
        }
        index.sort();
        Ok(index)
    }

    /// Adds `post` to the post list and to each of its tags.
    fn push(&mut self, post: PostInfo) {
        for tag in &post.tags {
            match self.tags.get_mut(tag) {
                Some(post_tag) => post_tag.push(post.clone()),
                None => {
                    self.tags
                        .insert(tag.clone(), PostTag::new(tag, post.clone()));
                }
            }
        }
        self.posts.push(post);
    }

    /// Orders the post list and every tag's posts by date, most recent first.
    /// The sort is stable, so posts sharing a date keep discovery order.
    fn sort(&mut self) {
        self.posts.sort_by(|a, b| b.date.cmp(&a.date));
        for post_tag in self.tags.values_mut() {
            post_tag.posts.sort_by(|a, b| b.date.cmp(&a.date));
        }
    }

    /// Returns the position of the post with the given route.
    pub fn position(&self, route: &str) -> Option<usize> {
        self.posts.iter().position(|post| post.route == route)
    }
}

/// Builds a [`PostIndex`] from the posts under `root`. See
/// [`PostIndex::build`].
pub fn build_index(parser: &Parser, root: &Path) -> Result<PostIndex> {
    PostIndex::build(parser, root)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parser() -> Result<Parser> {
        Parser::new(
            ":year-:month-:day-:title.md",
            ":year/:month/:day/:title/",
            &["md".to_owned(), "mdx".to_owned(), "html".to_owned()],
        )
    }

    fn fixture(files: &[(&str, &str)]) -> std::io::Result<TempDir> {
        let dir = TempDir::new()?;
        for (relative, contents) in files {
            let path = dir.path().join(relative);
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(&path, contents)?;
        }
        Ok(dir)
    }

    fn routes(posts: &[PostInfo]) -> Vec<&str> {
        posts.iter().map(|p| p.route.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_date_stable() -> Result<()> {
        let dir = fixture(&[
            ("2020-01-01-a.md", "a"),
            ("2021-06-15-b.md", "b"),
            ("2020-01-01-c.md", "c"),
        ])?;
        let index = build_index(&parser()?, dir.path())?;
        assert_eq!(
            vec!["/2021/06/15/b/", "/2020/01/01/a/", "/2020/01/01/c/"],
            routes(&index.posts),
        );
        Ok(())
    }

    #[test]
    fn test_front_matter_date_reorders() -> Result<()> {
        let dir = fixture(&[
            ("2020-01-01-a.md", "---\ndate: 2022-01-01\n---\na"),
            ("2021-06-15-b.md", "b"),
        ])?;
        let index = build_index(&parser()?, dir.path())?;
        assert_eq!(vec!["/2020/01/01/a/", "/2021/06/15/b/"], routes(&index.posts));
        Ok(())
    }

    #[test]
    fn test_tags_grouped_and_sorted() -> Result<()> {
        let dir = fixture(&[
            ("2020-01-01-a.md", "---\ntags: [rust, blog]\n---\na"),
            ("2021-06-15-b.md", "---\ntags: rust\n---\nb"),
            ("2019-05-05-c.md", "c"),
        ])?;
        let index = build_index(&parser()?, dir.path())?;
        assert_eq!(3, index.posts.len());
        assert_eq!(vec!["blog", "rust"], index.tags.keys().collect::<Vec<_>>());

        let rust = &index.tags["rust"];
        assert_eq!(2, rust.count);
        assert_eq!(rust.count, rust.posts.len());
        assert_eq!(vec!["/2021/06/15/b/", "/2020/01/01/a/"], routes(&rust.posts));

        let blog = &index.tags["blog"];
        assert_eq!(1, blog.count);
        assert_eq!(vec!["/2020/01/01/a/"], routes(&blog.posts));
        Ok(())
    }

    #[test]
    fn test_bundles_and_nested_directories() -> Result<()> {
        let dir = fixture(&[
            ("2020-02-02-my-post/index.md", "bundle"),
            ("2020-02-02-my-post/diagram.svg", "<svg/>"),
            ("2019/2019-03-03-nested.mdx", "nested"),
            ("2019/notes.txt", "not a post"),
        ])?;
        let index = build_index(&parser()?, dir.path())?;
        assert_eq!(
            vec!["/2020/02/02/my-post/", "/2019/03/03/nested/"],
            routes(&index.posts),
        );
        assert!(index.posts[0].path.ends_with("2020-02-02-my-post/index.md"));
        assert!(index.posts[0].path.is_absolute());
        Ok(())
    }

    #[test]
    fn test_malformed_filename_aborts() -> Result<()> {
        let dir = fixture(&[("2020-01-01-a.md", "a"), ("about.md", "about")])?;
        match build_index(&parser()?, dir.path()) {
            Err(Error::Annotated(_, inner)) => {
                assert!(matches!(*inner, Error::MalformedFilename(_)))
            }
            other => panic!("wanted MalformedFilename, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_missing_directory() -> Result<()> {
        let dir = TempDir::new()?;
        assert!(build_index(&parser()?, &dir.path().join("nope")).is_err());
        Ok(())
    }

    #[test]
    fn test_rebuild_is_identical() -> Result<()> {
        let dir = fixture(&[
            ("2020-01-01-a.md", "---\ntags: x, y\n---\na"),
            ("2020-01-01-b.md", "---\ntags: y\n---\nb"),
            ("2021-06-15-c/index.html", "<p>c</p>"),
        ])?;
        let p = parser()?;
        let first = build_index(&p, dir.path())?;
        let second = build_index(&p, dir.path())?;
        assert_eq!(first, second);
        assert_eq!(
            serde_yaml::to_string(&first)?,
            serde_yaml::to_string(&second)?,
        );
        Ok(())
    }

    #[test]
    fn test_position() -> Result<()> {
        let dir = fixture(&[("2020-01-01-a.md", "a"), ("2021-06-15-b.md", "b")])?;
        let index = build_index(&parser()?, dir.path())?;
        assert_eq!(Some(1), index.position("/2020/01/01/a/"));
        assert_eq!(None, index.position("/nope/"));
        Ok(())
    }
}
