//! Hands the [`PostIndex`] to the page layer. Post pages are registered as
//! additional pages, and every page's data is extended based on its layout:
//!
//! * `home` and `archives` pages receive the full post list;
//! * `tags` pages receive every tag, most used first, with a link back to
//!   the tags page filtered by that tag;
//! * post pages receive their neighbours, date and tags.

use crate::index::PostIndex;
use crate::post::PostInfo;
use serde::Serialize;
use std::path::{Path, PathBuf};
use url::{ParseError, Url};

/// A page the page layer wouldn't otherwise know about.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AdditionalPage {
    pub route_path: String,
    pub file_path: PathBuf,
}

/// A tag as listed on a `tags` page.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagEntry {
    pub name: String,
    pub count: usize,

    /// The tags page, filtered to this tag (`?tag={name}`).
    pub url: String,

    pub posts: Vec<PostInfo>,
}

/// The data available to a page's layout.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PageData {
    pub route_path: String,

    /// The page's source file, relative to the site root.
    pub relative_path: PathBuf,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<PostInfo>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagEntry>>,

    /// The next-older post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_post: Option<PostInfo>,

    /// The next-newer post.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_post: Option<PostInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_tags: Option<Vec<String>>,
}

pub struct Plugin<'a> {
    index: &'a PostIndex,

    /// The posts directory relative to the site root.
    posts_directory: &'a Path,

    site_root: &'a Url,
}

impl<'a> Plugin<'a> {
    pub fn new(
        index: &'a PostIndex,
        posts_directory: &'a Path,
        site_root: &'a Url,
    ) -> Plugin<'a> {
        Plugin {
            index,
            posts_directory,
            site_root,
        }
    }

    /// One page per post, routed by its permalink.
    pub fn additional_pages(&self) -> Vec<AdditionalPage> {
        self.index
            .posts
            .iter()
            .map(|post| AdditionalPage {
                route_path: post.route.clone(),
                file_path: post.path.clone(),
            })
            .collect()
    }

    /// Attaches index data to `page` according to its layout and location.
    pub fn extend_page_data(&self, page: &mut PageData) -> Result<(), ParseError> {
        match page.layout.as_deref() {
            Some("home") | Some("archives") => {
                page.posts = Some(self.index.posts.clone());
            }
            Some("tags") => {
                page.tags = Some(self.tag_entries(&page.route_path)?);
            }
            _ => {}
        }

        if page.relative_path.starts_with(self.posts_directory) {
            if let Some(i) = self.index.position(&page.route_path) {
                let posts = &self.index.posts;
                page.prev_post = posts.get(i + 1).cloned();
                page.next_post = match i {
                    0 => None,
                    _ => posts.get(i - 1).cloned(),
                };
                page.date = Some(posts[i].date.clone());
                page.post_tags = Some(posts[i].tags.clone());
            }
        }
        Ok(())
    }

    fn tag_entries(&self, tags_route: &str) -> Result<Vec<TagEntry>, ParseError> {
        let tags_page = self.site_root.join(tags_route.trim_start_matches('/'))?;
        let mut entries = self
            .index
            .tags
            .values()
            .map(|tag| {
                let mut url = tags_page.clone();
                url.query_pairs_mut().append_pair("tag", &tag.name);
                TagEntry {
                    name: tag.name.clone(),
                    count: tag.count,
                    url: url.to_string(),
                    posts: tag.posts.clone(),
                }
            })
            .collect::<Vec<_>>();
        // `tags` iterates by name, so equal counts stay alphabetical.
        entries.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(entries)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tag::PostTag;

    fn post(route: &str, date: &str, tags: &[&str]) -> PostInfo {
        PostInfo {
            title: route.trim_matches('/').to_owned(),
            route: route.to_owned(),
            path: PathBuf::from(format!("/blog/_posts{}index.md", route)),
            date: date.to_owned(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            summary: String::from("..."),
        }
    }

    fn fixture() -> PostIndex {
        let newest = post("/c/", "2021-01-01", &["rust"]);
        let middle = post("/b/", "2020-01-01", &["rust", "blog"]);
        let oldest = post("/a/", "2019-01-01", &["misc"]);
        let mut index = PostIndex {
            posts: vec![newest.clone(), middle.clone(), oldest.clone()],
            ..PostIndex::default()
        };
        let mut rust = PostTag::new("rust", newest);
        rust.push(middle.clone());
        index.tags.insert("rust".to_owned(), rust);
        index.tags.insert("blog".to_owned(), PostTag::new("blog", middle));
        index.tags.insert("misc".to_owned(), PostTag::new("misc", oldest));
        index
    }

    fn page(route: &str, relative: &str, layout: Option<&str>) -> PageData {
        PageData {
            route_path: route.to_owned(),
            relative_path: PathBuf::from(relative),
            layout: layout.map(str::to_owned),
            ..PageData::default()
        }
    }

    #[test]
    fn test_additional_pages() -> Result<(), ParseError> {
        let index = fixture();
        let site_root = Url::parse("https://example.org/")?;
        let plugin = Plugin::new(&index, Path::new("_posts"), &site_root);
        let pages = plugin.additional_pages();
        assert_eq!(3, pages.len());
        assert_eq!(
            AdditionalPage {
                route_path: "/c/".to_owned(),
                file_path: PathBuf::from("/blog/_posts/c/index.md"),
            },
            pages[0],
        );
        Ok(())
    }

    #[test]
    fn test_home_and_archives_get_posts() -> Result<(), ParseError> {
        let index = fixture();
        let site_root = Url::parse("https://example.org/")?;
        let plugin = Plugin::new(&index, Path::new("_posts"), &site_root);
        for layout in &["home", "archives"] {
            let mut data = page("/", "index.md", Some(*layout));
            plugin.extend_page_data(&mut data)?;
            assert_eq!(Some(&index.posts), data.posts.as_ref());
            assert!(data.tags.is_none());
        }
        Ok(())
    }

    #[test]
    fn test_tags_page() -> Result<(), ParseError> {
        let index = fixture();
        let site_root = Url::parse("https://example.org/blog/")?;
        let plugin = Plugin::new(&index, Path::new("_posts"), &site_root);
        let mut data = page("/tags/", "tags/index.md", Some("tags"));
        plugin.extend_page_data(&mut data)?;

        let tags = data.tags.expect("tags page should receive tags");
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(vec!["rust", "blog", "misc"], names);
        assert_eq!(2, tags[0].count);
        assert_eq!("https://example.org/blog/tags/?tag=rust", tags[0].url);
        assert!(data.posts.is_none());
        Ok(())
    }

    #[test]
    fn test_post_page_neighbours() -> Result<(), ParseError> {
        let index = fixture();
        let site_root = Url::parse("https://example.org/")?;
        let plugin = Plugin::new(&index, Path::new("_posts"), &site_root);

        let mut middle = page("/b/", "_posts/2020-01-01-b.md", None);
        plugin.extend_page_data(&mut middle)?;
        assert_eq!("/a/", middle.prev_post.expect("older post").route);
        assert_eq!("/c/", middle.next_post.expect("newer post").route);
        assert_eq!(Some("2020-01-01".to_owned()), middle.date);
        assert_eq!(Some(vec!["rust".to_owned(), "blog".to_owned()]), middle.post_tags);

        let mut newest = page("/c/", "_posts/2021-01-01-c.md", None);
        plugin.extend_page_data(&mut newest)?;
        assert_eq!("/b/", newest.prev_post.expect("older post").route);
        assert!(newest.next_post.is_none());

        let mut oldest = page("/a/", "_posts/2019-01-01-a.md", None);
        plugin.extend_page_data(&mut oldest)?;
        assert!(oldest.prev_post.is_none());
        assert_eq!("/b/", oldest.next_post.expect("newer post").route);
        Ok(())
    }

    #[test]
    fn test_unrelated_pages_untouched() -> Result<(), ParseError> {
        let index = fixture();
        let site_root = Url::parse("https://example.org/")?;
        let plugin = Plugin::new(&index, Path::new("_posts"), &site_root);

        let mut about = page("/about", "about.md", None);
        plugin.extend_page_data(&mut about)?;
        assert_eq!(page("/about", "about.md", None), about);

        // under the posts directory, but not a known post route
        let mut stray = page("/stray/", "_posts/stray.md", None);
        plugin.extend_page_data(&mut stray)?;
        assert_eq!(page("/stray/", "_posts/stray.md", None), stray);
        Ok(())
    }
}
