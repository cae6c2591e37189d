//! Defines the [`PostTag`] type, which groups the [`PostInfo`]s that share a
//! tag, and the normalization of front-matter tag values.

use crate::post::PostInfo;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// All of the posts carrying one tag.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PostTag {
    /// The tag's name, as written in front matter (trimmed).
    pub name: String,

    /// The number of posts carrying the tag. Always equal to `posts.len()`.
    pub count: usize,

    /// The posts carrying the tag, most recent first once indexing is done.
    pub posts: Vec<PostInfo>,
}

impl PostTag {
    /// Creates a tag for its first post.
    pub fn new(name: &str, post: PostInfo) -> PostTag {
        PostTag {
            name: name.to_owned(),
            count: 1,
            posts: vec![post],
        }
    }

    /// Adds another post to the tag.
    pub fn push(&mut self, post: PostInfo) {
        self.posts.push(post);
        self.count = self.posts.len();
    }
}

/// The `tags` front-matter field, which may be a YAML sequence or a single
/// comma-separated string. Any other value is kept as-is so that falsy
/// values like `false` don't fail the whole document.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Tags {
    List(Vec<Value>),
    Joined(String),
    Other(Value),
}

impl Tags {
    /// Converts the front-matter value into tag names. Every name is
    /// trimmed and empty names are dropped, so `"a,b, c,"` becomes
    /// `["a", "b", "c"]`. Scalar list items are converted to strings and
    /// other list items are ignored. `null` and `false` mean no tags; any
    /// other scalar is read as a comma-separated string.
    pub fn normalize(tags: Option<&Tags>) -> Vec<String> {
        let raw: Vec<String> = match tags {
            None => Vec::new(),
            Some(Tags::List(list)) => list.iter().filter_map(scalar).collect(),
            Some(Tags::Joined(joined)) => split(joined),
            Some(Tags::Other(Value::Bool(false))) => Vec::new(),
            Some(Tags::Other(other)) => scalar(other).map(|s| split(&s)).unwrap_or_default(),
        };
        raw.iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

fn split(joined: &str) -> Vec<String> {
    joined.split(',').map(str::to_owned).collect()
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
